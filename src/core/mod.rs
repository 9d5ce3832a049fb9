//! Core business logic - framework-agnostic user and item operations.
//!
//! Functions here take a `&DatabaseConnection` and return [`crate::errors::Result`];
//! they know nothing about HTTP.

/// Item CRUD
pub mod item;
/// Registration and login
pub mod user;
