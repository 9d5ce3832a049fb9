//! Route definitions grouped by resource.

/// Health check
pub mod general;
/// Item CRUD
pub mod item;
/// Registration, login, current user
pub mod user;
