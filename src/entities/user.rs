//! User entity - Accounts that can log in and obtain a bearer token.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// User database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// Unique identifier for the user
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Login email, unique across users
    #[sea_orm(unique)]
    pub email: String,
    /// Bcrypt hash of the password, never the plain text
    #[serde(skip_serializing)]
    pub password: String,
}

/// Users have no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
