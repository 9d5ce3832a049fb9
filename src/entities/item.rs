//! Item entity - The resource managed by the `/items` CRUD endpoints.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Item database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "items")]
pub struct Model {
    /// Unique identifier for the item
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Display name
    pub name: String,
    /// Optional free-form description
    pub description: Option<String>,
    /// Unit price
    pub price: f64,
    /// When the item was created
    pub created_at: DateTime,
    /// When the item was last modified
    pub updated_at: DateTime,
}

/// Items have no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
