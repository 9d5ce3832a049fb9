//! Entity module - Contains all SeaORM entity definitions for the database.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod item;
pub mod user;

use crate::schema::TableDef;

// Re-export specific types to avoid conflicts
pub use item::{Column as ItemColumn, Entity as Item, Model as ItemModel};
pub use user::{Column as UserColumn, Entity as User, Model as UserModel};

/// Every table the application owns, in the shape the schema sync expects.
///
/// New entities must be added here to be created on startup.
#[must_use]
pub fn registered_tables() -> Vec<TableDef> {
    vec![TableDef::from_entity(User), TableDef::from_entity(Item)]
}
