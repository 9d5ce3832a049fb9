//! Item business logic - Handles all item-related operations.
//!
//! This module provides functions for listing, creating, updating, and deleting items.
//! All functions are async and return Result types for proper error handling.

use crate::{
    entities::{Item, item},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};
use serde::{Deserialize, Deserializer};
use tracing::{info, instrument};

/// Payload for creating an item.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct NewItem {
    /// Display name
    pub name: String,
    /// Optional description
    #[serde(default)]
    pub description: Option<String>,
    /// Unit price
    pub price: f64,
}

/// Partial update; only fields that are present change.
///
/// `description` distinguishes "absent" (`None`) from an explicit `null`
/// (`Some(None)`), which clears the stored description.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct ItemPatch {
    /// New name
    #[serde(default)]
    pub name: Option<String>,
    /// New description, or `Some(None)` to clear it
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,
    /// New price
    #[serde(default)]
    pub price: Option<f64>,
}

impl ItemPatch {
    /// True when the patch would not change anything.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.price.is_none()
    }
}

// Wraps whatever was sent (including null) in `Some`; absent fields hit `default`.
fn present<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

fn validate_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::Validation {
            message: "Item name cannot be empty".to_string(),
        });
    }
    Ok(name.to_string())
}

fn validate_price(price: f64) -> Result<f64> {
    if !price.is_finite() || price < 0.0 {
        return Err(Error::InvalidPrice { price });
    }
    Ok(price)
}

/// Retrieves all items, ordered by id.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn list_items(db: &DatabaseConnection) -> Result<Vec<item::Model>> {
    Item::find()
        .order_by_asc(item::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves a single item.
///
/// # Errors
/// Returns `Error::ItemNotFound` if no item has this id, or an error if the query fails.
pub async fn get_item(db: &DatabaseConnection, id: i32) -> Result<item::Model> {
    Item::find_by_id(id)
        .one(db)
        .await?
        .ok_or(Error::ItemNotFound { id })
}

/// Creates a new item, performing input validation.
///
/// # Errors
/// Returns an error if:
/// - The name is empty or whitespace-only
/// - The price is negative or not finite (NaN, infinity)
/// - The database insert operation fails
#[instrument(skip(db))]
pub async fn create_item(db: &DatabaseConnection, new_item: NewItem) -> Result<item::Model> {
    let name = validate_name(&new_item.name)?;
    let price = validate_price(new_item.price)?;
    let now = chrono::Utc::now().naive_utc();

    let item = item::ActiveModel {
        name: Set(name),
        description: Set(new_item.description),
        price: Set(price),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    let item = item.insert(db).await?;
    info!("Created item '{}' (ID: {})", item.name, item.id);
    Ok(item)
}

/// Applies a partial update to an existing item.
///
/// An empty patch returns the item unchanged.
///
/// # Errors
/// Returns an error if:
/// - The item does not exist
/// - A provided name is blank or a provided price is invalid
/// - The database update operation fails
#[instrument(skip(db))]
pub async fn update_item(
    db: &DatabaseConnection,
    id: i32,
    patch: ItemPatch,
) -> Result<item::Model> {
    let existing = get_item(db, id).await?;
    if patch.is_empty() {
        return Ok(existing);
    }

    let mut item: item::ActiveModel = existing.into();
    if let Some(name) = patch.name {
        item.name = Set(validate_name(&name)?);
    }
    if let Some(description) = patch.description {
        item.description = Set(description);
    }
    if let Some(price) = patch.price {
        item.price = Set(validate_price(price)?);
    }
    item.updated_at = Set(chrono::Utc::now().naive_utc());

    let item = item.update(db).await?;
    info!("Updated item {}", item.id);
    Ok(item)
}

/// Deletes an item.
///
/// # Errors
/// Returns `Error::ItemNotFound` if no item has this id, or an error if the delete fails.
#[instrument(skip(db))]
pub async fn delete_item(db: &DatabaseConnection, id: i32) -> Result<()> {
    let result = Item::delete_by_id(id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(Error::ItemNotFound { id });
    }
    info!("Deleted item {id}");
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn new_item(name: &str, price: f64) -> NewItem {
        NewItem {
            name: name.to_string(),
            description: None,
            price,
        }
    }

    #[tokio::test]
    async fn test_create_item_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let result = create_item(&db, new_item("", 1.0)).await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        let result = create_item(&db, new_item("   ", 1.0)).await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        let result = create_item(&db, new_item("Widget", -1.0)).await;
        assert!(matches!(result, Err(Error::InvalidPrice { price }) if price == -1.0));

        let result = create_item(&db, new_item("Widget", f64::NAN)).await;
        assert!(matches!(result, Err(Error::InvalidPrice { .. })));

        let result = create_item(&db, new_item("Widget", f64::INFINITY)).await;
        assert!(matches!(result, Err(Error::InvalidPrice { .. })));

        Ok(())
    }

    #[tokio::test]
    async fn test_create_and_get_item() -> Result<()> {
        let db = setup_test_db().await?;

        let created = create_item(
            &db,
            NewItem {
                name: "  Widget ".to_string(),
                description: Some("A small widget".to_string()),
                price: 9.99,
            },
        )
        .await?;
        assert_eq!(created.name, "Widget");
        assert_eq!(created.price, 9.99);
        assert_eq!(created.created_at, created.updated_at);

        let fetched = get_item(&db, created.id).await?;
        assert_eq!(fetched, created);
        Ok(())
    }

    #[tokio::test]
    async fn test_get_missing_item() -> Result<()> {
        let db = setup_test_db().await?;
        let result = get_item(&db, 404).await;
        assert!(matches!(result, Err(Error::ItemNotFound { id: 404 })));
        Ok(())
    }

    #[tokio::test]
    async fn test_list_items_ordered_by_id() -> Result<()> {
        let db = setup_test_db().await?;
        assert!(list_items(&db).await?.is_empty());

        let first = create_test_item(&db, "Zebra").await?;
        let second = create_test_item(&db, "Apple").await?;

        let items = list_items(&db).await?;
        assert_eq!(
            items.iter().map(|i| i.id).collect::<Vec<_>>(),
            vec![first.id, second.id]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_update_item_partial() -> Result<()> {
        let db = setup_test_db().await?;
        let item = create_test_item(&db, "Widget").await?;

        let updated = update_item(
            &db,
            item.id,
            ItemPatch {
                price: Some(12.5),
                ..ItemPatch::default()
            },
        )
        .await?;
        assert_eq!(updated.price, 12.5);
        assert_eq!(updated.name, "Widget");
        assert_eq!(updated.description, item.description);
        assert!(updated.updated_at >= item.updated_at);
        Ok(())
    }

    #[tokio::test]
    async fn test_update_item_clears_description() -> Result<()> {
        let db = setup_test_db().await?;
        let item = create_test_item(&db, "Widget").await?;
        assert!(item.description.is_some());

        let patch: ItemPatch = serde_json::from_str(r#"{"description": null}"#).unwrap();
        let updated = update_item(&db, item.id, patch).await?;
        assert!(updated.description.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_update_item_validation_and_missing() -> Result<()> {
        let db = setup_test_db().await?;
        let item = create_test_item(&db, "Widget").await?;

        let result = update_item(
            &db,
            item.id,
            ItemPatch {
                name: Some(" ".to_string()),
                ..ItemPatch::default()
            },
        )
        .await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        let result = update_item(&db, 999, ItemPatch::default()).await;
        assert!(matches!(result, Err(Error::ItemNotFound { id: 999 })));

        // Nothing was written by the failed update
        assert_eq!(get_item(&db, item.id).await?.name, "Widget");
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_item() -> Result<()> {
        let db = setup_test_db().await?;
        let item = create_test_item(&db, "Widget").await?;

        delete_item(&db, item.id).await?;
        assert!(matches!(
            get_item(&db, item.id).await,
            Err(Error::ItemNotFound { .. })
        ));

        let again = delete_item(&db, item.id).await;
        assert!(matches!(again, Err(Error::ItemNotFound { .. })));
        Ok(())
    }

    #[test]
    fn test_patch_deserialization() {
        let absent: ItemPatch = serde_json::from_str("{}").unwrap();
        assert!(absent.is_empty());

        let cleared: ItemPatch = serde_json::from_str(r#"{"description": null}"#).unwrap();
        assert_eq!(cleared.description, Some(None));

        let set: ItemPatch =
            serde_json::from_str(r#"{"description": "new", "price": 3.0}"#).unwrap();
        assert_eq!(set.description, Some(Some("new".to_string())));
        assert_eq!(set.price, Some(3.0));
        assert!(set.name.is_none());
    }
}
