//! Utility functions for working with registered collections.

use bson::oid::ObjectId;
use bson::{doc, Document};
use mongodb::Collection;

use crate::error::DbResult;

/// Returns the newest document in a collection, stripped of its `_id`.
///
/// Returns `None` if the collection is empty.
///
/// # Errors
///
/// Returns `DbError::Driver` on query failure.
pub async fn find_one_latest(collection: &Collection<Document>) -> DbResult<Option<Document>> {
    let doc = collection
        .find_one(doc! {})
        .sort(doc! {"_id": -1})
        .projection(doc! {"_id": 0})
        .await?;
    Ok(doc)
}

/// Returns the `ObjectId` of the newest document in a collection.
///
/// Returns `None` if the collection is empty.
///
/// # Errors
///
/// Returns `DbError::Driver` on query failure.
pub async fn find_id_latest(collection: &Collection<Document>) -> DbResult<Option<ObjectId>> {
    let doc = collection
        .find_one(doc! {})
        .sort(doc! {"_id": -1})
        .projection(doc! {"_id": 1})
        .await?;
    Ok(doc.and_then(|d| d.get_object_id("_id").ok()))
}
