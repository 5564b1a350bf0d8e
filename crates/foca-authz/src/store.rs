//! Permission-management store.
//!
//! CRUD operations over the policy-rule collection, mirroring the
//! permission-management endpoints: create a rule, replace or fetch a rule
//! by identifier, list rules newest-first, and delete a rule.

use bson::oid::ObjectId;
use bson::{doc, Document};
use futures_util::TryStreamExt;
use mongodb::Collection;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{AuthzError, AuthzResult};
use crate::model::RULE_FIELDS;

/// A policy rule as submitted to the permission-management API.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct PermissionRule {
    /// Rule type (`p` for policies, `g` for role assignments).
    pub ptype: Option<String>,

    /// Rule fields `v0` through `v5`, in order.
    pub rule: RuleFields,
}

/// The positional fields of a rule.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct RuleFields {
    /// Subject.
    pub v0: Option<String>,
    /// Object.
    pub v1: Option<String>,
    /// Action.
    pub v2: Option<String>,
    /// Extension field.
    pub v3: Option<String>,
    /// Extension field.
    pub v4: Option<String>,
    /// Extension field.
    pub v5: Option<String>,
}

impl PermissionRule {
    /// Converts the rule into its storage document, omitting unset fields.
    #[must_use]
    pub fn to_document(&self) -> Document {
        let mut document = Document::new();
        if let Some(ptype) = &self.ptype {
            document.insert("ptype", ptype.clone());
        }
        let fields = [
            &self.rule.v0,
            &self.rule.v1,
            &self.rule.v2,
            &self.rule.v3,
            &self.rule.v4,
            &self.rule.v5,
        ];
        for (name, value) in RULE_FIELDS.iter().zip(fields) {
            if let Some(value) = value {
                document.insert(*name, value.clone());
            }
        }
        document
    }
}

/// Store for permission rules backed by the access-control collection.
#[derive(Clone)]
pub struct PermissionStore {
    collection: Collection<Document>,
}

impl PermissionStore {
    /// Creates a store over the given rule collection.
    #[must_use]
    pub fn new(collection: Collection<Document>) -> Self {
        Self { collection }
    }

    /// Registers a new permission rule.
    ///
    /// Returns the identifier of the inserted rule.
    ///
    /// # Errors
    ///
    /// Returns `AuthzError::Storage` on insertion failure.
    pub async fn create(&self, rule: &PermissionRule) -> AuthzResult<String> {
        let result = self.collection.insert_one(rule.to_document()).await?;
        let id = result
            .inserted_id
            .as_object_id()
            .map(|oid| oid.to_hex())
            .unwrap_or_default();
        info!(permission_id = %id, "permission added");
        Ok(id)
    }

    /// Replaces the rule with the given identifier.
    ///
    /// Returns the identifier on success.
    ///
    /// # Errors
    ///
    /// Returns `AuthzError::InvalidId` for a malformed identifier and
    /// `AuthzError::PermissionNotFound` when no rule matches.
    pub async fn replace(&self, id: &str, rule: &PermissionRule) -> AuthzResult<String> {
        let oid = parse_id(id)?;
        let result = self
            .collection
            .replace_one(doc! {"_id": oid}, rule.to_document())
            .await?;

        if result.matched_count == 0 {
            return Err(AuthzError::PermissionNotFound { id: id.to_string() });
        }

        info!(permission_id = %id, "permission updated");
        Ok(id.to_string())
    }

    /// Fetches the rule with the given identifier, stripped of `_id`.
    ///
    /// # Errors
    ///
    /// Returns `AuthzError::InvalidId` for a malformed identifier and
    /// `AuthzError::PermissionNotFound` when no rule matches.
    pub async fn get(&self, id: &str) -> AuthzResult<Document> {
        let oid = parse_id(id)?;
        let document = self
            .collection
            .find_one(doc! {"_id": oid})
            .projection(doc! {"_id": 0})
            .await?;

        document.ok_or_else(|| AuthzError::PermissionNotFound { id: id.to_string() })
    }

    /// Lists rules newest-first, stripped of `_id`.
    ///
    /// A `limit` of zero returns all rules.
    ///
    /// # Errors
    ///
    /// Returns `AuthzError::Storage` on query failure.
    pub async fn list(&self, limit: i64) -> AuthzResult<Vec<Document>> {
        let mut cursor = self
            .collection
            .find(doc! {})
            .sort(doc! {"$natural": -1})
            .projection(doc! {"_id": 0})
            .limit(limit)
            .await?;

        let mut rules = Vec::new();
        while let Some(document) = cursor.try_next().await? {
            rules.push(document);
        }
        Ok(rules)
    }

    /// Deletes the rule with the given identifier.
    ///
    /// # Errors
    ///
    /// Returns `AuthzError::InvalidId` for a malformed identifier and
    /// `AuthzError::PermissionNotFound` when no rule matches.
    pub async fn delete(&self, id: &str) -> AuthzResult<()> {
        let oid = parse_id(id)?;
        let result = self.collection.delete_one(doc! {"_id": oid}).await?;

        if result.deleted_count == 0 {
            return Err(AuthzError::PermissionNotFound { id: id.to_string() });
        }

        info!(permission_id = %id, "permission deleted");
        Ok(())
    }
}

fn parse_id(id: &str) -> AuthzResult<ObjectId> {
    ObjectId::parse_str(id).map_err(|_| AuthzError::InvalidId { id: id.to_string() })
}
