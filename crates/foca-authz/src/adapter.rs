//! MongoDB-backed Casbin policy adapter.
//!
//! Policy rules are persisted as `{ ptype, v0..v5 }` documents in the
//! configured access-control collection, so the same collection serves
//! both the enforcer and the permission-management API.

use async_trait::async_trait;
use bson::{doc, Document};
use casbin::error::AdapterError;
use casbin::{Adapter, Filter, Model, Result as CasbinResult};
use futures_util::TryStreamExt;
use mongodb::Collection;
use tracing::debug;

use crate::model::RULE_FIELDS;

/// Casbin adapter persisting rules in a MongoDB collection.
#[derive(Clone)]
pub struct MongoAdapter {
    collection: Collection<Document>,
}

impl MongoAdapter {
    /// Creates an adapter over the given rule collection.
    #[must_use]
    pub fn new(collection: Collection<Document>) -> Self {
        Self { collection }
    }

    /// Returns the underlying rule collection.
    #[must_use]
    pub fn collection(&self) -> &Collection<Document> {
        &self.collection
    }
}

/// Converts a rule into its storage document.
#[must_use]
pub fn rule_to_document(ptype: &str, rule: &[String]) -> Document {
    let mut document = doc! {"ptype": ptype};
    for (field, value) in RULE_FIELDS.iter().zip(rule.iter()) {
        document.insert(*field, value.clone());
    }
    document
}

/// Parses a storage document into a `(ptype, rule)` pair.
///
/// Fields are read in order and reading stops at the first absent field;
/// documents without a `ptype` or without any rule field are skipped.
#[must_use]
pub fn rule_from_document(document: &Document) -> Option<(String, Vec<String>)> {
    let ptype = document.get_str("ptype").ok()?.to_string();

    let mut rule = Vec::new();
    for field in RULE_FIELDS {
        match document.get_str(field) {
            Ok(value) => rule.push(value.to_string()),
            Err(_) => break,
        }
    }

    if rule.is_empty() {
        None
    } else {
        Some((ptype, rule))
    }
}

fn storage_err(err: mongodb::error::Error) -> casbin::Error {
    AdapterError(Box::new(err)).into()
}

#[async_trait]
impl Adapter for MongoAdapter {
    async fn load_policy(&mut self, m: &mut dyn Model) -> CasbinResult<()> {
        let mut cursor = self
            .collection
            .find(doc! {})
            .await
            .map_err(storage_err)?;

        let mut loaded = 0usize;
        while let Some(document) = cursor.try_next().await.map_err(storage_err)? {
            if let Some((ptype, rule)) = rule_from_document(&document) {
                if let Some(sec) = ptype.get(..1) {
                    let sec = sec.to_string();
                    m.add_policy(&sec, &ptype, rule);
                    loaded += 1;
                }
            }
        }

        debug!(rules = loaded, "policy rules loaded from storage");
        Ok(())
    }

    async fn load_filtered_policy<'a>(
        &mut self,
        m: &mut dyn Model,
        _f: Filter<'a>,
    ) -> CasbinResult<()> {
        // Rule sets are small; filtering happens at evaluation time.
        self.load_policy(m).await
    }

    async fn save_policy(&mut self, m: &mut dyn Model) -> CasbinResult<()> {
        self.collection
            .delete_many(doc! {})
            .await
            .map_err(storage_err)?;

        let mut documents = Vec::new();
        for sec in ["p", "g"] {
            if let Some(assertions) = m.get_model().get(sec) {
                for (ptype, assertion) in assertions {
                    for rule in assertion.get_policy() {
                        documents.push(rule_to_document(ptype, rule));
                    }
                }
            }
        }

        if !documents.is_empty() {
            self.collection
                .insert_many(documents)
                .await
                .map_err(storage_err)?;
        }

        Ok(())
    }

    async fn clear_policy(&mut self) -> CasbinResult<()> {
        self.collection
            .delete_many(doc! {})
            .await
            .map_err(storage_err)?;
        Ok(())
    }

    fn is_filtered(&self) -> bool {
        false
    }

    async fn add_policy(
        &mut self,
        _sec: &str,
        ptype: &str,
        rule: Vec<String>,
    ) -> CasbinResult<bool> {
        self.collection
            .insert_one(rule_to_document(ptype, &rule))
            .await
            .map_err(storage_err)?;
        Ok(true)
    }

    async fn add_policies(
        &mut self,
        _sec: &str,
        ptype: &str,
        rules: Vec<Vec<String>>,
    ) -> CasbinResult<bool> {
        if rules.is_empty() {
            return Ok(true);
        }

        let documents: Vec<_> = rules
            .iter()
            .map(|rule| rule_to_document(ptype, rule))
            .collect();
        self.collection
            .insert_many(documents)
            .await
            .map_err(storage_err)?;
        Ok(true)
    }

    async fn remove_policy(
        &mut self,
        _sec: &str,
        ptype: &str,
        rule: Vec<String>,
    ) -> CasbinResult<bool> {
        let result = self
            .collection
            .delete_one(rule_to_document(ptype, &rule))
            .await
            .map_err(storage_err)?;
        Ok(result.deleted_count > 0)
    }

    async fn remove_policies(
        &mut self,
        sec: &str,
        ptype: &str,
        rules: Vec<Vec<String>>,
    ) -> CasbinResult<bool> {
        let mut all_removed = true;
        for rule in rules {
            all_removed &= self.remove_policy(sec, ptype, rule).await?;
        }
        Ok(all_removed)
    }

    async fn remove_filtered_policy(
        &mut self,
        _sec: &str,
        ptype: &str,
        field_index: usize,
        field_values: Vec<String>,
    ) -> CasbinResult<bool> {
        let mut filter = doc! {"ptype": ptype};
        for (offset, value) in field_values.iter().enumerate() {
            if value.is_empty() {
                continue;
            }
            if let Some(field) = RULE_FIELDS.get(field_index + offset) {
                filter.insert(*field, value.clone());
            }
        }

        let result = self
            .collection
            .delete_many(filter)
            .await
            .map_err(storage_err)?;
        Ok(result.deleted_count > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_to_document() {
        let rule = vec![
            "alice".to_string(),
            "/pets/*".to_string(),
            "GET".to_string(),
        ];
        let document = rule_to_document("p", &rule);

        assert_eq!(document.get_str("ptype").unwrap(), "p");
        assert_eq!(document.get_str("v0").unwrap(), "alice");
        assert_eq!(document.get_str("v1").unwrap(), "/pets/*");
        assert_eq!(document.get_str("v2").unwrap(), "GET");
        assert!(document.get_str("v3").is_err());
    }

    #[test]
    fn test_rule_from_document() {
        let document = doc! {
            "ptype": "g",
            "v0": "alice",
            "v1": "admin",
        };
        let (ptype, rule) = rule_from_document(&document).unwrap();
        assert_eq!(ptype, "g");
        assert_eq!(rule, vec!["alice", "admin"]);
    }

    #[test]
    fn test_rule_from_document_stops_at_gap() {
        // v2 is absent, so v3 must not be read.
        let document = doc! {
            "ptype": "p",
            "v0": "alice",
            "v1": "/pets",
            "v3": "stray",
        };
        let (_, rule) = rule_from_document(&document).unwrap();
        assert_eq!(rule, vec!["alice", "/pets"]);
    }

    #[test]
    fn test_rule_from_document_missing_ptype() {
        let document = doc! {"v0": "alice"};
        assert!(rule_from_document(&document).is_none());
    }

    #[test]
    fn test_rule_from_document_empty_rule() {
        let document = doc! {"ptype": "p"};
        assert!(rule_from_document(&document).is_none());
    }

    #[test]
    fn test_roundtrip() {
        let rule = vec!["role:admin".to_string(), "/admin/*".to_string(), ".*".to_string()];
        let document = rule_to_document("p", &rule);
        let (ptype, parsed) = rule_from_document(&document).unwrap();
        assert_eq!(ptype, "p");
        assert_eq!(parsed, rule);
    }
}
