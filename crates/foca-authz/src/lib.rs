//! Access control for FOCA-based services.
//!
//! Policy evaluation is delegated to the Casbin engine; this crate only
//! wires it up from configuration:
//!
//! - a built-in RBAC [model](crate::model::DEFAULT_MODEL), overridable via
//!   `security.access_control.model_path`
//! - a [`MongoAdapter`] persisting rules as `{ ptype, v0..v5 }` documents
//!   in the configured collection
//! - a [`PermissionStore`] offering the permission-management CRUD over
//!   the same collection
//! - an [`AccessControlStage`] middleware enforcing decisions per request
//!
//! # Example
//!
//! ```no_run
//! use foca_authz::register_access_control;
//! use foca_config::{AccessControlSettings, MongoConfig};
//! use foca_db::MongoRegistry;
//!
//! # async fn run() -> Result<(), foca_authz::AuthzError> {
//! let mut db_conf = MongoConfig::default();
//! let mut registry = MongoRegistry::connect(&db_conf).await?;
//!
//! let settings = AccessControlSettings::default();
//! let access = register_access_control(&mut registry, &mut db_conf, &settings).await?;
//!
//! let allowed = access.enforce("alice", "/pets/42", "GET").await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod adapter;
mod error;
pub mod model;
mod stage;
mod store;

pub use adapter::{rule_from_document, rule_to_document, MongoAdapter};
pub use error::{AuthzError, AuthzResult};
pub use stage::{AccessControlStage, Enforce};
pub use store::{PermissionRule, PermissionStore, RuleFields};

use async_trait::async_trait;
use casbin::{CoreApi, Enforcer};
use tokio::sync::RwLock;
use tracing::info;

use foca_config::{AccessControlSettings, CollectionConfig, DbConfig, MongoConfig};
use foca_db::MongoRegistry;

/// Default name of the access-control database.
pub const DEFAULT_ACCESS_CONTROL_DB_NAME: &str = "access_control_db";

/// Default name of the policy-rule collection.
pub const DEFAULT_ACCESS_CONTROL_COLLECTION_NAME: &str = "policy_rules";

/// Access-control handle combining the policy enforcer and the
/// permission-management store.
pub struct AccessControl {
    enforcer: RwLock<Enforcer>,
    store: PermissionStore,
}

impl AccessControl {
    /// Returns whether `(sub, obj, act)` is allowed by the loaded policy.
    ///
    /// # Errors
    ///
    /// Returns `AuthzError::Policy` on evaluation failure.
    pub async fn enforce(&self, sub: &str, obj: &str, act: &str) -> AuthzResult<bool> {
        let enforcer = self.enforcer.read().await;
        Ok(enforcer.enforce((sub, obj, act))?)
    }

    /// Reloads the policy rules from storage.
    ///
    /// Call after mutating rules through the permission store so the
    /// enforcer sees the change.
    ///
    /// # Errors
    ///
    /// Returns `AuthzError::Policy` if reloading fails.
    pub async fn reload(&self) -> AuthzResult<()> {
        let mut enforcer = self.enforcer.write().await;
        enforcer.load_policy().await?;
        Ok(())
    }

    /// Returns the permission-management store.
    #[must_use]
    pub fn store(&self) -> &PermissionStore {
        &self.store
    }
}

#[async_trait]
impl Enforce for AccessControl {
    async fn enforce(&self, sub: &str, obj: &str, act: &str) -> AuthzResult<bool> {
        AccessControl::enforce(self, sub, obj, act).await
    }
}

/// Registers access control with the database registry.
///
/// Ensures the access-control database and collection are registered
/// (applying the default names when unset, both in the registry and in the
/// `db` configuration section), builds the enforcer from the configured
/// model and the Mongo-backed adapter, and returns the combined handle.
///
/// # Errors
///
/// Returns `AuthzError` if the model cannot be loaded or the initial
/// policy load fails.
pub async fn register_access_control(
    registry: &mut MongoRegistry,
    db_conf: &mut MongoConfig,
    settings: &AccessControlSettings,
) -> AuthzResult<AccessControl> {
    let db_name = settings
        .db_name
        .clone()
        .unwrap_or_else(|| DEFAULT_ACCESS_CONTROL_DB_NAME.to_string());
    let collection_name = settings
        .collection_name
        .clone()
        .unwrap_or_else(|| DEFAULT_ACCESS_CONTROL_COLLECTION_NAME.to_string());

    let access_db = DbConfig::with_collection(&collection_name, CollectionConfig::default());
    db_conf.add_db(&db_name, access_db.clone());
    registry.add_database(&db_name, &access_db);

    let collection = registry.collection(&db_name, &collection_name)?.clone();

    let model = model::load_model(settings.model_path.as_deref()).await?;
    let adapter = MongoAdapter::new(collection.clone());
    let enforcer = Enforcer::new(model, adapter).await?;

    info!(
        db = %db_name,
        collection = %collection_name,
        "access control registered"
    );

    Ok(AccessControl {
        enforcer: RwLock::new(enforcer),
        store: PermissionStore::new(collection),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use casbin::{DefaultModel, MemoryAdapter, MgmtApi};

    async fn enforcer_with_rules(
        policies: Vec<Vec<&str>>,
        groupings: Vec<Vec<&str>>,
    ) -> Enforcer {
        let model = DefaultModel::from_str(model::DEFAULT_MODEL).await.unwrap();
        let mut enforcer = Enforcer::new(model, MemoryAdapter::default()).await.unwrap();

        for policy in policies {
            enforcer
                .add_policy(policy.into_iter().map(String::from).collect())
                .await
                .unwrap();
        }
        for grouping in groupings {
            enforcer
                .add_grouping_policy(grouping.into_iter().map(String::from).collect())
                .await
                .unwrap();
        }
        enforcer
    }

    #[tokio::test]
    async fn test_default_model_direct_policy() {
        let enforcer = enforcer_with_rules(
            vec![vec!["alice", "/pets/:id", "GET"]],
            vec![],
        )
        .await;

        assert!(enforcer.enforce(("alice", "/pets/42", "GET")).unwrap());
        assert!(!enforcer.enforce(("alice", "/pets/42", "DELETE")).unwrap());
        assert!(!enforcer.enforce(("bob", "/pets/42", "GET")).unwrap());
    }

    #[tokio::test]
    async fn test_default_model_role_graph() {
        let enforcer = enforcer_with_rules(
            vec![vec!["admin", "/pets/*", ".*"]],
            vec![vec!["alice", "admin"]],
        )
        .await;

        assert!(enforcer.enforce(("alice", "/pets/42", "DELETE")).unwrap());
        assert!(!enforcer.enforce(("bob", "/pets/42", "DELETE")).unwrap());
    }

    #[tokio::test]
    async fn test_default_model_action_regex() {
        let enforcer = enforcer_with_rules(
            vec![vec!["alice", "/pets", "GET|POST"]],
            vec![],
        )
        .await;

        assert!(enforcer.enforce(("alice", "/pets", "GET")).unwrap());
        assert!(enforcer.enforce(("alice", "/pets", "POST")).unwrap());
        assert!(!enforcer.enforce(("alice", "/pets", "DELETE")).unwrap());
    }

    #[test]
    fn test_default_names() {
        assert_eq!(DEFAULT_ACCESS_CONTROL_DB_NAME, "access_control_db");
        assert_eq!(DEFAULT_ACCESS_CONTROL_COLLECTION_NAME, "policy_rules");
    }
}
