//! MongoDB registration.
//!
//! FOCA registers databases, collections, and indexes declared in the `db`
//! configuration section. Configuration stays plain data; the live client
//! and handles are held by a [`MongoRegistry`] that services look up by
//! name.

use std::collections::HashMap;

use bson::{doc, Document};
use mongodb::options::IndexOptions;
use mongodb::{Client, Collection, Database, IndexModel};
use tracing::{debug, info};

use foca_config::{CollectionConfig, DbConfig, MongoConfig};

use crate::error::{DbError, DbResult};

/// Live handles for one registered database.
#[derive(Clone, Debug)]
pub struct DbHandle {
    /// The database handle.
    database: Database,
    /// Registered collection handles, keyed by name.
    collections: HashMap<String, Collection<Document>>,
}

impl DbHandle {
    /// Returns the underlying database handle.
    #[must_use]
    pub fn database(&self) -> &Database {
        &self.database
    }

    /// Returns a registered collection handle.
    pub fn collection(&self, name: &str) -> Option<&Collection<Document>> {
        self.collections.get(name)
    }
}

/// Registry of live MongoDB handles for all configured databases.
///
/// Built once at bootstrap from the `db` configuration section. The
/// driver connects lazily, so constructing the registry performs no I/O;
/// index creation happens in [`MongoRegistry::ensure_indexes`].
#[derive(Clone)]
pub struct MongoRegistry {
    client: Client,
    dbs: HashMap<String, DbHandle>,
    index_specs: HashMap<(String, String), Vec<IndexModel>>,
}

impl MongoRegistry {
    /// Creates the registry from configuration.
    ///
    /// Builds the client and database/collection handles without touching
    /// the server.
    ///
    /// # Errors
    ///
    /// Returns `DbError::Driver` if the connection URI is invalid.
    pub async fn connect(conf: &MongoConfig) -> DbResult<Self> {
        let client = Client::with_uri_str(conf.connection_uri()).await?;

        let mut registry = Self {
            client,
            dbs: HashMap::new(),
            index_specs: HashMap::new(),
        };

        if let Some(dbs) = &conf.dbs {
            for (name, db_conf) in dbs {
                registry.add_database(name, db_conf);
            }
        }

        info!(
            host = %conf.host,
            port = conf.port,
            databases = registry.dbs.len(),
            "database client registered"
        );

        Ok(registry)
    }

    /// Registers an additional database after initial registration.
    ///
    /// Used by the access-control layer to add its policy database.
    pub fn add_database(&mut self, name: &str, db_conf: &DbConfig) {
        let database = self.client.database(name);
        let mut collections = HashMap::new();

        if let Some(colls) = &db_conf.collections {
            for (coll_name, coll_conf) in colls {
                let collection = database.collection::<Document>(coll_name);
                collections.insert(coll_name.clone(), collection);

                let models = build_index_models(coll_conf);
                if !models.is_empty() {
                    self.index_specs
                        .insert((name.to_string(), coll_name.clone()), models);
                }

                debug!(db = name, collection = %coll_name, "collection registered");
            }
        }

        self.dbs.insert(
            name.to_string(),
            DbHandle {
                database,
                collections,
            },
        );
    }

    /// Creates all configured indexes on the server.
    ///
    /// # Errors
    ///
    /// Returns `DbError::Driver` if index creation fails.
    pub async fn ensure_indexes(&self) -> DbResult<()> {
        for ((db, coll_name), models) in &self.index_specs {
            let collection = self.collection(db, coll_name)?;
            for model in models {
                collection.create_index(model.clone()).await?;
            }
            debug!(
                db = %db,
                collection = %coll_name,
                indexes = models.len(),
                "indexes ensured"
            );
        }
        Ok(())
    }

    /// Returns the underlying client.
    #[must_use]
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Returns a registered database handle.
    ///
    /// # Errors
    ///
    /// Returns `DbError::MissingDatabase` when the database was not
    /// registered.
    pub fn database(&self, name: &str) -> DbResult<&DbHandle> {
        self.dbs.get(name).ok_or_else(|| DbError::MissingDatabase {
            name: name.to_string(),
        })
    }

    /// Returns a registered collection handle.
    ///
    /// # Errors
    ///
    /// Returns `DbError::MissingDatabase` or `DbError::MissingCollection`
    /// when the lookup fails.
    pub fn collection(&self, db: &str, collection: &str) -> DbResult<&Collection<Document>> {
        self.database(db)?
            .collection(collection)
            .ok_or_else(|| DbError::MissingCollection {
                db: db.to_string(),
                collection: collection.to_string(),
            })
    }

    /// Returns the names of all registered databases.
    #[must_use]
    pub fn database_names(&self) -> Vec<&str> {
        self.dbs.keys().map(String::as_str).collect()
    }
}

/// Registers MongoDB from configuration: client, handles, and indexes.
///
/// # Errors
///
/// Returns `DbError` if the URI is invalid or index creation fails.
pub async fn register_mongodb(conf: &MongoConfig) -> DbResult<MongoRegistry> {
    let registry = MongoRegistry::connect(conf).await?;
    registry.ensure_indexes().await?;
    Ok(registry)
}

/// Builds driver index models from a collection's index configuration.
#[must_use]
pub fn build_index_models(conf: &CollectionConfig) -> Vec<IndexModel> {
    let Some(indexes) = &conf.indexes else {
        return Vec::new();
    };

    indexes
        .iter()
        .map(|index| {
            let mut keys = doc! {};
            for (field, direction) in &index.keys {
                keys.insert(field.clone(), *direction);
            }

            let options = IndexOptions::builder()
                .unique(index.options.unique)
                .sparse(index.options.sparse)
                .build();

            IndexModel::builder().keys(keys).options(options).build()
        })
        .collect()
}
