//! MongoDB registration for FOCA-based services.
//!
//! The `db` section of the application configuration declares databases,
//! collections, and indexes; this crate turns that declaration into live
//! driver handles held by a [`MongoRegistry`]. All actual database
//! behavior is the MongoDB driver's; this crate only registers what the
//! configuration names and offers name-based lookup with structured
//! errors.
//!
//! # Example
//!
//! ```no_run
//! use foca_config::MongoConfig;
//! use foca_db::register_mongodb;
//!
//! # async fn run() -> Result<(), foca_db::DbError> {
//! let conf = MongoConfig::default();
//! let registry = register_mongodb(&conf).await?;
//! let pets = registry.collection("petstore", "pets")?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod error;
mod register;
mod util;

pub use error::{DbError, DbResult};
pub use register::{build_index_models, register_mongodb, DbHandle, MongoRegistry};
pub use util::{find_id_latest, find_one_latest};
