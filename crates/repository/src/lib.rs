//! Typed, partition-key-aware repository layer over the MongoDB driver.
//!
//! Documents are plain serde records implementing [`Document`]. Each document
//! type maps to one collection, named after the type (`Invoice` is stored in
//! `invoices`). A partition key shards a type across sibling collections:
//! with partition key `eu` invoices go to `eu-invoices`.
//!
//! # Architecture
//!
//! - [`config`] - connection settings, loadable from the environment
//! - [`context`] - the driver client and database, collection resolution
//! - [`document`] - document, key and partition traits plus collection naming
//! - [`options`] - per-call options (partition key, session, cancellation) and paging
//! - [`operations`] - reader, creator, updater, eraser and index handler
//! - [`repository`] - the [`ReadOnlyRepository`] and [`Repository`] facades
//! - [`error`] - error types
//!
//! # Per-call options
//!
//! Every operation takes one [`OperationOptions`] instead of a family of
//! overloads:
//!
//! ```
//! use mongo_repository::OperationOptions;
//! use tokio_util::sync::CancellationToken;
//!
//! let token = CancellationToken::new();
//! let options = OperationOptions::partition("eu").with_cancellation(&token);
//! assert_eq!(options.partition_key, Some("eu"));
//! ```
//!
//! # Quick Start
//!
//! ```no_run
//! use mongo_repository::{
//!     Document, MongoDbConfig, MongoRepository, OperationOptions, ReadOnlyRepository,
//!     Repository,
//! };
//! use mongodb::bson::{doc, oid::ObjectId};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! struct Invoice {
//!     #[serde(rename = "_id")]
//!     id: ObjectId,
//!     version: i32,
//!     customer: String,
//!     total_cents: i64,
//! }
//!
//! impl Document for Invoice {
//!     type Key = ObjectId;
//!
//!     fn id(&self) -> &ObjectId {
//!         &self.id
//!     }
//!
//!     fn set_id(&mut self, id: ObjectId) {
//!         self.id = id;
//!     }
//!
//!     fn version(&self) -> i32 {
//!         self.version
//!     }
//! }
//!
//! # async fn run() -> mongo_repository::RepositoryResult<()> {
//! let repository = MongoRepository::connect(&MongoDbConfig::from_env()?).await?;
//!
//! let mut invoice = Invoice {
//!     id: ObjectId::new(),
//!     version: 1,
//!     customer: "acme".into(),
//!     total_cents: 12_500,
//! };
//! repository.add_one(&mut invoice, OperationOptions::partition("eu")).await?;
//!
//! let total = repository
//!     .sum_by_i64::<Invoice>(
//!         doc! { "customer": "acme" },
//!         "total_cents",
//!         OperationOptions::partition("eu"),
//!     )
//!     .await?;
//! assert_eq!(total, 12_500);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod config;
pub mod context;
pub mod document;
pub mod error;
pub mod operations;
pub mod options;
pub mod repository;

// Re-export commonly used types at crate root
pub use config::MongoDbConfig;
pub use context::MongoDbContext;
pub use document::{Document, DocumentKey, PartitionedDocument};
pub use error::{ConfigError, RepositoryError, RepositoryResult};
pub use operations::{IndexCreationOptions, IndexKind, UpdateOutcome};
pub use options::{OperationOptions, Page, SortDirection};
pub use repository::{MongoRepository, ReadOnlyMongoRepository, ReadOnlyRepository, Repository};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
