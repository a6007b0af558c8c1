//! Document traits.
//!
//! Anything stored through a repository implements [`Document`]: a serde
//! record with an `_id` of some [`DocumentKey`] type and a version counter.
//! Documents that carry their own partition implement [`PartitionedDocument`]
//! so inserts and deletes can be routed without an explicit partition key.
//!
//! # Example
//!
//! ```
//! use mongo_repository::document::Document;
//! use mongodb::bson::oid::ObjectId;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! struct Invoice {
//!     #[serde(rename = "_id")]
//!     id: ObjectId,
//!     version: i32,
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
//! assert_eq!(Invoice::collection_name(), "invoices");
//! ```

mod key;
pub mod naming;

pub use key::DocumentKey;

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Name of the identifier field in every stored document.
pub const ID_FIELD: &str = "_id";

/// A record persisted in a MongoDB collection.
pub trait Document: Serialize + DeserializeOwned + Send + Sync + Unpin + 'static {
    /// The identifier type stored in `_id`.
    type Key: DocumentKey;

    /// Returns the document identifier.
    fn id(&self) -> &Self::Key;

    /// Replaces the document identifier.
    fn set_id(&mut self, id: Self::Key);

    /// Returns the document's version counter.
    fn version(&self) -> i32;

    /// Base name of the collection holding this type.
    ///
    /// Defaults to the pluralized, lower-camel-case type name. Override it to
    /// pin a collection name independent of the Rust type.
    fn collection_name() -> String {
        naming::default_collection_name::<Self>()
    }
}

/// A document that knows which partition it belongs to.
pub trait PartitionedDocument: Document {
    /// The partition key used to select this document's collection.
    fn partition_key(&self) -> &str;
}
