//! Identifier types usable as a document's `_id`.

use std::fmt::Debug;

use mongodb::bson::oid::ObjectId;
use mongodb::bson::{Bson, Uuid};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// A type that can serve as a document identifier.
///
/// Creators call [`generate`](DocumentKey::generate) for documents whose key
/// [`is_unset`](DocumentKey::is_unset), so callers only need to set ids for key
/// types the repository cannot invent on its own.
pub trait DocumentKey:
    Serialize + DeserializeOwned + Clone + PartialEq + Debug + Send + Sync + Unpin + 'static
{
    /// Short type name used in error messages.
    const KEY_TYPE: &'static str;

    /// Produces a fresh key, or `None` if this key type has no generator.
    fn generate() -> Option<Self>;

    /// Returns `true` if the key still holds its "no value" sentinel.
    fn is_unset(&self) -> bool;

    /// Converts the key into the BSON value stored in `_id`.
    fn to_bson(&self) -> Bson;
}

impl DocumentKey for ObjectId {
    const KEY_TYPE: &'static str = "ObjectId";

    fn generate() -> Option<Self> {
        Some(ObjectId::new())
    }

    // An ObjectId always carries a value; there is no sentinel.
    fn is_unset(&self) -> bool {
        false
    }

    fn to_bson(&self) -> Bson {
        Bson::ObjectId(*self)
    }
}

impl DocumentKey for Uuid {
    const KEY_TYPE: &'static str = "Uuid";

    fn generate() -> Option<Self> {
        Some(Uuid::new())
    }

    fn is_unset(&self) -> bool {
        self.bytes() == [0u8; 16]
    }

    fn to_bson(&self) -> Bson {
        Bson::from(*self)
    }
}

impl DocumentKey for String {
    const KEY_TYPE: &'static str = "String";

    fn generate() -> Option<Self> {
        Some(ObjectId::new().to_hex())
    }

    fn is_unset(&self) -> bool {
        self.is_empty()
    }

    fn to_bson(&self) -> Bson {
        Bson::String(self.clone())
    }
}

impl DocumentKey for i32 {
    const KEY_TYPE: &'static str = "i32";

    fn generate() -> Option<Self> {
        None
    }

    fn is_unset(&self) -> bool {
        *self == 0
    }

    fn to_bson(&self) -> Bson {
        Bson::Int32(*self)
    }
}

impl DocumentKey for i64 {
    const KEY_TYPE: &'static str = "i64";

    fn generate() -> Option<Self> {
        None
    }

    fn is_unset(&self) -> bool {
        *self == 0
    }

    fn to_bson(&self) -> Bson {
        Bson::Int64(*self)
    }
}
