//! Index management.

use std::sync::Arc;
use std::time::Duration;

use mongodb::bson::{Bson, Document as BsonDocument};
use mongodb::options::{IndexOptions, IndexVersion, Sphere2DIndexVersion, TextIndexVersion};
use mongodb::IndexModel;
use tracing::info;

use super::with_session;
use crate::context::MongoDbContext;
use crate::document::Document;
use crate::error::{RepositoryError, RepositoryResult};
use crate::options::{guard, OperationOptions};

/// The kind of key an index field uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexKind {
    /// Ascending B-tree key (`1`).
    Ascending,
    /// Descending B-tree key (`-1`).
    Descending,
    /// Hashed key (`"hashed"`).
    Hashed,
    /// Text key (`"text"`).
    Text,
    /// Spherical geometry key (`"2dsphere"`).
    Geo2dSphere,
}

impl IndexKind {
    /// Value stored for the field in the index key document.
    pub fn key_value(self) -> Bson {
        match self {
            IndexKind::Ascending => Bson::Int32(1),
            IndexKind::Descending => Bson::Int32(-1),
            IndexKind::Hashed => Bson::String("hashed".to_string()),
            IndexKind::Text => Bson::String("text".to_string()),
            IndexKind::Geo2dSphere => Bson::String("2dsphere".to_string()),
        }
    }
}

impl std::fmt::Display for IndexKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            IndexKind::Ascending => "ascending",
            IndexKind::Descending => "descending",
            IndexKind::Hashed => "hashed",
            IndexKind::Text => "text",
            IndexKind::Geo2dSphere => "2dsphere",
        };
        write!(f, "{}", name)
    }
}

/// Options for creating an index. Unset fields keep the server defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexCreationOptions {
    /// Reject documents that duplicate an existing key.
    pub unique: Option<bool>,
    /// Skip documents that lack the indexed field.
    pub sparse: Option<bool>,
    /// Explicit index name; the server derives one otherwise.
    pub name: Option<String>,
    /// Build in the background (ignored by MongoDB 4.2+).
    pub background: Option<bool>,
    /// TTL after which documents expire.
    pub expire_after: Option<Duration>,
    /// Default language for text indexes.
    pub default_language: Option<String>,
    /// Document field naming the language of each document for text indexes.
    pub language_override: Option<String>,
    /// Text index format version.
    pub text_index_version: Option<u32>,
    /// Per-field weights for text indexes.
    pub weights: Option<BsonDocument>,
    /// `2dsphere` index format version.
    pub sphere_index_version: Option<u32>,
    /// Precision of `2d` index geohashes.
    pub bits: Option<u32>,
    /// Lower bound for `2d` index coordinates.
    pub min: Option<f64>,
    /// Upper bound for `2d` index coordinates.
    pub max: Option<f64>,
    /// Index format version.
    pub version: Option<u32>,
    /// Only index documents matching this filter.
    pub partial_filter: Option<BsonDocument>,
}

impl IndexCreationOptions {
    /// Options creating a unique index.
    pub fn unique() -> Self {
        Self {
            unique: Some(true),
            ..Default::default()
        }
    }

    /// Sets the index name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the TTL.
    pub fn with_expire_after(mut self, expire_after: Duration) -> Self {
        self.expire_after = Some(expire_after);
        self
    }

    /// Marks the index sparse.
    pub fn with_sparse(mut self) -> Self {
        self.sparse = Some(true);
        self
    }

    /// Converts into the driver's index options.
    pub fn to_index_options(&self) -> IndexOptions {
        let mut options = IndexOptions::default();
        options.unique = self.unique;
        options.sparse = self.sparse;
        options.name = self.name.clone();
        options.background = self.background;
        options.expire_after = self.expire_after;
        options.default_language = self.default_language.clone();
        options.language_override = self.language_override.clone();
        options.text_index_version = self.text_index_version.map(TextIndexVersion::Custom);
        options.weights = self.weights.clone();
        options.sphere_2d_index_version = self.sphere_index_version.map(Sphere2DIndexVersion::Custom);
        options.bits = self.bits;
        options.min = self.min;
        options.max = self.max;
        options.version = self.version.map(IndexVersion::Custom);
        options.partial_filter_expression = self.partial_filter.clone();
        options
    }
}

/// Builds the driver index model for `keys`.
///
/// Default options produce a model without an options block so the server
/// applies its own defaults.
pub fn index_model(keys: BsonDocument, options: &IndexCreationOptions) -> IndexModel {
    let index_options = (*options != IndexCreationOptions::default()).then(|| options.to_index_options());
    IndexModel::builder()
        .keys(keys)
        .options(index_options)
        .build()
}

/// Builds the key document for a compound index.
pub fn index_keys(fields: &[(&str, IndexKind)]) -> RepositoryResult<BsonDocument> {
    if fields.is_empty() {
        return Err(RepositoryError::invalid_argument(
            "an index needs at least one field",
        ));
    }
    let mut keys = BsonDocument::new();
    for (field, kind) in fields {
        if field.is_empty() {
            return Err(RepositoryError::invalid_argument("index field name must not be empty"));
        }
        if keys.insert(*field, kind.key_value()).is_some() {
            return Err(RepositoryError::invalid_argument(format!(
                "field {:?} appears more than once in the index",
                field
            )));
        }
    }
    Ok(keys)
}

/// Creates, lists and drops indexes on a document type's collection.
///
/// The typed methods resolve the collection from the document type. The
/// `*_in` methods take a base collection name instead, for callers that
/// have no document type at hand.
#[derive(Debug, Clone)]
pub struct MongoDbIndexHandler {
    context: Arc<MongoDbContext>,
}

impl MongoDbIndexHandler {
    /// Creates an index handler over the given context.
    pub fn new(context: Arc<MongoDbContext>) -> Self {
        Self { context }
    }

    /// Returns the names of all indexes on the collection.
    pub async fn get_index_names<T: Document>(
        &self,
        options: OperationOptions<'_>,
    ) -> RepositoryResult<Vec<String>> {
        self.get_index_names_in(&T::collection_name(), options)
            .await
    }

    /// Returns the names of all indexes on the named collection.
    pub async fn get_index_names_in(
        &self,
        collection_name: &str,
        options: OperationOptions<'_>,
    ) -> RepositoryResult<Vec<String>> {
        let OperationOptions {
            partition_key,
            session,
            cancellation,
        } = options;
        let collection = self
            .context
            .collection_named::<BsonDocument>(collection_name, partition_key)?;

        guard(cancellation, "get_index_names", async move {
            Ok(with_session!(collection.list_index_names(), session)?)
        })
        .await
    }

    /// Creates a text index on `field` and returns its name.
    pub async fn create_text_index<T: Document>(
        &self,
        field: &str,
        index_options: &IndexCreationOptions,
        options: OperationOptions<'_>,
    ) -> RepositoryResult<String> {
        self.create_compound_index::<T>(&[(field, IndexKind::Text)], index_options, options)
            .await
    }

    /// Creates an ascending index on `field` and returns its name.
    pub async fn create_ascending_index<T: Document>(
        &self,
        field: &str,
        index_options: &IndexCreationOptions,
        options: OperationOptions<'_>,
    ) -> RepositoryResult<String> {
        self.create_compound_index::<T>(&[(field, IndexKind::Ascending)], index_options, options)
            .await
    }

    /// Creates a descending index on `field` and returns its name.
    pub async fn create_descending_index<T: Document>(
        &self,
        field: &str,
        index_options: &IndexCreationOptions,
        options: OperationOptions<'_>,
    ) -> RepositoryResult<String> {
        self.create_compound_index::<T>(&[(field, IndexKind::Descending)], index_options, options)
            .await
    }

    /// Creates a hashed index on `field` and returns its name.
    pub async fn create_hashed_index<T: Document>(
        &self,
        field: &str,
        index_options: &IndexCreationOptions,
        options: OperationOptions<'_>,
    ) -> RepositoryResult<String> {
        self.create_compound_index::<T>(&[(field, IndexKind::Hashed)], index_options, options)
            .await
    }

    /// Creates one text index spanning all `fields` and returns its name.
    ///
    /// A collection can hold only one text index, so several text fields
    /// must share it.
    pub async fn create_combined_text_index<T: Document>(
        &self,
        fields: &[&str],
        index_options: &IndexCreationOptions,
        options: OperationOptions<'_>,
    ) -> RepositoryResult<String> {
        let keys: Vec<(&str, IndexKind)> = fields.iter().map(|f| (*f, IndexKind::Text)).collect();
        self.create_compound_index::<T>(&keys, index_options, options)
            .await
    }

    /// Creates an index over several fields and returns its name.
    pub async fn create_compound_index<T: Document>(
        &self,
        fields: &[(&str, IndexKind)],
        index_options: &IndexCreationOptions,
        options: OperationOptions<'_>,
    ) -> RepositoryResult<String> {
        self.create_index_in(&T::collection_name(), fields, index_options, options)
            .await
    }

    /// Creates an index over `fields` on the named collection and returns
    /// its name.
    pub async fn create_index_in(
        &self,
        collection_name: &str,
        fields: &[(&str, IndexKind)],
        index_options: &IndexCreationOptions,
        options: OperationOptions<'_>,
    ) -> RepositoryResult<String> {
        let model = index_model(index_keys(fields)?, index_options);

        let OperationOptions {
            partition_key,
            session,
            cancellation,
        } = options;
        let collection = self
            .context
            .collection_named::<BsonDocument>(collection_name, partition_key)?;

        guard(cancellation, "create_index", async move {
            let result = with_session!(collection.create_index(model), session)?;
            info!(
                collection = %collection.name(),
                index = %result.index_name,
                "Created index"
            );
            Ok(result.index_name)
        })
        .await
    }

    /// Drops the index called `name`.
    pub async fn drop_index<T: Document>(
        &self,
        name: &str,
        options: OperationOptions<'_>,
    ) -> RepositoryResult<()> {
        self.drop_index_in(&T::collection_name(), name, options)
            .await
    }

    /// Drops the index called `name` from the named collection.
    pub async fn drop_index_in(
        &self,
        collection_name: &str,
        name: &str,
        options: OperationOptions<'_>,
    ) -> RepositoryResult<()> {
        let OperationOptions {
            partition_key,
            session,
            cancellation,
        } = options;
        let collection = self
            .context
            .collection_named::<BsonDocument>(collection_name, partition_key)?;

        guard(cancellation, "drop_index", async move {
            with_session!(collection.drop_index(name), session)?;
            info!(collection = %collection.name(), index = %name, "Dropped index");
            Ok(())
        })
        .await
    }
}
