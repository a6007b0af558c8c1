//! Repository facades.
//!
//! [`ReadOnlyRepository`] exposes every query; [`Repository`] adds inserts,
//! updates, deletes and index management. Both traits provide their
//! operations on top of the handlers in [`operations`](crate::operations),
//! so an implementation only has to hand out those handlers.
//!
//! ```text
//! ReadOnlyRepository ── ReadOnlyMongoRepository
//!     └── Repository ── MongoRepository
//! ```

mod mongo;
mod read_only;

pub use mongo::MongoRepository;
pub use read_only::ReadOnlyMongoRepository;

use async_trait::async_trait;
use mongodb::bson::{Bson, Document as BsonDocument};
use mongodb::options::UpdateModifications;
use mongodb::Cursor;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::instrument;

use crate::context::MongoDbContext;
use crate::document::{Document, PartitionedDocument};
use crate::error::RepositoryResult;
use crate::operations::{
    IndexCreationOptions, IndexKind, MongoDbCreator, MongoDbEraser, MongoDbIndexHandler,
    MongoDbReader, MongoDbUpdater, UpdateOutcome,
};
use crate::options::{OperationOptions, Page, SortDirection};

/// Read access to documents.
///
/// Every operation takes a driver filter document (use `doc! {}` to match
/// everything) and an [`OperationOptions`] selecting partition, session and
/// cancellation.
#[async_trait]
pub trait ReadOnlyRepository: Send + Sync {
    /// The reader executing queries for this repository.
    fn reader(&self) -> &MongoDbReader;

    /// Returns the document with the given id.
    async fn get_by_id<T: Document>(
        &self,
        id: &T::Key,
        options: OperationOptions<'_>,
    ) -> RepositoryResult<Option<T>> {
        self.reader().get_by_id(id, options).await
    }

    /// Returns the first document matching `filter`.
    async fn get_one<T: Document>(
        &self,
        filter: BsonDocument,
        options: OperationOptions<'_>,
    ) -> RepositoryResult<Option<T>> {
        self.reader().get_one(filter, options).await
    }

    /// Returns a driver cursor over the documents matching `filter`.
    async fn get_cursor<T: Document>(
        &self,
        filter: BsonDocument,
        partition_key: Option<&str>,
    ) -> RepositoryResult<Cursor<T>> {
        self.reader().get_cursor(filter, partition_key).await
    }

    /// Returns `true` if any document matches `filter`.
    async fn any<T: Document>(
        &self,
        filter: BsonDocument,
        options: OperationOptions<'_>,
    ) -> RepositoryResult<bool> {
        self.reader().any::<T>(filter, options).await
    }

    /// Returns every document matching `filter`.
    async fn get_all<T: Document>(
        &self,
        filter: BsonDocument,
        options: OperationOptions<'_>,
    ) -> RepositoryResult<Vec<T>> {
        self.reader().get_all(filter, options).await
    }

    /// Counts the documents matching `filter`.
    async fn count<T: Document>(
        &self,
        filter: BsonDocument,
        options: OperationOptions<'_>,
    ) -> RepositoryResult<u64> {
        self.reader().count::<T>(filter, options).await
    }

    /// Returns the matching document with the largest `field`.
    async fn get_by_max<T: Document>(
        &self,
        filter: BsonDocument,
        field: &str,
        options: OperationOptions<'_>,
    ) -> RepositoryResult<Option<T>> {
        self.reader().get_by_max(filter, field, options).await
    }

    /// Returns the matching document with the smallest `field`.
    async fn get_by_min<T: Document>(
        &self,
        filter: BsonDocument,
        field: &str,
        options: OperationOptions<'_>,
    ) -> RepositoryResult<Option<T>> {
        self.reader().get_by_min(filter, field, options).await
    }

    /// Returns the largest value of `field` among matching documents.
    async fn get_max_value<T, V>(
        &self,
        filter: BsonDocument,
        field: &str,
        options: OperationOptions<'_>,
    ) -> RepositoryResult<Option<V>>
    where
        T: Document,
        V: DeserializeOwned + Send,
    {
        self.reader().get_max_value::<T, V>(filter, field, options).await
    }

    /// Returns the smallest value of `field` among matching documents.
    async fn get_min_value<T, V>(
        &self,
        filter: BsonDocument,
        field: &str,
        options: OperationOptions<'_>,
    ) -> RepositoryResult<Option<V>>
    where
        T: Document,
        V: DeserializeOwned + Send,
    {
        self.reader().get_min_value::<T, V>(filter, field, options).await
    }

    /// Sums an integer field over matching documents.
    async fn sum_by_i64<T: Document>(
        &self,
        filter: BsonDocument,
        field: &str,
        options: OperationOptions<'_>,
    ) -> RepositoryResult<i64> {
        self.reader().sum_by_i64::<T>(filter, field, options).await
    }

    /// Sums a numeric field over matching documents as a float.
    async fn sum_by_f64<T: Document>(
        &self,
        filter: BsonDocument,
        field: &str,
        options: OperationOptions<'_>,
    ) -> RepositoryResult<f64> {
        self.reader().sum_by_f64::<T>(filter, field, options).await
    }

    /// Returns the first matching document shaped by `projection`.
    async fn project_one<T, R>(
        &self,
        filter: BsonDocument,
        projection: BsonDocument,
        options: OperationOptions<'_>,
    ) -> RepositoryResult<Option<R>>
    where
        T: Document,
        R: DeserializeOwned + Send + Sync + Unpin,
    {
        self.reader()
            .project_one::<T, R>(filter, projection, options)
            .await
    }

    /// Returns every matching document shaped by `projection`.
    async fn project_many<T, R>(
        &self,
        filter: BsonDocument,
        projection: BsonDocument,
        options: OperationOptions<'_>,
    ) -> RepositoryResult<Vec<R>>
    where
        T: Document,
        R: DeserializeOwned + Send + Sync + Unpin,
    {
        self.reader()
            .project_many::<T, R>(filter, projection, options)
            .await
    }

    /// Groups matching documents by `group_key` into `R`.
    async fn group_by<T, R>(
        &self,
        filter: BsonDocument,
        group_key: &str,
        accumulators: BsonDocument,
        options: OperationOptions<'_>,
    ) -> RepositoryResult<Vec<R>>
    where
        T: Document,
        R: DeserializeOwned + Send,
    {
        self.reader()
            .group_by::<T, R>(filter, group_key, accumulators, options)
            .await
    }

    /// Returns one page of matching documents ordered by `sort_field`.
    async fn get_sorted_paginated<T: Document>(
        &self,
        filter: BsonDocument,
        sort_field: &str,
        direction: SortDirection,
        page: Page,
        options: OperationOptions<'_>,
    ) -> RepositoryResult<Vec<T>> {
        self.reader()
            .get_sorted_paginated(filter, sort_field, direction, page, options)
            .await
    }

    /// Returns one page of matching documents ordered by a sort document.
    async fn get_sorted_paginated_by<T: Document>(
        &self,
        filter: BsonDocument,
        sort: BsonDocument,
        page: Page,
        options: OperationOptions<'_>,
    ) -> RepositoryResult<Vec<T>> {
        self.reader()
            .get_sorted_paginated_by(filter, sort, page, options)
            .await
    }

    /// Returns the distinct values of `field` among matching documents.
    async fn distinct<T: Document>(
        &self,
        field: &str,
        filter: BsonDocument,
        options: OperationOptions<'_>,
    ) -> RepositoryResult<Vec<Bson>> {
        self.reader().distinct::<T>(field, filter, options).await
    }
}

/// Full read-write access to documents and their indexes.
#[async_trait]
pub trait Repository: ReadOnlyRepository {
    /// The context collections are resolved against.
    fn context(&self) -> &MongoDbContext;

    /// The creator executing inserts.
    fn creator(&self) -> &MongoDbCreator;

    /// The updater executing replacements and updates.
    fn updater(&self) -> &MongoDbUpdater;

    /// The eraser executing deletes.
    fn eraser(&self) -> &MongoDbEraser;

    /// The handler managing indexes.
    fn index_handler(&self) -> &MongoDbIndexHandler;

    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Inserts one document, generating its key if unset.
    #[instrument(skip_all, fields(collection = %T::collection_name(), partition_key = ?options.partition_key))]
    async fn add_one<T: Document>(
        &self,
        document: &mut T,
        options: OperationOptions<'_>,
    ) -> RepositoryResult<()> {
        self.creator().add_one(document, options).await
    }

    /// Inserts several documents into one collection.
    #[instrument(skip_all, fields(collection = %T::collection_name(), count = documents.len()))]
    async fn add_many<T: Document>(
        &self,
        documents: &mut [T],
        options: OperationOptions<'_>,
    ) -> RepositoryResult<()> {
        self.creator().add_many(documents, options).await
    }

    /// Inserts one document into its own partition.
    async fn add_one_partitioned<T: PartitionedDocument>(
        &self,
        document: &mut T,
        options: OperationOptions<'_>,
    ) -> RepositoryResult<()> {
        self.creator().add_one_partitioned(document, options).await
    }

    /// Inserts documents grouped by their partitions.
    async fn add_many_partitioned<T: PartitionedDocument>(
        &self,
        documents: &mut [T],
        options: OperationOptions<'_>,
    ) -> RepositoryResult<()> {
        self.creator().add_many_partitioned(documents, options).await
    }

    // ------------------------------------------------------------------
    // Update
    // ------------------------------------------------------------------

    /// Replaces the stored document with `document`.
    async fn update_one<T: Document>(
        &self,
        document: &T,
        options: OperationOptions<'_>,
    ) -> RepositoryResult<bool> {
        self.updater().update_one(document, options).await
    }

    /// Applies `update` to the stored copy of `document`.
    async fn update_one_with<T, U>(
        &self,
        document: &T,
        update: U,
        options: OperationOptions<'_>,
    ) -> RepositoryResult<bool>
    where
        T: Document,
        U: Into<UpdateModifications> + Send,
    {
        self.updater()
            .update_one_with::<T, U>(document, update, options)
            .await
    }

    /// Sets one field on the stored copy of `document`.
    async fn update_one_field<T, V>(
        &self,
        document: &T,
        field: &str,
        value: &V,
        options: OperationOptions<'_>,
    ) -> RepositoryResult<bool>
    where
        T: Document,
        V: Serialize + Sync + ?Sized,
    {
        self.updater()
            .update_one_field(document, field, value, options)
            .await
    }

    /// Applies `update` to the first document matching `filter`.
    async fn update_one_by_filter<T, U>(
        &self,
        filter: BsonDocument,
        update: U,
        options: OperationOptions<'_>,
    ) -> RepositoryResult<bool>
    where
        T: Document,
        U: Into<UpdateModifications> + Send,
    {
        self.updater()
            .update_one_by_filter::<T, U>(filter, update, options)
            .await
    }

    /// Sets one field on the first document matching `filter`.
    async fn update_one_field_by_filter<T, V>(
        &self,
        filter: BsonDocument,
        field: &str,
        value: &V,
        options: OperationOptions<'_>,
    ) -> RepositoryResult<bool>
    where
        T: Document,
        V: Serialize + Sync + ?Sized,
    {
        self.updater()
            .update_one_field_by_filter::<T, V>(filter, field, value, options)
            .await
    }

    /// Applies `update` to every document matching `filter`.
    #[instrument(skip_all, fields(collection = %T::collection_name(), partition_key = ?options.partition_key))]
    async fn update_many<T, U>(
        &self,
        filter: BsonDocument,
        update: U,
        options: OperationOptions<'_>,
    ) -> RepositoryResult<u64>
    where
        T: Document,
        U: Into<UpdateModifications> + Send,
    {
        self.updater()
            .update_many::<T, U>(filter, update, options)
            .await
    }

    /// Sets one field on every document matching `filter`.
    async fn update_many_field<T, V>(
        &self,
        filter: BsonDocument,
        field: &str,
        value: &V,
        options: OperationOptions<'_>,
    ) -> RepositoryResult<u64>
    where
        T: Document,
        V: Serialize + Sync + ?Sized,
    {
        self.updater()
            .update_many_field::<T, V>(filter, field, value, options)
            .await
    }

    /// Updates the first match or inserts a new document.
    async fn upsert_one<T, U>(
        &self,
        filter: BsonDocument,
        update: U,
        options: OperationOptions<'_>,
    ) -> RepositoryResult<UpdateOutcome>
    where
        T: Document,
        U: Into<UpdateModifications> + Send,
    {
        self.updater()
            .upsert_one::<T, U>(filter, update, options)
            .await
    }

    /// Atomically updates the first match and returns it.
    async fn find_one_and_update<T, U>(
        &self,
        filter: BsonDocument,
        update: U,
        return_updated: bool,
        options: OperationOptions<'_>,
    ) -> RepositoryResult<Option<T>>
    where
        T: Document,
        U: Into<UpdateModifications> + Send,
    {
        self.updater()
            .find_one_and_update::<T, U>(filter, update, return_updated, options)
            .await
    }

    // ------------------------------------------------------------------
    // Delete
    // ------------------------------------------------------------------

    /// Deletes the stored copy of `document`.
    async fn delete_one<T: Document>(
        &self,
        document: &T,
        options: OperationOptions<'_>,
    ) -> RepositoryResult<u64> {
        self.eraser().delete_one(document, options).await
    }

    /// Deletes the first document matching `filter`.
    async fn delete_one_by<T: Document>(
        &self,
        filter: BsonDocument,
        options: OperationOptions<'_>,
    ) -> RepositoryResult<u64> {
        self.eraser().delete_one_by::<T>(filter, options).await
    }

    /// Deletes every document matching `filter`.
    #[instrument(skip_all, fields(collection = %T::collection_name(), partition_key = ?options.partition_key))]
    async fn delete_many<T: Document>(
        &self,
        filter: BsonDocument,
        options: OperationOptions<'_>,
    ) -> RepositoryResult<u64> {
        self.eraser().delete_many::<T>(filter, options).await
    }

    /// Deletes the stored copies of `documents`.
    async fn delete_many_documents<T: Document>(
        &self,
        documents: &[T],
        options: OperationOptions<'_>,
    ) -> RepositoryResult<u64> {
        self.eraser().delete_many_documents(documents, options).await
    }

    /// Deletes `documents` from their own partitions.
    async fn delete_many_partitioned<T: PartitionedDocument>(
        &self,
        documents: &[T],
        options: OperationOptions<'_>,
    ) -> RepositoryResult<u64> {
        self.eraser().delete_many_partitioned(documents, options).await
    }

    // ------------------------------------------------------------------
    // Indexes
    // ------------------------------------------------------------------

    /// Returns the names of all indexes on the collection.
    async fn get_index_names<T: Document>(
        &self,
        options: OperationOptions<'_>,
    ) -> RepositoryResult<Vec<String>> {
        self.index_handler().get_index_names::<T>(options).await
    }

    /// Creates a text index on `field`.
    async fn create_text_index<T: Document>(
        &self,
        field: &str,
        index_options: &IndexCreationOptions,
        options: OperationOptions<'_>,
    ) -> RepositoryResult<String> {
        self.index_handler()
            .create_text_index::<T>(field, index_options, options)
            .await
    }

    /// Creates an ascending index on `field`.
    async fn create_ascending_index<T: Document>(
        &self,
        field: &str,
        index_options: &IndexCreationOptions,
        options: OperationOptions<'_>,
    ) -> RepositoryResult<String> {
        self.index_handler()
            .create_ascending_index::<T>(field, index_options, options)
            .await
    }

    /// Creates a descending index on `field`.
    async fn create_descending_index<T: Document>(
        &self,
        field: &str,
        index_options: &IndexCreationOptions,
        options: OperationOptions<'_>,
    ) -> RepositoryResult<String> {
        self.index_handler()
            .create_descending_index::<T>(field, index_options, options)
            .await
    }

    /// Creates a hashed index on `field`.
    async fn create_hashed_index<T: Document>(
        &self,
        field: &str,
        index_options: &IndexCreationOptions,
        options: OperationOptions<'_>,
    ) -> RepositoryResult<String> {
        self.index_handler()
            .create_hashed_index::<T>(field, index_options, options)
            .await
    }

    /// Creates one text index across `fields`.
    async fn create_combined_text_index<T: Document>(
        &self,
        fields: &[&str],
        index_options: &IndexCreationOptions,
        options: OperationOptions<'_>,
    ) -> RepositoryResult<String> {
        self.index_handler()
            .create_combined_text_index::<T>(fields, index_options, options)
            .await
    }

    /// Creates an index over several fields.
    async fn create_compound_index<T: Document>(
        &self,
        fields: &[(&str, IndexKind)],
        index_options: &IndexCreationOptions,
        options: OperationOptions<'_>,
    ) -> RepositoryResult<String> {
        self.index_handler()
            .create_compound_index::<T>(fields, index_options, options)
            .await
    }

    /// Drops the index called `name`.
    async fn drop_index<T: Document>(
        &self,
        name: &str,
        options: OperationOptions<'_>,
    ) -> RepositoryResult<()> {
        self.index_handler().drop_index::<T>(name, options).await
    }

    /// Drops the whole collection for `T` in the given partition.
    async fn drop_collection<T: Document>(&self, partition_key: Option<&str>) -> RepositoryResult<()> {
        self.context().drop_collection::<T>(partition_key).await
    }
}
