//! Read operations.

use std::sync::Arc;

use mongodb::bson::{self, Bson, Document as BsonDocument};
use mongodb::options::{CountOptions, FindOneOptions, FindOptions};
use mongodb::{Collection, Cursor};
use serde::de::DeserializeOwned;
use tracing::trace;

use super::builders::{
    field_projection, group_pipeline, id_filter, lookup_path, sort_by, sum_as_f64, sum_as_i64,
    sum_pipeline,
};
use super::{aggregate_all, find_all, with_session};
use crate::context::MongoDbContext;
use crate::document::Document;
use crate::error::RepositoryResult;
use crate::options::{guard, OperationOptions, Page, SortDirection};

/// Executes queries, projections and aggregation helpers.
#[derive(Debug, Clone)]
pub struct MongoDbReader {
    context: Arc<MongoDbContext>,
}

impl MongoDbReader {
    /// Creates a reader over the given context.
    pub fn new(context: Arc<MongoDbContext>) -> Self {
        Self { context }
    }

    fn collection<T: Document>(&self, partition_key: Option<&str>) -> RepositoryResult<Collection<T>> {
        let collection = self.context.collection::<T>(partition_key)?;
        trace!(collection = %collection.name(), "Resolved collection for read");
        Ok(collection)
    }

    /// Returns the document with the given id.
    pub async fn get_by_id<T: Document>(
        &self,
        id: &T::Key,
        options: OperationOptions<'_>,
    ) -> RepositoryResult<Option<T>> {
        self.get_one(id_filter(id), options).await
    }

    /// Returns the first document matching `filter`.
    pub async fn get_one<T: Document>(
        &self,
        filter: BsonDocument,
        options: OperationOptions<'_>,
    ) -> RepositoryResult<Option<T>> {
        let OperationOptions {
            partition_key,
            session,
            cancellation,
        } = options;
        let collection = self.collection::<T>(partition_key)?;

        guard(cancellation, "get_one", async move {
            Ok(with_session!(collection.find_one(filter), session)?)
        })
        .await
    }

    /// Returns a driver cursor over the documents matching `filter`.
    ///
    /// The cursor is not bound to a session; use [`get_all`](Self::get_all)
    /// for reads that must run inside one.
    pub async fn get_cursor<T: Document>(
        &self,
        filter: BsonDocument,
        partition_key: Option<&str>,
    ) -> RepositoryResult<Cursor<T>> {
        let collection = self.collection::<T>(partition_key)?;
        Ok(collection.find(filter).await?)
    }

    /// Returns `true` if at least one document matches `filter`.
    pub async fn any<T: Document>(
        &self,
        filter: BsonDocument,
        options: OperationOptions<'_>,
    ) -> RepositoryResult<bool> {
        let mut count_options = CountOptions::default();
        count_options.limit = Some(1);
        let count = self.count_with::<T>(filter, count_options, options, "any").await?;
        Ok(count > 0)
    }

    /// Returns every document matching `filter`.
    pub async fn get_all<T: Document>(
        &self,
        filter: BsonDocument,
        options: OperationOptions<'_>,
    ) -> RepositoryResult<Vec<T>> {
        self.find_with(filter, FindOptions::default(), options, "get_all")
            .await
    }

    /// Counts the documents matching `filter`.
    pub async fn count<T: Document>(
        &self,
        filter: BsonDocument,
        options: OperationOptions<'_>,
    ) -> RepositoryResult<u64> {
        self.count_with::<T>(filter, CountOptions::default(), options, "count")
            .await
    }

    /// Returns the matching document with the largest value of `field`.
    pub async fn get_by_max<T: Document>(
        &self,
        filter: BsonDocument,
        field: &str,
        options: OperationOptions<'_>,
    ) -> RepositoryResult<Option<T>> {
        self.find_one_sorted(filter, sort_by(field, SortDirection::Descending), options)
            .await
    }

    /// Returns the matching document with the smallest value of `field`.
    pub async fn get_by_min<T: Document>(
        &self,
        filter: BsonDocument,
        field: &str,
        options: OperationOptions<'_>,
    ) -> RepositoryResult<Option<T>> {
        self.find_one_sorted(filter, sort_by(field, SortDirection::Ascending), options)
            .await
    }

    /// Returns the largest value of `field` among matching documents.
    pub async fn get_max_value<T, V>(
        &self,
        filter: BsonDocument,
        field: &str,
        options: OperationOptions<'_>,
    ) -> RepositoryResult<Option<V>>
    where
        T: Document,
        V: DeserializeOwned,
    {
        self.extreme_value::<T, V>(filter, field, SortDirection::Descending, options)
            .await
    }

    /// Returns the smallest value of `field` among matching documents.
    pub async fn get_min_value<T, V>(
        &self,
        filter: BsonDocument,
        field: &str,
        options: OperationOptions<'_>,
    ) -> RepositoryResult<Option<V>>
    where
        T: Document,
        V: DeserializeOwned,
    {
        self.extreme_value::<T, V>(filter, field, SortDirection::Ascending, options)
            .await
    }

    /// Sums an integer field over matching documents. No matches sum to zero.
    pub async fn sum_by_i64<T: Document>(
        &self,
        filter: BsonDocument,
        field: &str,
        options: OperationOptions<'_>,
    ) -> RepositoryResult<i64> {
        let results = self
            .aggregate::<T>(sum_pipeline(filter, field), options, "sum_by")
            .await?;
        sum_as_i64(results.first())
    }

    /// Sums a numeric field over matching documents as a float.
    pub async fn sum_by_f64<T: Document>(
        &self,
        filter: BsonDocument,
        field: &str,
        options: OperationOptions<'_>,
    ) -> RepositoryResult<f64> {
        let results = self
            .aggregate::<T>(sum_pipeline(filter, field), options, "sum_by")
            .await?;
        sum_as_f64(results.first())
    }

    /// Returns the first matching document shaped by `projection`.
    pub async fn project_one<T, R>(
        &self,
        filter: BsonDocument,
        projection: BsonDocument,
        options: OperationOptions<'_>,
    ) -> RepositoryResult<Option<R>>
    where
        T: Document,
        R: DeserializeOwned + Send + Sync + Unpin,
    {
        let OperationOptions {
            partition_key,
            session,
            cancellation,
        } = options;
        let collection = self.collection::<T>(partition_key)?.clone_with_type::<R>();
        let mut find_options = FindOneOptions::default();
        find_options.projection = Some(projection);

        guard(cancellation, "project_one", async move {
            Ok(with_session!(
                collection.find_one(filter).with_options(find_options),
                session
            )?)
        })
        .await
    }

    /// Returns every matching document shaped by `projection`.
    pub async fn project_many<T, R>(
        &self,
        filter: BsonDocument,
        projection: BsonDocument,
        options: OperationOptions<'_>,
    ) -> RepositoryResult<Vec<R>>
    where
        T: Document,
        R: DeserializeOwned + Send + Sync + Unpin,
    {
        let OperationOptions {
            partition_key,
            session,
            cancellation,
        } = options;
        let collection = self.collection::<T>(partition_key)?.clone_with_type::<R>();
        let mut find_options = FindOptions::default();
        find_options.projection = Some(projection);

        guard(cancellation, "project_many", async move {
            find_all(&collection, filter, find_options, session).await
        })
        .await
    }

    /// Groups matching documents by `group_key` and projects each group
    /// through `accumulators` into `R`.
    ///
    /// The group key is available to `R` as `_id`.
    pub async fn group_by<T, R>(
        &self,
        filter: BsonDocument,
        group_key: &str,
        accumulators: BsonDocument,
        options: OperationOptions<'_>,
    ) -> RepositoryResult<Vec<R>>
    where
        T: Document,
        R: DeserializeOwned,
    {
        let pipeline = group_pipeline(filter, group_key, accumulators)?;
        let groups = self.aggregate::<T>(pipeline, options, "group_by").await?;
        groups
            .into_iter()
            .map(|group| Ok(bson::from_document(group)?))
            .collect()
    }

    /// Returns one page of matching documents ordered by `sort_field`.
    pub async fn get_sorted_paginated<T: Document>(
        &self,
        filter: BsonDocument,
        sort_field: &str,
        direction: SortDirection,
        page: Page,
        options: OperationOptions<'_>,
    ) -> RepositoryResult<Vec<T>> {
        self.get_sorted_paginated_by(filter, sort_by(sort_field, direction), page, options)
            .await
    }

    /// Returns one page of matching documents ordered by a driver sort document.
    pub async fn get_sorted_paginated_by<T: Document>(
        &self,
        filter: BsonDocument,
        sort: BsonDocument,
        page: Page,
        options: OperationOptions<'_>,
    ) -> RepositoryResult<Vec<T>> {
        let mut find_options = FindOptions::default();
        find_options.sort = Some(sort);
        find_options.skip = Some(page.skip);
        find_options.limit = Some(page.limit);

        self.find_with(filter, find_options, options, "get_sorted_paginated")
            .await
    }

    /// Returns the distinct values of `field` among matching documents.
    pub async fn distinct<T: Document>(
        &self,
        field: &str,
        filter: BsonDocument,
        options: OperationOptions<'_>,
    ) -> RepositoryResult<Vec<Bson>> {
        let OperationOptions {
            partition_key,
            session,
            cancellation,
        } = options;
        let collection = self.collection::<T>(partition_key)?;

        guard(cancellation, "distinct", async move {
            Ok(with_session!(collection.distinct(field, filter), session)?)
        })
        .await
    }

    async fn find_with<T: Document>(
        &self,
        filter: BsonDocument,
        find_options: FindOptions,
        options: OperationOptions<'_>,
        operation: &'static str,
    ) -> RepositoryResult<Vec<T>> {
        let OperationOptions {
            partition_key,
            session,
            cancellation,
        } = options;
        let collection = self.collection::<T>(partition_key)?;

        guard(cancellation, operation, async move {
            find_all(&collection, filter, find_options, session).await
        })
        .await
    }

    async fn count_with<T: Document>(
        &self,
        filter: BsonDocument,
        count_options: CountOptions,
        options: OperationOptions<'_>,
        operation: &'static str,
    ) -> RepositoryResult<u64> {
        let OperationOptions {
            partition_key,
            session,
            cancellation,
        } = options;
        let collection = self.collection::<T>(partition_key)?;

        guard(cancellation, operation, async move {
            Ok(with_session!(
                collection.count_documents(filter).with_options(count_options),
                session
            )?)
        })
        .await
    }

    async fn find_one_sorted<T: Document>(
        &self,
        filter: BsonDocument,
        sort: BsonDocument,
        options: OperationOptions<'_>,
    ) -> RepositoryResult<Option<T>> {
        let OperationOptions {
            partition_key,
            session,
            cancellation,
        } = options;
        let collection = self.collection::<T>(partition_key)?;
        let mut find_options = FindOneOptions::default();
        find_options.sort = Some(sort);

        guard(cancellation, "find_one_sorted", async move {
            Ok(with_session!(
                collection.find_one(filter).with_options(find_options),
                session
            )?)
        })
        .await
    }

    async fn extreme_value<T, V>(
        &self,
        filter: BsonDocument,
        field: &str,
        direction: SortDirection,
        options: OperationOptions<'_>,
    ) -> RepositoryResult<Option<V>>
    where
        T: Document,
        V: DeserializeOwned,
    {
        let OperationOptions {
            partition_key,
            session,
            cancellation,
        } = options;
        let collection = self
            .collection::<T>(partition_key)?
            .clone_with_type::<BsonDocument>();
        let mut find_options = FindOneOptions::default();
        find_options.sort = Some(sort_by(field, direction));
        find_options.projection = Some(field_projection(field));

        let found = guard(cancellation, "extreme_value", async move {
            Ok(with_session!(
                collection.find_one(filter).with_options(find_options),
                session
            )?)
        })
        .await?;

        match found.as_ref().and_then(|d| lookup_path(d, field)) {
            None | Some(Bson::Null) => Ok(None),
            Some(value) => Ok(Some(bson::from_bson(value.clone())?)),
        }
    }

    async fn aggregate<T: Document>(
        &self,
        pipeline: Vec<BsonDocument>,
        options: OperationOptions<'_>,
        operation: &'static str,
    ) -> RepositoryResult<Vec<BsonDocument>> {
        let OperationOptions {
            partition_key,
            session,
            cancellation,
        } = options;
        let collection = self.collection::<T>(partition_key)?;

        guard(cancellation, operation, async move {
            aggregate_all(&collection, pipeline, session).await
        })
        .await
    }
}
