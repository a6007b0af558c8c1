//! Replace and update operations.

use std::sync::Arc;

use mongodb::bson::{Bson, Document as BsonDocument};
use mongodb::options::{FindOneAndUpdateOptions, ReturnDocument, UpdateModifications, UpdateOptions};
use mongodb::results::UpdateResult;
use serde::Serialize;
use tracing::debug;

use super::builders::{id_filter, set_field};
use super::with_session;
use crate::context::MongoDbContext;
use crate::document::Document;
use crate::error::RepositoryResult;
use crate::options::{guard, OperationOptions};

/// Counts reported by the driver for an update.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateOutcome {
    /// Documents matched by the filter.
    pub matched: u64,
    /// Documents actually changed.
    pub modified: u64,
    /// `_id` of the inserted document when an upsert created one.
    pub upserted_id: Option<Bson>,
}

impl UpdateOutcome {
    /// Returns `true` if exactly one document was modified.
    pub fn modified_one(&self) -> bool {
        self.modified == 1
    }
}

impl From<UpdateResult> for UpdateOutcome {
    fn from(result: UpdateResult) -> Self {
        Self {
            matched: result.matched_count,
            modified: result.modified_count,
            upserted_id: result.upserted_id,
        }
    }
}

/// How many documents an update may touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    One,
    Many,
}

/// Replaces documents and applies update definitions.
///
/// Single-document operations report `true` only when the driver says
/// exactly one document was modified; an update that matches but leaves the
/// document unchanged reports `false`.
#[derive(Debug, Clone)]
pub struct MongoDbUpdater {
    context: Arc<MongoDbContext>,
}

impl MongoDbUpdater {
    /// Creates an updater over the given context.
    pub fn new(context: Arc<MongoDbContext>) -> Self {
        Self { context }
    }

    /// Replaces the stored document that has `document`'s id.
    pub async fn update_one<T: Document>(
        &self,
        document: &T,
        options: OperationOptions<'_>,
    ) -> RepositoryResult<bool> {
        let OperationOptions {
            partition_key,
            session,
            cancellation,
        } = options;
        let collection = self.context.collection::<T>(partition_key)?;
        let filter = id_filter(document.id());

        guard(cancellation, "update_one", async {
            let result = with_session!(collection.replace_one(filter, document), session)?;
            Ok(UpdateOutcome::from(result).modified_one())
        })
        .await
    }

    /// Applies `update` to the stored document that has `document`'s id.
    pub async fn update_one_with<T, U>(
        &self,
        document: &T,
        update: U,
        options: OperationOptions<'_>,
    ) -> RepositoryResult<bool>
    where
        T: Document,
        U: Into<UpdateModifications> + Send,
    {
        self.update_one_by_filter::<T, U>(id_filter(document.id()), update, options)
            .await
    }

    /// Sets `field` to `value` on the stored document that has `document`'s id.
    pub async fn update_one_field<T, V>(
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
        let update = set_field(field, value)?;
        self.update_one_by_filter::<T, _>(id_filter(document.id()), update, options)
            .await
    }

    /// Applies `update` to the first document matching `filter`.
    pub async fn update_one_by_filter<T, U>(
        &self,
        filter: BsonDocument,
        update: U,
        options: OperationOptions<'_>,
    ) -> RepositoryResult<bool>
    where
        T: Document,
        U: Into<UpdateModifications> + Send,
    {
        let outcome = self
            .apply::<T>(filter, update.into(), Scope::One, UpdateOptions::default(), options)
            .await?;
        Ok(outcome.modified_one())
    }

    /// Sets `field` to `value` on the first document matching `filter`.
    pub async fn update_one_field_by_filter<T, V>(
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
        let update = set_field(field, value)?;
        self.update_one_by_filter::<T, _>(filter, update, options)
            .await
    }

    /// Applies `update` to every document matching `filter` and returns the
    /// number of modified documents.
    pub async fn update_many<T, U>(
        &self,
        filter: BsonDocument,
        update: U,
        options: OperationOptions<'_>,
    ) -> RepositoryResult<u64>
    where
        T: Document,
        U: Into<UpdateModifications> + Send,
    {
        let outcome = self
            .apply::<T>(filter, update.into(), Scope::Many, UpdateOptions::default(), options)
            .await?;
        Ok(outcome.modified)
    }

    /// Sets `field` to `value` on every document matching `filter`.
    pub async fn update_many_field<T, V>(
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
        let update = set_field(field, value)?;
        self.update_many::<T, _>(filter, update, options).await
    }

    /// Applies `update` to the first match, inserting a new document built
    /// from the filter and update when nothing matches.
    pub async fn upsert_one<T, U>(
        &self,
        filter: BsonDocument,
        update: U,
        options: OperationOptions<'_>,
    ) -> RepositoryResult<UpdateOutcome>
    where
        T: Document,
        U: Into<UpdateModifications> + Send,
    {
        let mut update_options = UpdateOptions::default();
        update_options.upsert = Some(true);
        self.apply::<T>(filter, update.into(), Scope::One, update_options, options)
            .await
    }

    /// Atomically updates the first match and returns it, either as it was
    /// before the update or as it is after (`return_updated`).
    pub async fn find_one_and_update<T, U>(
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
        let OperationOptions {
            partition_key,
            session,
            cancellation,
        } = options;
        let collection = self.context.collection::<T>(partition_key)?;
        let update = update.into();
        let mut find_options = FindOneAndUpdateOptions::default();
        find_options.return_document = Some(if return_updated {
            ReturnDocument::After
        } else {
            ReturnDocument::Before
        });

        guard(cancellation, "find_one_and_update", async move {
            Ok(with_session!(
                collection
                    .find_one_and_update(filter, update)
                    .with_options(find_options),
                session
            )?)
        })
        .await
    }

    async fn apply<T: Document>(
        &self,
        filter: BsonDocument,
        update: UpdateModifications,
        scope: Scope,
        update_options: UpdateOptions,
        options: OperationOptions<'_>,
    ) -> RepositoryResult<UpdateOutcome> {
        let OperationOptions {
            partition_key,
            session,
            cancellation,
        } = options;
        let collection = self.context.collection::<T>(partition_key)?;
        let operation = match scope {
            Scope::One => "update_one",
            Scope::Many => "update_many",
        };

        guard(cancellation, operation, async move {
            let result = match scope {
                Scope::One => with_session!(
                    collection.update_one(filter, update).with_options(update_options),
                    session
                ),
                Scope::Many => with_session!(
                    collection.update_many(filter, update).with_options(update_options),
                    session
                ),
            }?;
            let outcome = UpdateOutcome::from(result);
            debug!(
                collection = %collection.name(),
                matched = outcome.matched,
                modified = outcome.modified,
                "Applied update"
            );
            Ok(outcome)
        })
        .await
    }
}
