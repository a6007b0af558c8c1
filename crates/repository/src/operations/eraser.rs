//! Delete operations.

use std::sync::Arc;

use mongodb::bson::Document as BsonDocument;
use mongodb::{ClientSession, Collection};
use tracing::debug;

use super::builders::{id_filter, ids_filter};
use super::creator::partition_targets;
use super::with_session;
use crate::context::MongoDbContext;
use crate::document::{Document, PartitionedDocument};
use crate::error::RepositoryResult;
use crate::options::{guard, OperationOptions};

/// Deletes documents and reports how many were removed.
#[derive(Debug, Clone)]
pub struct MongoDbEraser {
    context: Arc<MongoDbContext>,
}

impl MongoDbEraser {
    /// Creates an eraser over the given context.
    pub fn new(context: Arc<MongoDbContext>) -> Self {
        Self { context }
    }

    /// Deletes the stored document that has `document`'s id.
    pub async fn delete_one<T: Document>(
        &self,
        document: &T,
        options: OperationOptions<'_>,
    ) -> RepositoryResult<u64> {
        self.delete_one_by::<T>(id_filter(document.id()), options)
            .await
    }

    /// Deletes the first document matching `filter`.
    pub async fn delete_one_by<T: Document>(
        &self,
        filter: BsonDocument,
        options: OperationOptions<'_>,
    ) -> RepositoryResult<u64> {
        let OperationOptions {
            partition_key,
            session,
            cancellation,
        } = options;
        let collection = self.context.collection::<T>(partition_key)?;

        guard(cancellation, "delete_one", async move {
            let result = with_session!(collection.delete_one(filter), session)?;
            Ok(result.deleted_count)
        })
        .await
    }

    /// Deletes every document matching `filter`.
    pub async fn delete_many<T: Document>(
        &self,
        filter: BsonDocument,
        options: OperationOptions<'_>,
    ) -> RepositoryResult<u64> {
        let OperationOptions {
            partition_key,
            session,
            cancellation,
        } = options;
        let collection = self.context.collection::<T>(partition_key)?;

        guard(cancellation, "delete_many", async move {
            delete_matching(&collection, filter, session).await
        })
        .await
    }

    /// Deletes the stored documents that have the ids of `documents`.
    /// An empty slice deletes nothing and issues no driver call.
    pub async fn delete_many_documents<T: Document>(
        &self,
        documents: &[T],
        options: OperationOptions<'_>,
    ) -> RepositoryResult<u64> {
        if documents.is_empty() {
            return Ok(0);
        }
        let filter = ids_filter(documents.iter().map(|d| d.id()));
        self.delete_many::<T>(filter, options).await
    }

    /// Deletes `documents` from their own partitions, one `deleteMany` per
    /// partition, and returns the total removed.
    ///
    /// An explicit `options.partition_key` sends every delete to that
    /// partition instead. Every partition key is validated before the first
    /// delete is sent.
    pub async fn delete_many_partitioned<T: PartitionedDocument>(
        &self,
        documents: &[T],
        options: OperationOptions<'_>,
    ) -> RepositoryResult<u64> {
        if documents.is_empty() {
            return Ok(0);
        }

        let OperationOptions {
            partition_key,
            mut session,
            cancellation,
        } = options;
        let targets = partition_targets(&self.context, documents.iter(), partition_key)?;

        guard(cancellation, "delete_many", async {
            let mut deleted = 0;
            for (collection, group) in targets {
                let filter = ids_filter(group.iter().map(|d| d.id()));
                deleted += delete_matching(&collection, filter, session.as_deref_mut()).await?;
            }
            Ok(deleted)
        })
        .await
    }
}

async fn delete_matching<T: Send + Sync>(
    collection: &Collection<T>,
    filter: BsonDocument,
    session: Option<&mut ClientSession>,
) -> RepositoryResult<u64> {
    let result = with_session!(collection.delete_many(filter), session)?;
    debug!(
        collection = %collection.name(),
        deleted = result.deleted_count,
        "Deleted documents"
    );
    Ok(result.deleted_count)
}
