//! Insert operations.

use std::collections::BTreeMap;
use std::sync::Arc;

use mongodb::{ClientSession, Collection};
use tracing::debug;

use super::with_session;
use crate::context::MongoDbContext;
use crate::document::{Document, DocumentKey, PartitionedDocument};
use crate::error::{RepositoryError, RepositoryResult};
use crate::options::{guard, OperationOptions};

/// Inserts documents, generating keys for documents that have none.
#[derive(Debug, Clone)]
pub struct MongoDbCreator {
    context: Arc<MongoDbContext>,
}

impl MongoDbCreator {
    /// Creates a creator over the given context.
    pub fn new(context: Arc<MongoDbContext>) -> Self {
        Self { context }
    }

    /// Inserts one document.
    ///
    /// An unset key is replaced with a generated one before the insert, so
    /// the caller's value carries the stored id afterwards.
    pub async fn add_one<T: Document>(
        &self,
        document: &mut T,
        options: OperationOptions<'_>,
    ) -> RepositoryResult<()> {
        let OperationOptions {
            partition_key,
            session,
            cancellation,
        } = options;
        let collection = self.context.collection::<T>(partition_key)?;
        assign_key(document)?;

        guard(cancellation, "add_one", async {
            with_session!(collection.insert_one(&*document), session)?;
            debug!(collection = %collection.name(), "Inserted document");
            Ok(())
        })
        .await
    }

    /// Inserts several documents into one collection with a single
    /// `insertMany`. An empty slice is a no-op.
    pub async fn add_many<T: Document>(
        &self,
        documents: &mut [T],
        options: OperationOptions<'_>,
    ) -> RepositoryResult<()> {
        if documents.is_empty() {
            return Ok(());
        }

        let OperationOptions {
            partition_key,
            session,
            cancellation,
        } = options;
        let collection = self.context.collection::<T>(partition_key)?;
        for document in documents.iter_mut() {
            assign_key(document)?;
        }

        guard(cancellation, "add_many", async {
            with_session!(collection.insert_many(documents.iter()), session)?;
            debug!(
                collection = %collection.name(),
                count = documents.len(),
                "Inserted documents"
            );
            Ok(())
        })
        .await
    }

    /// Inserts one document into its own partition.
    ///
    /// An explicit `options.partition_key` takes precedence over the
    /// document's partition key.
    pub async fn add_one_partitioned<T: PartitionedDocument>(
        &self,
        document: &mut T,
        options: OperationOptions<'_>,
    ) -> RepositoryResult<()> {
        let partition_key = options
            .partition_key
            .map(str::to_owned)
            .unwrap_or_else(|| document.partition_key().to_owned());

        let options = OperationOptions {
            partition_key: Some(partition_key.as_str()),
            session: options.session,
            cancellation: options.cancellation,
        };
        self.add_one(document, options).await
    }

    /// Inserts documents grouped by partition, one `insertMany` per target
    /// collection. Input order is kept within each partition.
    ///
    /// Every partition key is validated before anything is written, so a bad
    /// key leaves the database and the documents untouched.
    pub async fn add_many_partitioned<T: PartitionedDocument>(
        &self,
        documents: &mut [T],
        options: OperationOptions<'_>,
    ) -> RepositoryResult<()> {
        if documents.is_empty() {
            return Ok(());
        }

        let OperationOptions {
            partition_key,
            mut session,
            cancellation,
        } = options;
        partition_targets(&self.context, documents.iter(), partition_key)?;
        for document in documents.iter_mut() {
            assign_key(document)?;
        }
        let targets = partition_targets(&self.context, documents.iter(), partition_key)?;

        guard(cancellation, "add_many", async {
            for (collection, group) in targets {
                insert_group(&collection, &group, session.as_deref_mut()).await?;
                debug!(
                    collection = %collection.name(),
                    count = group.len(),
                    "Inserted partitioned documents"
                );
            }
            Ok(())
        })
        .await
    }
}

async fn insert_group<T: Document>(
    collection: &Collection<T>,
    group: &[&T],
    session: Option<&mut ClientSession>,
) -> RepositoryResult<()> {
    with_session!(collection.insert_many(group.iter().copied()), session)?;
    Ok(())
}

/// Generates a key for `document` if it has none.
pub(crate) fn assign_key<T: Document>(document: &mut T) -> RepositoryResult<()> {
    if document.id().is_unset() {
        let id = T::Key::generate().ok_or(RepositoryError::KeyGeneration {
            key_type: <T::Key as DocumentKey>::KEY_TYPE,
        })?;
        document.set_id(id);
    }
    Ok(())
}

/// Groups documents by target partition.
///
/// `explicit` overrides every document's own partition key.
pub(crate) fn group_by_partition<'d, T, I>(
    documents: I,
    explicit: Option<&str>,
) -> BTreeMap<String, Vec<&'d T>>
where
    T: PartitionedDocument,
    I: IntoIterator<Item = &'d T>,
{
    let mut groups: BTreeMap<String, Vec<&'d T>> = BTreeMap::new();
    for document in documents {
        let partition = explicit.unwrap_or_else(|| document.partition_key());
        groups.entry(partition.to_owned()).or_default().push(document);
    }
    groups
}

/// Groups documents by partition and resolves each group's collection.
///
/// Fails on the first invalid partition key without touching the server.
pub(crate) fn partition_targets<'d, T, I>(
    context: &MongoDbContext,
    documents: I,
    explicit: Option<&str>,
) -> RepositoryResult<Vec<(Collection<T>, Vec<&'d T>)>>
where
    T: PartitionedDocument,
    I: IntoIterator<Item = &'d T>,
{
    group_by_partition(documents, explicit)
        .into_iter()
        .map(|(partition, group)| Ok((context.collection::<T>(Some(&partition))?, group)))
        .collect()
}
