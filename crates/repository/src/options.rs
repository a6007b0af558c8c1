//! Per-call options shared by every repository operation.
//!
//! Each operation takes its filter and payload as arguments and everything
//! else through one [`OperationOptions`] value: the partition key selecting
//! the collection, an optional driver session, and an optional cancellation
//! token.
//!
//! ```
//! use mongo_repository::options::OperationOptions;
//! use tokio_util::sync::CancellationToken;
//!
//! let token = CancellationToken::new();
//! let options = OperationOptions::partition("eu-west").with_cancellation(&token);
//! assert_eq!(options.partition_key, Some("eu-west"));
//! ```

use std::future::Future;

use mongodb::ClientSession;
use tokio_util::sync::CancellationToken;

use crate::error::{RepositoryError, RepositoryResult};

/// Options applied to a single repository call.
#[derive(Default)]
pub struct OperationOptions<'a> {
    /// Partition key prefixed to the collection name.
    pub partition_key: Option<&'a str>,

    /// Driver session the operation runs in (for causal consistency or
    /// transactions started by the caller).
    pub session: Option<&'a mut ClientSession>,

    /// Token that aborts the call when cancelled.
    pub cancellation: Option<&'a CancellationToken>,
}

impl<'a> OperationOptions<'a> {
    /// Options with no partition, session or cancellation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Options targeting the given partition.
    pub fn partition(partition_key: &'a str) -> Self {
        Self {
            partition_key: Some(partition_key),
            ..Self::default()
        }
    }

    /// Sets the partition key.
    pub fn with_partition_key(mut self, partition_key: Option<&'a str>) -> Self {
        self.partition_key = partition_key;
        self
    }

    /// Runs the operation inside the given session.
    pub fn with_session(mut self, session: &'a mut ClientSession) -> Self {
        self.session = Some(session);
        self
    }

    /// Aborts the operation when `token` is cancelled.
    pub fn with_cancellation(mut self, token: &'a CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }
}

impl std::fmt::Debug for OperationOptions<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationOptions")
            .field("partition_key", &self.partition_key)
            .field("session", &self.session.is_some())
            .field(
                "cancelled",
                &self.cancellation.map(CancellationToken::is_cancelled),
            )
            .finish()
    }
}

/// Sort direction for ordered reads and index keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortDirection {
    /// Smallest values first.
    #[default]
    Ascending,
    /// Largest values first.
    Descending,
}

impl SortDirection {
    /// The value MongoDB expects in sort and index documents.
    pub fn as_i32(self) -> i32 {
        match self {
            SortDirection::Ascending => 1,
            SortDirection::Descending => -1,
        }
    }
}

/// An offset-based page of results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// Number of matching documents to skip.
    pub skip: u64,
    /// Maximum number of documents to return.
    pub limit: i64,
}

impl Default for Page {
    fn default() -> Self {
        Self { skip: 0, limit: 50 }
    }
}

impl Page {
    /// Creates a page from a skip count and a page size.
    pub fn new(skip: u64, limit: i64) -> Self {
        Self { skip, limit }
    }

    /// Returns the zero-based page `index` of `size` documents.
    pub fn number(index: u64, size: i64) -> Self {
        let size = size.max(1);
        Self {
            skip: index.saturating_mul(size as u64),
            limit: size,
        }
    }
}

/// Runs `future` unless `cancellation` fires first.
///
/// An already-cancelled token short-circuits without polling the future, so
/// no driver call is issued.
pub(crate) async fn guard<T, F>(
    cancellation: Option<&CancellationToken>,
    operation: &'static str,
    future: F,
) -> RepositoryResult<T>
where
    F: Future<Output = RepositoryResult<T>>,
{
    let Some(token) = cancellation else {
        return future.await;
    };
    if token.is_cancelled() {
        return Err(RepositoryError::Cancelled { operation });
    }

    tokio::select! {
        biased;
        _ = token.cancelled() => {
            tracing::debug!(operation, "Operation cancelled");
            Err(RepositoryError::Cancelled { operation })
        }
        result = future => result,
    }
}
