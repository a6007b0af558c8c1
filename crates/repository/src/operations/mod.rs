//! Operation handlers.
//!
//! Each handler owns one family of driver calls:
//!
//! - [`MongoDbReader`] - queries, projections and aggregation helpers
//! - [`MongoDbCreator`] - inserts with key generation
//! - [`MongoDbUpdater`] - replacements and update definitions
//! - [`MongoDbEraser`] - deletes
//! - [`MongoDbIndexHandler`] - index management
//!
//! Handlers are stateless apart from the shared [`MongoDbContext`]; the
//! repository facades compose them.
//!
//! [`MongoDbContext`]: crate::context::MongoDbContext

pub mod builders;
mod creator;
mod eraser;
mod index;
mod reader;
mod updater;

pub use creator::MongoDbCreator;
pub use eraser::MongoDbEraser;
pub use index::{index_keys, index_model, IndexCreationOptions, IndexKind, MongoDbIndexHandler};
pub use reader::MongoDbReader;
pub use updater::{MongoDbUpdater, UpdateOutcome};

use futures::TryStreamExt;
use mongodb::bson::Document as BsonDocument;
use mongodb::options::FindOptions;
use mongodb::{ClientSession, Collection};
use serde::de::DeserializeOwned;

use crate::error::RepositoryResult;

/// Awaits a driver action, attaching the session when one was supplied.
macro_rules! with_session {
    ($action:expr, $session:expr) => {
        match $session {
            Some(session) => $action.session(session).await,
            None => $action.await,
        }
    };
}

pub(crate) use with_session;

/// Runs a find and drains the cursor.
pub(crate) async fn find_all<T>(
    collection: &Collection<T>,
    filter: BsonDocument,
    options: FindOptions,
    session: Option<&mut ClientSession>,
) -> RepositoryResult<Vec<T>>
where
    T: DeserializeOwned + Send + Sync + Unpin,
{
    match session {
        Some(session) => {
            let mut cursor = collection
                .find(filter)
                .with_options(options)
                .session(&mut *session)
                .await?;
            Ok(cursor.stream(session).try_collect().await?)
        }
        None => {
            let cursor = collection.find(filter).with_options(options).await?;
            Ok(cursor.try_collect().await?)
        }
    }
}

/// Runs an aggregation pipeline and drains the cursor as raw documents.
pub(crate) async fn aggregate_all<T>(
    collection: &Collection<T>,
    pipeline: Vec<BsonDocument>,
    session: Option<&mut ClientSession>,
) -> RepositoryResult<Vec<BsonDocument>>
where
    T: Send + Sync,
{
    match session {
        Some(session) => {
            let mut cursor = collection.aggregate(pipeline).session(&mut *session).await?;
            Ok(cursor.stream(session).try_collect().await?)
        }
        None => {
            let cursor = collection.aggregate(pipeline).await?;
            Ok(cursor.try_collect().await?)
        }
    }
}
