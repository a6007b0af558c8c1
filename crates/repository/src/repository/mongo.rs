//! Read-write repository.

use std::sync::Arc;

use tracing::debug;

use crate::config::MongoDbConfig;
use crate::context::MongoDbContext;
use crate::error::RepositoryResult;
use crate::operations::{
    MongoDbCreator, MongoDbEraser, MongoDbIndexHandler, MongoDbReader, MongoDbUpdater,
};

use super::{ReadOnlyMongoRepository, ReadOnlyRepository, Repository};

/// The full repository over one database.
///
/// All handlers share the same [`MongoDbContext`] and are built when the
/// repository is created. Cloning is cheap.
///
/// ```no_run
/// # async fn run() -> mongo_repository::RepositoryResult<()> {
/// use mongo_repository::{MongoDbConfig, MongoRepository, Repository};
///
/// let config = MongoDbConfig::new("mongodb://localhost:27017", "shop");
/// let repository = MongoRepository::connect(&config).await?;
/// repository.context().ping().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct MongoRepository {
    context: Arc<MongoDbContext>,
    reader: MongoDbReader,
    creator: MongoDbCreator,
    updater: MongoDbUpdater,
    eraser: MongoDbEraser,
    index_handler: MongoDbIndexHandler,
}

impl MongoRepository {
    /// Creates a repository over an existing context.
    pub fn new(context: Arc<MongoDbContext>) -> Self {
        debug!(database = %context.database().name(), "Creating repository");
        Self {
            reader: MongoDbReader::new(Arc::clone(&context)),
            creator: MongoDbCreator::new(Arc::clone(&context)),
            updater: MongoDbUpdater::new(Arc::clone(&context)),
            eraser: MongoDbEraser::new(Arc::clone(&context)),
            index_handler: MongoDbIndexHandler::new(Arc::clone(&context)),
            context,
        }
    }

    /// Connects with `config` and wraps the resulting context.
    pub async fn connect(config: &MongoDbConfig) -> RepositoryResult<Self> {
        let context = MongoDbContext::connect(config).await?;
        Ok(Self::new(Arc::new(context)))
    }

    /// Returns the shared context handle.
    pub fn shared_context(&self) -> Arc<MongoDbContext> {
        Arc::clone(&self.context)
    }

    /// Returns a read-only view over the same context.
    pub fn read_only(&self) -> ReadOnlyMongoRepository {
        ReadOnlyMongoRepository::new(self.shared_context())
    }
}

impl ReadOnlyRepository for MongoRepository {
    fn reader(&self) -> &MongoDbReader {
        &self.reader
    }
}

impl Repository for MongoRepository {
    fn context(&self) -> &MongoDbContext {
        &self.context
    }

    fn creator(&self) -> &MongoDbCreator {
        &self.creator
    }

    fn updater(&self) -> &MongoDbUpdater {
        &self.updater
    }

    fn eraser(&self) -> &MongoDbEraser {
        &self.eraser
    }

    fn index_handler(&self) -> &MongoDbIndexHandler {
        &self.index_handler
    }
}
