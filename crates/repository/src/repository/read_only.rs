//! Query-only repository.

use std::sync::Arc;

use crate::config::MongoDbConfig;
use crate::context::MongoDbContext;
use crate::error::RepositoryResult;
use crate::operations::MongoDbReader;

use super::ReadOnlyRepository;

/// A repository that can only read.
///
/// Hand this to components that must not write; it carries no creator,
/// updater or eraser.
#[derive(Debug, Clone)]
pub struct ReadOnlyMongoRepository {
    context: Arc<MongoDbContext>,
    reader: MongoDbReader,
}

impl ReadOnlyMongoRepository {
    /// Creates a read-only repository over an existing context.
    pub fn new(context: Arc<MongoDbContext>) -> Self {
        let reader = MongoDbReader::new(Arc::clone(&context));
        Self { context, reader }
    }

    /// Connects with `config` and wraps the resulting context.
    pub async fn connect(config: &MongoDbConfig) -> RepositoryResult<Self> {
        let context = MongoDbContext::connect(config).await?;
        Ok(Self::new(Arc::new(context)))
    }

    /// The shared context.
    pub fn context(&self) -> &Arc<MongoDbContext> {
        &self.context
    }
}

impl ReadOnlyRepository for ReadOnlyMongoRepository {
    fn reader(&self) -> &MongoDbReader {
        &self.reader
    }
}
