//! Database context: the client, the selected database, and collection
//! resolution by document type and partition key.

use mongodb::bson::doc;
use mongodb::options::ClientOptions;
use mongodb::{Client, ClientSession, Collection, Database};
use tracing::{debug, info};

use crate::config::MongoDbConfig;
use crate::document::Document;
use crate::document::naming::resolve_collection_name;
use crate::error::RepositoryResult;

/// Holds the driver client and database that repositories resolve
/// collections against.
///
/// Cloning is cheap; the driver client is reference-counted internally.
#[derive(Debug, Clone)]
pub struct MongoDbContext {
    client: Client,
    database: Database,
}

impl MongoDbContext {
    /// Connects using the given configuration.
    ///
    /// The configuration is validated first. The driver connects lazily, so
    /// this does not guarantee the deployment is reachable; call
    /// [`ping`](Self::ping) for that.
    pub async fn connect(config: &MongoDbConfig) -> RepositoryResult<Self> {
        config.validate()?;

        let mut options = ClientOptions::parse(&config.connection_string).await?;
        options.app_name = config.app_name.clone().or(options.app_name);
        options.max_pool_size = Some(config.max_pool_size);
        options.min_pool_size = Some(config.min_pool_size);
        options.connect_timeout = Some(config.connect_timeout);
        options.server_selection_timeout = Some(config.server_selection_timeout);

        let client = Client::with_options(options)?;
        info!(
            database = %config.database,
            max_pool_size = config.max_pool_size,
            "Created MongoDB client"
        );

        Ok(Self::new(client, &config.database))
    }

    /// Creates a context for `database_name` on an existing client.
    pub fn new(client: Client, database_name: &str) -> Self {
        let database = client.database(database_name);
        Self { client, database }
    }

    /// Returns a context for another database on the same client.
    pub fn with_database(&self, database_name: &str) -> Self {
        Self::new(self.client.clone(), database_name)
    }

    /// Returns the driver client.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Returns the driver database.
    pub fn database(&self) -> &Database {
        &self.database
    }

    /// Returns the collection for `T` in the given partition.
    pub fn collection<T: Document>(
        &self,
        partition_key: Option<&str>,
    ) -> RepositoryResult<Collection<T>> {
        self.collection_named(&T::collection_name(), partition_key)
    }

    /// Returns a typed collection with an explicit base name.
    pub fn collection_named<T: Send + Sync>(
        &self,
        name: &str,
        partition_key: Option<&str>,
    ) -> RepositoryResult<Collection<T>> {
        let name = resolve_collection_name(name, partition_key)?;
        Ok(self.database.collection::<T>(&name))
    }

    /// Drops the collection for `T` in the given partition.
    pub async fn drop_collection<T: Document>(
        &self,
        partition_key: Option<&str>,
    ) -> RepositoryResult<()> {
        let collection = self.collection::<T>(partition_key)?;
        debug!(collection = %collection.name(), "Dropping collection");
        collection.drop().await?;
        Ok(())
    }

    /// Sends a `ping` command to verify the deployment is reachable.
    pub async fn ping(&self) -> RepositoryResult<()> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await?;
        Ok(())
    }

    /// Starts a driver session.
    ///
    /// Pass it to operations via
    /// [`OperationOptions::with_session`](crate::options::OperationOptions::with_session);
    /// transactions are started and committed on the session itself.
    pub async fn start_session(&self) -> RepositoryResult<ClientSession> {
        Ok(self.client.start_session().await?)
    }

    /// Lists collection names in the database.
    pub async fn list_collection_names(&self) -> RepositoryResult<Vec<String>> {
        Ok(self.database.list_collection_names().await?)
    }
}
