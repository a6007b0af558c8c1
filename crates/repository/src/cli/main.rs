//! MongoDB repository admin CLI
//!
//! Small maintenance commands built on the repository library.
//!
//! # Usage
//!
//! ```bash
//! # Check the deployment answers
//! mongo-repo ping
//!
//! # List indexes on the `eu-invoices` collection
//! mongo-repo indexes list --collection invoices --partition-key eu
//!
//! # Create a unique compound index
//! mongo-repo indexes create --collection invoices --field customer --field number --unique
//!
//! # Drop a partition's collection
//! mongo-repo collections drop --collection invoices --partition-key eu
//! ```
//!
//! # Environment Variables
//!
//! Connection settings are read with `MongoDbConfig::from_env` (`MONGO_REPO_URI`,
//! `MONGO_REPO_DATABASE`, ...). `--uri` and `--database` override them.
//! `RUST_LOG` controls log output.

use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use mongo_repository::operations::MongoDbIndexHandler;
use mongo_repository::{
    IndexCreationOptions, IndexKind, MongoDbConfig, MongoDbContext, OperationOptions,
};
use mongodb::bson::Document as BsonDocument;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "mongo-repo")]
#[command(about = "Maintenance commands for repository collections", version)]
struct Cli {
    /// Connection string, overriding `MONGO_REPO_URI`.
    #[arg(long, global = true)]
    uri: Option<String>,

    /// Database name, overriding `MONGO_REPO_DATABASE`.
    #[arg(long, global = true)]
    database: Option<String>,

    /// Log level used when `RUST_LOG` is unset.
    #[arg(long, global = true, env = "MONGO_REPO_LOG_LEVEL", default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Verify the deployment answers.
    Ping,
    /// Print the effective connection settings as JSON, credentials masked.
    Config,
    /// Manage indexes.
    #[command(subcommand)]
    Indexes(IndexCommand),
    /// Manage collections.
    #[command(subcommand)]
    Collections(CollectionCommand),
}

#[derive(Debug, Subcommand)]
enum IndexCommand {
    /// List index names.
    List(Target),
    /// Create an index over one or more fields.
    Create {
        #[command(flatten)]
        target: Target,
        /// Field to index; repeat for a compound index.
        #[arg(long = "field", required = true)]
        fields: Vec<String>,
        /// Index kind applied to every field.
        #[arg(long, value_enum, default_value_t = KindArg::Asc)]
        kind: KindArg,
        /// Reject duplicate values.
        #[arg(long)]
        unique: bool,
        /// Index name; the server derives one when omitted.
        #[arg(long)]
        name: Option<String>,
    },
    /// Drop an index by name.
    Drop {
        #[command(flatten)]
        target: Target,
        /// Index name.
        #[arg(long)]
        name: String,
    },
}

#[derive(Debug, Subcommand)]
enum CollectionCommand {
    /// List collection names in the database.
    List,
    /// Drop a collection.
    Drop(Target),
}

#[derive(Debug, Args)]
struct Target {
    /// Base collection name.
    #[arg(long)]
    collection: String,
    /// Partition key prefix.
    #[arg(long)]
    partition_key: Option<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum KindArg {
    Asc,
    Desc,
    Hashed,
    Text,
    #[value(name = "2dsphere")]
    Geo2dSphere,
}

impl From<KindArg> for IndexKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Asc => IndexKind::Ascending,
            KindArg::Desc => IndexKind::Descending,
            KindArg::Hashed => IndexKind::Hashed,
            KindArg::Text => IndexKind::Text,
            KindArg::Geo2dSphere => IndexKind::Geo2dSphere,
        }
    }
}

fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("mongo_repository={},mongo_repo={}", level, level)));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn load_config(cli: &Cli) -> anyhow::Result<MongoDbConfig> {
    let config = MongoDbConfig::from_env().context("Invalid MONGO_REPO_* environment")?;
    apply_overrides(cli, config)
}

/// Applies `--uri` and `--database` on top of the environment settings.
fn apply_overrides(cli: &Cli, mut config: MongoDbConfig) -> anyhow::Result<MongoDbConfig> {
    if let Some(uri) = &cli.uri {
        config.connection_string = uri.clone();
    }
    if let Some(database) = &cli.database {
        config.database = database.clone();
    }
    config.validate()?;
    Ok(config)
}

fn render_config(config: &MongoDbConfig) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(&config.redacted())?)
}

fn creation_options(unique: bool, name: Option<String>) -> IndexCreationOptions {
    let mut options = if unique {
        IndexCreationOptions::unique()
    } else {
        IndexCreationOptions::default()
    };
    options.name = name;
    options
}

impl Target {
    fn options(&self) -> OperationOptions<'_> {
        OperationOptions::new().with_partition_key(self.partition_key.as_deref())
    }
}

async fn run_index_command(
    indexes: &MongoDbIndexHandler,
    command: IndexCommand,
) -> anyhow::Result<()> {
    match command {
        IndexCommand::List(target) => {
            for name in indexes
                .get_index_names_in(&target.collection, target.options())
                .await?
            {
                println!("{}", name);
            }
        }
        IndexCommand::Create {
            target,
            fields,
            kind,
            unique,
            name,
        } => {
            let kind = IndexKind::from(kind);
            let keys: Vec<(&str, IndexKind)> =
                fields.iter().map(|field| (field.as_str(), kind)).collect();
            let created = indexes
                .create_index_in(
                    &target.collection,
                    &keys,
                    &creation_options(unique, name),
                    target.options(),
                )
                .await?;
            println!("{}", created);
        }
        IndexCommand::Drop { target, name } => {
            indexes
                .drop_index_in(&target.collection, &name, target.options())
                .await?;
        }
    }
    Ok(())
}

async fn run_collection_command(
    context: &MongoDbContext,
    command: CollectionCommand,
) -> anyhow::Result<()> {
    match command {
        CollectionCommand::List => {
            for name in context.list_collection_names().await? {
                println!("{}", name);
            }
        }
        CollectionCommand::Drop(target) => {
            let collection = context.collection_named::<BsonDocument>(
                &target.collection,
                target.partition_key.as_deref(),
            )?;
            collection.drop().await?;
            info!(collection = %collection.name(), "Dropped collection");
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let config = load_config(&cli)?;
    if let Command::Config = cli.command {
        println!("{}", render_config(&config)?);
        return Ok(());
    }

    info!(database = %config.database, "Connecting to MongoDB");
    let context = Arc::new(
        MongoDbContext::connect(&config)
            .await
            .context("Failed to create MongoDB client")?,
    );

    match cli.command {
        Command::Ping => {
            context.ping().await.context("Deployment did not answer ping")?;
            println!("ok");
        }
        Command::Config => {}
        Command::Indexes(command) => {
            let indexes = MongoDbIndexHandler::new(Arc::clone(&context));
            run_index_command(&indexes, command).await?
        }
        Command::Collections(command) => run_collection_command(&context, command).await?,
    }

    Ok(())
}
