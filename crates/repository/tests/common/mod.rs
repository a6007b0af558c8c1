//! Test infrastructure for repository integration tests.
//!
//! A single MongoDB replica-set container is shared by every test in a test
//! binary. Each test gets its own database, so tests never see each other's
//! documents.

#![allow(dead_code)]

use mongo_repository::{Document, DocumentKey, MongoDbConfig, MongoRepository, PartitionedDocument};
use mongodb::bson::oid::ObjectId;
use mongodb::bson::Uuid;
use serde::{Deserialize, Serialize};
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, ImageExt};
use testcontainers_modules::mongo::Mongo;
use tokio::sync::OnceCell;

// ============================================================================
// Shared container
// ============================================================================

/// Shared MongoDB container reused across all tests in a binary.
struct SharedMongo {
    uri: String,
    /// Kept alive for the duration of the test binary; dropped at process exit.
    _container: ContainerAsync<Mongo>,
}

static SHARED_MONGO: OnceCell<SharedMongo> = OnceCell::const_new();

async fn shared_mongo() -> &'static SharedMongo {
    SHARED_MONGO
        .get_or_init(|| async {
            let run_id = std::env::var("GITHUB_RUN_ID").unwrap_or_default();
            // A replica set is required for multi-document transactions.
            let container = Mongo::repl_set()
                .with_label("github.run_id", &run_id)
                .start()
                .await
                .expect("Failed to start MongoDB container");

            let port = container
                .get_host_port_ipv4(27017)
                .await
                .expect("Failed to get host port");
            let host = container.get_host().await.expect("Failed to get host");

            SharedMongo {
                uri: format!("mongodb://{}:{}/?directConnection=true", host, port),
                _container: container,
            }
        })
        .await
}

/// Returns a config pointing at a fresh, uniquely named database.
pub async fn test_config() -> MongoDbConfig {
    let mongo = shared_mongo().await;
    let database = format!("repo_test_{}", uuid::Uuid::new_v4().simple());
    MongoDbConfig::new(mongo.uri.clone(), database).with_app_name("mongo-repository-tests")
}

/// Creates a repository over a fresh database on the shared container.
pub async fn create_repository() -> MongoRepository {
    let config = test_config().await;
    MongoRepository::connect(&config)
        .await
        .expect("Failed to create repository")
}

/// Returns a partition key with a unique suffix.
pub fn unique_partition(prefix: &str) -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("{}{}", prefix, &suffix[..8])
}

// ============================================================================
// Fixtures
// ============================================================================

/// Nested value embedded in [`TestDocument`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Nested {
    pub some_date: i64,
    pub some_amount: f64,
}

/// Element of [`TestDocument::children`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Child {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
}

impl Child {
    pub fn new(kind: &str, value: &str) -> Self {
        Self {
            kind: kind.to_string(),
            value: value.to_string(),
        }
    }
}

/// The general-purpose test document, stored in `testDocuments`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestDocument {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub version: i32,
    pub some_content: String,
    pub some_value: i64,
    pub some_decimal: f64,
    pub group_key: i32,
    pub nested: Nested,
    pub children: Vec<Child>,
}

impl TestDocument {
    pub fn new(content: &str) -> Self {
        Self {
            id: ObjectId::new(),
            version: 2,
            some_content: content.to_string(),
            some_value: 1,
            some_decimal: 1.5,
            group_key: 0,
            nested: Nested {
                some_date: 1_700_000_000_000,
                some_amount: 10.0,
            },
            children: vec![Child::new("type1", "value1"), Child::new("type2", "value2")],
        }
    }

    pub fn with_value(mut self, value: i64) -> Self {
        self.some_value = value;
        self
    }

    pub fn with_group(mut self, group_key: i32) -> Self {
        self.group_key = group_key;
        self
    }

    pub fn with_decimal(mut self, decimal: f64) -> Self {
        self.some_decimal = decimal;
        self
    }

    pub fn with_amount(mut self, amount: f64) -> Self {
        self.nested.some_amount = amount;
        self
    }
}

impl Document for TestDocument {
    type Key = ObjectId;

    fn id(&self) -> &ObjectId {
        &self.id
    }

    fn set_id(&mut self, id: ObjectId) {
        self.id = id;
    }

    fn version(&self) -> i32 {
        self.version
    }
}

/// Test document keyed by an arbitrary key type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestDocumentWithKey<K> {
    #[serde(rename = "_id")]
    pub id: K,
    pub version: i32,
    pub some_content: String,
}

impl<K: DocumentKey + Default> TestDocumentWithKey<K> {
    /// A document whose key is left unset.
    pub fn unkeyed(content: &str) -> Self {
        Self {
            id: K::default(),
            version: 2,
            some_content: content.to_string(),
        }
    }
}

impl<K: DocumentKey> TestDocumentWithKey<K> {
    pub fn keyed(id: K, content: &str) -> Self {
        Self {
            id,
            version: 2,
            some_content: content.to_string(),
        }
    }
}

impl<K: DocumentKey> Document for TestDocumentWithKey<K> {
    type Key = K;

    fn id(&self) -> &K {
        &self.id
    }

    fn set_id(&mut self, id: K) {
        self.id = id;
    }

    fn version(&self) -> i32 {
        self.version
    }
}

/// Test document that routes itself to a partition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartitionedTestDocument {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub version: i32,
    pub partition: String,
    pub some_content: String,
}

impl PartitionedTestDocument {
    pub fn new(partition: &str, content: &str) -> Self {
        Self {
            id: Uuid::from_bytes([0u8; 16]),
            version: 1,
            partition: partition.to_string(),
            some_content: content.to_string(),
        }
    }
}

impl Document for PartitionedTestDocument {
    type Key = Uuid;

    fn id(&self) -> &Uuid {
        &self.id
    }

    fn set_id(&mut self, id: Uuid) {
        self.id = id;
    }

    fn version(&self) -> i32 {
        self.version
    }
}

impl PartitionedDocument for PartitionedTestDocument {
    fn partition_key(&self) -> &str {
        &self.partition
    }
}
