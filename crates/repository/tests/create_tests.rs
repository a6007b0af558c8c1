//! Insert integration tests.
//!
//! Run with: `cargo test -p mongo-repository --features integration`

#![cfg(feature = "integration")]

mod common;

use common::*;
use mongo_repository::{
    DocumentKey, OperationOptions, ReadOnlyRepository, Repository, RepositoryError,
};
use mongodb::bson::{doc, Uuid};

#[tokio::test]
async fn add_one_inserts_document() {
    let repository = create_repository().await;
    let mut document = TestDocument::new("AddOne");

    repository
        .add_one(&mut document, OperationOptions::new())
        .await
        .unwrap();

    let stored: Option<TestDocument> = repository
        .get_by_id(&document.id, OperationOptions::new())
        .await
        .unwrap();
    assert_eq!(stored, Some(document));
}

#[tokio::test]
async fn add_one_generates_string_and_uuid_keys() {
    let repository = create_repository().await;

    let mut by_string = TestDocumentWithKey::<String>::unkeyed("StringKey");
    repository
        .add_one(&mut by_string, OperationOptions::new())
        .await
        .unwrap();
    assert!(!by_string.id.is_unset());
    assert_eq!(by_string.id.len(), 24);

    let mut by_uuid = TestDocumentWithKey::keyed(Uuid::from_bytes([0u8; 16]), "UuidKey");
    repository
        .add_one(&mut by_uuid, OperationOptions::new())
        .await
        .unwrap();
    assert!(!by_uuid.id.is_unset());

    let stored: Option<TestDocumentWithKey<Uuid>> = repository
        .get_by_id(&by_uuid.id, OperationOptions::new())
        .await
        .unwrap();
    assert_eq!(stored.map(|d| d.some_content), Some("UuidKey".to_string()));
}

#[tokio::test]
async fn add_one_keeps_explicit_integer_key() {
    let repository = create_repository().await;
    let mut document = TestDocumentWithKey::<i64>::keyed(42, "IntKey");

    repository
        .add_one(&mut document, OperationOptions::new())
        .await
        .unwrap();

    let stored: Option<TestDocumentWithKey<i64>> = repository
        .get_by_id(&42, OperationOptions::new())
        .await
        .unwrap();
    assert_eq!(stored, Some(document));
}

#[tokio::test]
async fn add_one_rejects_unset_integer_key() {
    let repository = create_repository().await;
    let mut document = TestDocumentWithKey::<i32>::unkeyed("NoKey");

    let err = repository
        .add_one(&mut document, OperationOptions::new())
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::KeyGeneration { key_type: "i32" }));

    let count = repository
        .count::<TestDocumentWithKey<i32>>(doc! {}, OperationOptions::new())
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn add_one_duplicate_key_is_driver_error() {
    let repository = create_repository().await;
    let mut document = TestDocument::new("Duplicate");
    repository
        .add_one(&mut document, OperationOptions::new())
        .await
        .unwrap();

    let mut copy = document.clone();
    let err = repository
        .add_one(&mut copy, OperationOptions::new())
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::Driver(_)));
    assert!(err.is_duplicate_key());
}

#[tokio::test]
async fn add_many_inserts_all_documents() {
    let repository = create_repository().await;
    let mut documents: Vec<TestDocumentWithKey<String>> = (0..3)
        .map(|i| TestDocumentWithKey::unkeyed(&format!("Many{}", i)))
        .collect();

    repository
        .add_many(&mut documents, OperationOptions::new())
        .await
        .unwrap();

    assert!(documents.iter().all(|d| !d.id.is_unset()));
    let count = repository
        .count::<TestDocumentWithKey<String>>(doc! {}, OperationOptions::new())
        .await
        .unwrap();
    assert_eq!(count, 3);
}

#[tokio::test]
async fn add_many_empty_is_noop() {
    let repository = create_repository().await;
    let mut documents: Vec<TestDocument> = Vec::new();

    repository
        .add_many(&mut documents, OperationOptions::new())
        .await
        .unwrap();

    let names = repository.context().list_collection_names().await.unwrap();
    assert!(names.is_empty());
}

#[tokio::test]
async fn add_many_with_partition_key() {
    let repository = create_repository().await;
    let partition = unique_partition("batch");
    let mut documents = vec![TestDocument::new("P1"), TestDocument::new("P2")];

    repository
        .add_many(&mut documents, OperationOptions::partition(&partition))
        .await
        .unwrap();

    let names = repository.context().list_collection_names().await.unwrap();
    assert_eq!(names, vec![format!("{}-testDocuments", partition)]);

    let in_partition = repository
        .count::<TestDocument>(doc! {}, OperationOptions::partition(&partition))
        .await
        .unwrap();
    assert_eq!(in_partition, 2);
}
