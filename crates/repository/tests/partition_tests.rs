//! Partitioned collection integration tests.

#![cfg(feature = "integration")]

mod common;

use common::*;
use mongo_repository::{
    DocumentKey, OperationOptions, ReadOnlyRepository, Repository, RepositoryError,
};
use mongodb::bson::doc;

#[tokio::test]
async fn partition_key_selects_collection() {
    let repository = create_repository().await;
    let partition = unique_partition("tenant");
    let mut document = TestDocument::new("Isolated");

    repository
        .add_one(&mut document, OperationOptions::partition(&partition))
        .await
        .unwrap();

    let unpartitioned: Option<TestDocument> = repository
        .get_by_id(&document.id, OperationOptions::new())
        .await
        .unwrap();
    assert!(unpartitioned.is_none());

    let partitioned: Option<TestDocument> = repository
        .get_by_id(&document.id, OperationOptions::partition(&partition))
        .await
        .unwrap();
    assert_eq!(partitioned, Some(document));

    let names = repository.context().list_collection_names().await.unwrap();
    assert_eq!(names, vec![format!("{}-testDocuments", partition)]);
}

#[tokio::test]
async fn empty_partition_key_uses_base_collection() {
    let repository = create_repository().await;
    let mut document = TestDocument::new("Unprefixed");

    repository
        .add_one(&mut document, OperationOptions::partition(""))
        .await
        .unwrap();

    let found: Option<TestDocument> = repository
        .get_by_id(&document.id, OperationOptions::new())
        .await
        .unwrap();
    assert!(found.is_some());
}

#[tokio::test]
async fn invalid_partition_key_is_rejected_before_driver_call() {
    let repository = create_repository().await;
    let mut document = TestDocument::new("Rejected");

    let err = repository
        .add_one(&mut document, OperationOptions::partition("bad$key"))
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::InvalidArgument { .. }));

    let names = repository.context().list_collection_names().await.unwrap();
    assert!(names.is_empty());
}

#[tokio::test]
async fn rejected_insert_keeps_key_unset() {
    let repository = create_repository().await;
    let mut document = TestDocumentWithKey::<String>::unkeyed("Rejected");

    let err = repository
        .add_one(&mut document, OperationOptions::partition("bad$key"))
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::InvalidArgument { .. }));
    assert!(document.id.is_empty());

    repository
        .add_one(&mut document, OperationOptions::new())
        .await
        .unwrap();
    assert!(!document.id.is_empty());
}

#[tokio::test]
async fn one_bad_partition_key_rejects_the_whole_batch() {
    let repository = create_repository().await;
    let good = unique_partition("a");
    let mut documents = vec![
        PartitionedTestDocument::new(&good, "kept out"),
        PartitionedTestDocument::new("b$bad", "rejected"),
    ];

    let err = repository
        .add_many_partitioned(&mut documents, OperationOptions::new())
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::InvalidArgument { .. }));
    assert!(documents.iter().all(|d| d.id.is_unset()));

    let names = repository.context().list_collection_names().await.unwrap();
    assert!(names.is_empty());

    let err = repository
        .delete_many_partitioned(&documents, OperationOptions::new())
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::InvalidArgument { .. }));
}

#[tokio::test]
async fn add_many_partitioned_routes_by_document() {
    let repository = create_repository().await;
    let north = unique_partition("north");
    let south = unique_partition("south");
    let mut documents = vec![
        PartitionedTestDocument::new(&north, "n1"),
        PartitionedTestDocument::new(&south, "s1"),
        PartitionedTestDocument::new(&north, "n2"),
    ];

    repository
        .add_many_partitioned(&mut documents, OperationOptions::new())
        .await
        .unwrap();

    let in_north: Vec<PartitionedTestDocument> = repository
        .get_all(doc! {}, OperationOptions::partition(&north))
        .await
        .unwrap();
    let mut contents: Vec<String> = in_north.into_iter().map(|d| d.some_content).collect();
    contents.sort();
    assert_eq!(contents, vec!["n1".to_string(), "n2".to_string()]);

    let in_south = repository
        .count::<PartitionedTestDocument>(doc! {}, OperationOptions::partition(&south))
        .await
        .unwrap();
    assert_eq!(in_south, 1);
}

#[tokio::test]
async fn add_one_partitioned_explicit_key_wins() {
    let repository = create_repository().await;
    let own = unique_partition("own");
    let explicit = unique_partition("explicit");

    let mut routed = PartitionedTestDocument::new(&own, "routed");
    repository
        .add_one_partitioned(&mut routed, OperationOptions::new())
        .await
        .unwrap();

    let mut overridden = PartitionedTestDocument::new(&own, "overridden");
    repository
        .add_one_partitioned(&mut overridden, OperationOptions::partition(&explicit))
        .await
        .unwrap();

    let in_own = repository
        .count::<PartitionedTestDocument>(doc! {}, OperationOptions::partition(&own))
        .await
        .unwrap();
    let in_explicit: Option<PartitionedTestDocument> = repository
        .get_by_id(&overridden.id, OperationOptions::partition(&explicit))
        .await
        .unwrap();
    assert_eq!(in_own, 1);
    assert_eq!(in_explicit.map(|d| d.some_content), Some("overridden".to_string()));
}

#[tokio::test]
async fn delete_many_partitioned_sums_across_partitions() {
    let repository = create_repository().await;
    let east = unique_partition("east");
    let west = unique_partition("west");
    let mut documents = vec![
        PartitionedTestDocument::new(&east, "e1"),
        PartitionedTestDocument::new(&west, "w1"),
        PartitionedTestDocument::new(&west, "w2"),
    ];
    repository
        .add_many_partitioned(&mut documents, OperationOptions::new())
        .await
        .unwrap();

    let deleted = repository
        .delete_many_partitioned(&documents, OperationOptions::new())
        .await
        .unwrap();
    assert_eq!(deleted, 3);

    for partition in [&east, &west] {
        let left = repository
            .count::<PartitionedTestDocument>(doc! {}, OperationOptions::partition(partition))
            .await
            .unwrap();
        assert_eq!(left, 0);
    }
}

#[tokio::test]
async fn partitioned_updates_and_sums() {
    let repository = create_repository().await;
    let partition = unique_partition("ledger");
    let mut documents = vec![
        TestDocument::new("Ledger").with_value(3),
        TestDocument::new("Ledger").with_value(4),
    ];
    repository
        .add_many(&mut documents, OperationOptions::partition(&partition))
        .await
        .unwrap();

    let modified = repository
        .update_many::<TestDocument, _>(
            doc! {},
            doc! { "$inc": { "some_value": 1 } },
            OperationOptions::partition(&partition),
        )
        .await
        .unwrap();
    assert_eq!(modified, 2);

    let total = repository
        .sum_by_i64::<TestDocument>(doc! {}, "some_value", OperationOptions::partition(&partition))
        .await
        .unwrap();
    assert_eq!(total, 9);

    let unpartitioned_total = repository
        .sum_by_i64::<TestDocument>(doc! {}, "some_value", OperationOptions::new())
        .await
        .unwrap();
    assert_eq!(unpartitioned_total, 0);
}
