//! Index management integration tests.

#![cfg(feature = "integration")]

mod common;

use std::time::Duration;

use common::*;
use mongo_repository::operations::MongoDbIndexHandler;
use mongo_repository::{
    IndexCreationOptions, IndexKind, OperationOptions, Repository, RepositoryError,
};

async fn repository_with_collection() -> mongo_repository::MongoRepository {
    let repository = create_repository().await;
    let mut document = TestDocument::new("Indexed");
    repository
        .add_one(&mut document, OperationOptions::new())
        .await
        .unwrap();
    repository
}

#[tokio::test]
async fn create_single_field_indexes() {
    let repository = repository_with_collection().await;
    let defaults = IndexCreationOptions::default();

    let ascending = repository
        .create_ascending_index::<TestDocument>("some_value", &defaults, OperationOptions::new())
        .await
        .unwrap();
    let descending = repository
        .create_descending_index::<TestDocument>("group_key", &defaults, OperationOptions::new())
        .await
        .unwrap();
    let hashed = repository
        .create_hashed_index::<TestDocument>("some_decimal", &defaults, OperationOptions::new())
        .await
        .unwrap();
    let text = repository
        .create_text_index::<TestDocument>("some_content", &defaults, OperationOptions::new())
        .await
        .unwrap();

    assert_eq!(ascending, "some_value_1");
    assert_eq!(descending, "group_key_-1");
    assert_eq!(hashed, "some_decimal_hashed");
    assert_eq!(text, "some_content_text");

    let names = repository
        .get_index_names::<TestDocument>(OperationOptions::new())
        .await
        .unwrap();
    for expected in ["_id_", "some_value_1", "group_key_-1", "some_decimal_hashed", "some_content_text"] {
        assert!(names.iter().any(|n| n == expected), "missing index {}", expected);
    }
}

#[tokio::test]
async fn create_index_with_options() {
    let repository = repository_with_collection().await;
    let options = IndexCreationOptions::unique()
        .with_name("unique_content")
        .with_sparse();

    let name = repository
        .create_ascending_index::<TestDocument>("some_content", &options, OperationOptions::new())
        .await
        .unwrap();
    assert_eq!(name, "unique_content");

    let mut duplicate = TestDocument::new("Indexed");
    let err = repository
        .add_one(&mut duplicate, OperationOptions::new())
        .await
        .unwrap_err();
    assert!(err.is_duplicate_key());

    let ttl = IndexCreationOptions::default()
        .with_name("expiry")
        .with_expire_after(Duration::from_secs(3600));
    let name = repository
        .create_ascending_index::<TestDocument>("nested.some_date", &ttl, OperationOptions::new())
        .await
        .unwrap();
    assert_eq!(name, "expiry");
}

#[tokio::test]
async fn combined_text_and_compound_indexes() {
    let repository = repository_with_collection().await;
    let defaults = IndexCreationOptions::default();

    let text = repository
        .create_combined_text_index::<TestDocument>(
            &["some_content", "children.value"],
            &defaults,
            OperationOptions::new(),
        )
        .await
        .unwrap();
    assert_eq!(text, "some_content_text_children.value_text");

    let compound = repository
        .create_compound_index::<TestDocument>(
            &[("group_key", IndexKind::Ascending), ("some_value", IndexKind::Descending)],
            &defaults,
            OperationOptions::new(),
        )
        .await
        .unwrap();
    assert_eq!(compound, "group_key_1_some_value_-1");

    let err = repository
        .create_combined_text_index::<TestDocument>(&[], &defaults, OperationOptions::new())
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::InvalidArgument { .. }));
}

#[tokio::test]
async fn drop_index_by_name() {
    let repository = repository_with_collection().await;
    let name = repository
        .create_ascending_index::<TestDocument>(
            "some_value",
            &IndexCreationOptions::default(),
            OperationOptions::new(),
        )
        .await
        .unwrap();

    repository
        .drop_index::<TestDocument>(&name, OperationOptions::new())
        .await
        .unwrap();

    let names = repository
        .get_index_names::<TestDocument>(OperationOptions::new())
        .await
        .unwrap();
    assert_eq!(names, vec!["_id_".to_string()]);
}

#[tokio::test]
async fn indexes_are_per_partition() {
    let repository = create_repository().await;
    let partition = unique_partition("idx");
    let mut document = TestDocument::new("Partitioned");
    repository
        .add_one(&mut document, OperationOptions::partition(&partition))
        .await
        .unwrap();

    repository
        .create_ascending_index::<TestDocument>(
            "some_value",
            &IndexCreationOptions::default(),
            OperationOptions::partition(&partition),
        )
        .await
        .unwrap();

    let partitioned = repository
        .get_index_names::<TestDocument>(OperationOptions::partition(&partition))
        .await
        .unwrap();
    assert!(partitioned.iter().any(|n| n == "some_value_1"));

    let context = repository.context();
    let names = context.list_collection_names().await.unwrap();
    assert!(!names.iter().any(|n| n == "testDocuments"));
}

#[tokio::test]
async fn named_handler_calls_match_typed_calls() {
    let repository = create_repository().await;
    let partition = unique_partition("named");
    let mut document = TestDocument::new("Named");
    repository
        .add_one(&mut document, OperationOptions::partition(&partition))
        .await
        .unwrap();

    let handler = MongoDbIndexHandler::new(repository.shared_context());
    let name = handler
        .create_index_in(
            "testDocuments",
            &[("group_key", IndexKind::Ascending), ("some_value", IndexKind::Descending)],
            &IndexCreationOptions::unique(),
            OperationOptions::partition(&partition),
        )
        .await
        .unwrap();
    assert_eq!(name, "group_key_1_some_value_-1");

    let typed = repository
        .get_index_names::<TestDocument>(OperationOptions::partition(&partition))
        .await
        .unwrap();
    assert!(typed.contains(&name));

    handler
        .drop_index_in("testDocuments", &name, OperationOptions::partition(&partition))
        .await
        .unwrap();
    let named = handler
        .get_index_names_in("testDocuments", OperationOptions::partition(&partition))
        .await
        .unwrap();
    assert_eq!(named, vec!["_id_".to_string()]);
}
