use super::helpers::{collection, collections, server_error, service, ScriptedCatalog};
use crate::aggregate::aggregate;
use crate::pagination::{fetch_all, Completion, Page};

fn two_service_catalog() -> ScriptedCatalog {
    ScriptedCatalog::new(vec![
        Ok(Page::new(vec![service("S1-PROV", 3)], Some("services-2".to_string()))),
        Ok(Page::last(vec![service("S2-PROV", 1)])),
    ])
    .with_collections(
        "S1-PROV",
        vec![
            Ok(Page::new(collections(0, 2), Some("s1-page-2".to_string()))),
            Ok(Page::last(collections(2, 1))),
        ],
    )
    .with_collections("S2-PROV", vec![Ok(Page::last(vec![collection("C9-PROV")]))])
}

#[tracing_test::traced_test]
#[tokio::test]
async fn test_aggregate_attaches_collections_in_discovery_order() {
    let catalog = two_service_catalog();

    let aggregation = aggregate(&catalog, 3).await;

    assert!(aggregation.is_complete());
    assert_eq!(aggregation.completion, Completion::Exhausted);

    let ids: Vec<&str> = aggregation.services.iter().map(|s| s.concept_id.as_str()).collect();
    assert_eq!(ids, vec!["S1-PROV", "S2-PROV"]);

    let first = &aggregation.services[0];
    assert_eq!(first.name, "S1-PROV name");
    assert_eq!(first.collection_count, 3);
    assert_eq!(first.collections, collections(0, 3));
    assert_eq!(first.collections_completion, Completion::Exhausted);

    assert_eq!(aggregation.services[1].collections, vec![collection("C9-PROV")]);

    // Each service gets its own enumeration, keyed by its concept ID.
    assert_eq!(
        catalog.collection_cursors("S1-PROV"),
        vec![None, Some("s1-page-2".to_string())]
    );
    assert_eq!(catalog.collection_cursors("S2-PROV"), vec![None]);
}

#[tokio::test]
async fn test_aggregate_matches_independent_collection_fetch() {
    let aggregation = aggregate(&two_service_catalog(), 3).await;

    for service in &aggregation.services {
        let reference = two_service_catalog();
        let independent = fetch_all(
            &crate::catalog::CollectionPages::new(&reference, &service.concept_id),
            3,
        )
        .await;

        assert_eq!(service.collections.len(), independent.items.len());
        assert_eq!(service.collections, independent.items);
    }
}

#[tokio::test]
async fn test_truncated_collections_only_affect_their_service() {
    let catalog = ScriptedCatalog::new(vec![Ok(Page::last(vec![
        service("S1-PROV", 200),
        service("S2-PROV", 1),
    ]))])
    .with_collections(
        "S1-PROV",
        vec![
            Ok(Page::new(collections(0, 100), Some("page-2".to_string()))),
            Err(server_error()),
            Err(server_error()),
            Err(server_error()),
        ],
    )
    .with_collections("S2-PROV", vec![Ok(Page::last(collections(500, 1)))]);

    let aggregation = aggregate(&catalog, 3).await;

    assert_eq!(aggregation.completion, Completion::Exhausted);
    assert!(!aggregation.is_complete());

    let first = &aggregation.services[0];
    assert_eq!(first.collections, collections(0, 100));
    assert_eq!(first.collections_completion, Completion::Truncated);
    assert_eq!(first.count_mismatch(), Some((200, 100)));

    let second = &aggregation.services[1];
    assert_eq!(second.collections_completion, Completion::Exhausted);
    assert_eq!(second.count_mismatch(), None);

    let truncated: Vec<&str> = aggregation
        .truncated_services()
        .map(|s| s.concept_id.as_str())
        .collect();
    assert_eq!(truncated, vec!["S1-PROV"]);
}

#[tokio::test]
async fn test_failed_service_enumeration_returns_partial_services() {
    let catalog = ScriptedCatalog::new(vec![
        Ok(Page::new(vec![service("S1-PROV", 0)], Some("services-2".to_string()))),
        Err(server_error()),
        Err(server_error()),
        Err(server_error()),
    ]);

    let aggregation = aggregate(&catalog, 3).await;

    assert_eq!(aggregation.completion, Completion::Truncated);
    assert_eq!(aggregation.services.len(), 1);
    assert!(aggregation.services[0].collections.is_empty());
}

#[tokio::test]
async fn test_service_serialises_without_completion() {
    let aggregation = aggregate(&two_service_catalog(), 3).await;

    let json = serde_json::to_value(&aggregation.services[1]).unwrap();

    assert_eq!(
        json,
        serde_json::json!({
            "concept_id": "S2-PROV",
            "name": "S2-PROV name",
            "version": "1.0.0",
            "collection_count": 1,
            "collections": [
                {"concept_id": "C9-PROV", "short_name": "C9-PROV_short", "version": "1"}
            ]
        })
    );
}

#[tokio::test]
async fn test_no_services() {
    let catalog = ScriptedCatalog::new(vec![Ok(Page::last(Vec::new()))]);

    let aggregation = aggregate(&catalog, 3).await;

    assert!(aggregation.services.is_empty());
    assert!(aggregation.is_complete());
}
