//! Round trips against a live Neo4j. Skipped unless `NEO4J_TEST_URI` is set.

use std::sync::Arc;

use subjects_core::{EntityService, Subject};
use subjects_graph::{GraphClient, GraphConfig, Neo4jStore, ServiceConfig, SubjectService};

async fn live_service() -> Option<SubjectService<Arc<Neo4jStore>>> {
    let uri = std::env::var("NEO4J_TEST_URI").ok()?;
    let defaults = GraphConfig::default();
    let config = GraphConfig {
        uri,
        user: std::env::var("NEO4J_TEST_USER").unwrap_or(defaults.user.clone()),
        password: std::env::var("NEO4J_TEST_PASSWORD").unwrap_or(defaults.password.clone()),
        ..defaults
    };
    let client = GraphClient::connect(&config).await.unwrap();
    let service_config = ServiceConfig::default();
    let store = Arc::new(Neo4jStore::new(client, service_config.request_timeout()));
    let service = SubjectService::new(store, service_config);
    service.initialise().await.unwrap();
    Some(service)
}

#[tokio::test]
async fn test_write_read_update_delete() {
    let Some(service) = live_service().await else {
        return;
    };
    let uuid = "subjects-rw-it-12345";

    let subject = Subject::new(uuid, "Test")
        .with_tme(["subjects-rw-it-TME_ID"])
        .with_uuids([uuid]);
    service.write(&subject).await.unwrap();
    let stored = service.read(uuid).await.unwrap().unwrap();
    assert_eq!(stored, subject.clone().with_subject_types());

    // Writing the same state again changes nothing.
    service.write(&subject).await.unwrap();
    assert_eq!(service.read(uuid).await.unwrap(), Some(stored));

    let updated = Subject::new(uuid, "Test 'special chars").with_uuids([uuid]);
    service.write(&updated).await.unwrap();
    let stored = service.read(uuid).await.unwrap().unwrap();
    assert_eq!(stored.pref_label.as_deref(), Some("Test 'special chars"));
    assert!(stored.alternative_identifiers.tme.is_empty());

    assert!(service.delete(uuid).await.unwrap());
    assert_eq!(service.read(uuid).await.unwrap(), None);
    assert!(!service.delete(uuid).await.unwrap());
}

#[tokio::test]
async fn test_connectivity_check() {
    let Some(service) = live_service().await else {
        return;
    };
    service.check().await.unwrap();
}
