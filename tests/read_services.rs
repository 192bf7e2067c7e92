//! Widget, custom field and unsorted endpoints against a recording transport

mod common;

use amocrm_sdk::api::constants::EntityType;
use amocrm_sdk::api::{EntityReader, IncomingLeadService, Method};
use common::{RecordingTransport, account};
use serde_json::json;
use std::sync::Arc;

#[tokio::test]
async fn test_install_widget_posts_settings() {
    let transport = Arc::new(RecordingTransport::new().respond(Some(json!({"code": "amo_chat", "is_active": true}))));
    let reader = EntityReader::new(transport.clone());

    let response = reader
        .install_widget(&account(), "amo_chat", json!({"settings": {"login": "bot"}}))
        .await
        .unwrap();

    let calls = transport.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].path, "/api/v4/widgets/amo_chat");
    assert_eq!(calls[0].method, Method::Post);
    assert_eq!(calls[0].params, json!({"settings": {"login": "bot"}}));
    assert_eq!(response.unwrap()["is_active"], json!(true));
}

#[tokio::test]
async fn test_uninstall_widget_accepts_no_content() {
    let transport = Arc::new(RecordingTransport::new().respond(None));
    let reader = EntityReader::new(transport.clone());

    let response = reader.uninstall_widget(&account(), "amo_chat").await.unwrap();

    assert!(response.is_none());
    assert_eq!(transport.calls()[0].path, "/api/v4/widgets/amo_chat");
    assert_eq!(transport.calls()[0].method, Method::Delete);
}

#[tokio::test]
async fn test_custom_field_groups_are_extracted() {
    let transport = Arc::new(RecordingTransport::new().respond(Some(json!({
        "_total_items": 2,
        "_embedded": {"custom_field_groups": [
            {"id": "leads_1", "name": "Main"},
            {"id": "leads_2", "name": "Extra"}
        ]}
    }))));
    let reader = EntityReader::new(transport.clone());

    let groups = reader
        .custom_field_groups(&account(), EntityType::Leads, json!({}))
        .await
        .unwrap();

    assert_eq!(transport.calls()[0].path, "/api/v4/leads/custom_fields/groups");
    assert_eq!(transport.calls()[0].method, Method::Get);
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[1]["name"], json!("Extra"));
}

#[tokio::test]
async fn test_delete_custom_field_puts_id_in_path() {
    let transport = Arc::new(RecordingTransport::new().respond(None));
    let reader = EntityReader::new(transport.clone());

    reader
        .delete_custom_field(&account(), EntityType::Contacts, 512)
        .await
        .unwrap();

    let calls = transport.calls();
    assert_eq!(calls[0].path, "/api/v4/contacts/custom_fields/512");
    assert_eq!(calls[0].method, Method::Delete);
    assert_eq!(calls[0].params, json!({}));
}

#[tokio::test]
async fn test_unsorted_summary_uses_v2() {
    let summary = json!({"total": 4, "accepted": 1, "declined": 1, "average_sort_time": 120});
    let transport = Arc::new(RecordingTransport::new().respond(Some(summary.clone())));
    let service = IncomingLeadService::new(transport.clone());

    let response = service
        .summary(&account(), json!({"filter": {"date": {"from": 1700000000}}}))
        .await
        .unwrap();

    assert_eq!(response, Some(summary));
    assert_eq!(transport.calls()[0].path, "/api/v2/incoming_leads/summary");
    assert_eq!(transport.calls()[0].method, Method::Get);
}
