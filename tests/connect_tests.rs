mod common;

use common::started_node;
use dvpn_node_client::application::facade::NodeClient;
use dvpn_node_client::domain::connection::ConnectRequest;
use dvpn_node_client::error::ConnectErrorKind;
use std::sync::Arc;

fn request() -> ConnectRequest {
    ConnectRequest {
        identity_address: "0x62a2fd21a2b54a0de72373f0e4b04d6eb711df04".into(),
        provider_id: "0x10ab96cd9b3d52e4e04dfdaca8a5d1ca5f3f7bda".into(),
        service_type: "wireguard".into(),
        dns_option: None,
    }
}

#[tokio::test]
async fn test_connect_success() {
    let (node, _engine) = started_node();
    let client = NodeClient::new(node);

    client.connect(&request()).await.unwrap();
    let status = client.status().await.unwrap();
    assert_eq!(status.state, "Connected");
    assert_eq!(status.provider_id, request().provider_id);
}

#[tokio::test]
async fn test_connect_invalid_proposal() {
    let (node, engine) = started_node();
    engine
        .script_connect_fault("InvalidProposal", "proposal no longer available")
        .await;
    let client = NodeClient::new(node);

    let err = client.connect(&request()).await.unwrap_err();
    assert_eq!(err.connect_kind(), Some(ConnectErrorKind::InvalidProposal));
    assert!(err.to_string().contains("proposal no longer available"));
}

#[tokio::test]
async fn test_connect_insufficient_balance() {
    let (node, engine) = started_node();
    engine
        .script_connect_fault("InsufficientBalance", "top up required")
        .await;
    let client = NodeClient::new(node);

    let err = client.connect(&request()).await.unwrap_err();
    assert_eq!(
        err.connect_kind(),
        Some(ConnectErrorKind::InsufficientBalance)
    );
}

#[tokio::test]
async fn test_connect_already_exists_sentinel() {
    let (node, engine) = started_node();
    engine
        .script_connect_fault("Unknown", "connection already exists")
        .await;
    let client = NodeClient::new(node);

    let err = client.connect(&request()).await.unwrap_err();
    assert_eq!(err.connect_kind(), Some(ConnectErrorKind::AlreadyConnected));
}

#[tokio::test]
async fn test_connect_unknown_message_stays_unknown() {
    let (node, engine) = started_node();
    engine.script_connect_fault("Unknown", "boom").await;
    let client = NodeClient::new(node);

    let err = client.connect(&request()).await.unwrap_err();
    assert_eq!(err.connect_kind(), Some(ConnectErrorKind::Unknown));
}

#[tokio::test]
async fn test_unrecognized_code_collapses_to_unknown() {
    let (node, engine) = started_node();
    engine
        .script_connect_fault("QuotaExceeded", "too many sessions")
        .await;
    let client = NodeClient::new(node);

    let err = client.connect(&request()).await.unwrap_err();
    assert_eq!(err.connect_kind(), Some(ConnectErrorKind::Unknown));
}

#[tokio::test]
async fn test_reconnect_classified_like_connect() {
    let (node, engine) = started_node();
    engine
        .script_connect_fault("Unknown", "connection already exists")
        .await;
    let client = Arc::new(NodeClient::new(node));

    let connect_err = client.connect(&request()).await.unwrap_err();
    let reconnect_err = client.reconnect(&request()).await.unwrap_err();
    assert_eq!(connect_err.connect_kind(), reconnect_err.connect_kind());
    assert_eq!(
        reconnect_err.connect_kind(),
        Some(ConnectErrorKind::AlreadyConnected)
    );
}

#[tokio::test]
async fn test_disconnect_resets_status() {
    let (node, _engine) = started_node();
    let client = NodeClient::new(node);

    client.connect(&request()).await.unwrap();
    client.disconnect().await.unwrap();
    let status = client.status().await.unwrap();
    assert_eq!(status.state, "NotConnected");
}
