//! Integration tests for AlitheiaClient.
//!
//! Uses wiremock for HTTP mocking. Tests cover request shapes, basic auth,
//! status mapping (401/404/429/5xx), JSON decoding and retry behavior.

use std::time::Duration;

use alitheia_terrier::{
    AlitheiaClient, MetricsRequest, TerrierConfig, TerrierError, TERRIER_USER_AGENT,
};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config(mock_server: &MockServer) -> TerrierConfig {
    TerrierConfig::default()
        .with_url(mock_server.uri())
        .with_credentials("guest", "guest")
        .with_max_retries(0)
}

fn create_test_client(mock_server: &MockServer) -> AlitheiaClient {
    AlitheiaClient::new(&test_config(mock_server)).expect("failed to create client")
}

#[tokio::test]
async fn test_metric_types_by_ids_request_shape() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/metrics/types/by-ids"))
        .and(header("authorization", "Basic Z3Vlc3Q6Z3Vlc3Q="))
        .and(header("user-agent", TERRIER_USER_AGENT))
        .and(body_json(json!({"ids": [3, 4]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 3, "type": "SOURCE_CODE"},
            {"id": 4, "type": "BUG_DATABASE"}
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);
    let types = client
        .get_metric_types_by_ids(&[3, 4])
        .await
        .expect("fetch failed");

    assert_eq!(types.len(), 2);
    assert_eq!(types[0].type_name, "SOURCE_CODE");
    assert_eq!(types[1].id, 4);
}

#[tokio::test]
async fn test_all_installed_metrics_request() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/metrics/by-resources"))
        .and(body_json(json!({
            "skip_resources_ids": true,
            "resources_ids": [],
            "is_file_group": true,
            "is_project_file": true,
            "is_project_version": true,
            "is_stored_project": true
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "metric_type_id": 2, "mnemonic": "LOC", "description": "Lines of code"}
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);
    let metrics = client
        .get_metrics_by_resources(&MetricsRequest::all_installed())
        .await
        .expect("fetch failed");

    assert_eq!(metrics.len(), 1);
    assert_eq!(metrics[0].mnemonic, "LOC");
    assert_eq!(metrics[0].plugin_id, None);
}

#[tokio::test]
async fn test_unauthorized() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/projects/evaluated"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);
    let result = client.get_evaluated_projects().await;

    assert!(matches!(result, Err(TerrierError::Unauthorized { .. })));
}

#[tokio::test]
async fn test_not_found_names_resource() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/versions/9/files/count"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);
    let result = client.get_files_count_by_version(9).await;

    match result {
        Err(TerrierError::NotFound { resource }) => {
            assert_eq!(resource, "versions/9/files/count");
        }
        other => panic!("expected NotFound, got {:?}", other),
    }
}

#[tokio::test]
async fn test_optional_lookups_map_404_to_none() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/projects/5/root"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/users/by-name/jane%20doe"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);

    assert!(client.get_root_directory(5).await.unwrap().is_none());
    assert!(client.get_user_by_name("jane doe").await.unwrap().is_none());
}

#[tokio::test]
async fn test_rate_limiting_with_retry_after() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/projects/evaluated"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "5"))
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);
    let result = client.get_evaluated_projects().await;

    match result {
        Err(TerrierError::RateLimited { retry_after }) => {
            assert_eq!(retry_after, Some(Duration::from_secs(5)));
        }
        other => panic!("expected RateLimited, got {:?}", other),
    }
}

#[tokio::test]
async fn test_server_error_maps_to_remote() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/users/by-ids"))
        .respond_with(ResponseTemplate::new(500).set_body_string("database unavailable"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);
    let result = client.get_users_by_ids(&[1]).await;

    match result {
        Err(TerrierError::Remote { status, message }) => {
            assert_eq!(status, 500);
            assert_eq!(message, "database unavailable");
        }
        other => panic!("expected Remote, got {:?}", other),
    }
}

#[tokio::test]
async fn test_invalid_json_is_invalid_response() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/projects/1/versions/count"))
        .respond_with(ResponseTemplate::new(200).set_body_string("forty-two"))
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);
    let result = client.get_versions_count(1).await;

    assert!(matches!(result, Err(TerrierError::InvalidResponse { .. })));
}

#[tokio::test]
async fn test_retry_recovers_from_transient_failure() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/motd"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/motd"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!("Welcome to Alitheia")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = test_config(&mock_server).with_max_retries(1);
    let client = AlitheiaClient::new(&config).unwrap();

    let motd = client.get_message_of_the_day().await.expect("retry failed");
    assert_eq!(motd.as_deref(), Some("Welcome to Alitheia"));
}

#[tokio::test]
async fn test_max_retries_exceeded() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/ping"))
        .respond_with(ResponseTemplate::new(502))
        .expect(3)
        .mount(&mock_server)
        .await;

    let config = test_config(&mock_server).with_max_retries(2);
    let client = AlitheiaClient::new(&config).unwrap();

    let result = client.ping().await;
    assert!(matches!(
        result,
        Err(TerrierError::Remote { status: 502, .. })
    ));
}

#[tokio::test]
async fn test_client_errors_are_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/versions/by-ids"))
        .respond_with(ResponseTemplate::new(400))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = test_config(&mock_server).with_max_retries(3);
    let client = AlitheiaClient::new(&config).unwrap();

    let result = client.get_project_versions_by_ids(&[1]).await;
    assert!(matches!(
        result,
        Err(TerrierError::Remote { status: 400, .. })
    ));
}

#[tokio::test]
async fn test_posts_are_sent_once() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/users/pending"))
        .respond_with(ResponseTemplate::new(502))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/metrics/types/by-ids"))
        .respond_with(ResponseTemplate::new(429))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = test_config(&mock_server).with_max_retries(3);
    let client = AlitheiaClient::new(&config).unwrap();

    let result = client.create_pending_user("bob", "pw", "bob@example.org").await;
    assert!(matches!(
        result,
        Err(TerrierError::Remote { status: 502, .. })
    ));

    let result = client.get_metric_types_by_ids(&[1, 2]).await;
    assert!(matches!(result, Err(TerrierError::RateLimited { .. })));
}

#[tokio::test]
async fn test_login_refused_is_false() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/session/login"))
        .and(body_json(json!({"user": "mallory", "password": "wrong"})))
        .respond_with(ResponseTemplate::new(403))
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);
    assert!(!client.login("mallory", "wrong").await.unwrap());
}

#[tokio::test]
async fn test_connection_refused_is_network_error() {
    // Nothing listens on port 9 (discard) on test machines.
    let config = TerrierConfig::default()
        .with_url("http://127.0.0.1:9")
        .with_max_retries(0)
        .with_timeout_secs(2);
    let client = AlitheiaClient::new(&config).unwrap();

    let result = client.ping().await;
    assert!(matches!(result, Err(TerrierError::Network { .. })));
}
