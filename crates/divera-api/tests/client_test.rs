#![allow(clippy::unwrap_used)]
// Integration tests for `DiveraClient` using wiremock.

use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use divera_api::{DiveraClient, Error};

const KEY: &str = "test-access-key";

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, DiveraClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let client = DiveraClient::with_client(
        reqwest::Client::new(),
        base_url,
        SecretString::from(KEY.to_string()),
    );
    (server, client)
}

fn pull_all_body() -> serde_json::Value {
    json!({
        "success": true,
        "data": {
            "user": { "firstname": "Erika", "lastname": "Muster" },
            "status": { "status_id": 2 },
            "ucr_default": 100,
            "ucr_active": 100,
            "ucr": { "100": { "id": 100, "name": "FF Musterstadt", "usergroup_id": 4 } },
            "cluster": {
                "id": 1,
                "name": "FF Musterstadt",
                "version_id": 3,
                "status": {
                    "1": { "id": 1, "name": "available" },
                    "2": { "id": 2, "name": "on duty" }
                },
                "statussorting": [1, 2],
                "consumer": [],
                "vehicle": {
                    "10": { "id": 10, "name": "HLF 20", "fmsstatus_id": 2, "lat": "52.1", "lng": 13.2 }
                }
            },
            "alarm": {
                "items": { "5": { "id": 5, "title": "Brand", "date": 1_700_000_000, "closed": false } },
                "sorting": [5]
            },
            "ts_news": 11,
            "ts_event": 12
        }
    })
}

// ── Pull-all ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_pull_all_sends_access_key_and_ucr() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/pull/all"))
        .and(query_param("accesskey", KEY))
        .and(query_param("ucr", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(pull_all_body()))
        .expect(1)
        .mount(&server)
        .await;

    let data = client.pull_all(Some(100)).await.unwrap();

    assert_eq!(data.cluster.name.as_deref(), Some("FF Musterstadt"));
    assert_eq!(data.cluster.status.len(), 2);
    assert!(data.cluster.consumer.is_empty());
    assert_eq!(data.alarm.sorting, vec![5]);
    assert_eq!(data.timestamps.ts_event, Some(12));

    let (_, vehicle) = data.cluster.vehicle.into_entries().remove(0);
    assert_eq!(vehicle.lat, Some(52.1));
    assert_eq!(vehicle.lng, Some(13.2));
}

#[tokio::test]
async fn test_pull_all_without_ucr_omits_parameter() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/pull/all"))
        .respond_with(ResponseTemplate::new(200).set_body_json(pull_all_body()))
        .mount(&server)
        .await;

    client.pull_all(None).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(
        !requests[0].url.query_pairs().any(|(k, _)| k == "ucr"),
        "ucr must not be sent when absent"
    );
}

// ── Error classification ────────────────────────────────────────────

#[tokio::test]
async fn test_unauthorized_is_authentication_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/pull/all"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({ "success": false, "message": "Zugriff verweigert" })),
        )
        .mount(&server)
        .await;

    let err = client.pull_all(None).await.unwrap_err();
    match err {
        Error::Authentication { status, message } => {
            assert_eq!(status, 401);
            assert_eq!(message, "Zugriff verweigert");
        }
        other => panic!("expected Authentication, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_forbidden_is_authentication_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/pull/all"))
        .respond_with(ResponseTemplate::new(403).set_body_string("Forbidden"))
        .mount(&server)
        .await;

    let err = client.pull_all(None).await.unwrap_err();
    assert!(err.is_auth(), "got: {err:?}");
}

#[tokio::test]
async fn test_server_error_is_connection_class() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/pull/all"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let err = client.pull_all(None).await.unwrap_err();
    assert!(matches!(err, Error::Server { status: 503, .. }), "got: {err:?}");
    assert!(err.is_connection());
}

#[tokio::test]
async fn test_non_json_body_is_deserialization_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/pull/all"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = client.pull_all(None).await.unwrap_err();
    assert!(matches!(err, Error::Deserialization { .. }), "got: {err:?}");
    assert!(err.is_connection());
}

#[tokio::test]
async fn test_success_false_is_api_error() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/v2/statusgeber/set-status"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "success": false, "message": "unknown status" })),
        )
        .mount(&server)
        .await;

    let err = client.set_status(None, 99).await.unwrap_err();
    match err {
        Error::Api { status, message, .. } => {
            assert_eq!(status, 200);
            assert_eq!(message, "unknown status");
        }
        other => panic!("expected Api, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_success_false_naming_access_key_is_authentication_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/pull/all"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "message": "Invalid accesskey",
            "errors": { "accesskey": ["Der Accesskey ist ungültig."] }
        })))
        .mount(&server)
        .await;

    let err = client.pull_all(Some(100)).await.unwrap_err();
    match err {
        Error::Authentication { status, ref message } => {
            assert_eq!(status, 200);
            assert_eq!(message, "Invalid accesskey");
        }
        ref other => panic!("expected Authentication, got: {other:?}"),
    }
    assert!(err.is_auth());
}

#[tokio::test]
async fn test_success_false_denying_access_is_authentication_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/pull/all"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "success": false, "message": "Access denied" })),
        )
        .mount(&server)
        .await;

    let err = client.pull_all(None).await.unwrap_err();
    assert!(err.is_auth(), "got: {err:?}");
}

#[tokio::test]
async fn test_base_url_path_prefix_is_kept() {
    let server = MockServer::start().await;
    let base_url = Url::parse(&format!("{}/divera", server.uri())).unwrap();
    let client = DiveraClient::with_client(
        reqwest::Client::new(),
        base_url,
        SecretString::from(KEY.to_string()),
    );

    Mock::given(method("GET"))
        .and(path("/divera/api/v2/pull/all"))
        .respond_with(ResponseTemplate::new(200).set_body_json(pull_all_body()))
        .expect(1)
        .mount(&server)
        .await;

    client.pull_all(None).await.unwrap();
    assert_eq!(client.base_url().path(), "/divera/");
}

#[tokio::test]
async fn test_client_error_is_api_error() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/v2/alarms/probe"))
        .respond_with(ResponseTemplate::new(422).set_body_string("nope"))
        .mount(&server)
        .await;

    let err = client.trigger_probe_alarm(Some(100)).await.unwrap_err();
    assert!(matches!(err, Error::Api { status: 422, .. }), "got: {err:?}");
    assert!(!err.is_connection());
    assert!(!err.is_auth());
}

#[tokio::test]
async fn test_unreachable_host_is_transport_error() {
    let client = DiveraClient::with_client(
        reqwest::Client::new(),
        Url::parse("http://127.0.0.1:1").unwrap(),
        SecretString::from(KEY.to_string()),
    );

    let err = client.pull_all(None).await.unwrap_err();
    assert!(matches!(err, Error::Transport(_)), "got: {err:?}");
    assert!(err.is_connection());
}

// ── Commands ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_set_status_posts_status_body() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/v2/statusgeber/set-status"))
        .and(query_param("accesskey", KEY))
        .and(query_param("ucr", "100"))
        .and(body_json(json!({ "Status": { "id": 3 } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&server)
        .await;

    client.set_status(Some(100), 3).await.unwrap();
}

#[tokio::test]
async fn test_probe_alarm_posts_to_probe_endpoint() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/v2/alarms/probe"))
        .and(query_param("ucr", "100"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "success": true, "data": [] })),
        )
        .expect(1)
        .mount(&server)
        .await;

    client.trigger_probe_alarm(Some(100)).await.unwrap();
}

#[tokio::test]
async fn test_debug_output_redacts_access_key() {
    let (_server, client) = setup().await;
    let rendered = format!("{client:?}");
    assert!(!rendered.contains(KEY), "access key leaked: {rendered}");
}
