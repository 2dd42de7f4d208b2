mod common;

use std::sync::{Arc, Mutex};

use portal_graphql::{
    GraphqlClient, GraphqlClientError, GraphqlRequest, StatusCode, Transport, TransportConfig,
    async_trait,
};
use portal_status::{GROUP_SECURITY, TYPE_ERROR};
use reqwest::header::HeaderMap;
use serde::Deserialize;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{init_test_tracing, unreachable_endpoint};

fn client_for(server: &MockServer) -> GraphqlClient {
    GraphqlClient::new(format!("{}/graphql", server.uri()), &TransportConfig::default())
        .expect("client")
}

async fn respond_with(server: &MockServer, body: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn execute_structured_success() {
    init_test_tracing();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(header("content-type", "application/json"))
        .and(header("authorization", "Bearer secret-token"))
        .and(body_json(json!({
            "query": "query ($id: ID) { user(id: $id) { id } }",
            "variables": {"id": "user-1"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"user": {"id": "user-1"}}
        })))
        .mount(&server)
        .await;

    let request = GraphqlRequest::new("query ($id: ID) { user(id: $id) { id } }")
        .with_variables(json!({"id": "user-1"}))
        .with_token(Some("secret-token"));

    let data = client_for(&server)
        .execute_structured(&request)
        .await
        .expect("query should succeed");

    assert_eq!(
        data.path(&["user", "id"]).and_then(|id| id.as_str()),
        Some("user-1")
    );
}

#[tokio::test]
async fn structured_arrays_keep_positions() {
    init_test_tracing();
    let server = MockServer::start().await;
    respond_with(
        &server,
        json!({"data": {"fields": {"array": [{"id": 1}, {"id": 2}]}}}),
    )
    .await;

    let data = client_for(&server)
        .execute_structured(&GraphqlRequest::new("{ fields { array { id } } }"))
        .await
        .expect("query should succeed");

    let second = data
        .path(&["fields", "array"])
        .and_then(|array| array.index(1))
        .and_then(|item| item.get("id"))
        .and_then(|id| id.as_i64());
    assert_eq!(second, Some(2));
}

#[tokio::test]
async fn api_error_maps_to_status_code() {
    init_test_tracing();
    let server = MockServer::start().await;

    let status = StatusCode::new("not authorized")
        .with_type(TYPE_ERROR)
        .with_group(GROUP_SECURITY)
        .with_message_id(0xB00D)
        .with_service(0xAA);
    respond_with(&server, serde_json::to_value(status.to_error_payload()).unwrap()).await;

    let err = client_for(&server)
        .execute_structured(&GraphqlRequest::new("{ ping }"))
        .await
        .expect_err("should fail with API error");

    assert!(matches!(err, GraphqlClientError::Api(_)));
    assert_eq!(err.to_string(), "not authorized (24B00DAA)");
    assert_eq!(err.status_code(), Some(&status));
}

#[tokio::test]
async fn execute_data_deserializes() {
    #[derive(Debug, Deserialize)]
    struct Ping {
        ping: String,
    }

    init_test_tracing();
    let server = MockServer::start().await;
    respond_with(&server, json!({"data": {"ping": "pong"}})).await;
    let client = client_for(&server);

    let ping: Ping = client
        .execute_data(&GraphqlRequest::new("{ ping }"))
        .await
        .expect("query should succeed");
    assert_eq!(ping.ping, "pong");

    #[derive(Debug, Deserialize)]
    struct Missing {
        #[allow(dead_code)]
        pong: String,
    }
    let err = client
        .execute_data::<_, Missing>(&GraphqlRequest::new("{ ping }"))
        .await
        .expect_err("shape mismatch");
    assert!(matches!(err, GraphqlClientError::ResponseShape(_)));
}

#[tokio::test]
async fn malformed_json_is_decode_error() {
    init_test_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .execute_structured(&GraphqlRequest::new("{ ping }"))
        .await
        .expect_err("should fail decoding");
    assert!(matches!(err, GraphqlClientError::ResponseDecode(_)));
}

#[tokio::test]
async fn http_status_error_is_transport_level() {
    init_test_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .expect(1)
        .mount(&server)
        .await;

    let err = client_for(&server)
        .execute_raw(&GraphqlRequest::new("{ ping }"))
        .await
        .expect_err("should fail");

    assert!(err.is_transport());
    assert!(matches!(err, GraphqlClientError::HttpStatus { status: 502, ref body } if body == "bad gateway"));
}

#[tokio::test]
async fn connection_refused_is_transport_error() {
    init_test_tracing();
    let client = GraphqlClient::new(unreachable_endpoint(), &TransportConfig::default()).unwrap();

    let err = client
        .execute_structured(&GraphqlRequest::new("{ ping }"))
        .await
        .expect_err("nothing listens");
    assert!(matches!(err, GraphqlClientError::Transport(ref info) if info.is_connect));
}

#[tokio::test]
async fn is_reachable_against_healthy_endpoint() {
    init_test_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_json(json!({"query": "{__schema { queryType { name }}}"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"__schema": {"queryType": {"name": "Query"}}}
        })))
        .expect(2)
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert!(client.is_reachable().await);
    assert!(client.is_reachable().await);
}

#[tokio::test]
async fn is_reachable_never_fails() {
    init_test_tracing();
    let client = GraphqlClient::new(unreachable_endpoint(), &TransportConfig::default()).unwrap();
    assert!(!client.is_reachable().await);
    assert!(!client.is_reachable().await);

    let server = MockServer::start().await;
    respond_with(&server, json!({"data": {"__schema": {"queryType": {"name": "Other"}}}})).await;
    assert!(!client_for(&server).is_reachable().await);
}

#[derive(Default)]
struct CannedTransport {
    sent: Mutex<Vec<(String, HeaderMap, serde_json::Value)>>,
    reply: Vec<u8>,
}

#[async_trait]
impl Transport for CannedTransport {
    async fn post(
        &self,
        url: &str,
        headers: HeaderMap,
        body: Vec<u8>,
    ) -> Result<Vec<u8>, GraphqlClientError> {
        let body = serde_json::from_slice(&body).expect("request body is JSON");
        self.sent.lock().unwrap().push((url.to_string(), headers, body));
        Ok(self.reply.clone())
    }
}

#[tokio::test]
async fn custom_transport_receives_wire_request() {
    let transport = Arc::new(CannedTransport {
        reply: br#"{"data":{"ping":"pong"}}"#.to_vec(),
        ..CannedTransport::default()
    });

    struct Shared(Arc<CannedTransport>);

    #[async_trait]
    impl Transport for Shared {
        async fn post(
            &self,
            url: &str,
            headers: HeaderMap,
            body: Vec<u8>,
        ) -> Result<Vec<u8>, GraphqlClientError> {
            self.0.post(url, headers, body).await
        }
    }

    let client = GraphqlClient::with_transport("memory://graphql", Shared(Arc::clone(&transport)));
    let request = GraphqlRequest::new("{ ping }")
        .with_fragment("fragment F on Query { ping }")
        .with_token(Some("t0k3n"));
    let data = client.execute_value(&request).await.unwrap();
    assert_eq!(data, json!({"ping": "pong"}));

    let sent = transport.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "memory://graphql");
    let sent_header = |name: &str| sent[0].1.get(name).and_then(|v| v.to_str().ok());
    assert_eq!(sent_header("authorization"), Some("Bearer t0k3n"));
    assert_eq!(sent_header("content-type"), Some("application/json"));
    assert_eq!(
        sent[0].2,
        json!({"query": "{ ping }\nfragment F on Query { ping }"})
    );
}

#[tokio::test]
async fn custom_transport_gets_json_content_type_without_token() {
    let client = GraphqlClient::with_transport(
        "memory://graphql",
        CannedTransport {
            reply: br#"{"data":{"ping":"pong"}}"#.to_vec(),
            ..CannedTransport::default()
        },
    );
    client
        .execute_value(&GraphqlRequest::new("{ ping }"))
        .await
        .unwrap();

    let sent = client.transport().sent.lock().unwrap();
    let headers = &sent[0].1;
    assert_eq!(
        headers.get("content-type").and_then(|v| v.to_str().ok()),
        Some("application/json")
    );
    assert!(headers.get("authorization").is_none());
}
