//! HTTP-level coverage of the generation proxy client: success shapes,
//! rate-limit retry traffic, terminal failures, and shape violations.

use repomuse::{
    AiClient, ApiError, CallError, CancelToken, Capability, GenerateRequest, Generation,
    RetryConfig,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn test_client(server: &MockServer, max_attempts: usize) -> AiClient {
    AiClient::builder(format!("{}/call-ai", server.uri()))
        .retry(RetryConfig {
            max_attempts,
            initial_delay_ms: 1,
            ..RetryConfig::default()
        })
        .build()
        .expect("client")
}

fn text_body(text: &str) -> serde_json::Value {
    serde_json::json!({
        "candidates": [{ "content": { "parts": [{ "text": text }] } }]
    })
}

#[tokio::test]
async fn text_generation_succeeds_first_attempt() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/call-ai"))
        .and(body_partial_json(serde_json::json!({ "type": "text" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_body("# Generated README")))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server, 3);
    let text = client.generate_text("write a readme").await.expect("generation");

    assert_eq!(text, "# Generated README");
}

#[tokio::test]
async fn rate_limiting_is_retried_until_success() {
    init_tracing();
    let server = MockServer::start().await;
    let hits = Arc::new(AtomicUsize::new(0));
    let hits_clone = hits.clone();

    Mock::given(method("POST"))
        .and(path("/call-ai"))
        .respond_with(move |_req: &Request| -> ResponseTemplate {
            if hits_clone.fetch_add(1, Ordering::SeqCst) < 2 {
                ResponseTemplate::new(429).set_body_string("Too Many Requests")
            } else {
                ResponseTemplate::new(200).set_body_json(text_body("third time lucky"))
            }
        })
        .expect(3)
        .mount(&server)
        .await;

    let client = test_client(&server, 3);
    let text = client.generate_text("try hard").await.expect("generation");

    assert_eq!(text, "third time lucky");
    assert_eq!(hits.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn exhausted_rate_limits_surface_the_last_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/call-ai"))
        .respond_with(
            ResponseTemplate::new(429)
                .set_body_json(serde_json::json!({ "error": "quota exhausted" })),
        )
        .expect(3)
        .mount(&server)
        .await;

    let client = test_client(&server, 3);
    let err = client.generate_text("anything").await.unwrap_err();

    match err {
        CallError::Exhausted { attempts, last } => {
            assert_eq!(attempts, 3);
            assert!(last.is_rate_limited());
            assert!(last.to_string().contains("quota exhausted"));
        }
        e => panic!("expected Exhausted, got {:?}", e),
    }
}

#[tokio::test]
async fn upstream_errors_are_terminal_after_one_attempt() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/call-ai"))
        .respond_with(
            ResponseTemplate::new(502)
                .set_body_json(serde_json::json!({ "error": "model backend unavailable" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server, 3);
    let err = client.generate_text("anything").await.unwrap_err();

    match err {
        CallError::Inner(ApiError::Upstream { status, message }) => {
            assert_eq!(status, 502);
            assert_eq!(message, "model backend unavailable");
        }
        e => panic!("expected Upstream, got {:?}", e),
    }
}

#[tokio::test]
async fn missing_text_field_is_a_shape_violation_not_a_retry() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/call-ai"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "candidates": [] })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server, 3);
    let err = client.generate_text("anything").await.unwrap_err();

    assert!(matches!(err, CallError::Inner(ApiError::InvalidShape(_))));
}

#[tokio::test]
async fn empty_generated_text_is_also_a_shape_violation() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/call-ai"))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_body("   ")))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server, 3);
    let err = client.generate_text("anything").await.unwrap_err();

    assert!(matches!(err, CallError::Inner(ApiError::InvalidShape(_))));
}

#[tokio::test]
async fn non_json_success_bodies_fail_to_decode_terminally() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/call-ai"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server, 3);
    let err = client.generate_text("anything").await.unwrap_err();

    assert!(matches!(err, CallError::Inner(ApiError::Decode(_))));
}

#[tokio::test]
async fn image_generation_returns_a_usable_payload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/call-ai"))
        .and(body_partial_json(serde_json::json!({ "type": "image" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "predictions": [{ "bytesBase64Encoded": "aGVsbG8=" }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server, 3);
    let image = client.generate_image("a star field").await.expect("generation");

    assert_eq!(image.bytes().expect("decode"), b"hello");
    assert_eq!(image.data_url(), "data:image/png;base64,aGVsbG8=");
}

#[tokio::test]
async fn missing_image_bytes_are_a_shape_violation() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/call-ai"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "predictions": [] })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server, 3);
    let err = client.generate_image("a star field").await.unwrap_err();

    assert!(matches!(err, CallError::Inner(ApiError::InvalidShape(_))));
}

#[tokio::test]
async fn image_edit_requests_carry_the_inline_image() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/call-ai"))
        .and(body_partial_json(serde_json::json!({
            "type": "image",
            "image": "c291cmNl",
            "prompt": "make it blue"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "predictions": [{ "bytesBase64Encoded": "aGVsbG8=" }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server, 3);
    let request = GenerateRequest::image_edit("make it blue", "c291cmNl");
    assert_eq!(request.capability, Capability::Image);

    let generation = client.generate(&request).await.expect("generation");
    match generation {
        Generation::Image(image) => assert_eq!(image.as_base64(), "aGVsbG8="),
        Generation::Text(_) => panic!("expected an image generation"),
    }
}

#[tokio::test]
async fn pre_cancelled_requests_never_reach_the_wire() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/call-ai"))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_body("unreachable")))
        .expect(0)
        .mount(&server)
        .await;

    let client = test_client(&server, 3);
    let token = CancelToken::new();
    token.cancel();

    let request = GenerateRequest::text("anything");
    let err = client.generate_with_cancel(&request, &token).await.unwrap_err();

    assert!(err.is_cancelled());
    assert!(server.received_requests().await.expect("requests").is_empty());
}
