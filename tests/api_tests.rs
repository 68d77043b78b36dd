mod common;

use common::{RecordingGateway, Sent, StubNlu, StubPlatform};
use messenger_nlu_bridge::config::Config;
use messenger_nlu_bridge::routes::create_router;
use messenger_nlu_bridge::state::AppState;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tower::util::ServiceExt;

struct Harness {
    app: Router,
    gateway: Arc<RecordingGateway>,
    platform: Arc<StubPlatform>,
    nlu: Arc<StubNlu>,
}

fn harness(nlu_reply: Value, test_recipient: Option<&str>) -> Harness {
    let mut vars = vec![
        ("APIAI_ACCESS_TOKEN", "nlu"),
        ("FB_VERIFY_TOKEN", "verify-me"),
        ("FB_PAGE_ACCESS_TOKEN", "page"),
        ("DISPATCH_DELAY_MS", "0"),
        ("SUBSCRIBE_DELAY_MS", "0"),
    ];
    if let Some(recipient) = test_recipient {
        vars.push(("TEST_RECIPIENT_ID", recipient));
    }
    let config = Config::from_lookup(|name: &str| {
        vars.iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.to_string())
    })
    .unwrap();

    let gateway = Arc::new(RecordingGateway::default());
    let platform = Arc::new(StubPlatform {
        first_name: Some("Ada".into()),
        ..Default::default()
    });
    let nlu = StubNlu::replying(nlu_reply);
    let state = Arc::new(AppState::new(
        &config,
        gateway.clone(),
        platform.clone(),
        nlu.clone(),
    ));

    Harness {
        app: create_router().with_state(state),
        gateway,
        platform,
        nlu,
    }
}

fn post_json(uri: &str, body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap()
}

async fn wait_for_sends(gateway: &RecordingGateway, count: usize) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while gateway.sent().len() < count {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("gateway calls did not arrive in time");
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_verification_handshake() {
    let h = harness(json!({}), None);

    let response = h
        .app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/webhook/?hub.mode=subscribe&hub.verify_token=verify-me&hub.challenge=12345")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&bytes[..], b"12345");

    tokio::time::timeout(Duration::from_secs(5), async {
        while *h.platform.subscriptions.lock().unwrap() == 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("subscription was not renewed");

    let response = h
        .app
        .oneshot(
            Request::builder()
                .uri("/webhook?hub.verify_token=nope&hub.challenge=12345")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_inbound_text_is_answered() {
    let h = harness(
        json!({"result": {"fulfillment": {"messages": [
            {"type": 0, "speech": "Hello"},
            {"type": 2, "title": "Pick", "replies": ["A", "B"]}
        ]}}}),
        None,
    );

    let body = json!({
        "object": "page",
        "entry": [{"messaging": [{
            "sender": {"id": 1217505768324329u64},
            "recipient": {"id": 99},
            "message": {"mid": "m1", "text": "hi there"}
        }]}]
    });
    let response = h
        .app
        .oneshot(post_json("/webhook/", body.to_string()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({"status": "ok"}));

    wait_for_sends(&h.gateway, 2).await;
    assert_eq!(
        h.gateway.recipients(),
        vec!["1217505768324329".to_string(), "1217505768324329".to_string()]
    );
    assert_eq!(h.gateway.sent()[0], Sent::Text("Hello".into()));
    assert!(matches!(h.gateway.sent()[1], Sent::QuickReply { .. }));

    let queries = h.nlu.queries.lock().unwrap();
    assert_eq!(queries.len(), 1);
    assert_eq!(queries[0].text, "hi there");
    assert!(!queries[0].session_id.is_empty());
    assert_eq!(queries[0].contexts[0].name, "generic");
    assert_eq!(queries[0].contexts[0].parameters["facebook_user"], "Ada");
}

#[tokio::test]
async fn test_payload_without_result_sends_nothing() {
    let h = harness(json!({"status": {"code": 200}}), None);
    let body = json!({"entry": [{"messaging": [
        {"sender": {"id": "7"}, "message": {"text": "hello"}}
    ]}]});

    let response = h
        .app
        .oneshot(post_json("/webhook/", body.to_string()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    tokio::time::timeout(Duration::from_secs(5), async {
        while h.nlu.queries.lock().unwrap().is_empty() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(h.gateway.sent().is_empty());
}

#[tokio::test]
async fn test_bad_body_is_rejected() {
    let h = harness(json!({}), None);

    let response = h
        .app
        .clone()
        .oneshot(post_json("/webhook/", "not json".to_string()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["status"], "error");

    let response = h
        .app
        .clone()
        .oneshot(post_json("/webhook/", r#"{"entry": []}"#.to_string()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = h
        .app
        .clone()
        .oneshot(post_json(
            "/webhook/",
            r#"{"object": "page", "entry": [{"id": "1", "time": 1}]}"#.to_string(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = h
        .app
        .oneshot(post_json("/webhook/", r#"{"entry": [{"messaging": []}]}"#.to_string()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_nlu_callback_replays_to_test_recipient() {
    let h = harness(json!({}), Some("tester"));
    let payload = json!({"result": {"fulfillment": {"messages": [
        {"type": 3, "imageUrl": "http://img/cat.png"}
    ]}}});

    let response = h
        .app
        .oneshot(post_json("/test-apiai-callback/", payload.to_string()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    wait_for_sends(&h.gateway, 1).await;
    assert_eq!(h.gateway.recipients(), vec!["tester".to_string()]);
    assert_eq!(h.gateway.sent(), vec![Sent::Image("http://img/cat.png".into())]);
}

#[tokio::test]
async fn test_nlu_callback_sends_valid_items_around_malformed_ones() {
    let h = harness(json!({}), Some("tester"));
    let payload = json!({"result": {"fulfillment": {"messages": [
        {"type": 0, "speech": "Hello"},
        {"type": 1, "title": 42, "buttons": {"text": "Buy"}},
        {"type": 2, "title": "Pick", "replies": [{"text": "A"}, "B"]},
        {"type": 2, "title": "Never", "replies": null},
        {"type": 3, "imageUrl": "http://img/cat.png"}
    ]}}});

    let response = h
        .app
        .oneshot(post_json("/test-apiai-callback/", payload.to_string()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    wait_for_sends(&h.gateway, 4).await;
    let sent = h.gateway.sent();
    assert_eq!(sent[0], Sent::Text("Hello".into()));
    assert!(matches!(&sent[1], Sent::Card { title, buttons, .. } if title.is_empty() && buttons.is_empty()));
    assert!(matches!(&sent[2], Sent::QuickReply { replies, .. } if replies.len() == 1));
    assert_eq!(sent[3], Sent::Image("http://img/cat.png".into()));
}

#[tokio::test]
async fn test_nlu_callback_needs_test_recipient() {
    let h = harness(json!({}), None);
    let response = h
        .app
        .oneshot(post_json("/test-apiai-callback/", "{}".to_string()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health() {
    let h = harness(json!({}), None);
    let response = h
        .app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
