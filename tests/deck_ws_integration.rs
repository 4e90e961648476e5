//! Integration tests for the deck WebSocket + REST surface.
//!
//! Each test spins up an Axum server on a random port, connects via
//! tokio-tungstenite or reqwest, and exercises the real wire contract.

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::time::timeout;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use signal_deck::deck::{
    CardKind, CardStore, CollisionPolicy, DeckAction, DeckQueue, EngineOptions, FeedbackCard,
    Filter, SwipeDirection, deck_routes,
};

/// Maximum time any test is allowed to run before we consider it hung.
const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Start an Axum server on a random port, return the port.
async fn start_server(queue: Arc<DeckQueue>) -> u16 {
    let app = deck_routes(Arc::clone(&queue), None);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    // Give the server a moment to start accepting connections.
    tokio::time::sleep(Duration::from_millis(50)).await;

    port
}

/// Two-card deck: one feature, one bug.
fn small_queue() -> Arc<DeckQueue> {
    let store = CardStore::new(vec![
        FeedbackCard::new("f1", CardKind::Feature, "Dark mode", "Please add dark mode"),
        FeedbackCard::new("b1", CardKind::Bug, "Crash on save", "App crashes when saving"),
    ])
    .unwrap();
    DeckQueue::new(store, EngineOptions::default(), CollisionPolicy::Reject)
}

/// Parse a WS text frame into a serde_json::Value.
fn parse_ws_json(msg: &Message) -> Value {
    match msg {
        Message::Text(txt) => serde_json::from_str(txt).expect("invalid JSON from server"),
        other => panic!("expected Text frame, got {:?}", other),
    }
}

async fn send_action<S>(ws: &mut S, action: &DeckAction)
where
    S: futures_util::Sink<Message> + Unpin,
    S::Error: std::fmt::Debug,
{
    let json = serde_json::to_string(action).unwrap();
    ws.send(Message::Text(json.into())).await.unwrap();
}

// ── WebSocket Tests ──────────────────────────────────────────────────

#[tokio::test]
async fn ws_connect_receives_seed_snapshot() {
    timeout(TEST_TIMEOUT, async {
        let port = start_server(DeckQueue::builtin()).await;

        let (mut ws, _resp) = connect_async(format!("ws://127.0.0.1:{port}/ws"))
            .await
            .expect("WS connect failed");

        let msg = ws.next().await.unwrap().unwrap();
        let json = parse_ws_json(&msg);

        assert_eq!(json["type"], "snapshot");
        assert_eq!(json["snapshot"]["state"], "in_progress");
        assert_eq!(json["snapshot"]["filter"], "all");
        assert_eq!(json["snapshot"]["deck"].as_array().unwrap().len(), 6);
        assert_eq!(json["snapshot"]["current"]["id"], "1");
        assert_eq!(json["snapshot"]["counts"]["features"], 4);
        assert_eq!(json["snapshot"]["counts"]["bugs"], 2);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn ws_swipe_broadcasts_decision() {
    timeout(TEST_TIMEOUT, async {
        let port = start_server(small_queue()).await;

        let (mut ws, _) = connect_async(format!("ws://127.0.0.1:{port}/ws"))
            .await
            .unwrap();
        let _ = ws.next().await.unwrap().unwrap();

        send_action(
            &mut ws,
            &DeckAction::Swipe {
                direction: SwipeDirection::Right,
            },
        )
        .await;

        let json = parse_ws_json(&ws.next().await.unwrap().unwrap());
        assert_eq!(json["type"], "decided");
        assert_eq!(json["card_id"], "f1");
        assert_eq!(json["decision"], "backlog");
        assert_eq!(json["backlog"], 1);
        assert_eq!(json["archive"], 0);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn ws_last_swipe_emits_completed() {
    timeout(TEST_TIMEOUT, async {
        let queue = small_queue();
        let port = start_server(Arc::clone(&queue)).await;

        let (mut ws, _) = connect_async(format!("ws://127.0.0.1:{port}/ws"))
            .await
            .unwrap();
        let _ = ws.next().await.unwrap().unwrap();

        send_action(&mut ws, &DeckAction::SetFilter { filter: Filter::Bug }).await;
        let json = parse_ws_json(&ws.next().await.unwrap().unwrap());
        assert_eq!(json["type"], "filter_changed");
        assert_eq!(json["filter"], "bug");

        send_action(
            &mut ws,
            &DeckAction::Swipe {
                direction: SwipeDirection::Left,
            },
        )
        .await;

        let decided = parse_ws_json(&ws.next().await.unwrap().unwrap());
        assert_eq!(decided["type"], "decided");
        assert_eq!(decided["card_id"], "b1");
        assert_eq!(decided["decision"], "archive");

        let completed = parse_ws_json(&ws.next().await.unwrap().unwrap());
        assert_eq!(completed["type"], "completed");
        assert_eq!(completed["filter"], "bug");

        // The feature card is still in the store, just not visible.
        assert_eq!(queue.snapshot().await.counts.features, 1);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn ws_favorite_toggle_does_not_decide() {
    timeout(TEST_TIMEOUT, async {
        let queue = small_queue();
        let port = start_server(Arc::clone(&queue)).await;

        let (mut ws, _) = connect_async(format!("ws://127.0.0.1:{port}/ws"))
            .await
            .unwrap();
        let _ = ws.next().await.unwrap().unwrap();

        send_action(
            &mut ws,
            &DeckAction::ToggleFavorite {
                card_id: "f1".into(),
            },
        )
        .await;

        let json = parse_ws_json(&ws.next().await.unwrap().unwrap());
        assert_eq!(json["type"], "favorite_toggled");
        assert_eq!(json["card_id"], "f1");
        assert_eq!(json["favorite"], true);

        let snapshot = queue.snapshot().await;
        assert_eq!(snapshot.counts.remaining, 2);
        assert_eq!(snapshot.current.unwrap().id, "f1");
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn ws_unknown_message_is_ignored() {
    timeout(TEST_TIMEOUT, async {
        let queue = small_queue();
        let port = start_server(Arc::clone(&queue)).await;

        let (mut ws, _) = connect_async(format!("ws://127.0.0.1:{port}/ws"))
            .await
            .unwrap();
        let _ = ws.next().await.unwrap().unwrap();

        ws.send(Message::Text(r#"{"action": "shuffle"}"#.into()))
            .await
            .unwrap();
        send_action(&mut ws, &DeckAction::Reset).await;

        // The garbage frame produced nothing; the next event is the reset.
        let json = parse_ws_json(&ws.next().await.unwrap().unwrap());
        assert_eq!(json["type"], "reset");
        assert_eq!(json["generation"], 1);
    })
    .await
    .expect("test timed out");
}

// ── REST Tests ───────────────────────────────────────────────────────

#[tokio::test]
async fn rest_health() {
    timeout(TEST_TIMEOUT, async {
        let port = start_server(small_queue()).await;

        let resp = reqwest::get(format!("http://127.0.0.1:{port}/health"))
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let json: Value = resp.json().await.unwrap();
        assert_eq!(json["status"], "ok");
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn rest_full_triage_and_review() {
    timeout(TEST_TIMEOUT, async {
        let port = start_server(small_queue()).await;
        let client = reqwest::Client::new();
        let base = format!("http://127.0.0.1:{port}");

        // Not complete yet.
        let resp = client
            .post(format!("{base}/api/deck/finish"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 409);

        for direction in ["right", "left"] {
            let resp = client
                .post(format!("{base}/api/deck/swipe"))
                .json(&serde_json::json!({"direction": direction}))
                .send()
                .await
                .unwrap();
            assert_eq!(resp.status(), 200);
        }

        // Extra swipe on an empty deck is a no-op.
        let json: Value = client
            .post(format!("{base}/api/deck/swipe"))
            .json(&serde_json::json!({"direction": "right"}))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(json["status"], "noop");

        let deck: Value = reqwest::get(format!("{base}/api/deck"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(deck["state"], "complete");

        let resp = client
            .post(format!("{base}/api/deck/finish"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let handoff: Value = resp.json().await.unwrap();
        assert_eq!(handoff["backlog"], 1);
        assert_eq!(handoff["archive"], 1);

        let collections: Value = reqwest::get(format!("{base}/api/collections"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(collections["backlog"][0]["id"], "f1");
        assert_eq!(collections["archive"][0]["id"], "b1");
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn rest_import_prepends_and_rejects_collisions() {
    timeout(TEST_TIMEOUT, async {
        let port = start_server(small_queue()).await;
        let client = reqwest::Client::new();
        let base = format!("http://127.0.0.1:{port}");

        let resp = client
            .post(format!("{base}/api/import"))
            .json(&serde_json::json!([
                {"id": "s1", "type": "bug", "title": "Export fails", "summary": "CSV export 500s"}
            ]))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 201);
        let json: Value = resp.json().await.unwrap();
        assert_eq!(json["accepted"], 1);

        let deck: Value = reqwest::get(format!("{base}/api/deck"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(deck["current"]["id"], "s1");

        // Colliding id: whole batch rejected under the default policy.
        let resp = client
            .post(format!("{base}/api/import"))
            .json(&serde_json::json!([
                {"id": "s2", "kind": "feature", "title": "New", "summary": "new"},
                {"id": "f1", "kind": "feature", "title": "Dup", "summary": "dup"}
            ]))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 409);

        let deck: Value = reqwest::get(format!("{base}/api/deck"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(deck["deck"].as_array().unwrap().len(), 3);

        // Unknown kind never reaches the store.
        let resp = client
            .post(format!("{base}/api/import"))
            .json(&serde_json::json!([
                {"id": "s3", "kind": "praise", "title": "Nice", "summary": "nice"}
            ]))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 422);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn rest_slack_import_unconfigured() {
    timeout(TEST_TIMEOUT, async {
        let port = start_server(small_queue()).await;

        let resp = reqwest::Client::new()
            .post(format!("http://127.0.0.1:{port}/api/import/slack"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 503);
    })
    .await
    .expect("test timed out");
}
