//! WebSocket server + REST endpoints for the triage deck.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{
        Path, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    body::Bytes,
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
};
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::model::{DeckAction, DeckEvent, FeedbackCard, Filter, SwipeDirection};
use super::queue::DeckQueue;
use super::store::CollisionPolicy;
use crate::collections::Collection;
use crate::error::{self, ImportError, SourceError};
use crate::import::FeedbackSource;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub queue: Arc<DeckQueue>,
    /// External source for `/api/import/slack` (None if not configured).
    pub source: Option<Arc<dyn FeedbackSource>>,
}

/// Build the Axum router with deck WebSocket and REST routes.
pub fn deck_routes(queue: Arc<DeckQueue>, source: Option<Arc<dyn FeedbackSource>>) -> Router {
    let state = AppState { queue, source };

    Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(health))
        .route("/api/deck", get(get_deck))
        .route("/api/deck/swipe", post(swipe))
        .route("/api/deck/filter", post(set_filter))
        .route("/api/deck/favorites/{id}", post(toggle_favorite))
        .route("/api/deck/reset", post(reset))
        .route("/api/deck/finish", post(finish_review))
        .route("/api/collections", get(list_collections))
        .route("/api/collections/{collection}/{id}", delete(remove_from_collection))
        .route("/api/import", post(import_cards))
        .route("/api/import/slack", post(import_from_source))
        .with_state(state)
}

// ── Health ──────────────────────────────────────────────────────────────

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "signal-deck"
    }))
}

// ── WebSocket ───────────────────────────────────────────────────────────

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    info!("WebSocket client connecting");
    ws.on_upgrade(|socket| handle_socket(socket, state.queue))
}

async fn send_snapshot(socket: &mut WebSocket, queue: &DeckQueue) -> bool {
    let sync = DeckEvent::Snapshot {
        snapshot: queue.snapshot().await,
    };
    match serde_json::to_string(&sync) {
        Ok(json) => socket.send(Message::Text(json.into())).await.is_ok(),
        Err(_) => true,
    }
}

async fn handle_socket(mut socket: WebSocket, queue: Arc<DeckQueue>) {
    info!("WebSocket client connected");

    // Subscribe before the snapshot so no event falls between the two
    let mut rx = queue.subscribe();

    if !send_snapshot(&mut socket, &queue).await {
        warn!("Failed to send initial snapshot, client disconnected");
        return;
    }

    loop {
        tokio::select! {
            result = rx.recv() => {
                match result {
                    Ok(event) => {
                        if let Ok(json) = serde_json::to_string(&event) {
                            if socket.send(Message::Text(json.into())).await.is_err() {
                                debug!("Client disconnected during send");
                                break;
                            }
                        }
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                        warn!(missed = n, "WS client lagged behind broadcast");
                        if !send_snapshot(&mut socket, &queue).await {
                            break;
                        }
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => {
                        debug!("Broadcast channel closed");
                        break;
                    }
                }
            }

            result = socket.recv() => {
                match result {
                    Some(Ok(Message::Text(text))) => {
                        handle_client_message(&text, &queue).await;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        info!("WebSocket client disconnected");
                        break;
                    }
                    Some(Err(e)) => {
                        warn!(error = %e, "WebSocket error");
                        break;
                    }
                    _ => {}
                }
            }
        }
    }

    info!("WebSocket connection closed");
}

async fn handle_client_message(text: &str, queue: &DeckQueue) {
    match serde_json::from_str::<DeckAction>(text) {
        Ok(action) => match action {
            DeckAction::Swipe { direction } => match queue.swipe(direction).await {
                Some(t) => {
                    info!(card_id = %t.card_id, decision = %t.decision, "Card triaged via WS")
                }
                None => debug!("Swipe via WS ignored, deck is empty"),
            },
            DeckAction::SetFilter { filter } => {
                queue.set_filter(filter).await;
            }
            DeckAction::ToggleFavorite { card_id } => {
                queue.toggle_favorite(&card_id).await;
            }
            DeckAction::Reset => {
                queue.reset().await;
            }
            DeckAction::FinishReview { argumentation } => {
                if queue.finish_review(argumentation).await.is_none() {
                    debug!("Finish review via WS ignored, deck not complete");
                }
            }
        },
        Err(e) => {
            debug!(error = %e, text = text, "Unrecognized WS message from client");
        }
    }
}

// ── REST Endpoints ──────────────────────────────────────────────────────

async fn get_deck(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.queue.snapshot().await)
}

#[derive(Deserialize)]
struct SwipeRequest {
    direction: SwipeDirection,
}

async fn swipe(
    State(state): State<AppState>,
    Json(body): Json<SwipeRequest>,
) -> impl IntoResponse {
    match state.queue.swipe(body.direction).await {
        Some(triaged) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "card_id": triaged.card_id,
                "decision": triaged.decision,
                "completed": triaged.completed,
            })),
        ),
        // Not an error: rapid repeated input on an empty deck
        None => (
            StatusCode::OK,
            Json(serde_json::json!({"status": "noop", "reason": "deck is empty"})),
        ),
    }
}

#[derive(Deserialize)]
struct FilterRequest {
    filter: Filter,
}

async fn set_filter(
    State(state): State<AppState>,
    Json(body): Json<FilterRequest>,
) -> impl IntoResponse {
    let deck_state = state.queue.set_filter(body.filter).await;
    Json(serde_json::json!({"filter": body.filter, "state": deck_state}))
}

async fn toggle_favorite(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let favorite = state.queue.toggle_favorite(&id).await;
    Json(serde_json::json!({"card_id": id, "favorite": favorite}))
}

async fn reset(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.queue.reset().await)
}

#[derive(Deserialize, Default)]
struct FinishRequest {
    #[serde(default)]
    argumentation: Option<String>,
}

/// The body is optional: an empty POST finishes without argumentation.
async fn finish_review(State(state): State<AppState>, body: Bytes) -> impl IntoResponse {
    let request = if body.is_empty() {
        FinishRequest::default()
    } else {
        match serde_json::from_slice::<FinishRequest>(&body) {
            Ok(request) => request,
            Err(e) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(serde_json::json!({"error": e.to_string()})),
                );
            }
        }
    };

    match state.queue.finish_review(request.argumentation).await {
        Some(handoff) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "review_id": handoff.review_id,
                "backlog": handoff.backlog,
                "archive": handoff.archive,
                "argumentation": handoff.argumentation,
            })),
        ),
        None => (
            StatusCode::CONFLICT,
            Json(serde_json::json!({"error": "Deck is not complete"})),
        ),
    }
}

async fn list_collections(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.queue.collections().await)
}

async fn remove_from_collection(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, String)>,
) -> impl IntoResponse {
    let collection = match collection.parse::<Collection>() {
        Ok(c) => c,
        Err(e) => {
            return (StatusCode::BAD_REQUEST, Json(serde_json::json!({"error": e})));
        }
    };

    match state.queue.remove_from_collection(collection, &id).await {
        Some(card) => (StatusCode::OK, Json(serde_json::json!(card))),
        None => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"error": "Card not found in collection"})),
        ),
    }
}

async fn import_cards(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> error::Result<(StatusCode, Json<serde_json::Value>)> {
    // Parsed by hand so unknown kinds surface as ImportError::Malformed
    let batch: Vec<FeedbackCard> = serde_json::from_value(body).map_err(|e| {
        let err = ImportError::Malformed(e.to_string());
        warn!(error = %err, "Import rejected");
        err
    })?;

    let report = state.queue.import(batch).await?;
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "accepted": report.accepted,
            "skipped": report.skipped,
        })),
    ))
}

async fn import_from_source(
    State(state): State<AppState>,
) -> error::Result<(StatusCode, Json<serde_json::Value>)> {
    let source = state.source.clone().ok_or_else(|| SourceError::NotConfigured {
        name: "slack".into(),
        reason: "set SLACK_TOKEN and SLACK_CHANNEL_ID".into(),
    })?;

    let cards = source.fetch().await.map_err(|e| {
        tracing::error!(source = source.name(), error = %e, "Source import failed");
        e
    })?;

    // Each pull returns the channel's recent history, so ids seen in an
    // earlier pull are skipped rather than failing the batch.
    let report = state
        .queue
        .import_with(cards, CollisionPolicy::Skip)
        .await
        .map_err(SourceError::from)?;

    info!(
        source = source.name(),
        accepted = report.accepted,
        skipped = report.skipped.len(),
        "Source import complete"
    );
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "source": source.name(),
            "accepted": report.accepted,
            "skipped": report.skipped,
        })),
    ))
}
