use std::sync::Arc;

use signal_deck::cli;
use signal_deck::config::DeckConfig;
use signal_deck::deck::{CardStore, DeckQueue, deck_routes};
use signal_deck::import::{FeedbackSource, SlackSource};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = DeckConfig::from_env()?;

    eprintln!("🗂️  Signal Deck v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Deck WS: ws://0.0.0.0:{}/ws", config.port);
    eprintln!("   Deck API: http://0.0.0.0:{}/api/deck", config.port);
    eprintln!("   Import policy: {}", config.collision_policy);

    let queue = DeckQueue::new(
        CardStore::builtin(),
        config.engine_options(),
        config.collision_policy,
    );

    // ── Slack import (optional) ─────────────────────────────────────────
    let source: Option<Arc<dyn FeedbackSource>> = match config.slack.clone() {
        Some(slack) => {
            eprintln!("   Slack import: enabled (channel {})", slack.channel_id);
            Some(Arc::new(SlackSource::new(slack)))
        }
        None => {
            eprintln!("   Slack import: disabled (set SLACK_TOKEN and SLACK_CHANNEL_ID)");
            None
        }
    };

    // ── HTTP / WebSocket server ─────────────────────────────────────────
    let app = deck_routes(Arc::clone(&queue), source)
        .layer(tower_http::cors::CorsLayer::permissive());

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "Deck server listening");

    let server = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!("Deck server error: {}", e);
        }
    });

    if config.cli {
        eprintln!("   Type 'help' for commands. 'quit' to exit.\n");
        let exit = cli::run(queue).await;
        if exit.stops_server() {
            server.abort();
            return Ok(());
        }
        tracing::info!("stdin closed, REPL stopped; deck server keeps running");
    } else {
        eprintln!();
    }
    server.await?;

    Ok(())
}
