//! Biography Roster Service — Discord bot that keeps member biographies in a
//! Notion database and renders them as a roster.
//!
//! Also hosts a small status API.
//! Default: http://127.0.0.1:3000/rpc/status

mod cache;
mod config;
mod discord;
mod error;
mod roster;
mod routes;
mod store;
mod sync;

use config::Config;
use routes::AppState;
use std::sync::Arc;
use std::time::Instant;
use store::NotionClient;
use sync::SyncEngine;
use tokio::sync::oneshot;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    env_logger::init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let store = Arc::new(NotionClient::new(&config.notion).expect("Failed to build HTTP client"));
    let mut engine = SyncEngine::new(store, config.policy.max_length);
    if let Some(target) = config.discord.mirror {
        let http = Arc::new(serenity::all::Http::new(&config.discord.token));
        engine = engine.with_mirror(Arc::new(discord::mirror::DiscordMirror::new(http, target)));
    }
    let engine = Arc::new(engine);
    engine.initialize().await;

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let discord_task = tokio::spawn(discord::start_discord_listener(
        config.discord.clone(),
        engine.clone(),
        config.policy.clone(),
        config.roster_page_size,
        shutdown_rx,
    ));

    let state = Arc::new(AppState {
        engine,
        start_time: Instant::now(),
    });
    let app = routes::router(state);

    let addr = format!("127.0.0.1:{}", config.port);
    log::info!("Biography Roster Service listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            log::info!("Shutting down");
        })
        .await
        .expect("Server error");

    let _ = shutdown_tx.send(());
    match discord_task.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => log::error!("Discord listener exited with error: {}", e),
        Err(e) => log::error!("Discord listener task panicked: {}", e),
    }
}
