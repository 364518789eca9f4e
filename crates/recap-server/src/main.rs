mod config;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Json, Router,
    http::StatusCode,
    middleware,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use recap_api::middleware::require_auth;
use recap_api::state::{AppState, AppStateInner};
use recap_api::{auth, chats, messages, summarize};
use recap_summarizer::SummarizerClient;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "recap=debug,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;

    // Init database
    let db = recap_db::Database::open(&config.db_path)?;

    let summarizer = SummarizerClient::new(&config.summarizer_url, config.summarizer_timeout)?;

    // Shared state
    let state: AppState = Arc::new(AppStateInner {
        db,
        jwt_secret: config.jwt_secret.clone(),
        summarizer,
    });

    let app = router(state).layer(CorsLayer::permissive()).layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Recap server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/api/auth/signup", post(auth::signup))
        .route("/api/auth/login", post(auth::login))
        .with_state(state.clone());

    let me_route = Router::new()
        .route("/api/auth/me", get(auth::me))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .with_state(state.clone());

    let chat_routes = Router::new()
        .route("/api/chat/create", post(chats::create_chat))
        .route("/api/chat/user/{user_id}", get(chats::list_chats))
        .route(
            "/api/chat/{chat_id}/messages",
            get(messages::get_messages).post(messages::send_message),
        )
        .route(
            "/api/chat/{chat_id}",
            axum::routing::put(chats::rename_chat).delete(chats::delete_chat),
        )
        .with_state(state.clone());

    let summarize_route = Router::new()
        .route("/api/summarize", post(summarize::summarize))
        .with_state(state);

    Router::new()
        .route("/", get(root))
        .merge(auth_routes)
        .merge(me_route)
        .merge(chat_routes)
        .merge(summarize_route)
        .fallback(not_found)
}

async fn root() -> &'static str {
    "Recap API is running"
}

async fn not_found() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({ "error": true, "message": "Route not found" })),
    )
}
