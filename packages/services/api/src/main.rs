//! Adminkit API
//!
//! 대시보드용 인가 엔드포인트(`/api/authorize`)와 역할/정책 관리 엔드포인트를 제공합니다.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    middleware::from_fn,
    routing::{delete, get, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod db;
mod error;
mod handlers;
mod middleware;
mod state;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 환경변수 로드
    dotenvy::dotenv().ok();

    // 로깅 초기화
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "akt_api=debug,akt_core=debug,tower_http=debug".into()
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 설정 로드
    let config = Config::from_env()?;
    tracing::info!(
        port = config.port,
        database_url = %config.database_url,
        bootstrap = config.bootstrap_token.is_some(),
        "Starting API"
    );

    // 앱 상태 초기화
    let state = AppState::new(&config).await?;
    let state = Arc::new(state);

    // 라우터 구성
    let app = create_router(state);

    // 서버 시작
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("API listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// 라우터 생성
fn create_router(state: Arc<AppState>) -> Router {
    let router = Router::new()
        // Authorization
        .route("/api/authorize", post(handlers::authorize::authorize))
        .route(
            "/api/authorize/batch",
            post(handlers::authorize::authorize_batch),
        )
        // Admin
        .route("/api/roles", get(handlers::roles::list_roles))
        .route(
            "/api/policies",
            get(handlers::policies::list_policies).post(handlers::policies::create_policy),
        )
        .route("/api/policies/{id}", delete(handlers::policies::delete_policy))
        // Health check
        .route("/health", get(handlers::health::health_check))
        // Middleware
        .layer(TraceLayer::new_for_http());

    let router = if state.config.cors_permissive {
        router.layer(CorsLayer::permissive())
    } else {
        router
    };

    router
        .layer(from_fn(middleware::request_id))
        // State
        .with_state(state)
}
