// file: src/server/mod.rs
// description: http query server over the document store and answer cache
// reference: https://docs.rs/axum

pub mod error;
pub mod handlers;
pub mod stats;

use crate::cache::AnswerPublisher;
use crate::error::{NewsError, Result};
use crate::store::DocumentStore;
use axum::{
    Router,
    extract::{Request, State},
    middleware::{self, Next},
    response::Response,
    routing::{get, put},
};
use std::future::Future;
use std::sync::Arc;
use stats::RequestStats;
use tokio::net::TcpListener;
use tracing::{info, warn};

pub use error::AppError;
pub use handlers::{HealthResponse, ThreadsQuery, parse_max_age};

#[derive(Clone)]
pub struct AppState {
    pub store: DocumentStore,
    pub answers: Arc<AnswerPublisher>,
    pub stats: Arc<RequestStats>,
}

impl AppState {
    pub fn new(store: DocumentStore, answers: Arc<AnswerPublisher>) -> Self {
        Self {
            store,
            answers,
            stats: Arc::new(RequestStats::new()),
        }
    }
}

/// Sweeps expired documents, then counts the request.
async fn track_request(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if let Err(e) = state.store.expire_outdated().await {
        warn!("Expiry sweep before request failed: {}", e);
    }

    let guard = state.stats.begin();
    let response = next.run(request).await;
    let status = response.status();
    guard.finish(status.is_success() || status.is_redirection());
    response
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/threads", get(handlers::get_threads))
        .route("/health", get(handlers::health))
        .route(
            "/{name}",
            put(handlers::put_document).delete(handlers::delete_document),
        )
        .layer(middleware::from_fn_with_state(state.clone(), track_request))
        .with_state(state)
}

/// Serves until `shutdown` resolves.
pub async fn run_server<F>(bind: &str, state: AppState, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(bind).await?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(NewsError::Io)?;

    info!("Server stopped");
    Ok(())
}
