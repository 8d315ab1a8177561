// file: src/server/handlers.rs
// description: request handlers for document writes and thread queries

use crate::models::ThreadsResponse;
use crate::server::AppState;
use crate::server::error::AppError;
use axum::{
    Json,
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header},
};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Deserialize)]
pub struct ThreadsQuery {
    pub period: u64,
    pub lang_code: String,
    pub category: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub generation: u64,
}

/// Extracts `N` from a `max-age=N` directive.
pub fn parse_max_age(cache_control: &str) -> Option<u64> {
    cache_control.split(',').find_map(|directive| {
        let (key, value) = directive.trim().split_once('=')?;
        if key.trim().eq_ignore_ascii_case("max-age") {
            value.trim().trim_matches('"').parse().ok()
        } else {
            None
        }
    })
}

fn is_html(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case("text/html"))
}

fn header_str<'a>(headers: &'a HeaderMap, name: header::HeaderName) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

pub async fn put_document(
    State(state): State<AppState>,
    Path(name): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, AppError> {
    if !header_str(&headers, header::CONTENT_TYPE).is_some_and(is_html) {
        return Err(AppError::bad_request("Content-Type must be text/html"));
    }

    let ttl = header_str(&headers, header::CACHE_CONTROL)
        .and_then(parse_max_age)
        .ok_or_else(|| AppError::bad_request("Cache-Control must carry max-age=N"))?;

    let content = String::from_utf8_lossy(&body).into_owned();
    let is_update = state.store.put(&name, content, ttl).await?;
    debug!("PUT {} (ttl {}s, update: {})", name, ttl, is_update);

    Ok(if is_update {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::CREATED
    })
}

pub async fn delete_document(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<StatusCode, AppError> {
    if state.store.delete(&name).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found(format!("no document named {}", name)))
    }
}

pub async fn get_threads(
    State(state): State<AppState>,
    Query(query): Query<ThreadsQuery>,
) -> Result<Json<ThreadsResponse>, AppError> {
    let cache = state.answers.load();
    let threads = cache.get_answer(&query.lang_code, &query.category, query.period)?;
    Ok(Json(ThreadsResponse::from(threads)))
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        generation: state.answers.load().generation(),
    })
}
