//! Session endpoints.
//!
//! The session identifier travels in the configured cookie (or header, when
//! enabled). Endpoints that mint or rotate an identifier answer with a
//! `Set-Cookie` header carrying it.

use std::collections::HashMap;

use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header::SET_COOKIE},
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::cookie::{expired_cookie, session_cookie};
use crate::error::{Result, ServerError};
use crate::state::AppState;

// ─────────────────────────────────────────────────────────────────────────────
// Types
// ─────────────────────────────────────────────────────────────────────────────

/// Response carrying a (new) session identifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionIdResponse {
    /// Session ID.
    pub id: String,
}

/// Full session contents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    /// Session ID.
    pub id: String,
    /// Stored values.
    pub data: HashMap<String, serde_json::Value>,
}

/// Response for the session count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountResponse {
    /// Number of registered sessions.
    pub count: usize,
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/session - Start a new session.
pub async fn create_session_handler(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let id = Uuid::new_v4().to_string();
    state.registry().create(&id)?;
    let cookie = session_cookie(&state.registry().config().cookie, &id)?;

    Ok((
        StatusCode::CREATED,
        [(SET_COOKIE, cookie)],
        Json(SessionIdResponse { id }),
    ))
}

/// GET /api/v1/session - Get the caller's session.
pub async fn get_session_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<SessionResponse>> {
    let session = state.registry().read(&headers)?;

    Ok(Json(SessionResponse {
        id: session.id(),
        data: session.snapshot(),
    }))
}

/// DELETE /api/v1/session - End the caller's session.
pub async fn delete_session_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse> {
    let id = state.registry().extract_id(&headers)?;
    state.registry().destroy(&id)?;
    let cookie = expired_cookie(&state.registry().config().cookie)?;

    Ok((StatusCode::NO_CONTENT, [(SET_COOKIE, cookie)]))
}

/// POST /api/v1/session/refresh - Rotate the caller's session id.
///
/// Without an identifier on the request this establishes a new session.
pub async fn refresh_session_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse> {
    let old_id = match state.registry().extract_id(&headers) {
        Ok(id) => Some(id),
        Err(satchel_session::Error::IdentifierNotFound) => None,
        Err(e) => return Err(e.into()),
    };

    let new_id = Uuid::new_v4().to_string();
    state
        .registry()
        .refresh(old_id.as_deref().unwrap_or_default(), &new_id)?;
    debug!(old_id = ?old_id, new_id = %new_id, "Session refreshed");
    let cookie = session_cookie(&state.registry().config().cookie, &new_id)?;

    Ok(([(SET_COOKIE, cookie)], Json(SessionIdResponse { id: new_id })))
}

/// GET /api/v1/session/values/{key} - Read one value.
pub async fn get_value_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(key): Path<String>,
) -> Result<Json<serde_json::Value>> {
    let session = state.registry().read(&headers)?;
    session
        .get(&key)
        .map(Json)
        .ok_or_else(|| ServerError::NotFound(format!("Key '{}' not set", key)))
}

/// PUT /api/v1/session/values/{key} - Store one value.
///
/// Registers the session if the identifier is not known yet.
pub async fn put_value_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(key): Path<String>,
    Json(value): Json<serde_json::Value>,
) -> Result<StatusCode> {
    let session = state.registry().read_or_create(&headers)?;
    session.set(key, value);
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/session/values/{key} - Remove one value.
pub async fn delete_value_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(key): Path<String>,
) -> Result<StatusCode> {
    let session = state.registry().read(&headers)?;
    session.delete(&key);
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/sessions/count - Number of registered sessions.
pub async fn count_handler(State(state): State<AppState>) -> Json<CountResponse> {
    Json(CountResponse {
        count: state.registry().count(),
    })
}
