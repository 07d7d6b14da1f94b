//! # REST API for Sessions
//!
//! Sign-in hands over the user id issued by the external auth provider;
//! credentials never reach this server.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use shared::{SessionRequest, SessionResponse};
use tracing::{info, warn};

use super::errors::error_response;
use crate::backend::domain::{BudgetError, SyncSnapshot};
use crate::backend::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_session).post(sign_in).delete(sign_out))
        .route("/activity", post(record_activity))
}

pub fn session_response(snapshot: &SyncSnapshot) -> SessionResponse {
    SessionResponse {
        status: snapshot.status,
        user_id: snapshot.user_id.clone(),
        expense_count: snapshot.expenses.len(),
        last_error: snapshot.last_error.clone(),
    }
}

async fn get_session(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /api/session");
    Json(session_response(&state.synchronizer.snapshot()))
}

/// Sign in or switch user; responds once the user's data has loaded
async fn sign_in(
    State(state): State<AppState>,
    Json(request): Json<SessionRequest>,
) -> impl IntoResponse {
    info!("POST /api/session");
    let user_id = request.user_id.trim().to_string();
    if user_id.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "user_id must not be empty");
    }
    state.inactivity.record_activity();

    match state.synchronizer.sign_in(user_id).await {
        Ok(()) => Json(session_response(&state.synchronizer.snapshot())).into_response(),
        // Signed in, but the data could not be fetched; the snapshot carries the error
        Err(e @ BudgetError::RemoteRead(_)) => {
            warn!("Signed in with empty data: {}", e);
            Json(session_response(&state.synchronizer.snapshot())).into_response()
        }
        Err(e) => e.into_response(),
    }
}

async fn sign_out(State(state): State<AppState>) -> impl IntoResponse {
    info!("DELETE /api/session");
    state.synchronizer.sign_out();
    Json(session_response(&state.synchronizer.snapshot()))
}

async fn record_activity(State(state): State<AppState>) -> impl IntoResponse {
    info!("POST /api/session/activity");
    state.inactivity.record_activity();
    StatusCode::NO_CONTENT
}
