//! Authentication endpoints.
//!
//! The handlers acknowledge the request without acting on it; the session
//! protocol behind them is not built yet.

use axum::extract::OriginalUri;
use axum::routing::post;
use axum::{Json, Router};

use crate::api::AppState;

pub const ENDPOINTS: [&str; 7] = [
    "/login",
    "/register",
    "/logout",
    "/refresh",
    "/forgot-password",
    "/reset-password",
    "/verify-email",
];

pub fn router() -> Router<AppState> {
    ENDPOINTS
        .iter()
        .fold(Router::new(), |router, path| router.route(path, post(acknowledge)))
}

async fn acknowledge(OriginalUri(uri): OriginalUri) -> Json<serde_json::Value> {
    tracing::debug!(path = %uri.path(), "Auth stub called");
    Json(serde_json::json!({"status": "OK"}))
}
