pub mod auth;
pub mod health;

use crate::config::Environment;
use crate::error::{AppError, ErrorDetail, INTERNAL_ERROR_MESSAGE};
use axum::body::Body;
use axum::extract::Request;
use axum::http::{header, StatusCode, Uri};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::{routing::get, Json, Router};
use sqlx::sqlite::SqlitePool;
use std::any::Any;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any as AnyOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub environment: Environment,
}

impl AppState {
    pub fn new(pool: SqlitePool, environment: Environment) -> Self {
        Self { pool, environment }
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AnyOrigin)
        .allow_methods(AnyOrigin)
        .allow_headers(AnyOrigin);

    let api = Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .nest("/auth", auth::router());

    let mut router = Router::new().nest("/api", api).fallback(not_found);

    if !state.environment.is_production() {
        router = router.layer(middleware::from_fn(expose_error_details));
    }

    router
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(panic_handler as fn(_) -> _))
        .layer(cors)
        .with_state(state)
}

async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("No route for {}", uri.path()))
}

/// Copy the detail of a 5xx error into the response body.
///
/// Only installed outside production.
async fn expose_error_details(request: Request, next: Next) -> Response {
    let response = next.run(request).await;
    let Some(ErrorDetail(detail)) = response.extensions().get::<ErrorDetail>().cloned() else {
        return response;
    };

    let (mut parts, _) = response.into_parts();
    parts.headers.remove(header::CONTENT_LENGTH);
    let body = serde_json::json!({
        "error": INTERNAL_ERROR_MESSAGE,
        "message": detail,
    });
    Response::from_parts(parts, Body::from(body.to_string()))
}

fn panic_handler(_err: Box<dyn Any + Send>) -> Response {
    tracing::error!("Handler panicked");
    let body = serde_json::json!({ "error": INTERNAL_ERROR_MESSAGE });
    (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
}
