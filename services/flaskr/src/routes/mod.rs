//! HTTP routes for the Flaskr service

pub mod auth;
pub mod blog;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::{Value, json};
use tower_sessions::Session;
use tracing::error;

use crate::{
    AppState,
    error::AppResult,
    middleware::{identity_middleware, login_required},
    session::{session_layer, take_flashes},
};

/// Create the router for the Flaskr service
pub fn create_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/create", get(blog::create_form).post(blog::create))
        .route("/:id/update", get(blog::update_form).post(blog::update))
        .route("/:id/delete", post(blog::delete))
        .route_layer(middleware::from_fn(login_required));

    Router::new()
        .route("/health", get(health_check))
        .route("/", get(blog::index))
        .route("/auth/register", get(auth::register_form).post(auth::register))
        .route("/auth/login", get(auth::login_form).post(auth::login))
        .route("/auth/logout", get(auth::logout))
        .merge(protected_routes)
        .layer(middleware::from_fn_with_state(state.clone(), identity_middleware))
        .layer(session_layer(state.session_store.clone(), &state.session_settings))
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    match common::database::health_check(&state.db_pool).await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "service": "flaskr"
            })),
        ),
        Err(e) => {
            error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "unavailable",
                    "service": "flaskr"
                })),
            )
        }
    }
}

/// Render a view as JSON, draining pending flash messages into it
///
/// `context` must be a JSON object; its fields are added next to `view`,
/// `user` and `messages`.
pub(crate) async fn render(
    view: &str,
    status: StatusCode,
    session: &Session,
    user: Option<&str>,
    context: Value,
) -> AppResult<Response> {
    let messages = take_flashes(session).await?;

    let mut body = json!({
        "view": view,
        "user": user,
        "messages": messages,
    });
    if let (Value::Object(fields), Value::Object(extra)) = (&mut body, context) {
        fields.extend(extra);
    }

    Ok((status, Json(body)).into_response())
}
