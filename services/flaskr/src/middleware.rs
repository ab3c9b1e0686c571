//! Request middleware: identity loading and access gating

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::{
    AppState,
    error::AppError,
    gate::{self, Gated, Identity},
    models::User,
};

/// The logged-in user, available to handlers behind [`login_required`]
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Resolve the session's user once per request and attach it as [`Identity`]
pub async fn identity_middleware(
    State(state): State<AppState>,
    session: Session,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let identity = state.auth_gate.load_identity(&session).await?;
    req.extensions_mut().insert(identity);

    Ok(next.run(req).await)
}

/// Route layer that sends anonymous clients to the login view
pub async fn login_required(mut req: Request<Body>, next: Next) -> Response {
    let identity = req
        .extensions()
        .get::<Identity>()
        .cloned()
        .unwrap_or_default();

    if let Some(user) = identity.user() {
        req.extensions_mut().insert(CurrentUser(user.clone()));
    }

    match gate::login_required(&identity, || next.run(req)).await {
        Gated::Allowed(response) => response,
        Gated::Redirect(destination) => Redirect::to(destination.path()).into_response(),
    }
}
