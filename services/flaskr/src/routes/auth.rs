//! Register, login and logout views

use axum::{
    Extension, Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde_json::json;
use tower_sessions::Session;

use super::render;
use crate::{
    AppState,
    error::{AppResult, AuthError, AuthErrorKind},
    gate::{self, Destination, Identity},
    models::Credentials,
    session::flash,
};

const REGISTER_VIEW: &str = "auth/register";
const LOGIN_VIEW: &str = "auth/login";

pub async fn register_form(
    session: Session,
    Extension(identity): Extension<Identity>,
) -> AppResult<Response> {
    render(REGISTER_VIEW, StatusCode::OK, &session, identity.username(), json!({})).await
}

/// Create the account, then send the client to the login view
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Extension(identity): Extension<Identity>,
    Form(form): Form<Credentials>,
) -> AppResult<Response> {
    match state.auth_gate.register(&form).await {
        Ok(_) => Ok(Redirect::to(Destination::Login.path()).into_response()),
        Err(e) => form_error(REGISTER_VIEW, e, &session, &identity).await,
    }
}

pub async fn login_form(
    session: Session,
    Extension(identity): Extension<Identity>,
) -> AppResult<Response> {
    render(LOGIN_VIEW, StatusCode::OK, &session, identity.username(), json!({})).await
}

/// Check the credentials and start a new session
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Extension(identity): Extension<Identity>,
    Form(form): Form<Credentials>,
) -> AppResult<Response> {
    match state.auth_gate.login(&session, &form).await {
        Ok(_) => Ok(Redirect::to(Destination::Index.path()).into_response()),
        Err(e) => form_error(LOGIN_VIEW, e, &session, &identity).await,
    }
}

pub async fn logout(session: Session) -> AppResult<Redirect> {
    gate::logout(&session).await?;
    Ok(Redirect::to(Destination::Index.path()))
}

/// Flash a recoverable error and render the form again; anything else fails
/// the request
async fn form_error(
    view: &str,
    err: AuthError,
    session: &Session,
    identity: &Identity,
) -> AppResult<Response> {
    if err.kind() == AuthErrorKind::Internal {
        return Err(err.into());
    }

    flash(session, err.to_string()).await?;
    render(view, err.status(), session, identity.username(), json!({})).await
}
