//! Blog views: post list, create, update and delete

use axum::{
    Extension, Form,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde_json::json;
use tower_sessions::Session;

use super::render;
use crate::{
    AppState,
    error::{AppError, AppResult},
    gate::{Destination, Identity},
    middleware::CurrentUser,
    models::{Post, PostForm, User},
    session::flash,
};

const TITLE_REQUIRED: &str = "Title is required.";

/// List all posts, newest first
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    Extension(identity): Extension<Identity>,
) -> AppResult<Response> {
    let posts = state.post_repository.list().await?;

    render(
        "blog/index",
        StatusCode::OK,
        &session,
        identity.username(),
        json!({ "posts": posts }),
    )
    .await
}

pub async fn create_form(
    session: Session,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> AppResult<Response> {
    render(
        "blog/create",
        StatusCode::OK,
        &session,
        Some(user.username.as_str()),
        json!({}),
    )
    .await
}

pub async fn create(
    State(state): State<AppState>,
    session: Session,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Form(form): Form<PostForm>,
) -> AppResult<Response> {
    if form.title.is_empty() {
        flash(&session, TITLE_REQUIRED).await?;
        return render(
            "blog/create",
            StatusCode::BAD_REQUEST,
            &session,
            Some(user.username.as_str()),
            json!({}),
        )
        .await;
    }

    state
        .post_repository
        .create(user.id, &form.title, &form.body)
        .await?;

    Ok(Redirect::to(Destination::Index.path()).into_response())
}

pub async fn update_form(
    State(state): State<AppState>,
    session: Session,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<Response> {
    let post = get_post(&state, id, &user).await?;

    render(
        "blog/update",
        StatusCode::OK,
        &session,
        Some(user.username.as_str()),
        json!({ "post": post }),
    )
    .await
}

pub async fn update(
    State(state): State<AppState>,
    session: Session,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Form(form): Form<PostForm>,
) -> AppResult<Response> {
    let post = get_post(&state, id, &user).await?;

    if form.title.is_empty() {
        flash(&session, TITLE_REQUIRED).await?;
        return render(
            "blog/update",
            StatusCode::BAD_REQUEST,
            &session,
            Some(user.username.as_str()),
            json!({ "post": post }),
        )
        .await;
    }

    state
        .post_repository
        .update(id, &form.title, &form.body)
        .await?;

    Ok(Redirect::to(Destination::Index.path()).into_response())
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<Redirect> {
    get_post(&state, id, &user).await?;
    state.post_repository.delete(id).await?;

    Ok(Redirect::to(Destination::Index.path()))
}

/// Fetch a post that the user is allowed to modify
async fn get_post(state: &AppState, id: i64, user: &User) -> AppResult<Post> {
    let post = state
        .post_repository
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Post id {id} doesn't exist.")))?;

    if post.author_id != user.id {
        return Err(AppError::Forbidden);
    }

    Ok(post)
}
