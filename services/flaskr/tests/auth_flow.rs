//! Registration, login, logout and session handling over HTTP

mod support;

use axum::http::StatusCode;
use flaskr::settings::Settings;
use support::TestApp;

#[tokio::test]
async fn test_health_check() {
    let mut app = TestApp::new().await;
    let response = app.get("/health").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json["status"], "ok");
}

#[tokio::test]
async fn test_register_page_renders_for_anonymous_client() {
    let mut app = TestApp::new().await;
    let response = app.get("/auth/register").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json["view"], "auth/register");
    assert_eq!(response.user(), None);
    assert!(response.messages().is_empty());
}

#[tokio::test]
async fn test_register_redirects_to_login_without_session() {
    let mut app = TestApp::new().await;
    let response = app.register("alice", "secret1").await;

    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location.as_deref(), Some("/auth/login"));
    assert!(app.cookie.is_none());

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM user WHERE username = ?")
        .bind("alice")
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_register_validation_errors_are_flashed_once() {
    let mut app = TestApp::new().await;

    let response = app.register("", "secret1").await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json["view"], "auth/register");
    assert_eq!(response.messages(), vec!["Username is required."]);

    let response = app.register("alice", "").await;
    assert_eq!(response.messages(), vec!["Password is required."]);

    let response = app.get("/auth/register").await;
    assert!(response.messages().is_empty());
}

#[tokio::test]
async fn test_duplicate_registration_is_a_conflict() {
    let mut app = TestApp::new().await;
    app.register("alice", "secret1").await;

    let response = app.register("alice", "secret2").await;
    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(response.messages(), vec!["User alice is already registered."]);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM user WHERE username = ?")
        .bind("alice")
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_login_sets_session_and_identity() {
    let mut app = TestApp::new().await;
    app.register("alice", "secret1").await;

    let response = app.login("alice", "secret1").await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location.as_deref(), Some("/"));
    assert!(app.cookie.is_some());

    let response = app.get("/").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.user(), Some("alice"));
}

#[tokio::test]
async fn test_wrong_password_is_rejected() {
    let mut app = TestApp::new().await;
    app.register("alice", "secret1").await;

    let response = app.login("alice", "wrong").await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.json["view"], "auth/login");
    assert_eq!(response.messages(), vec!["Incorrect password."]);

    assert_eq!(app.get("/").await.user(), None);
}

#[tokio::test]
async fn test_unknown_username_is_rejected() {
    let mut app = TestApp::new().await;

    let response = app.login("nobody", "secret1").await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.messages(), vec!["Incorrect username."]);
}

#[tokio::test]
async fn test_generic_login_errors() {
    let mut settings = Settings::default();
    settings.auth.generic_login_errors = true;
    let mut app = TestApp::with_settings(settings).await;
    app.register("alice", "secret1").await;

    let unknown = app.login("nobody", "secret1").await;
    let wrong = app.login("alice", "wrong").await;

    assert_eq!(unknown.messages(), vec!["Incorrect username or password."]);
    assert_eq!(wrong.messages(), unknown.messages());
}

#[tokio::test]
async fn test_logout_clears_session() {
    let mut app = TestApp::new().await;
    app.register("alice", "secret1").await;
    app.login("alice", "secret1").await;

    let response = app.get("/auth/logout").await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location.as_deref(), Some("/"));
    assert!(app.cookie.is_none());

    assert_eq!(app.get("/").await.user(), None);
}

#[tokio::test]
async fn test_logout_when_anonymous_still_redirects() {
    let mut app = TestApp::new().await;

    let response = app.get("/auth/logout").await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location.as_deref(), Some("/"));
}

#[tokio::test]
async fn test_session_for_deleted_user_is_anonymous() {
    let mut app = TestApp::new().await;
    app.register("alice", "secret1").await;
    app.login("alice", "secret1").await;

    sqlx::query("DELETE FROM user WHERE username = ?")
        .bind("alice")
        .execute(&app.pool)
        .await
        .unwrap();

    let response = app.get("/").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.user(), None);
}

#[tokio::test]
async fn test_tampered_cookie_is_anonymous() {
    let mut app = TestApp::new().await;
    app.register("alice", "secret1").await;
    app.login("alice", "secret1").await;

    let cookie = app.cookie.clone().unwrap();
    let replacement = if cookie.starts_with('A') { "B" } else { "A" };
    app.cookie = Some(format!("{replacement}{}", &cookie[1..]));

    let response = app.get("/").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.user(), None);

    app.cookie = Some(cookie);
    assert_eq!(app.get("/").await.user(), Some("alice"));
}

#[tokio::test]
async fn test_cookie_signed_with_another_secret_is_rejected() {
    let mut app = TestApp::new().await;
    app.register("alice", "secret1").await;
    app.login("alice", "secret1").await;

    let mut other_settings = Settings::default();
    other_settings.session.secret_key = "another-secret".into();
    let mut other = TestApp::with_pool(app.pool.clone(), other_settings);
    other.cookie = app.cookie.clone();
    assert_eq!(other.get("/").await.user(), None);

    let mut same = TestApp::with_pool(app.pool.clone(), Settings::default());
    same.cookie = app.cookie.clone();
    assert_eq!(same.get("/").await.user(), Some("alice"));
}

#[tokio::test]
async fn test_session_cookie_attributes() {
    let mut settings = Settings::default();
    settings.session.max_age_secs = Some(3600);
    let mut app = TestApp::with_settings(settings).await;
    app.register("alice", "secret1").await;

    let response = app.login("alice", "secret1").await;
    let set_cookie = response.set_cookie.unwrap();
    assert!(set_cookie.starts_with("session="));
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("SameSite=Lax"));
    assert!(set_cookie.contains("Path=/"));
    assert!(set_cookie.contains("Max-Age=3600"));
    assert!(!set_cookie.contains("Secure"));
}

#[tokio::test]
async fn test_oversized_max_age_keeps_users_logged_in() {
    let mut settings = Settings::default();
    settings.session.max_age_secs = Some(u64::MAX);
    let mut app = TestApp::with_settings(settings).await;
    app.register("alice", "secret1").await;

    let response = app.login("alice", "secret1").await;
    assert!(!response.set_cookie.unwrap().contains("Max-Age"));
    assert_eq!(app.get("/").await.user(), Some("alice"));
}
