//! In-process client for driving the router with a cookie jar of one

#![allow(dead_code)]

use ::common::database::DatabaseConfig;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use flaskr::{AppState, create_router, open_database, settings::Settings};
use serde_json::Value;
use sqlx::SqlitePool;
use tower::ServiceExt;

pub struct TestResponse {
    pub status: StatusCode,
    pub location: Option<String>,
    /// The raw session `Set-Cookie` header, if one was sent
    pub set_cookie: Option<String>,
    pub json: Value,
}

impl TestResponse {
    pub fn user(&self) -> Option<&str> {
        self.json["user"].as_str()
    }

    pub fn messages(&self) -> Vec<String> {
        self.json["messages"]
            .as_array()
            .map(|messages| {
                messages
                    .iter()
                    .filter_map(|m| m.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }
}

pub struct TestApp {
    router: Router,
    pub pool: SqlitePool,
    cookie_name: String,
    pub cookie: Option<String>,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_settings(Settings::default()).await
    }

    pub async fn with_settings(settings: Settings) -> Self {
        let pool = open_database(&DatabaseConfig::in_memory()).await.unwrap();
        Self::with_pool(pool, settings)
    }

    /// A second app over the same database, e.g. with other settings
    pub fn with_pool(pool: SqlitePool, settings: Settings) -> Self {
        let router = create_router(AppState::new(pool.clone(), &settings));

        Self {
            router,
            pool,
            cookie_name: settings.session.cookie_name,
            cookie: None,
        }
    }

    pub async fn get(&mut self, uri: &str) -> TestResponse {
        let request = self.request("GET", uri).body(Body::empty()).unwrap();
        self.send(request).await
    }

    /// POST an url-encoded form; values must not need escaping
    pub async fn post_form(&mut self, uri: &str, fields: &[(&str, &str)]) -> TestResponse {
        let body = fields
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join("&");

        let request = self
            .request("POST", uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }

    pub async fn register(&mut self, username: &str, password: &str) -> TestResponse {
        self.post_form(
            "/auth/register",
            &[("username", username), ("password", password)],
        )
        .await
    }

    pub async fn login(&mut self, username: &str, password: &str) -> TestResponse {
        self.post_form(
            "/auth/login",
            &[("username", username), ("password", password)],
        )
        .await
    }

    fn request(&self, method: &str, uri: &str) -> axum::http::request::Builder {
        let builder = Request::builder().method(method).uri(uri);
        match &self.cookie {
            Some(value) => {
                builder.header(header::COOKIE, format!("{}={}", self.cookie_name, value))
            }
            None => builder,
        }
    }

    async fn send(&mut self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();

        let mut session_cookie = None;
        for set_cookie in response.headers().get_all(header::SET_COOKIE) {
            let set_cookie = set_cookie.to_str().unwrap();
            let pair = set_cookie.split(';').next().unwrap_or_default();
            if let Some((name, value)) = pair.split_once('=') {
                if name.trim() == self.cookie_name {
                    self.cookie = (!value.is_empty()).then(|| value.to_string());
                    session_cookie = Some(set_cookie.to_string());
                }
            }
        }

        let status = response.status();
        let location = response
            .headers()
            .get(header::LOCATION)
            .map(|value| value.to_str().unwrap().to_string());
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        TestResponse {
            status,
            location,
            set_cookie: session_cookie,
            json,
        }
    }
}
