//! Service configuration
//!
//! Settings are layered: built-in defaults, then an optional `flaskr.toml`
//! next to the working directory, then environment variables named `FLASKR_`
//! followed by the key path with `__` between nested keys
//! (e.g. `FLASKR_SESSION__SECRET_KEY`).

use common::database::DatabaseConfig;
use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;

/// Secret used when none is configured; only suitable for development
pub const DEFAULT_SECRET_KEY: &str = "dev";

/// Default settings file, looked up relative to the working directory
pub const SETTINGS_FILE: &str = "flaskr.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    /// Socket address the HTTP server binds to
    pub bind: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite connection URL
    pub url: String,
    /// Maximum number of pooled connections
    pub max_connections: u32,
}

impl DatabaseSettings {
    pub fn to_config(&self) -> DatabaseConfig {
        DatabaseConfig::new(self.url.clone(), self.max_connections)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionSettings {
    /// Key for the session cookie signature
    pub secret_key: String,
    pub cookie_name: String,
    /// Only send the cookie over HTTPS
    pub secure: bool,
    /// Idle time after which a session expires. `None` keeps the session
    /// for as long as the browser does.
    pub max_age_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthSettings {
    /// Report unknown usernames and wrong passwords with the same message
    pub generic_login_errors: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub session: SessionSettings,
    pub auth: AuthSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerSettings {
                bind: "127.0.0.1:5000".into(),
            },
            database: DatabaseSettings {
                url: "sqlite://instance/flaskr.sqlite".into(),
                max_connections: 5,
            },
            session: SessionSettings {
                secret_key: DEFAULT_SECRET_KEY.into(),
                cookie_name: "session".into(),
                secure: false,
                max_age_secs: None,
            },
            auth: AuthSettings {
                generic_login_errors: false,
            },
        }
    }
}

impl Settings {
    /// Load settings from the given file (if present) and the environment
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let defaults = Settings::default();

        let config = Config::builder()
            .set_default("server.bind", defaults.server.bind)?
            .set_default("database.url", defaults.database.url)?
            .set_default(
                "database.max_connections",
                i64::from(defaults.database.max_connections),
            )?
            .set_default("session.secret_key", defaults.session.secret_key)?
            .set_default("session.cookie_name", defaults.session.cookie_name)?
            .set_default("session.secure", defaults.session.secure)?
            .set_default("auth.generic_login_errors", defaults.auth.generic_login_errors)?
            .add_source(File::with_name(path).format(FileFormat::Toml).required(false))
            .add_source(
                Environment::with_prefix("FLASKR")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Whether the session secret is still the development default
    pub fn uses_default_secret(&self) -> bool {
        self.session.secret_key == DEFAULT_SECRET_KEY
    }
}
