//! Authentication gate
//!
//! Registration, login, logout, per-request identity loading and access
//! gating. The credential store and the session are always passed in
//! explicitly; nothing here reads ambient request state.

use std::future::Future;
use tower_sessions::{Session, session};
use tracing::{error, info, warn};

use crate::{
    error::AuthError,
    models::{Credentials, User},
    password::{hash_password, verify_password},
    repositories::UserRepository,
    session::{set_user_id, user_id},
};

/// The acting user for one request
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Identity {
    #[default]
    Anonymous,
    User(User),
}

impl Identity {
    pub fn user(&self) -> Option<&User> {
        match self {
            Identity::User(user) => Some(user),
            Identity::Anonymous => None,
        }
    }

    pub fn is_anonymous(&self) -> bool {
        matches!(self, Identity::Anonymous)
    }

    pub fn username(&self) -> Option<&str> {
        self.user().map(|user| user.username.as_str())
    }
}

/// Named redirect targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    Login,
    Index,
}

impl Destination {
    pub fn path(self) -> &'static str {
        match self {
            Destination::Login => "/auth/login",
            Destination::Index => "/",
        }
    }
}

/// Outcome of a gated operation
#[derive(Debug, PartialEq)]
pub enum Gated<T> {
    /// The operation ran and produced this output
    Allowed(T),
    /// The operation did not run; send the client here instead
    Redirect(Destination),
}

/// Run `view` only for a logged-in identity
///
/// An anonymous identity short-circuits to a redirect to the login view and
/// `view` is never called.
pub async fn login_required<F, Fut, T>(identity: &Identity, view: F) -> Gated<T>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = T>,
{
    if identity.is_anonymous() {
        return Gated::Redirect(Destination::Login);
    }

    Gated::Allowed(view().await)
}

/// Clear the whole session and drop its record. Safe to call when nobody is
/// logged in.
pub async fn logout(session: &Session) -> Result<(), session::Error> {
    session.flush().await
}

/// Registration, login and identity loading against a credential store
#[derive(Clone)]
pub struct AuthGate {
    users: UserRepository,
    generic_login_errors: bool,
}

impl AuthGate {
    /// Create a gate that reports unknown usernames and wrong passwords
    /// with distinct messages
    pub fn new(users: UserRepository) -> Self {
        Self {
            users,
            generic_login_errors: false,
        }
    }

    /// Report both login failures as "Incorrect username or password."
    pub fn with_generic_login_errors(mut self, generic: bool) -> Self {
        self.generic_login_errors = generic;
        self
    }

    pub fn users(&self) -> &UserRepository {
        &self.users
    }

    /// Register a new user and return its id
    ///
    /// Validation stops at the first failure. No session is created; the
    /// caller sends the client to the login view.
    pub async fn register(&self, credentials: &Credentials) -> Result<i64, AuthError> {
        let Credentials { username, password } = credentials;

        if username.is_empty() {
            return Err(AuthError::UsernameRequired);
        }
        if password.is_empty() {
            return Err(AuthError::PasswordRequired);
        }

        let password_hash =
            hash_password(password).map_err(|e| AuthError::Hashing(e.to_string()))?;

        match self.users.insert(username, &password_hash).await {
            Ok(id) => {
                info!("Registered user {} with id {}", username, id);
                Ok(id)
            }
            Err(e) if e.is_unique_violation() => {
                warn!("Registration rejected, username taken: {}", username);
                Err(AuthError::AlreadyRegistered(username.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Check credentials and start a fresh session for the user
    ///
    /// On success the session gets a new id and is cleared before `user_id`
    /// is written, so neither the old id nor anything stored under it
    /// survives a login.
    pub async fn login(
        &self,
        session: &Session,
        credentials: &Credentials,
    ) -> Result<User, AuthError> {
        info!("Login attempt for user: {}", credentials.username);

        let Some(user) = self.users.find_by_username(&credentials.username).await? else {
            warn!("Login failed, unknown user: {}", credentials.username);
            return Err(self.credential_error(AuthError::IncorrectUsername));
        };

        let verified =
            verify_password(&user.password_hash, &credentials.password).map_err(|e| {
                error!("Unusable password hash for user {}: {}", user.username, e);
                AuthError::Hashing(e.to_string())
            })?;
        if !verified {
            warn!("Login failed, wrong password for user: {}", user.username);
            return Err(self.credential_error(AuthError::IncorrectPassword));
        }

        session.cycle_id().await?;
        session.clear().await;
        set_user_id(session, user.id).await?;

        info!("User {} logged in", user.username);
        Ok(user)
    }

    /// Resolve the session's `user_id` to a user
    ///
    /// A missing id, or one that no longer matches a row, is anonymous.
    pub async fn load_identity(&self, session: &Session) -> Result<Identity, AuthError> {
        let Some(id) = user_id(session).await? else {
            return Ok(Identity::Anonymous);
        };

        Ok(self
            .users
            .find_by_id(id)
            .await?
            .map_or(Identity::Anonymous, Identity::User))
    }

    fn credential_error(&self, err: AuthError) -> AuthError {
        if self.generic_login_errors {
            AuthError::InvalidCredentials
        } else {
            err
        }
    }
}
