use std::sync::Arc;

use crate::backend::Backend;
use crate::error::ApiError;
use crate::logging::{log, obj, v_str, Domain, Level};
use crate::session::SessionStore;

/// Exchanges credentials for a bearer token and persists it.
pub struct AuthGateway {
    backend: Arc<dyn Backend>,
    store: Arc<SessionStore>,
}

impl AuthGateway {
    pub fn new(backend: Arc<dyn Backend>, store: Arc<SessionStore>) -> Self {
        Self { backend, store }
    }

    /// Empty credentials are rejected locally; no network call is made.
    /// The session is mutated on success only.
    pub async fn login(&self, username: &str, password: &str) -> Result<(), ApiError> {
        if username.is_empty() || password.is_empty() {
            return Err(ApiError::EmptyCredentials);
        }

        let resp = self.backend.login(username, password).await?;
        match resp.token {
            Some(token) => {
                self.store.set(&token).map_err(|err| ApiError::Transient {
                    status: None,
                    reason: format!("failed to persist token: {}", err),
                })?;
                log(
                    Level::Info,
                    Domain::Auth,
                    "login_ok",
                    obj(&[("username", v_str(username))]),
                );
            }
            None => {
                // The backend answered 2xx without a token; subsequent
                // protected reads will fail and route through the guard.
                log(
                    Level::Warn,
                    Domain::Auth,
                    "login_without_token",
                    obj(&[("username", v_str(username))]),
                );
            }
        }
        Ok(())
    }

    pub fn logout(&self) {
        if let Err(err) = self.store.clear() {
            log(
                Level::Warn,
                Domain::Session,
                "logout_cleanup_failed",
                obj(&[("error", v_str(&err.to_string()))]),
            );
        }
    }
}
