use std::sync::Arc;
use tokio::sync::watch;

use crate::error::ApiError;
use crate::logging::{log, log_session_expired, obj, v_str, Domain, Level};
use crate::refresh::SchedulerHandle;
use crate::session::SessionStore;

pub const SESSION_EXPIRED_MSG: &str = "Your session has expired. Please login again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureOutcome {
    /// Token invalidated, scheduler halted, re-authentication required.
    SessionExpired,
    /// Transient failure swallowed; the last rendered charts stay on screen.
    KeptStale,
    /// A 401 from a request made with a token that is no longer current.
    StaleAuthIgnored,
}

/// Inspects joint-fetch failures and decides whether the session survives.
pub struct SessionGuard {
    store: Arc<SessionStore>,
    scheduler: SchedulerHandle,
    notice: watch::Sender<Option<String>>,
}

impl SessionGuard {
    pub fn new(
        store: Arc<SessionStore>,
        scheduler: SchedulerHandle,
    ) -> (Self, watch::Receiver<Option<String>>) {
        let (notice, notice_rx) = watch::channel(None);
        (
            Self {
                store,
                scheduler,
                notice,
            },
            notice_rx,
        )
    }

    /// `tick_token` is the token the failing fetch was made with. A 401 is
    /// only trusted while that token is still the current session token;
    /// otherwise a login that completed mid-flight would be torn down by a
    /// stale rejection.
    pub fn on_fetch_failure(&self, err: &ApiError, tick_token: &str) -> FailureOutcome {
        if !err.is_auth_failure() {
            log(
                Level::Warn,
                Domain::Fetch,
                "refresh_failed",
                obj(&[
                    ("error", v_str(&err.to_string())),
                    ("msg", v_str("keeping previously rendered charts")),
                ]),
            );
            return FailureOutcome::KeptStale;
        }

        if self.store.get().as_deref() != Some(tick_token) {
            log(
                Level::Warn,
                Domain::Session,
                "stale_auth_failure_ignored",
                obj(&[("msg", v_str("401 carried a token that is no longer current"))]),
            );
            return FailureOutcome::StaleAuthIgnored;
        }

        if let Err(clear_err) = self.store.clear() {
            log(
                Level::Error,
                Domain::Session,
                "token_cleanup_failed",
                obj(&[("error", v_str(&clear_err.to_string()))]),
            );
        }
        self.notice.send_replace(Some(SESSION_EXPIRED_MSG.to_string()));
        self.scheduler.stop();
        log_session_expired();
        FailureOutcome::SessionExpired
    }
}
