use thiserror::Error;

/// Failure classification for every backend interaction.
///
/// Only `Unauthorized` invalidates the session; everything else leaves the
/// token and the previously rendered charts untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// Rejected locally before any network call is made.
    #[error("username and password are required")]
    EmptyCredentials,
    /// 401 on the login endpoint.
    #[error("invalid username or password")]
    InvalidCredentials,
    /// 401 on a bearer-protected read.
    #[error("bearer token rejected by the backend")]
    Unauthorized,
    /// Connect/timeout failures, non-401 statuses, undecodable bodies.
    #[error("backend request failed: {reason}")]
    Transient { status: Option<u16>, reason: String },
}

impl ApiError {
    pub fn from_login_status(status: u16) -> Self {
        if status == 401 {
            ApiError::InvalidCredentials
        } else {
            ApiError::Transient {
                status: Some(status),
                reason: format!("login returned status {}", status),
            }
        }
    }

    pub fn from_read_status(status: u16, endpoint: &str) -> Self {
        if status == 401 {
            ApiError::Unauthorized
        } else {
            ApiError::Transient {
                status: Some(status),
                reason: format!("{} returned status {}", endpoint, status),
            }
        }
    }

    pub fn is_auth_failure(&self) -> bool {
        matches!(self, ApiError::Unauthorized)
    }

    /// The message shown to the operator, matching the login form wording.
    pub fn user_message(&self) -> &'static str {
        match self {
            ApiError::EmptyCredentials => "Please enter both username and password",
            ApiError::InvalidCredentials => "Invalid username or password",
            ApiError::Unauthorized => "Your session has expired. Please login again.",
            ApiError::Transient { .. } => "An error occurred during login. Please try again.",
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Transient {
            status: err.status().map(|s| s.as_u16()),
            reason: err.to_string(),
        }
    }
}
