use crate::derive::PlayerMetric;

#[derive(Clone)]
pub struct Config {
    pub api_base: String,
    pub refresh_secs: u64,
    pub http_timeout_secs: u64,
    pub token_path: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub player_metric: PlayerMetric,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            api_base: std::env::var("API_BASE").unwrap_or_else(|_| "http://localhost:8000".to_string()),
            refresh_secs: std::env::var("REFRESH_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(30),
            http_timeout_secs: std::env::var("HTTP_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(10),
            token_path: std::env::var("TOKEN_PATH").unwrap_or_else(|_| "./memdash.token".to_string()),
            username: std::env::var("ADMIN_USER").ok(),
            password: std::env::var("ADMIN_PASS").ok(),
            player_metric: std::env::var("PLAYER_METRIC")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(PlayerMetric::GamesPlayed),
        }
    }

    pub fn credentials(&self) -> Option<(String, String)> {
        match (&self.username, &self.password) {
            (Some(u), Some(p)) => Some((u.clone(), p.clone())),
            _ => None,
        }
    }
}
