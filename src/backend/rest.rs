use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use url::Url;

use crate::backend::{Backend, LoginResponse};
use crate::config::Config;
use crate::error::ApiError;

struct Endpoints {
    login: Url,
    aggregate: Url,
    players: Url,
    dates: Url,
    scores: Url,
    top_scores: Url,
}

impl Endpoints {
    fn resolve(base: &str) -> Result<Self> {
        let base = Url::parse(base)?;
        Ok(Self {
            login: base.join("/memory/login")?,
            aggregate: base.join("/admin/aggregate")?,
            players: base.join("/admin/players")?,
            dates: base.join("/admin/dates")?,
            scores: base.join("/memory/scores")?,
            top_scores: base.join("/memory/top-scores")?,
        })
    }
}

/// Live REST backend. Three reads carry the bearer token, two are public.
pub struct RestBackend {
    client: Client,
    endpoints: Endpoints,
}

impl RestBackend {
    pub fn new(cfg: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(cfg.http_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            endpoints: Endpoints::resolve(&cfg.api_base)?,
        })
    }

    async fn get_json(&self, url: &Url, token: Option<&str>) -> Result<Value, ApiError> {
        let mut req = self.client.get(url.clone());
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ApiError::from_read_status(status.as_u16(), url.path()));
        }
        Ok(resp.json().await?)
    }
}

#[async_trait]
impl Backend for RestBackend {
    async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let resp = self
            .client
            .post(self.endpoints.login.clone())
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ApiError::from_login_status(status.as_u16()));
        }
        Ok(resp.json().await?)
    }

    async fn aggregate(&self, token: &str) -> Result<Value, ApiError> {
        self.get_json(&self.endpoints.aggregate, Some(token)).await
    }

    async fn players(&self, token: &str) -> Result<Value, ApiError> {
        self.get_json(&self.endpoints.players, Some(token)).await
    }

    async fn games_by_date(&self, token: &str) -> Result<Value, ApiError> {
        self.get_json(&self.endpoints.dates, Some(token)).await
    }

    async fn scores(&self) -> Result<Value, ApiError> {
        self.get_json(&self.endpoints.scores, None).await
    }

    async fn top_scores(&self) -> Result<Value, ApiError> {
        self.get_json(&self.endpoints.top_scores, None).await
    }
}
