use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::error::ApiError;

pub mod rest;

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub token: Option<String>,
}

/// Typed view of one player record; extra backend fields are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct PlayerRecord {
    pub username: String,
}

/// One score record per finished game; usernames repeat across games.
#[derive(Debug, Clone, Deserialize)]
pub struct ScoreRecord {
    pub username: String,
    #[serde(rename = "averageScore")]
    pub average_score: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DateCount {
    pub date: String,
    pub count: i64,
}

/// One refresh cycle's worth of backend payloads.
///
/// Bodies stay loosely typed: a shape problem in one payload degrades that
/// series alone in the deriver instead of failing the joint fetch.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub aggregate: Value,
    pub players: Value,
    pub dates: Value,
    pub scores: Value,
    pub top_scores: Value,
}

/// The five read endpoints plus login, behind a seam so tests can script
/// responses without a live backend.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, ApiError>;
    async fn aggregate(&self, token: &str) -> Result<Value, ApiError>;
    async fn players(&self, token: &str) -> Result<Value, ApiError>;
    async fn games_by_date(&self, token: &str) -> Result<Value, ApiError>;
    async fn scores(&self) -> Result<Value, ApiError>;
    async fn top_scores(&self) -> Result<Value, ApiError>;
}
