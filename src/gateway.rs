use std::sync::Arc;

use crate::backend::{Backend, Snapshot};
use crate::error::ApiError;
use crate::logging::{log, obj, v_str, Domain, Level};

/// Fan-out/fan-in wrapper over the five read endpoints.
pub struct DataGateway {
    backend: Arc<dyn Backend>,
}

impl DataGateway {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    /// Issues all five reads concurrently and joins them.
    ///
    /// The snapshot exists only when every call succeeds; a single failure
    /// fails the joint operation with the first error encountered, so no
    /// partial chart update can ever be derived from a partial fetch.
    pub async fn fetch_all(&self, token: &str) -> Result<Snapshot, ApiError> {
        let result = tokio::try_join!(
            self.backend.aggregate(token),
            self.backend.players(token),
            self.backend.games_by_date(token),
            self.backend.scores(),
            self.backend.top_scores(),
        );
        match result {
            Ok((aggregate, players, dates, scores, top_scores)) => Ok(Snapshot {
                aggregate,
                players,
                dates,
                scores,
                top_scores,
            }),
            Err(err) => {
                log(
                    Level::Debug,
                    Domain::Fetch,
                    "joint_fetch_failed",
                    obj(&[("error", v_str(&err.to_string()))]),
                );
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::LoginResponse;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Scripted backend: every read succeeds unless its failure flag is set.
    struct ScriptedBackend {
        fail_players: AtomicBool,
        unauthorized: AtomicBool,
    }

    impl ScriptedBackend {
        fn healthy() -> Self {
            Self {
                fail_players: AtomicBool::new(false),
                unauthorized: AtomicBool::new(false),
            }
        }
    }

    #[async_trait]
    impl Backend for ScriptedBackend {
        async fn login(&self, _username: &str, _password: &str) -> Result<LoginResponse, ApiError> {
            Ok(LoginResponse { token: Some("t".to_string()) })
        }

        async fn aggregate(&self, _token: &str) -> Result<Value, ApiError> {
            if self.unauthorized.load(Ordering::SeqCst) {
                return Err(ApiError::Unauthorized);
            }
            Ok(json!({ "totalGames": 8, "totalPlayers": 4 }))
        }

        async fn players(&self, _token: &str) -> Result<Value, ApiError> {
            if self.fail_players.load(Ordering::SeqCst) {
                return Err(ApiError::Transient { status: Some(503), reason: "players down".into() });
            }
            Ok(json!([{ "username": "a" }]))
        }

        async fn games_by_date(&self, _token: &str) -> Result<Value, ApiError> {
            Ok(json!([{ "date": "2026-08-01", "count": 2 }]))
        }

        async fn scores(&self) -> Result<Value, ApiError> {
            Ok(json!([{ "username": "a", "averageScore": 10.0 }]))
        }

        async fn top_scores(&self) -> Result<Value, ApiError> {
            Ok(json!([]))
        }
    }

    #[tokio::test]
    async fn test_fetch_all_joins_five_payloads() {
        let gateway = DataGateway::new(Arc::new(ScriptedBackend::healthy()));
        let snapshot = gateway.fetch_all("token").await.unwrap();
        assert_eq!(snapshot.aggregate["totalGames"], 8);
        assert_eq!(snapshot.players[0]["username"], "a");
        assert_eq!(snapshot.dates[0]["count"], 2);
        assert_eq!(snapshot.scores[0]["averageScore"], 10.0);
        assert!(snapshot.top_scores.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_single_failure_fails_the_joint_fetch() {
        let backend = ScriptedBackend::healthy();
        backend.fail_players.store(true, Ordering::SeqCst);
        let gateway = DataGateway::new(Arc::new(backend));

        let err = gateway.fetch_all("token").await.unwrap_err();
        assert!(matches!(err, ApiError::Transient { status: Some(503), .. }));
    }

    #[tokio::test]
    async fn test_unauthorized_read_surfaces_as_auth_failure() {
        let backend = ScriptedBackend::healthy();
        backend.unauthorized.store(true, Ordering::SeqCst);
        let gateway = DataGateway::new(Arc::new(backend));

        let err = gateway.fetch_all("token").await.unwrap_err();
        assert!(err.is_auth_failure());
    }
}
