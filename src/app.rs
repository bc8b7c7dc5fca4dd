use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use crate::auth::AuthGateway;
use crate::backend::Backend;
use crate::config::Config;
use crate::derive::{self, Dashboard, PlayerMetric};
use crate::error::ApiError;
use crate::gateway::DataGateway;
use crate::guard::SessionGuard;
use crate::logging::{log, obj, v_num, v_str, Domain, Level};
use crate::refresh::{RefreshScheduler, SchedulerState};
use crate::session::SessionStore;

/// Wires the session store, gateways, scheduler, and guard into the refresh
/// pipeline, and publishes each derived dashboard for the rendering
/// collaborator.
pub struct DashboardApp {
    metric: PlayerMetric,
    creds: Option<(String, String)>,
    store: Arc<SessionStore>,
    auth: AuthGateway,
    gateway: Arc<DataGateway>,
    scheduler: RefreshScheduler,
    guard: Arc<SessionGuard>,
    notice_rx: watch::Receiver<Option<String>>,
    dashboard_tx: watch::Sender<Option<Dashboard>>,
}

impl DashboardApp {
    pub fn new(cfg: &Config, backend: Arc<dyn Backend>) -> Self {
        let store = Arc::new(SessionStore::open(&cfg.token_path));
        let auth = AuthGateway::new(backend.clone(), store.clone());
        let gateway = Arc::new(DataGateway::new(backend));
        let scheduler = RefreshScheduler::new(Duration::from_secs(cfg.refresh_secs));
        let (guard, notice_rx) = SessionGuard::new(store.clone(), scheduler.handle());
        let (dashboard_tx, _) = watch::channel(None);
        Self {
            metric: cfg.player_metric,
            creds: cfg.credentials(),
            store,
            auth,
            gateway,
            scheduler,
            guard: Arc::new(guard),
            notice_rx,
            dashboard_tx,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.store.is_authenticated()
    }

    /// Resumes a persisted session when one exists; otherwise logs in with
    /// the configured credentials.
    pub async fn ensure_login(&self) -> Result<(), ApiError> {
        if self.store.is_authenticated() {
            log(
                Level::Info,
                Domain::Auth,
                "session_resumed",
                obj(&[("msg", v_str("reusing persisted token"))]),
            );
            return Ok(());
        }
        match &self.creds {
            Some((username, password)) => self.auth.login(username, password).await,
            None => Err(ApiError::EmptyCredentials),
        }
    }

    /// Starts the refresh cadence: one fetch immediately, then one per period.
    pub fn start(&mut self) {
        let gateway = self.gateway.clone();
        let store = self.store.clone();
        let guard = self.guard.clone();
        let publisher = self.dashboard_tx.clone();
        let metric = self.metric;
        self.scheduler.start(move || {
            let gateway = gateway.clone();
            let store = store.clone();
            let guard = guard.clone();
            let publisher = publisher.clone();
            async move {
                refresh_once(gateway, store, guard, publisher, metric).await;
            }
        });
    }

    pub fn stop(&mut self) {
        self.scheduler.stop();
    }

    pub fn state(&self) -> SchedulerState {
        self.scheduler.state()
    }

    /// Latest derived dashboard; `None` until the first successful refresh.
    pub fn subscribe(&self) -> watch::Receiver<Option<Dashboard>> {
        self.dashboard_tx.subscribe()
    }

    /// User-visible session notices (currently only "session expired").
    pub fn notices(&self) -> watch::Receiver<Option<String>> {
        self.notice_rx.clone()
    }
}

async fn refresh_once(
    gateway: Arc<DataGateway>,
    store: Arc<SessionStore>,
    guard: Arc<SessionGuard>,
    publisher: watch::Sender<Option<Dashboard>>,
    metric: PlayerMetric,
) {
    let Some(token) = store.get() else {
        log(
            Level::Debug,
            Domain::Fetch,
            "tick_skipped",
            obj(&[("msg", v_str("no session token"))]),
        );
        return;
    };

    match gateway.fetch_all(&token).await {
        Ok(snapshot) => {
            let dashboard = derive::derive(&snapshot, metric);
            log(
                Level::Info,
                Domain::Derive,
                "dashboard_update",
                obj(&[
                    ("players", v_num(dashboard.per_player.series.labels.len() as f64)),
                    ("days", v_num(dashboard.per_day.series.labels.len() as f64)),
                    (
                        "dashboard",
                        serde_json::to_value(&dashboard).unwrap_or(serde_json::Value::Null),
                    ),
                ]),
            );
            publisher.send_replace(Some(dashboard));
        }
        Err(err) => {
            guard.on_fetch_failure(&err, &token);
        }
    }
}
