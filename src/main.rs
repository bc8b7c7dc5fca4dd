use anyhow::{bail, Result};
use std::sync::Arc;

use memdash::app::DashboardApp;
use memdash::backend::rest::RestBackend;
use memdash::config::Config;
use memdash::error::ApiError;
use memdash::logging::{log, obj, v_num, v_str, Domain, Level};

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = Config::from_env();
    let backend = Arc::new(RestBackend::new(&cfg)?);
    let mut app = DashboardApp::new(&cfg, backend);

    log(
        Level::Info,
        Domain::System,
        "startup",
        obj(&[
            ("api_base", v_str(&cfg.api_base)),
            ("refresh_secs", v_num(cfg.refresh_secs as f64)),
            ("resumed_session", serde_json::Value::Bool(app.is_authenticated())),
        ]),
    );

    loop {
        if let Err(err) = app.ensure_login().await {
            match err {
                ApiError::EmptyCredentials => {
                    bail!("{} (set ADMIN_USER and ADMIN_PASS)", err.user_message())
                }
                ApiError::InvalidCredentials => bail!("{}", err.user_message()),
                other => bail!("login failed: {}", other),
            }
        }

        let mut dashboards = app.subscribe();
        dashboards.borrow_and_update();
        let mut notices = app.notices();
        notices.borrow_and_update();

        app.start();

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                app.stop();
                log(
                    Level::Info,
                    Domain::System,
                    "shutdown",
                    obj(&[("msg", v_str("interrupted; refresh stopped"))]),
                );
                return Ok(());
            }
            _ = notices.changed() => {}
        }

        // Session expired mid-run. Re-login is only worth attempting when this
        // session produced at least one dashboard; an expiry straight after
        // login means the credentials no longer grant admin reads.
        let message = notices
            .borrow()
            .clone()
            .unwrap_or_else(|| "session expired".to_string());
        let made_progress = dashboards.has_changed().unwrap_or(false);
        if !made_progress {
            bail!("{}", message);
        }
        log(
            Level::Warn,
            Domain::Session,
            "relogin",
            obj(&[("msg", v_str(&message))]),
        );
    }
}
