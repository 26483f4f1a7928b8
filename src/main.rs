use std::sync::{Arc, Mutex};

use tracing_subscriber::EnvFilter;

use bergerie::config::AppConfig;
use bergerie::db;
use bergerie::router;
use bergerie::services::mailer::resend::ResendMailer;
use bergerie::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();
    anyhow::ensure!(
        !config.signing_secret.trim().is_empty(),
        "SIGNING_SECRET must be set: moderation links, signature codes and contract tokens depend on it"
    );
    anyhow::ensure!(
        !config.notify_email.trim().is_empty(),
        "NOTIFY_EMAIL must be set to receive booking notifications"
    );

    let conn = db::init_db(&config.database_url)?;

    let mailer = ResendMailer::new(config.resend_api_key.clone(), config.mail_from.clone());

    let state = Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config: config.clone(),
        mailer: Box::new(mailer),
    });

    let app = router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
