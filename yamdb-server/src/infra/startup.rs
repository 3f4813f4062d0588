use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use yamdb_config::Config;
use yamdb_core::application::AppUnitOfWork;
use yamdb_core::database::PostgresDatabase;
use yamdb_core::domain::mail::Mailer;

use crate::infra::{
    app_state::AppState,
    mail::{LogMailer, SmtpMailer},
};

/// Connect to PostgreSQL and apply pending migrations.
pub async fn connect_postgres(
    url: &str,
    max_connections: u32,
) -> Result<PostgresDatabase> {
    let postgres = PostgresDatabase::connect(url, max_connections)
        .await
        .context("failed to connect to PostgreSQL")?;
    postgres
        .migrate()
        .await
        .context("database migration failed")?;
    Ok(postgres)
}

pub fn build_mailer(config: &Config) -> Result<Arc<dyn Mailer>> {
    match config.mail.smtp.as_ref() {
        Some(smtp) => {
            let mailer = SmtpMailer::new(smtp)
                .context("failed to configure SMTP transport")?;
            info!(host = %smtp.host, port = smtp.port, "SMTP delivery enabled");
            Ok(Arc::new(mailer))
        }
        None => {
            warn!("No SMTP host configured; mail will be written to the log");
            Ok(Arc::new(LogMailer))
        }
    }
}

/// Wire storage, mail and services from the loaded configuration.
pub async fn build_app_state(config: Config) -> Result<AppState> {
    let (unit_of_work, postgres) = match config.database.url.as_deref() {
        Some(url) => {
            let postgres =
                connect_postgres(url, config.database.max_connections).await?;
            info!("Connected to PostgreSQL; schema is up to date");
            let uow = AppUnitOfWork::from_postgres(&postgres);
            (uow, Some(Arc::new(postgres)))
        }
        None => {
            warn!("DATABASE_URL not set; using the in-memory store");
            (AppUnitOfWork::in_memory(), None)
        }
    };

    let mailer = build_mailer(&config)?;

    Ok(AppState::new(
        Arc::new(config),
        Arc::new(unit_of_work),
        postgres,
        mailer,
    ))
}
