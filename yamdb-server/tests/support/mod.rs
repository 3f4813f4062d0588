#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use axum_test::TestServer;
use serde_json::{Value, json};
use tokio::sync::Mutex;

use yamdb_config::{
    AuthConfig, Config, ConfigMetadata, CorsConfig, DatabaseConfig,
    MailConfig, ServerConfig,
};
use yamdb_core::application::AppUnitOfWork;
use yamdb_core::domain::mail::{Mailer, OutgoingMail};
use yamdb_core::domain::users::{UserPatch, UserRole};
use yamdb_server::{AppState, create_app};

pub const SENDER: &str = "noreply@yamdb.test";

/// Keeps every message so tests can read confirmation codes back.
#[derive(Debug, Default)]
pub struct OutboxMailer {
    sent: Mutex<Vec<OutgoingMail>>,
}

#[async_trait]
impl Mailer for OutboxMailer {
    async fn send(&self, mail: OutgoingMail) -> yamdb_core::Result<()> {
        self.sent.lock().await.push(mail);
        Ok(())
    }
}

impl OutboxMailer {
    pub async fn last_code_for(&self, email: &str) -> Option<String> {
        self.sent
            .lock()
            .await
            .iter()
            .rev()
            .find(|mail| mail.recipients.iter().any(|r| r == email))
            .and_then(|mail| mail.body.rsplit(' ').next().map(str::to_string))
    }

    pub async fn count(&self) -> usize {
        self.sent.lock().await.len()
    }
}

pub fn test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".into(),
            port: 0,
        },
        database: DatabaseConfig {
            url: None,
            max_connections: 1,
        },
        auth: AuthConfig {
            token_key: "integration-test-signing-key-0123456789".into(),
            access_token_ttl: Duration::from_secs(3600),
            refresh_token_ttl: Duration::from_secs(86_400),
        },
        mail: MailConfig {
            from_email: SENDER.into(),
            smtp: None,
        },
        cors: CorsConfig::default(),
        dev_mode: false,
        metadata: ConfigMetadata::default(),
    }
}

pub struct TestApp {
    pub server: TestServer,
    pub state: AppState,
    pub mailer: Arc<OutboxMailer>,
}

impl TestApp {
    pub fn new() -> Result<Self> {
        let mailer = Arc::new(OutboxMailer::default());
        let state = AppState::new(
            Arc::new(test_config()),
            Arc::new(AppUnitOfWork::in_memory()),
            None,
            mailer.clone(),
        );
        let server = TestServer::new(create_app(state.clone()))
            .map_err(|err| anyhow!(err.to_string()))?;

        Ok(Self {
            server,
            state,
            mailer,
        })
    }

    /// Sign up, read the mailed code and exchange it for an access token.
    pub async fn register(&self, username: &str) -> Result<String> {
        let email = format!("{username}@example.com");
        self.server
            .post("/api/v1/auth/signup/")
            .json(&json!({ "username": username, "email": email }))
            .await
            .assert_status_ok();

        let code = self
            .mailer
            .last_code_for(&email)
            .await
            .ok_or_else(|| anyhow!("no code mailed to {email}"))?;

        let response = self
            .server
            .post("/api/v1/auth/token/")
            .json(&json!({ "username": username, "confirmation_code": code }))
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        body["access"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| anyhow!("token response without access"))
    }

    /// Register and then assign `role` directly through the store.
    pub async fn register_as(
        &self,
        username: &str,
        role: UserRole,
    ) -> Result<String> {
        let token = self.register(username).await?;
        let user = self
            .state
            .unit_of_work
            .users
            .get_user_by_username(username)
            .await?
            .ok_or_else(|| anyhow!("{username} missing"))?;
        let patch = UserPatch {
            role: Some(role),
            ..UserPatch::default()
        };
        self.state.unit_of_work.users.update_user(user.id, &patch).await?;
        Ok(token)
    }
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}
