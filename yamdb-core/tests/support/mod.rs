#![allow(dead_code)]

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::sync::Mutex;

use yamdb_core::application::{
    AccountService, AppUnitOfWork, CatalogService, ReviewService,
    accounts::SignupCommand,
};
use yamdb_core::domain::mail::{Mailer, OutgoingMail};
use yamdb_core::domain::tokens::{TokenIssuer, TokenPair};
use yamdb_core::domain::users::{User, UserPatch, UserRole};

/// Keeps every message so tests can read confirmation codes back.
#[derive(Debug, Default)]
pub struct OutboxMailer {
    pub outbox: Mutex<Vec<OutgoingMail>>,
}

#[async_trait]
impl Mailer for OutboxMailer {
    async fn send(&self, mail: OutgoingMail) -> yamdb_core::Result<()> {
        self.outbox.lock().await.push(mail);
        Ok(())
    }
}

#[derive(Debug)]
pub struct OpaqueTokens;

impl TokenIssuer for OpaqueTokens {
    fn issue(&self, user: &User) -> yamdb_core::Result<TokenPair> {
        Ok(TokenPair {
            access: format!("access:{}", user.username),
            refresh: format!("refresh:{}", user.username),
        })
    }
}

/// Services wired over one in-memory store.
pub struct Harness {
    pub uow: AppUnitOfWork,
    pub mailer: Arc<OutboxMailer>,
    pub accounts: AccountService,
    pub catalog: CatalogService,
    pub reviews: ReviewService,
}

impl Harness {
    pub fn new() -> Self {
        let uow = AppUnitOfWork::in_memory();
        let mailer = Arc::new(OutboxMailer::default());
        let accounts = AccountService::new(
            &uow,
            mailer.clone(),
            Arc::new(OpaqueTokens),
            "noreply@yamdb.local",
        );
        Self {
            catalog: CatalogService::new(&uow),
            reviews: ReviewService::new(&uow),
            accounts,
            mailer,
            uow,
        }
    }

    /// Register through the sign-up flow, then assign the role directly.
    pub async fn user(&self, username: &str, role: UserRole) -> Result<User> {
        self.accounts
            .signup(SignupCommand {
                username: username.to_string(),
                email: format!("{username}@example.com"),
            })
            .await?;

        let user = self
            .uow
            .users
            .get_user_by_username(username)
            .await?
            .context("user missing after sign-up")?;

        if role == UserRole::User {
            return Ok(user);
        }
        let patch = UserPatch {
            role: Some(role),
            ..UserPatch::default()
        };
        Ok(self.uow.users.update_user(user.id, &patch).await?)
    }

    pub async fn last_code_for(&self, email: &str) -> Option<String> {
        let outbox = self.mailer.outbox.lock().await;
        outbox
            .iter()
            .rev()
            .find(|mail| mail.recipients.iter().any(|r| r == email))
            .and_then(|mail| mail.body.rsplit(' ').next().map(str::to_string))
    }
}
