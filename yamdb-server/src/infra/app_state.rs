use std::{fmt, sync::Arc};

use yamdb_config::Config;
use yamdb_core::application::{
    AccountService, AppUnitOfWork, CatalogService, ReviewService,
};
use yamdb_core::database::PostgresDatabase;
use yamdb_core::domain::mail::Mailer;
use yamdb_core::domain::tokens::TokenIssuer;

use crate::auth::jwt::JwtTokenIssuer;

#[derive(Clone)]
pub struct AppState {
    pub unit_of_work: Arc<AppUnitOfWork>,
    /// `None` when running on the in-memory store
    pub postgres: Option<Arc<PostgresDatabase>>,
    pub config: Arc<Config>,
    pub tokens: Arc<JwtTokenIssuer>,
    pub accounts: AccountService,
    pub catalog: CatalogService,
    pub reviews: ReviewService,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("postgres", &self.postgres.is_some())
            .field("dev_mode", &self.config.dev_mode)
            .finish_non_exhaustive()
    }
}

impl AppState {
    pub fn new(
        config: Arc<Config>,
        unit_of_work: Arc<AppUnitOfWork>,
        postgres: Option<Arc<PostgresDatabase>>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        let tokens = Arc::new(JwtTokenIssuer::new(
            config.auth.token_key.as_bytes(),
            config.auth.access_token_ttl,
            config.auth.refresh_token_ttl,
        ));
        let issuer: Arc<dyn TokenIssuer> = tokens.clone();

        let accounts = AccountService::new(
            &unit_of_work,
            mailer,
            issuer,
            config.mail.from_email.clone(),
        );
        let catalog = CatalogService::new(&unit_of_work);
        let reviews = ReviewService::new(&unit_of_work);

        Self {
            unit_of_work,
            postgres,
            config,
            tokens,
            accounts,
            catalog,
            reviews,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn is_persistent(&self) -> bool {
        self.postgres.is_some()
    }
}
