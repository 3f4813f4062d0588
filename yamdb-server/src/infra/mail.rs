//! Mail delivery adapters.

use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use tracing::info;

use yamdb_config::SmtpConfig;
use yamdb_core::DomainError;
use yamdb_core::domain::mail::{Mailer, OutgoingMail};

/// Delivers mail over SMTP with STARTTLS.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl std::fmt::Debug for SmtpMailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpMailer").finish_non_exhaustive()
    }
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> Result<Self, DomainError> {
        let mut builder =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
                .map_err(|err| DomainError::Mail(err.to_string()))?
                .port(config.port);

        if let (Some(username), Some(password)) =
            (config.username.as_ref(), config.password.as_ref())
        {
            builder = builder
                .credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Self {
            transport: builder.build(),
        })
    }
}

fn build_message(mail: &OutgoingMail) -> Result<Message, DomainError> {
    let parse = |address: &str| {
        address.parse::<Mailbox>().map_err(|err| {
            DomainError::Mail(format!("invalid address {address}: {err}"))
        })
    };

    let mut builder = Message::builder()
        .from(parse(&mail.sender)?)
        .subject(mail.subject.clone())
        .header(ContentType::TEXT_PLAIN);
    for recipient in &mail.recipients {
        builder = builder.to(parse(recipient)?);
    }

    builder
        .body(mail.body.clone())
        .map_err(|err| DomainError::Mail(err.to_string()))
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<(), DomainError> {
        let message = build_message(&mail)?;
        self.transport
            .send(message)
            .await
            .map_err(|err| DomainError::Mail(err.to_string()))?;
        Ok(())
    }
}

/// Writes every message to the log instead of delivering it.
#[derive(Debug, Default, Clone)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<(), DomainError> {
        info!(
            from = %mail.sender,
            to = ?mail.recipients,
            subject = %mail.subject,
            body = %mail.body,
            "outgoing mail"
        );
        Ok(())
    }
}
