use async_trait::async_trait;

use crate::error::Result;

/// A plain-text message handed to the delivery collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub subject: String,
    pub body: String,
    pub sender: String,
    pub recipients: Vec<String>,
}

/// Email delivery port.
///
/// Callers treat delivery as best effort; an implementation reports
/// failures but never retries.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: OutgoingMail) -> Result<()>;
}

pub fn confirmation_code_mail(
    sender: &str,
    recipient: &str,
    confirmation_code: &str,
) -> OutgoingMail {
    OutgoingMail {
        subject: "Your confirmation code".to_string(),
        body: format!(
            "A confirmation code has been generated for you: {confirmation_code}"
        ),
        sender: sender.to_string(),
        recipients: vec![recipient.to_string()],
    }
}
