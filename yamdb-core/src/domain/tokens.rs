use serde::{Deserialize, Serialize};

use crate::domain::users::User;
use crate::error::Result;

/// Bearer token pair returned by token issuance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Token issuance port.
///
/// Receives a user whose confirmation code has already been verified; the
/// token format is entirely up to the implementation.
pub trait TokenIssuer: Send + Sync {
    fn issue(&self, user: &User) -> Result<TokenPair>;
}
