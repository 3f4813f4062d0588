use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use yamdb_core::DomainError;
use yamdb_core::domain::tokens::{TokenIssuer, TokenPair};
use yamdb_core::domain::users::{User, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
    pub token_type: TokenType,
}

impl Claims {
    pub fn user_id(&self) -> Result<UserId, DomainError> {
        self.sub
            .parse()
            .map_err(|_| DomainError::Unauthenticated("invalid token".into()))
    }
}

/// HS256 token issuer and verifier.
#[derive(Clone)]
pub struct JwtTokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl std::fmt::Debug for JwtTokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtTokenIssuer")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish_non_exhaustive()
    }
}

impl JwtTokenIssuer {
    pub fn new(secret: &[u8], access_ttl: Duration, refresh_ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            access_ttl,
            refresh_ttl,
        }
    }

    fn sign(
        &self,
        user_id: UserId,
        token_type: TokenType,
        ttl: Duration,
    ) -> Result<String, DomainError> {
        let now = Utc::now().timestamp();
        let ttl = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        let claims = Claims {
            sub: user_id.to_string(),
            exp: now.saturating_add(ttl),
            iat: now,
            jti: Uuid::new_v4().to_string(),
            token_type,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|err| DomainError::Token(err.to_string()))
    }

    pub fn access_token(&self, user_id: UserId) -> Result<String, DomainError> {
        self.sign(user_id, TokenType::Access, self.access_ttl)
    }

    /// Decode `token` and require it to be of `expected` type.
    pub fn verify(
        &self,
        token: &str,
        expected: TokenType,
    ) -> Result<Claims, DomainError> {
        let validation = Validation::new(Algorithm::HS256);
        let claims = decode::<Claims>(token, &self.decoding, &validation)
            .map_err(|_| {
                DomainError::Unauthenticated("invalid or expired token".into())
            })?
            .claims;

        if claims.token_type != expected {
            return Err(DomainError::Unauthenticated(
                "wrong token type".into(),
            ));
        }
        Ok(claims)
    }
}

impl TokenIssuer for JwtTokenIssuer {
    fn issue(&self, user: &User) -> Result<TokenPair, DomainError> {
        Ok(TokenPair {
            access: self.sign(user.id, TokenType::Access, self.access_ttl)?,
            refresh: self.sign(user.id, TokenType::Refresh, self.refresh_ttl)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test-secret-test-secret-test-secret";

    fn issuer() -> JwtTokenIssuer {
        JwtTokenIssuer::new(
            SECRET,
            Duration::from_secs(3600),
            Duration::from_secs(86_400),
        )
    }

    #[test]
    fn access_tokens_round_trip() {
        let token = issuer().access_token(42).unwrap();
        let claims = issuer().verify(&token, TokenType::Access).unwrap();
        assert_eq!(claims.user_id().unwrap(), 42);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn token_types_are_not_interchangeable() {
        let issuer = issuer();
        let refresh = issuer.sign(7, TokenType::Refresh, issuer.refresh_ttl).unwrap();
        assert!(matches!(
            issuer.verify(&refresh, TokenType::Access),
            Err(DomainError::Unauthenticated(_))
        ));
        assert!(issuer.verify(&refresh, TokenType::Refresh).is_ok());
    }

    #[test]
    fn foreign_signatures_and_expired_tokens_fail() {
        let other = JwtTokenIssuer::new(
            b"another-secret-another-secret-xx",
            Duration::from_secs(3600),
            Duration::from_secs(3600),
        );
        let token = other.access_token(1).unwrap();
        assert!(issuer().verify(&token, TokenType::Access).is_err());

        let now = Utc::now().timestamp();
        let stale = Claims {
            sub: "1".into(),
            exp: now - 3600,
            iat: now - 7200,
            jti: Uuid::new_v4().to_string(),
            token_type: TokenType::Access,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &stale,
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap();
        assert!(issuer().verify(&token, TokenType::Access).is_err());
    }
}
