use std::convert::Infallible;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use yamdb_core::domain::users::User;

use super::jwt::TokenType;
use crate::infra::{app_state::AppState, errors::AppError};

/// Resolve the bearer token, if any, into the acting user.
///
/// Requests without an `Authorization` header continue anonymously; a
/// header that does not carry a valid access token for an existing user is
/// rejected with 401.
pub async fn actor_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(token) = extract_bearer_token(&request)? else {
        return Ok(next.run(request).await);
    };

    let claims = state.tokens.verify(&token, TokenType::Access)?;
    let user = state
        .unit_of_work
        .users
        .get_user_by_id(claims.user_id()?)
        .await?
        .ok_or_else(|| AppError::unauthorized("user no longer exists"))?;

    debug!(user = %user.username, "authenticated request");
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

fn extract_bearer_token(request: &Request) -> Result<Option<String>, AppError> {
    let Some(value) = request.headers().get(header::AUTHORIZATION) else {
        return Ok(None);
    };

    let value = value
        .to_str()
        .map_err(|_| AppError::unauthorized("malformed authorization header"))?;
    let token = value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| {
            AppError::unauthorized("authorization header must be a bearer token")
        })?;

    Ok(Some(token.to_string()))
}

/// The user behind the request, or `None` for anonymous requests.
#[derive(Debug, Clone)]
pub struct Actor(pub Option<User>);

impl Actor {
    pub fn user(&self) -> Option<&User> {
        self.0.as_ref()
    }
}

impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        Ok(Actor(parts.extensions.get::<User>().cloned()))
    }
}
