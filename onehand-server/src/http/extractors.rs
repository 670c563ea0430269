//! Custom Axum extractors

use std::sync::Arc;

use axum::extract::{FromRequestParts, Path};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use uuid::Uuid;

use super::error::ApiError;
use super::server::AppState;
use crate::auth::{Claims, TokenPurpose};
use crate::models::ValidationError;
use crate::reservation::Actor;

/// Raw bearer token from the Authorization header, if any.
fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

fn verify(
    parts: &Parts,
    state: &AppState,
    accepted: &[TokenPurpose],
) -> Result<Claims, ApiError> {
    let token = bearer_token(parts).ok_or_else(ApiError::must_be_logged_in)?;
    Ok(state.tokens.verify(token, accepted)?)
}

/// Signed-in user from an access token; rejects with 401 otherwise.
pub struct AuthUser(pub Actor);

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let claims = verify(parts, state, &[TokenPurpose::Access])?;
        Ok(Self(Actor {
            id: claims.sub,
            email: claims.email,
        }))
    }
}

/// Acting user if one can be resolved. Missing or invalid tokens yield
/// `None` and the handler decides what that means.
pub struct MaybeUser(pub Option<Actor>);

impl FromRequestParts<Arc<AppState>> for MaybeUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let actor = verify(parts, state, &[TokenPurpose::Access])
            .ok()
            .map(|claims| Actor {
                id: claims.sub,
                email: claims.email,
            });
        Ok(Self(actor))
    }
}

/// User allowed to set a new password: an access token or a reset token.
pub struct PasswordChanger(pub Claims);

impl FromRequestParts<Arc<AppState>> for PasswordChanger {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let claims = verify(parts, state, &[TokenPurpose::Access, TokenPurpose::Reset])?;
        Ok(Self(claims))
    }
}

/// Extract and validate a UUID from path
pub struct ValidUuid(pub Uuid);

impl<S> FromRequestParts<S> for ValidUuid
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id): Path<String> = Path::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::Validation(ValidationError::Empty { field: "id" }))?;

        let uuid = Uuid::parse_str(&id).map_err(|_| {
            ApiError::Validation(ValidationError::InvalidFormat {
                field: "id",
                reason: "invalid UUID format",
            })
        })?;

        Ok(Self(uuid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with(auth: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/");
        if let Some(value) = auth {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn parses_bearer_scheme() {
        let parts = parts_with(Some("Bearer abc.def.ghi"));
        assert_eq!(bearer_token(&parts), Some("abc.def.ghi"));

        let parts = parts_with(Some("bearer   xyz"));
        assert_eq!(bearer_token(&parts), Some("xyz"));
    }

    #[test]
    fn ignores_other_schemes_and_missing_header() {
        assert_eq!(bearer_token(&parts_with(Some("Basic dXNlcjpwYXNz"))), None);
        assert_eq!(bearer_token(&parts_with(Some("Bearer "))), None);
        assert_eq!(bearer_token(&parts_with(None)), None);
    }
}
