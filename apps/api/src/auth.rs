use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::errors::AppError;

/// Opaque capability token from `Authorization: Bearer <token>`.
///
/// Only presence is checked. The token value is never interpreted or logged; identity
/// and session checks belong to the caller that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapabilityToken;

#[async_trait]
impl<S> FromRequestParts<S> for CapabilityToken
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(AppError::Unauthorized)?;

        let (scheme, token) = header.split_once(' ').ok_or(AppError::Unauthorized)?;
        if !scheme.eq_ignore_ascii_case("bearer") || token.trim().is_empty() {
            return Err(AppError::Unauthorized);
        }
        Ok(CapabilityToken)
    }
}
