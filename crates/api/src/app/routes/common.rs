use core::str::FromStr;

use axum::{
    Json,
    async_trait,
    body::Bytes,
    extract::{FromRequest, Request},
    http::header::CONTENT_TYPE,
};
use serde::de::DeserializeOwned;

use tabs_core::DomainError;

use crate::app::errors::ApiError;

/// Request body accepted either as `application/json` or as url-encoded form
/// fields. Any other (or missing) content type is read as a form, so an empty
/// body deserializes to "all fields absent".
pub struct FormOrJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for FormOrJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/json"));

        if is_json {
            let Json(value) = Json::<T>::from_request(req, state)
                .await
                .map_err(|rejection| ApiError::InvalidBody(rejection.body_text()))?;
            return Ok(Self(value));
        }

        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::InvalidBody(rejection.body_text()))?;
        let value = serde_urlencoded::from_bytes::<T>(&bytes)
            .map_err(|e| ApiError::InvalidBody(format!("failed to parse form body: {e}")))?;
        Ok(Self(value))
    }
}

/// Parse a path segment into a typed id, rejecting non-numeric input.
pub fn parse_id<T>(raw: &str) -> Result<T, ApiError>
where
    T: FromStr<Err = DomainError>,
{
    raw.parse::<T>().map_err(ApiError::from)
}
