//! Extractors that deserialize and validate in one step.
//!
//! Both reject with [`ServerError::Validation`], so a malformed body and a
//! body that breaks a field rule produce the same 400 envelope.

use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::request::Parts;
use axum::Json;
use herlign_core::PageParams;
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::error::ServerError;

/// JSON body that has passed its `validator` rules.
#[derive(Debug, Clone)]
pub struct ValidJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| ServerError::Validation(e.body_text()))?;
        value
            .validate()
            .map_err(|e| ServerError::Validation(e.to_string()))?;
        Ok(Self(value))
    }
}

/// Query string that has passed its `validator` rules.
#[derive(Debug, Clone)]
pub struct ValidQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for ValidQuery<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|e| ServerError::Validation(e.body_text()))?;
        value
            .validate()
            .map_err(|e| ServerError::Validation(e.to_string()))?;
        Ok(Self(value))
    }
}

pub fn page_params(page: Option<u32>, limit: Option<u32>) -> Result<PageParams, ServerError> {
    PageParams::new(page, limit).map_err(ServerError::Validation)
}
