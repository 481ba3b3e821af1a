//! Axum extractor for validated create forms
//!
//! `Validated<T>` parses the request body as JSON and runs `T`'s form schema
//! before the handler sees it.

use super::schema::Validatable;
use crate::core::error::{ConsoleError, ValidationError};
use axum::{
    Json,
    extract::{FromRequest, Request},
    response::{IntoResponse, Response},
};
use serde_json::Value;

/// A request payload that passed `T::form_schema()`
///
/// # Usage
///
/// ```rust,ignore
/// pub async fn create_bus(
///     Validated(payload, _): Validated<Bus>,
/// ) -> Result<Json<Bus>, ConsoleError> {
///     // payload is normalized and validated
/// }
/// ```
pub struct Validated<T>(pub Value, pub std::marker::PhantomData<T>);

impl<T> Validated<T> {
    /// Create a new validated payload
    pub fn new(payload: Value) -> Self {
        Self(payload, std::marker::PhantomData)
    }

    /// Get the inner payload
    pub fn into_inner(self) -> Value {
        self.0
    }
}

impl<T> std::ops::Deref for Validated<T> {
    type Target = Value;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S, T> FromRequest<S> for Validated<T>
where
    S: Send + Sync,
    T: Validatable + Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(payload): Json<Value> = match Json::from_request(req, state).await {
            Ok(json) => json,
            Err(e) => {
                return Err(ConsoleError::from(ValidationError::InvalidJson {
                    message: e.body_text(),
                })
                .into_response());
            }
        };

        match T::form_schema().validate_and_filter(payload) {
            Ok(payload) => Ok(Validated::new(payload)),
            Err(e) => Err(ConsoleError::from(e).into_response()),
        }
    }
}
