//! HTTP handlers exposing a ListSource
//!
//! All handlers are generic over the record type; one set of routes is
//! mounted per registered resource.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::Arc;

use crate::core::aggregate::AggregateResult;
use crate::core::error::{ConsoleError, ValidationError};
use crate::core::query::{FilterOptions, ListQuery, ListResponse};
use crate::core::record::Record;
use crate::core::service::ListSource;
use crate::core::validation::{Validatable, Validated};

/// State shared by the handlers of one resource
pub struct ResourceState<T> {
    pub source: Arc<dyn ListSource<T>>,
}

impl<T> Clone for ResourceState<T> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
        }
    }
}

impl<T: Record> ResourceState<T> {
    pub fn new(source: Arc<dyn ListSource<T>>) -> Self {
        Self { source }
    }
}

/// Keep typed errors raised by a source; anything else is internal
fn source_error(err: anyhow::Error) -> ConsoleError {
    match err.downcast::<ConsoleError>() {
        Ok(typed) => typed,
        Err(err) => {
            tracing::error!(error = %err, "source failure");
            ConsoleError::Internal(err.to_string())
        }
    }
}

/// List records
///
/// GET /api/{resource}?page=0&size=10&sortBy=..&sortDir=..&search=..&<filters>
pub async fn list_records<T: Record + Serialize>(
    State(state): State<ResourceState<T>>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<ListResponse<T>>, ConsoleError> {
    let query = ListQuery::from_params(&params)?;
    let response = state.source.list(&query).await.map_err(source_error)?;
    Ok(Json(response))
}

/// Get a record by id
///
/// GET /api/{resource}/{id}
pub async fn get_record<T: Record + Serialize>(
    State(state): State<ResourceState<T>>,
    Path(id): Path<String>,
) -> Result<Json<T>, ConsoleError> {
    match state.source.get(&id).await.map_err(source_error)? {
        Some(record) => Ok(Json(record)),
        None => Err(ConsoleError::NotFound {
            resource: T::resource_name().to_string(),
            id,
        }),
    }
}

/// Create a record from a validated form
///
/// POST /api/{resource}
pub async fn create_record<T>(
    State(state): State<ResourceState<T>>,
    validated: Validated<T>,
) -> Result<impl IntoResponse, ConsoleError>
where
    T: Record + Validatable + Serialize + DeserializeOwned,
{
    let record: T =
        serde_json::from_value(validated.into_inner()).map_err(|e| ValidationError::InvalidJson {
            message: e.to_string(),
        })?;
    let created = state.source.create(record).await.map_err(source_error)?;
    tracing::info!(resource = T::resource_name(), id = created.id(), "record created");
    Ok((StatusCode::CREATED, Json(created)))
}

/// Delete a record
///
/// DELETE /api/{resource}/{id}
pub async fn delete_record<T: Record>(
    State(state): State<ResourceState<T>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ConsoleError> {
    state.source.delete(&id).await.map_err(source_error)?;
    tracing::info!(resource = T::resource_name(), id = %id, "record deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/{resource}/filter-options
pub async fn filter_options<T: Record>(
    State(state): State<ResourceState<T>>,
) -> Result<Json<FilterOptions>, ConsoleError> {
    Ok(Json(state.source.filter_options().await.map_err(source_error)?))
}

/// GET /api/{resource}/statistics
pub async fn statistics<T: Record>(
    State(state): State<ResourceState<T>>,
) -> Result<Json<AggregateResult>, ConsoleError> {
    Ok(Json(state.source.statistics().await.map_err(source_error)?))
}
