//! Router builder utilities for resource routes

use super::handlers::{
    ResourceState, create_record, delete_record, filter_options, get_record, list_records,
    statistics,
};
use crate::core::record::Record;
use crate::core::validation::Validatable;
use axum::{Router, routing::get};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Build the routes of one resource, to be nested under `/api/{resource}`
///
/// - GET    /                - List (paginated, filtered, sorted)
/// - POST   /                - Create (validated)
/// - GET    /filter-options  - Valid filter values
/// - GET    /statistics      - Stat card aggregates
/// - GET    /{id}            - Get one record
/// - DELETE /{id}            - Delete one record
pub fn build_resource_routes<T>(state: ResourceState<T>) -> Router
where
    T: Record + Validatable + Serialize + DeserializeOwned,
{
    Router::new()
        .route("/", get(list_records::<T>).post(create_record::<T>))
        .route("/filter-options", get(filter_options::<T>))
        .route("/statistics", get(statistics::<T>))
        .route("/{id}", get(get_record::<T>).delete(delete_record::<T>))
        .with_state(state)
}
