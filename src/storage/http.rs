//! REST client implementation of ListSource
//!
//! Talks to a backend exposing `<base>/api/<resource>` with the same
//! contracts this crate's server provides.

use crate::config::MAX_PAGE_SIZE;
use crate::core::aggregate::AggregateResult;
use crate::core::error::{ConsoleError, ErrorResponse};
use crate::core::query::{FilterOptions, ListQuery, ListResponse};
use crate::core::record::Record;
use crate::core::service::ListSource;
use anyhow::Result;
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;

/// Transport-level failures of [`HttpSource`]
#[derive(Debug, thiserror::Error)]
pub enum HttpSourceError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The backend answered with a non-success status; `message` is the
    /// backend's own message when it sent one
    #[error("{message}")]
    Status {
        url: String,
        status: StatusCode,
        message: String,
    },

    #[error("invalid backend url {url}: {message}")]
    InvalidUrl { url: String, message: String },

    #[error("invalid response body from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl HttpSourceError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            HttpSourceError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Record source backed by a remote REST API
pub struct HttpSource<T> {
    client: Client,
    base_url: String,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for HttpSource<T> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: Record + Serialize + DeserializeOwned> HttpSource<T> {
    /// Create a source for `T::resource_name()` under `base_url`
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            _marker: PhantomData,
        }
    }

    fn url(&self, suffix: &str) -> String {
        format!("{}/api/{}{}", self.base_url, T::resource_name(), suffix)
    }

    /// `<base>/api/<resource>/<id>` with `id` percent-encoded as one segment
    fn record_url(&self, id: &str) -> std::result::Result<String, HttpSourceError> {
        let base = self.url("");
        let invalid = |message: String| HttpSourceError::InvalidUrl {
            url: base.clone(),
            message,
        };

        let mut url = reqwest::Url::parse(&base).map_err(|e| invalid(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| invalid("cannot carry a path".to_string()))?
            .push(id);
        Ok(url.into())
    }

    async fn send(
        &self,
        url: &str,
        request: reqwest::RequestBuilder,
    ) -> std::result::Result<Response, HttpSourceError> {
        tracing::debug!(url, "backend request");
        let response = request.send().await.map_err(|source| HttpSourceError::Transport {
            url: url.to_string(),
            source,
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = match response.json::<ErrorResponse>().await {
            Ok(body) => body.message,
            Err(_) => status
                .canonical_reason()
                .unwrap_or("unexpected response")
                .to_string(),
        };
        Err(HttpSourceError::Status {
            url: url.to_string(),
            status,
            message,
        })
    }

    async fn json<B: DeserializeOwned>(
        url: &str,
        response: Response,
    ) -> std::result::Result<B, HttpSourceError> {
        response.json().await.map_err(|source| HttpSourceError::Decode {
            url: url.to_string(),
            source,
        })
    }

    async fn get_json<B: DeserializeOwned>(&self, suffix: &str) -> Result<B> {
        let url = self.url(suffix);
        let response = self.send(&url, self.client.get(&url)).await?;
        Ok(Self::json(&url, response).await?)
    }

    fn not_found(id: &str) -> anyhow::Error {
        ConsoleError::NotFound {
            resource: T::resource_name().to_string(),
            id: id.to_string(),
        }
        .into()
    }
}

#[async_trait]
impl<T: Record + Serialize + DeserializeOwned> ListSource<T> for HttpSource<T> {
    async fn list(&self, query: &ListQuery) -> Result<ListResponse<T>> {
        let url = self.url("");
        let request = self.client.get(&url).query(&query.to_params());
        let response = self.send(&url, request).await?;
        Ok(Self::json(&url, response).await?)
    }

    async fn fetch_all(&self) -> Result<Vec<T>> {
        let mut query = ListQuery {
            size: MAX_PAGE_SIZE,
            ..ListQuery::default()
        };
        let mut records = Vec::new();

        loop {
            let page = self.list(&query).await?;
            let last = page.number + 1 >= page.total_pages || page.content.is_empty();
            records.extend(page.content);
            if last {
                break;
            }
            query.page += 1;
        }

        Ok(records)
    }

    async fn get(&self, id: &str) -> Result<Option<T>> {
        let url = self.record_url(id)?;
        match self.send(&url, self.client.get(&url)).await {
            Ok(response) => Ok(Some(Self::json(&url, response).await?)),
            Err(e) if e.status() == Some(StatusCode::NOT_FOUND) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn filter_options(&self) -> Result<FilterOptions> {
        self.get_json("/filter-options").await
    }

    async fn statistics(&self) -> Result<AggregateResult> {
        self.get_json("/statistics").await
    }

    async fn create(&self, record: T) -> Result<T> {
        let url = self.url("");
        let response = self.send(&url, self.client.post(&url).json(&record)).await?;
        Ok(Self::json(&url, response).await?)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let url = self.record_url(id)?;
        match self.send(&url, self.client.delete(&url)).await {
            Ok(_) => Ok(()),
            Err(e) if e.status() == Some(StatusCode::NOT_FOUND) => Err(Self::not_found(id)),
            Err(e) => Err(e.into()),
        }
    }
}
