//! ServerBuilder for fluent API to build HTTP servers

use super::handlers::ResourceState;
use super::router::build_resource_routes;
use crate::core::error::ConfigError;
use crate::core::record::Record;
use crate::core::service::ListSource;
use crate::core::validation::Validatable;
use anyhow::Result;
use axum::{Json, Router, routing::get};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Builder for creating HTTP servers exposing list sources
///
/// # Example
///
/// ```ignore
/// let app = ServerBuilder::new()
///     .register::<Bus>(InMemorySource::new(buses_page))
///     .register::<Route>(InMemorySource::new(routes_page))
///     .build()?;
/// ```
pub struct ServerBuilder {
    resources: Vec<(&'static str, Router)>,
    custom_routes: Vec<Router>,
}

impl ServerBuilder {
    /// Create a new ServerBuilder
    pub fn new() -> Self {
        Self {
            resources: Vec::new(),
            custom_routes: Vec::new(),
        }
    }

    /// Expose `source` under `/api/{T::resource_name()}`
    pub fn register<T>(mut self, source: impl ListSource<T> + 'static) -> Self
    where
        T: Record + Validatable + Serialize + DeserializeOwned,
    {
        let state = ResourceState::new(Arc::new(source) as Arc<dyn ListSource<T>>);
        self.resources
            .push((T::resource_name(), build_resource_routes(state)));
        self
    }

    /// Add custom routes to the server
    pub fn with_custom_routes(mut self, routes: Router) -> Self {
        self.custom_routes.push(routes);
        self
    }

    /// Names of the registered resources, in registration order
    pub fn resources(&self) -> Vec<&'static str> {
        self.resources.iter().map(|(name, _)| *name).collect()
    }

    /// Build the final REST router
    ///
    /// This generates:
    /// - `/health`
    /// - list, create, filter-options, statistics, get and delete routes
    ///   for every registered resource
    /// - request tracing and permissive CORS
    pub fn build(self) -> Result<Router> {
        let names = self.resources();
        let mut seen = std::collections::HashSet::new();
        for name in &names {
            if !seen.insert(*name) {
                return Err(ConfigError::Duplicate {
                    context: "resource".to_string(),
                    name: name.to_string(),
                }
                .into());
            }
        }

        let health = Router::new().route(
            "/health",
            get(move || {
                let names = names.clone();
                async move { health_check(names) }
            }),
        );

        let mut app = health;
        for (name, routes) in self.resources {
            app = app.nest(&format!("/api/{}", name), routes);
        }
        for custom in self.custom_routes {
            app = app.merge(custom);
        }

        Ok(app.layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        ))
    }

    /// Serve the application with graceful shutdown
    ///
    /// This will:
    /// - Bind to the provided address
    /// - Start serving requests
    /// - Handle SIGTERM and SIGINT (Ctrl+C) for graceful shutdown
    pub async fn serve(self, addr: &str) -> Result<()> {
        let app = self.build()?;
        let listener = TcpListener::bind(addr).await?;

        tracing::info!("Server listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn health_check(resources: Vec<&'static str>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "transit-console",
        "resources": resources,
    }))
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal, initiating graceful shutdown...");
        },
    }
}
