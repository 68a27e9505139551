//! HTTP server setup.
//!
//! # Responsibilities
//! - Assemble the route table for the configured mode
//! - Compile it against the collaborators
//! - Wrap the result in the global middleware chain
//! - Serve on a listener until shutdown is signalled
//!
//! # Design Decisions
//! - Any route registration failure is returned from `new`; the process
//!   never starts serving a partial table
//! - The router is built once and never mutated afterwards

use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use crate::config::AppConfig;
use crate::http::pipeline::{Middleware, Pipeline};
use crate::routing::{assemble, compile, Collaborators, RouteError, RouteTable};

/// HTTP server for the user service.
pub struct HttpServer {
    router: Router,
    table: Arc<RouteTable>,
    config: Arc<AppConfig>,
}

impl HttpServer {
    /// Build the fully wired router.
    ///
    /// `middleware` units run after the core chain, in the order given.
    pub fn new(
        config: AppConfig,
        collaborators: Collaborators,
        middleware: Vec<Arc<dyn Middleware>>,
    ) -> Result<Self, RouteError> {
        let config = Arc::new(config);
        let table = assemble(&config)?;
        let routes = compile(&table, &config, &collaborators)?;

        let pipeline = middleware
            .into_iter()
            .fold(Pipeline::new(config.clone()), Pipeline::with);
        let router = pipeline.apply(routes);

        tracing::info!(
            mode = %config.app.mode,
            routes = table.entries().len(),
            "Route table assembled"
        );

        Ok(Self {
            router,
            table: Arc::new(table),
            config,
        })
    }

    /// The compiled router, chain included.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn routes(&self) -> &RouteTable {
        &self.table
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            mode = %self.config.app.mode,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
