//! Main webserver implementation
//!
//! Wires the HTTP routes to an injected `TaskService` and runs the axum
//! server until a shutdown signal arrives.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use shared::{logging, process_info, ProcessId};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::error::{WebServerError, WebServerResult};
use crate::traits::TaskService;
use crate::web::handlers::api;

/// Main webserver struct with dependency injection
pub struct WebServer<T>
where
    T: TaskService + 'static,
{
    service: Arc<T>,
}

impl<T> Clone for WebServer<T>
where
    T: TaskService + 'static,
{
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
        }
    }
}

impl<T> WebServer<T>
where
    T: TaskService + 'static,
{
    pub fn new(service: Arc<T>) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &Arc<T> {
        &self.service
    }

    /// Build the Axum router with all routes
    pub fn build_router(&self) -> Router {
        Router::new()
            .route("/upload", post(api::upload_csv::<T>))
            .route("/result/:task_id", get(api::get_result::<T>))
            .route("/status/:task_id", get(api::get_status::<T>))
            .route("/health", get(api::health_check::<T>))
            // uploads are streamed to disk, so no in-memory cap is needed
            .layer(DefaultBodyLimit::disable())
            .layer(
                ServiceBuilder::new()
                    .layer(TraceLayer::new_for_http())
                    .layer(CorsLayer::permissive())
                    .into_inner(),
            )
            .with_state(self.service.clone())
    }

    /// Bind `address` and serve until Ctrl+C or SIGTERM
    pub async fn run(&self, address: SocketAddr) -> WebServerResult<()> {
        let listener = TcpListener::bind(address)
            .await
            .map_err(|source| WebServerError::BindFailed {
                address: address.to_string(),
                source,
            })?;

        self.serve(listener, shutdown_signal()).await
    }

    /// Serve on an already bound listener until `shutdown` resolves
    pub async fn serve<S>(&self, listener: TcpListener, shutdown: S) -> WebServerResult<()>
    where
        S: Future<Output = ()> + Send + 'static,
    {
        let local = listener.local_addr()?;
        process_info!(ProcessId::current(), "🌐 Listening on http://{}", local);

        axum::serve(listener, self.build_router())
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| WebServerError::ServerError(e.to_string()))?;

        logging::log_shutdown(ProcessId::current(), "HTTP server stopped");
        Ok(())
    }
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            logging::log_error(ProcessId::current(), "Installing Ctrl+C handler", &e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                logging::log_error(ProcessId::current(), "Installing SIGTERM handler", &e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => logging::log_shutdown(ProcessId::current(), "received Ctrl+C"),
        _ = terminate => logging::log_shutdown(ProcessId::current(), "received SIGTERM"),
    }
}
