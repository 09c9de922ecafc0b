//! Prediction service: loads one model at startup and answers liveness and
//! prediction requests for a single deployment.

mod context;
mod error;
mod routes;

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use modelserve_ai::ModelError;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{info, warn};

pub use context::{ServiceConfig, ServiceContext};
pub use error::ApiError;
pub use routes::router;

#[derive(Debug, Error)]
pub enum ServeError {
    #[error("failed to load model: {0}")]
    Model(#[from] ModelError),

    #[error("cannot bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("server error: {0}")]
    Io(#[from] io::Error),
}

/// Serve `ctx` on an already-bound listener until `shutdown` resolves.
pub async fn serve<F>(
    listener: TcpListener,
    ctx: ServiceContext,
    shutdown: F,
) -> Result<(), ServeError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    info!(deployment = %ctx.deployment, %addr, "prediction service listening");

    axum::serve(listener, router(Arc::new(ctx)))
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("prediction service stopped");
    Ok(())
}

/// Load the model, bind the configured address and serve until Ctrl-C.
///
/// A missing or unreadable model aborts startup before the port is bound.
pub async fn run(config: ServiceConfig) -> Result<(), ServeError> {
    let ctx = ServiceContext::load(&config)?;
    let addr = config.bind_addr();
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServeError::Bind { addr, source })?;
    serve(listener, ctx, shutdown_signal()).await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "cannot listen for Ctrl-C; running until killed");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
