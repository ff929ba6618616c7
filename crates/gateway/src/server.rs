//! HTTP server with graceful shutdown

use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Bind `addr`
///
/// A bind failure is the only fatal gateway error, so it is surfaced
/// separately from serving.
pub async fn bind(addr: &str) -> std::io::Result<TcpListener> {
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "gateway listening");
    Ok(listener)
}

/// Serve `router` until `cancel` fires, then finish in-flight requests
pub async fn serve(
    listener: TcpListener,
    router: Router,
    cancel: CancellationToken,
) -> std::io::Result<()> {
    axum::serve(listener, router)
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await?;
    info!("gateway stopped");
    Ok(())
}
