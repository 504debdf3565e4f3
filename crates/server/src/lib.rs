#![forbid(unsafe_code)]

pub mod error;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::router;
pub use state::AppState;

use tokio::net::TcpListener;

/// Serve the quiz API on an already-bound listener until `shutdown` resolves.
///
/// # Errors
///
/// Returns the underlying I/O error if the server stops abnormally.
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}
