//! Waitlist backend for the Ubett landing page.
//!
//! Serves one write path, `POST /waitlist`, guarded by an origin check and a
//! per-client fixed-window rate limit, plus a cached `GET /waitlist/count`.
//! Rows land in a Supabase `waitlist` table; without datastore credentials
//! the service still runs and reports itself as not configured yet.

use axum::{
    Router,
    routing::{get, post},
};
use std::future::pending;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};

pub mod cache;
pub mod config;
pub mod email;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod origin;
pub mod rate_limit;
pub mod state;
pub mod store;

use config::Args;
use error::ServerError;
use handlers::{count_handler, health_handler, metrics_handler, signup_handler};
use state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/waitlist", post(signup_handler))
        .route("/waitlist/count", get(count_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}

pub async fn start_server(args: Args) -> Result<(), ServerError> {
    info!("Initializing state...");
    let state = Arc::new(AppState::from_args(&args)?);

    let sweeper = state.rate_limiter.spawn_sweeper(args.sweep_interval());
    let app = router(state);

    let address = format!("0.0.0.0:{}", args.port);
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|source| ServerError::Bind {
            address: address.clone(),
            source,
        })?;
    info!("Waitlist service running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(ServerError::Serve)?;

    sweeper.abort();
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!(error = %e, "failed to install Ctrl+C handler");
                pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!(error = %e, "failed to install terminate handler");
                pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
