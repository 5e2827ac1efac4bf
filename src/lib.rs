//! Saldo is a web app for tracking your personal income and expenses.
//!
//! This library provides a REST API that directly serves HTML pages.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum_server::Handle;
use tokio::signal;

mod app_state;
mod auth_cookie;
mod auth_middleware;
mod credentials;
mod dashboard;
mod db;
mod endpoints;
mod html;
mod ledger;
mod log_in;
mod log_out;
mod logging;
mod navigation;
mod new_transaction;
mod password;
mod register;
mod routing;
mod session;
mod transaction;
mod transactions_page;
mod user;

pub use app_state::AppState;
pub use credentials::{CredentialError, SqliteCredentialStore};
pub use db::{StorageError, initialize as initialize_db};
pub use ledger::{LedgerError, SqliteTransactionLedger, Summary};
pub use logging::logging_middleware;
pub use password::{PasswordHash, ValidatedPassword};
pub use routing::build_router;
pub use session::{AuthError, SessionAuthenticator, SessionToken};
pub use transaction::{Transaction, TransactionKind};
pub use user::{User, UserID, Username};

/// An async task that waits for either the ctrl+c or terminate signal,
/// whichever comes first, and then signals the server to shut down
/// gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}
