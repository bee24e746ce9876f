//! Waitline Clova - Clova extension webhook for store waiting lists.
//!
//! Users ask a Clova speaker how many people are waiting at a store, join a
//! store's waiting list, or hear which stores are available.
//!
//! ```text
//! Clova → POST /clova → Interpreter → WaitingRegistry
//!                            ↓
//! Clova ←── CekResponse ←────┘
//! ```

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod error;
pub mod interpreter;
pub mod request;
pub mod response;
pub mod routes;
pub mod waiting;

pub use error::{ClovaError, ClovaResult};
pub use interpreter::{Interpreter, Reply, SessionControl};
pub use request::{CekRequest, Intent, IntentKind, RequestKind, Session, Slot, Slots};
pub use response::{CekResponse, Directive, OutputSpeech, SpeechItem, SpeechKind};
pub use routes::{build_router, create_state, create_state_with_registry, ClovaState};
pub use waiting::{StoreWaiting, WaitingRegistry, UNKNOWN_STORE};

use std::net::{IpAddr, SocketAddr};
use waitline_common::config::Config;

/// Resolve the socket address the webhook listens on.
pub fn bind_addr(config: &Config) -> waitline_common::Result<SocketAddr> {
    let ip: IpAddr = config.bind_address().parse().map_err(|e| {
        waitline_common::Error::Config(format!(
            "invalid bind address '{}': {e}",
            config.bind_address()
        ))
    })?;
    Ok(SocketAddr::from((ip, config.clova_port())))
}

/// Start the Clova HTTP server and serve until Ctrl-C.
pub async fn start_server(config: &Config) -> anyhow::Result<()> {
    let addr = bind_addr(config)?;
    let router = build_router(create_state(&config.clova));

    tracing::info!(
        %addr,
        webhook_path = %config.clova.webhook_path,
        stores = config.clova.stores.len(),
        "Starting Waitline Clova"
    );
    if let Some(ref public_url) = config.network.public_url {
        tracing::info!(public_url = %public_url, "Extension endpoint published");
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Waitline Clova stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    tracing::info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_addr() {
        let mut config = Config::default();
        config.network.bind = "0.0.0.0".into();
        config.services.clova.port = Some(8443);

        let addr = bind_addr(&config).unwrap();
        assert_eq!(addr.to_string(), "0.0.0.0:8443");
    }

    #[test]
    fn test_bind_addr_rejects_hostname() {
        let mut config = Config::default();
        config.network.bind = "localhost".into();

        let err = bind_addr(&config).unwrap_err();
        assert!(matches!(err, waitline_common::Error::Config(_)));
    }
}
