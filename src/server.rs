use axum::{Extension, Router, routing::get};
use std::{net::SocketAddr, sync::Arc};
use tokio::{
    sync::{Mutex, oneshot},
    task::JoinHandle,
};

use crate::{api, error::AuthError};

/// Hands the first callback URI to whoever waits on the receiving end.
pub type CallbackSlot = Arc<Mutex<Option<oneshot::Sender<String>>>>;

/// Temporary listener serving `/callback` and `/health` during a login.
pub struct CallbackServer {
    local_addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl CallbackServer {
    pub async fn start(addr: &str, callback: oneshot::Sender<String>) -> Result<Self, AuthError> {
        let slot: CallbackSlot = Arc::new(Mutex::new(Some(callback)));
        let app = Router::new()
            .route("/health", get(api::health))
            .route("/callback", get(api::callback))
            .layer(Extension(slot));

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| AuthError::Prompt(format!("cannot listen on {}: {}", addr, e)))?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| AuthError::Prompt(e.to_string()))?;

        let (shutdown, stop) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = stop.await;
                })
                .await;
        });

        Ok(Self {
            local_addr,
            shutdown,
            handle,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stops accepting connections and waits for in-flight responses.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(());
        let _ = self.handle.await;
    }
}
