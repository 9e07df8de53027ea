use async_trait::async_trait;
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt, BufReader, Stdin},
    sync::oneshot,
};

use crate::{config, error::AuthError, info, server::CallbackServer, warning};

/// How the user is sent to the authorization URL and how the redirect comes
/// back.
///
/// The flow calls [`present`](AuthorizationPrompt::present) once and then
/// blocks on [`await_callback`](AuthorizationPrompt::await_callback) without
/// a timeout; wrap the flow in `tokio::time::timeout` to bound the wait.
#[async_trait]
pub trait AuthorizationPrompt: Send {
    async fn present(&mut self, authorization_url: &str) -> Result<(), AuthError>;

    /// Full URI the provider redirected the user to.
    async fn await_callback(&mut self) -> Result<String, AuthError>;
}

fn open_in_browser(authorization_url: &str) -> bool {
    webbrowser::open(authorization_url).is_ok()
}

/// Prints the authorization URL and reads the redirect URI the user pastes
/// back.
pub struct ManualPrompt<R> {
    reader: R,
    open_browser: bool,
}

impl ManualPrompt<BufReader<Stdin>> {
    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()))
    }
}

impl<R> ManualPrompt<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            open_browser: true,
        }
    }

    /// Only print the URL, never launch a browser.
    pub fn without_browser(mut self) -> Self {
        self.open_browser = false;
        self
    }
}

#[async_trait]
impl<R> AuthorizationPrompt for ManualPrompt<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    async fn present(&mut self, authorization_url: &str) -> Result<(), AuthError> {
        info!(
            "Open this URL in a web browser and allow the requested permissions:\n{}",
            authorization_url
        );
        if self.open_browser && !open_in_browser(authorization_url) {
            warning!("Failed to open browser, navigate to the URL above manually.");
        }
        Ok(())
    }

    async fn await_callback(&mut self) -> Result<String, AuthError> {
        info!("Then paste the URI you were redirected to and press enter:");

        let mut line = String::new();
        let read = self
            .reader
            .read_line(&mut line)
            .await
            .map_err(|e| AuthError::Prompt(e.to_string()))?;

        let uri = line.trim();
        if read == 0 || uri.is_empty() {
            return Err(AuthError::Prompt("no redirect URI was entered".to_string()));
        }
        Ok(uri.to_string())
    }
}

/// Opens the browser and captures the redirect with a temporary local HTTP
/// listener.
///
/// The listener binds to `addr`, which has to match the host and port of the
/// registered redirect URI.
pub struct LocalServerPrompt {
    addr: String,
    open_browser: bool,
    pending: Option<(CallbackServer, oneshot::Receiver<String>)>,
}

impl LocalServerPrompt {
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            open_browser: true,
            pending: None,
        }
    }

    pub fn from_env() -> Self {
        Self::new(config::server_addr())
    }

    pub fn without_browser(mut self) -> Self {
        self.open_browser = false;
        self
    }

    /// Address the listener is bound to, once the URL has been presented.
    pub fn local_addr(&self) -> Option<std::net::SocketAddr> {
        self.pending.as_ref().map(|(server, _)| server.local_addr())
    }
}

#[async_trait]
impl AuthorizationPrompt for LocalServerPrompt {
    async fn present(&mut self, authorization_url: &str) -> Result<(), AuthError> {
        // listen before the user can possibly be redirected
        let (tx, rx) = oneshot::channel();
        let server = CallbackServer::start(&self.addr, tx).await?;
        self.pending = Some((server, rx));

        if self.open_browser && open_in_browser(authorization_url) {
            info!("Waiting for the authorization in your browser...");
        } else {
            info!(
                "Open this URL in a web browser and allow the requested permissions:\n{}",
                authorization_url
            );
        }
        Ok(())
    }

    async fn await_callback(&mut self) -> Result<String, AuthError> {
        let (server, rx) = self.pending.take().ok_or_else(|| {
            AuthError::Prompt("the authorization URL has not been presented".to_string())
        })?;

        let received = rx.await;
        server.shutdown().await;

        received.map_err(|_| {
            AuthError::Prompt("callback listener stopped before a redirect arrived".to_string())
        })
    }
}
