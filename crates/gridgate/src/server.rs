//! `GridgateServer` builder and accept loop.
//!
//! Ties the layers together: transport → protocol → session → grant.

use std::sync::Arc;
use std::time::Duration;

use gridgate_grant::GrantBuilder;
use gridgate_session::{Authenticator, IdentityStore};
use gridgate_transport::{PendingConnection, Transport, WebSocketTransport};

use crate::handler::handle_connection;
use crate::{GridgateError, LoginConfig, LoginService};

/// Builder for configuring and starting a login server.
///
/// # Example
///
/// ```rust,ignore
/// use gridgate::prelude::*;
///
/// let server = GridgateServer::builder()
///     .bind("0.0.0.0:8080")
///     .login_config(LoginConfig::default().welcome_message("Welcome to Ahern"))
///     .build(store, CredentialAuthenticator, grants)
///     .await?;
/// server.run().await
/// ```
#[derive(Debug, Clone)]
pub struct GridgateServerBuilder {
    bind_addr: String,
    login_config: LoginConfig,
}

impl GridgateServerBuilder {
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            login_config: LoginConfig::default(),
        }
    }

    /// Sets the address to listen on.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    pub fn login_config(mut self, config: LoginConfig) -> Self {
        self.login_config = config;
        self
    }

    /// Binds the listener and wires the login service.
    pub async fn build<S, A>(
        self,
        store: Arc<S>,
        auth: A,
        grants: GrantBuilder,
    ) -> Result<GridgateServer<S, A>, GridgateError>
    where
        S: IdentityStore,
        A: Authenticator,
    {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;
        let service = LoginService::new(store, auth, grants, &self.login_config);

        Ok(GridgateServer {
            transport,
            service: Arc::new(service),
            request_timeout: self.login_config.request_timeout,
        })
    }
}

impl Default for GridgateServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound login server. Call [`run()`](Self::run) to serve.
pub struct GridgateServer<S, A> {
    transport: WebSocketTransport,
    service: Arc<LoginService<S, A>>,
    request_timeout: Duration,
}

impl GridgateServer<(), ()> {
    /// Store and authenticator types are fixed later, by
    /// [`GridgateServerBuilder::build`].
    pub fn builder() -> GridgateServerBuilder {
        GridgateServerBuilder::new()
    }
}

impl<S, A> GridgateServer<S, A>
where
    S: IdentityStore,
    A: Authenticator,
{
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// The login service, for out-of-band calls such as issuing web login
    /// keys.
    pub fn service(&self) -> &Arc<LoginService<S, A>> {
        &self.service
    }

    /// Accepts connections forever, one task per connection. The WebSocket
    /// upgrade runs inside that task, so a client stalling its handshake
    /// never holds up the next accept.
    pub async fn run(mut self) -> Result<(), GridgateError> {
        tracing::info!(addr = ?self.local_addr().ok(), "gridgate login server running");

        loop {
            match self.transport.accept().await {
                Ok(pending) => {
                    let service = Arc::clone(&self.service);
                    let timeout = self.request_timeout;
                    tokio::spawn(async move {
                        let peer = pending.peer_addr();
                        let conn = match pending.establish().await {
                            Ok(conn) => conn,
                            Err(e) => {
                                tracing::debug!(%peer, error = %e, "handshake failed");
                                return;
                            }
                        };
                        if let Err(e) = handle_connection(conn, service, timeout).await {
                            tracing::debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
