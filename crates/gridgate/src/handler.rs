//! Per-connection handler.
//!
//! Each accepted connection gets its own task running this loop: receive a
//! frame, run it through the login service, send the reply. A client may
//! send several login frames on one connection (retrying after
//! `already_logged_in`, for instance). The connection ends when the client
//! closes it or stays silent for longer than the request timeout.

use std::sync::Arc;
use std::time::Duration;

use gridgate_protocol::Codec;
use gridgate_session::{Authenticator, IdentityStore};
use gridgate_transport::Connection;

use crate::{GridgateError, LoginService};

pub(crate) async fn handle_connection<K, S, A, C>(
    conn: K,
    service: Arc<LoginService<S, A, C>>,
    request_timeout: Duration,
) -> Result<(), GridgateError>
where
    K: Connection,
    GridgateError: From<K::Error>,
    S: IdentityStore,
    A: Authenticator,
    C: Codec,
{
    let conn_id = conn.id();
    tracing::debug!(%conn_id, peer = %conn.peer_addr(), "handling new connection");

    loop {
        let frame = match tokio::time::timeout(request_timeout, conn.recv()).await {
            Ok(Ok(Some(frame))) => frame,
            Ok(Ok(None)) => {
                tracing::debug!(%conn_id, "connection closed cleanly");
                break;
            }
            Ok(Err(e)) => return Err(e.into()),
            Err(_) => {
                tracing::debug!(%conn_id, "connection idle, closing");
                let _ = conn.close().await;
                break;
            }
        };

        let reply = service.handle_frame(&frame).await?;
        conn.send(&reply).await?;
    }

    Ok(())
}
