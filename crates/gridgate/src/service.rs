//! `LoginService`: the login pipeline.
//!
//! ```text
//! frame ─→ decode_request ─┬─ malformed ─────────────────────────────┐
//!                          └─ LoginRequest ─→ login()                │
//!                               admit (lock held from here)          │
//!                               assemble grant                       │
//!                               record inventory root                │
//!                               customize                            │
//!                               release lock                         │
//!                             ─→ Ok(grant) | Err(LoginError) ────────┴─→ encode_reply
//! ```
//!
//! There is one core ([`LoginService::login`]) for both wire encodings.
//! [`LoginService::handle_frame`] is the adapter: it decodes, runs the
//! core, and renders the outcome in the encoding the request came in.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use gridgate_grant::GrantBuilder;
use gridgate_protocol::{
    Codec, Decoded, JsonCodec, LoginGrant, LoginRequest, NamePair, ProtocolError, Reply,
    decode_request, encode_reply,
};
use gridgate_session::{
    Authenticator, CredentialAuthenticator, IdentityStore, SessionArbiter,
};
use uuid::Uuid;

use crate::{LoginConfig, LoginError};

/// Authenticates logins, arbitrates sessions, and builds grants.
///
/// Shared by every connection task, typically behind an `Arc`.
pub struct LoginService<S, A = CredentialAuthenticator, C = JsonCodec> {
    arbiter: SessionArbiter<S, A>,
    grants: GrantBuilder,
    codec: C,
}

impl<S, A> LoginService<S, A, JsonCodec>
where
    S: IdentityStore,
    A: Authenticator,
{
    /// Wires the service from its collaborators. The welcome text from
    /// `config` replaces the one in `grants`.
    pub fn new(store: Arc<S>, auth: A, grants: GrantBuilder, config: &LoginConfig) -> Self {
        Self {
            arbiter: SessionArbiter::new(store, auth, config.serialization),
            grants: grants.welcome_message(config.welcome_message.clone()),
            codec: JsonCodec,
        }
    }
}

impl<S, A, C> LoginService<S, A, C>
where
    S: IdentityStore,
    A: Authenticator,
    C: Codec,
{
    /// Swaps the frame codec.
    pub fn with_codec<C2: Codec>(self, codec: C2) -> LoginService<S, A, C2> {
        LoginService {
            arbiter: self.arbiter,
            grants: self.grants,
            codec,
        }
    }

    pub fn arbiter(&self) -> &SessionArbiter<S, A> {
        &self.arbiter
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    /// Runs one validated login to completion.
    ///
    /// The login lock is held from arbitration until the grant is
    /// customized, and released on every return path.
    ///
    /// # Errors
    /// Every refusal is a [`LoginError`]; see its variants.
    pub async fn login(&self, request: &LoginRequest) -> Result<LoginGrant, LoginError> {
        let name = &request.name;
        tracing::info!(
            first = %name.first,
            last = %name.last,
            mode = request.credential.mode(),
            "login request received"
        );
        tracing::debug!(
            %name,
            client_version = request.client_version.as_deref().unwrap_or("unknown"),
            start = %request.start,
            "login request details"
        );

        let mut admission = self.arbiter.admit(request).await?;

        let mut grant = self.grants.assemble(admission.identity(), admission.session())?;
        admission.record_inventory_root(grant.inventory_root)?;

        let customized = self.grants.customize(
            &mut grant,
            admission.identity(),
            &admission.session().start_location,
        );
        drop(admission);
        customized?;

        tracing::info!(
            %name,
            agent_id = %grant.agent_id,
            session_id = %grant.session_id,
            "login granted"
        );
        Ok(grant)
    }

    /// Handles one inbound frame and returns the reply frame.
    ///
    /// Malformed frames are refused before any lock or collaborator is
    /// touched. A panic anywhere in the login is contained and answered as
    /// an internal failure.
    ///
    /// # Errors
    /// Only if the reply itself cannot be encoded.
    pub async fn handle_frame(&self, frame: &[u8]) -> Result<Vec<u8>, ProtocolError> {
        let Decoded { encoding, request } = decode_request(&self.codec, frame);

        let outcome = match request {
            Ok(request) => AssertUnwindSafe(self.login(&request))
                .catch_unwind()
                .await
                .unwrap_or_else(|panic| Err(LoginError::InternalFailure(panic_message(&*panic)))),
            Err(e) => Err(LoginError::MalformedRequest(e)),
        };

        let reply = match &outcome {
            Ok(grant) => Reply::Granted(grant),
            Err(e) => {
                log_refusal(e);
                Reply::Rejected(e.rejection())
            }
        };
        encode_reply(&self.codec, encoding, reply)
    }

    /// Checks a password and hands out a fresh web login key for token
    /// logins.
    pub fn issue_web_login_key(&self, name: &NamePair, password: &str) -> Result<Uuid, LoginError> {
        Ok(self.arbiter.issue_web_login_key(name, password)?)
    }
}

fn log_refusal(e: &LoginError) {
    let kind = e.rejection().kind();
    match e {
        LoginError::InternalFailure(_) | LoginError::DestinationUnavailable(_) => {
            tracing::warn!(kind, error = %e, "login refused");
        }
        _ => tracing::info!(kind, error = %e, "login refused"),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("panic: {s}")
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("panic: {s}")
    } else {
        "panic".to_string()
    }
}
