//! Response handlers
//!
//! Handlers observe every response status the pipeline receives, independently
//! of whether the request is retried. They are the place for side effects
//! such as tearing the session down on an authentication failure or sending
//! the user home when the server refuses access.

use reqwest::StatusCode;

use crate::auth::session::WeakSessionManager;
use crate::auth::store::CredentialVault;

/// Observer registered on the pipeline with
/// [`HttpPipeline::add_handler`](super::HttpPipeline::add_handler).
pub trait ResponseHandler: Send + Sync {
    /// Called once per received response, in registration order. Runs inside
    /// the dispatching task, so it must not block.
    fn on_response(&self, status: StatusCode);
}

/// Forces a logout when a 401 arrives while a durable credential is stored.
pub struct ForcedLogoutHandler {
    vault: CredentialVault,
    session: WeakSessionManager,
}

impl ForcedLogoutHandler {
    /// `vault` decides whether a 401 is acted on; `session` is torn down
    /// when it is.
    pub fn new(vault: CredentialVault, session: WeakSessionManager) -> Self {
        Self { vault, session }
    }
}

impl ResponseHandler for ForcedLogoutHandler {
    fn on_response(&self, status: StatusCode) {
        if status != StatusCode::UNAUTHORIZED || !self.vault.has_durable() {
            return;
        }
        tracing::warn!("Received 401 with a stored credential, forcing logout");
        match self.session.upgrade() {
            Some(session) => session.force_logout(),
            // No live session manager; still make sure nothing stale survives.
            None => {
                if let Err(e) = self.vault.wipe() {
                    tracing::error!("Failed to wipe credential storage: {}", e);
                }
            }
        }
    }
}

/// Sends the user home on a 403 and stops trusting the admin flag until the
/// profile has been fetched again. See [`SessionManager::handle_forbidden`].
///
/// [`SessionManager::handle_forbidden`]: crate::auth::session::SessionManager::handle_forbidden
pub struct ForbiddenHandler {
    session: WeakSessionManager,
}

impl ForbiddenHandler {
    pub fn new(session: WeakSessionManager) -> Self {
        Self { session }
    }
}

impl ResponseHandler for ForbiddenHandler {
    fn on_response(&self, status: StatusCode) {
        if status != StatusCode::FORBIDDEN {
            return;
        }
        match self.session.upgrade() {
            Some(session) => session.handle_forbidden(),
            None => tracing::debug!("Received 403 with no live session"),
        }
    }
}
