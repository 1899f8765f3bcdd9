//! Client facade
//!
//! Wires the configured pieces together once: credential tiers, the shared
//! HTTP pipeline, the session manager and the 401/403 handlers. Resource
//! clients are cheap handles over the same pipeline.

use std::sync::Arc;

use tracing::info;

use crate::api::{AdminApi, PlacesApi, ReviewsApi, RoutesApi};
use crate::auth::session::SessionManager;
use crate::auth::store::{CredentialVault, FileStore, SessionStore};
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::http::{ForbiddenHandler, ForcedLogoutHandler, HttpPipeline};
use crate::navigation::Navigator;

/// Entry point for applications: one session and one pipeline, shared by
/// every resource client it hands out.
#[derive(Clone)]
pub struct TravelClient {
    http: Arc<HttpPipeline>,
    session: SessionManager,
}

impl TravelClient {
    /// Builds the client from `config`. Call
    /// [`SessionManager::initialize`] on [`session`](Self::session) before use.
    ///
    /// Fails only when the HTTP client cannot be constructed.
    pub fn new(config: &ClientConfig, navigator: Arc<dyn Navigator>) -> Result<Self, ClientError> {
        let vault = CredentialVault::new(
            Arc::new(FileStore::new(
                config.storage.durable_path.clone(),
                config.storage.remember_days,
            )),
            Arc::new(SessionStore::new()),
        );
        let http = Arc::new(HttpPipeline::new(
            config.api_url.clone(),
            config.request_timeout,
            config.retry,
        )?);
        let session = SessionManager::new(
            http.clone(),
            vault.clone(),
            navigator,
            config.inactivity_timeout,
        );
        http.add_handler(Arc::new(ForcedLogoutHandler::new(vault, session.downgrade())));
        http.add_handler(Arc::new(ForbiddenHandler::new(session.downgrade())));

        info!("Travel client ready for {}", config.api_url);
        Ok(Self { http, session })
    }

    /// The shared session manager.
    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    pub fn http(&self) -> &Arc<HttpPipeline> {
        &self.http
    }

    pub fn places(&self) -> PlacesApi {
        PlacesApi::new(self.http.clone())
    }

    pub fn reviews(&self) -> ReviewsApi {
        ReviewsApi::new(self.http.clone())
    }

    pub fn routes(&self) -> RoutesApi {
        RoutesApi::new(self.http.clone())
    }

    /// Admin endpoints, gated on the session's admin flag.
    pub fn admin(&self) -> AdminApi {
        AdminApi::new(self.http.clone(), self.session.clone())
    }
}
