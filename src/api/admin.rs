//! Admin endpoints.
//!
//! Every call checks the current session first and fails with
//! [`ClientError::Forbidden`] when the signed-in user is not an admin, so a
//! non-admin never sends a request to `/api/admin`.

use std::sync::Arc;

use tracing::{info, warn};

use super::path_id;
use crate::auth::models::UserProfile;
use crate::auth::session::SessionManager;
use crate::error::ClientError;
use crate::http::{Ack, ApiRequest, HttpPipeline};
use crate::models::{
    AdminStats, Place, PlaceEnvelope, PlaceInput, PlacesEnvelope, UpdateUserInput, UserEnvelope,
    UsersEnvelope,
};

/// Admin endpoints over the shared pipeline, checked against `session`.
#[derive(Clone)]
pub struct AdminApi {
    http: Arc<HttpPipeline>,
    session: SessionManager,
}

impl AdminApi {
    /// `session` is consulted on every call, so demotion takes effect at once.
    pub fn new(http: Arc<HttpPipeline>, session: SessionManager) -> Self {
        Self { http, session }
    }

    fn authorize(&self, action: &str) -> Result<(), ClientError> {
        if self.session.is_admin() {
            Ok(())
        } else {
            warn!("Refusing admin action '{}' for non-admin session", action);
            Err(ClientError::Forbidden("Admin access required".to_string()))
        }
    }

    /// One page of user accounts. `page` starts at 1.
    pub async fn users(&self, page: u32, limit: u32) -> Result<Vec<UserProfile>, ClientError> {
        self.authorize("list users")?;
        let envelope: UsersEnvelope = self
            .http
            .send_json(
                ApiRequest::get("/api/admin/users")
                    .query("page", page)
                    .query("limit", limit)
                    .retryable(),
            )
            .await?;
        Ok(envelope.users)
    }

    /// A single account by id.
    pub async fn user(&self, id: &str) -> Result<UserProfile, ClientError> {
        self.authorize("get user")?;
        let id = path_id("user_id", id)?;
        let envelope: UserEnvelope = self
            .http
            .send_json(ApiRequest::get(format!("/api/admin/users/{id}")).retryable())
            .await?;
        Ok(envelope.user)
    }

    /// Changes role, status or ban reason; unset fields are left alone.
    pub async fn update_user(&self, id: &str, input: &UpdateUserInput) -> Result<Ack, ClientError> {
        self.authorize("update user")?;
        let id = path_id("user_id", id)?;
        let ack = self
            .http
            .send_ack(ApiRequest::put(format!("/api/admin/users/{id}")).json(input)?)
            .await?;
        info!("Updated user {}", id);
        Ok(ack)
    }

    /// Removes the account.
    pub async fn delete_user(&self, id: &str) -> Result<Ack, ClientError> {
        self.authorize("delete user")?;
        let id = path_id("user_id", id)?;
        let ack = self
            .http
            .send_ack(ApiRequest::delete(format!("/api/admin/users/{id}")))
            .await?;
        info!("Deleted user {}", id);
        Ok(ack)
    }

    /// One page of places as the admin view lists them, storage ids included.
    pub async fn places(&self, page: u32, limit: u32) -> Result<Vec<Place>, ClientError> {
        self.authorize("list places")?;
        let envelope: PlacesEnvelope = self
            .http
            .send_json(
                ApiRequest::get("/api/admin/places")
                    .query("page", page)
                    .query("limit", limit)
                    .retryable(),
            )
            .await?;
        Ok(envelope.places)
    }

    /// Creates a place and returns it as stored.
    pub async fn create_place(&self, input: &PlaceInput) -> Result<Place, ClientError> {
        self.authorize("create place")?;
        let envelope: PlaceEnvelope = self
            .http
            .send_json(ApiRequest::post("/api/admin/places").json(input)?)
            .await?;
        info!("Created place {}", envelope.place.name);
        Ok(envelope.place)
    }

    /// `id` is the place's storage id, see [`Place::admin_id`].
    pub async fn update_place(&self, id: &str, input: &PlaceInput) -> Result<Ack, ClientError> {
        self.authorize("update place")?;
        let id = path_id("place_id", id)?;
        self.http
            .send_ack(ApiRequest::put(format!("/api/admin/places/{id}")).json(input)?)
            .await
    }

    /// `id` is the storage id, as for [`update_place`](Self::update_place).
    pub async fn delete_place(&self, id: &str) -> Result<Ack, ClientError> {
        self.authorize("delete place")?;
        let id = path_id("place_id", id)?;
        self.http
            .send_ack(ApiRequest::delete(format!("/api/admin/places/{id}")))
            .await
    }

    /// Dashboard counters.
    pub async fn stats(&self) -> Result<AdminStats, ClientError> {
        self.authorize("stats")?;
        self.http
            .send_json(ApiRequest::get("/api/admin/stats").retryable())
            .await
    }
}
