//! Places and locations.

use std::sync::Arc;

use tracing::debug;

use super::path_id;
use crate::error::ClientError;
use crate::http::{ApiRequest, HttpPipeline};
use crate::models::{Location, LocationsEnvelope, Place, PlaceEnvelope, PlacesEnvelope};

/// Public place catalogue. Needs no session; every call is a retryable read.
#[derive(Clone)]
pub struct PlacesApi {
    http: Arc<HttpPipeline>,
}

impl PlacesApi {
    pub fn new(http: Arc<HttpPipeline>) -> Self {
        Self { http }
    }

    /// Every place, in the order the API returns them. Filtering and
    /// sorting happen client side, see [`PlaceFilter`](crate::listing::PlaceFilter).
    pub async fn list(&self) -> Result<Vec<Place>, ClientError> {
        let envelope: PlacesEnvelope = self
            .http
            .send_json(ApiRequest::get("/api/places").retryable())
            .await?;
        debug!("Fetched {} places", envelope.places.len());
        Ok(envelope.places)
    }

    /// Looks a place up by its public id or its storage id.
    pub async fn get(&self, id: &str) -> Result<Place, ClientError> {
        let id = path_id("place_id", id)?;
        let envelope: PlaceEnvelope = self
            .http
            .send_json(ApiRequest::get(format!("/api/places/{id}")).retryable())
            .await?;
        Ok(envelope.place)
    }

    /// Named locations with coordinates, used to pick route endpoints.
    pub async fn locations(&self) -> Result<Vec<Location>, ClientError> {
        let envelope: LocationsEnvelope = self
            .http
            .send_json(ApiRequest::get("/api/locations").retryable())
            .await?;
        Ok(envelope.locations)
    }
}
