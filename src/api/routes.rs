//! Route suggestions and cost estimation.

use std::sync::Arc;

use crate::error::{ClientError, FieldErrors};
use crate::http::{ApiRequest, HttpPipeline};
use crate::models::{CostEstimate, Created, RouteInput, RouteSuggestion, SuggestionsEnvelope};

/// Route suggestions and the cost estimator.
#[derive(Clone)]
pub struct RoutesApi {
    http: Arc<HttpPipeline>,
}

impl RoutesApi {
    pub fn new(http: Arc<HttpPipeline>) -> Self {
        Self { http }
    }

    /// Saves a suggested route between two places. Returns the new id.
    pub async fn suggest(
        &self,
        start: &str,
        end: &str,
        description: &str,
    ) -> Result<Option<String>, ClientError> {
        let mut errors = FieldErrors::new();
        if start.trim().is_empty() {
            errors.add("start_location", "Start location is required");
        }
        if end.trim().is_empty() {
            errors.add("end_location", "End location is required");
        }
        errors.into_result()?;

        let body = RouteSuggestion {
            start_location: start.to_string(),
            end_location: end.to_string(),
            description: description.to_string(),
            ..Default::default()
        };
        let created: Created = self
            .http
            .send_lenient(ApiRequest::post("/api/routes/suggest").json(&body)?)
            .await?;
        Ok(created.id)
    }

    /// Every saved suggestion.
    pub async fn suggestions(&self) -> Result<Vec<RouteSuggestion>, ClientError> {
        let envelope: SuggestionsEnvelope = self
            .http
            .send_json(ApiRequest::get("/api/routes/suggest").retryable())
            .await?;
        Ok(envelope.suggestions)
    }

    /// Estimates the cost of a trip. Locations must be named and both
    /// distance and duration positive, otherwise nothing is sent.
    pub async fn estimate_cost(&self, route: &RouteInput) -> Result<CostEstimate, ClientError> {
        let mut errors = FieldErrors::new();
        if route.start_location.trim().is_empty() {
            errors.add("start_location", "Start location is required");
        }
        if route.end_location.trim().is_empty() {
            errors.add("end_location", "End location is required");
        }
        if route.distance.is_nan() || route.distance <= 0.0 {
            errors.add("distance", "Distance must be greater than zero");
        }
        if route.duration == 0 {
            errors.add("duration", "Duration must be greater than zero");
        }
        errors.into_result()?;

        self.http
            .send_lenient(ApiRequest::get("/api/routes/cost").json(route)?.retryable())
            .await
    }
}
