//! Reviews, their likes, comments and reports.

use std::sync::Arc;

use tracing::info;

use super::path_id;
use crate::error::{ClientError, FieldErrors};
use crate::http::{Ack, ApiRequest, HttpPipeline};
use crate::models::{
    Comment, CommentEnvelope, Created, LikeStatus, NewReview, ReportInput, Review,
    ReviewEnvelope, ReviewQuery, ReviewUpdate, ReviewsEnvelope,
};

/// Inclusive rating bounds.
pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

/// Review endpoints. Reads are retryable; writes go out once.
#[derive(Clone)]
pub struct ReviewsApi {
    http: Arc<HttpPipeline>,
}

impl ReviewsApi {
    pub fn new(http: Arc<HttpPipeline>) -> Self {
        Self { http }
    }

    /// One page of reviews. `query.filters` are passed through as extra
    /// query parameters after the fixed ones.
    pub async fn list(&self, query: &ReviewQuery) -> Result<Vec<Review>, ClientError> {
        let mut request = ApiRequest::get("/api/reviews")
            .query("page", query.page)
            .query("limit", query.limit)
            .query("sort", &query.sort)
            .query("order", query.order.as_str());
        if let Some(place_id) = &query.place_id {
            request = request.query("placeId", place_id);
        }
        for (key, value) in &query.filters {
            request = request.query(key.as_str(), value);
        }

        let envelope: ReviewsEnvelope = self.http.send_json(request.retryable()).await?;
        Ok(envelope.reviews)
    }

    pub async fn get(&self, id: &str) -> Result<Review, ClientError> {
        let id = path_id("review_id", id)?;
        let envelope: ReviewEnvelope = self
            .http
            .send_json(ApiRequest::get(format!("/api/reviews/{id}")).retryable())
            .await?;
        Ok(envelope.review)
    }

    /// Posts a review and returns the new review's id when the API reports one.
    pub async fn create(&self, review: &NewReview) -> Result<Option<String>, ClientError> {
        let mut errors = FieldErrors::new();
        if review.place_id.trim().is_empty() {
            errors.add("place_id", "Please select a place");
        }
        check_rating(&mut errors, review.rating);
        if review.comment.trim().is_empty() {
            errors.add("comment", "Please write a comment");
        }
        errors.into_result()?;

        let created: Created = self
            .http
            .send_lenient(ApiRequest::post("/api/reviews").json(review)?)
            .await?;
        info!("Review created for place {}", review.place_id);
        Ok(created.id)
    }

    /// Partial update; only the fields set in `update` are sent.
    pub async fn update(&self, id: &str, update: &ReviewUpdate) -> Result<Ack, ClientError> {
        let id = path_id("review_id", id)?;
        if let Some(rating) = update.rating {
            let mut errors = FieldErrors::new();
            check_rating(&mut errors, rating);
            errors.into_result()?;
        }
        self.http
            .send_ack(ApiRequest::put(format!("/api/reviews/{id}")).json(update)?)
            .await
    }

    pub async fn delete(&self, id: &str) -> Result<Ack, ClientError> {
        let id = path_id("review_id", id)?;
        self.http
            .send_ack(ApiRequest::delete(format!("/api/reviews/{id}")))
            .await
    }

    /// Likes the review, or removes the like when already given.
    pub async fn toggle_like(&self, id: &str) -> Result<LikeStatus, ClientError> {
        let id = path_id("review_id", id)?;
        self.http
            .send_lenient(ApiRequest::post(format!("/api/reviews/{id}/like")))
            .await
    }

    /// Returns the stored comment when the API echoes it back.
    pub async fn add_comment(&self, id: &str, text: &str) -> Result<Option<Comment>, ClientError> {
        let id = path_id("review_id", id)?;
        if text.trim().is_empty() {
            let mut errors = FieldErrors::new();
            errors.add("text", "Comment cannot be empty");
            return Err(ClientError::Validation(errors));
        }
        let envelope: CommentEnvelope = self
            .http
            .send_lenient(
                ApiRequest::post(format!("/api/reviews/{id}/comments"))
                    .json(&serde_json::json!({ "text": text }))?,
            )
            .await?;
        Ok(envelope.comment)
    }

    pub async fn like_comment(&self, id: &str, comment_id: &str) -> Result<LikeStatus, ClientError> {
        let id = path_id("review_id", id)?;
        let comment_id = path_id("comment_id", comment_id)?;
        self.http
            .send_lenient(ApiRequest::post(format!(
                "/api/reviews/{id}/comments/{comment_id}/like"
            )))
            .await
    }

    /// Flags the review for moderation.
    pub async fn report(&self, id: &str, report: &ReportInput) -> Result<Ack, ClientError> {
        let id = path_id("review_id", id)?;
        let ack = self
            .http
            .send_ack(ApiRequest::post(format!("/api/reviews/{id}/report")).json(report)?)
            .await?;
        info!("Reported review {} as {}", id, report.kind);
        Ok(ack)
    }
}

fn check_rating(errors: &mut FieldErrors, rating: u8) {
    if !(MIN_RATING..=MAX_RATING).contains(&rating) {
        errors.add("rating", "Rating must be between 1 and 5");
    }
}
