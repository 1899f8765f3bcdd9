//! # API Module
//!
//! Typed clients for the REST resources. Each client is a thin handle over the
//! shared [`HttpPipeline`](crate::http::HttpPipeline); reads are marked
//! retryable, writes are sent once.

pub mod admin;
pub mod places;
pub mod reviews;
pub mod routes;

pub use admin::AdminApi;
pub use places::PlacesApi;
pub use reviews::ReviewsApi;
pub use routes::RoutesApi;

use crate::error::{ClientError, FieldErrors};

/// Checks that a resource id can be used as a single path segment.
pub(crate) fn path_id<'a>(field: &'static str, id: &'a str) -> Result<&'a str, ClientError> {
    let mut errors = FieldErrors::new();
    if id.trim().is_empty() {
        errors.add(field, "Id is required");
    } else if id.contains(['/', '?', '#']) {
        errors.add(field, "Invalid id");
    }
    errors.into_result().map(|_| id)
}
