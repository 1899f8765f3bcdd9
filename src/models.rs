//! Resource models
//!
//! Wire structures for places, locations, reviews, route planning and the
//! admin endpoints. Field names follow the API, which mixes PascalCase
//! (places, locations), camelCase and snake_case (reviews) in one payload.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::models::UserProfile;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    #[serde(default)]
    pub lat: f64,
    #[serde(default)]
    pub lng: f64,
}

/// A place listed on the site.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Place {
    /// Storage id; admin updates and deletes address the place by this one.
    #[serde(rename = "_id", default, skip_serializing_if = "String::is_empty")]
    pub object_id: String,
    #[serde(rename = "PlaceID", default)]
    pub id: String,
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(rename = "LocationID", default)]
    pub location_id: String,
    #[serde(rename = "LocationName", default, skip_serializing_if = "Option::is_none")]
    pub location_name: Option<String>,
    #[serde(rename = "Description", default)]
    pub description: String,
    #[serde(rename = "Category", default)]
    pub category: String,
    #[serde(rename = "CoverImage", default)]
    pub cover_image: String,
    #[serde(rename = "HighlightImages", default, deserialize_with = "null_as_empty")]
    pub highlight_images: Vec<String>,
    #[serde(rename = "Rating", default)]
    pub rating: f64,
    #[serde(rename = "Coordinates", default)]
    pub coordinates: Coordinates,
    #[serde(rename = "Address", default)]
    pub address: String,
    #[serde(rename = "Phone", default)]
    pub phone: String,
    #[serde(rename = "Website", default)]
    pub website: String,
    #[serde(rename = "Hours", default)]
    pub hours: String,
    #[serde(rename = "CreatedAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "UpdatedAt", default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Place {
    /// Id to use for admin write endpoints: the storage id when known.
    pub fn admin_id(&self) -> &str {
        if self.object_id.is_empty() {
            &self.id
        } else {
            &self.object_id
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    #[serde(rename = "LocationID", default)]
    pub id: String,
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(rename = "Description", default)]
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub likes: u32,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub liked_by: Vec<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Review {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub username: String,
    #[serde(rename = "placeId", default)]
    pub place_id: String,
    #[serde(rename = "placeName", default)]
    pub place_name: String,
    /// Name resolved by the list endpoint when the review did not store one.
    #[serde(rename = "place_name", default, skip_serializing_if = "Option::is_none")]
    pub listed_place_name: Option<String>,
    #[serde(default)]
    pub rating: u8,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub likes: u32,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub liked_by: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Review {
    /// Place name for display: the listing's name when present, else the
    /// one stored on the review.
    pub fn display_place_name(&self) -> &str {
        match self.listed_place_name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => &self.place_name,
        }
    }

    pub fn liked_by_user(&self, user_id: &str) -> bool {
        self.liked_by.iter().any(|id| id == user_id)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NewReview {
    #[serde(rename = "placeId")]
    pub place_id: String,
    #[serde(rename = "placeName", skip_serializing_if = "String::is_empty")]
    pub place_name: String,
    pub rating: u8,
    pub comment: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ReviewUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Server-side ordering keys for the review list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// Paging and filtering for `GET /api/reviews`.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewQuery {
    pub page: u32,
    pub limit: u32,
    pub sort: String,
    pub order: SortOrder,
    pub place_id: Option<String>,
    /// Extra filters passed through as query parameters.
    pub filters: Vec<(String, String)>,
}

impl Default for ReviewQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 10,
            sort: "newest".to_string(),
            order: SortOrder::Desc,
            place_id: None,
            filters: Vec::new(),
        }
    }
}

impl ReviewQuery {
    /// Default paging and sort, narrowed to one place.
    pub fn for_place(place_id: impl Into<String>) -> Self {
        Self {
            place_id: Some(place_id.into()),
            ..Self::default()
        }
    }

    /// Adds an extra query parameter.
    pub fn filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.push((key.into(), value.into()));
        self
    }
}

/// Reason given when reporting a review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportKind {
    Inappropriate,
    Spam,
    Fake,
    Other,
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ReportKind::Inappropriate => "inappropriate",
            ReportKind::Spam => "spam",
            ReportKind::Fake => "fake",
            ReportKind::Other => "other",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportInput {
    #[serde(rename = "type")]
    pub kind: ReportKind,
    pub detail: String,
}

/// Outcome of a like toggle.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LikeStatus {
    #[serde(default)]
    pub liked: bool,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteSuggestion {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub user_id: String,
    pub start_location: String,
    pub end_location: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteInput {
    pub start_location: String,
    pub end_location: String,
    /// Kilometres.
    pub distance: f64,
    /// Minutes.
    pub duration: u32,
}

/// The API echoes the route it priced along with a message.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CostEstimate {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub input: Option<RouteInput>,
    #[serde(default)]
    pub cost: Option<f64>,
}

/// Id returned by create endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Created {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdminStats {
    #[serde(default)]
    pub total_users: u64,
    #[serde(default)]
    pub total_reviews: u64,
    #[serde(default)]
    pub total_routes: u64,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
}

/// Admin edit of another user's account.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateUserInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ban_reason: Option<String>,
}

impl UpdateUserInput {
    pub fn ban(reason: impl Into<String>) -> Self {
        Self {
            status: Some("banned".to_string()),
            ban_reason: Some(reason.into()),
            ..Self::default()
        }
    }

    pub fn unban() -> Self {
        Self {
            status: Some("active".to_string()),
            ..Self::default()
        }
    }
}

/// Body for creating or updating a place.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlaceInput {
    pub name: String,
    pub description: String,
    pub location_id: String,
    pub category: String,
    pub address: String,
    pub phone: String,
    pub website: String,
    pub hours: String,
    pub cover_image: String,
    pub highlights: Vec<String>,
    pub coordinates: Coordinates,
}

impl From<&Place> for PlaceInput {
    fn from(place: &Place) -> Self {
        Self {
            name: place.name.clone(),
            description: place.description.clone(),
            location_id: place.location_id.clone(),
            category: place.category.clone(),
            address: place.address.clone(),
            phone: place.phone.clone(),
            website: place.website.clone(),
            hours: place.hours.clone(),
            cover_image: place.cover_image.clone(),
            highlights: place.highlight_images.clone(),
            coordinates: place.coordinates,
        }
    }
}

// Response envelopes. The API wraps every list and single resource in a
// named field.

#[derive(Debug, Default, Deserialize)]
pub(crate) struct PlacesEnvelope {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub places: Vec<Place>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PlaceEnvelope {
    pub place: Place,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct LocationsEnvelope {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub locations: Vec<Location>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ReviewsEnvelope {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub reviews: Vec<Review>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReviewEnvelope {
    pub review: Review,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct CommentEnvelope {
    #[serde(default)]
    pub comment: Option<Comment>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SuggestionsEnvelope {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub suggestions: Vec<RouteSuggestion>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct UsersEnvelope {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub users: Vec<UserProfile>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UserEnvelope {
    pub user: UserProfile,
}

/// Lists encoded as `null` when empty decode as empty vectors.
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
