//! Client-side filtering and ordering of place and review lists.

use std::cmp::Reverse;
use std::str::FromStr;

use crate::models::{Place, Review};

pub const ALL_CATEGORIES: &str = "all";

/// Filter applied to the places page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaceFilter {
    pub search: String,
    /// `None` or `"all"` matches every category.
    pub category: Option<String>,
    /// 0 disables the rating filter.
    pub min_rating: f64,
}

impl PlaceFilter {
    /// Text search is case-insensitive over name, description and location.
    pub fn matches(&self, place: &Place) -> bool {
        let needle = self.search.trim().to_lowercase();
        let text_ok = needle.is_empty()
            || place.name.to_lowercase().contains(&needle)
            || place.description.to_lowercase().contains(&needle)
            || place
                .location_name
                .as_deref()
                .is_some_and(|l| l.to_lowercase().contains(&needle));

        let category_ok = match self.category.as_deref() {
            None | Some(ALL_CATEGORIES) => true,
            Some(category) => place.category == category,
        };

        let rating_ok = self.min_rating <= 0.0 || place.rating >= self.min_rating;

        text_ok && category_ok && rating_ok
    }

    pub fn apply<'a>(&self, places: &'a [Place]) -> Vec<&'a Place> {
        places.iter().filter(|p| self.matches(p)).collect()
    }
}

/// `"all"` followed by each distinct non-empty category, in first-seen order.
pub fn categories(places: &[Place]) -> Vec<String> {
    let mut out = vec![ALL_CATEGORIES.to_string()];
    for place in places {
        let category = place.category.trim();
        if !category.is_empty() && category != "-" && !out.iter().any(|c| c == category) {
            out.push(category.to_string());
        }
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReviewSort {
    #[default]
    Newest,
    Oldest,
    Highest,
    Lowest,
}

impl FromStr for ReviewSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "newest" => Ok(ReviewSort::Newest),
            "oldest" => Ok(ReviewSort::Oldest),
            "highest" => Ok(ReviewSort::Highest),
            "lowest" => Ok(ReviewSort::Lowest),
            other => Err(format!("unknown sort option: {other}")),
        }
    }
}

/// Review list controls: exact star filter, text search and ordering.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReviewFilter {
    pub stars: Option<u8>,
    pub search: String,
    pub sort: ReviewSort,
}

impl ReviewFilter {
    /// Selecting the active star count again clears the star filter.
    pub fn toggle_stars(&mut self, stars: u8) {
        self.stars = if self.stars == Some(stars) { None } else { Some(stars) };
    }

    fn matches(&self, review: &Review) -> bool {
        if self.stars.is_some_and(|s| review.rating != s) {
            return false;
        }
        let needle = self.search.trim().to_lowercase();
        needle.is_empty()
            || review.comment.to_lowercase().contains(&needle)
            || review.username.to_lowercase().contains(&needle)
            || review.display_place_name().to_lowercase().contains(&needle)
    }

    pub fn apply(&self, reviews: &[Review]) -> Vec<Review> {
        let mut out: Vec<Review> = reviews.iter().filter(|r| self.matches(r)).cloned().collect();
        // Stable sorts keep API order among ties.
        match self.sort {
            ReviewSort::Newest => out.sort_by_key(|r| Reverse(r.created_at)),
            ReviewSort::Oldest => out.sort_by_key(|r| r.created_at),
            ReviewSort::Highest => out.sort_by_key(|r| Reverse(r.rating)),
            ReviewSort::Lowest => out.sort_by_key(|r| r.rating),
        }
        out
    }
}

/// Mean rating, or `None` for an empty list.
pub fn average_rating(reviews: &[Review]) -> Option<f64> {
    if reviews.is_empty() {
        return None;
    }
    let total: u32 = reviews.iter().map(|r| u32::from(r.rating)).sum();
    Some(f64::from(total) / reviews.len() as f64)
}
