//! # Travel Client
//!
//! Client library for the travel-planning site's REST API: session and
//! credential management, a retrying HTTP pipeline, typed resource clients,
//! navigation guards, form validation and list shaping.

pub mod api;
pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod listing;
pub mod models;
pub mod navigation;
pub mod validation;

#[cfg(test)]
mod test_support;

pub use client::TravelClient;
pub use config::ClientConfig;
pub use error::{ClientError, FieldErrors};
