//! Upstream content APIs. Every lookup goes through [`crate::fetch::ApiClient`].

pub mod aladhan;
pub mod jikan;
pub mod openlibrary;
pub mod steam;
pub mod tmdb;
