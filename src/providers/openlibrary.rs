//! Book search against OpenLibrary.

use crate::fetch::{ApiClient, ApiRequest, FetchError};
use serde::Deserialize;
use std::time::Duration;

pub const BASE_URL: &str = "https://openlibrary.org";
pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Deserialize)]
pub struct BookSearch {
    #[serde(default, rename = "numFound")]
    pub num_found: u64,
    #[serde(default)]
    pub docs: Vec<Book>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Book {
    pub key: String,
    pub title: String,
    #[serde(default)]
    pub author_name: Vec<String>,
    pub first_publish_year: Option<i32>,
    pub cover_i: Option<u64>,
    pub number_of_pages_median: Option<u32>,
    pub ratings_average: Option<f64>,
}

impl Book {
    pub fn authors(&self) -> String {
        if self.author_name.is_empty() {
            "Unknown author".to_string()
        } else {
            self.author_name.join(", ")
        }
    }

    pub fn cover_url(&self) -> Option<String> {
        self.cover_i.map(cover_url)
    }

    pub fn page_url(&self) -> String {
        format!("{}{}", BASE_URL, self.key)
    }
}

pub fn cover_url(cover_id: u64) -> String {
    format!("https://covers.openlibrary.org/b/id/{}-M.jpg", cover_id)
}

pub fn search_request(query: &str, limit: u8) -> ApiRequest {
    ApiRequest::new("book", BASE_URL, "/search.json")
        .query("q", query.trim().to_lowercase())
        .query("limit", limit)
}

pub async fn search_books(
    api: &ApiClient,
    query: &str,
    limit: u8,
    ttl: Duration,
) -> Result<BookSearch, FetchError> {
    api.get_typed(&search_request(query, limit), ttl).await
}
