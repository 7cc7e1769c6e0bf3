//! Movie search against The Movie Database.

use crate::fetch::{ApiClient, ApiRequest, FetchError};
use serde::Deserialize;
use std::time::Duration;

pub const BASE_URL: &str = "https://api.themoviedb.org/3";
pub const IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p/w500";
pub const DEFAULT_TTL: Duration = Duration::from_secs(6 * 60 * 60);

#[derive(Debug, Deserialize)]
pub struct MovieSearch {
    #[serde(default)]
    pub results: Vec<Movie>,
    #[serde(default)]
    pub total_results: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Movie {
    pub id: u64,
    pub title: String,
    pub overview: Option<String>,
    pub release_date: Option<String>,
    pub vote_average: Option<f64>,
    pub vote_count: Option<u64>,
    pub poster_path: Option<String>,
}

impl Movie {
    pub fn year(&self) -> Option<&str> {
        self.release_date
            .as_deref()
            .and_then(|date| date.get(..4))
            .filter(|year| year.chars().all(|c| c.is_ascii_digit()))
    }

    pub fn poster_url(&self) -> Option<String> {
        self.poster_path.as_deref().map(poster_url)
    }

    pub fn page_url(&self) -> String {
        format!("https://www.themoviedb.org/movie/{}", self.id)
    }
}

pub fn poster_url(path: &str) -> String {
    format!("{}{}", IMAGE_BASE_URL, path)
}

pub fn search_request(query: &str, api_key: Option<&str>) -> Result<ApiRequest, FetchError> {
    let api_key = api_key
        .filter(|key| !key.is_empty())
        .ok_or(FetchError::MissingApiKey("TMDB_API_KEY"))?;
    Ok(ApiRequest::new("movie", BASE_URL, "/search/movie")
        .query("query", query.trim().to_lowercase())
        .query("include_adult", "false")
        .secret_query("api_key", api_key))
}

pub async fn search_movies(
    api: &ApiClient,
    query: &str,
    api_key: Option<&str>,
    ttl: Duration,
) -> Result<MovieSearch, FetchError> {
    let request = search_request(query, api_key)?;
    api.get_typed(&request, ttl).await
}
