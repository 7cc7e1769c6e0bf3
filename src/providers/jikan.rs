//! Anime lookups against the Jikan (MyAnimeList) API.
//!
//! Jikan enforces a few requests per second, so every request goes through
//! the shared throttle.

use crate::fetch::{ApiClient, ApiRequest, FetchError};
use serde::Deserialize;
use std::time::Duration;

pub const BASE_URL: &str = "https://api.jikan.moe/v4";
pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Deserialize)]
pub struct AnimeList {
    #[serde(default)]
    pub data: Vec<Anime>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Anime {
    pub mal_id: u64,
    #[serde(default)]
    pub url: String,
    pub title: String,
    pub title_english: Option<String>,
    pub synopsis: Option<String>,
    pub score: Option<f64>,
    pub episodes: Option<u32>,
    pub status: Option<String>,
    pub year: Option<i32>,
    #[serde(default)]
    pub genres: Vec<Genre>,
    pub images: Option<Images>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Genre {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Images {
    pub jpg: Option<ImageSet>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImageSet {
    pub image_url: Option<String>,
    pub large_image_url: Option<String>,
}

impl Anime {
    pub fn display_title(&self) -> &str {
        match &self.title_english {
            Some(english) if !english.trim().is_empty() && english != &self.title => english,
            _ => &self.title,
        }
    }

    pub fn image_url(&self) -> Option<&str> {
        let jpg = self.images.as_ref()?.jpg.as_ref()?;
        jpg.large_image_url
            .as_deref()
            .or(jpg.image_url.as_deref())
    }

    pub fn genre_names(&self) -> String {
        self.genres
            .iter()
            .map(|g| g.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

pub fn search_request(query: &str, limit: u8) -> ApiRequest {
    ApiRequest::new("anime", BASE_URL, "/anime")
        .query("q", query.trim().to_lowercase())
        .query("limit", limit)
        .query("sfw", "true")
        .rate_limited()
}

pub fn top_request(limit: u8) -> ApiRequest {
    ApiRequest::new("anime", BASE_URL, "/top/anime")
        .query("limit", limit)
        .rate_limited()
}

pub async fn search_anime(
    api: &ApiClient,
    query: &str,
    limit: u8,
    ttl: Duration,
) -> Result<Vec<Anime>, FetchError> {
    let list: AnimeList = api.get_typed(&search_request(query, limit), ttl).await?;
    Ok(list.data)
}

pub async fn top_anime(api: &ApiClient, limit: u8, ttl: Duration) -> Result<Vec<Anime>, FetchError> {
    let list: AnimeList = api.get_typed(&top_request(limit), ttl).await?;
    Ok(list.data)
}
