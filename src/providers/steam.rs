//! Steam storefront lookups.

use crate::fetch::{ApiClient, ApiRequest, FetchError};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

pub const BASE_URL: &str = "https://store.steampowered.com/api";
pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Deserialize)]
pub struct StoreSearch {
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub items: Vec<StoreItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreItem {
    pub id: u64,
    pub name: String,
    pub tiny_image: Option<String>,
    pub metascore: Option<String>,
    pub price: Option<StorePrice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorePrice {
    pub currency: String,
    #[serde(rename = "final")]
    pub final_cents: u64,
}

impl StoreItem {
    pub fn price_label(&self) -> String {
        match &self.price {
            Some(price) => format!(
                "{}.{:02} {}",
                price.final_cents / 100,
                price.final_cents % 100,
                price.currency
            ),
            None => "Free / unavailable".to_string(),
        }
    }

    pub fn store_url(&self) -> String {
        store_url(self.id)
    }
}

#[derive(Debug, Deserialize)]
struct AppDetailsEnvelope {
    success: bool,
    data: Option<AppDetails>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppDetails {
    pub steam_appid: u64,
    pub name: String,
    pub short_description: Option<String>,
    pub header_image: Option<String>,
    #[serde(default)]
    pub is_free: bool,
    pub price_overview: Option<PriceOverview>,
    #[serde(default)]
    pub developers: Vec<String>,
    pub release_date: Option<ReleaseDate>,
    pub metacritic: Option<Metacritic>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PriceOverview {
    pub final_formatted: String,
    #[serde(default)]
    pub discount_percent: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseDate {
    #[serde(default)]
    pub coming_soon: bool,
    pub date: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Metacritic {
    pub score: u32,
}

impl AppDetails {
    pub fn price_label(&self) -> String {
        if self.is_free {
            return "Free to play".to_string();
        }
        match &self.price_overview {
            Some(p) if p.discount_percent > 0 => {
                format!("{} (-{}%)", p.final_formatted, p.discount_percent)
            }
            Some(p) => p.final_formatted.clone(),
            None => "Unavailable".to_string(),
        }
    }

    pub fn store_url(&self) -> String {
        store_url(self.steam_appid)
    }
}

pub fn store_url(app_id: u64) -> String {
    format!("https://store.steampowered.com/app/{}", app_id)
}

pub fn search_request(term: &str) -> ApiRequest {
    ApiRequest::new("steam", BASE_URL, "/storesearch/")
        .query("term", term.trim().to_lowercase())
        .query("l", "english")
        .query("cc", "US")
}

pub fn app_details_request(app_id: u64) -> ApiRequest {
    ApiRequest::new("steam", BASE_URL, "/appdetails")
        .query("appids", app_id)
        .query("l", "english")
        .query("cc", "US")
}

pub async fn search_store(api: &ApiClient, term: &str, ttl: Duration) -> Result<StoreSearch, FetchError> {
    api.get_typed(&search_request(term), ttl).await
}

/// `None` when Steam does not know the app (it answers `success: false`).
pub async fn app_details(
    api: &ApiClient,
    app_id: u64,
    ttl: Duration,
) -> Result<Option<AppDetails>, FetchError> {
    let body: HashMap<String, AppDetailsEnvelope> =
        api.get_typed(&app_details_request(app_id), ttl).await?;
    Ok(unwrap_app_details(body, app_id))
}

fn unwrap_app_details(mut body: HashMap<String, AppDetailsEnvelope>, app_id: u64) -> Option<AppDetails> {
    body.remove(&app_id.to_string())
        .filter(|envelope| envelope.success)
        .and_then(|envelope| envelope.data)
}
