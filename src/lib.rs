pub mod cache;
pub mod commands;
pub mod config;
pub mod fetch;
pub mod providers;

/// Custom data passed to all commands
pub struct Data {
    pub config: config::Config,
    /// Upstream client; owns the shared response cache and throttle
    pub api: fetch::ApiClient,
}

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;
