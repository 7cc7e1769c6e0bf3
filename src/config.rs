use crate::cache::CacheBackend;
use crate::providers::{aladhan, jikan, openlibrary, steam, tmdb};
use dotenvy::dotenv;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

const TTL_FILE: &str = "cache_ttl.toml";

#[derive(Clone)]
pub struct Config {
    pub discord_token: String,
    pub owner_id: Option<u64>,
    pub status_message: String,
    pub dev_guild_id: Option<u64>,
    pub tmdb_api_key: Option<String>,
    pub http_timeout: Duration,
    pub jikan_min_spacing: Duration,
    pub cache: CacheConfig,
}

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub backend: CacheBackend,
    pub dir: PathBuf,
    pub sweep_interval: Duration,
    pub ttls: CacheTtls,
}

/// How long each content domain's responses stay fresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheTtls {
    pub anime: Duration,
    pub movie: Duration,
    pub book: Duration,
    pub steam: Duration,
    pub prayer: Duration,
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self {
            anime: jikan::DEFAULT_TTL,
            movie: tmdb::DEFAULT_TTL,
            book: openlibrary::DEFAULT_TTL,
            steam: steam::DEFAULT_TTL,
            prayer: aladhan::DEFAULT_TTL,
        }
    }
}

/// `cache_ttl.toml` layout; values are humantime strings such as `"30m"`.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct TtlOverrides {
    anime: Option<String>,
    movie: Option<String>,
    book: Option<String>,
    steam: Option<String>,
    prayer: Option<String>,
}

impl CacheTtls {
    /// The sweeper uses this so nothing still fresh for some domain is deleted.
    pub fn longest(&self) -> Duration {
        [self.anime, self.movie, self.book, self.steam, self.prayer]
            .into_iter()
            .max()
            .unwrap_or_default()
    }

    fn slots(&mut self) -> [(&'static str, &mut Duration); 5] {
        [
            ("ANIME", &mut self.anime),
            ("MOVIE", &mut self.movie),
            ("BOOK", &mut self.book),
            ("STEAM", &mut self.steam),
            ("PRAYER", &mut self.prayer),
        ]
    }

    /// Applies a `cache_ttl.toml` document on top of the current values.
    pub fn apply_toml(&mut self, content: &str) -> anyhow::Result<()> {
        let overrides: TtlOverrides = toml::from_str(content)?;
        let values = [
            overrides.anime,
            overrides.movie,
            overrides.book,
            overrides.steam,
            overrides.prayer,
        ];
        for ((name, slot), value) in self.slots().into_iter().zip(values) {
            if let Some(value) = value {
                *slot = parse_duration(&value).map_err(|e| {
                    anyhow::anyhow!("Invalid {} TTL '{}': {}", name.to_lowercase(), value, e)
                })?;
            }
        }
        Ok(())
    }

    fn apply_env(&mut self) {
        for (name, slot) in self.slots() {
            *slot = env_duration(&format!("{}_CACHE_TTL", name), *slot);
        }
    }

    pub fn load(path: &Path) -> Self {
        let mut ttls = Self::default();
        if let Ok(content) = fs::read_to_string(path) {
            let mut from_file = ttls.clone();
            match from_file.apply_toml(&content) {
                Ok(()) => ttls = from_file,
                Err(e) => warn!("Ignoring {}: {}", path.display(), e),
            }
        }
        ttls.apply_env();
        ttls
    }
}

fn parse_duration(value: &str) -> Result<Duration, humantime::DurationError> {
    humantime::parse_duration(value.trim())
}

/// Reads a humantime duration (`"90s"`, `"1h 30m"`) from the environment,
/// keeping `default` when unset or malformed.
fn env_duration(name: &str, default: Duration) -> Duration {
    match env::var(name) {
        Ok(raw) => match parse_duration(&raw) {
            Ok(duration) => duration,
            Err(e) => {
                warn!("{}='{}' is not a valid duration ({}), using {:?}", name, raw, e, default);
                default
            }
        },
        Err(_) => default,
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv().ok();
        Self::build()
    }

    fn build() -> anyhow::Result<Self> {
        Ok(Config {
            discord_token: env::var("DISCORD_TOKEN")
                .map_err(|_| anyhow::anyhow!("DISCORD_TOKEN must be set"))?,
            owner_id: env::var("OWNER_ID").ok().and_then(|id| id.parse().ok()),
            status_message: env::var("STATUS_MESSAGE")
                .unwrap_or_else(|_| "Looking things up".to_string()),
            dev_guild_id: env::var("DEV_GUILD_ID").ok().and_then(|id| id.parse().ok()),
            tmdb_api_key: env::var("TMDB_API_KEY").ok().filter(|key| !key.is_empty()),
            http_timeout: env_duration("HTTP_TIMEOUT", Duration::from_secs(15)),
            jikan_min_spacing: env_duration("JIKAN_MIN_SPACING", Duration::from_secs(1)),
            cache: CacheConfig {
                backend: env::var("CACHE_BACKEND")
                    .unwrap_or_else(|_| "disk".to_string())
                    .parse()?,
                dir: env::var("CACHE_DIR")
                    .unwrap_or_else(|_| "data/cache".to_string())
                    .into(),
                sweep_interval: env_duration("CACHE_SWEEP_INTERVAL", Duration::from_secs(60 * 60)),
                ttls: CacheTtls::load(Path::new(TTL_FILE)),
            },
        })
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("discord_token", &"[REDACTED]")
            .field("owner_id", &self.owner_id)
            .field("status_message", &self.status_message)
            .field("dev_guild_id", &self.dev_guild_id)
            .field(
                "tmdb_api_key",
                &self.tmdb_api_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field("http_timeout", &self.http_timeout)
            .field("jikan_min_spacing", &self.jikan_min_spacing)
            .field("cache", &self.cache)
            .finish()
    }
}

/// Embed field values are capped at 1024 characters
pub const DISCORD_FIELD_LIMIT: usize = 1024;
/// Embed titles are capped at 256 characters
pub const DISCORD_TITLE_LIMIT: usize = 256;
