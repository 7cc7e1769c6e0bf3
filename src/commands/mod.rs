pub mod admin;
pub mod anime;
pub mod book;
pub mod movie;
pub mod prayer;
pub mod steam;

use crate::config::{DISCORD_FIELD_LIMIT, DISCORD_TITLE_LIMIT};
use crate::fetch::FetchError;
use crate::{Context, Error};
use poise::serenity_prelude as serenity;
use tracing::error;

pub(crate) const EMBED_COLOR: u32 = 0x5865F2;
pub(crate) const SUCCESS_COLOR: u32 = 0x57F287;

/// Every command registered with the framework.
pub fn all() -> Vec<poise::Command<crate::Data, Error>> {
    vec![
        anime::anime(),
        movie::movie(),
        book::book(),
        steam::steam(),
        prayer::prayer(),
        admin::cache(),
        admin::shutdown(),
    ]
}

/// Char-safe truncation with a trailing ellipsis.
pub(crate) fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut snippet: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    snippet.push_str("...");
    snippet
}

/// Titles often carry upstream names or user input of any length.
pub(crate) fn embed_title(text: &str) -> String {
    truncate(text, DISCORD_TITLE_LIMIT)
}

pub(crate) fn field_value(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        "-".to_string()
    } else {
        truncate(trimmed, DISCORD_FIELD_LIMIT)
    }
}

/// Logs an upstream failure and tells the user to retry later.
pub(crate) async fn report_fetch_error(
    ctx: Context<'_>,
    what: &str,
    err: FetchError,
) -> Result<(), Error> {
    error!("{} lookup failed for {}: {}", what, ctx.author().name, err);
    let message = match err {
        FetchError::MissingApiKey(name) => {
            format!("❌ {} lookups are not configured on this bot ({} missing).", what, name)
        }
        _ => format!("❌ Couldn't reach the {} service right now. Try again later.", what),
    };
    ctx.say(message).await?;
    Ok(())
}

pub(crate) async fn send_embed(ctx: Context<'_>, embed: serenity::CreateEmbed) -> Result<(), Error> {
    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}
