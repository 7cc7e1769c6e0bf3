use super::{embed_title, field_value, report_fetch_error, send_embed, truncate, EMBED_COLOR};
use crate::providers::steam::{self, AppDetails, StoreItem};
use crate::{Context, Error};
use poise::serenity_prelude::{CreateEmbed, CreateEmbedFooter};
use tracing::info;

const MAX_RESULTS: usize = 8;

/// Look up games on the Steam store
#[poise::command(slash_command, subcommands("search", "app"))]
pub async fn steam(_ctx: Context<'_>) -> Result<(), Error> {
    Ok(())
}

/// Search the Steam store
#[poise::command(slash_command)]
pub async fn search(
    ctx: Context<'_>,
    #[description = "Game name"] term: String,
) -> Result<(), Error> {
    let term = term.trim().to_string();
    if term.is_empty() {
        ctx.say("❌ Give me a game to search for.").await?;
        return Ok(());
    }
    ctx.defer().await?;
    info!("Steam search '{}' from {}", term, ctx.author().name);

    let data = ctx.data();
    let search = match steam::search_store(&data.api, &term, data.config.cache.ttls.steam).await {
        Ok(search) => search,
        Err(e) => return report_fetch_error(ctx, "Steam", e).await,
    };
    if search.items.is_empty() {
        ctx.say(format!("📭 Nothing on Steam matches `{}`.", term)).await?;
        return Ok(());
    }

    let mut embed = CreateEmbed::new()
        .title(format!("🎮 Steam results for \"{}\"", truncate(&term, 100)))
        .color(EMBED_COLOR)
        .footer(CreateEmbedFooter::new("Use /steam app <id> for details"));
    if let Some(image) = search.items.first().and_then(|item| item.tiny_image.as_deref()) {
        embed = embed.thumbnail(image);
    }
    for item in search.items.iter().take(MAX_RESULTS) {
        embed = embed.field(truncate(&item.name, 200), search_line(item), false);
    }

    send_embed(ctx, embed).await
}

/// Show details for a Steam app
#[poise::command(slash_command)]
pub async fn app(
    ctx: Context<'_>,
    #[description = "Steam app ID (from the store URL)"] app_id: u64,
) -> Result<(), Error> {
    ctx.defer().await?;
    let data = ctx.data();
    let details = match steam::app_details(&data.api, app_id, data.config.cache.ttls.steam).await {
        Ok(Some(details)) => details,
        Ok(None) => {
            ctx.say(format!("📭 Steam has no app with ID `{}`.", app_id)).await?;
            return Ok(());
        }
        Err(e) => return report_fetch_error(ctx, "Steam", e).await,
    };

    send_embed(ctx, details_embed(&details)).await
}

fn search_line(item: &StoreItem) -> String {
    let mut line = format!("{} • [Store page]({})", item.price_label(), item.store_url());
    if let Some(score) = item.metascore.as_deref().filter(|s| !s.is_empty()) {
        line.push_str(&format!(" • Metacritic {}", score));
    }
    line.push_str(&format!(" • ID `{}`", item.id));
    line
}

fn details_embed(details: &AppDetails) -> CreateEmbed {
    let mut embed = CreateEmbed::new()
        .title(embed_title(&format!("🎮 {}", details.name)))
        .url(details.store_url())
        .description(truncate(
            details.short_description.as_deref().unwrap_or("No description."),
            1000,
        ))
        .field("Price", details.price_label(), true)
        .color(EMBED_COLOR)
        .footer(CreateEmbedFooter::new(format!("App ID {}", details.steam_appid)));

    if let Some(image) = &details.header_image {
        embed = embed.image(image);
    }
    if !details.developers.is_empty() {
        embed = embed.field("Developer", field_value(&details.developers.join(", ")), true);
    }
    if let Some(release) = &details.release_date {
        let label = if release.coming_soon {
            format!("Coming soon ({})", release.date)
        } else {
            release.date.clone()
        };
        embed = embed.field("Release", field_value(&label), true);
    }
    if let Some(metacritic) = &details.metacritic {
        embed = embed.field("Metacritic", metacritic.score.to_string(), true);
    }
    embed
}
