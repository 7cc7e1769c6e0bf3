use super::{send_embed, EMBED_COLOR, SUCCESS_COLOR};
use crate::cache::CacheStats;
use crate::{Context, Error};
use poise::serenity_prelude as serenity;
use tracing::info;

/// Shut down the bot (owner only)
#[poise::command(slash_command, check = "is_owner", hide_in_help)]
pub async fn shutdown(ctx: Context<'_>) -> Result<(), Error> {
    let stats = ctx.data().api.cache().stats().await;
    info!(
        "Shutdown requested by {} ({} cached entries, {})",
        ctx.author().name,
        stats.entries,
        hit_rate_label(&stats)
    );
    ctx.say("👋 Shutting down...").await?;
    ctx.framework().shard_manager().shutdown_all().await;
    Ok(())
}

/// Inspect or reset the response cache (owner only)
#[poise::command(slash_command, subcommands("stats", "clear"), check = "is_owner", hide_in_help)]
pub async fn cache(_ctx: Context<'_>) -> Result<(), Error> {
    Ok(())
}

async fn is_owner(ctx: Context<'_>) -> Result<bool, Error> {
    if let Some(owner_id) = ctx.data().config.owner_id {
        if ctx.author().id == serenity::UserId::new(owner_id) {
            return Ok(true);
        }
    }

    ctx.say("❌ Only the bot owner can use this command.").await?;
    Ok(false)
}

/// Show cache size and hit rate
#[poise::command(slash_command)]
pub async fn stats(ctx: Context<'_>) -> Result<(), Error> {
    let stats = ctx.data().api.cache().stats().await;
    let ttls = &ctx.data().config.cache.ttls;

    let embed = serenity::CreateEmbed::new()
        .title("🗄️ Response Cache")
        .field("Backend", format!("`{}`", stats.backend), true)
        .field("Entries", stats.entries.to_string(), true)
        .field("Hit rate", hit_rate_label(&stats), true)
        .field(
            "TTLs",
            format!(
                "anime `{}` • movie `{}` • book `{}` • steam `{}` • prayer `{}`",
                humantime::format_duration(ttls.anime),
                humantime::format_duration(ttls.movie),
                humantime::format_duration(ttls.book),
                humantime::format_duration(ttls.steam),
                humantime::format_duration(ttls.prayer),
            ),
            false,
        )
        .color(EMBED_COLOR);

    send_embed(ctx, embed).await
}

/// Drop every cached response
#[poise::command(slash_command)]
pub async fn clear(ctx: Context<'_>) -> Result<(), Error> {
    ctx.defer().await?;
    let removed = ctx.data().api.cache().clear().await;
    info!("Cache cleared by {}: {} entries removed", ctx.author().name, removed);

    let embed = serenity::CreateEmbed::new()
        .title("🧹 Cache cleared")
        .description(format!("Removed `{}` entries.", removed))
        .color(SUCCESS_COLOR);
    send_embed(ctx, embed).await
}

fn hit_rate_label(stats: &CacheStats) -> String {
    match stats.hit_rate() {
        Some(rate) => format!(
            "{:.1}% ({} hits / {} misses)",
            rate * 100.0,
            stats.hits,
            stats.misses
        ),
        None => "no lookups yet".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheBackend;

    #[test]
    fn test_hit_rate_label() {
        let mut stats = CacheStats {
            backend: CacheBackend::Disk,
            entries: 3,
            hits: 0,
            misses: 0,
        };
        assert_eq!(hit_rate_label(&stats), "no lookups yet");

        stats.hits = 3;
        stats.misses = 1;
        assert_eq!(hit_rate_label(&stats), "75.0% (3 hits / 1 misses)");
    }
}
