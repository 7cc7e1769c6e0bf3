use super::{embed_title, field_value, report_fetch_error, send_embed, truncate, EMBED_COLOR};
use crate::providers::jikan::{self, Anime};
use crate::{Context, Error};
use poise::serenity_prelude::{CreateEmbed, CreateEmbedFooter};
use tracing::info;

const DEFAULT_RESULTS: u8 = 5;

/// Look up anime on MyAnimeList
#[poise::command(slash_command, subcommands("search", "top"))]
pub async fn anime(_ctx: Context<'_>) -> Result<(), Error> {
    Ok(())
}

/// Search anime by title
#[poise::command(slash_command)]
pub async fn search(
    ctx: Context<'_>,
    #[description = "Anime title"] query: String,
    #[description = "Max results (default 5)"]
    #[min = 1]
    #[max = 10]
    limit: Option<u8>,
) -> Result<(), Error> {
    let query = query.trim().to_string();
    if query.is_empty() {
        ctx.say("❌ Give me something to search for.").await?;
        return Ok(());
    }
    ctx.defer().await?;
    info!("Anime search '{}' from {}", query, ctx.author().name);

    let data = ctx.data();
    let limit = limit.unwrap_or(DEFAULT_RESULTS).clamp(1, 10);
    match jikan::search_anime(&data.api, &query, limit, data.config.cache.ttls.anime).await {
        Ok(results) if results.is_empty() => {
            ctx.say(format!("📭 No anime found for `{}`.", query)).await?;
        }
        Ok(results) => {
            send_embed(ctx, results_embed(&format!("🔎 Anime results for \"{}\"", query), &results)).await?;
        }
        Err(e) => report_fetch_error(ctx, "Anime", e).await?,
    }
    Ok(())
}

/// Show the current top-rated anime
#[poise::command(slash_command)]
pub async fn top(
    ctx: Context<'_>,
    #[description = "How many to show (default 5)"]
    #[min = 1]
    #[max = 10]
    limit: Option<u8>,
) -> Result<(), Error> {
    ctx.defer().await?;
    let data = ctx.data();
    let limit = limit.unwrap_or(DEFAULT_RESULTS).clamp(1, 10);
    match jikan::top_anime(&data.api, limit, data.config.cache.ttls.anime).await {
        Ok(results) if results.is_empty() => {
            ctx.say("📭 MyAnimeList returned no rankings.").await?;
        }
        Ok(results) => send_embed(ctx, results_embed("🏆 Top anime", &results)).await?,
        Err(e) => report_fetch_error(ctx, "Anime", e).await?,
    }
    Ok(())
}

fn results_embed(title: &str, results: &[Anime]) -> CreateEmbed {
    let mut embed = CreateEmbed::new()
        .title(embed_title(title))
        .color(EMBED_COLOR)
        .footer(CreateEmbedFooter::new("Data from MyAnimeList via Jikan"));

    if let Some(first) = results.first() {
        if let Some(image) = first.image_url() {
            embed = embed.thumbnail(image);
        }
        if !first.url.is_empty() {
            embed = embed.url(first.url.as_str());
        }
    }

    for (i, anime) in results.iter().enumerate() {
        embed = embed.field(
            format!("{}. {}", i + 1, truncate(anime.display_title(), 200)),
            field_value(&describe(anime)),
            false,
        );
    }
    embed
}

/// Stats line followed by a synopsis snippet.
fn describe(anime: &Anime) -> String {
    let mut stats = Vec::new();
    if let Some(score) = anime.score {
        stats.push(format!("⭐ {:.2}", score));
    }
    if let Some(episodes) = anime.episodes {
        stats.push(format!("{} eps", episodes));
    }
    if let Some(year) = anime.year {
        stats.push(year.to_string());
    }
    if let Some(status) = &anime.status {
        stats.push(status.clone());
    }
    let genres = anime.genre_names();
    if !genres.is_empty() {
        stats.push(genres);
    }

    let synopsis = anime
        .synopsis
        .as_deref()
        .map(|s| truncate(s.trim(), 200))
        .unwrap_or_default();

    match (stats.is_empty(), synopsis.is_empty()) {
        (true, _) => synopsis,
        (false, true) => stats.join(" • "),
        (false, false) => format!("{}\n{}", stats.join(" • "), synopsis),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_describe_full_and_sparse_entries() {
        let full: Anime = serde_json::from_value(json!({
            "mal_id": 52991,
            "title": "Sousou no Frieren",
            "title_english": "Frieren: Beyond Journey's End",
            "synopsis": "The adventure is over but life goes on.",
            "score": 9.3,
            "episodes": 28,
            "status": "Finished Airing",
            "year": 2023,
            "genres": [{"name": "Adventure"}, {"name": "Drama"}]
        }))
        .unwrap();
        assert_eq!(
            describe(&full),
            "⭐ 9.30 • 28 eps • 2023 • Finished Airing • Adventure, Drama\nThe adventure is over but life goes on."
        );

        let sparse: Anime =
            serde_json::from_value(json!({"mal_id": 1, "title": "Unknown"})).unwrap();
        assert_eq!(describe(&sparse), "");
        assert_eq!(field_value(&describe(&sparse)), "-");
    }
}
