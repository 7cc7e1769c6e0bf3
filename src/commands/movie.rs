use super::{embed_title, field_value, report_fetch_error, send_embed, truncate, EMBED_COLOR};
use crate::providers::tmdb::{self, Movie};
use crate::{Context, Error};
use poise::serenity_prelude::{CreateEmbed, CreateEmbedFooter};
use tracing::info;

const MAX_RESULTS: usize = 5;

/// Search movies on TMDB
#[poise::command(slash_command)]
pub async fn movie(
    ctx: Context<'_>,
    #[description = "Movie title"] query: String,
) -> Result<(), Error> {
    let query = query.trim().to_string();
    if query.is_empty() {
        ctx.say("❌ Give me a movie title to search for.").await?;
        return Ok(());
    }
    ctx.defer().await?;
    info!("Movie search '{}' from {}", query, ctx.author().name);

    let data = ctx.data();
    let search = match tmdb::search_movies(
        &data.api,
        &query,
        data.config.tmdb_api_key.as_deref(),
        data.config.cache.ttls.movie,
    )
    .await
    {
        Ok(search) => search,
        Err(e) => return report_fetch_error(ctx, "Movie", e).await,
    };

    let Some(first) = search.results.first() else {
        ctx.say(format!("📭 No movies found for `{}`.", query)).await?;
        return Ok(());
    };

    let mut embed = CreateEmbed::new()
        .title(embed_heading(first))
        .url(first.page_url())
        .description(truncate(
            first.overview.as_deref().unwrap_or("No overview available."),
            1000,
        ))
        .color(EMBED_COLOR)
        .footer(CreateEmbedFooter::new(format!(
            "{} result(s) • Data from TMDB",
            search.total_results
        )));
    if let Some(poster) = first.poster_url() {
        embed = embed.thumbnail(poster);
    }
    if let Some(rating) = rating(first) {
        embed = embed.field("Rating", rating, true);
    }

    let others: Vec<String> = search
        .results
        .iter()
        .skip(1)
        .take(MAX_RESULTS - 1)
        .map(|m| format!("• [{}]({})", headline(m), m.page_url()))
        .collect();
    if !others.is_empty() {
        embed = embed.field("Other matches", field_value(&others.join("\n")), false);
    }

    send_embed(ctx, embed).await
}

fn headline(movie: &Movie) -> String {
    match movie.year() {
        Some(year) => format!("{} ({})", movie.title, year),
        None => movie.title.clone(),
    }
}

fn embed_heading(movie: &Movie) -> String {
    embed_title(&format!("🎬 {}", headline(movie)))
}

fn rating(movie: &Movie) -> Option<String> {
    let average = movie.vote_average.filter(|v| *v > 0.0)?;
    Some(match movie.vote_count {
        Some(count) => format!("⭐ {:.1}/10 ({} votes)", average, count),
        None => format!("⭐ {:.1}/10", average),
    })
}
