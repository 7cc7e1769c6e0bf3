use super::{field_value, report_fetch_error, send_embed, truncate, EMBED_COLOR};
use crate::providers::openlibrary::{self, Book};
use crate::{Context, Error};
use poise::serenity_prelude::{CreateEmbed, CreateEmbedFooter};
use tracing::info;

/// Search books on OpenLibrary
#[poise::command(slash_command)]
pub async fn book(
    ctx: Context<'_>,
    #[description = "Title, author or ISBN"] query: String,
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
    info!("Book search '{}' from {}", query, ctx.author().name);

    let data = ctx.data();
    let limit = limit.unwrap_or(5).clamp(1, 10);
    let search = match openlibrary::search_books(&data.api, &query, limit, data.config.cache.ttls.book).await {
        Ok(search) => search,
        Err(e) => return report_fetch_error(ctx, "Book", e).await,
    };

    if search.docs.is_empty() {
        ctx.say(format!("📭 No books found for `{}`.", query)).await?;
        return Ok(());
    }

    let mut embed = CreateEmbed::new()
        .title(format!("📚 Books matching \"{}\"", truncate(&query, 100)))
        .color(EMBED_COLOR)
        .footer(CreateEmbedFooter::new(format!(
            "{} match(es) • Data from OpenLibrary",
            search.num_found
        )));
    if let Some(cover) = search.docs.first().and_then(Book::cover_url) {
        embed = embed.thumbnail(cover);
    }
    for book in &search.docs {
        embed = embed.field(truncate(&book.title, 200), field_value(&describe(book)), false);
    }

    send_embed(ctx, embed).await
}

fn describe(book: &Book) -> String {
    let mut parts = vec![book.authors()];
    if let Some(year) = book.first_publish_year {
        parts.push(format!("first published {}", year));
    }
    if let Some(pages) = book.number_of_pages_median {
        parts.push(format!("{} pages", pages));
    }
    if let Some(rating) = book.ratings_average {
        parts.push(format!("⭐ {:.1}", rating));
    }
    format!("{}\n[Open Library]({})", parts.join(" • "), book.page_url())
}
