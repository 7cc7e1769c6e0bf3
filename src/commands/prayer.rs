use super::{embed_title, report_fetch_error, send_embed, EMBED_COLOR};
use crate::providers::aladhan::{self, DEFAULT_METHOD};
use crate::{Context, Error};
use chrono::Utc;
use poise::serenity_prelude::{CreateEmbed, CreateEmbedFooter};
use tracing::info;

/// Today's prayer times for a city
#[poise::command(slash_command)]
pub async fn prayer(
    ctx: Context<'_>,
    #[description = "City, e.g. Cairo"] city: String,
    #[description = "Country, e.g. Egypt"] country: String,
    #[description = "Calculation method ID (default 2, ISNA)"]
    #[min = 0]
    #[max = 23]
    method: Option<u8>,
) -> Result<(), Error> {
    let (city, country) = (city.trim().to_string(), country.trim().to_string());
    if city.is_empty() || country.is_empty() {
        ctx.say("❌ Both city and country are required.").await?;
        return Ok(());
    }
    ctx.defer().await?;
    info!("Prayer times for {}, {} from {}", city, country, ctx.author().name);

    let data = ctx.data();
    let today = Utc::now().date_naive();
    let method = method.unwrap_or(DEFAULT_METHOD);
    let day = match aladhan::timings_by_city(
        &data.api,
        &city,
        &country,
        method,
        today,
        data.config.cache.ttls.prayer,
    )
    .await
    {
        Ok(day) => day,
        Err(e) => return report_fetch_error(ctx, "Prayer times", e).await,
    };

    let mut embed = CreateEmbed::new()
        .title(embed_title(&format!("🕌 Prayer times for {}, {}", city, country)))
        .description(format!("{} • {}", day.date.readable, day.meta.timezone))
        .color(EMBED_COLOR)
        .footer(CreateEmbedFooter::new(format!("Method {} • Data from AlAdhan", method)));
    for (name, time) in day.timings.as_pairs() {
        embed = embed.field(name, format!("`{}`", time), true);
    }

    send_embed(ctx, embed).await
}
