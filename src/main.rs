use kurator::cache::{sweeper, ResponseCache};
use kurator::fetch::{ApiClient, Throttle};
use kurator::{commands, config::Config, Data};
use poise::serenity_prelude as serenity;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!("Loaded configuration: {:?}", config);
    let discord_token = config.discord_token.clone();

    let cache = ResponseCache::from_config(&config.cache).await?;
    let sweeper = sweeper::spawn_sweeper(
        cache.clone(),
        config.cache.sweep_interval,
        config.cache.ttls.longest(),
    );

    let http_client = reqwest::Client::builder()
        .timeout(config.http_timeout)
        .user_agent(concat!("kurator/", env!("CARGO_PKG_VERSION")))
        .build()?;
    let api = ApiClient::new(http_client, cache, Throttle::new(config.jikan_min_spacing));

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: commands::all(),
            ..Default::default()
        })
        .setup(|ctx, _ready, framework| {
            Box::pin(async move {
                info!("Bot is ready!");
                match config.dev_guild_id {
                    Some(guild_id) => {
                        info!("Registering commands in dev guild {}", guild_id);
                        poise::builtins::register_in_guild(
                            ctx,
                            &framework.options().commands,
                            serenity::GuildId::new(guild_id),
                        )
                        .await?;
                    }
                    None => {
                        poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                    }
                }

                // Set bot status
                ctx.set_activity(Some(serenity::ActivityData::custom(&config.status_message)));

                Ok(Data { config, api })
            })
        })
        .build();

    let intents = serenity::GatewayIntents::non_privileged();

    let mut client = serenity::ClientBuilder::new(&discord_token, intents)
        .framework(framework)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create client: {}", e))?;

    info!("Starting bot...");
    if let Err(why) = client.start().await {
        error!("Client error: {:?}", why);
    }

    sweeper.abort();
    info!("Bot stopped");
    Ok(())
}
