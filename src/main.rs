use poise::serenity_prelude as serenity;
use qotd::config::Config;
use qotd::db::Database;
use qotd::delivery::DiscordSink;
use qotd::providers::ProviderChain;
use qotd::scheduler::Scheduler;
use qotd::services::acquisition::AcquisitionService;
use qotd::services::settings::SettingsService;
use qotd::{commands, Data};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;
    info!("Loaded configuration: {:?}", config);
    let discord_token = config.discord_token.clone();
    let application_id = config.application_id;

    let db = Database::new(&config)?;
    db.execute_init()?;

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: commands::all(),
            ..Default::default()
        })
        .setup(move |ctx, _ready, framework| {
            Box::pin(async move {
                info!("Bot is ready!");
                if config.register_commands {
                    match config.dev_guild_id {
                        Some(guild_id) => {
                            poise::builtins::register_in_guild(
                                ctx,
                                &framework.options().commands,
                                serenity::GuildId::new(guild_id),
                            )
                            .await?;
                            info!("Registered commands in guild {}", guild_id);
                        }
                        None => {
                            poise::builtins::register_globally(ctx, &framework.options().commands)
                                .await?;
                            info!("Registered commands globally");
                        }
                    }
                }

                ctx.set_activity(Some(serenity::ActivityData::custom(&config.status_message)));

                let http_client = reqwest::Client::builder()
                    .timeout(config.request_timeout)
                    .build()?;
                let chain = ProviderChain::with_defaults(http_client, &config);
                let acquisition = Arc::new(AcquisitionService::new(
                    db.clone(),
                    Arc::new(chain),
                    config.dedup_max_attempts,
                ));

                let sink = DiscordSink::new(ctx.http.clone(), config.request_timeout);
                let scheduler = Arc::new(Scheduler::new(acquisition.clone(), Arc::new(sink)));
                let configured = SettingsService::new(db.clone()).all().await?;
                scheduler.start(&configured);

                Ok(Data {
                    db,
                    acquisition,
                    scheduler,
                })
            })
        })
        .build();

    let intents = serenity::GatewayIntents::GUILDS;

    let mut client = serenity::ClientBuilder::new(&discord_token, intents)
        .application_id(serenity::ApplicationId::new(application_id))
        .framework(framework)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create client: {}", e))?;

    info!("Starting bot...");
    if let Err(why) = client.start().await {
        error!("Client error: {:?}", why);
    }

    Ok(())
}
