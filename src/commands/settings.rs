use crate::db::{GuildSettings, SettingsUpdate, DEFAULT_QUESTION_HOUR, DEFAULT_QUOTE_HOUR};
use crate::error::PipelineError;
use crate::services::settings::SettingsService;
use crate::{Context, Error};
use poise::serenity_prelude as serenity;
use tracing::info;

/// Set the channel for the daily quote
#[poise::command(slash_command, guild_only)]
pub async fn setqotdchannel(
    ctx: Context<'_>,
    #[description = "Channel that receives the daily quote"]
    #[channel_types("Text", "News")]
    channel: serenity::GuildChannel,
) -> Result<(), Error> {
    let update = SettingsUpdate {
        quote_channel_id: Some(channel.id.to_string()),
        ..Default::default()
    };
    apply(ctx, update, format!("Daily quotes will be posted in <#{}>.", channel.id)).await
}

/// Set the hour (UTC) for the daily quote
#[poise::command(slash_command, guild_only)]
pub async fn setqotdhour(
    ctx: Context<'_>,
    #[description = "Hour of the day in UTC"]
    #[min = 0] #[max = 23]
    hour: u8,
) -> Result<(), Error> {
    let update = SettingsUpdate {
        quote_hour: Some(hour),
        ..Default::default()
    };
    apply(ctx, update, format!("Daily quotes will be posted at **{:02}:00 UTC**.", hour)).await
}

/// Set the channel for the daily question
#[poise::command(slash_command, guild_only)]
pub async fn setquestionchannel(
    ctx: Context<'_>,
    #[description = "Channel that receives the daily question"]
    #[channel_types("Text", "News")]
    channel: serenity::GuildChannel,
) -> Result<(), Error> {
    let update = SettingsUpdate {
        question_channel_id: Some(channel.id.to_string()),
        ..Default::default()
    };
    apply(ctx, update, format!("Daily questions will be posted in <#{}>.", channel.id)).await
}

/// Set the hour (UTC) for the daily question
#[poise::command(slash_command, guild_only)]
pub async fn setquestionhour(
    ctx: Context<'_>,
    #[description = "Hour of the day in UTC"]
    #[min = 0] #[max = 23]
    hour: u8,
) -> Result<(), Error> {
    let update = SettingsUpdate {
        question_hour: Some(hour),
        ..Default::default()
    };
    apply(ctx, update, format!("Daily questions will be posted at **{:02}:00 UTC**.", hour)).await
}

/// Show this server's daily content settings
#[poise::command(slash_command, guild_only)]
pub async fn qotdsettings(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be run in a guild")?;

    let stored = SettingsService::new(ctx.data().db.clone())
        .get(guild_id.get())
        .await?;
    let source = if stored.is_some() {
        "Server Custom Settings"
    } else {
        "Default Configuration"
    };
    let settings = stored.unwrap_or_else(|| GuildSettings {
        guild_id: guild_id.to_string(),
        quote_channel_id: None,
        quote_hour: DEFAULT_QUOTE_HOUR,
        question_channel_id: None,
        question_hour: DEFAULT_QUESTION_HOUR,
    });
    let active = ctx.data().scheduler.registered(&settings.guild_id).len();

    let embed = serenity::CreateEmbed::new()
        .title("📅 Daily Content Settings")
        .field("Quote Channel", channel_mention(&settings.quote_channel_id), true)
        .field("Quote Time", format!("`{:02}:00 UTC`", settings.quote_hour), true)
        .field("\u{200b}", "\u{200b}", true)
        .field("Question Channel", channel_mention(&settings.question_channel_id), true)
        .field("Question Time", format!("`{:02}:00 UTC`", settings.question_hour), true)
        .field("Active Schedules", active.to_string(), true)
        .footer(serenity::CreateEmbedFooter::new(source))
        .color(0x5865F2);

    ctx.send(poise::CreateReply::default().embed(embed).ephemeral(true))
        .await?;
    Ok(())
}

fn channel_mention(channel_id: &Option<String>) -> String {
    match channel_id {
        Some(id) => format!("<#{}>", id),
        None => "Not set".to_string(),
    }
}

/// Saves a partial update, then reschedules the guild with the merged result.
async fn apply(ctx: Context<'_>, update: SettingsUpdate, confirmation: String) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be run in a guild")?;

    let merged = match SettingsService::new(ctx.data().db.clone())
        .update(guild_id.get(), update)
        .await
    {
        Ok(merged) => merged,
        Err(PipelineError::InvalidHour(hour)) => {
            ctx.send(
                poise::CreateReply::default()
                    .content(format!("❌ Hour must be between 0 and 23, got {}.", hour))
                    .ephemeral(true),
            )
            .await?;
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let active = ctx.data().scheduler.register(&merged);
    info!(
        "Settings: guild {} updated by {}, {} trigger(s) active",
        guild_id,
        ctx.author().name,
        active
    );

    ctx.send(
        poise::CreateReply::default()
            .content(format!("✅ {}", confirmation))
            .ephemeral(true),
    )
    .await?;
    Ok(())
}
