use crate::content::ContentType;
use crate::error::PipelineError;
use crate::render;
use crate::{Context, Error};

/// Get today's quote
#[poise::command(slash_command)]
pub async fn qotd(ctx: Context<'_>) -> Result<(), Error> {
    reply_with(ctx, ContentType::Quote).await
}

/// Get today's question
#[poise::command(slash_command)]
pub async fn questionoftheday(ctx: Context<'_>) -> Result<(), Error> {
    reply_with(ctx, ContentType::Question).await
}

/// Guilds get their daily record; DMs get a fresh item with no history.
async fn reply_with(ctx: Context<'_>, kind: ContentType) -> Result<(), Error> {
    ctx.defer().await?;

    let acquisition = &ctx.data().acquisition;
    let result = match ctx.guild_id() {
        Some(guild_id) => acquisition.acquire(&guild_id.to_string(), kind).await,
        None => acquisition.preview(kind).await,
    };

    match result {
        Ok(item) => {
            let embed = render::content_embed(&item, false);
            ctx.send(poise::CreateReply::default().embed(embed)).await?;
        }
        Err(PipelineError::NoContentAvailable) => {
            ctx.say(format!(
                "❌ No {} is available right now. Please try again later.",
                kind
            ))
            .await?;
        }
        Err(e) => return Err(e.into()),
    }

    Ok(())
}
