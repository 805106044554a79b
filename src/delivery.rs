use crate::content::ContentItem;
use crate::error::PipelineError;
use crate::render;
use async_trait::async_trait;
use serenity::all::{ChannelId, CreateMessage};
use serenity::http::Http;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::debug;

/// A resolved, sendable destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelHandle {
    pub guild_id: String,
    pub channel_id: u64,
    pub name: String,
}

/// Where scheduled content ends up.
#[async_trait]
pub trait DeliverySink: Send + Sync {
    async fn resolve_channel(
        &self,
        guild_id: &str,
        channel_id: &str,
    ) -> Result<ChannelHandle, PipelineError>;

    async fn send(&self, channel: &ChannelHandle, item: &ContentItem) -> Result<(), PipelineError>;
}

pub struct DiscordSink {
    http: Arc<Http>,
    timeout: Duration,
}

impl DiscordSink {
    pub fn new(http: Arc<Http>, timeout: Duration) -> Self {
        Self { http, timeout }
    }
}

#[async_trait]
impl DeliverySink for DiscordSink {
    async fn resolve_channel(
        &self,
        guild_id: &str,
        channel_id: &str,
    ) -> Result<ChannelHandle, PipelineError> {
        let fail = |reason: &str| PipelineError::ChannelResolution {
            guild_id: guild_id.to_string(),
            channel_id: channel_id.to_string(),
            reason: reason.to_string(),
        };

        let id: u64 = channel_id
            .parse()
            .ok()
            .filter(|id| *id != 0)
            .ok_or_else(|| fail("not a channel id"))?;

        let channel = timeout(self.timeout, ChannelId::new(id).to_channel(&self.http))
            .await
            .map_err(|_| fail("timed out"))?
            .map_err(|e| fail(&e.to_string()))?
            .guild()
            .ok_or_else(|| fail("not a guild channel"))?;

        if channel.guild_id.to_string() != guild_id {
            return Err(fail("channel belongs to another guild"));
        }

        debug!("Delivery: resolved #{} in guild {}", channel.name, guild_id);
        Ok(ChannelHandle {
            guild_id: guild_id.to_string(),
            channel_id: id,
            name: channel.name,
        })
    }

    async fn send(&self, channel: &ChannelHandle, item: &ContentItem) -> Result<(), PipelineError> {
        let fail = |reason: String| PipelineError::Delivery {
            channel_id: channel.channel_id,
            reason,
        };

        let message = CreateMessage::new().embed(render::content_embed(item, true));
        timeout(
            self.timeout,
            ChannelId::new(channel.channel_id).send_message(&self.http, message),
        )
        .await
        .map_err(|_| fail("timed out".to_string()))?
        .map_err(|e| fail(e.to_string()))?;

        Ok(())
    }
}
