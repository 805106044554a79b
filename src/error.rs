use thiserror::Error;

/// Failure modes of the acquisition and delivery pipeline.
///
/// None of these are fatal to the process: provider misses are absorbed by the
/// chain, everything else costs at most one delivery or one command reply.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("provider '{provider}' missed: {reason}")]
    ProviderMiss { provider: String, reason: String },

    #[error("no content available")]
    NoContentAvailable,

    #[error("could not resolve channel {channel_id} in guild {guild_id}: {reason}")]
    ChannelResolution {
        guild_id: String,
        channel_id: String,
        reason: String,
    },

    #[error("delivery to channel {channel_id} failed: {reason}")]
    Delivery { channel_id: u64, reason: String },

    #[error("persistence failure: {0}")]
    Persistence(#[from] anyhow::Error),

    #[error("hour must be between 0 and 23, got {0}")]
    InvalidHour(u8),
}
