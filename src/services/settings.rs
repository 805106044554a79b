use crate::db::{Database, GuildSettings, SettingsUpdate};
use crate::error::PipelineError;

pub struct SettingsService {
    db: Database,
}

impl SettingsService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn get(&self, guild_id: u64) -> Result<Option<GuildSettings>, PipelineError> {
        let guild_id = guild_id.to_string();
        let settings = self
            .db
            .run_blocking(move |db| db.get_guild_settings(&guild_id))
            .await?;
        Ok(settings)
    }

    /// Merges `update` into the stored settings and returns the result.
    pub async fn update(
        &self,
        guild_id: u64,
        update: SettingsUpdate,
    ) -> Result<GuildSettings, PipelineError> {
        for hour in [update.quote_hour, update.question_hour].into_iter().flatten() {
            if hour > 23 {
                return Err(PipelineError::InvalidHour(hour));
            }
        }

        let guild_id = guild_id.to_string();
        let settings = self
            .db
            .run_blocking(move |db| {
                db.set_guild_settings(&guild_id, &update)?;
                db.get_guild_settings(&guild_id)?
                    .ok_or_else(|| anyhow::anyhow!("Settings for guild {} vanished after write", guild_id))
            })
            .await?;
        Ok(settings)
    }

    pub async fn all(&self) -> Result<Vec<GuildSettings>, PipelineError> {
        let settings = self.db.run_blocking(|db| db.all_guild_settings()).await?;
        Ok(settings)
    }
}
