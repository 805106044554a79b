use crate::content::{ContentItem, ContentType};
use crate::db::Database;
use crate::error::PipelineError;
use crate::providers::ContentSource;
use chrono::{NaiveDate, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const DEFAULT_MAX_ATTEMPTS: usize = 5;

/// Decides what a guild gets for a content type on a given day.
///
/// The first acquisition of a UTC day fetches a candidate that differs from the
/// guild's most recent item (bounded by `max_attempts`) and commits it. Every
/// later acquisition that day returns the committed item unchanged.
pub struct AcquisitionService {
    db: Database,
    source: Arc<dyn ContentSource>,
    max_attempts: usize,
}

impl AcquisitionService {
    pub fn new(db: Database, source: Arc<dyn ContentSource>, max_attempts: usize) -> Self {
        Self {
            db,
            source,
            max_attempts: max_attempts.max(1),
        }
    }

    pub async fn acquire(
        &self,
        guild_id: &str,
        kind: ContentType,
    ) -> Result<ContentItem, PipelineError> {
        self.acquire_on(guild_id, kind, Utc::now().date_naive()).await
    }

    pub async fn acquire_on(
        &self,
        guild_id: &str,
        kind: ContentType,
        today: NaiveDate,
    ) -> Result<ContentItem, PipelineError> {
        if let Some(existing) = self.record_for(guild_id, kind, today).await? {
            debug!("Acquisition: replaying {} for guild {} on {}", kind, guild_id, today);
            return Ok(existing);
        }

        let last = {
            let guild_id = guild_id.to_string();
            self.db
                .run_blocking(move |db| db.last_sent(&guild_id, kind))
                .await?
        };

        let mut attempts = 0;
        let candidate = loop {
            let candidate = self.source.next_item(kind).await;
            attempts += 1;

            let repeats_last = last
                .as_ref()
                .is_some_and(|l| l.primary_text() == candidate.primary_text());
            if !repeats_last {
                break candidate;
            }
            if attempts >= self.max_attempts {
                debug!(
                    "Acquisition: accepting repeated {} for guild {} after {} attempts",
                    kind, guild_id, attempts
                );
                break candidate;
            }
            debug!("Acquisition: candidate repeats last {} for guild {}, retrying", kind, guild_id);
        };

        if !candidate.is_usable() {
            warn!("Acquisition: no usable {} for guild {}", kind, guild_id);
            return Err(PipelineError::NoContentAvailable);
        }

        let inserted = {
            let guild_id = guild_id.to_string();
            let item = candidate.clone();
            self.db
                .run_blocking(move |db| db.commit(&guild_id, &item, today))
                .await?
        };

        if !inserted {
            // Someone else committed first; theirs is the canonical record.
            if let Some(canonical) = self.record_for(guild_id, kind, today).await? {
                debug!("Acquisition: lost commit race for guild {}, using canonical {}", guild_id, kind);
                return Ok(canonical);
            }
        }

        info!(
            "Acquisition: committed {} from {} for guild {} on {}",
            kind,
            candidate.source(),
            guild_id,
            today
        );
        Ok(candidate)
    }

    /// Fetches an item without reading or writing any history.
    pub async fn preview(&self, kind: ContentType) -> Result<ContentItem, PipelineError> {
        let item = self.source.next_item(kind).await;
        if item.is_usable() {
            Ok(item)
        } else {
            Err(PipelineError::NoContentAvailable)
        }
    }

    async fn record_for(
        &self,
        guild_id: &str,
        kind: ContentType,
        day: NaiveDate,
    ) -> Result<Option<ContentItem>, PipelineError> {
        let guild_id = guild_id.to_string();
        let record = self
            .db
            .run_blocking(move |db| db.record_for(&guild_id, day, kind))
            .await?;
        Ok(record)
    }
}
