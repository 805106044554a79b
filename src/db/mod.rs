use crate::config::Config;
use crate::content::{ContentItem, ContentType};
use anyhow::Context as _;
use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

pub const DEFAULT_QUOTE_HOUR: u8 = 9;
pub const DEFAULT_QUESTION_HOUR: u8 = 10;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Delivery settings for one guild.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuildSettings {
    pub guild_id: String,
    pub quote_channel_id: Option<String>,
    pub quote_hour: u8,
    pub question_channel_id: Option<String>,
    pub question_hour: u8,
}

/// A partial settings write. `None` fields keep whatever is stored.
#[derive(Debug, Clone, Default)]
pub struct SettingsUpdate {
    pub quote_channel_id: Option<String>,
    pub quote_hour: Option<u8>,
    pub question_channel_id: Option<String>,
    pub question_hour: Option<u8>,
}

#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        if let Some(parent) = Path::new(&config.database_url).parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
        }
        Self::open(&config.database_url)
    }

    pub fn open(path: &str) -> anyhow::Result<Self> {
        let conn = Connection::open(path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Runs a synchronous database call on the blocking pool.
    pub async fn run_blocking<F, T>(&self, f: F) -> anyhow::Result<T>
    where
        F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = self.clone();
        tokio::task::spawn_blocking(move || f(&db)).await?
    }

    pub fn execute_init(&self) -> anyhow::Result<()> {
        info!("Database: Initializing schema...");
        let sql = "
            CREATE TABLE IF NOT EXISTS sent_items (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                guild_id TEXT NOT NULL,
                content_type TEXT NOT NULL,
                primary_text TEXT NOT NULL,
                metadata_json TEXT NOT NULL,
                sent_on DATE NOT NULL
            );
            CREATE UNIQUE INDEX IF NOT EXISTS idx_sent_items_guild_type_day
                ON sent_items (guild_id, content_type, sent_on);

            CREATE TABLE IF NOT EXISTS guild_settings (
                guild_id TEXT PRIMARY KEY,
                quote_channel_id TEXT,
                quote_hour INTEGER NOT NULL DEFAULT 9,
                question_channel_id TEXT,
                question_hour INTEGER NOT NULL DEFAULT 10
            );
        ";
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(sql)?;
        debug!("Database: Schema initialized successfully");
        Ok(())
    }

    // --- Sent items ---

    /// The canonical item committed for `guild_id` on `date`, if any.
    pub fn record_for(
        &self,
        guild_id: &str,
        date: NaiveDate,
        kind: ContentType,
    ) -> anyhow::Result<Option<ContentItem>> {
        let conn = self.conn.lock().unwrap();
        let raw: Option<String> = conn
            .query_row(
                "SELECT metadata_json FROM sent_items
                 WHERE guild_id = ?1 AND content_type = ?2 AND sent_on = ?3
                 ORDER BY id ASC LIMIT 1",
                (guild_id, kind.as_str(), date.format(DATE_FORMAT).to_string()),
                |row| row.get(0),
            )
            .optional()?;
        raw.map(|json| decode_item(&json)).transpose()
    }

    /// The most recently committed item of `kind`, ordered by commit date.
    pub fn last_sent(
        &self,
        guild_id: &str,
        kind: ContentType,
    ) -> anyhow::Result<Option<ContentItem>> {
        let conn = self.conn.lock().unwrap();
        let raw: Option<String> = conn
            .query_row(
                "SELECT metadata_json FROM sent_items
                 WHERE guild_id = ?1 AND content_type = ?2
                 ORDER BY sent_on DESC, id DESC LIMIT 1",
                (guild_id, kind.as_str()),
                |row| row.get(0),
            )
            .optional()?;
        raw.map(|json| decode_item(&json)).transpose()
    }

    /// Appends a sent record. Callers check `record_for` first; if another writer
    /// already committed for the same guild, type and day, nothing is written and
    /// `false` is returned.
    pub fn commit(
        &self,
        guild_id: &str,
        item: &ContentItem,
        sent_on: NaiveDate,
    ) -> anyhow::Result<bool> {
        let metadata = serde_json::to_string(item)?;
        let conn = self.conn.lock().unwrap();
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO sent_items (guild_id, content_type, primary_text, metadata_json, sent_on)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            (
                guild_id,
                item.content_type().as_str(),
                item.primary_text(),
                metadata,
                sent_on.format(DATE_FORMAT).to_string(),
            ),
        )?;
        debug!(
            "Database: Commit {} for guild {} on {} (inserted: {})",
            item.content_type(),
            guild_id,
            sent_on,
            inserted > 0
        );
        Ok(inserted > 0)
    }

    // --- Guild settings ---

    /// Merge-on-conflict upsert. The first write fills unset hours with the defaults.
    pub fn set_guild_settings(&self, guild_id: &str, update: &SettingsUpdate) -> anyhow::Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO guild_settings (guild_id, quote_channel_id, quote_hour, question_channel_id, question_hour)
             VALUES (?1, ?2, COALESCE(?3, 9), ?4, COALESCE(?5, 10))
             ON CONFLICT(guild_id) DO UPDATE SET
                quote_channel_id = COALESCE(?2, quote_channel_id),
                quote_hour = COALESCE(?3, quote_hour),
                question_channel_id = COALESCE(?4, question_channel_id),
                question_hour = COALESCE(?5, question_hour)",
            (
                guild_id,
                update.quote_channel_id.as_deref(),
                update.quote_hour,
                update.question_channel_id.as_deref(),
                update.question_hour,
            ),
        )?;
        Ok(())
    }

    pub fn get_guild_settings(&self, guild_id: &str) -> anyhow::Result<Option<GuildSettings>> {
        let conn = self.conn.lock().unwrap();
        let settings = conn
            .query_row(
                "SELECT guild_id, quote_channel_id, quote_hour, question_channel_id, question_hour
                 FROM guild_settings WHERE guild_id = ?1",
                [guild_id],
                settings_from_row,
            )
            .optional()?;
        Ok(settings)
    }

    pub fn all_guild_settings(&self) -> anyhow::Result<Vec<GuildSettings>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT guild_id, quote_channel_id, quote_hour, question_channel_id, question_hour
             FROM guild_settings ORDER BY guild_id",
        )?;
        let rows = stmt.query_map([], settings_from_row)?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }
        Ok(results)
    }
}

fn settings_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<GuildSettings> {
    Ok(GuildSettings {
        guild_id: row.get(0)?,
        quote_channel_id: row.get(1)?,
        quote_hour: row.get(2)?,
        question_channel_id: row.get(3)?,
        question_hour: row.get(4)?,
    })
}

fn decode_item(json: &str) -> anyhow::Result<ContentItem> {
    serde_json::from_str(json).context("Corrupt metadata_json in sent_items")
}
