pub mod commands;
pub mod config;
pub mod content;
pub mod db;
pub mod delivery;
pub mod error;
pub mod providers;
pub mod render;
pub mod scheduler;
pub mod services;

use std::sync::Arc;

/// Custom data passed to all commands
pub struct Data {
    pub db: db::Database,
    pub acquisition: Arc<services::acquisition::AcquisitionService>,
    /// Owns every guild's daily triggers; settings commands re-register through it
    pub scheduler: Arc<scheduler::Scheduler>,
}

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;
