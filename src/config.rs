use dotenvy::dotenv;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Clone)]
pub struct Config {
    pub discord_token: String,
    pub application_id: u64,
    pub database_url: String,
    pub status_message: String,
    /// Per-call timeout for content providers and channel lookups.
    pub request_timeout: Duration,
    pub dedup_max_attempts: usize,
    pub dev_guild_id: Option<u64>,
    pub register_commands: bool,
    pub providers_file: String,
    pub disabled_providers: Vec<String>,
}

/// Contents of the optional `providers.toml`.
#[derive(Debug, Default, Deserialize)]
pub struct ProviderSettings {
    #[serde(default)]
    pub disabled: Vec<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv().ok();
        Self::build()
    }

    fn build() -> anyhow::Result<Self> {
        let providers_file =
            env::var("PROVIDERS_FILE").unwrap_or_else(|_| "providers.toml".to_string());
        let provider_settings = Self::load_provider_settings(&providers_file)?;

        Ok(Config {
            discord_token: env::var("DISCORD_TOKEN")
                .map_err(|_| anyhow::anyhow!("DISCORD_TOKEN must be set"))?,
            application_id: env::var("APPLICATION_ID")
                .map_err(|_| anyhow::anyhow!("APPLICATION_ID must be set"))?
                .parse()
                .map_err(|_| anyhow::anyhow!("APPLICATION_ID must be a valid u64"))?,
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "data/qotd.db".to_string()),
            status_message: env::var("STATUS_MESSAGE")
                .unwrap_or_else(|_| "Serving daily quotes".to_string()),
            request_timeout: humantime::parse_duration(
                &env::var("REQUEST_TIMEOUT").unwrap_or_else(|_| "5s".to_string()),
            )
            .map_err(|e| anyhow::anyhow!("REQUEST_TIMEOUT must be a duration like `5s`: {}", e))?,
            dedup_max_attempts: env::var("DEDUP_MAX_ATTEMPTS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("DEDUP_MAX_ATTEMPTS must be a whole number"))?,
            dev_guild_id: env::var("DEV_GUILD_ID").ok().and_then(|id| id.parse().ok()),
            register_commands: env::var("REGISTER_COMMANDS")
                .unwrap_or_else(|_| "true".to_string())
                .parse()
                .unwrap_or(true),
            providers_file,
            disabled_providers: provider_settings.disabled,
        })
    }

    /// Reads `providers.toml` if present. A missing file means every provider is enabled.
    pub fn load_provider_settings(path: impl AsRef<Path>) -> anyhow::Result<ProviderSettings> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(ProviderSettings::default());
        }
        let content = fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Invalid provider settings in {}: {}", path.display(), e))
    }

    pub fn is_provider_enabled(&self, name: &str) -> bool {
        !self
            .disabled_providers
            .iter()
            .any(|d| d.eq_ignore_ascii_case(name))
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("discord_token", &"[REDACTED]")
            .field("application_id", &self.application_id)
            .field("database_url", &self.database_url)
            .field("status_message", &self.status_message)
            .field("request_timeout", &self.request_timeout)
            .field("dedup_max_attempts", &self.dedup_max_attempts)
            .field("dev_guild_id", &self.dev_guild_id)
            .field("register_commands", &self.register_commands)
            .field("providers_file", &self.providers_file)
            .field("disabled_providers", &self.disabled_providers)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::io::Write;

    #[test]
    fn test_config_logic() {
        env::set_var("PROVIDERS_FILE", "/nonexistent/providers.toml");

        // 1. Missing required vars
        env::remove_var("DISCORD_TOKEN");
        env::remove_var("APPLICATION_ID");
        let result = Config::build();
        assert!(
            result.is_err(),
            "Should fail when required vars are missing"
        );

        // 2. Defaults
        env::set_var("DISCORD_TOKEN", "test_token");
        env::set_var("APPLICATION_ID", "12345");
        let config = Config::build().unwrap();
        assert_eq!(config.discord_token, "test_token");
        assert_eq!(config.application_id, 12345);
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.dedup_max_attempts, 5);
        assert!(config.disabled_providers.is_empty());

        // 3. Durations go through humantime
        env::set_var("REQUEST_TIMEOUT", "1500ms");
        let config = Config::build().unwrap();
        assert_eq!(config.request_timeout, Duration::from_millis(1500));
        env::set_var("REQUEST_TIMEOUT", "soon");
        assert!(Config::build().is_err());
        env::remove_var("REQUEST_TIMEOUT");

        // 4. Malformed attempt counts are rejected, not defaulted
        env::set_var("DEDUP_MAX_ATTEMPTS", "3");
        assert_eq!(Config::build().unwrap().dedup_max_attempts, 3);
        env::set_var("DEDUP_MAX_ATTEMPTS", "five");
        assert!(Config::build().is_err());
        env::remove_var("DEDUP_MAX_ATTEMPTS");

        // 5. Debug redaction
        let debug_output = format!("{:?}", Config::build().unwrap());
        assert!(!debug_output.contains("test_token"));
        assert!(debug_output.contains("[REDACTED]"));

        // Cleanup
        env::remove_var("DISCORD_TOKEN");
        env::remove_var("APPLICATION_ID");
        env::remove_var("PROVIDERS_FILE");
    }

    #[test]
    fn test_load_provider_settings() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "disabled = [\"Quotable\", \"numbers api\"]").unwrap();

        let settings = Config::load_provider_settings(file.path()).unwrap();
        assert_eq!(settings.disabled, vec!["Quotable", "numbers api"]);

        let missing = Config::load_provider_settings("/nonexistent/providers.toml").unwrap();
        assert!(missing.disabled.is_empty());
    }

    #[test]
    fn test_invalid_provider_settings_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "disabled = 3").unwrap();
        assert!(Config::load_provider_settings(file.path()).is_err());
    }
}
