use std::str::FromStr;

use spirit_core::error::CoreError;

/// Default number of entries on a leaderboard.
pub const DEFAULT_LEADERBOARD_LIMIT: u32 = 10;

/// Default number of inserts tried when minting a key collides.
pub const DEFAULT_KEY_MINT_ATTEMPTS: u32 = 5;

/// Output format for the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format '{other}', expected text or json")),
        }
    }
}

/// Engine configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// PostgreSQL connection string.
    pub database_url: String,
    /// Connection pool size (default: `20`).
    pub max_connections: u32,
    /// Leaderboard length when the caller gives none (default: `10`).
    pub leaderboard_limit: u32,
    /// Inserts tried per minted key before giving up (default: `5`).
    pub key_mint_attempts: u32,
    pub log_format: LogFormat,
}

impl EngineConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var              | Default    |
    /// |----------------------|------------|
    /// | `DATABASE_URL`       | (required) |
    /// | `DB_MAX_CONNECTIONS` | `20`       |
    /// | `LEADERBOARD_LIMIT`  | `10`       |
    /// | `KEY_MINT_ATTEMPTS`  | `5`        |
    /// | `LOG_FORMAT`         | `text`     |
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| CoreError::Validation("DATABASE_URL must be set".into()))?;

        Ok(Self {
            database_url,
            max_connections: parse_or(
                &lookup,
                "DB_MAX_CONNECTIONS",
                spirit_db::DEFAULT_MAX_CONNECTIONS,
            )?,
            leaderboard_limit: parse_or(&lookup, "LEADERBOARD_LIMIT", DEFAULT_LEADERBOARD_LIMIT)?,
            key_mint_attempts: parse_or(&lookup, "KEY_MINT_ATTEMPTS", DEFAULT_KEY_MINT_ATTEMPTS)?,
            log_format: parse_or(&lookup, "LOG_FORMAT", LogFormat::Text)?,
        })
    }
}

fn parse_or<T, F>(lookup: &F, name: &str, default: T) -> Result<T, CoreError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| CoreError::Validation(format!("{name} is invalid: {e}"))),
        None => Ok(default),
    }
}
