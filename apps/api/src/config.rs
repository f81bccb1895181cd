use std::time::Duration;

use anyhow::{bail, Context, Result};

const MEGABYTE: usize = 1024 * 1024;

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: String,
    /// The bot is optional; without a token only the web API runs.
    pub telegram_bot_token: Option<String>,
    pub bot_autostart: bool,
    pub port: u16,
    pub rust_log: String,
    pub web_max_upload_bytes: usize,
    pub bot_max_upload_bytes: usize,
    pub session_idle_ttl: Duration,
    pub session_sweep_interval: Duration,
    pub max_sessions: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            gemini_api_key: require_env("GEMINI_API_KEY")?,
            telegram_bot_token: std::env::var("TELEGRAM_BOT_TOKEN")
                .ok()
                .filter(|t| !t.trim().is_empty()),
            bot_autostart: parse_env("BOT_AUTOSTART", false)?,
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            web_max_upload_bytes: megabytes_env("WEB_MAX_UPLOAD_MB", 16)?,
            bot_max_upload_bytes: megabytes_env("BOT_MAX_UPLOAD_MB", 20)?,
            session_idle_ttl: Duration::from_secs(parse_positive_env(
                "SESSION_IDLE_TTL_SECS",
                86_400,
            )?),
            session_sweep_interval: Duration::from_secs(parse_positive_env(
                "SESSION_SWEEP_INTERVAL_SECS",
                300,
            )?),
            max_sessions: parse_positive_env("MAX_SESSIONS", 10_000)?,
        })
    }

    pub fn bot_configured(&self) -> bool {
        self.telegram_bot_token.is_some()
    }
}

impl Default for Config {
    /// Defaults used by tests; production always goes through `from_env`.
    fn default() -> Self {
        Config {
            gemini_api_key: String::new(),
            telegram_bot_token: None,
            bot_autostart: false,
            port: 8080,
            rust_log: "info".to_string(),
            web_max_upload_bytes: 16 * MEGABYTE,
            bot_max_upload_bytes: 20 * MEGABYTE,
            session_idle_ttl: Duration::from_secs(86_400),
            session_sweep_interval: Duration::from_secs(300),
            max_sessions: 10_000,
        }
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value: {raw}")),
        Err(_) => Ok(default),
    }
}

/// Like `parse_env`, but zero is rejected.
fn parse_positive_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr + PartialEq + From<u8>,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let value = parse_env(key, default)?;
    if value == T::from(0) {
        bail!("Environment variable '{key}' must be greater than zero");
    }
    Ok(value)
}

/// A size given in whole megabytes, converted to bytes.
fn megabytes_env(key: &str, default_mb: usize) -> Result<usize> {
    parse_positive_env::<usize>(key, default_mb)?
        .checked_mul(MEGABYTE)
        .with_context(|| format!("Environment variable '{key}' is too large"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_env_uses_default_when_unset() {
        let value: u64 = parse_env("RESUMATE_TEST_UNSET_VARIABLE", 42).unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn test_default_ceilings_differ_between_variants() {
        let config = Config::default();
        assert_eq!(config.web_max_upload_bytes, 16 * MEGABYTE);
        assert_eq!(config.bot_max_upload_bytes, 20 * MEGABYTE);
        assert!(!config.bot_configured());
    }

    #[test]
    fn test_zero_values_are_rejected() {
        std::env::set_var("RESUMATE_TEST_ZERO_INTERVAL", "0");
        let err = parse_positive_env::<u64>("RESUMATE_TEST_ZERO_INTERVAL", 300).unwrap_err();
        assert!(err.to_string().contains("greater than zero"));

        std::env::set_var("RESUMATE_TEST_ZERO_UPLOAD_MB", " 0 ");
        assert!(megabytes_env("RESUMATE_TEST_ZERO_UPLOAD_MB", 16).is_err());
    }

    #[test]
    fn test_megabytes_overflow_is_an_error() {
        std::env::set_var("RESUMATE_TEST_HUGE_UPLOAD_MB", usize::MAX.to_string());
        let err = megabytes_env("RESUMATE_TEST_HUGE_UPLOAD_MB", 16).unwrap_err();
        assert!(err.to_string().contains("too large"));
    }

    #[test]
    fn test_megabytes_env_converts_to_bytes() {
        std::env::set_var("RESUMATE_TEST_UPLOAD_MB", "3");
        assert_eq!(megabytes_env("RESUMATE_TEST_UPLOAD_MB", 16).unwrap(), 3 * MEGABYTE);
        assert_eq!(
            megabytes_env("RESUMATE_TEST_UNSET_UPLOAD_MB", 16).unwrap(),
            16 * MEGABYTE
        );
    }
}
