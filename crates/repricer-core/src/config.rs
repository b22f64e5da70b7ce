use std::str::FromStr;

use rust_decimal::Decimal;

use crate::app_config::{AppConfig, ColumnNames, Environment};
use crate::types::{parse_rgb, MarkerPalette};
use crate::ConfigError;

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/117.0.5938.132 Safari/537.36";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// All settings have defaults; only malformed values are rejected. Taking the
/// lookup as a parameter keeps the parsing testable with a plain `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_num = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .trim()
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_rgb_var = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        parse_rgb(&raw).ok_or_else(|| invalid(var, format!("\"{raw}\" is not a RRGGBB hex colour")))
    };

    let non_empty = |var: &str, default: &str| -> Result<String, ConfigError> {
        let raw = or_default(var, default);
        if raw.trim().is_empty() {
            return Err(invalid(var, "must not be empty".to_string()));
        }
        Ok(raw.trim().to_string())
    };

    let env = parse_environment(&or_default("REPRICER_ENV", "development"));

    let bind_addr = or_default("REPRICER_BIND_ADDR", "0.0.0.0:3000")
        .parse::<SocketAddr>()
        .map_err(|e| invalid("REPRICER_BIND_ADDR", e.to_string()))?;
    let log_level = or_default("REPRICER_LOG_LEVEL", "info");

    let marketplace_base_url = non_empty("REPRICER_MARKETPLACE_BASE_URL", "https://www.amazon.in")?
        .trim_end_matches('/')
        .to_string();
    let user_agent = non_empty("REPRICER_USER_AGENT", DEFAULT_USER_AGENT)?;
    let request_timeout_secs = parse_num("REPRICER_REQUEST_TIMEOUT_SECS", "10")?;
    if request_timeout_secs == 0 {
        return Err(invalid(
            "REPRICER_REQUEST_TIMEOUT_SECS",
            "timeout must be at least 1 second".to_string(),
        ));
    }
    let max_retries = u32::try_from(parse_num("REPRICER_MAX_RETRIES", "2")?)
        .map_err(|e| invalid("REPRICER_MAX_RETRIES", e.to_string()))?;
    let retry_backoff_base_ms = parse_num("REPRICER_RETRY_BACKOFF_BASE_MS", "500")?;
    let max_concurrent_fetches = usize::try_from(parse_num("REPRICER_MAX_CONCURRENT_FETCHES", "1")?)
        .map_err(|e| invalid("REPRICER_MAX_CONCURRENT_FETCHES", e.to_string()))?
        .max(1);
    let inter_request_delay_ms = parse_num("REPRICER_INTER_REQUEST_DELAY_MS", "0")?;

    let markdown = parse_markdown(&or_default("REPRICER_MARKDOWN", "10"))
        .map_err(|reason| invalid("REPRICER_MARKDOWN", reason))?;

    let defaults = ColumnNames::default();
    let columns = ColumnNames {
        identifier: non_empty("REPRICER_IDENTIFIER_COLUMN", &defaults.identifier)?,
        price: non_empty("REPRICER_PRICE_COLUMN", &defaults.price)?,
    };

    let palette = MarkerPalette {
        updated: parse_rgb_var("REPRICER_UPDATED_FILL", "00FF00")?,
        unchanged: parse_rgb_var("REPRICER_UNCHANGED_FILL", "FFFF00")?,
    };

    let report_dir = PathBuf::from(or_default("REPRICER_REPORT_DIR", "."));
    let max_upload_bytes = usize::try_from(parse_num("REPRICER_MAX_UPLOAD_BYTES", "10485760")?)
        .map_err(|e| invalid("REPRICER_MAX_UPLOAD_BYTES", e.to_string()))?;

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        marketplace_base_url,
        user_agent,
        request_timeout_secs,
        max_retries,
        retry_backoff_base_ms,
        max_concurrent_fetches,
        inter_request_delay_ms,
        markdown,
        columns,
        palette,
        report_dir,
        max_upload_bytes,
    })
}

/// Parses a markdown amount, rejecting negatives.
///
/// # Errors
///
/// Returns a human-readable reason when `raw` is not a non-negative decimal.
pub fn parse_markdown(raw: &str) -> Result<Decimal, String> {
    let value = Decimal::from_str(raw.trim()).map_err(|e| e.to_string())?;
    if value.is_sign_negative() && !value.is_zero() {
        return Err(format!("markdown must not be negative, got {value}"));
    }
    Ok(value)
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
