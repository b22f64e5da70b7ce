use std::collections::HashMap;
use std::env::VarError;

use super::*;

fn lookup_from_map<'a>(
    map: &'a HashMap<&'a str, &'a str>,
) -> impl Fn(&str) -> Result<String, VarError> + 'a {
    move |key| {
        map.get(key)
            .map(|v| (*v).to_string())
            .ok_or(VarError::NotPresent)
    }
}

#[test]
fn parse_environment_variants() {
    assert_eq!(parse_environment("production"), Environment::Production);
    assert_eq!(parse_environment("test"), Environment::Test);
    assert_eq!(parse_environment("development"), Environment::Development);
}

#[test]
fn parse_environment_unknown_defaults_to_development() {
    assert_eq!(parse_environment("staging"), Environment::Development);
}

#[test]
fn build_app_config_uses_defaults_when_env_is_empty() {
    let map: HashMap<&str, &str> = HashMap::new();
    let config = build_app_config(lookup_from_map(&map)).expect("defaults should be valid");

    assert_eq!(config.env, Environment::Development);
    assert_eq!(config.bind_addr.to_string(), "0.0.0.0:3000");
    assert_eq!(config.marketplace_base_url, "https://www.amazon.in");
    assert_eq!(config.request_timeout_secs, 10);
    assert_eq!(config.max_retries, 2);
    assert_eq!(config.max_concurrent_fetches, 1);
    assert_eq!(config.markdown, Decimal::TEN);
    assert_eq!(config.columns, ColumnNames::default());
    assert_eq!(config.palette, MarkerPalette::default());
    assert_eq!(config.max_upload_bytes, 10 * 1024 * 1024);
}

#[test]
fn build_app_config_reads_overrides() {
    let mut map = HashMap::new();
    map.insert("REPRICER_ENV", "production");
    map.insert("REPRICER_MARKETPLACE_BASE_URL", "http://127.0.0.1:9999/");
    map.insert("REPRICER_MARKDOWN", "2.50");
    map.insert("REPRICER_MAX_CONCURRENT_FETCHES", "4");
    map.insert("REPRICER_IDENTIFIER_COLUMN", "ASIN");
    map.insert("REPRICER_PRICE_COLUMN", "Price");
    map.insert("REPRICER_UPDATED_FILL", "#112233");

    let config = build_app_config(lookup_from_map(&map)).expect("overrides should be valid");

    assert_eq!(config.env, Environment::Production);
    assert_eq!(config.marketplace_base_url, "http://127.0.0.1:9999");
    assert_eq!(config.markdown, Decimal::new(250, 2));
    assert_eq!(config.max_concurrent_fetches, 4);
    assert_eq!(config.columns.identifier, "ASIN");
    assert_eq!(config.columns.price, "Price");
    assert_eq!(config.palette.updated, 0x11_22_33);
    assert_eq!(config.palette.unchanged, 0xFF_FF_00);
}

#[test]
fn zero_concurrency_is_clamped_to_one() {
    let mut map = HashMap::new();
    map.insert("REPRICER_MAX_CONCURRENT_FETCHES", "0");
    let config = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(config.max_concurrent_fetches, 1);
}

#[test]
fn negative_markdown_is_rejected() {
    let mut map = HashMap::new();
    map.insert("REPRICER_MARKDOWN", "-5");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "REPRICER_MARKDOWN"),
        "expected InvalidEnvVar(REPRICER_MARKDOWN), got: {result:?}"
    );
}

#[test]
fn invalid_fill_colour_is_rejected() {
    let mut map = HashMap::new();
    map.insert("REPRICER_UNCHANGED_FILL", "yellow");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "REPRICER_UNCHANGED_FILL")
    );
}

#[test]
fn invalid_timeout_is_rejected() {
    let mut map = HashMap::new();
    map.insert("REPRICER_REQUEST_TIMEOUT_SECS", "soon");
    assert!(build_app_config(lookup_from_map(&map)).is_err());

    map.insert("REPRICER_REQUEST_TIMEOUT_SECS", "0");
    assert!(build_app_config(lookup_from_map(&map)).is_err());
}

#[test]
fn blank_column_name_is_rejected() {
    let mut map = HashMap::new();
    map.insert("REPRICER_PRICE_COLUMN", "  ");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "REPRICER_PRICE_COLUMN")
    );
}

#[test]
fn parse_markdown_accepts_zero() {
    assert_eq!(parse_markdown("0"), Ok(Decimal::ZERO));
    assert!(parse_markdown("ten").is_err());
}
