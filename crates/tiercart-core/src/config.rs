use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
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
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so tests can pass a `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let store_url = require("SHOPIFY_STORE_URL")?;
    if !(store_url.starts_with("https://") || store_url.starts_with("http://")) {
        return Err(ConfigError::InvalidEnvVar {
            var: "SHOPIFY_STORE_URL".to_string(),
            reason: format!("\"{store_url}\" must start with http:// or https://"),
        });
    }
    let storefront_token = require("SHOPIFY_STOREFRONT_TOKEN")?;

    let env = parse_environment(&or_default("TIERCART_ENV", "development"));
    let log_level = or_default("TIERCART_LOG_LEVEL", "info");
    let storefront_api_version = or_default("TIERCART_STOREFRONT_API_VERSION", "2025-01");
    let catalog_path = PathBuf::from(or_default(
        "TIERCART_CATALOG_PATH",
        "./config/catalog.yaml",
    ));
    let cart_ref_path = PathBuf::from(or_default(
        "TIERCART_CART_REF_PATH",
        "./.tiercart/cart_ref.json",
    ));
    let request_timeout_secs = parse_u64("TIERCART_REQUEST_TIMEOUT_SECS", "30")?;
    if request_timeout_secs == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "TIERCART_REQUEST_TIMEOUT_SECS".to_string(),
            reason: "must be greater than 0".to_string(),
        });
    }
    let user_agent = or_default("TIERCART_USER_AGENT", "tiercart/0.1 (cart-sync)");

    Ok(AppConfig {
        env,
        log_level,
        store_url,
        storefront_token,
        storefront_api_version,
        catalog_path,
        cart_ref_path,
        request_timeout_secs,
        user_agent,
    })
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
