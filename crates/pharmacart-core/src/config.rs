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
/// Decoupled from the process environment so it can be tested with a plain
/// `HashMap` lookup.
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

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let api_base_url = require("PHARMACART_API_BASE_URL")?;
    if !(api_base_url.starts_with("http://") || api_base_url.starts_with("https://")) {
        return Err(ConfigError::InvalidEnvVar {
            var: "PHARMACART_API_BASE_URL".to_string(),
            reason: format!("expected an http(s) URL, got '{api_base_url}'"),
        });
    }
    let api_token = lookup("PHARMACART_API_TOKEN")
        .ok()
        .filter(|t| !t.trim().is_empty());

    let env = parse_environment(&or_default("PHARMACART_ENV", "development"))?;
    let log_level = or_default("PHARMACART_LOG_LEVEL", "info");
    let data_dir = PathBuf::from(or_default("PHARMACART_DATA_DIR", "./.pharmacart"));
    let pricing_path = lookup("PHARMACART_PRICING_PATH").ok().map(PathBuf::from);

    let branch_id = parse_u64("PHARMACART_BRANCH_ID", "1")?;
    let request_timeout_secs = parse_u64("PHARMACART_REQUEST_TIMEOUT_SECS", "20")?;
    if request_timeout_secs == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "PHARMACART_REQUEST_TIMEOUT_SECS".to_string(),
            reason: "timeout must be at least 1 second".to_string(),
        });
    }
    let max_retries = parse_u32("PHARMACART_MAX_RETRIES", "2")?;
    let retry_backoff_base_ms = parse_u64("PHARMACART_RETRY_BACKOFF_BASE_MS", "500")?;

    Ok(AppConfig {
        api_base_url,
        api_token,
        env,
        log_level,
        data_dir,
        branch_id,
        pricing_path,
        request_timeout_secs,
        max_retries,
        retry_backoff_base_ms,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "PHARMACART_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
