use crate::app_config::{AppConfig, Environment, SecondaryLlm};
use crate::ConfigError;

/// Largest page the `YouTube` search API will return in one call.
pub const YOUTUBE_MAX_RESULTS_CAP: u32 = 50;

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
/// Does not read `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;

    let require = |var: &str| -> Result<String, ConfigError> {
        match lookup(var) {
            Ok(value) if !value.trim().is_empty() => Ok(value),
            _ => Err(ConfigError::MissingEnvVar(var.to_string())),
        }
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let database_url = require("DATABASE_URL")?;
    let access_password = require("REVIEWSCOPE_ACCESS_PASSWORD")?;
    let youtube_api_key = require("YOUTUBE_API_KEY")?;
    let gemini_api_key = require("GEMINI_API_KEY")?;

    let env = parse_environment(&or_default("REVIEWSCOPE_ENV", "development"))?;

    let bind_addr = or_default("REVIEWSCOPE_BIND_ADDR", "0.0.0.0:8000")
        .parse::<SocketAddr>()
        .map_err(|e| invalid("REVIEWSCOPE_BIND_ADDR", e.to_string()))?;
    let log_level = or_default("REVIEWSCOPE_LOG_LEVEL", "info");

    let db_max_connections = parse_u32("REVIEWSCOPE_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("REVIEWSCOPE_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("REVIEWSCOPE_DB_ACQUIRE_TIMEOUT_SECS", "10")?;
    if db_min_connections > db_max_connections {
        return Err(invalid(
            "REVIEWSCOPE_DB_MIN_CONNECTIONS",
            format!("must not exceed REVIEWSCOPE_DB_MAX_CONNECTIONS ({db_max_connections})"),
        ));
    }

    let youtube_max_results = parse_u32("REVIEWSCOPE_YOUTUBE_MAX_RESULTS", "50")?
        .clamp(1, YOUTUBE_MAX_RESULTS_CAP);
    let gemini_model = or_default("GEMINI_MODEL", "gemini-2.0-flash");

    let secondary_llm = parse_secondary_llm(&or_default("REVIEWSCOPE_SECONDARY_LLM", "openai"))?;
    let (secondary_api_key, secondary_model) = match secondary_llm {
        SecondaryLlm::OpenAi => (
            require("OPENAI_API_KEY")?,
            or_default("OPENAI_MODEL", "gpt-4o-mini"),
        ),
        SecondaryLlm::OpenRouter => (
            require("OPENROUTER_API_KEY")?,
            or_default("OPENROUTER_MODEL", "openai/gpt-4o-mini"),
        ),
    };

    let provider_timeout_secs = parse_u64("REVIEWSCOPE_PROVIDER_TIMEOUT_SECS", "15")?;
    let discovery_branch_timeout_secs =
        parse_u64("REVIEWSCOPE_DISCOVERY_BRANCH_TIMEOUT_SECS", "45")?;
    let provider_max_retries = parse_u32("REVIEWSCOPE_PROVIDER_MAX_RETRIES", "2")?;
    let provider_backoff_base_ms = parse_u64("REVIEWSCOPE_PROVIDER_BACKOFF_BASE_MS", "500")?;
    let user_agent = or_default("REVIEWSCOPE_USER_AGENT", "reviewscope/0.1 (video-discovery)");

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        access_password,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        youtube_api_key,
        youtube_max_results,
        gemini_api_key,
        gemini_model,
        secondary_llm,
        secondary_api_key,
        secondary_model,
        provider_timeout_secs,
        discovery_branch_timeout_secs,
        provider_max_retries,
        provider_backoff_base_ms,
        user_agent,
    })
}

fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "REVIEWSCOPE_ENV".to_string(),
            reason: format!("unknown environment {other:?}"),
        }),
    }
}

fn parse_secondary_llm(s: &str) -> Result<SecondaryLlm, ConfigError> {
    match s.to_ascii_lowercase().as_str() {
        "openai" => Ok(SecondaryLlm::OpenAi),
        "openrouter" => Ok(SecondaryLlm::OpenRouter),
        other => Err(ConfigError::InvalidEnvVar {
            var: "REVIEWSCOPE_SECONDARY_LLM".to_string(),
            reason: format!("expected openai or openrouter, got {other:?}"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
