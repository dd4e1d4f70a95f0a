use std::{env, path::PathBuf, time::Duration};

use crate::error::ConfigError;

const HOST: &str = "0.0.0.0";
const PORT: u16 = 5001;
const DAILY_LIMIT: u32 = 95;
const USAGE_FILE: &str = "api_usage.json";
const HTTP_TIMEOUT_SECS: u64 = 120;
const GEMINI_API_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const IMAGE_SEARCH_URL: &str = "https://www.googleapis.com/customsearch/v1";

pub const MODEL_FALLBACK_ORDER: [&str; 4] = [
    "gemini-2.5-pro",
    "gemini-2.5-flash",
    "gemini-1.5-flash-latest",
    "gemini-1.5-pro-latest",
];

/// Everything the server needs, read once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub gemini_api_key: String,
    pub gemini_base_url: String,
    pub model_fallback_order: Vec<String>,
    pub google_api_key: String,
    pub search_engine_id: String,
    pub image_search_url: String,
    pub daily_limit: u32,
    pub usage_file: PathBuf,
    pub http_timeout: Duration,
    pub environment: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let gemini_api_key = required("GEMINI_API_KEY")?;
        let google_api_key = required("GOOGLE_API_KEY")?;
        let search_engine_id = required("SEARCH_ENGINE_ID")?;

        let model_fallback_order = match get("MODEL_FALLBACK_ORDER") {
            Some(raw) => parse_model_list(&raw)?,
            None => MODEL_FALLBACK_ORDER.iter().map(|m| m.to_string()).collect(),
        };

        Ok(Self {
            host: get("HOST").unwrap_or_else(|| HOST.to_string()),
            port: parse_or("PORT", get("PORT"), PORT)?,
            gemini_api_key,
            gemini_base_url: get("GEMINI_API_BASE_URL")
                .unwrap_or_else(|| GEMINI_API_BASE_URL.to_string()),
            model_fallback_order,
            google_api_key,
            search_engine_id,
            image_search_url: get("IMAGE_SEARCH_URL")
                .unwrap_or_else(|| IMAGE_SEARCH_URL.to_string()),
            daily_limit: parse_or("DAILY_LIMIT", get("DAILY_LIMIT"), DAILY_LIMIT)?,
            usage_file: PathBuf::from(get("USAGE_FILE").unwrap_or_else(|| USAGE_FILE.to_string())),
            http_timeout: Duration::from_secs(parse_or(
                "HTTP_TIMEOUT_SECS",
                get("HTTP_TIMEOUT_SECS"),
                HTTP_TIMEOUT_SECS,
            )?),
            environment: get("RUST_ENV").unwrap_or_else(|| "development".to_string()),
        })
    }
}

fn parse_or<T>(var: &'static str, value: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            value: raw.clone(),
            reason: e.to_string(),
        }),
    }
}

fn parse_model_list(raw: &str) -> Result<Vec<String>, ConfigError> {
    let models: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(String::from)
        .collect();

    if models.is_empty() {
        return Err(ConfigError::Invalid {
            var: "MODEL_FALLBACK_ORDER",
            value: raw.to_string(),
            reason: "no model names given".to_string(),
        });
    }
    Ok(models)
}
