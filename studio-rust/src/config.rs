use gameforge::google::DEFAULT_MODEL_ID;
use std::env;
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 4000;
pub const DEFAULT_APP_URL: &str = "http://localhost:4000";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Everything the studio reads from its environment at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct StudioConfig {
    pub api_key: String,
    pub model_id: String,
    pub base_url: Option<String>,
    pub temperature: Option<f64>,
    pub max_output_tokens: Option<u32>,
    /// Tokens accepted at sign-in. Stands in for an external auth provider.
    pub access_tokens: Vec<String>,
    pub port: u16,
    /// Origin allowed by CORS.
    pub app_url: String,
}

impl StudioConfig {
    /// Read the configuration from the process environment. Call
    /// `dotenvy::dotenv()` first to pick up a `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let api_key = var("GOOGLE_API_KEY")
            .or_else(|| var("API_KEY"))
            .ok_or(ConfigError::Missing("GOOGLE_API_KEY"))?;

        let model_id = var("GAMEFORGE_MODEL").unwrap_or_else(|| DEFAULT_MODEL_ID.to_string());
        let base_url = var("GAMEFORGE_BASE_URL");

        let temperature = var("GAMEFORGE_TEMPERATURE")
            .map(|value| {
                value
                    .trim()
                    .parse::<f64>()
                    .ok()
                    .filter(|t| (0.0..=2.0).contains(t))
                    .ok_or_else(|| ConfigError::Invalid {
                        name: "GAMEFORGE_TEMPERATURE",
                        reason: format!("expected a number between 0 and 2, got {value:?}"),
                    })
            })
            .transpose()?;

        let max_output_tokens = var("GAMEFORGE_MAX_OUTPUT_TOKENS")
            .map(|value| {
                value
                    .trim()
                    .parse::<u32>()
                    .ok()
                    .filter(|tokens| *tokens > 0)
                    .ok_or_else(|| ConfigError::Invalid {
                        name: "GAMEFORGE_MAX_OUTPUT_TOKENS",
                        reason: format!("expected a positive number, got {value:?}"),
                    })
            })
            .transpose()?;

        let raw_tokens = var("GAMEFORGE_ACCESS_TOKENS")
            .ok_or(ConfigError::Missing("GAMEFORGE_ACCESS_TOKENS"))?;
        let access_tokens = parse_access_tokens(&raw_tokens)?;

        let port = match var("PORT") {
            Some(value) => value.trim().parse::<u16>().map_err(|_| ConfigError::Invalid {
                name: "PORT",
                reason: format!("expected a port number, got {value:?}"),
            })?,
            None => DEFAULT_PORT,
        };

        let app_url = var("APP_URL").unwrap_or_else(|| DEFAULT_APP_URL.to_string());

        Ok(Self {
            api_key,
            model_id,
            base_url,
            temperature,
            max_output_tokens,
            access_tokens,
            port,
            app_url,
        })
    }

    /// Session cookies get the `Secure` attribute when the app is served
    /// over https.
    #[must_use]
    pub fn secure_cookies(&self) -> bool {
        self.app_url
            .get(..8)
            .is_some_and(|scheme| scheme.eq_ignore_ascii_case("https://"))
    }
}

/// Tokens end up in a cookie, so they are limited to visible ASCII without
/// separators.
fn parse_access_tokens(raw: &str) -> Result<Vec<String>, ConfigError> {
    let tokens: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect();

    if tokens.is_empty() {
        return Err(ConfigError::Missing("GAMEFORGE_ACCESS_TOKENS"));
    }
    if let Some(bad) = tokens.iter().find(|token| {
        !token
            .chars()
            .all(|c| c.is_ascii_graphic() && !matches!(c, ';' | ',' | '"' | '\\'))
    }) {
        return Err(ConfigError::Invalid {
            name: "GAMEFORGE_ACCESS_TOKENS",
            reason: format!("token {bad:?} contains characters not allowed in a cookie"),
        });
    }
    Ok(tokens)
}
