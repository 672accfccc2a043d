use std::env;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::wizard::{MessageCatalog, SchemaVariant};

/// Distinguishes runtime behavior for different stages of the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the wizard and its collaborators.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub endpoints: EndpointConfig,
    pub wizard: WizardConfig,
    pub telemetry: TelemetryConfig,
    pub theme_file: Option<PathBuf>,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let prediction_url = base_url_var("PREDICTION_API_URL", "http://127.0.0.1:8000")?;
        let geocode_url =
            base_url_var("GEOCODE_API_URL", "https://nominatim.openstreetmap.org")?;
        let geocode_language = env::var("GEOCODE_LANGUAGE").unwrap_or_else(|_| "id".to_string());

        let request_timeout = match env::var("HTTP_TIMEOUT_SECS") {
            Ok(raw) => Some(Duration::from_secs(
                raw.trim()
                    .parse::<u64>()
                    .map_err(|_| ConfigError::InvalidTimeout(raw.clone()))?,
            )),
            Err(_) => None,
        };

        let schema_raw = env::var("APP_SCHEMA").unwrap_or_else(|_| "bandung".to_string());
        let schema = SchemaVariant::from_key(&schema_raw)
            .ok_or_else(|| ConfigError::UnknownSchema(schema_raw.clone()))?;

        let language = env::var("APP_LANGUAGE").unwrap_or_else(|_| "en".to_string());
        let messages = MessageCatalog::for_language(&language)
            .ok_or_else(|| ConfigError::UnknownLanguage(language.clone()))?;

        let toast_raw = env::var("TOAST_DURATION_MS").unwrap_or_else(|_| "2200".to_string());
        let toast_duration = toast_raw
            .trim()
            .parse::<u64>()
            .map(Duration::from_millis)
            .map_err(|_| ConfigError::InvalidToastDuration(toast_raw.clone()))?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let theme_file = env::var("THEME_FILE").ok().map(PathBuf::from);

        Ok(Self {
            environment,
            endpoints: EndpointConfig {
                prediction_url,
                geocode_url,
                geocode_language,
                request_timeout,
            },
            wizard: WizardConfig {
                schema,
                messages,
                toast_duration,
            },
            telemetry: TelemetryConfig { log_level },
            theme_file,
        })
    }
}

fn base_url_var(key: &'static str, default: &str) -> Result<String, ConfigError> {
    let value = env::var(key).unwrap_or_else(|_| default.to_string());
    let trimmed = value.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        Ok(trimmed.to_string())
    } else {
        Err(ConfigError::InvalidUrl { key, value })
    }
}

/// Base URLs and transport settings for the outbound collaborators.
#[derive(Debug, Clone)]
pub struct EndpointConfig {
    pub prediction_url: String,
    pub geocode_url: String,
    pub geocode_language: String,
    pub request_timeout: Option<Duration>,
}

/// Schema selection and user-facing message settings.
#[derive(Debug, Clone)]
pub struct WizardConfig {
    pub schema: SchemaVariant,
    pub messages: MessageCatalog,
    pub toast_duration: Duration,
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidUrl { key: &'static str, value: String },
    InvalidTimeout(String),
    InvalidToastDuration(String),
    UnknownSchema(String),
    UnknownLanguage(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidUrl { key, value } => {
                write!(f, "{key} must be an http(s) URL, got '{value}'")
            }
            ConfigError::InvalidTimeout(value) => {
                write!(f, "HTTP_TIMEOUT_SECS must be a whole number of seconds, got '{value}'")
            }
            ConfigError::InvalidToastDuration(value) => {
                write!(f, "TOAST_DURATION_MS must be a whole number of milliseconds, got '{value}'")
            }
            ConfigError::UnknownSchema(value) => {
                write!(f, "APP_SCHEMA must be 'bandung' or 'king_county', got '{value}'")
            }
            ConfigError::UnknownLanguage(value) => {
                write!(f, "APP_LANGUAGE must be 'en' or 'id', got '{value}'")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
