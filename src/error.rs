use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use crate::theme::ThemeError;
use crate::wizard::{GatewayError, SchemaError, WizardError};
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Gateway(GatewayError),
    Schema(SchemaError),
    Wizard(WizardError),
    Theme(ThemeError),
}

impl AppError {
    /// Usage mistakes as opposed to environment or service failures.
    pub fn is_user_error(&self) -> bool {
        matches!(self, AppError::Wizard(_))
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Gateway(err) => write!(f, "gateway error: {}", err),
            AppError::Schema(err) => write!(f, "schema error: {}", err),
            AppError::Wizard(err) => write!(f, "wizard error: {}", err),
            AppError::Theme(err) => write!(f, "theme error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Gateway(err) => Some(err),
            AppError::Schema(err) => Some(err),
            AppError::Wizard(err) => Some(err),
            AppError::Theme(err) => Some(err),
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<GatewayError> for AppError {
    fn from(value: GatewayError) -> Self {
        Self::Gateway(value)
    }
}

impl From<SchemaError> for AppError {
    fn from(value: SchemaError) -> Self {
        Self::Schema(value)
    }
}

impl From<WizardError> for AppError {
    fn from(value: WizardError) -> Self {
        Self::Wizard(value)
    }
}

impl From<ThemeError> for AppError {
    fn from(value: ThemeError) -> Self {
        Self::Theme(value)
    }
}
