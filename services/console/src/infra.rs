use price_wizard::config::AppConfig;
use price_wizard::error::AppError;
use price_wizard::telemetry;
use price_wizard::theme::{
    InMemoryThemePersistence, JsonFileThemePersistence, Theme, ThemePersistence, ThemeStore,
};
use price_wizard::wizard::{
    Coordinate, FieldRegistry, HttpPredictionClient, NominatimClient, SchemaVariant,
    WizardSession,
};
use std::sync::Arc;
use tracing::info;

pub(crate) fn load_config(schema: Option<SchemaVariant>) -> Result<AppConfig, AppError> {
    let mut config = AppConfig::load()?;
    if let Some(schema) = schema {
        config.wizard.schema = schema;
    }
    telemetry::init(&config.telemetry)?;
    Ok(config)
}

pub(crate) fn registry(config: &AppConfig) -> Result<Arc<FieldRegistry>, AppError> {
    Ok(Arc::new(config.wizard.schema.registry()?))
}

/// Session wired to the configured HTTP collaborators. The geocoder is only
/// attached when the schema has location fields.
pub(crate) fn build_session(config: &AppConfig) -> Result<WizardSession, AppError> {
    let registry = registry(config)?;
    let endpoints = &config.endpoints;
    let predictor = HttpPredictionClient::new(&endpoints.prediction_url, endpoints.request_timeout)?;

    let mut builder = WizardSession::builder(Arc::clone(&registry), Arc::new(predictor))
        .messages(config.wizard.messages.clone())
        .toast_duration(config.wizard.toast_duration);
    if registry.location().is_some() {
        let geocoder = NominatimClient::new(
            &endpoints.geocode_url,
            endpoints.geocode_language.clone(),
            endpoints.request_timeout,
        )?;
        builder = builder.geocoder(Arc::new(geocoder));
    }

    info!(
        environment = ?config.environment,
        schema = config.wizard.schema.key(),
        predictor = %endpoints.prediction_url,
        "wizard session ready"
    );
    Ok(builder.build()?)
}

pub(crate) fn theme_store(config: &AppConfig, system_is_dark: bool) -> Result<ThemeStore, AppError> {
    let persistence: Arc<dyn ThemePersistence> = match &config.theme_file {
        Some(path) => Arc::new(JsonFileThemePersistence::new(path)),
        None => Arc::new(InMemoryThemePersistence::default()),
    };
    Ok(ThemeStore::init(persistence, system_is_dark)?)
}

pub(crate) fn parse_schema(raw: &str) -> Result<SchemaVariant, String> {
    SchemaVariant::from_key(raw)
        .ok_or_else(|| format!("unknown schema '{raw}', expected 'bandung' or 'king_county'"))
}

pub(crate) fn parse_theme(raw: &str) -> Result<Theme, String> {
    Theme::parse(raw).ok_or_else(|| format!("unknown theme '{raw}', expected 'dark' or 'light'"))
}

/// `name=value`; the value may be empty to clear a field.
pub(crate) fn parse_assignment(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got '{raw}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing field name in '{raw}'"));
    }
    Ok((name.to_string(), value.to_string()))
}

/// `lat,lon` or `lat lon` in decimal degrees.
pub(crate) fn parse_coordinate(raw: &str) -> Result<Coordinate, String> {
    let mut parts = raw
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|part| !part.is_empty());
    let (Some(lat), Some(lon), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(format!("expected 'lat,lon', got '{raw}'"));
    };

    let latitude = lat
        .parse::<f64>()
        .map_err(|_| format!("invalid latitude '{lat}'"))?;
    let longitude = lon
        .parse::<f64>()
        .map_err(|_| format!("invalid longitude '{lon}'"))?;
    if !(-90.0..=90.0).contains(&latitude) {
        return Err(format!("latitude {latitude} is outside -90..90"));
    }
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(format!("longitude {longitude} is outside -180..180"));
    }
    Ok(Coordinate::new(latitude, longitude))
}
