use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::form::FormState;
use super::gateway::{http_client, GatewayError};

const PREDICT_ENDPOINT: &str = "prediction endpoint";

/// Flat record posted to the prediction service.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PredictionRequest(FormState);

impl PredictionRequest {
    pub fn new(form: FormState) -> Self {
        Self(form)
    }

    pub fn form(&self) -> &FormState {
        &self.0
    }
}

/// Prediction payload. Both backend shapes decode here: the local shape
/// (`predicted_price`, `formatted`, `similar`) and the converted shape
/// (`price_usd`, `price_idr`, `exchange_rate`). Unknown keys are kept.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PredictionResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predicted_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formatted: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similar: Option<Vec<ComparableListing>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_usd: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_idr: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exchange_rate: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PriceEstimate {
    Local {
        amount: f64,
        formatted: String,
    },
    Converted {
        usd: f64,
        idr: f64,
        exchange_rate: f64,
    },
}

impl PredictionResponse {
    pub fn estimate(&self) -> Option<PriceEstimate> {
        if let Some(amount) = self.predicted_price {
            let formatted = self
                .formatted
                .clone()
                .filter(|text| !text.trim().is_empty())
                .unwrap_or_else(|| format_rupiah(amount));
            return Some(PriceEstimate::Local { amount, formatted });
        }

        match (self.price_usd, self.price_idr) {
            (Some(usd), Some(idr)) => Some(PriceEstimate::Converted {
                usd,
                idr,
                exchange_rate: self
                    .exchange_rate
                    .unwrap_or(if usd != 0.0 { idr / usd } else { 0.0 }),
            }),
            _ => None,
        }
    }

    /// Headline string for the result card.
    pub fn display_price(&self) -> Option<String> {
        self.estimate().map(|estimate| match estimate {
            PriceEstimate::Local { formatted, .. } => formatted,
            PriceEstimate::Converted { idr, .. } => format_rupiah(idr),
        })
    }

    /// Comparable listings; empty when the service sent none.
    pub fn similar_listings(&self) -> &[ComparableListing] {
        self.similar.as_deref().unwrap_or(&[])
    }
}

/// A known sale returned next to the prediction.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ComparableListing {
    #[serde(rename = "Price")]
    pub price: f64,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl ComparableListing {
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// Attribute rendered for a table cell; strings lose their JSON quotes.
    pub fn attribute_text(&self, name: &str) -> String {
        match self.attributes.get(name) {
            Some(Value::String(text)) => text.clone(),
            Some(Value::Null) | None => "-".to_string(),
            Some(other) => other.to_string(),
        }
    }
}

/// `Rp 1.250.000` style rendering, rounded to whole rupiah.
pub fn format_rupiah(value: f64) -> String {
    let rounded = value.round();
    let sign = if rounded < 0.0 { "-" } else { "" };
    format!("{sign}Rp {}", group_digits(rounded.abs() as u64, '.'))
}

/// `$452,300.12` style rendering.
pub fn format_usd(value: f64) -> String {
    let cents = (value.abs() * 100.0).round() as u64;
    let sign = if value < 0.0 && cents > 0 { "-" } else { "" };
    format!(
        "{sign}${}.{:02}",
        group_digits(cents / 100, ','),
        cents % 100
    )
}

fn group_digits(value: u64, separator: char) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(separator);
        }
        grouped.push(digit);
    }
    grouped
}

/// Outbound prediction service.
#[async_trait]
pub trait PredictionGateway: Debug + Send + Sync {
    async fn predict(
        &self,
        request: &PredictionRequest,
    ) -> Result<PredictionResponse, GatewayError>;
}

/// `POST {base}/predict` over reqwest.
#[derive(Debug, Clone)]
pub struct HttpPredictionClient {
    client: reqwest::Client,
    url: String,
}

impl HttpPredictionClient {
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, GatewayError> {
        Ok(Self {
            client: http_client(timeout)?,
            url: format!("{}/predict", base_url.trim_end_matches('/')),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl PredictionGateway for HttpPredictionClient {
    async fn predict(
        &self,
        request: &PredictionRequest,
    ) -> Result<PredictionResponse, GatewayError> {
        let response = self
            .client
            .post(&self.url)
            .json(request)
            .send()
            .await
            .map_err(|source| GatewayError::Transport {
                endpoint: PREDICT_ENDPOINT,
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::Status {
                endpoint: PREDICT_ENDPOINT,
                status: status.as_u16(),
            });
        }

        let body: PredictionResponse =
            response.json().await.map_err(|err| GatewayError::Decode {
                endpoint: PREDICT_ENDPOINT,
                detail: err.to_string(),
            })?;

        if body.estimate().is_none() {
            return Err(GatewayError::Decode {
                endpoint: PREDICT_ENDPOINT,
                detail: "response carries no price".to_string(),
            });
        }

        Ok(body)
    }
}
