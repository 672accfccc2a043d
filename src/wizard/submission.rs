use std::sync::Arc;

use tracing::{info, warn};

use super::form::FormState;
use super::gateway::GatewayError;
use super::prediction::{PredictionGateway, PredictionRequest, PredictionResponse};

#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionState {
    Idle,
    Submitting,
    Succeeded(PredictionResponse),
    /// Failure detail; the form stays intact for another attempt.
    Failed(String),
}

/// Owns the prediction call lifecycle. At most one request is in flight.
#[derive(Debug)]
pub struct SubmissionController {
    gateway: Arc<dyn PredictionGateway>,
    state: SubmissionState,
    last_result: Option<PredictionResponse>,
}

impl SubmissionController {
    pub fn new(gateway: Arc<dyn PredictionGateway>) -> Self {
        Self {
            gateway,
            state: SubmissionState::Idle,
            last_result: None,
        }
    }

    pub fn gateway(&self) -> Arc<dyn PredictionGateway> {
        Arc::clone(&self.gateway)
    }

    pub fn state(&self) -> &SubmissionState {
        &self.state
    }

    pub fn is_submitting(&self) -> bool {
        matches!(self.state, SubmissionState::Submitting)
    }

    /// Most recent successful prediction; survives later failures.
    pub fn last_result(&self) -> Option<&PredictionResponse> {
        self.last_result.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        match &self.state {
            SubmissionState::Failed(detail) => Some(detail),
            _ => None,
        }
    }

    /// Marks a request in flight and captures the form as it is right now.
    /// Returns `None` when another request has not settled yet.
    pub fn begin(&mut self, form: &FormState) -> Option<PredictionRequest> {
        if self.is_submitting() {
            return None;
        }
        self.state = SubmissionState::Submitting;
        Some(PredictionRequest::new(form.clone()))
    }

    /// Drops an in-flight marker whose request was cancelled.
    pub fn abandon(&mut self) {
        if self.is_submitting() {
            self.state = SubmissionState::Idle;
        }
    }

    pub fn finish(
        &mut self,
        result: Result<PredictionResponse, GatewayError>,
    ) -> Result<PredictionResponse, String> {
        match result {
            Ok(response) => {
                let price = response.display_price().unwrap_or_default();
                info!(
                    price = %price,
                    similar = response.similar_listings().len(),
                    "prediction received"
                );
                self.last_result = Some(response.clone());
                self.state = SubmissionState::Succeeded(response.clone());
                Ok(response)
            }
            Err(err) => {
                warn!(error = %err, "prediction request failed");
                let detail = err.to_string();
                self.state = SubmissionState::Failed(detail.clone());
                Err(detail)
            }
        }
    }

    /// Single-owner convenience: begin, call the gateway, finish.
    pub async fn submit(&mut self, form: &FormState) -> Option<Result<PredictionResponse, String>> {
        let request = self.begin(form)?;
        let result = self.gateway.predict(&request).await;
        Some(self.finish(result))
    }
}
