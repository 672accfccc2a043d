//! Multi-step property wizard: field schema, gating state machine, location
//! enrichment and prediction submission.

mod controller;
pub mod form;
pub mod gateway;
pub mod geocode;
mod messages;
pub mod prediction;
pub mod schema;
mod session;
mod submission;
mod toast;

pub use controller::{Gate, WizardController, WizardError};
pub use form::{FieldValue, FillState, FormSnapshot, FormState};
pub use gateway::GatewayError;
pub use geocode::{
    Address, Coordinate, EnrichmentOutcome, GeocodeEnricher, NominatimClient, PickTicket,
    ReverseGeocoder,
};
pub use messages::{Language, MessageCatalog};
pub use prediction::{
    format_rupiah, format_usd, ComparableListing, HttpPredictionClient, PredictionGateway,
    PredictionRequest, PredictionResponse, PriceEstimate,
};
pub use schema::{
    FieldDefault, FieldKind, FieldRegistry, FieldSpec, LocationBinding, SchemaError,
    SchemaVariant, StepSpec,
};
pub use session::{AdvanceOutcome, SessionBuilder, SessionView, WizardSession};
pub use submission::{SubmissionController, SubmissionState};
pub use toast::{Toast, ToastLevel, ToastNotifier, DEFAULT_TOAST_DURATION};
