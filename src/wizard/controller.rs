use std::sync::Arc;

use chrono::{Local, NaiveDate};
use tracing::debug;

use super::form::{FieldValue, FillState, FormSnapshot, FormState};
use super::schema::{FieldKind, FieldRegistry, FieldSpec};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WizardError {
    #[error("unknown field '{0}'")]
    UnknownField(String),
    #[error("field '{0}' is derived and cannot be edited")]
    ReadOnlyField(&'static str),
    #[error("'{raw}' is not a valid {expected} for {field}")]
    InvalidNumber {
        field: &'static str,
        raw: String,
        expected: &'static str,
    },
    #[error("this schema has no location fields to fill from a map pick")]
    LocationUnsupported,
}

/// Result of gating an advance request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    Advanced { step: usize },
    Missing {
        field: &'static str,
        label: &'static str,
    },
    /// Last step with every field filled.
    ReadyToSubmit,
}

/// Step index, form values and fill flags for one wizard run.
#[derive(Debug, Clone)]
pub struct WizardController {
    registry: Arc<FieldRegistry>,
    current_step: usize,
    values: FormState,
    filled: FillState,
}

impl WizardController {
    pub fn new(registry: Arc<FieldRegistry>) -> Self {
        Self::with_date(registry, Local::now().date_naive())
    }

    /// Builds the controller with derived defaults taken from `today`.
    pub fn with_date(registry: Arc<FieldRegistry>, today: NaiveDate) -> Self {
        let mut values = FormState::default();
        let mut filled = FillState::default();
        for spec in registry.fields() {
            values.set(spec.name, spec.default.resolve(today));
            filled.set(spec.name, spec.default.is_derived());
        }

        Self {
            registry,
            current_step: 0,
            values,
            filled,
        }
    }

    pub fn registry(&self) -> &Arc<FieldRegistry> {
        &self.registry
    }

    pub fn current_step(&self) -> usize {
        self.current_step
    }

    pub fn is_last_step(&self) -> bool {
        self.current_step + 1 >= self.registry.step_count()
    }

    pub fn values(&self) -> &FormState {
        &self.values
    }

    pub fn filled(&self) -> &FillState {
        &self.filled
    }

    pub fn snapshot(&self) -> FormSnapshot {
        FormSnapshot {
            step: self.current_step,
            values: self.values.clone(),
            filled: self.filled.clone(),
        }
    }

    /// Applies raw user input. Numeric fields treat empty input as "not
    /// filled" with value 0; text fields are filled when the trimmed input is
    /// non-empty and store the input untrimmed.
    pub fn set_field(&mut self, name: &str, raw: &str) -> Result<FormSnapshot, WizardError> {
        let spec = self
            .registry
            .spec_of(name)
            .ok_or_else(|| WizardError::UnknownField(name.to_string()))?;
        if spec.read_only {
            return Err(WizardError::ReadOnlyField(spec.name));
        }

        let (value, filled) = match spec.kind {
            FieldKind::Text => (FieldValue::Text(raw.to_string()), !raw.trim().is_empty()),
            FieldKind::Numeric | FieldKind::Binary if raw.trim().is_empty() => {
                (FieldValue::Number(0.0), false)
            }
            FieldKind::Numeric | FieldKind::Binary => (parse_number(spec, raw)?, true),
        };

        let name = spec.name;
        debug!(field = name, filled, "field updated");
        self.values.set(name, value);
        self.filled.set(name, filled);
        Ok(self.snapshot())
    }

    /// Writes a value on behalf of the wizard itself (map picks, enrichment).
    pub(crate) fn assign(&mut self, name: &str, value: FieldValue, filled: bool) {
        self.values.set(name, value);
        self.filled.set(name, filled);
    }

    pub fn can_proceed(&self) -> bool {
        self.registry
            .fields_of(self.current_step)
            .iter()
            .all(|name| self.filled.is_filled(name))
    }

    pub fn all_filled(&self) -> bool {
        self.registry
            .flattened()
            .all(|name| self.filled.is_filled(name))
    }

    /// First unfilled field of the current step, in declaration order.
    pub fn first_missing_in_step(&self) -> Option<&FieldSpec> {
        self.registry
            .fields_of(self.current_step)
            .iter()
            .find(|name| !self.filled.is_filled(name))
            .and_then(|name| self.registry.spec_of(name))
    }

    /// First unfilled field across all steps, in step then in-step order.
    pub fn first_missing(&self) -> Option<&FieldSpec> {
        self.registry
            .flattened()
            .find(|name| !self.filled.is_filled(name))
            .and_then(|name| self.registry.spec_of(name))
    }

    pub fn request_advance(&mut self) -> Gate {
        if !self.is_last_step() {
            if let Some(spec) = self.first_missing_in_step() {
                return Gate::Missing {
                    field: spec.name,
                    label: spec.label,
                };
            }
            self.current_step += 1;
            debug!(step = self.current_step, "advanced to next step");
            return Gate::Advanced {
                step: self.current_step,
            };
        }

        match self.first_missing() {
            Some(spec) => Gate::Missing {
                field: spec.name,
                label: spec.label,
            },
            None => Gate::ReadyToSubmit,
        }
    }

    pub fn request_retreat(&mut self) -> usize {
        self.current_step = self.current_step.saturating_sub(1);
        self.current_step
    }
}

fn parse_number(spec: &FieldSpec, raw: &str) -> Result<FieldValue, WizardError> {
    let trimmed = raw.trim();
    if spec.kind == FieldKind::Binary {
        let flag = match trimmed.to_ascii_lowercase().as_str() {
            "1" | "yes" | "y" | "true" => Some(1.0),
            "0" | "no" | "n" | "false" => Some(0.0),
            _ => None,
        };
        return flag
            .map(FieldValue::Number)
            .ok_or_else(|| invalid_number(spec, raw));
    }

    trimmed
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .map(FieldValue::Number)
        .ok_or_else(|| invalid_number(spec, raw))
}

fn invalid_number(spec: &FieldSpec, raw: &str) -> WizardError {
    WizardError::InvalidNumber {
        field: spec.name,
        raw: raw.to_string(),
        expected: spec.kind.label(),
    }
}
