mod variants;

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use super::form::FieldValue;

pub use variants::SchemaVariant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Numeric,
    Text,
    /// 0/1 flag stored as a number.
    Binary,
}

impl FieldKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Numeric => "number",
            Self::Text => "text",
            Self::Binary => "yes/no",
        }
    }

    pub const fn is_numeric(self) -> bool {
        matches!(self, Self::Numeric | Self::Binary)
    }
}

/// Value a field holds before the user supplies one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldDefault {
    Number(f64),
    Blank,
    /// Derived from the session's calendar date; starts filled.
    CurrentMonth,
}

impl FieldDefault {
    pub(crate) fn resolve(self, today: NaiveDate) -> FieldValue {
        match self {
            Self::Number(value) => FieldValue::Number(value),
            Self::Blank => FieldValue::Text(String::new()),
            Self::CurrentMonth => FieldValue::Number(f64::from(today.month())),
        }
    }

    pub const fn is_derived(self) -> bool {
        matches!(self, Self::CurrentMonth)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub step: Option<f64>,
    pub helper_text: &'static str,
    pub default: FieldDefault,
    pub read_only: bool,
}

impl FieldSpec {
    pub fn numeric(name: &'static str, label: &'static str, helper_text: &'static str) -> Self {
        Self {
            name,
            label,
            kind: FieldKind::Numeric,
            min: None,
            max: None,
            step: None,
            helper_text,
            default: FieldDefault::Number(0.0),
            read_only: false,
        }
    }

    pub fn text(name: &'static str, label: &'static str, helper_text: &'static str) -> Self {
        Self {
            kind: FieldKind::Text,
            default: FieldDefault::Blank,
            ..Self::numeric(name, label, helper_text)
        }
    }

    /// Binary fields start at the `-1` "unset" sentinel.
    pub fn binary(name: &'static str, label: &'static str, helper_text: &'static str) -> Self {
        Self {
            kind: FieldKind::Binary,
            min: Some(0.0),
            max: Some(1.0),
            step: Some(1.0),
            default: FieldDefault::Number(-1.0),
            ..Self::numeric(name, label, helper_text)
        }
    }

    pub fn min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    pub fn max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    pub fn step(mut self, step: f64) -> Self {
        self.step = Some(step);
        self
    }

    pub fn current_month(mut self) -> Self {
        self.default = FieldDefault::CurrentMonth;
        self.read_only = true;
        self
    }

    /// Human readable range hint, e.g. `1–20, step 1`.
    pub fn range_hint(&self) -> Option<String> {
        let mut parts = Vec::new();
        match (self.min, self.max) {
            (Some(min), Some(max)) => parts.push(format!("{min}–{max}")),
            (Some(min), None) => parts.push(format!("≥ {min}")),
            (None, Some(max)) => parts.push(format!("≤ {max}")),
            (None, None) => {}
        }
        if let Some(step) = self.step {
            parts.push(format!("step {step}"));
        }
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(", "))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepSpec {
    pub key: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub fields: Vec<&'static str>,
}

/// Names the fields a location pick writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocationBinding {
    pub latitude: &'static str,
    pub longitude: &'static str,
    pub city: &'static str,
    pub district: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("schema declares no steps")]
    NoSteps,
    #[error("step '{0}' has no fields")]
    EmptyStep(&'static str),
    #[error("field '{0}' is declared more than once")]
    DuplicateField(&'static str),
    #[error("step '{step}' references unknown field '{field}'")]
    UnknownField {
        step: &'static str,
        field: &'static str,
    },
    #[error("field '{0}' is not assigned to any step")]
    UnassignedField(&'static str),
    #[error("field '{0}' belongs to more than one step")]
    FieldInMultipleSteps(&'static str),
    #[error("location field '{field}' must be {expected}")]
    LocationFieldKind {
        field: &'static str,
        expected: &'static str,
    },
    #[error("location binding references unknown field '{0}'")]
    UnknownLocationField(&'static str),
}

/// Field metadata plus the ordered steps that partition it.
#[derive(Debug, Clone)]
pub struct FieldRegistry {
    fields: Vec<FieldSpec>,
    steps: Vec<StepSpec>,
    location: Option<LocationBinding>,
}

impl FieldRegistry {
    pub fn new(fields: Vec<FieldSpec>, steps: Vec<StepSpec>) -> Result<Self, SchemaError> {
        if steps.is_empty() {
            return Err(SchemaError::NoSteps);
        }

        let mut declared = BTreeSet::new();
        for field in &fields {
            if !declared.insert(field.name) {
                return Err(SchemaError::DuplicateField(field.name));
            }
        }

        let mut owner: BTreeMap<&'static str, &'static str> = BTreeMap::new();
        for step in &steps {
            if step.fields.is_empty() {
                return Err(SchemaError::EmptyStep(step.key));
            }
            for &field in &step.fields {
                if !declared.contains(field) {
                    return Err(SchemaError::UnknownField {
                        step: step.key,
                        field,
                    });
                }
                if owner.insert(field, step.key).is_some() {
                    return Err(SchemaError::FieldInMultipleSteps(field));
                }
            }
        }

        if let Some(orphan) = fields.iter().find(|field| !owner.contains_key(field.name)) {
            return Err(SchemaError::UnassignedField(orphan.name));
        }

        Ok(Self {
            fields,
            steps,
            location: None,
        })
    }

    pub fn with_location(mut self, binding: LocationBinding) -> Result<Self, SchemaError> {
        let checks = [
            (binding.latitude, true),
            (binding.longitude, true),
            (binding.city, false),
            (binding.district, false),
        ];
        for (name, numeric) in checks {
            let spec = self
                .spec_of(name)
                .ok_or(SchemaError::UnknownLocationField(name))?;
            if spec.kind.is_numeric() != numeric || spec.kind == FieldKind::Binary {
                return Err(SchemaError::LocationFieldKind {
                    field: name,
                    expected: if numeric { "numeric" } else { "text" },
                });
            }
        }
        self.location = Some(binding);
        Ok(self)
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    pub fn steps(&self) -> &[StepSpec] {
        &self.steps
    }

    pub fn step(&self, index: usize) -> Option<&StepSpec> {
        self.steps.get(index)
    }

    /// Ordered field names of a step; empty for an out-of-range index.
    pub fn fields_of(&self, index: usize) -> &[&'static str] {
        self.steps
            .get(index)
            .map(|step| step.fields.as_slice())
            .unwrap_or(&[])
    }

    pub fn spec_of(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Field names in step order, then in-step order.
    pub fn flattened(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.steps.iter().flat_map(|step| step.fields.iter().copied())
    }

    pub fn location(&self) -> Option<&LocationBinding> {
        self.location.as_ref()
    }
}
