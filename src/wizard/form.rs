use std::collections::BTreeMap;
use std::fmt;

use serde::{Serialize, Serializer};

/// Current value of one field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Number(f64),
    Text(String),
}

impl FieldValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            Self::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Number(_) => None,
            Self::Text(value) => Some(value),
        }
    }
}

/// Whole numbers go out as JSON integers so integer-typed backend fields
/// accept them.
impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Number(value)
                if value.is_finite() && value.fract() == 0.0 && value.abs() < 9.0e15 =>
            {
                serializer.serialize_i64(*value as i64)
            }
            Self::Number(value) => serializer.serialize_f64(*value),
            Self::Text(value) => serializer.serialize_str(value),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(value) => write!(f, "{value}"),
            Self::Text(value) => write!(f, "{value}"),
        }
    }
}

/// Field name to value; serializes as the flat prediction record.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FormState(BTreeMap<String, FieldValue>);

impl FormState {
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.0.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn set(&mut self, name: &str, value: FieldValue) {
        self.0.insert(name.to_string(), value);
    }
}

/// Field name to "explicitly provided" flag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FillState(BTreeMap<String, bool>);

impl FillState {
    pub fn is_filled(&self, name: &str) -> bool {
        self.0.get(name).copied().unwrap_or(false)
    }

    pub fn count_filled(&self) -> usize {
        self.0.values().filter(|filled| **filled).count()
    }

    pub(crate) fn set(&mut self, name: &str, filled: bool) {
        self.0.insert(name.to_string(), filled);
    }
}

/// Immutable view of the form after a mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct FormSnapshot {
    pub step: usize,
    pub values: FormState,
    pub filled: FillState,
}

impl FormSnapshot {
    /// Value as the input widget shows it: blank when not filled.
    pub fn display_value(&self, name: &str) -> String {
        match self.values.get(name) {
            Some(value) if self.filled.is_filled(name) => value.to_string(),
            Some(FieldValue::Text(text)) => text.clone(),
            _ => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integral_numbers_serialize_without_fraction() {
        let mut form = FormState::default();
        form.set("Land", FieldValue::Number(120.0));
        form.set("Bathroom", FieldValue::Number(1.5));
        form.set("City_Regency", FieldValue::Text("Bandung".to_string()));

        let json = serde_json::to_string(&form).expect("form serializes");
        assert_eq!(
            json,
            r#"{"Bathroom":1.5,"City_Regency":"Bandung","Land":120}"#
        );
    }

    #[test]
    fn display_value_hides_unfilled_numbers() {
        let mut values = FormState::default();
        values.set("Land", FieldValue::Number(0.0));
        values.set("Location", FieldValue::Text("  ".to_string()));
        let snapshot = FormSnapshot {
            step: 0,
            values,
            filled: FillState::default(),
        };
        assert_eq!(snapshot.display_value("Land"), "");
        assert_eq!(snapshot.display_value("Location"), "  ");
    }
}
