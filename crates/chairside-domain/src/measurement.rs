//! Measurements and raw case inputs
//!
//! Form fields arrive as loosely typed values. A field that is empty or
//! cannot be read as a number is [`Reading::Missing`], a state distinct
//! from zero.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A numeric reading taken from a form field
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reading {
    /// A finite numeric value
    Value(f64),
    /// Absent, empty or unparseable input
    Missing,
}

impl Reading {
    /// Build a reading from a number, treating NaN and infinities as missing
    pub fn from_f64(value: f64) -> Self {
        if value.is_finite() {
            Reading::Value(value)
        } else {
            Reading::Missing
        }
    }

    /// Parse free text typed into a form field
    ///
    /// Accepts a comma as decimal separator ("21,5").
    pub fn parse(text: &str) -> Self {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Reading::Missing;
        }
        trimmed
            .replace(',', ".")
            .parse::<f64>()
            .map(Reading::from_f64)
            .unwrap_or(Reading::Missing)
    }

    /// Get the value, if present
    pub fn value(&self) -> Option<f64> {
        match self {
            Reading::Value(v) => Some(*v),
            Reading::Missing => None,
        }
    }
}

/// A named numeric measurement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    /// Display name (e.g. "Pain score")
    pub name: String,
    /// The reading
    pub reading: Reading,
    /// Unit label (e.g. "mm")
    pub unit: Option<String>,
}

impl Measurement {
    /// Create a new measurement
    pub fn new(name: impl Into<String>, reading: Reading, unit: Option<String>) -> Self {
        Self {
            name: name.into(),
            reading,
            unit,
        }
    }
}

/// One raw form value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InputValue {
    /// Checkbox or toggle
    Bool(bool),
    /// Numeric field
    Number(f64),
    /// Text field or dropdown selection
    Text(String),
    /// Explicit `null`
    Missing,
}

impl InputValue {
    /// Interpret the value as a numeric reading
    pub fn reading(&self) -> Reading {
        match self {
            InputValue::Number(n) => Reading::from_f64(*n),
            InputValue::Text(s) => Reading::parse(s),
            InputValue::Bool(_) | InputValue::Missing => Reading::Missing,
        }
    }

    /// Parse a value typed on a command line or REPL
    ///
    /// `true`/`false` become booleans, numbers become numbers, an empty
    /// string or `null` is missing, anything else is text.
    pub fn parse_loose(text: &str) -> Self {
        let trimmed = text.trim();
        match trimmed.to_lowercase().as_str() {
            "" | "null" => return InputValue::Missing,
            "true" => return InputValue::Bool(true),
            "false" => return InputValue::Bool(false),
            _ => {}
        }
        match Reading::parse(trimmed) {
            Reading::Value(v) => InputValue::Number(v),
            Reading::Missing => InputValue::Text(trimmed.to_string()),
        }
    }
}

impl From<bool> for InputValue {
    fn from(value: bool) -> Self {
        InputValue::Bool(value)
    }
}

impl From<f64> for InputValue {
    fn from(value: f64) -> Self {
        InputValue::Number(value)
    }
}

impl From<&str> for InputValue {
    fn from(value: &str) -> Self {
        InputValue::Text(value.to_string())
    }
}

/// Where a range rule takes its measurement from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasurementSource {
    /// A single input field
    Field(String),
    /// `minuend - subtrahend` of two input fields
    Difference {
        /// Field the other is subtracted from
        minuend: String,
        /// Field subtracted
        subtrahend: String,
    },
}

impl MeasurementSource {
    /// Input fields this source reads
    pub fn fields(&self) -> Vec<&str> {
        match self {
            MeasurementSource::Field(key) => vec![key.as_str()],
            MeasurementSource::Difference { minuend, subtrahend } => {
                vec![minuend.as_str(), subtrahend.as_str()]
            }
        }
    }
}

/// The named bag of inputs for one case evaluation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CaseInput {
    fields: BTreeMap<String, InputValue>,
}

impl CaseInput {
    /// Create an empty case
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter
    pub fn with(mut self, key: impl Into<String>, value: impl Into<InputValue>) -> Self {
        self.set(key, value);
        self
    }

    /// Set a field
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<InputValue>) {
        self.fields.insert(key.into(), value.into());
    }

    /// Remove a field, returning its previous value
    pub fn remove(&mut self, key: &str) -> Option<InputValue> {
        self.fields.remove(key)
    }

    /// Get a field; absent keys are `None`
    pub fn get(&self, key: &str) -> Option<&InputValue> {
        self.fields.get(key).filter(|v| **v != InputValue::Missing)
    }

    /// Resolve a measurement source to a reading
    pub fn reading(&self, source: &MeasurementSource) -> Reading {
        match source {
            MeasurementSource::Field(key) => self.field_reading(key),
            MeasurementSource::Difference { minuend, subtrahend } => {
                match (self.field_reading(minuend), self.field_reading(subtrahend)) {
                    (Reading::Value(a), Reading::Value(b)) => Reading::from_f64(a - b),
                    _ => Reading::Missing,
                }
            }
        }
    }

    fn field_reading(&self, key: &str) -> Reading {
        self.get(key).map(InputValue::reading).unwrap_or(Reading::Missing)
    }

    /// Iterate over all fields in key order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &InputValue)> {
        self.fields.iter()
    }

    /// Number of fields set
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether no fields are set
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
