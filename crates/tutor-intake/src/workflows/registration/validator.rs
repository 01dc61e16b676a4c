use std::collections::{BTreeMap, BTreeSet, HashSet};

use super::domain::{FieldValue, Fields};
use super::steps::{FieldKind, FieldSpec, OptionSource, StepDefinition};

/// Reasons a step payload is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("required field '{field}' is missing or empty")]
    MissingRequiredField { field: String },
    #[error("'{value}' is not a valid option for field '{field}'")]
    InvalidOptionValue { field: String, value: String },
    #[error("field '{field}' must be a non-negative number (found '{value}')")]
    InvalidNumber { field: String, value: String },
    #[error("field '{field}' accepts a single value")]
    UnexpectedShape { field: String },
}

impl ValidationError {
    pub const fn kind(&self) -> &'static str {
        match self {
            ValidationError::MissingRequiredField { .. } => "missing_required_field",
            ValidationError::InvalidOptionValue { .. } => "invalid_option_value",
            ValidationError::InvalidNumber { .. } => "invalid_number",
            ValidationError::UnexpectedShape { .. } => "unexpected_shape",
        }
    }

    pub fn field(&self) -> &str {
        match self {
            ValidationError::MissingRequiredField { field }
            | ValidationError::InvalidOptionValue { field, .. }
            | ValidationError::InvalidNumber { field, .. }
            | ValidationError::UnexpectedShape { field } => field,
        }
    }
}

/// Catalog-backed option universes resolved for a single submission.
///
/// A catalog field with no entry here accepts nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionSets {
    sets: BTreeMap<String, BTreeSet<String>>,
}

impl OptionSets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<I>(&mut self, field: &str, ids: I)
    where
        I: IntoIterator<Item = String>,
    {
        self.sets
            .entry(field.to_string())
            .or_default()
            .extend(ids);
    }

    pub fn get(&self, field: &str) -> Option<&BTreeSet<String>> {
        self.sets.get(field)
    }
}

/// Checks a payload against a step's field contract and normalizes it.
#[derive(Debug, Clone, Copy, Default)]
pub struct StepValidator;

impl StepValidator {
    pub fn validate(
        &self,
        step: &StepDefinition,
        mut payload: Fields,
        options: &OptionSets,
    ) -> Result<Fields, ValidationError> {
        let mut accepted = Fields::new();

        for spec in &step.fields {
            let value = match payload.remove(spec.name) {
                Some(raw) => normalize(spec, raw)?,
                None => None,
            };

            let Some(value) = value else {
                if spec.required {
                    return Err(ValidationError::MissingRequiredField {
                        field: spec.name.to_string(),
                    });
                }
                continue;
            };

            check_value(spec, &value, options)?;
            accepted.insert(spec.name.to_string(), value);
        }

        if !payload.is_empty() {
            tracing::debug!(
                step = step.step_number,
                ignored = ?payload.keys().collect::<Vec<_>>(),
                "dropping fields not defined for step"
            );
        }

        Ok(accepted)
    }
}

/// Trim text, trim and de-duplicate selections. `None` means "nothing submitted".
fn normalize(spec: &FieldSpec, raw: FieldValue) -> Result<Option<FieldValue>, ValidationError> {
    match (spec.kind, raw) {
        (FieldKind::MultiSelect, raw) => {
            let mut seen = HashSet::new();
            let selections: Vec<String> = raw
                .selections()
                .into_iter()
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .filter(|value| seen.insert(value.to_string()))
                .map(str::to_string)
                .collect();

            if selections.is_empty() {
                Ok(None)
            } else {
                Ok(Some(FieldValue::List(selections)))
            }
        }
        (_, FieldValue::Text(value)) => {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                Ok(None)
            } else {
                Ok(Some(FieldValue::Text(trimmed.to_string())))
            }
        }
        (_, FieldValue::List(values)) => {
            if values.iter().all(|value| value.trim().is_empty()) {
                Ok(None)
            } else {
                Err(ValidationError::UnexpectedShape {
                    field: spec.name.to_string(),
                })
            }
        }
    }
}

fn check_value(
    spec: &FieldSpec,
    value: &FieldValue,
    options: &OptionSets,
) -> Result<(), ValidationError> {
    if spec.kind == FieldKind::Numeric {
        let raw = value.as_text().unwrap_or_default();
        return match raw.parse::<f64>() {
            Ok(number) if number.is_finite() && number >= 0.0 => Ok(()),
            _ => Err(ValidationError::InvalidNumber {
                field: spec.name.to_string(),
                value: raw.to_string(),
            }),
        };
    }

    let allowed: Option<BTreeSet<&str>> = match spec.options {
        OptionSource::Unconstrained => None,
        OptionSource::Static { values } => Some(values.iter().copied().collect()),
        OptionSource::Catalog { .. } => Some(
            options
                .get(spec.name)
                .map(|set| set.iter().map(String::as_str).collect())
                .unwrap_or_default(),
        ),
    };

    let Some(allowed) = allowed else {
        return Ok(());
    };

    match value
        .selections()
        .into_iter()
        .find(|selection| !allowed.contains(selection))
    {
        Some(invalid) => Err(ValidationError::InvalidOptionValue {
            field: spec.name.to_string(),
            value: invalid.to_string(),
        }),
        None => Ok(()),
    }
}
