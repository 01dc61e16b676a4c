use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identity of the student or teacher a progress record belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectId(pub String);

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubjectRole {
    Student,
    Teacher,
}

impl SubjectRole {
    pub const fn ordered() -> [Self; 2] {
        [Self::Student, Self::Teacher]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Student => "STUDENT",
            Self::Teacher => "TEACHER",
        }
    }

    /// Lowercase form used in URL paths.
    pub const fn slug(self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Teacher => "teacher",
        }
    }

    pub fn from_slug(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "student" => Some(Self::Student),
            "teacher" => Some(Self::Teacher),
            _ => None,
        }
    }

    pub const fn total_steps(self) -> u32 {
        match self {
            Self::Student => 10,
            Self::Teacher => 8,
        }
    }
}

impl fmt::Display for SubjectRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A submitted value: free text, a single selection, or a list of selections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    List(Vec<String>),
}

impl FieldValue {
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Text(value) => value.trim().is_empty(),
            FieldValue::List(values) => values.iter().all(|value| value.trim().is_empty()),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(value) => Some(value.as_str()),
            FieldValue::List(_) => None,
        }
    }

    /// Selected identifiers, treating a lone string as a one-element selection.
    pub fn selections(&self) -> Vec<&str> {
        match self {
            FieldValue::Text(value) if value.trim().is_empty() => Vec::new(),
            FieldValue::Text(value) => vec![value.as_str()],
            FieldValue::List(values) => values.iter().map(String::as_str).collect(),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<Vec<&str>> for FieldValue {
    fn from(values: Vec<&str>) -> Self {
        FieldValue::List(values.into_iter().map(str::to_string).collect())
    }
}

/// Field bag keyed by step-defined field names.
pub type Fields = BTreeMap<String, FieldValue>;

/// Persisted registration state for one subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrationProgress {
    pub subject_id: SubjectId,
    pub role: SubjectRole,
    pub current_step: u32,
    pub total_steps: u32,
    #[serde(default)]
    pub fields: Fields,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl RegistrationProgress {
    /// State used when the store has no record for the subject yet.
    pub fn initial(subject_id: SubjectId, role: SubjectRole) -> Self {
        Self {
            subject_id,
            role,
            current_step: 1,
            total_steps: role.total_steps(),
            fields: Fields::new(),
            is_completed: false,
            updated_at: None,
        }
    }

    pub fn steps_completed(&self) -> u32 {
        self.current_step.saturating_sub(1).min(self.total_steps)
    }

    pub fn view(&self) -> ProgressView {
        ProgressView {
            subject_id: self.subject_id.clone(),
            role: self.role,
            current_step: self.current_step,
            total_steps: self.total_steps,
            steps_completed: self.steps_completed(),
            is_completed: self.is_completed,
            fields: self.fields.clone(),
            updated_at: self.updated_at,
        }
    }
}

/// Response shape for progress reads and step submissions.
#[derive(Debug, Clone, Serialize)]
pub struct ProgressView {
    pub subject_id: SubjectId,
    pub role: SubjectRole,
    pub current_step: u32,
    pub total_steps: u32,
    pub steps_completed: u32,
    pub is_completed: bool,
    pub fields: Fields,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}
