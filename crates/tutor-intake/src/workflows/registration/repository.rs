use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{RegistrationProgress, SubjectId, SubjectRole};

/// Storage abstraction for progress records, one per subject.
///
/// `load` returning `Ok(None)` is the "no record yet" signal, not an error.
/// `save` is a full upsert; concurrent saves for a subject are last-write-wins.
pub trait ProgressStore: Send + Sync {
    fn load(&self, subject_id: &SubjectId) -> Result<Option<RegistrationProgress>, StorageError>;
    fn save(&self, progress: &RegistrationProgress) -> Result<(), StorageError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("progress store unavailable: {0}")]
    Unavailable(String),
    #[error("stored progress could not be decoded: {0}")]
    Corrupt(String),
}

/// Lookup for the selectable options of catalog-backed steps.
pub trait OptionCatalog: Send + Sync {
    fn options_for_step(&self, query: &OptionQuery) -> Result<Vec<CatalogOption>, CatalogError>;
}

/// Options for `step_number`, narrowed to children of `dependent_ids` when present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionQuery {
    pub role: SubjectRole,
    pub step_number: u32,
    pub dependent_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogOption {
    pub id: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("option catalog unavailable: {0}")]
    Unavailable(String),
}

/// Outbound hook fired once when a registration becomes complete.
pub trait CompletionPublisher: Send + Sync {
    fn publish(&self, event: RegistrationCompleted) -> Result<(), PublishError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationCompleted {
    pub subject_id: SubjectId,
    pub role: SubjectRole,
    pub redirect_to: String,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("completion transport unavailable: {0}")]
    Transport(String),
}
