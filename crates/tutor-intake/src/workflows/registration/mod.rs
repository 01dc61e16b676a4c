//! Multi-step registration progress for student intake and teacher sign-up.
//!
//! A submission flows through the service: the stored record is loaded (a
//! missing record is a fresh step-1 state), catalog options for the step are
//! fetched, the sequencer validates and advances, the store persists, and the
//! completion gate decides whether the client should be redirected.

pub mod completion;
pub mod domain;
pub mod repository;
pub mod router;
pub mod sequencer;
pub mod service;
pub mod steps;
pub mod validator;

#[cfg(test)]
mod tests;

pub use completion::{CompletionGate, CompletionOutcome};
pub use domain::{
    FieldValue, Fields, ProgressView, RegistrationProgress, SubjectId, SubjectRole,
};
pub use repository::{
    CatalogError, CatalogOption, CompletionPublisher, OptionCatalog, OptionQuery, ProgressStore,
    PublishError, RegistrationCompleted, StorageError,
};
pub use router::{registration_router, StepSubmission};
pub use sequencer::{SequencerError, StepSequencer};
pub use service::{RegistrationService, RegistrationServiceError, StepOutcome, SubmissionView};
pub use steps::{FieldKind, FieldSpec, OptionSource, RegistrationBlueprint, StepDefinition};
pub use validator::{OptionSets, StepValidator, ValidationError};
