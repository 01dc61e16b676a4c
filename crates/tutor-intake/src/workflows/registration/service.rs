use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::completion::{CompletionGate, CompletionOutcome};
use super::domain::{Fields, ProgressView, RegistrationProgress, SubjectId, SubjectRole};
use super::repository::{
    CatalogError, CatalogOption, CompletionPublisher, OptionCatalog, OptionQuery, ProgressStore,
    RegistrationCompleted, StorageError,
};
use super::sequencer::{SequencerError, StepSequencer};
use super::steps::{OptionSource, RegistrationBlueprint, StepDefinition};
use super::validator::OptionSets;

/// Service composing the step sequencer, progress store, and option catalog.
pub struct RegistrationService<S, C, P> {
    store: Arc<S>,
    catalog: Arc<C>,
    publisher: Arc<P>,
    sequencer: StepSequencer,
    gate: CompletionGate,
    student: RegistrationBlueprint,
    teacher: RegistrationBlueprint,
}

/// Result of an accepted step submission.
#[derive(Debug, Clone)]
pub struct StepOutcome {
    pub progress: RegistrationProgress,
    pub completion: CompletionOutcome,
}

impl StepOutcome {
    pub fn view(&self) -> SubmissionView {
        SubmissionView {
            progress: self.progress.view(),
            completion: self.completion.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmissionView {
    #[serde(flatten)]
    pub progress: ProgressView,
    pub completion: CompletionOutcome,
}

impl<S, C, P> RegistrationService<S, C, P>
where
    S: ProgressStore + 'static,
    C: OptionCatalog + 'static,
    P: CompletionPublisher + 'static,
{
    pub fn new(store: Arc<S>, catalog: Arc<C>, publisher: Arc<P>) -> Self {
        Self {
            store,
            catalog,
            publisher,
            sequencer: StepSequencer::default(),
            gate: CompletionGate,
            student: RegistrationBlueprint::student_intake(),
            teacher: RegistrationBlueprint::teacher_registration(),
        }
    }

    pub fn blueprint(&self, role: SubjectRole) -> &RegistrationBlueprint {
        match role {
            SubjectRole::Student => &self.student,
            SubjectRole::Teacher => &self.teacher,
        }
    }

    /// Validate and apply one step, persisting the new state on success.
    ///
    /// Nothing is written unless the whole submission is accepted.
    pub fn submit_step(
        &self,
        role: SubjectRole,
        subject_id: &SubjectId,
        step: u32,
        payload: Fields,
    ) -> Result<StepOutcome, RegistrationServiceError> {
        let progress = self.load_or_initial(role, subject_id)?;
        let blueprint = self.blueprint(role);

        let definition = self.sequencer.admit(&progress, blueprint, step)?;
        let options = self.resolve_options(role, definition, &progress)?;

        let mut next = self
            .sequencer
            .advance(&progress, blueprint, step, payload, &options)?;
        next.updated_at = Some(Utc::now());

        self.store.save(&next)?;
        debug!(
            subject = %subject_id,
            %role,
            step,
            current_step = next.current_step,
            "registration step accepted"
        );

        let completion = self.gate.on_advance(&next);
        if let CompletionOutcome::Completed { redirect_to, .. } = &completion {
            if !progress.is_completed {
                info!(subject = %subject_id, %role, "registration completed");
                self.notify_completed(&next, redirect_to);
            }
        }

        Ok(StepOutcome {
            progress: next,
            completion,
        })
    }

    /// Fetch the stored progress for a subject, if any.
    pub fn progress(
        &self,
        role: SubjectRole,
        subject_id: &SubjectId,
    ) -> Result<Option<RegistrationProgress>, RegistrationServiceError> {
        match self.store.load(subject_id)? {
            Some(progress) if progress.role != role => Err(RegistrationServiceError::RoleMismatch {
                subject_id: subject_id.clone(),
                existing: progress.role,
                requested: role,
            }),
            other => Ok(other),
        }
    }

    /// Options offered for `step`, narrowed by the caller's earlier selections.
    pub fn options(
        &self,
        role: SubjectRole,
        step: u32,
        dependent_ids: &[String],
    ) -> Result<Vec<CatalogOption>, RegistrationServiceError> {
        let blueprint = self.blueprint(role);
        let definition = blueprint
            .step(step)
            .ok_or(SequencerError::StepOutOfRange {
                step,
                total_steps: blueprint.total_steps(),
            })?;

        let mut options = Vec::new();
        for spec in &definition.fields {
            match spec.options {
                OptionSource::Catalog { depends_on } => {
                    // Root fields resolve the same universe submission validates against.
                    let parents = match depends_on {
                        Some(_) if dependent_ids.is_empty() => continue,
                        Some(_) => dependent_ids.to_vec(),
                        None => Vec::new(),
                    };
                    options.extend(self.catalog.options_for_step(&OptionQuery {
                        role,
                        step_number: step,
                        dependent_ids: parents,
                    })?);
                }
                OptionSource::Static { values } => {
                    options.extend(values.iter().map(|value| CatalogOption {
                        id: value.to_string(),
                        label: value.to_string(),
                        description: None,
                    }));
                }
                OptionSource::Unconstrained => {}
            }
        }

        Ok(options)
    }

    fn load_or_initial(
        &self,
        role: SubjectRole,
        subject_id: &SubjectId,
    ) -> Result<RegistrationProgress, RegistrationServiceError> {
        Ok(self
            .progress(role, subject_id)?
            .unwrap_or_else(|| RegistrationProgress::initial(subject_id.clone(), role)))
    }

    /// Option universes for the catalog fields of `definition`, fetched per submission.
    fn resolve_options(
        &self,
        role: SubjectRole,
        definition: &StepDefinition,
        progress: &RegistrationProgress,
    ) -> Result<OptionSets, CatalogError> {
        let mut sets = OptionSets::new();

        for spec in definition.catalog_fields() {
            let OptionSource::Catalog { depends_on } = spec.options else {
                continue;
            };

            let dependent_ids: Vec<String> = match depends_on {
                Some(parent) => progress
                    .fields
                    .get(parent)
                    .map(|value| value.selections().into_iter().map(str::to_string).collect())
                    .unwrap_or_default(),
                None => Vec::new(),
            };

            if depends_on.is_some() && dependent_ids.is_empty() {
                sets.insert(spec.name, Vec::new());
                continue;
            }

            let fetched = self.catalog.options_for_step(&OptionQuery {
                role,
                step_number: definition.step_number,
                dependent_ids,
            })?;
            sets.insert(spec.name, fetched.into_iter().map(|option| option.id));
        }

        Ok(sets)
    }

    fn notify_completed(&self, progress: &RegistrationProgress, redirect_to: &str) {
        let event = RegistrationCompleted {
            subject_id: progress.subject_id.clone(),
            role: progress.role,
            redirect_to: redirect_to.to_string(),
            completed_at: progress.updated_at.unwrap_or_else(Utc::now),
        };

        // Already saved; delivery failure does not fail the step.
        if let Err(err) = self.publisher.publish(event) {
            warn!(subject = %progress.subject_id, error = %err, "completion event not delivered");
        }
    }
}

/// Error raised by the registration service.
#[derive(Debug, thiserror::Error)]
pub enum RegistrationServiceError {
    #[error(transparent)]
    Sequencing(#[from] SequencerError),
    #[error("subject {subject_id} is registered as {existing}, not {requested}")]
    RoleMismatch {
        subject_id: SubjectId,
        existing: SubjectRole,
        requested: SubjectRole,
    },
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

impl RegistrationServiceError {
    pub const fn kind(&self) -> &'static str {
        match self {
            RegistrationServiceError::Sequencing(err) => err.kind(),
            RegistrationServiceError::RoleMismatch { .. } => "role_mismatch",
            RegistrationServiceError::Storage(_) => "storage_unavailable",
            RegistrationServiceError::Catalog(_) => "catalog_unavailable",
        }
    }

    /// Storage and catalog failures are worth retrying unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RegistrationServiceError::Storage(_) | RegistrationServiceError::Catalog(_)
        )
    }
}
