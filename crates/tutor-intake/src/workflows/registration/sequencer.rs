use super::domain::{Fields, RegistrationProgress};
use super::steps::{RegistrationBlueprint, StepDefinition};
use super::validator::{OptionSets, StepValidator, ValidationError};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SequencerError {
    #[error("step {step} does not exist (form has {total_steps} steps)")]
    StepOutOfRange { step: u32, total_steps: u32 },
    #[error("step {step} cannot be submitted before step {current_step}")]
    StepOutOfOrder { step: u32, current_step: u32 },
    #[error(transparent)]
    ValidationFailed(#[from] ValidationError),
}

impl SequencerError {
    pub const fn kind(&self) -> &'static str {
        match self {
            SequencerError::StepOutOfRange { .. } => "step_out_of_range",
            SequencerError::StepOutOfOrder { .. } => "step_out_of_order",
            SequencerError::ValidationFailed(err) => err.kind(),
        }
    }
}

/// Computes the next progress state from a step submission.
///
/// Pure: the decision to advance compares the submitted step with the
/// record's `current_step`, so replaying an accepted submission is a no-op.
#[derive(Debug, Clone, Copy, Default)]
pub struct StepSequencer {
    validator: StepValidator,
}

impl StepSequencer {
    pub fn new(validator: StepValidator) -> Self {
        Self { validator }
    }

    /// Resolve the definition for `step` if the subject is allowed to submit it.
    pub fn admit<'b>(
        &self,
        progress: &RegistrationProgress,
        blueprint: &'b RegistrationBlueprint,
        step: u32,
    ) -> Result<&'b StepDefinition, SequencerError> {
        let definition = blueprint
            .step(step)
            .ok_or(SequencerError::StepOutOfRange {
                step,
                total_steps: blueprint.total_steps(),
            })?;

        if step > progress.current_step {
            return Err(SequencerError::StepOutOfOrder {
                step,
                current_step: progress.current_step,
            });
        }

        Ok(definition)
    }

    pub fn advance(
        &self,
        progress: &RegistrationProgress,
        blueprint: &RegistrationBlueprint,
        step: u32,
        payload: Fields,
        options: &OptionSets,
    ) -> Result<RegistrationProgress, SequencerError> {
        let definition = self.admit(progress, blueprint, step)?;
        let accepted = self.validator.validate(definition, payload, options)?;

        let mut next = progress.clone();
        // A resubmitted step replaces everything it owns, including optional
        // fields left blank this time.
        for spec in &definition.fields {
            next.fields.remove(spec.name);
        }
        next.fields.extend(accepted);

        if step == progress.current_step {
            next.current_step = step + 1;
        }
        next.total_steps = blueprint.total_steps();
        if next.current_step > next.total_steps {
            next.is_completed = true;
        }

        Ok(next)
    }
}
