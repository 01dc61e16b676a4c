use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tutor_intake::workflows::catalog::{CategoryTree, SharedCategoryCatalog};
use tutor_intake::workflows::registration::{
    CompletionGate, CompletionOutcome, CompletionPublisher, FieldValue, Fields, OptionSets,
    ProgressStore, PublishError, RegistrationBlueprint, RegistrationCompleted,
    RegistrationProgress, RegistrationService, SequencerError, StepSequencer, StorageError,
    SubjectId, SubjectRole, ValidationError,
};

#[derive(Default)]
struct RecordingStore {
    records: Mutex<HashMap<SubjectId, RegistrationProgress>>,
}

impl ProgressStore for RecordingStore {
    fn load(&self, subject_id: &SubjectId) -> Result<Option<RegistrationProgress>, StorageError> {
        Ok(self
            .records
            .lock()
            .expect("store mutex")
            .get(subject_id)
            .cloned())
    }

    fn save(&self, progress: &RegistrationProgress) -> Result<(), StorageError> {
        self.records
            .lock()
            .expect("store mutex")
            .insert(progress.subject_id.clone(), progress.clone());
        Ok(())
    }
}

#[derive(Default)]
struct RecordingPublisher {
    events: Mutex<Vec<RegistrationCompleted>>,
}

impl CompletionPublisher for RecordingPublisher {
    fn publish(&self, event: RegistrationCompleted) -> Result<(), PublishError> {
        self.events.lock().expect("publisher mutex").push(event);
        Ok(())
    }
}

fn one(name: &str, value: FieldValue) -> Fields {
    let mut fields = Fields::new();
    fields.insert(name.to_string(), value);
    fields
}

#[test]
fn teacher_registration_end_to_end() {
    let store = Arc::new(RecordingStore::default());
    let publisher = Arc::new(RecordingPublisher::default());
    let service = RegistrationService::new(
        store.clone(),
        Arc::new(SharedCategoryCatalog::new(CategoryTree::tutoring_defaults())),
        publisher.clone(),
    );
    let subject_id = SubjectId("teacher-42".to_string());

    let submissions = [
        one("fullName", FieldValue::from("  Grace Hopper ")),
        one("selectedRoles", FieldValue::from(vec!["mathematics", "mathematics"])),
        one("subOptions", FieldValue::from("calculus")),
        one("deepOptions", FieldValue::from(vec!["calculus-ap"])),
        one("experienceYears", FieldValue::from("30")),
        one("bio", FieldValue::from("Compilers and calculus.")),
        one("hourlyRate", FieldValue::from("80.50")),
        one("lessonFormat", FieldValue::from("ONLINE")),
    ];

    let mut last = None;
    for (index, fields) in submissions.into_iter().enumerate() {
        let step = index as u32 + 1;
        let outcome = service
            .submit_step(SubjectRole::Teacher, &subject_id, step, fields)
            .unwrap_or_else(|err| panic!("step {step} rejected: {err}"));
        last = Some(outcome);
    }

    let outcome = last.expect("eight submissions");
    assert_eq!(
        outcome.completion,
        CompletionOutcome::Completed {
            role: SubjectRole::Teacher,
            redirect_to: "/profile",
        }
    );

    let stored = store
        .load(&subject_id)
        .expect("readable")
        .expect("record stored");
    assert!(stored.is_completed);
    assert_eq!(stored.steps_completed(), 8);
    assert_eq!(stored.fields["fullName"], FieldValue::from("Grace Hopper"));
    assert_eq!(
        stored.fields["selectedRoles"],
        FieldValue::List(vec!["mathematics".to_string()])
    );
    assert_eq!(
        stored.fields["subOptions"],
        FieldValue::List(vec!["calculus".to_string()])
    );

    let events = publisher.events.lock().expect("publisher mutex");
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].redirect_to, CompletionGate::redirect_for(SubjectRole::Teacher));
}

#[test]
fn sequencer_is_usable_without_a_store() {
    let blueprint = RegistrationBlueprint::student_intake();
    let sequencer = StepSequencer::default();
    let progress = RegistrationProgress::initial(SubjectId("s-1".to_string()), SubjectRole::Student);

    let next = sequencer
        .advance(
            &progress,
            &blueprint,
            1,
            one("studentType", FieldValue::from("STUDENT")),
            &OptionSets::new(),
        )
        .expect("step 1 accepted");
    assert_eq!(next.current_step, 2);
    assert_eq!(progress.current_step, 1, "input state is not mutated");

    let err = sequencer
        .advance(
            &next,
            &blueprint,
            2,
            one("category", FieldValue::from("music")),
            &OptionSets::new(),
        )
        .expect_err("no catalog options resolved");
    assert_eq!(
        err,
        SequencerError::ValidationFailed(ValidationError::InvalidOptionValue {
            field: "category".to_string(),
            value: "music".to_string(),
        })
    );

    let mut options = OptionSets::new();
    options.insert("category", ["music".to_string()]);
    let after = sequencer
        .advance(
            &next,
            &blueprint,
            2,
            one("category", FieldValue::from("music")),
            &options,
        )
        .expect("catalog option accepted");
    assert_eq!(after.current_step, 3);
}

#[test]
fn completion_gate_only_fires_for_completed_records() {
    let gate = CompletionGate;
    let mut progress =
        RegistrationProgress::initial(SubjectId("s-2".to_string()), SubjectRole::Student);
    assert_eq!(gate.on_advance(&progress), CompletionOutcome::NotYetComplete);

    progress.current_step = 11;
    progress.is_completed = true;
    assert_eq!(
        gate.on_advance(&progress),
        CompletionOutcome::Completed {
            role: SubjectRole::Student,
            redirect_to: "/",
        }
    );
}
