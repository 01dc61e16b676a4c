use super::common::{build_service, fields, payload_for, student_payload, subject, walk};
use crate::workflows::registration::{
    CompletionOutcome, FieldValue, ProgressStore, RegistrationServiceError, SequencerError,
    SubjectRole, ValidationError,
};

#[test]
fn fresh_student_advances_past_first_step() {
    let (service, store, _, _) = build_service();
    let subject_id = subject("student-a");

    let outcome = service
        .submit_step(SubjectRole::Student, &subject_id, 1, student_payload(1))
        .expect("step 1 accepted");

    assert_eq!(outcome.progress.current_step, 2);
    assert_eq!(outcome.progress.total_steps, 10);
    assert!(!outcome.progress.is_completed);
    assert_eq!(outcome.completion, CompletionOutcome::NotYetComplete);

    let stored = store
        .load(&subject_id)
        .expect("store readable")
        .expect("record created on first submission");
    assert_eq!(stored, outcome.progress);
    assert!(stored.updated_at.is_some());
}

#[test]
fn skipping_ahead_is_out_of_order_and_leaves_record_untouched() {
    let (service, store, _, _) = build_service();
    let subject_id = subject("student-b");
    walk(&service, SubjectRole::Student, &subject_id, 1);
    let before = store.load(&subject_id).expect("readable");
    let saves = store.save_count();

    let err = service
        .submit_step(SubjectRole::Student, &subject_id, 5, student_payload(5))
        .expect_err("step 5 is not reachable yet");

    assert!(matches!(
        err,
        RegistrationServiceError::Sequencing(SequencerError::StepOutOfOrder {
            step: 5,
            current_step: 2
        })
    ));
    assert_eq!(store.load(&subject_id).expect("readable"), before);
    assert_eq!(store.save_count(), saves);
}

#[test]
fn final_student_step_completes_and_redirects_home() {
    let (service, _, _, _) = build_service();
    let subject_id = subject("student-c");
    let progress = walk(&service, SubjectRole::Student, &subject_id, 9);
    assert_eq!(progress.current_step, 10);
    assert!(!progress.is_completed);

    let outcome = service
        .submit_step(SubjectRole::Student, &subject_id, 10, student_payload(10))
        .expect("last step accepted");

    assert!(outcome.progress.is_completed);
    assert_eq!(
        outcome.completion,
        CompletionOutcome::Completed {
            role: SubjectRole::Student,
            redirect_to: "/",
        }
    );
}

#[test]
fn teacher_with_empty_role_selection_is_missing_required_field() {
    let (service, store, _, _) = build_service();
    let subject_id = subject("teacher-d");
    walk(&service, SubjectRole::Teacher, &subject_id, 1);

    let err = service
        .submit_step(
            SubjectRole::Teacher,
            &subject_id,
            2,
            fields(&[("selectedRoles", FieldValue::List(Vec::new()))]),
        )
        .expect_err("empty selection rejected");

    assert!(matches!(
        err,
        RegistrationServiceError::Sequencing(SequencerError::ValidationFailed(
            ValidationError::MissingRequiredField { ref field }
        )) if field == "selectedRoles"
    ));
    let stored = store.load(&subject_id).expect("readable").expect("present");
    assert_eq!(stored.current_step, 2);
    assert_eq!(stored.total_steps, 8);
}

#[test]
fn resubmitting_an_earlier_step_updates_fields_without_moving() {
    let (service, _, _, _) = build_service();
    let subject_id = subject("student-e");
    let progress = walk(&service, SubjectRole::Student, &subject_id, 5);
    assert_eq!(progress.current_step, 6);

    let outcome = service
        .submit_step(
            SubjectRole::Student,
            &subject_id,
            3,
            fields(&[("subcategories", FieldValue::from(vec!["voice"]))]),
        )
        .expect("earlier step editable");

    assert_eq!(outcome.progress.current_step, 6);
    assert_eq!(
        outcome.progress.fields.get("subcategories"),
        Some(&FieldValue::List(vec!["voice".to_string()]))
    );
    assert_eq!(
        outcome.progress.fields.get("goals"),
        Some(&FieldValue::from("Play at a family wedding"))
    );
}

#[test]
fn each_accepted_current_step_advances_by_exactly_one() {
    for role in SubjectRole::ordered() {
        let (service, _, _, _) = build_service();
        let subject_id = subject(&format!("walker-{}", role.slug()));

        for step in 1..=role.total_steps() {
            let outcome = service
                .submit_step(role, &subject_id, step, payload_for(role, step))
                .unwrap_or_else(|err| panic!("{role} step {step} rejected: {err}"));
            assert_eq!(outcome.progress.current_step, step + 1);
            assert_eq!(
                outcome.progress.is_completed,
                step == role.total_steps(),
                "{role} completion flips only on the last step"
            );
            assert!(outcome.progress.steps_completed() <= outcome.progress.total_steps);
        }
    }
}

#[test]
fn replaying_an_accepted_submission_changes_nothing() {
    let (service, _, _, _) = build_service();
    let subject_id = subject("student-replay");
    walk(&service, SubjectRole::Student, &subject_id, 3);

    let first = service
        .submit_step(SubjectRole::Student, &subject_id, 4, student_payload(4))
        .expect("accepted");
    let second = service
        .submit_step(SubjectRole::Student, &subject_id, 4, student_payload(4))
        .expect("replay accepted");

    assert_eq!(first.progress.current_step, 5);
    assert_eq!(second.progress.current_step, 5);
    assert_eq!(first.progress.fields, second.progress.fields);
}

#[test]
fn fields_accumulate_across_steps() {
    let (service, _, _, _) = build_service();
    let subject_id = subject("teacher-fields");
    let progress = walk(&service, SubjectRole::Teacher, &subject_id, 4);

    let names: Vec<&str> = progress.fields.keys().map(String::as_str).collect();
    assert_eq!(
        names,
        vec!["deepOptions", "fullName", "selectedRoles", "subOptions"]
    );
}

#[test]
fn completion_survives_later_edits() {
    let (service, _, _, _) = build_service();
    let subject_id = subject("teacher-done");
    let progress = walk(&service, SubjectRole::Teacher, &subject_id, 8);
    assert!(progress.is_completed);

    let outcome = service
        .submit_step(
            SubjectRole::Teacher,
            &subject_id,
            6,
            fields(&[("bio", FieldValue::from("Now also teaching theory."))]),
        )
        .expect("completed subjects may still edit");

    assert!(outcome.progress.is_completed);
    assert_eq!(outcome.progress.current_step, 9);
    assert!(outcome.completion.is_completed());
}

#[test]
fn blank_optional_field_clears_previous_value() {
    let (service, _, _, _) = build_service();
    let subject_id = subject("student-city");
    let progress = walk(&service, SubjectRole::Student, &subject_id, 9);
    assert!(progress.fields.contains_key("city"));

    let outcome = service
        .submit_step(
            SubjectRole::Student,
            &subject_id,
            9,
            fields(&[
                ("fullName", FieldValue::from("Mina Park")),
                ("city", FieldValue::from("   ")),
            ]),
        )
        .expect("resubmission accepted");

    assert!(!outcome.progress.fields.contains_key("city"));
    assert_eq!(outcome.progress.current_step, 10);
}
