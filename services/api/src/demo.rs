use crate::infra::{load_catalog, InMemoryCompletionPublisher, InMemoryProgressStore};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use tutor_intake::error::AppError;
use tutor_intake::workflows::registration::{
    CompletionOutcome, FieldValue, Fields, OptionSource, RegistrationBlueprint,
    RegistrationService, SubjectId, SubjectRole,
};

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Optional category CSV export to drive the catalog-backed steps.
    #[arg(long)]
    pub(crate) catalog_csv: Option<PathBuf>,
    /// Print the stored progress record after each form.
    #[arg(long)]
    pub(crate) show_records: bool,
}

#[derive(Args, Debug)]
pub(crate) struct StepsArgs {
    /// Registration form to describe (student or teacher)
    #[arg(value_parser = parse_role)]
    pub(crate) role: SubjectRole,
}

pub(crate) fn parse_role(raw: &str) -> Result<SubjectRole, String> {
    SubjectRole::from_slug(raw).ok_or_else(|| format!("unknown registration form '{raw}'"))
}

pub(crate) fn run_steps(args: StepsArgs) -> Result<(), AppError> {
    let blueprint = RegistrationBlueprint::for_role(args.role);
    println!(
        "{} registration ({} steps)",
        blueprint.role(),
        blueprint.total_steps()
    );

    for step in blueprint.steps() {
        println!("{:>2}. {}", step.step_number, step.title);
        for field in &step.fields {
            let requirement = if field.required { "required" } else { "optional" };
            let source = match field.options {
                OptionSource::Unconstrained => String::new(),
                OptionSource::Static { values } => format!(" one of {}", values.join(", ")),
                OptionSource::Catalog { depends_on: None } => " from catalog roots".to_string(),
                OptionSource::Catalog {
                    depends_on: Some(parent),
                } => format!(" from catalog under '{parent}'"),
            };
            println!(
                "    - {} ({:?}, {}){}",
                field.name, field.kind, requirement, source
            );
        }
    }

    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        catalog_csv,
        show_records,
    } = args;

    let catalog = Arc::new(load_catalog(catalog_csv.as_deref())?);
    let store = Arc::new(InMemoryProgressStore::default());
    let publisher = Arc::new(InMemoryCompletionPublisher::default());
    let service = RegistrationService::new(store, catalog, publisher.clone());

    println!("Registration workflow demo");

    for (role, subject) in [
        (SubjectRole::Student, "demo-student"),
        (SubjectRole::Teacher, "demo-teacher"),
    ] {
        let subject_id = SubjectId(subject.to_string());
        println!("\n{} form for {}", role, subject_id);

        let skip_to = role.total_steps();
        match service.submit_step(role, &subject_id, skip_to, demo_payload(role, skip_to)) {
            Ok(_) => println!("  Unexpected: skipping ahead was accepted"),
            Err(err) => println!("  Skip to step {} rejected: {}", skip_to, err),
        }

        for step in 1..=role.total_steps() {
            let outcome = match service.submit_step(role, &subject_id, step, demo_payload(role, step)) {
                Ok(outcome) => outcome,
                Err(err) => {
                    println!("  Step {} rejected: {}", step, err);
                    return Ok(());
                }
            };
            let progress = &outcome.progress;
            println!(
                "  Step {:>2} accepted -> {}/{} complete",
                step,
                progress.steps_completed(),
                progress.total_steps
            );
            if let CompletionOutcome::Completed { redirect_to, .. } = outcome.completion {
                println!("  Registration complete, redirecting to {}", redirect_to);
            }
        }

        if show_records {
            match service.progress(role, &subject_id) {
                Ok(Some(progress)) => match serde_json::to_string_pretty(&progress.view()) {
                    Ok(json) => println!("  Stored record:\n{}", json),
                    Err(err) => println!("  Stored record unavailable: {}", err),
                },
                Ok(None) => println!("  Store returned no record"),
                Err(err) => println!("  Store unavailable: {}", err),
            }
        }
    }

    let events = publisher.events();
    println!("\nCompletion events: {}", events.len());
    for event in events {
        println!("  - {} {} -> {}", event.role, event.subject_id, event.redirect_to);
    }

    Ok(())
}

fn demo_payload(role: SubjectRole, step: u32) -> Fields {
    let entries: Vec<(&str, FieldValue)> = match (role, step) {
        (SubjectRole::Student, 1) => vec![("studentType", "PARENT".into())],
        (SubjectRole::Student, 2) => vec![("category", "languages".into())],
        (SubjectRole::Student, 3) => vec![("subcategories", vec!["spanish"].into())],
        (SubjectRole::Student, 4) => vec![("level", "INTERMEDIATE".into())],
        (SubjectRole::Student, 5) => vec![("goals", "Hold a conversation before a summer trip".into())],
        (SubjectRole::Student, 6) => vec![("lessonFormat", "ONLINE".into())],
        (SubjectRole::Student, 7) => vec![(
            "availability",
            vec!["WEEKDAY_EVENING", "WEEKEND"].into(),
        )],
        (SubjectRole::Student, 8) => vec![("budget", "35".into())],
        (SubjectRole::Student, 9) => vec![("fullName", "Jordan Lee".into())],
        (SubjectRole::Student, _) => vec![("phone", "+1 319 555 0142".into())],
        (SubjectRole::Teacher, 1) => vec![("fullName", "Amara Okafor".into())],
        (SubjectRole::Teacher, 2) => vec![("selectedRoles", vec!["mathematics"].into())],
        (SubjectRole::Teacher, 3) => vec![("subOptions", vec!["algebra", "calculus"].into())],
        (SubjectRole::Teacher, 4) => vec![("deepOptions", vec!["calculus-ap"].into())],
        (SubjectRole::Teacher, 5) => vec![("experienceYears", "7".into())],
        (SubjectRole::Teacher, 6) => vec![("bio", "Former engineer who loves proofs.".into())],
        (SubjectRole::Teacher, 7) => vec![("hourlyRate", "60".into())],
        (SubjectRole::Teacher, _) => vec![("lessonFormat", "EITHER".into())],
    };

    entries
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect()
}
