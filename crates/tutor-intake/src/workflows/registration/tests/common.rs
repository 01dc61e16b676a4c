use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use serde_json::Value;

use crate::workflows::catalog::{CategoryTree, SharedCategoryCatalog};
use crate::workflows::registration::domain::{
    FieldValue, Fields, RegistrationProgress, SubjectId, SubjectRole,
};
use crate::workflows::registration::repository::{
    CatalogError, CatalogOption, CompletionPublisher, OptionCatalog, OptionQuery, ProgressStore,
    PublishError, RegistrationCompleted, StorageError,
};
use crate::workflows::registration::service::RegistrationService;

pub(super) type MemoryService = RegistrationService<MemoryStore, SharedCategoryCatalog, MemoryPublisher>;

pub(super) fn subject(id: &str) -> SubjectId {
    SubjectId(id.to_string())
}

pub(super) fn fields(entries: &[(&str, FieldValue)]) -> Fields {
    entries
        .iter()
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect()
}

/// A valid payload for every student step.
pub(super) fn student_payload(step: u32) -> Fields {
    match step {
        1 => fields(&[("studentType", FieldValue::from("STUDENT"))]),
        2 => fields(&[("category", FieldValue::from("music"))]),
        3 => fields(&[("subcategories", FieldValue::from(vec!["piano", "guitar"]))]),
        4 => fields(&[("level", FieldValue::from("BEGINNER"))]),
        5 => fields(&[("goals", FieldValue::from("Play at a family wedding"))]),
        6 => fields(&[("lessonFormat", FieldValue::from("ONLINE"))]),
        7 => fields(&[("availability", FieldValue::from(vec!["WEEKEND"]))]),
        8 => fields(&[("budget", FieldValue::from("40"))]),
        9 => fields(&[
            ("fullName", FieldValue::from("Mina Park")),
            ("city", FieldValue::from("Des Moines")),
        ]),
        10 => fields(&[("phone", FieldValue::from("+1 515 555 0100"))]),
        other => panic!("student form has no step {other}"),
    }
}

/// A valid payload for every teacher step.
pub(super) fn teacher_payload(step: u32) -> Fields {
    match step {
        1 => fields(&[("fullName", FieldValue::from("Rafael Ortiz"))]),
        2 => fields(&[("selectedRoles", FieldValue::from(vec!["music", "languages"]))]),
        3 => fields(&[("subOptions", FieldValue::from(vec!["piano", "spanish"]))]),
        4 => fields(&[(
            "deepOptions",
            FieldValue::from(vec!["piano-jazz", "spanish-conversation"]),
        )]),
        5 => fields(&[("experienceYears", FieldValue::from("12"))]),
        6 => fields(&[("bio", FieldValue::from("Conservatory trained, patient with adults."))]),
        7 => fields(&[("hourlyRate", FieldValue::from("55"))]),
        8 => fields(&[("lessonFormat", FieldValue::from("EITHER"))]),
        other => panic!("teacher form has no step {other}"),
    }
}

pub(super) fn payload_for(role: SubjectRole, step: u32) -> Fields {
    match role {
        SubjectRole::Student => student_payload(step),
        SubjectRole::Teacher => teacher_payload(step),
    }
}

pub(super) fn build_service() -> (
    MemoryService,
    Arc<MemoryStore>,
    Arc<SharedCategoryCatalog>,
    Arc<MemoryPublisher>,
) {
    let store = Arc::new(MemoryStore::default());
    let catalog = Arc::new(SharedCategoryCatalog::new(CategoryTree::tutoring_defaults()));
    let publisher = Arc::new(MemoryPublisher::default());
    let service = RegistrationService::new(store.clone(), catalog.clone(), publisher.clone());
    (service, store, catalog, publisher)
}

/// Submit steps `1..=through` with the canned payloads.
pub(super) fn walk<S, C, P>(
    service: &RegistrationService<S, C, P>,
    role: SubjectRole,
    subject_id: &SubjectId,
    through: u32,
) -> RegistrationProgress
where
    S: ProgressStore + 'static,
    C: OptionCatalog + 'static,
    P: CompletionPublisher + 'static,
{
    let mut last = RegistrationProgress::initial(subject_id.clone(), role);
    for step in 1..=through {
        last = service
            .submit_step(role, subject_id, step, payload_for(role, step))
            .unwrap_or_else(|err| panic!("{role} step {step} rejected: {err}"))
            .progress;
    }
    last
}

#[derive(Default, Clone)]
pub(super) struct MemoryStore {
    pub(super) records: Arc<Mutex<HashMap<SubjectId, RegistrationProgress>>>,
    pub(super) saves: Arc<AtomicUsize>,
}

impl MemoryStore {
    pub(super) fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub(super) fn seed(&self, progress: RegistrationProgress) {
        self.records
            .lock()
            .expect("store mutex poisoned")
            .insert(progress.subject_id.clone(), progress);
    }
}

impl ProgressStore for MemoryStore {
    fn load(&self, subject_id: &SubjectId) -> Result<Option<RegistrationProgress>, StorageError> {
        let guard = self.records.lock().expect("store mutex poisoned");
        Ok(guard.get(subject_id).cloned())
    }

    fn save(&self, progress: &RegistrationProgress) -> Result<(), StorageError> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        let mut guard = self.records.lock().expect("store mutex poisoned");
        guard.insert(progress.subject_id.clone(), progress.clone());
        Ok(())
    }
}

/// Reads succeed from a snapshot, writes always fail.
#[derive(Default)]
pub(super) struct ReadOnlyStore {
    pub(super) inner: MemoryStore,
}

impl ProgressStore for ReadOnlyStore {
    fn load(&self, subject_id: &SubjectId) -> Result<Option<RegistrationProgress>, StorageError> {
        self.inner.load(subject_id)
    }

    fn save(&self, _progress: &RegistrationProgress) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("read only replica".to_string()))
    }
}

pub(super) struct UnavailableStore;

impl ProgressStore for UnavailableStore {
    fn load(&self, _subject_id: &SubjectId) -> Result<Option<RegistrationProgress>, StorageError> {
        Err(StorageError::Unavailable("database offline".to_string()))
    }

    fn save(&self, _progress: &RegistrationProgress) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("database offline".to_string()))
    }
}

#[derive(Default)]
pub(super) struct UnavailableCatalog {
    pub(super) calls: AtomicUsize,
}

impl OptionCatalog for UnavailableCatalog {
    fn options_for_step(&self, _query: &OptionQuery) -> Result<Vec<CatalogOption>, CatalogError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(CatalogError::Unavailable("catalog timed out".to_string()))
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryPublisher {
    events: Arc<Mutex<Vec<RegistrationCompleted>>>,
}

impl MemoryPublisher {
    pub(super) fn events(&self) -> Vec<RegistrationCompleted> {
        self.events.lock().expect("publisher mutex poisoned").clone()
    }
}

impl CompletionPublisher for MemoryPublisher {
    fn publish(&self, event: RegistrationCompleted) -> Result<(), PublishError> {
        self.events
            .lock()
            .expect("publisher mutex poisoned")
            .push(event);
        Ok(())
    }
}

pub(super) struct DroppingPublisher;

impl CompletionPublisher for DroppingPublisher {
    fn publish(&self, _event: RegistrationCompleted) -> Result<(), PublishError> {
        Err(PublishError::Transport("broker unreachable".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
