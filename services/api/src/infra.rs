use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use tracing::info;
use tutor_intake::error::AppError;
use tutor_intake::workflows::catalog::{CategoryImporter, CategoryTree, SharedCategoryCatalog};
use tutor_intake::workflows::registration::{
    CompletionPublisher, ProgressStore, PublishError, RegistrationCompleted, RegistrationProgress,
    StorageError, SubjectId,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Keeps each record as a serialized JSON document, the shape a key-value
/// backend would hold.
#[derive(Default, Clone)]
pub(crate) struct InMemoryProgressStore {
    documents: Arc<Mutex<HashMap<SubjectId, String>>>,
}

impl ProgressStore for InMemoryProgressStore {
    fn load(&self, subject_id: &SubjectId) -> Result<Option<RegistrationProgress>, StorageError> {
        let guard = self
            .documents
            .lock()
            .map_err(|_| StorageError::Unavailable("progress store lock poisoned".to_string()))?;

        guard
            .get(subject_id)
            .map(|document| {
                serde_json::from_str(document)
                    .map_err(|err| StorageError::Corrupt(format!("{subject_id}: {err}")))
            })
            .transpose()
    }

    fn save(&self, progress: &RegistrationProgress) -> Result<(), StorageError> {
        let document = serde_json::to_string(progress)
            .map_err(|err| StorageError::Corrupt(err.to_string()))?;
        let mut guard = self
            .documents
            .lock()
            .map_err(|_| StorageError::Unavailable("progress store lock poisoned".to_string()))?;
        guard.insert(progress.subject_id.clone(), document);
        Ok(())
    }
}

#[cfg(test)]
impl InMemoryProgressStore {
    pub(crate) fn insert_raw(&self, subject_id: &str, document: &str) {
        self.documents
            .lock()
            .expect("progress store mutex poisoned")
            .insert(SubjectId(subject_id.to_string()), document.to_string());
    }
}

/// Records completion events and logs them for downstream pickup.
#[derive(Default, Clone)]
pub(crate) struct InMemoryCompletionPublisher {
    events: Arc<Mutex<Vec<RegistrationCompleted>>>,
}

impl CompletionPublisher for InMemoryCompletionPublisher {
    fn publish(&self, event: RegistrationCompleted) -> Result<(), PublishError> {
        info!(
            subject = %event.subject_id,
            role = %event.role,
            redirect_to = %event.redirect_to,
            "registration completed event"
        );
        let mut guard = self
            .events
            .lock()
            .map_err(|_| PublishError::Transport("completion queue lock poisoned".to_string()))?;
        guard.push(event);
        Ok(())
    }
}

impl InMemoryCompletionPublisher {
    pub(crate) fn events(&self) -> Vec<RegistrationCompleted> {
        self.events
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

/// Hydrate the category catalog from a CSV export, or fall back to the built-in tree.
pub(crate) fn load_catalog(seed_csv: Option<&Path>) -> Result<SharedCategoryCatalog, AppError> {
    let tree = match seed_csv {
        Some(path) => {
            let tree = CategoryImporter::from_path(path)?;
            info!(path = %path.display(), categories = tree.len(), "category catalog imported");
            tree
        }
        None => CategoryTree::tutoring_defaults(),
    };
    Ok(SharedCategoryCatalog::new(tree))
}
