use serde::Serialize;

use super::domain::{RegistrationProgress, SubjectRole};

const REDIRECTS: [(SubjectRole, &str); 2] = [
    (SubjectRole::Student, "/"),
    (SubjectRole::Teacher, "/profile"),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CompletionOutcome {
    NotYetComplete,
    Completed {
        role: SubjectRole,
        redirect_to: &'static str,
    },
}

impl CompletionOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, CompletionOutcome::Completed { .. })
    }
}

/// Maps a finished registration to where the client should go next.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompletionGate;

impl CompletionGate {
    pub fn redirect_for(role: SubjectRole) -> &'static str {
        REDIRECTS
            .iter()
            .find(|(candidate, _)| *candidate == role)
            .map(|(_, target)| *target)
            .unwrap_or("/")
    }

    pub fn on_advance(&self, progress: &RegistrationProgress) -> CompletionOutcome {
        if !progress.is_completed {
            return CompletionOutcome::NotYetComplete;
        }

        CompletionOutcome::Completed {
            role: progress.role,
            redirect_to: Self::redirect_for(progress.role),
        }
    }
}
