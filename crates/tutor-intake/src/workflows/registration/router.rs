use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{Fields, SubjectId, SubjectRole};
use super::repository::{CompletionPublisher, OptionCatalog, ProgressStore};
use super::sequencer::SequencerError;
use super::service::{RegistrationService, RegistrationServiceError};

/// Body of a step submission.
#[derive(Debug, Default, Deserialize)]
pub struct StepSubmission {
    #[serde(default)]
    pub fields: Fields,
}

#[derive(Debug, Default, Deserialize)]
pub struct OptionsQuery {
    /// Comma separated identifiers selected in the step this one depends on.
    #[serde(default)]
    pub depends_on: Option<String>,
}

impl OptionsQuery {
    fn dependent_ids(&self) -> Vec<String> {
        self.depends_on
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Router builder exposing the registration form endpoints.
pub fn registration_router<S, C, P>(service: Arc<RegistrationService<S, C, P>>) -> Router
where
    S: ProgressStore + 'static,
    C: OptionCatalog + 'static,
    P: CompletionPublisher + 'static,
{
    Router::new()
        .route("/api/v1/forms/:role", get(steps_handler::<S, C, P>))
        .route(
            "/api/v1/forms/:role/steps/:step/options",
            get(options_handler::<S, C, P>),
        )
        .route(
            "/api/v1/registrations/:role/:subject_id",
            get(progress_handler::<S, C, P>),
        )
        .route(
            "/api/v1/registrations/:role/:subject_id/steps/:step",
            post(submit_handler::<S, C, P>),
        )
        .with_state(service)
}

pub(crate) async fn submit_handler<S, C, P>(
    State(service): State<Arc<RegistrationService<S, C, P>>>,
    Path((role, subject_id, step)): Path<(String, String, String)>,
    submission: Result<axum::Json<StepSubmission>, JsonRejection>,
) -> Response
where
    S: ProgressStore + 'static,
    C: OptionCatalog + 'static,
    P: CompletionPublisher + 'static,
{
    let Some(role) = SubjectRole::from_slug(&role) else {
        return unknown_role(&role);
    };
    let step = match parse_step(role, &step) {
        Ok(step) => step,
        Err(response) => return response,
    };
    let axum::Json(submission) = match submission {
        Ok(body) => body,
        Err(rejection) => return invalid_body(rejection),
    };

    match service.submit_step(role, &SubjectId(subject_id), step, submission.fields) {
        Ok(outcome) => (StatusCode::OK, axum::Json(outcome.view())).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn progress_handler<S, C, P>(
    State(service): State<Arc<RegistrationService<S, C, P>>>,
    Path((role, subject_id)): Path<(String, String)>,
) -> Response
where
    S: ProgressStore + 'static,
    C: OptionCatalog + 'static,
    P: CompletionPublisher + 'static,
{
    let Some(role) = SubjectRole::from_slug(&role) else {
        return unknown_role(&role);
    };

    let subject_id = SubjectId(subject_id);
    match service.progress(role, &subject_id) {
        Ok(Some(progress)) => (StatusCode::OK, axum::Json(progress.view())).into_response(),
        Ok(None) => {
            let payload = json!({
                "error": "no registration progress recorded",
                "kind": "not_found",
                "subject_id": subject_id,
                "role": role,
                "current_step": 1,
                "total_steps": role.total_steps(),
                "is_completed": false,
            });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn options_handler<S, C, P>(
    State(service): State<Arc<RegistrationService<S, C, P>>>,
    Path((role, step)): Path<(String, String)>,
    Query(query): Query<OptionsQuery>,
) -> Response
where
    S: ProgressStore + 'static,
    C: OptionCatalog + 'static,
    P: CompletionPublisher + 'static,
{
    let Some(role) = SubjectRole::from_slug(&role) else {
        return unknown_role(&role);
    };
    let step = match parse_step(role, &step) {
        Ok(step) => step,
        Err(response) => return response,
    };

    match service.options(role, step, &query.dependent_ids()) {
        Ok(options) => (StatusCode::OK, axum::Json(options)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn steps_handler<S, C, P>(
    State(service): State<Arc<RegistrationService<S, C, P>>>,
    Path(role): Path<String>,
) -> Response
where
    S: ProgressStore + 'static,
    C: OptionCatalog + 'static,
    P: CompletionPublisher + 'static,
{
    let Some(role) = SubjectRole::from_slug(&role) else {
        return unknown_role(&role);
    };

    let blueprint = service.blueprint(role);
    let payload = json!({
        "role": role,
        "total_steps": blueprint.total_steps(),
        "steps": blueprint.steps(),
    });
    (StatusCode::OK, axum::Json(payload)).into_response()
}

fn unknown_role(raw: &str) -> Response {
    let payload = json!({
        "error": format!("unknown registration form '{raw}'"),
        "kind": "unknown_role",
    });
    (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
}

/// Step numbers that are not a form position at all are out of range.
fn parse_step(role: SubjectRole, raw: &str) -> Result<u32, Response> {
    raw.trim().parse::<u32>().map_err(|_| {
        let payload = json!({
            "error": format!(
                "step '{raw}' does not exist (form has {} steps)",
                role.total_steps()
            ),
            "kind": "step_out_of_range",
            "retryable": false,
        });
        (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
    })
}

fn invalid_body(rejection: JsonRejection) -> Response {
    let payload = json!({
        "error": rejection.body_text(),
        "kind": "invalid_body",
        "retryable": false,
    });
    (rejection.status(), axum::Json(payload)).into_response()
}

fn error_response(err: RegistrationServiceError) -> Response {
    let status = match &err {
        RegistrationServiceError::Sequencing(SequencerError::StepOutOfOrder { .. })
        | RegistrationServiceError::RoleMismatch { .. } => StatusCode::CONFLICT,
        RegistrationServiceError::Sequencing(_) => StatusCode::UNPROCESSABLE_ENTITY,
        RegistrationServiceError::Storage(_) => StatusCode::SERVICE_UNAVAILABLE,
        RegistrationServiceError::Catalog(_) => StatusCode::BAD_GATEWAY,
    };

    if err.is_retryable() {
        tracing::warn!(error = %err, "registration request failed");
    }

    let mut payload = json!({
        "error": err.to_string(),
        "kind": err.kind(),
        "retryable": err.is_retryable(),
    });
    if let RegistrationServiceError::Sequencing(SequencerError::ValidationFailed(validation)) = &err
    {
        payload["field"] = json!(validation.field());
    }

    (status, axum::Json(payload)).into_response()
}
