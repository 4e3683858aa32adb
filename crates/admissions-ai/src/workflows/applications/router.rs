use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use chrono::Local;
use serde_json::json;
use tracing::{error, warn};

use super::domain::{
    ApplicantDetails, ApplicationSubmission, DocumentKind, SubmissionOutcome, UploadedDocument,
};
use super::model::GenerativeModel;
use super::notifier::Notifier;
use super::service::{ApplicationService, ApplicationServiceError};
use super::validation::{validate_submission, ErrorCode, ValidationErrors, MAX_DOCUMENT_BYTES};
use super::wizard::{validate_step, ApplicationDraft, FormStep};

/// Request body ceiling for uploads; larger than the document limit so oversized files
/// still reach validation and come back as a field error.
pub const MAX_UPLOAD_BODY_BYTES: usize = MAX_DOCUMENT_BYTES + 3 * 1024 * 1024;

/// Router builder exposing the submission and step-validation endpoints.
pub fn application_router<M, N>(service: Arc<ApplicationService<M, N>>) -> Router
where
    M: GenerativeModel + 'static,
    N: Notifier + 'static,
{
    Router::new()
        .route(
            "/api/v1/applications",
            post(submit_handler::<M, N>).layer(DefaultBodyLimit::max(MAX_UPLOAD_BODY_BYTES)),
        )
        .route(
            "/api/v1/applications/steps/:step/validate",
            post(validate_step_handler),
        )
        .with_state(service)
}

pub(crate) async fn submit_handler<M, N>(
    State(service): State<Arc<ApplicationService<M, N>>>,
    multipart: Multipart,
) -> Response
where
    M: GenerativeModel + 'static,
    N: Notifier + 'static,
{
    let submission = match read_submission(multipart).await {
        Ok(submission) => submission,
        Err(FormReadError::Invalid(errors)) => return invalid_response(errors),
        Err(FormReadError::Multipart(err)) => {
            warn!(error = %err.body_text(), "unable to read multipart submission");
            let payload = json!({
                "status": "error",
                "message": err.body_text(),
            });
            return (err.status(), Json(payload)).into_response();
        }
    };

    match service.submit(submission).await {
        Ok(outcome @ SubmissionOutcome::Verified { .. }) => {
            (StatusCode::OK, Json(outcome)).into_response()
        }
        Ok(outcome @ SubmissionOutcome::Rejected { .. }) => {
            (StatusCode::UNPROCESSABLE_ENTITY, Json(outcome)).into_response()
        }
        Err(ApplicationServiceError::Validation(errors)) => invalid_response(errors),
        Err(err @ ApplicationServiceError::Model(_)) => {
            error!(error = %err, "document screening failed");
            let payload = json!({
                "status": "error",
                "message": err.to_string(),
            });
            (StatusCode::BAD_GATEWAY, Json(payload)).into_response()
        }
    }
}

pub(crate) async fn validate_step_handler(
    Path(step): Path<String>,
    Json(draft): Json<ApplicationDraft>,
) -> Response {
    let Some(step) = FormStep::parse(&step) else {
        let payload = json!({ "error": format!("unknown form step '{step}'") });
        return (StatusCode::NOT_FOUND, Json(payload)).into_response();
    };

    let today = Local::now().date_naive();
    match validate_step(step, &draft, today) {
        Ok(()) => {
            let payload = json!({ "step": step, "valid": true });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(errors) => {
            let payload = json!({
                "step": step,
                "valid": false,
                "errors": errors.errors,
            });
            (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response()
        }
    }
}

fn invalid_response(errors: ValidationErrors) -> Response {
    let payload = json!({
        "status": "invalid",
        "errors": errors.errors,
    });
    (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response()
}

pub(crate) enum FormReadError {
    Multipart(axum::extract::multipart::MultipartError),
    Invalid(ValidationErrors),
}

impl From<axum::extract::multipart::MultipartError> for FormReadError {
    fn from(value: axum::extract::multipart::MultipartError) -> Self {
        Self::Multipart(value)
    }
}

/// Collect the form fields and the uploaded file from a multipart body.
///
/// Unknown fields are ignored; camelCase aliases are accepted for the text fields.
pub(crate) async fn read_submission(
    mut multipart: Multipart,
) -> Result<ApplicationSubmission, FormReadError> {
    let mut applicant = ApplicantDetails::default();
    let mut kind = DocumentKind::default();
    let mut upload: Option<(String, Option<String>, Vec<u8>)> = None;
    let mut errors = ValidationErrors::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "document" | "file" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await?;
                // Browsers send an empty, unnamed part when no file was picked.
                if file_name.is_empty() && bytes.is_empty() {
                    continue;
                }
                upload = Some((file_name, content_type, bytes.to_vec()));
            }
            "full_name" | "fullName" => applicant.full_name = field.text().await?,
            "email" => applicant.email = field.text().await?,
            "university" => applicant.university = field.text().await?,
            "phone" => applicant.phone = optional(field.text().await?),
            "nationality" => applicant.nationality = optional(field.text().await?),
            "program" => applicant.program = optional(field.text().await?),
            "document_kind" | "documentKind" => {
                let raw = field.text().await?;
                match DocumentKind::parse(&raw) {
                    Some(parsed) => kind = parsed,
                    None if raw.trim().is_empty() => {}
                    None => errors.push(
                        "document_kind",
                        ErrorCode::OutOfRange,
                        "document_kind must be 'identity' or 'education'",
                    ),
                }
            }
            _ => {}
        }
    }

    let document = upload.map(|(file_name, content_type, bytes)| UploadedDocument {
        file_name,
        content_type,
        kind,
        bytes,
    });
    let submission = ApplicationSubmission {
        applicant,
        document,
    };

    // A bad document kind is reported together with every other field error.
    if !errors.is_empty() {
        let mut merged = match validate_submission(&submission) {
            Ok(()) => ValidationErrors::default(),
            Err(field_errors) => field_errors,
        };
        merged.extend(errors);
        return Err(FormReadError::Invalid(merged));
    }

    Ok(submission)
}

fn optional(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
