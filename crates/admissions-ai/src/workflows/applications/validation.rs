use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use super::domain::{ApplicationSubmission, UploadedDocument};

/// Largest accepted upload.
pub const MAX_DOCUMENT_BYTES: usize = 5 * 1024 * 1024;

/// MIME types the screening model can read.
pub const ALLOWED_DOCUMENT_TYPES: [&str; 4] =
    ["application/pdf", "image/jpeg", "image/png", "image/webp"];

pub(crate) const MAX_TEXT_LEN: usize = 200;

/// Stable identifiers the front end maps onto its own localized messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Required,
    TooLong,
    InvalidEmail,
    InvalidPhone,
    InvalidDate,
    OutOfRange,
    FileTooLarge,
    UnsupportedType,
    EmptyFile,
}

/// One problem with one form field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub code: ErrorCode,
    pub message: String,
}

/// Field-level validation failures, in the order the form lays fields out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{} field(s) failed validation", .errors.len())]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn push(&mut self, field: &str, code: ErrorCode, message: impl Into<String>) {
        self.errors.push(FieldError {
            field: field.to_string(),
            code,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn for_field<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a FieldError> + 'a {
        self.errors.iter().filter(move |error| error.field == field)
    }

    pub fn has(&self, field: &str, code: ErrorCode) -> bool {
        self.for_field(field).any(|error| error.code == code)
    }

    pub fn extend(&mut self, other: ValidationErrors) {
        self.errors.extend(other.errors);
    }

    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles")
    })
}

fn phone_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\+?[0-9][0-9 ()\-]{5,18}[0-9]$").expect("phone pattern compiles")
    })
}

pub(crate) fn require_text(errors: &mut ValidationErrors, field: &str, value: &str) {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        errors.push(field, ErrorCode::Required, format!("{field} is required"));
    } else if trimmed.chars().count() > MAX_TEXT_LEN {
        errors.push(
            field,
            ErrorCode::TooLong,
            format!("{field} must be at most {MAX_TEXT_LEN} characters"),
        );
    }
}

pub(crate) fn optional_text(errors: &mut ValidationErrors, field: &str, value: Option<&str>) {
    if let Some(value) = value {
        if value.trim().chars().count() > MAX_TEXT_LEN {
            errors.push(
                field,
                ErrorCode::TooLong,
                format!("{field} must be at most {MAX_TEXT_LEN} characters"),
            );
        }
    }
}

pub(crate) fn check_email(errors: &mut ValidationErrors, field: &str, value: &str) {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        errors.push(field, ErrorCode::Required, format!("{field} is required"));
    } else if trimmed.len() > MAX_TEXT_LEN || !email_pattern().is_match(trimmed) {
        errors.push(
            field,
            ErrorCode::InvalidEmail,
            "enter a valid email address",
        );
    }
}

pub(crate) fn check_phone(errors: &mut ValidationErrors, field: &str, value: Option<&str>) {
    let Some(value) = value.map(str::trim).filter(|value| !value.is_empty()) else {
        return;
    };
    if !phone_pattern().is_match(value) {
        errors.push(field, ErrorCode::InvalidPhone, "enter a valid phone number");
    }
}

/// Resolve the effective MIME type of an upload.
///
/// A missing or generic declared type falls back to a guess from the file name.
pub fn resolve_content_type(file_name: &str, declared: Option<&str>) -> Option<String> {
    let declared = declared
        .and_then(|raw| raw.parse::<mime::Mime>().ok())
        .map(|parsed| parsed.essence_str().to_ascii_lowercase())
        .filter(|essence| essence != mime::APPLICATION_OCTET_STREAM.essence_str());

    declared.or_else(|| {
        mime_guess::from_path(file_name)
            .first()
            .map(|guess| guess.essence_str().to_ascii_lowercase())
    })
}

/// Check an upload's size and type without reading its contents.
pub fn check_document(
    errors: &mut ValidationErrors,
    field: &str,
    file_name: &str,
    content_type: Option<&str>,
    size: usize,
) {
    if size == 0 {
        errors.push(field, ErrorCode::EmptyFile, "the uploaded file is empty");
    } else if size > MAX_DOCUMENT_BYTES {
        errors.push(
            field,
            ErrorCode::FileTooLarge,
            format!(
                "the file must be at most {} MB",
                MAX_DOCUMENT_BYTES / (1024 * 1024)
            ),
        );
    }

    let resolved = resolve_content_type(file_name, content_type);
    let allowed = resolved
        .as_deref()
        .is_some_and(|essence| ALLOWED_DOCUMENT_TYPES.contains(&essence));
    if !allowed {
        errors.push(
            field,
            ErrorCode::UnsupportedType,
            "upload a PDF, JPEG, PNG or WebP file",
        );
    }
}

/// Validate a submission before any outbound call is made.
pub fn validate_submission(submission: &ApplicationSubmission) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    let applicant = &submission.applicant;

    require_text(&mut errors, "full_name", &applicant.full_name);
    check_email(&mut errors, "email", &applicant.email);
    require_text(&mut errors, "university", &applicant.university);
    check_phone(&mut errors, "phone", applicant.phone.as_deref());
    optional_text(&mut errors, "nationality", applicant.nationality.as_deref());
    optional_text(&mut errors, "program", applicant.program.as_deref());

    match &submission.document {
        Some(document) => check_upload(&mut errors, "document", document),
        None => errors.push("document", ErrorCode::Required, "document is required"),
    }

    errors.into_result()
}

fn check_upload(errors: &mut ValidationErrors, field: &str, document: &UploadedDocument) {
    check_document(
        errors,
        field,
        &document.file_name,
        document.content_type.as_deref(),
        document.size(),
    );
}
