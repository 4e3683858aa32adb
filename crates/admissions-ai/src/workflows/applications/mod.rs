//! Student application intake: the multi-step form rules, submission validation, and the
//! two-call document screening pipeline (veracity check, then field extraction).

pub mod domain;
pub mod flows;
pub mod model;
pub mod notifier;
pub mod prompts;
pub mod router;
pub mod service;
pub mod validation;
pub mod wizard;

#[cfg(test)]
mod tests;

pub use domain::{
    ApplicantDetails, ApplicationReference, ApplicationSubmission, DocumentKind, ExtractedFields,
    SubmissionOutcome, UploadedDocument, VeracityReport,
};
pub use model::{
    EncodedDocument, GeminiModel, GeminiSetupError, GenerationRequest, GenerativeModel,
    ModelError,
};
pub use notifier::{
    ApplicationNotice, LogNotifier, Notifier, NotifyError, TelegramNotifier, NOTIFY_TIMEOUT,
};
pub use router::{application_router, MAX_UPLOAD_BODY_BYTES};
pub use service::{ApplicationService, ApplicationServiceError};
pub use validation::{
    validate_submission, ErrorCode, FieldError, ValidationErrors, ALLOWED_DOCUMENT_TYPES,
    MAX_DOCUMENT_BYTES,
};
pub use wizard::{ApplicationDraft, ApplicationWizard, FormStep, WizardError};
