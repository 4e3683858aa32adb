use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use super::domain::{ApplicationReference, ApplicationSubmission, SubmissionOutcome};
use super::flows::{names_match, ExtractionFlow, VeracityFlow};
use super::model::{EncodedDocument, GenerativeModel, ModelError};
use super::notifier::{ApplicationNotice, Notifier, NOTIFY_TIMEOUT};
use super::validation::{validate_submission, ErrorCode, ValidationErrors};

/// Service composing validation, the two screening flows, and staff notification.
pub struct ApplicationService<M, N> {
    model: Arc<M>,
    notifier: Arc<N>,
    notify_timeout: Duration,
}

static APPLICATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_reference() -> ApplicationReference {
    let id = APPLICATION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ApplicationReference(format!("app-{id:06}"))
}

impl<M, N> ApplicationService<M, N>
where
    M: GenerativeModel + 'static,
    N: Notifier + 'static,
{
    pub fn new(model: Arc<M>, notifier: Arc<N>) -> Self {
        Self {
            model,
            notifier,
            notify_timeout: NOTIFY_TIMEOUT,
        }
    }

    /// Upper bound on how long a verified verdict waits for the staff notification.
    pub fn with_notify_timeout(mut self, timeout: Duration) -> Self {
        self.notify_timeout = timeout;
        self
    }

    /// Screen a submission.
    ///
    /// Validation failures never reach the model. The extraction call only runs when the
    /// veracity check passes on every flag; otherwise the rejected outcome carries the
    /// veracity report and its reason.
    pub async fn submit(
        &self,
        submission: ApplicationSubmission,
    ) -> Result<SubmissionOutcome, ApplicationServiceError> {
        validate_submission(&submission)?;

        let ApplicationSubmission {
            applicant,
            document,
        } = submission;
        let document = document.ok_or_else(missing_document)?;

        let reference = next_reference();
        info!(
            %reference,
            kind = document.kind.label(),
            size = document.size(),
            "screening application document"
        );

        let encoded = EncodedDocument::from_upload(&document);

        let veracity =
            VeracityFlow::run(self.model.as_ref(), &applicant, document.kind, &encoded).await?;

        if !veracity.passed() {
            let message = veracity.failure_reason();
            warn!(%reference, reason = %message, "document failed veracity check");
            return Ok(SubmissionOutcome::Rejected {
                reference,
                veracity,
                message,
            });
        }

        let extraction = ExtractionFlow::run(self.model.as_ref(), document.kind, &encoded).await?;
        let name_matches = extraction
            .full_name
            .as_deref()
            .map(|extracted| names_match(&applicant.full_name, extracted));

        info!(%reference, ?name_matches, "document verified");

        let notice = ApplicationNotice {
            reference: reference.clone(),
            full_name: applicant.full_name.trim().to_string(),
            email: applicant.email.trim().to_string(),
            university: applicant.university.trim().to_string(),
            document_kind: document.kind,
            extraction: extraction.clone(),
        };
        match tokio::time::timeout(self.notify_timeout, self.notifier.publish(&notice)).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                warn!(%reference, error = %err, "failed to publish application notice");
            }
            Err(_) => {
                warn!(
                    %reference,
                    timeout_ms = self.notify_timeout.as_millis() as u64,
                    "application notice timed out"
                );
            }
        }

        Ok(SubmissionOutcome::Verified {
            reference,
            veracity,
            extraction,
            name_matches,
        })
    }
}

fn missing_document() -> ValidationErrors {
    let mut errors = ValidationErrors::default();
    errors.push("document", ErrorCode::Required, "document is required");
    errors
}

/// Error raised by the application service.
#[derive(Debug, thiserror::Error)]
pub enum ApplicationServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
    #[error("document screening is unavailable: {0}")]
    Model(#[from] ModelError),
}
