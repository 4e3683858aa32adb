use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::response::Response;
use chrono::NaiveDate;
use serde_json::Value;

use crate::workflows::applications::domain::{
    ApplicantDetails, ApplicationSubmission, DocumentKind, UploadedDocument,
};
use crate::workflows::applications::model::{GenerationRequest, GenerativeModel, ModelError};
use crate::workflows::applications::notifier::{ApplicationNotice, Notifier, NotifyError};
use crate::workflows::applications::prompts::PromptKind;
use crate::workflows::applications::wizard::{
    ApplicationDraft, DocumentDescriptor, EducationLevel, EnglishLevel, LanguageTest,
    LanguageTestKind,
};
use crate::workflows::applications::{application_router, ApplicationService};

pub(super) const PASSING_VERACITY: &str =
    r#"{"isAuthentic": true, "isReadable": true, "meetsRequirements": true, "reason": ""}"#;

pub(super) const FORGED_VERACITY: &str = r#"{"isAuthentic": false, "isReadable": true, "meetsRequirements": true, "reason": "the seal appears digitally altered"}"#;

pub(super) const EXTRACTION_REPLY: &str = r#"```json
{"fullName": "Amina Diallo", "dateOfBirth": "2004-03-18", "documentNumber": null,
 "nationality": "Senegalese", "institution": "Lycée Blaise Diagne",
 "qualification": "Baccalauréat", "graduationYear": "2022", "grade": "Mention Bien"}
```"#;

pub(super) fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 9, 1).expect("valid date")
}

pub(super) fn applicant() -> ApplicantDetails {
    ApplicantDetails {
        full_name: "Amina Diallo".to_string(),
        email: "amina.diallo@example.com".to_string(),
        university: "University of Lyon".to_string(),
        phone: Some("+221 77 123 45 67".to_string()),
        nationality: Some("Senegalese".to_string()),
        program: Some("BSc Computer Science".to_string()),
    }
}

pub(super) fn pdf_document() -> UploadedDocument {
    UploadedDocument {
        file_name: "baccalaureat.pdf".to_string(),
        content_type: Some("application/pdf".to_string()),
        kind: DocumentKind::Education,
        bytes: b"%PDF-1.7 diploma".to_vec(),
    }
}

pub(super) fn submission() -> ApplicationSubmission {
    ApplicationSubmission {
        applicant: applicant(),
        document: Some(pdf_document()),
    }
}

pub(super) fn complete_draft() -> ApplicationDraft {
    ApplicationDraft {
        full_name: "Amina Diallo".to_string(),
        date_of_birth: Some("2004-03-18".to_string()),
        nationality: "Senegalese".to_string(),
        email: "amina.diallo@example.com".to_string(),
        phone: None,
        university: "University of Lyon".to_string(),
        program: "BSc Computer Science".to_string(),
        education_level: Some(EducationLevel::SecondarySchool),
        english_level: Some(EnglishLevel::B2),
        language_test: Some(LanguageTest {
            kind: LanguageTestKind::Ielts,
            score: 6.5,
        }),
        identity_document: Some(DocumentDescriptor {
            file_name: "passport.jpg".to_string(),
            content_type: Some("image/jpeg".to_string()),
            size_bytes: 240_000,
        }),
        education_document: Some(DocumentDescriptor {
            file_name: "baccalaureat.pdf".to_string(),
            content_type: None,
            size_bytes: 1_200_000,
        }),
    }
}

/// Model double answering each prompt kind with a canned reply and recording the calls.
#[derive(Default)]
pub(super) struct ScriptedModel {
    replies: HashMap<PromptKind, String>,
    calls: Mutex<Vec<(PromptKind, String)>>,
}

impl ScriptedModel {
    pub(super) fn new(veracity: &str, extraction: &str) -> Self {
        let mut replies = HashMap::new();
        replies.insert(PromptKind::Veracity, veracity.to_string());
        replies.insert(PromptKind::Extraction, extraction.to_string());
        Self {
            replies,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(super) fn calls(&self) -> Vec<PromptKind> {
        self.calls
            .lock()
            .expect("calls mutex poisoned")
            .iter()
            .map(|(kind, _)| *kind)
            .collect()
    }

    pub(super) fn mime_types(&self) -> Vec<String> {
        self.calls
            .lock()
            .expect("calls mutex poisoned")
            .iter()
            .map(|(_, mime)| mime.clone())
            .collect()
    }
}

#[async_trait]
impl GenerativeModel for ScriptedModel {
    async fn generate(&self, request: GenerationRequest<'_>) -> Result<String, ModelError> {
        self.calls
            .lock()
            .expect("calls mutex poisoned")
            .push((request.kind, request.document.mime_type.clone()));
        self.replies
            .get(&request.kind)
            .cloned()
            .ok_or(ModelError::EmptyResponse)
    }
}

/// Model double whose API always fails.
#[derive(Default)]
pub(super) struct UnavailableModel {
    pub(super) attempts: Mutex<u32>,
}

#[async_trait]
impl GenerativeModel for UnavailableModel {
    async fn generate(&self, _request: GenerationRequest<'_>) -> Result<String, ModelError> {
        *self.attempts.lock().expect("attempts mutex poisoned") += 1;
        Err(ModelError::Api {
            status: 503,
            message: "model overloaded".to_string(),
        })
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryNotifier {
    notices: Arc<Mutex<Vec<ApplicationNotice>>>,
}

impl MemoryNotifier {
    pub(super) fn notices(&self) -> Vec<ApplicationNotice> {
        self.notices.lock().expect("notice mutex poisoned").clone()
    }
}

#[async_trait]
impl Notifier for MemoryNotifier {
    async fn publish(&self, notice: &ApplicationNotice) -> Result<(), NotifyError> {
        self.notices
            .lock()
            .expect("notice mutex poisoned")
            .push(notice.clone());
        Ok(())
    }
}

pub(super) struct OfflineNotifier;

#[async_trait]
impl Notifier for OfflineNotifier {
    async fn publish(&self, _notice: &ApplicationNotice) -> Result<(), NotifyError> {
        Err(NotifyError::Transport("bot offline".to_string()))
    }
}

pub(super) fn build_service(
    model: ScriptedModel,
) -> (
    ApplicationService<ScriptedModel, MemoryNotifier>,
    Arc<ScriptedModel>,
    Arc<MemoryNotifier>,
) {
    let model = Arc::new(model);
    let notifier = Arc::new(MemoryNotifier::default());
    let service = ApplicationService::new(model.clone(), notifier.clone());
    (service, model, notifier)
}

pub(super) fn router_with_service(
    service: ApplicationService<ScriptedModel, MemoryNotifier>,
) -> axum::Router {
    application_router(Arc::new(service))
}

pub(super) const BOUNDARY: &str = "admissions-test-boundary";

/// Build a multipart body with text fields and an optional file part.
pub(super) fn multipart_body(
    fields: &[(&str, &str)],
    file: Option<(&str, &str, &[u8])>,
) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((file_name, content_type, bytes)) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"document\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub(super) fn multipart_request(body: Vec<u8>) -> axum::http::Request<axum::body::Body> {
    axum::http::Request::post("/api/v1/applications")
        .header(
            axum::http::header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(axum::body::Body::from(body))
        .expect("request builds")
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
