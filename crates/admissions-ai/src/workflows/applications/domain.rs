use std::fmt;

use serde::{Deserialize, Serialize};

/// Reference handed back to the applicant for a screened submission.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApplicationReference(pub String);

impl fmt::Display for ApplicationReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Applicant fields posted alongside the uploaded document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicantDetails {
    pub full_name: String,
    pub email: String,
    pub university: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub nationality: Option<String>,
    #[serde(default)]
    pub program: Option<String>,
}

/// Which part of the dossier an uploaded document belongs to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Identity,
    #[default]
    Education,
}

impl DocumentKind {
    pub const fn label(self) -> &'static str {
        match self {
            DocumentKind::Identity => "identity",
            DocumentKind::Education => "education",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "identity" | "id" | "passport" => Some(Self::Identity),
            "education" | "diploma" | "transcript" => Some(Self::Education),
            _ => None,
        }
    }
}

/// Raw upload received from the form.
#[derive(Clone, PartialEq, Eq)]
pub struct UploadedDocument {
    pub file_name: String,
    pub content_type: Option<String>,
    pub kind: DocumentKind,
    pub bytes: Vec<u8>,
}

impl UploadedDocument {
    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

impl fmt::Debug for UploadedDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadedDocument")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("kind", &self.kind)
            .field("size", &self.bytes.len())
            .finish()
    }
}

/// Everything the submission endpoint received for one application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationSubmission {
    pub applicant: ApplicantDetails,
    pub document: Option<UploadedDocument>,
}

/// Model verdict on whether a document can be trusted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VeracityReport {
    pub is_authentic: bool,
    pub is_readable: bool,
    pub meets_requirements: bool,
    #[serde(default)]
    pub reason: String,
}

impl VeracityReport {
    /// True only when every flag holds.
    pub fn passed(&self) -> bool {
        self.is_authentic && self.is_readable && self.meets_requirements
    }

    /// Reason surfaced to the applicant when the check fails.
    pub fn failure_reason(&self) -> String {
        let reason = self.reason.trim();
        if !reason.is_empty() {
            return reason.to_string();
        }

        let mut failed = Vec::new();
        if !self.is_authentic {
            failed.push("authentic");
        }
        if !self.is_readable {
            failed.push("readable");
        }
        if !self.meets_requirements {
            failed.push("compliant with the submission requirements");
        }
        format!("the document was not judged {}", failed.join(" or "))
    }
}

/// Structured fields pulled out of a verified document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedFields {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub date_of_birth: Option<String>,
    #[serde(default)]
    pub document_number: Option<String>,
    #[serde(default)]
    pub nationality: Option<String>,
    #[serde(default)]
    pub institution: Option<String>,
    #[serde(default)]
    pub qualification: Option<String>,
    #[serde(default)]
    pub graduation_year: Option<String>,
    #[serde(default)]
    pub grade: Option<String>,
}

/// Result of a submission that made it past validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SubmissionOutcome {
    Verified {
        reference: ApplicationReference,
        veracity: VeracityReport,
        extraction: ExtractedFields,
        #[serde(skip_serializing_if = "Option::is_none")]
        name_matches: Option<bool>,
    },
    Rejected {
        reference: ApplicationReference,
        veracity: VeracityReport,
        message: String,
    },
}

impl SubmissionOutcome {
    pub fn reference(&self) -> &ApplicationReference {
        match self {
            SubmissionOutcome::Verified { reference, .. }
            | SubmissionOutcome::Rejected { reference, .. } => reference,
        }
    }

    pub fn veracity(&self) -> &VeracityReport {
        match self {
            SubmissionOutcome::Verified { veracity, .. }
            | SubmissionOutcome::Rejected { veracity, .. } => veracity,
        }
    }

    pub fn is_verified(&self) -> bool {
        matches!(self, SubmissionOutcome::Verified { .. })
    }

    pub const fn label(&self) -> &'static str {
        match self {
            SubmissionOutcome::Verified { .. } => "verified",
            SubmissionOutcome::Rejected { .. } => "rejected",
        }
    }
}
