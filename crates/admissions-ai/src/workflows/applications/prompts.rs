//! Prompt text for the two document screening calls.
//!
//! Both prompts ask for a single JSON object whose keys match the serde names of
//! [`VeracityReport`](super::domain::VeracityReport) and
//! [`ExtractedFields`](super::domain::ExtractedFields).

use super::domain::{ApplicantDetails, DocumentKind};

/// Which of the two screening calls a prompt belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptKind {
    Veracity,
    Extraction,
}

impl PromptKind {
    pub const fn label(self) -> &'static str {
        match self {
            PromptKind::Veracity => "veracity",
            PromptKind::Extraction => "extraction",
        }
    }
}

fn document_description(kind: DocumentKind) -> &'static str {
    match kind {
        DocumentKind::Identity => "an identity document (passport or national identity card)",
        DocumentKind::Education => {
            "an education document (diploma, degree certificate or academic transcript)"
        }
    }
}

pub fn veracity_prompt(applicant: &ApplicantDetails, kind: DocumentKind) -> String {
    format!(
        "You review admission files for a student-recruitment agency.\n\
         The attached file was uploaded as {description} by an applicant named \"{name}\" \
         who is applying to \"{university}\".\n\
         Decide three things:\n\
         - isAuthentic: the document looks like a genuine, unaltered official document.\n\
         - isReadable: the text and key fields are legible.\n\
         - meetsRequirements: the document really is {description} and is usable for an \
         admission file.\n\
         Reply with one JSON object and nothing else:\n\
         {{\"isAuthentic\": boolean, \"isReadable\": boolean, \"meetsRequirements\": boolean, \
         \"reason\": string}}\n\
         \"reason\" briefly explains any false value, or is empty when all are true.",
        description = document_description(kind),
        name = applicant.full_name.trim(),
        university = applicant.university.trim(),
    )
}

pub fn extraction_prompt(kind: DocumentKind) -> String {
    let focus = match kind {
        DocumentKind::Identity => {
            "Focus on fullName, dateOfBirth, documentNumber and nationality."
        }
        DocumentKind::Education => {
            "Focus on fullName, institution, qualification, graduationYear and grade."
        }
    };

    format!(
        "Extract data from the attached file, which is {description}.\n\
         {focus}\n\
         Reply with one JSON object and nothing else, using exactly these keys:\n\
         {{\"fullName\": string|null, \"dateOfBirth\": string|null, \
         \"documentNumber\": string|null, \"nationality\": string|null, \
         \"institution\": string|null, \"qualification\": string|null, \
         \"graduationYear\": string|null, \"grade\": string|null}}\n\
         Use null for anything not present. Dates use YYYY-MM-DD.",
        description = document_description(kind),
    )
}
