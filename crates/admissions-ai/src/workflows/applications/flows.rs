use tracing::debug;

use super::domain::{ApplicantDetails, DocumentKind, ExtractedFields, VeracityReport};
use super::model::{
    parse_json_reply, EncodedDocument, GenerationRequest, GenerativeModel, ModelError,
};
use super::prompts::{extraction_prompt, veracity_prompt, PromptKind};

/// Asks the model whether a document is authentic, readable and conforming.
pub struct VeracityFlow;

impl VeracityFlow {
    pub async fn run<M>(
        model: &M,
        applicant: &ApplicantDetails,
        kind: DocumentKind,
        document: &EncodedDocument,
    ) -> Result<VeracityReport, ModelError>
    where
        M: GenerativeModel + ?Sized,
    {
        let reply = model
            .generate(GenerationRequest {
                kind: PromptKind::Veracity,
                prompt: veracity_prompt(applicant, kind),
                document,
            })
            .await?;
        let report: VeracityReport = parse_json_reply(&reply)?;
        debug!(
            authentic = report.is_authentic,
            readable = report.is_readable,
            conforming = report.meets_requirements,
            "veracity check finished"
        );
        Ok(report)
    }
}

/// Pulls structured applicant fields out of a document that passed the veracity check.
pub struct ExtractionFlow;

impl ExtractionFlow {
    pub async fn run<M>(
        model: &M,
        kind: DocumentKind,
        document: &EncodedDocument,
    ) -> Result<ExtractedFields, ModelError>
    where
        M: GenerativeModel + ?Sized,
    {
        let reply = model
            .generate(GenerationRequest {
                kind: PromptKind::Extraction,
                prompt: extraction_prompt(kind),
                document,
            })
            .await?;
        let fields: ExtractedFields = parse_json_reply(&reply)?;
        Ok(normalize(fields))
    }
}

fn normalize(fields: ExtractedFields) -> ExtractedFields {
    fn clean(value: Option<String>) -> Option<String> {
        value
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty() && !value.eq_ignore_ascii_case("null"))
    }

    ExtractedFields {
        full_name: clean(fields.full_name),
        date_of_birth: clean(fields.date_of_birth),
        document_number: clean(fields.document_number),
        nationality: clean(fields.nationality),
        institution: clean(fields.institution),
        qualification: clean(fields.qualification),
        graduation_year: clean(fields.graduation_year),
        grade: clean(fields.grade),
    }
}

/// Compare an extracted name with the name typed into the form.
///
/// Case and word order are ignored, as are commas and hyphens between name parts.
pub fn names_match(typed: &str, extracted: &str) -> bool {
    fn tokens(raw: &str) -> Vec<String> {
        let mut words: Vec<String> = raw
            .split(|c: char| c.is_whitespace() || c == ',' || c == '-')
            .filter(|word| !word.is_empty())
            .map(str::to_lowercase)
            .collect();
        words.sort();
        words
    }

    let typed = tokens(typed);
    !typed.is_empty() && typed == tokens(extracted)
}
