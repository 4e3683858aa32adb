use super::common::*;
use crate::workflows::applications::domain::DocumentKind;
use crate::workflows::applications::flows::{names_match, ExtractionFlow, VeracityFlow};
use crate::workflows::applications::model::{EncodedDocument, ModelError};
use crate::workflows::applications::prompts::PromptKind;

fn encoded() -> EncodedDocument {
    EncodedDocument::from_upload(&pdf_document())
}

#[tokio::test]
async fn veracity_flow_parses_flags() {
    let model = ScriptedModel::new(FORGED_VERACITY, EXTRACTION_REPLY);
    let report = VeracityFlow::run(&model, &applicant(), DocumentKind::Education, &encoded())
        .await
        .expect("veracity reply parses");

    assert!(!report.is_authentic);
    assert!(report.is_readable);
    assert!(!report.passed());
    assert_eq!(report.failure_reason(), "the seal appears digitally altered");
    assert_eq!(model.calls(), vec![PromptKind::Veracity]);
    assert_eq!(model.mime_types(), vec!["application/pdf".to_string()]);
}

#[tokio::test]
async fn extraction_flow_normalizes_blank_values() {
    let model = ScriptedModel::new(
        PASSING_VERACITY,
        r#"{"fullName": "  Amina Diallo ", "institution": "", "grade": "null"}"#,
    );
    let fields = ExtractionFlow::run(&model, DocumentKind::Education, &encoded())
        .await
        .expect("extraction reply parses");

    assert_eq!(fields.full_name.as_deref(), Some("Amina Diallo"));
    assert_eq!(fields.institution, None);
    assert_eq!(fields.grade, None);
    assert_eq!(model.calls(), vec![PromptKind::Extraction]);
}

#[tokio::test]
async fn malformed_model_reply_is_an_error() {
    let model = ScriptedModel::new("I think it is genuine.", EXTRACTION_REPLY);
    let result =
        VeracityFlow::run(&model, &applicant(), DocumentKind::Identity, &encoded()).await;
    assert!(matches!(result, Err(ModelError::Malformed(_))));
}

#[test]
fn failure_reason_falls_back_to_flags() {
    let report: crate::workflows::applications::domain::VeracityReport = serde_json::from_str(
        r#"{"isAuthentic": true, "isReadable": false, "meetsRequirements": false}"#,
    )
    .expect("reason defaults to empty");
    assert_eq!(
        report.failure_reason(),
        "the document was not judged readable or compliant with the submission requirements"
    );
}

#[test]
fn names_match_ignores_case_and_order() {
    assert!(names_match("Amina Diallo", "DIALLO, Amina"));
    assert!(names_match("Jean-Luc Picard", "picard jean luc"));
    assert!(!names_match("Amina Diallo", "Awa Diallo"));
    assert!(!names_match("   ", ""));
}
