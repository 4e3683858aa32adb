//! End-to-end checks of the submission pipeline through the public service facade, using
//! the real Gemini client against a local mock of the `generateContent` endpoint.

use std::sync::Arc;
use std::time::Duration;

use admissions_ai::workflows::applications::{
    ApplicantDetails, ApplicationService, ApplicationServiceError, ApplicationSubmission,
    DocumentKind, GeminiModel, LogNotifier, ModelError, SubmissionOutcome, TelegramNotifier,
    UploadedDocument,
};
use httpmock::prelude::*;
use serde_json::{json, Value};

const GENERATE_PATH: &str = "/v1beta/models/gemini-1.5-flash:generateContent";

fn candidate(text: &str) -> Value {
    json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] },
            "finishReason": "STOP"
        }]
    })
}

fn submission() -> ApplicationSubmission {
    ApplicationSubmission {
        applicant: ApplicantDetails {
            full_name: "Kofi Mensah".to_string(),
            email: "kofi.mensah@example.org".to_string(),
            university: "Technical University of Munich".to_string(),
            ..ApplicantDetails::default()
        },
        document: Some(UploadedDocument {
            file_name: "passport.jpg".to_string(),
            content_type: Some("image/jpeg".to_string()),
            kind: DocumentKind::Identity,
            bytes: vec![0xFF, 0xD8, 0xFF, 0xE0],
        }),
    }
}

fn gemini(server: &MockServer) -> GeminiModel {
    GeminiModel::new(
        "test-key",
        "gemini-1.5-flash",
        server.base_url(),
        reqwest::Client::new(),
    )
}

fn service(server: &MockServer) -> ApplicationService<GeminiModel, LogNotifier> {
    ApplicationService::new(Arc::new(gemini(server)), Arc::new(LogNotifier))
}

async fn mock_passing_screening(server: &MockServer) {
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path(GENERATE_PATH)
                .body_contains("isAuthentic");
            then.status(200).json_body(candidate(
                r#"{"isAuthentic":true,"isReadable":true,"meetsRequirements":true,"reason":""}"#,
            ));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path(GENERATE_PATH)
                .body_contains("documentNumber");
            then.status(200)
                .json_body(candidate(r#"{"fullName":"Kofi Mensah"}"#));
        })
        .await;
}

#[tokio::test]
async fn verified_identity_document_flows_through_both_calls() {
    let server = MockServer::start_async().await;

    let veracity = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(GENERATE_PATH)
                .header("x-goog-api-key", "test-key")
                .body_contains("isAuthentic")
                .body_contains("/9j/4A==");
            then.status(200).json_body(candidate(
                r#"{"isAuthentic":true,"isReadable":true,"meetsRequirements":true,"reason":""}"#,
            ));
        })
        .await;

    let extraction = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(GENERATE_PATH)
                .body_contains("documentNumber");
            then.status(200).json_body(candidate(
                r#"{"fullName":"MENSAH Kofi","dateOfBirth":"2003-11-02","documentNumber":"G1234567","nationality":"Ghanaian"}"#,
            ));
        })
        .await;

    let outcome = service(&server)
        .submit(submission())
        .await
        .expect("pipeline succeeds");

    veracity.assert_hits_async(1).await;
    extraction.assert_hits_async(1).await;

    match outcome {
        SubmissionOutcome::Verified {
            extraction,
            name_matches,
            ..
        } => {
            assert_eq!(extraction.document_number.as_deref(), Some("G1234567"));
            assert_eq!(extraction.nationality.as_deref(), Some("Ghanaian"));
            assert_eq!(name_matches, Some(true));
        }
        other => panic!("expected verified outcome, got {other:?}"),
    }
}

#[tokio::test]
async fn unreadable_document_stops_after_veracity_call() {
    let server = MockServer::start_async().await;

    let veracity = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(GENERATE_PATH)
                .body_contains("isAuthentic");
            then.status(200).json_body(candidate(
                r#"{"isAuthentic":true,"isReadable":false,"meetsRequirements":true,"reason":"the scan is too dark"}"#,
            ));
        })
        .await;

    let extraction = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(GENERATE_PATH)
                .body_contains("documentNumber");
            then.status(200).json_body(candidate("{}"));
        })
        .await;

    let outcome = service(&server)
        .submit(submission())
        .await
        .expect("pipeline completes");

    veracity.assert_hits_async(1).await;
    extraction.assert_hits_async(0).await;

    let rendered = serde_json::to_value(&outcome).expect("outcome serializes");
    assert_eq!(rendered["status"], "rejected");
    assert_eq!(rendered["message"], "the scan is too dark");
    assert_eq!(rendered["veracity"]["isReadable"], false);
}

#[tokio::test]
async fn api_errors_surface_as_model_failures() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path(GENERATE_PATH);
            then.status(429).json_body(json!({
                "error": { "code": 429, "message": "Resource has been exhausted", "status": "RESOURCE_EXHAUSTED" }
            }));
        })
        .await;

    match service(&server).submit(submission()).await {
        Err(ApplicationServiceError::Model(ModelError::Api { status, message })) => {
            assert_eq!(status, 429);
            assert_eq!(message, "Resource has been exhausted");
        }
        other => panic!("expected API error, got {other:?}"),
    }
}

#[tokio::test]
async fn empty_candidates_are_reported() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path(GENERATE_PATH);
            then.status(200).json_body(json!({ "candidates": [] }));
        })
        .await;

    let result = service(&server).submit(submission()).await;
    assert!(matches!(
        result,
        Err(ApplicationServiceError::Model(ModelError::EmptyResponse))
    ));
}

#[tokio::test]
async fn invalid_submission_makes_no_http_calls() {
    let server = MockServer::start_async().await;
    let any_call = server
        .mock_async(|when, then| {
            when.any_request();
            then.status(500);
        })
        .await;

    let mut submission = submission();
    submission.applicant.university = String::new();

    let result = service(&server).submit(submission).await;
    assert!(matches!(result, Err(ApplicationServiceError::Validation(_))));
    any_call.assert_hits_async(0).await;
}

#[tokio::test]
async fn stalled_notification_does_not_hold_back_the_verdict() {
    let gemini_server = MockServer::start_async().await;
    mock_passing_screening(&gemini_server).await;

    let telegram_server = MockServer::start_async().await;
    telegram_server
        .mock_async(|when, then| {
            when.method(POST).path("/bot123:abc/sendMessage");
            then.status(200)
                .json_body(json!({ "ok": true }))
                .delay(Duration::from_secs(10));
        })
        .await;

    let notifier = TelegramNotifier::with_api_base(
        reqwest::Client::new(),
        telegram_server.base_url(),
        "123:abc",
        "-1001",
    );
    let service = ApplicationService::new(Arc::new(gemini(&gemini_server)), Arc::new(notifier))
        .with_notify_timeout(Duration::from_millis(300));

    let outcome = tokio::time::timeout(Duration::from_secs(3), service.submit(submission()))
        .await
        .expect("verdict arrives before the notification completes")
        .expect("pipeline succeeds");

    assert!(outcome.is_verified());
}
