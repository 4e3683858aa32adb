use std::path::PathBuf;
use std::sync::Arc;

use admissions_ai::config::AppConfig;
use admissions_ai::error::AppError;
use admissions_ai::telemetry;
use admissions_ai::workflows::applications::{
    ApplicantDetails, ApplicationService, ApplicationServiceError, ApplicationSubmission,
    DocumentKind, GeminiModel, LogNotifier, SubmissionOutcome, UploadedDocument,
};
use clap::Args;
use serde_json::json;

#[derive(Args, Debug)]
pub(crate) struct CheckArgs {
    /// Applicant full name as typed on the form
    #[arg(long)]
    pub(crate) full_name: String,
    /// Applicant email address
    #[arg(long)]
    pub(crate) email: String,
    /// University the applicant is applying to
    #[arg(long)]
    pub(crate) university: String,
    /// Document kind: identity or education
    #[arg(long, default_value = "education", value_parser = parse_kind)]
    pub(crate) kind: DocumentKind,
    /// Path of the PDF or image to screen
    pub(crate) path: PathBuf,
}

fn parse_kind(raw: &str) -> Result<DocumentKind, String> {
    DocumentKind::parse(raw).ok_or_else(|| format!("'{raw}' is not 'identity' or 'education'"))
}

pub(crate) async fn run_check(args: CheckArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let model = GeminiModel::from_config(&config.model)?;
    let service = ApplicationService::new(Arc::new(model), Arc::new(LogNotifier));

    let bytes = tokio::fs::read(&args.path).await?;
    let file_name = args
        .path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    let content_type = mime_guess::from_path(&args.path)
        .first()
        .map(|guess| guess.essence_str().to_string());

    let submission = ApplicationSubmission {
        applicant: ApplicantDetails {
            full_name: args.full_name,
            email: args.email,
            university: args.university,
            ..ApplicantDetails::default()
        },
        document: Some(UploadedDocument {
            file_name,
            content_type,
            kind: args.kind,
            bytes,
        }),
    };

    let rendered = match service.submit(submission).await {
        Ok(outcome) => render_outcome(&outcome)?,
        Err(ApplicationServiceError::Validation(errors)) => serde_json::to_string_pretty(
            &json!({ "status": "invalid", "errors": errors.errors }),
        )?,
        Err(err) => return Err(err.into()),
    };
    println!("{rendered}");
    Ok(())
}

fn render_outcome(outcome: &SubmissionOutcome) -> Result<String, AppError> {
    Ok(serde_json::to_string_pretty(outcome)?)
}
