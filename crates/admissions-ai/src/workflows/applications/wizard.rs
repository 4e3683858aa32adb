//! Multi-step application form.
//!
//! The form walks the applicant through personal, contact, education, language and document
//! steps before a final review. Only the active step is validated when moving forward, and
//! the review step re-checks the whole draft so edits made after a step was completed are
//! still caught before submission.

use std::collections::BTreeSet;

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use super::validation::{
    check_document, check_email, check_phone, require_text, ErrorCode, ValidationErrors,
};

const MINIMUM_APPLICANT_AGE_YEARS: u32 = 15;
const EARLIEST_BIRTH_YEAR: i32 = 1900;

/// Pages of the application form, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormStep {
    Personal,
    Contact,
    Education,
    Language,
    Documents,
    Review,
}

impl FormStep {
    pub const ALL: [FormStep; 6] = [
        FormStep::Personal,
        FormStep::Contact,
        FormStep::Education,
        FormStep::Language,
        FormStep::Documents,
        FormStep::Review,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            FormStep::Personal => "personal",
            FormStep::Contact => "contact",
            FormStep::Education => "education",
            FormStep::Language => "language",
            FormStep::Documents => "documents",
            FormStep::Review => "review",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::ALL
            .into_iter()
            .find(|step| step.label().eq_ignore_ascii_case(raw))
    }

    pub fn index(self) -> usize {
        Self::ALL
            .iter()
            .position(|step| *step == self)
            .unwrap_or_default()
    }

    pub fn next(self) -> Option<Self> {
        Self::ALL.get(self.index() + 1).copied()
    }

    pub fn previous(self) -> Option<Self> {
        self.index()
            .checked_sub(1)
            .and_then(|index| Self::ALL.get(index).copied())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EducationLevel {
    SecondarySchool,
    Bachelor,
    Master,
    Doctorate,
    Other,
}

/// Self-assessed English level on the CEFR scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnglishLevel {
    A1,
    A2,
    B1,
    B2,
    C1,
    C2,
    #[serde(rename = "native")]
    Native,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LanguageTestKind {
    Ielts,
    Toefl,
    Duolingo,
}

impl LanguageTestKind {
    /// Inclusive score range published by each test provider.
    pub const fn score_range(self) -> (f32, f32) {
        match self {
            LanguageTestKind::Ielts => (0.0, 9.0),
            LanguageTestKind::Toefl => (0.0, 120.0),
            LanguageTestKind::Duolingo => (10.0, 160.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LanguageTest {
    pub kind: LanguageTestKind,
    pub score: f32,
}

/// Client-side description of a selected file before it is uploaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentDescriptor {
    pub file_name: String,
    #[serde(default)]
    pub content_type: Option<String>,
    pub size_bytes: u64,
}

/// Everything the applicant has typed so far, across all steps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationDraft {
    pub full_name: String,
    /// `YYYY-MM-DD`, kept as text so malformed input surfaces as a field error.
    pub date_of_birth: Option<String>,
    pub nationality: String,
    pub email: String,
    pub phone: Option<String>,
    pub university: String,
    pub program: String,
    pub education_level: Option<EducationLevel>,
    pub english_level: Option<EnglishLevel>,
    pub language_test: Option<LanguageTest>,
    pub identity_document: Option<DocumentDescriptor>,
    pub education_document: Option<DocumentDescriptor>,
}

/// Validate the fields belonging to a single step.
///
/// The review step validates the entire draft.
pub fn validate_step(
    step: FormStep,
    draft: &ApplicationDraft,
    today: NaiveDate,
) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    collect_step_errors(step, draft, today, &mut errors);
    errors.into_result()
}

fn collect_step_errors(
    step: FormStep,
    draft: &ApplicationDraft,
    today: NaiveDate,
    errors: &mut ValidationErrors,
) {
    match step {
        FormStep::Personal => {
            require_text(errors, "full_name", &draft.full_name);
            check_date_of_birth(errors, draft.date_of_birth.as_deref(), today);
            require_text(errors, "nationality", &draft.nationality);
        }
        FormStep::Contact => {
            check_email(errors, "email", &draft.email);
            check_phone(errors, "phone", draft.phone.as_deref());
        }
        FormStep::Education => {
            require_text(errors, "university", &draft.university);
            require_text(errors, "program", &draft.program);
            if draft.education_level.is_none() {
                errors.push(
                    "education_level",
                    ErrorCode::Required,
                    "education_level is required",
                );
            }
        }
        FormStep::Language => {
            if draft.english_level.is_none() {
                errors.push(
                    "english_level",
                    ErrorCode::Required,
                    "english_level is required",
                );
            }
            if let Some(test) = draft.language_test {
                let (min, max) = test.kind.score_range();
                if !test.score.is_finite() || test.score < min || test.score > max {
                    errors.push(
                        "language_test.score",
                        ErrorCode::OutOfRange,
                        format!("score must be between {min} and {max}"),
                    );
                }
            }
        }
        FormStep::Documents => {
            check_descriptor(errors, "identity_document", draft.identity_document.as_ref());
            check_descriptor(
                errors,
                "education_document",
                draft.education_document.as_ref(),
            );
        }
        FormStep::Review => {
            for step in FormStep::ALL
                .into_iter()
                .filter(|step| *step != FormStep::Review)
            {
                collect_step_errors(step, draft, today, errors);
            }
        }
    }
}

fn check_date_of_birth(errors: &mut ValidationErrors, raw: Option<&str>, today: NaiveDate) {
    let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else {
        errors.push(
            "date_of_birth",
            ErrorCode::Required,
            "date_of_birth is required",
        );
        return;
    };

    let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") else {
        errors.push(
            "date_of_birth",
            ErrorCode::InvalidDate,
            "use the YYYY-MM-DD format",
        );
        return;
    };

    let latest = today
        .checked_sub_months(Months::new(MINIMUM_APPLICANT_AGE_YEARS * 12))
        .unwrap_or(today);
    if date.year() < EARLIEST_BIRTH_YEAR || date > latest {
        errors.push(
            "date_of_birth",
            ErrorCode::OutOfRange,
            format!("applicants must be at least {MINIMUM_APPLICANT_AGE_YEARS} years old"),
        );
    }
}

fn check_descriptor(
    errors: &mut ValidationErrors,
    field: &str,
    descriptor: Option<&DocumentDescriptor>,
) {
    match descriptor {
        Some(descriptor) => {
            let size = usize::try_from(descriptor.size_bytes).unwrap_or(usize::MAX);
            check_document(
                errors,
                field,
                &descriptor.file_name,
                descriptor.content_type.as_deref(),
                size,
            );
        }
        None => errors.push(field, ErrorCode::Required, format!("{field} is required")),
    }
}

/// Raised when navigation skips ahead of the applicant's progress.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WizardError {
    #[error("step '{requested}' is not reachable yet (current step '{current}')")]
    StepLocked {
        requested: &'static str,
        current: &'static str,
    },
}

/// Tracks which page of the form is active and which pages have been completed.
#[derive(Debug, Clone)]
pub struct ApplicationWizard {
    draft: ApplicationDraft,
    current: FormStep,
    completed: BTreeSet<FormStep>,
    today: NaiveDate,
}

impl ApplicationWizard {
    pub fn new(today: NaiveDate) -> Self {
        Self::with_draft(ApplicationDraft::default(), today)
    }

    pub fn with_draft(draft: ApplicationDraft, today: NaiveDate) -> Self {
        Self {
            draft,
            current: FormStep::Personal,
            completed: BTreeSet::new(),
            today,
        }
    }

    pub fn current(&self) -> FormStep {
        self.current
    }

    pub fn draft(&self) -> &ApplicationDraft {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut ApplicationDraft {
        &mut self.draft
    }

    pub fn completed_steps(&self) -> impl Iterator<Item = FormStep> + '_ {
        self.completed.iter().copied()
    }

    /// Validate the active step and move to the next one.
    ///
    /// On failure the wizard stays where it is and the step's field errors are returned.
    pub fn advance(&mut self) -> Result<FormStep, ValidationErrors> {
        validate_step(self.current, &self.draft, self.today)?;

        if let Some(next) = self.current.next() {
            self.completed.insert(self.current);
            self.current = next;
        }
        Ok(self.current)
    }

    pub fn back(&mut self) -> FormStep {
        if let Some(previous) = self.current.previous() {
            self.current = previous;
        }
        self.current
    }

    /// Jump to the current step or any step that has already been completed.
    pub fn go_to(&mut self, step: FormStep) -> Result<FormStep, WizardError> {
        let reachable = step == self.current
            || self.completed.contains(&step)
            || step
                .previous()
                .is_some_and(|previous| self.completed.contains(&previous));
        if !reachable {
            return Err(WizardError::StepLocked {
                requested: step.label(),
                current: self.current.label(),
            });
        }
        self.current = step;
        Ok(step)
    }

    pub fn progress_percent(&self) -> u8 {
        let total = FormStep::ALL.len() - 1;
        let done = self
            .completed
            .iter()
            .filter(|step| **step != FormStep::Review)
            .count();
        ((done * 100) / total) as u8
    }

    /// True when the review page is active and the whole draft still validates.
    pub fn is_ready_for_review(&self) -> bool {
        self.current == FormStep::Review
            && validate_step(FormStep::Review, &self.draft, self.today).is_ok()
    }
}
