//! Application intake for a student-recruitment agency.
//!
//! The crate hosts the multi-step application form rules, the submission pipeline that
//! screens uploaded documents with a generative model, and the configuration and
//! telemetry plumbing shared with the HTTP service.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
