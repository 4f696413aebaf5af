//! Operation orchestration error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum OpsError {
    #[error("no links to download")]
    NoLinks,

    #[error("worker for {task} panicked: {message}")]
    WorkerPanicked { task: String, message: String },

    #[error("reporter task failed: {message}")]
    ReporterFailed { message: String },

    #[error("invalid operation: {operation}")]
    InvalidOperation { operation: String },

    #[error("missing component: {component}")]
    MissingComponent { component: String },

    #[error("serialization error: {message}")]
    SerializationError { message: String },
}

impl UserFacingError for OpsError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::NoLinks => Some("Configure at least one link to measure."),
            _ => None,
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        Some(match self {
            Self::NoLinks => "ops.no_links",
            Self::WorkerPanicked { .. } => "ops.worker_panicked",
            Self::ReporterFailed { .. } => "ops.reporter_failed",
            Self::InvalidOperation { .. } => "ops.invalid_operation",
            Self::MissingComponent { .. } => "ops.missing_component",
            Self::SerializationError { .. } => "ops.serialization_error",
        })
    }
}
