use std::fmt;

use serde::Serialize;

use crate::remote::BackendError;

/// Which half of the upload-then-submit protocol failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Upload,
    Submission,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Upload => write!(f, "attachment upload"),
            Phase::Submission => write!(f, "transition submission"),
        }
    }
}

/// Expected failure modes of a transition. Failures that happen after the
/// attachment was stored carry its server filename so a retry can reuse it.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransitionError {
    #[error("{0}")]
    Validation(String),
    #[error("attachment upload failed: {0}")]
    UploadFailure(String),
    #[error("{message}")]
    SubmissionFailure {
        message: String,
        attachment: Option<String>,
    },
    #[error("the current workflow entry has no sender to return the application to")]
    MissingOriginator,
    #[error("network error: {message}")]
    Network {
        message: String,
        attachment: Option<String>,
    },
    #[error("{phase} timed out")]
    Timeout {
        phase: Phase,
        attachment: Option<String>,
    },
}

impl TransitionError {
    pub fn validation(message: impl Into<String>) -> Self {
        TransitionError::Validation(message.into())
    }

    /// Maps a backend failure during the upload phase.
    pub fn from_upload(err: BackendError) -> Self {
        match err {
            BackendError::Transport(message) => TransitionError::Network {
                message,
                attachment: None,
            },
            BackendError::Timeout => TransitionError::Timeout {
                phase: Phase::Upload,
                attachment: None,
            },
            other => TransitionError::UploadFailure(other.user_message()),
        }
    }

    /// Maps a backend failure during the submission phase.
    pub fn from_submission(err: BackendError, attachment: Option<&str>) -> Self {
        let attachment = attachment.map(String::from);
        match err {
            BackendError::Transport(message) => TransitionError::Network { message, attachment },
            BackendError::Timeout => TransitionError::Timeout {
                phase: Phase::Submission,
                attachment,
            },
            other => TransitionError::SubmissionFailure {
                message: other.user_message(),
                attachment,
            },
        }
    }

    /// Server filename of an attachment that was stored before the failure.
    pub fn attachment(&self) -> Option<&str> {
        match self {
            TransitionError::SubmissionFailure { attachment, .. }
            | TransitionError::Network { attachment, .. }
            | TransitionError::Timeout { attachment, .. } => attachment.as_deref(),
            _ => None,
        }
    }

    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            TransitionError::Validation(_) | TransitionError::MissingOriginator
        )
    }

    pub fn code(&self) -> &'static str {
        match self {
            TransitionError::Validation(_) => "validation_error",
            TransitionError::UploadFailure(_) => "upload_failure",
            TransitionError::SubmissionFailure { .. } => "submission_failure",
            TransitionError::MissingOriginator => "missing_originator",
            TransitionError::Network { .. } => "network_error",
            TransitionError::Timeout { .. } => "timeout",
        }
    }
}
