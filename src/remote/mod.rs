//! Client-side contract toward the land-use REST backend.
//!
//! The engine only talks to the backend through [`PortalBackend`]; the
//! reqwest implementation lives in [`http`].

pub mod http;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::models::application::{Application, WorkflowItem};

pub use http::HttpBackend;

/// Message shown when the backend gave nothing usable to display.
pub const UNEXPECTED_ERROR: &str = "unexpected error";

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BackendError {
    /// 2xx response with `success: false`, or an upload without a filename.
    #[error("{0}")]
    Rejected(String),
    #[error("backend returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("malformed backend response: {0}")]
    Malformed(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("backend request timed out")]
    Timeout,
}

impl BackendError {
    /// Text fit for the officer: the backend's own message when it sent one.
    pub fn user_message(&self) -> String {
        match self {
            BackendError::Rejected(message) | BackendError::Status { message, .. } => {
                message.clone()
            }
            BackendError::Malformed(_) => UNEXPECTED_ERROR.to_string(),
            BackendError::Transport(message) => message.clone(),
            BackendError::Timeout => "the backend did not respond in time".to_string(),
        }
    }
}

/// A file picked by the officer, not yet uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Body of the transition endpoint. `T` is `i64` for a single application
/// and `Vec<i64>` for the multi-target endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionPayload<T> {
    pub application_details_id: T,
    pub verification_status_id: i64,
    pub remark: String,
    pub attachment: String,
    pub status: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

pub type SingleTransition = TransitionPayload<i64>;
pub type MultiTransition = TransitionPayload<Vec<i64>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReverificationPayload {
    pub application_details_id: i64,
    pub workflow_sequence_id: i64,
    pub to_user_id: i64,
    pub remark: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendReply {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

/// Every call carries the officer's access token explicitly; the backend
/// client holds no session of its own.
#[async_trait]
pub trait PortalBackend: Send + Sync {
    /// `None` lists applications across all stages.
    async fn list_applications(
        &self,
        token: &str,
        workflow_sequence_id: Option<i64>,
    ) -> Result<Vec<Application>, BackendError>;

    async fn fetch_application(
        &self,
        token: &str,
        application_id: i64,
        workflow_sequence_id: Option<i64>,
    ) -> Result<Application, BackendError>;

    async fn fetch_history(
        &self,
        token: &str,
        application_id: i64,
    ) -> Result<Vec<WorkflowItem>, BackendError>;

    /// Returns the server-assigned filename.
    async fn upload_attachment(
        &self,
        token: &str,
        field_name: &str,
        file: &FileUpload,
    ) -> Result<String, BackendError>;

    async fn submit_transition(
        &self,
        token: &str,
        payload: &SingleTransition,
    ) -> Result<BackendReply, BackendError>;

    async fn submit_multi_transition(
        &self,
        token: &str,
        payload: &MultiTransition,
    ) -> Result<BackendReply, BackendError>;

    async fn request_reverification(
        &self,
        token: &str,
        payload: &ReverificationPayload,
    ) -> Result<BackendReply, BackendError>;
}
