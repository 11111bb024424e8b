use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use log::{debug, info, warn};
use serde::Serialize;

use super::error::{Phase, TransitionError};
use super::types::{AttachmentSource, TransitionRequest};
use crate::auth::session::SessionContext;
use crate::remote::{BackendError, BackendReply, PortalBackend, UNEXPECTED_ERROR};

/// Upper bounds for each half of the protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub upload: Duration,
    pub submit: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Timeouts {
            upload: Duration::from_secs(60),
            submit: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransitionOutcome {
    pub application_ids: Vec<i64>,
    pub status: u8,
    /// Server filename of the attachment, if one was sent.
    pub attachment: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchFailure {
    pub application_id: i64,
    pub message: String,
}

/// Per-application result of a legacy batch. Succeeded transitions stay
/// applied whatever happened to the others.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchReport {
    pub succeeded: usize,
    pub failed: usize,
    pub attachment: Option<String>,
    pub failures: Vec<BatchFailure>,
}

/// Runs the upload-then-submit protocol shared by every action dialog.
///
/// The attachment is stored first; submission only starts once the upload
/// returned a filename. Resubmitting an identical request appends another
/// history entry on the backend, nothing here deduplicates.
#[derive(Clone)]
pub struct TransitionExecutor {
    pub(super) backend: Arc<dyn PortalBackend>,
    timeouts: Timeouts,
}

impl TransitionExecutor {
    pub fn new(backend: Arc<dyn PortalBackend>, timeouts: Timeouts) -> Self {
        TransitionExecutor { backend, timeouts }
    }

    pub fn timeouts(&self) -> Timeouts {
        self.timeouts
    }

    /// Phase one. Returns the server filename to reference, if any.
    async fn upload_phase(
        &self,
        session: &SessionContext,
        request: &TransitionRequest,
    ) -> Result<Option<String>, TransitionError> {
        let file = match &request.attachment {
            None => return Ok(None),
            Some(AttachmentSource::Uploaded(name)) => return Ok(Some(name.clone())),
            Some(AttachmentSource::File(file)) => file,
        };

        let field = request.kind.upload_field();
        debug!("Uploading attachment '{}' under {}", file.file_name, field);
        let upload = self
            .backend
            .upload_attachment(&session.access_token, field, file);

        match tokio::time::timeout(self.timeouts.upload, upload).await {
            Err(_) => {
                warn!("Attachment upload timed out after {:?}", self.timeouts.upload);
                Err(TransitionError::Timeout {
                    phase: Phase::Upload,
                    attachment: None,
                })
            }
            Ok(Err(e)) => {
                warn!("Attachment upload failed: {e}");
                Err(TransitionError::from_upload(e))
            }
            Ok(Ok(name)) if name.trim().is_empty() => Err(TransitionError::UploadFailure(
                "upload returned no filename".to_string(),
            )),
            Ok(Ok(name)) => Ok(Some(name)),
        }
    }

    /// Phase two, bounded by the submit timeout. A `success: false` reply is
    /// a submission failure carrying the backend's message.
    pub(super) async fn submit_phase<F>(
        &self,
        attachment: Option<&str>,
        call: F,
    ) -> Result<BackendReply, TransitionError>
    where
        F: Future<Output = Result<BackendReply, BackendError>>,
    {
        match tokio::time::timeout(self.timeouts.submit, call).await {
            Err(_) => Err(TransitionError::Timeout {
                phase: Phase::Submission,
                attachment: attachment.map(String::from),
            }),
            Ok(Err(e)) => Err(TransitionError::from_submission(e, attachment)),
            Ok(Ok(reply)) if !reply.success => Err(TransitionError::SubmissionFailure {
                message: reply
                    .message
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| UNEXPECTED_ERROR.to_string()),
                attachment: attachment.map(String::from),
            }),
            Ok(Ok(reply)) => Ok(reply),
        }
    }

    pub async fn submit_transition(
        &self,
        session: &SessionContext,
        application_id: i64,
        request: &TransitionRequest,
    ) -> Result<TransitionOutcome, TransitionError> {
        request.validate()?;
        let attachment = self.upload_phase(session, request).await?;

        let payload = request.to_payload(application_id, attachment.as_deref());
        let reply = self
            .submit_phase(
                attachment.as_deref(),
                self.backend.submit_transition(&session.access_token, &payload),
            )
            .await?;

        info!(
            "Application {} transitioned by {} (status_id={}, flag={})",
            application_id,
            session.role.code(),
            payload.verification_status_id,
            payload.status
        );
        Ok(TransitionOutcome {
            application_ids: vec![application_id],
            status: payload.status,
            attachment,
            message: reply.message,
        })
    }

    /// One request against the array-payload endpoint.
    ///
    /// # Panics
    ///
    /// If `application_ids` is empty.
    pub async fn submit_multi_transition(
        &self,
        session: &SessionContext,
        application_ids: &[i64],
        request: &TransitionRequest,
    ) -> Result<TransitionOutcome, TransitionError> {
        assert!(
            !application_ids.is_empty(),
            "submit_multi_transition called without application ids"
        );
        request.validate()?;
        let attachment = self.upload_phase(session, request).await?;

        let payload = request.to_payload(application_ids.to_vec(), attachment.as_deref());
        let reply = self
            .submit_phase(
                attachment.as_deref(),
                self.backend
                    .submit_multi_transition(&session.access_token, &payload),
            )
            .await?;

        info!(
            "{} applications transitioned together by {}",
            application_ids.len(),
            session.role.code()
        );
        Ok(TransitionOutcome {
            application_ids: application_ids.to_vec(),
            status: payload.status,
            attachment,
            message: reply.message,
        })
    }

    /// Legacy batch path: the attachment is uploaded once, then one
    /// independent single-application submission per id is dispatched
    /// concurrently. Failures are counted, never rolled back.
    ///
    /// # Panics
    ///
    /// If `application_ids` is empty.
    pub async fn submit_batch(
        &self,
        session: &SessionContext,
        application_ids: &[i64],
        request: &TransitionRequest,
    ) -> Result<BatchReport, TransitionError> {
        assert!(
            !application_ids.is_empty(),
            "submit_batch called without application ids"
        );
        request.validate()?;
        let attachment = self.upload_phase(session, request).await?;
        let attachment_ref = attachment.as_deref();

        let calls = application_ids.iter().map(move |&application_id| {
            let payload = request.to_payload(application_id, attachment_ref);
            async move {
                let result = self
                    .submit_phase(
                        attachment_ref,
                        self.backend.submit_transition(&session.access_token, &payload),
                    )
                    .await;
                (application_id, result)
            }
        });

        let mut report = BatchReport {
            succeeded: 0,
            failed: 0,
            attachment: attachment.clone(),
            failures: Vec::new(),
        };
        for (application_id, result) in join_all(calls).await {
            match result {
                Ok(_) => report.succeeded += 1,
                Err(e) => {
                    warn!("Batch transition failed for application {application_id}: {e}");
                    report.failed += 1;
                    report.failures.push(BatchFailure {
                        application_id,
                        message: e.to_string(),
                    });
                }
            }
        }

        info!(
            "Batch transition by {}: {} succeeded, {} failed",
            session.role.code(),
            report.succeeded,
            report.failed
        );
        Ok(report)
    }
}
