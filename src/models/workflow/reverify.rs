use log::info;
use serde::Serialize;

use super::error::TransitionError;
use super::executor::TransitionExecutor;
use crate::auth::session::SessionContext;
use crate::models::application::{Direction, WorkflowItem};
use crate::remote::ReverificationPayload;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReverificationOutcome {
    pub application_id: i64,
    pub to_user_id: i64,
    pub to_user: Option<String>,
    pub direction: Direction,
    pub message: Option<String>,
}

impl TransitionExecutor {
    /// Sends the application back to whoever forwarded it to the current
    /// holder. Fails with `MissingOriginator` before any network call when
    /// the current entry has no sender on record.
    pub async fn request_reverification(
        &self,
        session: &SessionContext,
        application_id: i64,
        current: &WorkflowItem,
        remark: &str,
    ) -> Result<ReverificationOutcome, TransitionError> {
        let to_user_id = current
            .from_user_id
            .ok_or(TransitionError::MissingOriginator)?;
        if remark.trim().is_empty() {
            return Err(TransitionError::validation(
                "a remark is required to request reverification",
            ));
        }

        let payload = ReverificationPayload {
            application_details_id: application_id,
            workflow_sequence_id: current.workflow_sequence_id,
            to_user_id,
            remark: remark.trim().to_string(),
        };
        let reply = self
            .submit_phase(
                None,
                self.backend
                    .request_reverification(&session.access_token, &payload),
            )
            .await?;

        info!(
            "Application {} sent back to user {} by {}",
            application_id,
            to_user_id,
            session.role.code()
        );
        Ok(ReverificationOutcome {
            application_id,
            to_user_id,
            to_user: current.from_user.clone(),
            direction: Direction::Backward,
            message: reply.message,
        })
    }
}
