//! Shared test infrastructure: an in-memory backend that records every call.
//!
//! # Fake backend
//! - `FakeBackend::new()` - every call succeeds
//! - `fail_upload` / `fail_submission_for` / `reject_submission_for` - scripted failures
//! - `calls()` - everything the gateway sent, in order
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use clu_portal::auth::session::{Permissions, SessionContext};
use clu_portal::models::application::{Application, StatusRef, WorkflowItem};
use clu_portal::models::role::Role;
use clu_portal::models::workflow::{Timeouts, TransitionExecutor};
use clu_portal::remote::{
    BackendError, BackendReply, FileUpload, MultiTransition, PortalBackend,
    ReverificationPayload, SingleTransition,
};

// ============================================================================
// TEST CONSTANTS
// ============================================================================

pub const TOKEN: &str = "test-access-token";
pub const UPLOADED_NAME: &str = "srv_0001.pdf";

// ============================================================================
// RECORDED CALLS
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    List(Option<i64>),
    Fetch(i64),
    History(i64),
    Upload { field: String, file_name: String },
    Submit(SingleTransition),
    SubmitMulti(MultiTransition),
    Reverify(ReverificationPayload),
}

#[derive(Default)]
struct Script {
    fail_upload: Option<BackendError>,
    upload_delay: Option<Duration>,
    submit_delay: Option<Duration>,
    /// Application ids whose submission errors at transport level.
    failing_ids: HashSet<i64>,
    /// Application ids whose submission answers `success: false`.
    rejected_ids: HashMap<i64, Option<String>>,
    applications: HashMap<i64, Application>,
    histories: HashMap<i64, Vec<WorkflowItem>>,
}

#[derive(Clone, Default)]
pub struct FakeBackend {
    calls: Arc<Mutex<Vec<Call>>>,
    script: Arc<Mutex<Script>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_upload(self, err: BackendError) -> Self {
        self.script.lock().unwrap().fail_upload = Some(err);
        self
    }

    pub fn fail_submission_for(self, ids: &[i64]) -> Self {
        self.script.lock().unwrap().failing_ids.extend(ids.iter().copied());
        self
    }

    pub fn reject_submission_for(self, id: i64, message: Option<&str>) -> Self {
        self.script
            .lock()
            .unwrap()
            .rejected_ids
            .insert(id, message.map(String::from));
        self
    }

    pub fn with_upload_delay(self, delay: Duration) -> Self {
        self.script.lock().unwrap().upload_delay = Some(delay);
        self
    }

    pub fn with_submit_delay(self, delay: Duration) -> Self {
        self.script.lock().unwrap().submit_delay = Some(delay);
        self
    }

    pub fn with_application(self, app: Application) -> Self {
        self.script.lock().unwrap().applications.insert(app.id, app);
        self
    }

    pub fn with_history(self, application_id: i64, items: Vec<WorkflowItem>) -> Self {
        self.script
            .lock()
            .unwrap()
            .histories
            .insert(application_id, items);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn submissions(&self) -> Vec<SingleTransition> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Submit(p) => Some(p),
                _ => None,
            })
            .collect()
    }

    pub fn uploads(&self) -> Vec<(String, String)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Upload { field, file_name } => Some((field, file_name)),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn reply_for(&self, id: i64) -> Result<BackendReply, BackendError> {
        let script = self.script.lock().unwrap();
        if script.failing_ids.contains(&id) {
            return Err(BackendError::Transport(format!("connection reset for {id}")));
        }
        if let Some(message) = script.rejected_ids.get(&id) {
            return Ok(BackendReply {
                success: false,
                message: message.clone(),
            });
        }
        Ok(BackendReply {
            success: true,
            message: Some("Forwarded successfully".to_string()),
        })
    }

    fn submit_delay(&self) -> Option<Duration> {
        self.script.lock().unwrap().submit_delay
    }
}

#[async_trait]
impl PortalBackend for FakeBackend {
    async fn list_applications(
        &self,
        _token: &str,
        workflow_sequence_id: Option<i64>,
    ) -> Result<Vec<Application>, BackendError> {
        self.record(Call::List(workflow_sequence_id));
        let script = self.script.lock().unwrap();
        let mut apps: Vec<Application> = script
            .applications
            .values()
            .filter(|a| {
                workflow_sequence_id.is_none()
                    || a.current_workflow_sequence_id == workflow_sequence_id
            })
            .cloned()
            .collect();
        apps.sort_by_key(|a| a.id);
        Ok(apps)
    }

    async fn fetch_application(
        &self,
        _token: &str,
        application_id: i64,
        _workflow_sequence_id: Option<i64>,
    ) -> Result<Application, BackendError> {
        self.record(Call::Fetch(application_id));
        self.script
            .lock()
            .unwrap()
            .applications
            .get(&application_id)
            .cloned()
            .ok_or(BackendError::Status {
                status: 404,
                message: "Application not found".to_string(),
            })
    }

    async fn fetch_history(
        &self,
        _token: &str,
        application_id: i64,
    ) -> Result<Vec<WorkflowItem>, BackendError> {
        self.record(Call::History(application_id));
        Ok(self
            .script
            .lock()
            .unwrap()
            .histories
            .get(&application_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn upload_attachment(
        &self,
        _token: &str,
        field_name: &str,
        file: &FileUpload,
    ) -> Result<String, BackendError> {
        self.record(Call::Upload {
            field: field_name.to_string(),
            file_name: file.file_name.clone(),
        });
        let (delay, failure) = {
            let script = self.script.lock().unwrap();
            (script.upload_delay, script.fail_upload.clone())
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        match failure {
            Some(err) => Err(err),
            None => Ok(UPLOADED_NAME.to_string()),
        }
    }

    async fn submit_transition(
        &self,
        _token: &str,
        payload: &SingleTransition,
    ) -> Result<BackendReply, BackendError> {
        self.record(Call::Submit(payload.clone()));
        if let Some(delay) = self.submit_delay() {
            tokio::time::sleep(delay).await;
        }
        self.reply_for(payload.application_details_id)
    }

    async fn submit_multi_transition(
        &self,
        _token: &str,
        payload: &MultiTransition,
    ) -> Result<BackendReply, BackendError> {
        self.record(Call::SubmitMulti(payload.clone()));
        for id in &payload.application_details_id {
            self.reply_for(*id)?;
        }
        Ok(BackendReply {
            success: true,
            message: Some(format!(
                "{} applications forwarded",
                payload.application_details_id.len()
            )),
        })
    }

    async fn request_reverification(
        &self,
        _token: &str,
        payload: &ReverificationPayload,
    ) -> Result<BackendReply, BackendError> {
        self.record(Call::Reverify(payload.clone()));
        self.reply_for(payload.application_details_id)
    }
}

// ============================================================================
// BUILDERS
// ============================================================================

pub fn session(role: Role) -> SessionContext {
    SessionContext::new(role, TOKEN, Permissions::default())
}

pub fn executor(backend: &FakeBackend) -> TransitionExecutor {
    TransitionExecutor::new(Arc::new(backend.clone()), Timeouts::default())
}

pub fn executor_with(backend: &FakeBackend, timeouts: Timeouts) -> TransitionExecutor {
    TransitionExecutor::new(Arc::new(backend.clone()), timeouts)
}

pub fn file(name: &str) -> FileUpload {
    FileUpload {
        file_name: name.to_string(),
        content_type: Some("application/pdf".to_string()),
        bytes: b"%PDF-1.4 test".to_vec(),
    }
}

pub fn application(id: i64, workflow_sequence_id: i64) -> Application {
    Application {
        id,
        application_no: format!("CLU/{id:04}"),
        applicant_name: Some("Test Applicant".to_string()),
        case_type: None,
        current_workflow_sequence_id: Some(workflow_sequence_id),
        form_type: None,
        survey_type: None,
        can_edit: false,
        can_forward: true,
        button_name: None,
    }
}

pub fn history_item(
    workflow_sequence_id: i64,
    from: Option<(i64, &str)>,
    to: (i64, &str),
    created_at: &str,
) -> WorkflowItem {
    WorkflowItem {
        workflow_sequence_id,
        from_user: from.map(|(_, name)| name.to_string()),
        from_user_id: from.map(|(id, _)| id),
        to_user: Some(to.1.to_string()),
        to_user_id: Some(to.0),
        status: Some(StatusRef {
            id: 6,
            name: "Forwarded".to_string(),
        }),
        remark: None,
        attachment: None,
        kml_file: None,
        created_at: Some(created_at.to_string()),
        days_held: None,
        highlight: false,
        is_reverification: None,
    }
}
