use actix_session::Session;
use actix_web::{web, HttpResponse};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::NaiveDate;
use futures::future::try_join_all;
use serde::Deserialize;

use crate::auth::session::{get_context, SessionContext};
use crate::errors::AppError;
use crate::models::application::WorkflowHistory;
use crate::models::workflow::{AttachmentSource, ReportPayload, TransitionRequest};
use crate::portal::Portal;
use crate::remote::FileUpload;

/// File picked in the action dialog, base64-encoded.
#[derive(Debug, Deserialize)]
pub struct AttachmentBody {
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: String,
}

impl AttachmentBody {
    fn decode(self) -> Result<FileUpload, AppError> {
        let bytes = STANDARD.decode(self.data.trim())?;
        Ok(FileUpload {
            file_name: self.file_name,
            content_type: self.content_type,
            bytes,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct TransitionBody {
    pub verification_status_id: i64,
    #[serde(default)]
    pub remark: String,
    /// `1` forwards, `0` rejects.
    #[serde(default = "default_status")]
    pub status: u8,
    pub date: Option<NaiveDate>,
    pub attachment: Option<AttachmentBody>,
    /// Filename from an earlier upload, sent when retrying a failed submit.
    pub uploaded_attachment: Option<String>,
    pub report: Option<ReportPayload>,
}

fn default_status() -> u8 {
    1
}

impl TransitionBody {
    pub fn into_request(self) -> Result<TransitionRequest, AppError> {
        let mut request = match (self.status, &self.report) {
            (0, Some(_)) => {
                return Err(AppError::BadRequest(
                    "A report cannot be submitted as a rejection".to_string(),
                ));
            }
            (0, None) => TransitionRequest::reject(self.verification_status_id, self.remark),
            (1, Some(report)) => {
                TransitionRequest::report(self.verification_status_id, report, &self.remark)?
            }
            (1, None) => TransitionRequest::forward(self.verification_status_id, self.remark),
            (other, _) => {
                return Err(AppError::BadRequest(format!("Unknown status flag {other}")));
            }
        };

        request.attachment = match (self.attachment, self.uploaded_attachment) {
            (Some(file), _) => Some(AttachmentSource::File(file.decode()?)),
            (None, Some(name)) if !name.trim().is_empty() => {
                Some(AttachmentSource::Uploaded(name.trim().to_string()))
            }
            _ => None,
        };
        if let Some(date) = self.date {
            request = request.with_date(date);
        }
        Ok(request)
    }
}

#[derive(Debug, Deserialize)]
pub struct BatchBody {
    pub application_ids: Vec<i64>,
    #[serde(flatten)]
    pub transition: TransitionBody,
}

#[derive(Debug, Deserialize)]
pub struct ReverifyBody {
    pub remark: String,
}

/// Fails with `PermissionDenied` unless the session's role may act at the
/// application's current stage.
async fn authorize(portal: &Portal, ctx: &SessionContext, application_id: i64) -> Result<(), AppError> {
    let application = portal
        .backend
        .fetch_application(&ctx.access_token, application_id, None)
        .await?;
    if application.may_act(ctx.role) {
        return Ok(());
    }
    log::warn!(
        "Role {} refused on application {} at workflow {:?}",
        ctx.role.code(),
        application_id,
        application.current_workflow_sequence_id
    );
    Err(AppError::PermissionDenied(format!("act on application {application_id}")))
}

/// Every id must pass before anything is submitted.
async fn authorize_all(portal: &Portal, ctx: &SessionContext, ids: &[i64]) -> Result<(), AppError> {
    try_join_all(ids.iter().map(|&id| authorize(portal, ctx, id))).await?;
    Ok(())
}

fn check_ids(ids: &[i64]) -> Result<(), AppError> {
    if ids.is_empty() {
        return Err(AppError::BadRequest("application_ids must not be empty".to_string()));
    }
    Ok(())
}

/// POST /api/v1/applications/{id}/transition
pub async fn submit(
    session: Session,
    portal: web::Data<Portal>,
    path: web::Path<i64>,
    body: web::Json<TransitionBody>,
) -> Result<HttpResponse, AppError> {
    let ctx = get_context(&session)?;
    let application_id = path.into_inner();
    let request = body.into_inner().into_request()?;
    request.validate()?;
    authorize(&portal, &ctx, application_id).await?;

    let outcome = portal
        .executor
        .submit_transition(&ctx, application_id, &request)
        .await?;
    Ok(HttpResponse::Ok().json(outcome))
}

/// POST /api/v1/applications/batch - One submission per id, partial
/// success reported per application.
pub async fn batch(
    session: Session,
    portal: web::Data<Portal>,
    body: web::Json<BatchBody>,
) -> Result<HttpResponse, AppError> {
    let ctx = get_context(&session)?;
    let body = body.into_inner();
    check_ids(&body.application_ids)?;
    let request = body.transition.into_request()?;
    request.validate()?;
    authorize_all(&portal, &ctx, &body.application_ids).await?;

    let report = portal
        .executor
        .submit_batch(&ctx, &body.application_ids, &request)
        .await?;
    Ok(HttpResponse::Ok().json(report))
}

/// POST /api/v1/applications/multi - All ids in one array payload.
pub async fn multi(
    session: Session,
    portal: web::Data<Portal>,
    body: web::Json<BatchBody>,
) -> Result<HttpResponse, AppError> {
    let ctx = get_context(&session)?;
    let body = body.into_inner();
    check_ids(&body.application_ids)?;
    let request = body.transition.into_request()?;
    request.validate()?;
    authorize_all(&portal, &ctx, &body.application_ids).await?;

    let outcome = portal
        .executor
        .submit_multi_transition(&ctx, &body.application_ids, &request)
        .await?;
    Ok(HttpResponse::Ok().json(outcome))
}

/// POST /api/v1/applications/{id}/reverify - Return the application to
/// whoever sent it to the current holder.
pub async fn reverify(
    session: Session,
    portal: web::Data<Portal>,
    path: web::Path<i64>,
    body: web::Json<ReverifyBody>,
) -> Result<HttpResponse, AppError> {
    let ctx = get_context(&session)?;
    let application_id = path.into_inner();
    authorize(&portal, &ctx, application_id).await?;

    let items = portal
        .backend
        .fetch_history(&ctx.access_token, application_id)
        .await?;
    let history = WorkflowHistory::new(items);
    let current = history
        .current()
        .ok_or_else(|| AppError::BadRequest("Application has no workflow history".to_string()))?;

    let outcome = portal
        .executor
        .request_reverification(&ctx, application_id, current, &body.remark)
        .await?;
    Ok(HttpResponse::Ok().json(outcome))
}
