use actix_session::Session;
use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::auth::session::get_context;
use crate::errors::AppError;
use crate::models::application::{Application, HistoryEntry, WorkflowHistory};
use crate::models::workflow::{build_action_context, ActionContext};
use crate::portal::Portal;

#[derive(Debug, Deserialize)]
pub struct ApplicationQuery {
    pub workflow_sequence_id: Option<i64>,
    #[serde(rename = "actionContext", alias = "action_context")]
    pub action_context: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ApplicationResponse {
    pub application: Application,
    pub action: ActionContext,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub application_id: i64,
    pub items: Vec<HistoryEntry>,
}

/// GET /api/v1/applications/{id} - Application plus the action the
/// session's role may take on it.
pub async fn read(
    session: Session,
    portal: web::Data<Portal>,
    path: web::Path<i64>,
    query: web::Query<ApplicationQuery>,
) -> Result<HttpResponse, AppError> {
    let ctx = get_context(&session)?;
    let application_id = path.into_inner();

    let application = portal
        .backend
        .fetch_application(&ctx.access_token, application_id, query.workflow_sequence_id)
        .await?;
    let action = build_action_context(&application, query.action_context.as_deref(), ctx.role);

    Ok(HttpResponse::Ok().json(ApplicationResponse {
        application,
        action,
    }))
}

/// GET /api/v1/applications/{id}/history - Workflow history, oldest first.
pub async fn history(
    session: Session,
    portal: web::Data<Portal>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let ctx = get_context(&session)?;
    let application_id = path.into_inner();

    let items = portal
        .backend
        .fetch_history(&ctx.access_token, application_id)
        .await?;
    let history = WorkflowHistory::new(items);

    Ok(HttpResponse::Ok().json(HistoryResponse {
        application_id,
        items: history.entries(Utc::now()),
    }))
}
