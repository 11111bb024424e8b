use actix_session::Session;
use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::auth::session::{get_context, require_permission};
use crate::errors::AppError;
use crate::models::application::Application;
use crate::models::role::Role;
use crate::models::stage::{find_stage, CaseVariant, StageKey, StatusOption};
use crate::portal::Portal;

#[derive(Debug, Deserialize)]
pub struct StageQuery {
    #[serde(rename = "type")]
    pub case_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StageResponse {
    pub stage: StageKey,
    pub label: &'static str,
    pub variant: Option<CaseVariant>,
    /// `null` when the stage has no id for the variant.
    pub workflow_id: Option<i64>,
    pub roles: Vec<Role>,
    pub statuses: Vec<StatusOption>,
}

#[derive(Debug, Serialize)]
pub struct QueueResponse {
    pub stage: StageKey,
    pub workflow_id: Option<i64>,
    pub filtered: bool,
    pub items: Vec<Application>,
}

fn parse_stage(raw: &str, query: &StageQuery) -> Result<(StageKey, Option<CaseVariant>), AppError> {
    let key = StageKey::from_slug(raw).ok_or(AppError::NotFound)?;
    let variant = query.case_type.as_deref().and_then(CaseVariant::from_slug);
    Ok((key, variant))
}

/// GET /api/v1/stages/{stage}?type= - Workflow id and vocabulary of a stage.
pub async fn lookup(
    path: web::Path<String>,
    query: web::Query<StageQuery>,
) -> Result<HttpResponse, AppError> {
    let (key, variant) = parse_stage(&path, &query)?;
    let descriptor = variant.and_then(|v| find_stage(key, v));

    Ok(HttpResponse::Ok().json(StageResponse {
        stage: key,
        label: key.label(),
        variant,
        workflow_id: descriptor.map(|d| d.workflow_id),
        roles: descriptor.map(|d| d.roles.to_vec()).unwrap_or_default(),
        statuses: descriptor.map(|d| d.statuses.to_vec()).unwrap_or_default(),
    }))
}

/// GET /api/v1/queue/{stage}?type= - Applications waiting at a stage.
/// An unresolvable stage/variant lists everything rather than failing.
pub async fn queue(
    session: Session,
    portal: web::Data<Portal>,
    path: web::Path<String>,
    query: web::Query<StageQuery>,
) -> Result<HttpResponse, AppError> {
    let ctx = get_context(&session)?;
    let (key, variant) = parse_stage(&path, &query)?;
    require_permission(&ctx, key.slug())?;

    let workflow_id = variant.and_then(|v| find_stage(key, v)).map(|d| d.workflow_id);
    if workflow_id.is_none() {
        log::debug!("No workflow id for {} / {:?}, listing unfiltered", key.slug(), variant);
    }

    let items = portal
        .backend
        .list_applications(&ctx.access_token, workflow_id)
        .await?;

    Ok(HttpResponse::Ok().json(QueueResponse {
        stage: key,
        workflow_id,
        filtered: workflow_id.is_some(),
        items,
    }))
}
