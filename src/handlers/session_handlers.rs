use actix_session::Session;
use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::auth::session::{store_context, Permissions, SessionContext};
use crate::errors::AppError;
use crate::models::nav_item::{compute_allowed_routes, landing_route};
use crate::models::role::Role;
use crate::portal::Portal;

/// Access token issued by the upstream OTP login, with the officer's role
/// and granted access keys.
#[derive(Debug, Deserialize)]
pub struct SessionHandoff {
    pub access_token: String,
    pub role: Role,
    #[serde(default)]
    pub access: Vec<String>,
}

/// POST /api/v1/session
pub async fn start(
    session: Session,
    portal: web::Data<Portal>,
    body: web::Json<SessionHandoff>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    if body.access_token.trim().is_empty() {
        return Err(AppError::BadRequest("access_token is required".to_string()));
    }

    let ctx = SessionContext::new(
        body.role,
        body.access_token.trim(),
        Permissions::from_keys(body.access),
    );
    session.renew();
    store_context(&session, &ctx)?;

    let routes = compute_allowed_routes(&portal.menu, &ctx);
    let landing = landing_route(&routes).to_string();
    log::info!("Session started for role {} ({} routes)", ctx.role.code(), routes.len());

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "role": ctx.role,
        "landing": landing,
        "routes": routes,
    })))
}

/// POST /api/v1/session/logout
pub async fn logout(session: Session) -> HttpResponse {
    session.purge();
    HttpResponse::Ok().json(serde_json::json!({ "ok": true }))
}
