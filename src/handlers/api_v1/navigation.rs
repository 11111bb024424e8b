use actix_session::Session;
use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::auth::session::get_context;
use crate::errors::AppError;
use crate::models::nav_item::{
    compute_allowed_routes, landing_route, resolve_redirect, DASHBOARD_ROUTE,
};
use crate::portal::Portal;

#[derive(Debug, Deserialize)]
pub struct NavigationQuery {
    pub path: Option<String>,
    #[serde(rename = "type")]
    pub case_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct NavigationResponse {
    pub routes: Vec<String>,
    pub landing: String,
    pub redirect: Option<String>,
}

/// GET /api/v1/navigation - Allowed routes for the session and the redirect
/// for the active path. Recomputed on every call.
/// Query params: path (default /dashboard), type (conversion|diversion).
pub async fn resolve(
    session: Session,
    portal: web::Data<Portal>,
    query: web::Query<NavigationQuery>,
) -> Result<HttpResponse, AppError> {
    let ctx = get_context(&session)?;
    let routes = compute_allowed_routes(&portal.menu, &ctx);
    let path = query.path.as_deref().unwrap_or(DASHBOARD_ROUTE);
    let redirect = resolve_redirect(path, query.case_type.as_deref(), &routes);

    Ok(HttpResponse::Ok().json(NavigationResponse {
        landing: landing_route(&routes).to_string(),
        redirect,
        routes,
    }))
}
