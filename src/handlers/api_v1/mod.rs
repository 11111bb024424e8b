pub mod applications;
pub mod navigation;
pub mod stages;
pub mod transitions;

use actix_web::{
    web, Error, HttpResponse,
    body::MessageBody,
    dev::{ServiceRequest, ServiceResponse},
    middleware::Next,
};

use crate::auth::middleware::require_auth;
use crate::handlers::session_handlers;

/// Attachments travel base64-encoded inside JSON bodies.
const JSON_LIMIT_BYTES: usize = 16 * 1024 * 1024;

/// CSRF protection for REST API mutation endpoints.
///
/// Rejects POST/PUT/DELETE requests that don't have Content-Type: application/json.
/// Browsers cannot send cross-origin JSON with cookies via simple form POST,
/// so the Content-Type check guards against CSRF without tokens.
/// GET requests are exempt (read-only, no state changes).
async fn require_json_content_type(
    req: ServiceRequest,
    next: Next<impl MessageBody + 'static>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    let method = req.method().clone();

    if method == actix_web::http::Method::POST
        || method == actix_web::http::Method::PUT
        || method == actix_web::http::Method::DELETE
    {
        let content_type = req
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");

        if !content_type.starts_with("application/json") {
            let body = serde_json::json!({
                "error": "Content-Type must be application/json for mutation requests"
            });
            let response = HttpResponse::BadRequest().json(body);
            return Ok(req.into_response(response).map_into_right_body());
        }
    }

    next.call(req).await.map(|res| res.map_into_left_body())
}

pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().limit(JSON_LIMIT_BYTES)
}

/// Configure API v1 routes. Mount under `/api/v1`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/session")
            .wrap(actix_web::middleware::from_fn(require_json_content_type))
            .route("", web::post().to(session_handlers::start))
            .route("/logout", web::post().to(session_handlers::logout)),
    );
    // /applications/batch and /multi BEFORE /applications/{id}
    cfg.service(
        web::scope("")
            .wrap(actix_web::middleware::from_fn(require_json_content_type))
            .wrap(actix_web::middleware::from_fn(require_auth))
            .route("/navigation", web::get().to(navigation::resolve))
            .route("/stages/{stage}", web::get().to(stages::lookup))
            .route("/queue/{stage}", web::get().to(stages::queue))
            .route("/applications/batch", web::post().to(transitions::batch))
            .route("/applications/multi", web::post().to(transitions::multi))
            .route("/applications/{id}", web::get().to(applications::read))
            .route("/applications/{id}/history", web::get().to(applications::history))
            .route("/applications/{id}/transition", web::post().to(transitions::submit))
            .route("/applications/{id}/reverify", web::post().to(transitions::reverify)),
    );
}
