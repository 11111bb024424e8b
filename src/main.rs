use std::sync::Arc;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::{App, HttpResponse, HttpServer, cookie::Key, middleware, web};

use clu_portal::config::PortalConfig;
use clu_portal::handlers::api_v1;
use clu_portal::portal::Portal;
use clu_portal::remote::HttpBackend;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let config = PortalConfig::from_env();

    // The executor bounds each phase; the client only needs to outlive both.
    let client_timeout = config.upload_timeout.max(config.submit_timeout);
    let backend = HttpBackend::new(&config.backend_url, client_timeout).map_err(|e| {
        log::error!("Cannot build backend client: {e}");
        std::io::Error::other(e.to_string())
    })?;
    log::info!("Proxying workflow calls to {}", backend.base_url());

    let portal = web::Data::new(Portal::new(Arc::new(backend), config.timeouts()));

    // Session encryption key: SESSION_KEY keeps sessions valid across restarts
    let secret_key = match config.session_key.as_deref() {
        Some(val) if val.len() >= 64 => {
            log::info!("Using SESSION_KEY from environment");
            Key::from(val.as_bytes())
        }
        Some(val) => {
            log::warn!("SESSION_KEY too short ({} bytes, need 64+), generating random key", val.len());
            Key::generate()
        }
        None => {
            log::warn!("No SESSION_KEY set, generating random key (sessions lost on restart)");
            Key::generate()
        }
    };

    log::info!("Starting server at http://{}", config.bind_addr);

    HttpServer::new(move || {
        let session_mw = SessionMiddleware::builder(
            CookieSessionStore::default(),
            secret_key.clone(),
        )
        .cookie_secure(false)
        .cookie_http_only(true)
        .build();

        App::new()
            .wrap(session_mw)
            .wrap(middleware::Logger::default())
            .app_data(portal.clone())
            .app_data(api_v1::json_config())
            .route("/health", web::get().to(|| async {
                HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
            }))
            .service(web::scope("/api/v1").configure(api_v1::configure))
            .default_service(web::to(|| async {
                HttpResponse::NotFound().json(serde_json::json!({ "error": "Not found" }))
            }))
    })
    .bind(config.bind_addr.as_str())?
    .run()
    .await
}
