pub mod categories;
pub mod classifications;
pub mod feed;
pub mod interests;

pub use classifications::ClassificationHandlerState;
pub use feed::FeedHandlerState;

use actix_web::{web, HttpResponse};

use crate::error::AppError;

pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "service": "feed-service",
    }))
}

/// Map malformed query strings and JSON bodies to the service's JSON errors
pub fn extractor_configs(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| AppError::Validation(err.to_string()).into()),
    )
    .app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| AppError::Validation(err.to_string()).into()),
    );
}

/// Routes under `/api/v1`
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health))
        .route("/feed", web::get().to(feed::get_feed))
        .route(
            "/categories/{name}/posts",
            web::get().to(categories::get_category_posts),
        )
        .route("/interests", web::get().to(interests::list_interests))
        .route(
            "/internal/classifications",
            web::post().to(classifications::record_classification),
        );
}
