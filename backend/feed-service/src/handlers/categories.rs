use actix_web::{web, HttpResponse};
use serde::Deserialize;
use validator::Validate;

use crate::error::Result;
use crate::handlers::feed::FeedHandlerState;
use crate::middleware::UserId;
use crate::services::pagination::{PageRequest, DEFAULT_PAGE, DEFAULT_PER_PAGE};

#[derive(Debug, Deserialize, Validate)]
pub struct CategoryQueryParams {
    #[serde(default = "default_page")]
    #[validate(range(min = 1))]
    pub page: i64,
    #[serde(default = "default_per_page")]
    #[validate(range(min = 1, max = 100))]
    pub per_page: i64,
}

fn default_page() -> i64 {
    DEFAULT_PAGE
}

fn default_per_page() -> i64 {
    DEFAULT_PER_PAGE
}

/// GET /api/v1/categories/{name}/posts
pub async fn get_category_posts(
    user: UserId,
    path: web::Path<String>,
    query: web::Query<CategoryQueryParams>,
    state: web::Data<FeedHandlerState>,
) -> Result<HttpResponse> {
    query.validate()?;
    let request = PageRequest::new(query.page, query.per_page)?;
    let category = path.into_inner();

    let page = state
        .feed
        .get_category_feed(user.0, &category, request)
        .await?;
    Ok(HttpResponse::Ok().json(page.into_response()))
}
