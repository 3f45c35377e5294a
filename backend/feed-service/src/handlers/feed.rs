use actix_web::{web, HttpResponse};
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;
use validator::Validate;

use crate::error::Result;
use crate::middleware::UserId;
use crate::services::feed::{FeedService, SortMode};
use crate::services::pagination::{PageRequest, DEFAULT_PAGE, DEFAULT_PER_PAGE};

#[derive(Debug, Deserialize, Validate)]
pub struct FeedQueryParams {
    #[serde(default = "default_page")]
    #[validate(range(min = 1))]
    pub page: i64,
    #[serde(default = "default_per_page")]
    #[validate(range(min = 1, max = 100))]
    pub per_page: i64,
    #[serde(default = "default_sort_by")]
    pub sort_by: String,
}

fn default_page() -> i64 {
    DEFAULT_PAGE
}

fn default_per_page() -> i64 {
    DEFAULT_PER_PAGE
}

fn default_sort_by() -> String {
    SortMode::Relevance.as_str().to_string()
}

impl FeedQueryParams {
    pub(crate) fn page_request(&self) -> Result<PageRequest> {
        self.validate()?;
        PageRequest::new(self.page, self.per_page)
    }
}

pub struct FeedHandlerState {
    pub feed: Arc<FeedService>,
}

/// GET /api/v1/feed
pub async fn get_feed(
    user: UserId,
    query: web::Query<FeedQueryParams>,
    state: web::Data<FeedHandlerState>,
) -> Result<HttpResponse> {
    let sort: SortMode = query.sort_by.parse()?;
    let request = query.page_request()?;

    debug!(
        user_id = %user.0,
        sort_by = %sort,
        page = request.page(),
        per_page = request.per_page(),
        "Feed request"
    );

    let page = state.feed.get_feed(user.0, request, sort).await?;
    Ok(HttpResponse::Ok().json(page.into_response()))
}
