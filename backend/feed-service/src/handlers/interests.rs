use actix_web::{web, HttpResponse};

use crate::error::Result;
use crate::handlers::feed::FeedHandlerState;
use crate::middleware::UserId;
use crate::models::{InterestView, InterestsResponse};

/// GET /api/v1/interests
pub async fn list_interests(
    user: UserId,
    state: web::Data<FeedHandlerState>,
) -> Result<HttpResponse> {
    let interests = state.feed.list_interests(user.0).await?;

    Ok(HttpResponse::Ok().json(InterestsResponse {
        user_id: user.0,
        interests: interests.into_iter().map(InterestView::from).collect(),
    }))
}
