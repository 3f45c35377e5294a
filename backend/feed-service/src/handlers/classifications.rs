use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::Result;
use crate::middleware::InternalCaller;
use crate::services::classification::ClassificationService;

/// Classifier output for one post, as sent by the content pipeline
#[derive(Debug, Deserialize)]
pub struct RecordClassificationRequest {
    pub post_id: Uuid,
    pub author_id: Uuid,
    #[serde(default)]
    pub text_classification: Option<HashMap<String, f64>>,
    #[serde(default)]
    pub image_classification: Option<HashMap<String, f64>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RecordClassificationResponse {
    pub post_id: Uuid,
    pub classification_scores: BTreeMap<String, f64>,
    pub interest_increments: BTreeMap<String, f64>,
}

pub struct ClassificationHandlerState {
    pub classification: Arc<ClassificationService>,
}

/// POST /api/v1/internal/classifications
pub async fn record_classification(
    _caller: InternalCaller,
    body: web::Json<RecordClassificationRequest>,
    state: web::Data<ClassificationHandlerState>,
) -> Result<HttpResponse> {
    let body = body.into_inner();
    let record = state
        .classification
        .record(
            body.post_id,
            body.author_id,
            body.text_classification.as_ref(),
            body.image_classification.as_ref(),
        )
        .await?;

    Ok(HttpResponse::Created().json(RecordClassificationResponse {
        post_id: record.post_id,
        classification_scores: record.post_scores,
        interest_increments: record.interest_increments,
    }))
}
