//! Feed Service
//!
//! Personalized feed ranking: visibility filtering, interest-weighted
//! relevance scoring, a recency mode, category blocklisting and
//! pagination over a consistent read snapshot.

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod services;

pub use config::Config;
pub use error::{AppError, Result};

use std::sync::Arc;

use crate::config::FeedConfig;
use crate::db::FeedStore;
use crate::handlers::{ClassificationHandlerState, FeedHandlerState};
use crate::middleware::InternalApiKey;
use crate::services::{
    CategoryBlocklist, CategoryCatalog, ClassificationService, FeedService, ScoringWeights,
};

/// Shared handler state for one running service
pub struct AppServices {
    pub feed: FeedHandlerState,
    pub classification: ClassificationHandlerState,
    pub internal_api_key: InternalApiKey,
}

impl AppServices {
    pub fn new(
        store: Arc<dyn FeedStore>,
        blocklist: CategoryBlocklist,
        catalog: CategoryCatalog,
        feed_config: &FeedConfig,
    ) -> Self {
        let feed = FeedService::new(
            store.clone(),
            Arc::new(blocklist),
            Arc::new(catalog),
            ScoringWeights::from(feed_config),
            feed_config.category_min_score,
        );

        Self {
            feed: FeedHandlerState {
                feed: Arc::new(feed),
            },
            classification: ClassificationHandlerState {
                classification: Arc::new(ClassificationService::new(store)),
            },
            internal_api_key: InternalApiKey(feed_config.internal_api_key.clone()),
        }
    }
}
