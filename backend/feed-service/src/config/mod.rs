/// Configuration management for Feed Service
///
/// Loads configuration from environment variables (and `.env` when present).
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::services::scoring::ScoringWeights;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application settings
    pub app: AppConfig,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Feed ranking configuration
    pub feed: FeedConfig,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (dev, staging, prod)
    pub env: String,
    /// Server host to bind to
    pub host: String,
    /// Server port to bind to
    pub port: u16,
    /// `json` switches the log formatter to JSON lines
    pub log_format: String,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database URL
    pub url: String,
    /// Max connections in pool
    pub max_connections: u32,
}

/// Feed ranking configuration (weights, saturation constants, filter files)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    pub relevance_weight: f64,
    pub popularity_weight: f64,
    pub recency_weight: f64,
    pub engagement_weight: f64,
    pub self_penalty_weight: f64,
    pub k_relevance: f64,
    pub k_comments: f64,
    pub k_likes: f64,
    /// JSON array of blocked category names
    pub blocked_categories_path: Option<String>,
    /// JSON array of known category names
    pub categories_path: Option<String>,
    /// Minimum classification score for the category feed
    pub category_min_score: f64,
    /// Shared secret for internal write endpoints; unset disables the check
    #[serde(skip_serializing)]
    pub internal_api_key: Option<String>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        let weights = ScoringWeights::default();
        Self {
            relevance_weight: weights.relevance,
            popularity_weight: weights.popularity,
            recency_weight: weights.recency,
            engagement_weight: weights.engagement,
            self_penalty_weight: weights.self_penalty,
            k_relevance: weights.k_relevance,
            k_comments: weights.k_comments,
            k_likes: weights.k_likes,
            blocked_categories_path: None,
            categories_path: None,
            category_min_score: 0.5,
            internal_api_key: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let app = AppConfig {
            env: std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
            host: std::env::var("FEED_SERVICE_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parse_env_or_default("FEED_SERVICE_PORT", 8084u16)?,
            log_format: std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string()),
        };

        let database = DatabaseConfig {
            url: std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            max_connections: parse_env_or_default("DATABASE_MAX_CONNECTIONS", 20u32)?,
        };

        let defaults = FeedConfig::default();
        let feed = FeedConfig {
            relevance_weight: parse_env_or_default(
                "FEED_RELEVANCE_WEIGHT",
                defaults.relevance_weight,
            )?,
            popularity_weight: parse_env_or_default(
                "FEED_POPULARITY_WEIGHT",
                defaults.popularity_weight,
            )?,
            recency_weight: parse_env_or_default("FEED_RECENCY_WEIGHT", defaults.recency_weight)?,
            engagement_weight: parse_env_or_default(
                "FEED_ENGAGEMENT_WEIGHT",
                defaults.engagement_weight,
            )?,
            self_penalty_weight: parse_env_or_default(
                "FEED_SELF_PENALTY_WEIGHT",
                defaults.self_penalty_weight,
            )?,
            k_relevance: parse_env_or_default("FEED_K_RELEVANCE", defaults.k_relevance)?,
            k_comments: parse_env_or_default("FEED_K_COMMENTS", defaults.k_comments)?,
            k_likes: parse_env_or_default("FEED_K_LIKES", defaults.k_likes)?,
            blocked_categories_path: non_empty_env("BLOCKED_CATEGORIES_PATH"),
            categories_path: non_empty_env("CATEGORIES_PATH"),
            category_min_score: parse_env_or_default(
                "CATEGORY_MIN_SCORE",
                defaults.category_min_score,
            )?,
            internal_api_key: non_empty_env("INTERNAL_API_KEY"),
        };

        for (name, value) in [
            ("FEED_RELEVANCE_WEIGHT", feed.relevance_weight),
            ("FEED_POPULARITY_WEIGHT", feed.popularity_weight),
            ("FEED_RECENCY_WEIGHT", feed.recency_weight),
            ("FEED_ENGAGEMENT_WEIGHT", feed.engagement_weight),
            ("FEED_SELF_PENALTY_WEIGHT", feed.self_penalty_weight),
        ] {
            if !value.is_finite() {
                anyhow::bail!("{} must be a finite number, got {}", name, value);
            }
        }

        for (name, value) in [
            ("FEED_K_RELEVANCE", feed.k_relevance),
            ("FEED_K_COMMENTS", feed.k_comments),
            ("FEED_K_LIKES", feed.k_likes),
        ] {
            if !value.is_finite() || value < 0.0 {
                anyhow::bail!("{} must be a finite non-negative number, got {}", name, value);
            }
        }

        Ok(Config {
            app,
            database,
            feed,
        })
    }
}

impl From<&FeedConfig> for ScoringWeights {
    fn from(cfg: &FeedConfig) -> Self {
        Self {
            relevance: cfg.relevance_weight,
            popularity: cfg.popularity_weight,
            recency: cfg.recency_weight,
            engagement: cfg.engagement_weight,
            self_penalty: cfg.self_penalty_weight,
            k_relevance: cfg.k_relevance,
            k_comments: cfg.k_comments,
            k_likes: cfg.k_likes,
        }
    }
}

fn parse_env_or_default<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(val) => val
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("Failed to parse {}='{}': {}", key, val, e)),
        Err(_) => Ok(default),
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
