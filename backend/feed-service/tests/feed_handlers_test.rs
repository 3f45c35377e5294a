//! HTTP surface tests using `actix_web::test` and the in-memory store.

mod common;

use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

use common::{InMemoryFeedStore, NewPost};
use feed_service::config::FeedConfig;
use feed_service::handlers;
use feed_service::metrics::serve_metrics;
use feed_service::middleware::{INTERNAL_API_KEY_HEADER, USER_ID_HEADER};
use feed_service::services::{CategoryBlocklist, CategoryCatalog};
use feed_service::AppServices;

fn services(store: &InMemoryFeedStore, internal_key: Option<&str>) -> AppServices {
    let config = FeedConfig {
        internal_api_key: internal_key.map(String::from),
        ..FeedConfig::default()
    };
    AppServices::new(
        Arc::new(store.clone()),
        CategoryBlocklist::new(["Gore"]),
        CategoryCatalog::default(),
        &config,
    )
}

macro_rules! init_app {
    ($services:expr) => {{
        let services = $services;
        test::init_service(
            App::new()
                .app_data(web::Data::new(services.feed))
                .app_data(web::Data::new(services.classification))
                .app_data(web::Data::new(services.internal_api_key))
                .configure(handlers::extractor_configs)
                .route("/metrics", web::get().to(serve_metrics))
                .service(web::scope("/api/v1").configure(handlers::configure)),
        )
        .await
    }};
}

fn get_as(uri: &str, user: Uuid) -> test::TestRequest {
    test::TestRequest::get()
        .uri(uri)
        .insert_header((USER_ID_HEADER, user.to_string()))
}

#[actix_rt::test]
async fn test_feed_returns_paginated_posts() {
    let store = InMemoryFeedStore::new();
    let viewer = store.add_user("viewer");
    let author = store.add_user("author");
    let newest = store.add_public_post_aged(author, 1.0);
    store.add_public_post_aged(author, 2.0);
    store.add_public_post_aged(author, 3.0);
    let app = init_app!(services(&store, None));

    let req = get_as("/api/v1/feed?page=1&per_page=2&sort_by=recency", viewer).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["page"], 1);
    assert_eq!(body["per_page"], 2);
    assert_eq!(body["total_items"], 3);
    assert_eq!(body["total_pages"], 2);
    assert_eq!(body["message"], "Showing most recent posts.");

    let posts = body["posts"].as_array().unwrap();
    assert_eq!(posts.len(), 2);
    assert_eq!(posts[0]["id"], newest.to_string());
    assert_eq!(posts[0]["privacy"], "PUBLIC");
    assert_eq!(posts[0]["author"]["username"], "author");
    assert!(posts[0]["timestamp"].as_str().unwrap().ends_with('Z'));
    assert!(!posts[0]["content"].as_str().unwrap().starts_with(' '));
}

#[actix_rt::test]
async fn test_feed_defaults_to_relevance() {
    let store = InMemoryFeedStore::new();
    let viewer = store.add_user("viewer");
    store.set_interest(viewer, "Tech", 3.0);
    let app = init_app!(services(&store, None));

    let resp = test::call_service(&app, get_as("/api/v1/feed", viewer).to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["page"], 1);
    assert_eq!(body["per_page"], 10);
    assert_eq!(body["total_pages"], 1);
    assert!(body["message"]
        .as_str()
        .unwrap()
        .starts_with("Showing personalized feed"));
}

#[actix_rt::test]
async fn test_invalid_query_parameters_are_rejected() {
    let store = InMemoryFeedStore::new();
    let viewer = store.add_user("viewer");
    let app = init_app!(services(&store, None));

    for uri in [
        "/api/v1/feed?sort_by=popular",
        "/api/v1/feed?page=0",
        "/api/v1/feed?per_page=0",
        "/api/v1/feed?per_page=101",
        "/api/v1/feed?page=abc",
    ] {
        let resp = test::call_service(&app, get_as(uri, viewer).to_request()).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "uri {}", uri);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["status"], 400);
    }
    assert_eq!(store.snapshots_opened(), 0);
}

#[actix_rt::test]
async fn test_missing_user_header_is_unauthorized() {
    let store = InMemoryFeedStore::new();
    let app = init_app!(services(&store, None));

    let req = test::TestRequest::get().uri("/api/v1/feed").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::get()
        .uri("/api/v1/feed")
        .insert_header((USER_ID_HEADER, "42"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_rt::test]
async fn test_category_endpoint() {
    let store = InMemoryFeedStore::new();
    let viewer = store.add_user("viewer");
    let author = store.add_user("author");
    store.add_post(
        NewPost::public(author, common::fixed_now()).scores(&[("Technology", 0.8)]),
    );
    let app = init_app!(services(&store, None));

    let resp = test::call_service(
        &app,
        get_as("/api/v1/categories/Technology/posts", viewer).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["category_name"], "Technology");
    assert_eq!(body["total_items"], 1);

    for name in ["Gore", "Astrology"] {
        let uri = format!("/api/v1/categories/{}/posts", name);
        let resp = test::call_service(&app, get_as(&uri, viewer).to_request()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "category {}", name);
    }
}

#[actix_rt::test]
async fn test_classification_updates_interests() {
    let store = InMemoryFeedStore::new();
    let author = store.add_user("author");
    let post = store.add_public_post_aged(author, 1.0);
    let app = init_app!(services(&store, Some("internal-secret")));

    let payload = json!({
        "post_id": post,
        "author_id": author,
        "text_classification": {"Food": 0.6, "Travel": 0.2},
        "image_classification": {"Food": 0.8},
    });

    let unauthenticated = test::TestRequest::post()
        .uri("/api/v1/internal/classifications")
        .set_json(&payload)
        .to_request();
    let resp = test::call_service(&app, unauthenticated).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::post()
        .uri("/api/v1/internal/classifications")
        .insert_header((INTERNAL_API_KEY_HEADER, "internal-secret"))
        .set_json(&payload)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let body: Value = test::read_body_json(resp).await;
    assert!((body["classification_scores"]["Food"].as_f64().unwrap() - 0.7).abs() < 1e-9);
    assert!((body["interest_increments"]["Food"].as_f64().unwrap() - 1.4).abs() < 1e-9);

    let resp = test::call_service(&app, get_as("/api/v1/interests", author).to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    let interests = body["interests"].as_array().unwrap();
    assert_eq!(interests[0]["category"], "Food");
    assert_eq!(interests[1]["category"], "Travel");
}

#[actix_rt::test]
async fn test_classification_rejects_invalid_scores() {
    let store = InMemoryFeedStore::new();
    let author = store.add_user("author");
    let post = store.add_public_post_aged(author, 1.0);
    let app = init_app!(services(&store, None));

    for payload in [
        json!({"post_id": post, "author_id": author, "text_classification": {"Food": 1.2}}),
        json!({"post_id": post, "author_id": author}),
        json!({"post_id": "nope", "author_id": author}),
    ] {
        let req = test::TestRequest::post()
            .uri("/api/v1/internal/classifications")
            .set_json(&payload)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "payload {}", payload);
    }
    assert_eq!(store.interest(author, "Food"), None);
}

#[actix_rt::test]
async fn test_health_and_metrics() {
    let store = InMemoryFeedStore::new();
    let app = init_app!(services(&store, None));

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/api/v1/health").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/metrics").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
}
