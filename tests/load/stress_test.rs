//! Load Testing Suite
//!
//! - Many concurrent prediction requests against one shared engine
//! - Mixed predict/insight traffic through the full router
//!
//! Key Performance Requirements:
//! - Inference is lock-free, so concurrent callers see identical results
//! - The router handles 50+ concurrent clients without errors

use std::time::{Duration, Instant};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use eco_sentinel::api;
use eco_sentinel::domain::Observation;
use tokio::task::JoinSet;
use tower::ServiceExt;

use crate::common;

/// Test: concurrent predictions return identical numbers
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore] // Ignore by default as this is a slow test
async fn test_concurrent_predictions_are_consistent() {
    let engine = common::offline_engine();
    let observation = Observation {
        temperature: Some(27.0),
        humidity: Some(40.0),
        day_of_year: Some(200),
        hour_of_day: Some(15),
        is_weekend: Some(false),
        ..Default::default()
    };
    let expected = engine.predict(&observation).unwrap();

    let mut tasks = JoinSet::new();
    for _ in 0..50 {
        let engine = engine.clone();
        let observation = observation.clone();
        tasks.spawn_blocking(move || {
            (0..20)
                .map(|_| engine.predict(&observation).unwrap())
                .collect::<Vec<_>>()
        });
    }

    while let Some(result) = tasks.join_next().await {
        for prediction in result.expect("task should complete") {
            assert_eq!(prediction, expected);
        }
    }
}

/// Test: mixed endpoint traffic under load
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore] // Ignore by default as this is a slow test
async fn test_router_under_mixed_load() {
    let app = api::router(common::app_state(common::offline_engine()));
    let started = Instant::now();

    let mut tasks = JoinSet::new();
    for i in 0..50 {
        let app = app.clone();
        tasks.spawn(async move {
            for j in 0..10 {
                let (uri, body) = if (i + j) % 2 == 0 {
                    ("/predict", format!(r#"{{"temperature": {}}}"#, i % 30))
                } else {
                    ("/insights", format!(r#"{{"air_quality": {}}}"#, 50 + i * 3))
                };
                let response = app
                    .clone()
                    .oneshot(
                        Request::post(uri)
                            .header("content-type", "application/json")
                            .body(Body::from(body))
                            .unwrap(),
                    )
                    .await
                    .unwrap();
                assert_eq!(response.status(), StatusCode::OK);
            }
        });
    }

    while let Some(result) = tasks.join_next().await {
        result.expect("client should complete");
    }

    let elapsed = started.elapsed();
    println!("500 requests in {elapsed:?}");
    assert!(elapsed < Duration::from_secs(60));
}
