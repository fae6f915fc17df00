mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use eco_sentinel::api;
use eco_sentinel::config::LlmConfig;
use eco_sentinel::insights::NarrativeGenerator;
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn offline_app() -> Router {
    api::router(common::app_state(common::offline_engine()))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

async fn send_text(app: &Router, request: Request<Body>) -> (StatusCode, String) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn health_reports_service_and_models() {
    let app = offline_app();
    let (status, body) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "EcoSentinel AI Service");
    assert_eq!(body["version"], "2.1.0");
    assert_eq!(body["models_loaded"], 4);

    let (status, _) = send(&app, get("/health/live")).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, get("/health/ready")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn predict_returns_predictions_and_model_info() {
    let app = offline_app();
    let (status, body) = send(
        &app,
        post_json("/predict", r#"{"temperature": 25.0, "humidity": 50.0}"#),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let predictions = &body["predictions"];
    assert!(predictions["air_quality"]["value"].is_number());
    assert!(predictions["air_quality"]["category"].is_string());
    assert!(predictions["temperature"]["confidence"].is_number());
    assert!(predictions["risk_assessment"]["level"].is_string());
    assert_eq!(predictions["anomaly_detection"]["threshold"], -0.1);
    assert!(body["model_info"]["accuracies"]["air_quality"].is_number());
    assert!(body["model_info"]["feature_importance"]["risk_predictor"]["temperature"].is_number());
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn empty_payloads_are_rejected() {
    let app = offline_app();
    for (uri, body) in [("/predict", ""), ("/predict", "{}"), ("/insights", "null")] {
        let (status, json) = send(&app, post_json(uri, body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri} {body:?}");
        assert_eq!(json["error"], "BadRequest");
        assert!(json["message"]
            .as_str()
            .unwrap()
            .contains("No input data provided"));
    }
}

#[tokio::test]
async fn out_of_range_observation_is_a_validation_error() {
    let app = offline_app();
    let (status, json) = send(&app, post_json("/predict", r#"{"humidity": 150}"#)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "ValidationError");
}

#[tokio::test]
async fn insights_fall_back_without_api_key_and_are_cached() {
    let state = common::app_state(common::offline_engine());
    let metrics = state.metrics.clone();
    let app = api::router(state);
    let payload = r#"{"air_quality": 120, "temperature": 32}"#;

    let (status, first) = send(&app, post_json("/insights", payload)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["model_used"], "rule-based fallback");
    assert_eq!(first["confidence"], 0.70);
    assert_eq!(first["data_quality"], "moderate");
    let text = first["ai_generated_insights"].as_str().unwrap();
    assert!(text.contains("Air quality is concerning with AQI of 120"));
    assert!(text.contains("High temperature conditions detected"));

    let (status, second) = send(&app, post_json("/insights", payload)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first, second);

    use eco_sentinel::api::metrics::Outcome;
    assert_eq!(metrics.request_count("insights", Outcome::Success), 1);
    assert_eq!(metrics.request_count("insights", Outcome::CacheHit), 1);
}

#[tokio::test]
async fn forecast_insight_fills_readings_from_predictions() {
    let app = offline_app();
    let (status, body) = send(
        &app,
        post_json("/insights?forecast=true", r#"{"location": "Porto", "temperature": 1.0}"#),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["ai_generated_insights"]
        .as_str()
        .unwrap()
        .contains("Cold weather conditions present"));
}

#[tokio::test]
async fn insights_use_language_model_when_available() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"content": "Air is clean and mild."}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let narrator = NarrativeGenerator::from_config(&LlmConfig {
        endpoint: format!("{}/v1/chat/completions", server.uri()),
        api_key: Some("sk-test".to_string()),
        ..Default::default()
    });
    let app = api::router(common::app_state(common::engine_with(narrator)));

    let (status, body) = send(
        &app,
        post_json(
            "/insights",
            r#"{"air_quality": 30, "temperature": 20, "humidity": 40,
                "wind_speed": 3, "location": "Oslo", "uv_index": 2}"#,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["model_used"], "LLM");
    assert_eq!(body["confidence"], 0.85);
    assert_eq!(body["data_quality"], "high");
    assert_eq!(body["ai_generated_insights"], "Air is clean and mild.");
}

#[tokio::test]
async fn language_model_outage_falls_back() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let narrator = NarrativeGenerator::from_config(&LlmConfig {
        endpoint: format!("{}/v1/chat/completions", server.uri()),
        api_key: Some("sk-test".to_string()),
        ..Default::default()
    });
    let app = api::router(common::app_state(common::engine_with(narrator)));

    let (status, body) = send(&app, post_json("/insights", r#"{"temperature": 2}"#)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["model_used"], "rule-based fallback");
}

#[tokio::test]
async fn model_info_lists_every_model() {
    let app = offline_app();
    let (status, body) = send(&app, get("/model-info")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["models"],
        json!(["air_quality", "temperature", "risk_predictor", "anomaly_detector"])
    );
    assert_eq!(body["training_samples"], common::TEST_SAMPLES);
    assert!(body["last_trained"].is_string());
    assert!(body["accuracies"]["temperature"].is_number());
}

#[tokio::test]
async fn metrics_expose_request_counters() {
    let app = offline_app();
    send(&app, post_json("/predict", r#"{"temperature": 10}"#)).await;
    send(&app, post_json("/predict", "")).await;

    let (status, text) = send_text(&app, get("/metrics")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(text.contains(r#"ai_requests_total{endpoint="predict",status="success"} 1"#));
    assert!(text.contains(r#"ai_requests_total{endpoint="predict",status="error"} 1"#));
    assert!(text.contains("ai_request_duration_seconds_count 2"));
    assert!(text.contains("ai_prediction_accuracy_count 3"));
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let app = offline_app();
    let (status, body) = send(&app, get("/nope")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NotFound");
}
