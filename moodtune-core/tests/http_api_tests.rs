//! Integration tests for moodtune-core HTTP endpoints
//!
//! The router runs in-process through `tower::ServiceExt::oneshot` with fake detector
//! and recommender behind it.

mod helpers;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use helpers::*;
use http_body_util::BodyExt;
use moodtune_common::events::AnalysisPhase;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::Notify;
use tower::util::ServiceExt;

async fn body_json(response: axum::response::Response) -> Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

fn multipart_request(image: &[u8], language: Option<&str>) -> Request<Body> {
    let boundary = "moodtune-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"face.jpg\"\r\nContent-Type: image/jpeg\r\n\r\n",
            b = boundary
        )
        .as_bytes(),
    );
    body.extend_from_slice(image);
    body.extend_from_slice(b"\r\n");
    if let Some(language) = language {
        body.extend_from_slice(
            format!(
                "--{b}\r\nContent-Disposition: form-data; name=\"language\"\r\n\r\n{l}\r\n",
                b = boundary,
                l = language
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(format!("--{}--\r\n", boundary).as_bytes());

    Request::builder()
        .method("POST")
        .uri("/analyze")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let state = test_app_state(
        FakeDetector::emotion("Happy", None),
        FakeRecommender::with_tracks(sample_tracks()),
    );
    let app = moodtune_core::build_router(state);

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["module"], "moodtune-core");
    assert_eq!(json["session_state"], "IDLE");
}

#[tokio::test]
async fn test_mapping_endpoint() {
    let state = test_app_state(
        FakeDetector::emotion("Happy", None),
        FakeRecommender::with_tracks(Vec::new()),
    );
    let app = moodtune_core::build_router(state);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/mapping",
            json!({ "emotion": "Happy", "language": "Telugu" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["seeds"], json!(["telugu", "pop"]));

    let response = app
        .oneshot(json_request(
            "POST",
            "/mapping",
            json!({ "emotion": "Klingon", "language": "Telugu" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "Invalid emotion/language mapping");
    assert_eq!(json["code"], "INVALID_MAPPING");
}

#[tokio::test]
async fn test_recommendations_by_path() {
    let recommender = FakeRecommender::with_tracks(sample_tracks());
    let state = test_app_state(FakeDetector::emotion("Happy", None), recommender.clone());
    let app = moodtune_core::build_router(state);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/recommendations/angry/en?limit=5")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["tracks"].as_array().unwrap().len(), 2);
    assert_eq!(json["tracks"][0]["spotify_url"], "https://open.spotify.com/track/one");
    assert!(json["tracks"][1].get("spotify_url").is_none());

    let calls = recommender.calls();
    assert_eq!(calls[0].seeds, vec!["rock", "metal"]);
    assert_eq!(calls[0].limit, 5);
    assert_eq!(calls[0].market, "US");
}

#[tokio::test]
async fn test_recommendations_rejects_bad_input() {
    let recommender = FakeRecommender::with_tracks(sample_tracks());
    let state = test_app_state(FakeDetector::emotion("Happy", None), recommender.clone());
    let app = moodtune_core::build_router(state);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/recommendations/Happy/xx")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/recommendations/Happy/te?limit=0")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(recommender.call_count(), 0);
}

#[tokio::test]
async fn test_recommendations_upstream_failure_is_bad_gateway() {
    let state = test_app_state(
        FakeDetector::emotion("Happy", None),
        FakeRecommender::new(RecommenderScript::Upstream(503, "service unavailable")),
    );
    let app = moodtune_core::build_router(state.clone());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/recommendations/Sad/hi")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let json = body_json(response).await;
    assert_eq!(json["error"], "service unavailable");
    assert_eq!(json["code"], "UPSTREAM_ERROR");
    assert!(state.last_error.read().await.is_some());
}

#[tokio::test]
async fn test_api_recommend_returns_bare_array() {
    let recommender = FakeRecommender::with_tracks(sample_tracks());
    let state = test_app_state(FakeDetector::emotion("Happy", None), recommender.clone());
    let app = moodtune_core::build_router(state);

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/recommend",
            json!({ "emotion": "Disgust", "language": "Tamil" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert!(json.is_array());
    assert_eq!(recommender.calls()[0].seeds, vec!["tamil", "alt-rock"]);
    assert_eq!(recommender.calls()[0].limit, 10);
}

#[tokio::test]
async fn test_analyze_json_frame_then_session() {
    let state = test_app_state(
        FakeDetector::emotion("Happy", Some(0.875)),
        FakeRecommender::with_tracks(sample_tracks()),
    );
    let orchestrator = state.orchestrator.clone();
    let app = moodtune_core::build_router(state);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/analyze",
            json!({ "image": TEST_FRAME, "language": "te" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["state"], "READY");
    assert_eq!(json["emotion"], "Happy");
    assert_eq!(json["confidence_percent"], "87.5%");
    assert_eq!(json["seeds"], json!(["telugu", "pop"]));
    assert_eq!(json["theme"], "happy");

    let response = app
        .oneshot(Request::builder().uri("/session").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["state"], "READY");
    assert_eq!(json["tracks"].as_array().unwrap().len(), 2);

    orchestrator.shutdown();
}

#[tokio::test]
async fn test_analyze_multipart_upload() {
    let detector = FakeDetector::emotion("Sad", None);
    let state = test_app_state(detector.clone(), FakeRecommender::with_tracks(Vec::new()));
    let app = moodtune_core::build_router(state);

    let response = app
        .oneshot(multipart_request(&[0xFF, 0xD8, 0xFF], Some("English")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["state"], "READY");
    assert_eq!(json["language"], "en");
    assert_eq!(json["seeds"], json!(["blues"]));
    assert_eq!(
        json["advisory"],
        "No songs found for this emotion and language. Try another one!"
    );
    assert_eq!(detector.calls(), 1);
}

#[tokio::test]
async fn test_analyze_without_image_is_bad_request() {
    let detector = FakeDetector::emotion("Happy", None);
    let state = test_app_state(detector.clone(), FakeRecommender::with_tracks(Vec::new()));
    let app = moodtune_core::build_router(state);

    let response = app
        .oneshot(json_request("POST", "/analyze", json!({ "language": "te" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "Please upload an image or start the camera!");
    assert_eq!(detector.calls(), 0);
}

#[tokio::test]
async fn test_analyze_detector_failure_is_bad_gateway() {
    let state = test_app_state(
        FakeDetector::new(DetectorScript::Upstream(400, "No image data")),
        FakeRecommender::with_tracks(Vec::new()),
    );
    let app = moodtune_core::build_router(state);

    let response = app
        .clone()
        .oneshot(json_request("POST", "/analyze", json!({ "image": TEST_FRAME })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let json = body_json(response).await;
    assert_eq!(json["error"], "Error processing your request: No image data");

    let response = app
        .oneshot(Request::builder().uri("/session").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(json["state"], "FAILED");
    assert_eq!(json["error"]["stage"], "detection");
}

#[tokio::test]
async fn test_analyze_while_in_flight_is_conflict() {
    // Given: first analysis parked in the detector
    let gate = Arc::new(Notify::new());
    let detector = FakeDetector::gated(DetectorScript::Emotion("Happy", None), gate.clone());
    let state = test_app_state(detector.clone(), FakeRecommender::with_tracks(Vec::new()));
    let orchestrator = state.orchestrator.clone();
    let app = moodtune_core::build_router(state);

    let first = tokio::spawn(
        app.clone()
            .oneshot(json_request("POST", "/analyze", json!({ "image": TEST_FRAME }))),
    );
    wait_until(|| detector.calls() == 1).await;

    // When: a second request comes in
    let response = app
        .oneshot(json_request("POST", "/analyze", json!({ "image": TEST_FRAME })))
        .await
        .unwrap();

    // Then: 409, and the first still completes
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["code"], "CONFLICT");
    assert_eq!(orchestrator.snapshot().state, AnalysisPhase::Analyzing);

    gate.notify_one();
    let response = first.await.unwrap().unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(orchestrator.snapshot().state, AnalysisPhase::Ready);
}

#[tokio::test]
async fn test_analyze_unknown_language_is_rejected() {
    let detector = FakeDetector::emotion("Happy", None);
    let state = test_app_state(detector.clone(), FakeRecommender::with_tracks(Vec::new()));
    let app = moodtune_core::build_router(state);

    let response = app
        .oneshot(json_request(
            "POST",
            "/analyze",
            json!({ "image": TEST_FRAME, "language": "fr" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(detector.calls(), 0);
}

#[tokio::test]
async fn test_missing_lookup_fields_are_invalid_mapping() {
    let recommender = FakeRecommender::with_tracks(sample_tracks());
    let state = test_app_state(FakeDetector::emotion("Happy", None), recommender.clone());
    let app = moodtune_core::build_router(state);

    let response = app
        .clone()
        .oneshot(json_request("POST", "/api/recommend", json!({ "emotion": "Happy" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "Invalid emotion/language mapping");
    assert_eq!(json["code"], "INVALID_MAPPING");

    let response = app
        .oneshot(json_request("POST", "/mapping", json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "Invalid emotion/language mapping");
    assert_eq!(recommender.call_count(), 0);
}

#[tokio::test]
async fn test_malformed_lookup_requests_answer_json_errors() {
    let recommender = FakeRecommender::with_tracks(sample_tracks());
    let state = test_app_state(FakeDetector::emotion("Happy", None), recommender.clone());
    let app = moodtune_core::build_router(state);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/recommendations/Happy/te?limit=abc")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert!(json["error"].is_string());
    assert_eq!(json["code"], "BAD_REQUEST");

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/mapping")
                .header("content-type", "application/json")
                .body(Body::from("{ not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert!(json["error"].is_string());
    assert_eq!(json["code"], "BAD_REQUEST");
    assert_eq!(recommender.call_count(), 0);
}
