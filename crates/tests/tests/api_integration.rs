use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use serde_json::json;
use suraksha_api::build_app;
use tower::ServiceExt;

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn health_is_public() {
    let app = build_app().await.expect("app should build");

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn wizard_requires_api_key() {
    let app = build_app().await.expect("app should build");

    let request = Request::builder()
        .method("POST")
        .uri("/v1/wizard")
        .header("content-type", "application/json")
        .body(Body::from(json!({ "text": "4" }).to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn wizard_walks_to_recommendations() {
    let app = build_app().await.expect("app should build");

    let first_request = Request::builder()
        .method("POST")
        .uri("/v1/wizard")
        .header("content-type", "application/json")
        .header("x-api-key", "dev-suraksha-key")
        .body(Body::from(json!({ "text": "we are 4 people" }).to_string()))
        .unwrap();

    let first_response = app.clone().oneshot(first_request).await.unwrap();
    assert_eq!(first_response.status(), StatusCode::OK);
    let first = body_json(first_response).await;
    assert_eq!(first["step"], "awaiting_income");
    let session_id = first["session_id"].as_str().unwrap().to_string();

    let second_request = Request::builder()
        .method("POST")
        .uri("/v1/wizard")
        .header("content-type", "application/json")
        .header("x-api-key", "dev-suraksha-key")
        .body(Body::from(
            json!({ "session_id": session_id, "text": "about 2,000" }).to_string(),
        ))
        .unwrap();

    let second_response = app.oneshot(second_request).await.unwrap();
    assert_eq!(second_response.status(), StatusCode::OK);
    let second = body_json(second_response).await;

    assert_eq!(second["step"], "showing_recommendations");
    let plans = second["recommendations"]["plans"].as_array().unwrap();
    assert_eq!(plans.len(), 2);
    let recommended: Vec<_> = plans
        .iter()
        .filter(|entry| entry["recommended"] == true)
        .collect();
    assert_eq!(recommended.len(), 1);
    assert_eq!(recommended[0]["plan"]["id"], "budget");
}

#[tokio::test]
async fn estimate_matches_documented_breakdown() {
    let app = build_app().await.expect("app should build");

    // Budget Care against the default utilization profile.
    let request = Request::builder()
        .method("POST")
        .uri("/v1/estimate")
        .header("content-type", "application/json")
        .header("x-api-key", "dev-suraksha-key")
        .body(Body::from(json!({ "plan_id": "budget" }).to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let parsed = body_json(response).await;

    let breakdown = &parsed["breakdown"];
    assert_eq!(breakdown["annual_premium"], 18_000.0);
    assert_eq!(breakdown["total_healthcare_cost"], 7_000.0);
    assert_eq!(breakdown["out_of_pocket"], 5_200.0);
    assert_eq!(breakdown["total_annual_cost"], 23_200.0);
    assert_eq!(breakdown["savings"], -16_200.0);
}

#[tokio::test]
async fn estimate_rejects_unknown_plan() {
    let app = build_app().await.expect("app should build");

    let request = Request::builder()
        .method("POST")
        .uri("/v1/estimate")
        .header("content-type", "application/json")
        .header("x-api-key", "dev-suraksha-key")
        .body(Body::from(json!({ "plan_id": "platinum_sky" }).to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let parsed = body_json(response).await;
    assert_eq!(parsed["error"], "unknown_plan");
}

#[tokio::test]
async fn recommendations_honor_income_bands() {
    let app = build_app().await.expect("app should build");

    // Monthly 2_500 gives annual 30_000, the inclusive lower edge of the
    // lower-middle band.
    let request = Request::builder()
        .method("POST")
        .uri("/v1/recommendations")
        .header("content-type", "application/json")
        .header("x-api-key", "dev-suraksha-key")
        .body(Body::from(
            json!({ "family_size": 3, "monthly_income": 2500.0 }).to_string(),
        ))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let parsed = body_json(response).await;

    assert_eq!(parsed["annual_income"], 30_000.0);
    let plans = parsed["plans"].as_array().unwrap();
    let recommended: Vec<_> = plans
        .iter()
        .filter(|entry| entry["recommended"] == true)
        .collect();
    assert_eq!(recommended.len(), 1);
    assert_eq!(recommended[0]["plan"]["id"], "essential");
}

#[tokio::test]
async fn recommendations_reject_invalid_household() {
    let app = build_app().await.expect("app should build");

    let request = Request::builder()
        .method("POST")
        .uri("/v1/recommendations")
        .header("content-type", "application/json")
        .header("x-api-key", "dev-suraksha-key")
        .body(Body::from(
            json!({ "family_size": 0, "monthly_income": 2500.0 }).to_string(),
        ))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn ai_chat_without_gateway_reports_unavailable() {
    // SURAKSHA_GATEWAY_API_KEY is not set in the test environment, so AI
    // mode is disabled end to end.
    let app = build_app().await.expect("app should build");

    let request = Request::builder()
        .method("POST")
        .uri("/v1/ai/chat")
        .header("content-type", "application/json")
        .header("x-api-key", "dev-suraksha-key")
        .body(Body::from(
            json!({ "text": "which plan should I pick?" }).to_string(),
        ))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn plans_lists_the_whole_catalog() {
    let app = build_app().await.expect("app should build");

    let request = Request::builder()
        .uri("/v1/plans")
        .header("x-api-key", "dev-suraksha-key")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let parsed = body_json(response).await;

    assert_eq!(parsed["plans"].as_array().unwrap().len(), 8);
    assert!(parsed["greeting"].as_str().unwrap().contains("family"));
}
