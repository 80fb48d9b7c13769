//! Handler tests for the prediction service, driven in-process through
//! `tower::ServiceExt::oneshot`.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use ndarray::Array2;
use serde_json::{json, Value};
use tower::ServiceExt;

use cancelml::models::{GbdtClassifier, GbdtParams};
use cancelml_cli::server::{create_router, AppState};

/// Model over the 10 request fields where a long lead time means a likely
/// cancellation.
fn trained_model() -> GbdtClassifier {
    let n = 40;
    let mut data = Vec::new();
    let mut labels = Vec::new();
    for i in 0..n {
        let canceled = i % 2 == 0;
        // Odd moduli keep the filler features uncorrelated with the label.
        data.push(if canceled { 250.0 + i as f64 } else { 5.0 + i as f64 }); // lead_time
        data.push((i % 3) as f64); // no_of_special_request
        data.push(80.0 + (i % 7) as f64); // avg_price_per_room
        data.push((i % 11 + 1) as f64); // arrival_month
        data.push((i % 27 + 1) as f64); // arrival_date
        data.push((i % 5) as f64); // market_segment_type
        data.push((i % 3) as f64); // no_of_week_nights
        data.push((i % 5) as f64); // no_of_weekend_nights
        data.push((i % 3) as f64); // type_of_meal_plan
        data.push((i % 7) as f64); // room_type_reserved
        labels.push(i64::from(!canceled));
    }
    let x = Array2::from_shape_vec((n, 10), data).unwrap();
    let mut model = GbdtClassifier::new(GbdtParams {
        iterations: 20,
        max_depth: 3,
        ..GbdtParams::default()
    });
    model.fit(&x, &labels).unwrap();
    model
}

fn valid_payload() -> Value {
    json!({
        "lead_time": 10,
        "no_of_special_request": 1,
        "avg_price_per_room": 85.5,
        "arrival_month": 7,
        "arrival_date": 14,
        "market_segment_type": 2,
        "no_of_week_nights": 3,
        "no_of_weekend_nights": 1,
        "type_of_meal_plan": 0,
        "room_type_reserved": 1
    })
}

async fn post_predict(state: AppState, payload: &Value) -> (StatusCode, Value) {
    let app = create_router(state);
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/predict")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    (status, body)
}

fn state_with_model() -> AppState {
    AppState::new(Some(trained_model()), "does-not-exist".into())
}

// ---------------------------------------------------------------------------
// POST /api/predict
// ---------------------------------------------------------------------------

#[tokio::test]
async fn valid_payload_returns_a_binary_prediction() {
    let (status, body) = post_predict(state_with_model(), &valid_payload()).await;
    assert_eq!(status, StatusCode::OK);
    let prediction = body["prediction"].as_i64().unwrap();
    assert!(prediction == 0 || prediction == 1);
}

#[tokio::test]
async fn short_lead_time_predicts_an_honored_booking() {
    let mut payload = valid_payload();
    payload["lead_time"] = json!(5);
    let (status, body) = post_predict(state_with_model(), &payload).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["prediction"], json!(1));

    payload["lead_time"] = json!(300);
    let (_, body) = post_predict(state_with_model(), &payload).await;
    assert_eq!(body["prediction"], json!(0));
}

#[tokio::test]
async fn missing_field_names_the_field() {
    let mut payload = valid_payload();
    payload.as_object_mut().unwrap().remove("arrival_month");
    let (status, body) = post_predict(state_with_model(), &payload).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(
        body["error"].as_str().unwrap().contains("arrival_month"),
        "{body}"
    );
}

#[tokio::test]
async fn non_numeric_value_is_a_client_error() {
    let mut payload = valid_payload();
    payload["no_of_week_nights"] = json!("several");
    let (status, body) = post_predict(state_with_model(), &payload).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(
        body["error"].as_str().unwrap().contains("no_of_week_nights"),
        "{body}"
    );
}

#[tokio::test]
async fn numeric_strings_are_coerced() {
    let mut payload = valid_payload();
    payload["lead_time"] = json!("12");
    payload["avg_price_per_room"] = json!("99.5");
    let (status, _) = post_predict(state_with_model(), &payload).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn fractional_numbers_in_integer_fields_truncate() {
    let mut payload = valid_payload();
    payload["arrival_month"] = json!(7.5);
    payload["lead_time"] = json!(5.9);
    let (status, body) = post_predict(state_with_model(), &payload).await;
    assert_eq!(status, StatusCode::OK);
    // 5.9 truncates to 5, a short lead time.
    assert_eq!(body["prediction"], json!(1));
}

#[tokio::test]
async fn missing_model_yields_a_server_error_for_any_payload() {
    let state = AppState::new(None, "does-not-exist".into());
    let (status, body) = post_predict(state.clone(), &valid_payload()).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], json!("Model not loaded"));

    let (status, _) = post_predict(state, &json!({})).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

// ---------------------------------------------------------------------------
// Frontend routes
// ---------------------------------------------------------------------------

#[tokio::test]
async fn root_without_frontend_build_renders_the_form() {
    let app = create_router(AppState::new(None, "does-not-exist".into()));
    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let html = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(html.contains("lead_time"));
    assert!(html.contains("room_type_reserved"));
}

#[tokio::test]
async fn form_post_with_bad_input_redisplays_with_an_error() {
    let app = create_router(state_with_model());
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from("lead_time=abc"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let html = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(html.contains("Invalid value for field: lead_time"), "{html}");
}

#[tokio::test]
async fn static_assets_are_served_when_the_build_exists() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), "<html>spa</html>").unwrap();
    std::fs::write(dir.path().join("app.js"), "console.log(1)").unwrap();

    let state = AppState::new(None, dir.path().to_path_buf());
    let app = create_router(state.clone());

    let response = app
        .oneshot(Request::builder().uri("/app.js").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/javascript"
    );

    // Unknown paths fall back to the SPA entry document.
    let response = create_router(state)
        .oneshot(
            Request::builder()
                .uri("/some/client/route")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"<html>spa</html>");
}
