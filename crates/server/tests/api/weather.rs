use crate::helpers::{spawn_app, INDEX_HTML};
use axum::{
    body::{to_bytes, Body},
    http::Request,
};
use collector::{Dataset, DatasetSink, RefreshOutcome, YesterdayRow};
use hyper::{header, Method, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

async fn get(app: &axum::Router, uri: &str) -> (StatusCode, Vec<u8>) {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("Failed to execute request.");
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec())
}

#[tokio::test]
async fn weather_is_empty_before_first_refresh() {
    let test_app = spawn_app();

    let (status, body) = get(&test_app.app, "/weather").await;

    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(
        json,
        serde_json::json!({"today": [], "tomorrow": [], "yesterday": []})
    );
}

#[tokio::test]
async fn weather_returns_refreshed_rows() {
    let test_app = spawn_app();

    let outcome = test_app.loader.refresh().await.unwrap();
    assert_eq!(
        outcome,
        RefreshOutcome::Completed {
            today: 3,
            tomorrow: 3,
            yesterday: 1
        }
    );

    let (status, body) = get(&test_app.app, "/weather").await;
    assert_eq!(status, StatusCode::OK);

    let dataset: Dataset = serde_json::from_slice(&body).unwrap();
    let cities: Vec<&str> = dataset.today.iter().map(|r| r.city.as_str()).collect();
    assert_eq!(cities, vec!["Ankara", "Izmir", "Van"]);
    assert_eq!(dataset.today[0].max_temp, Some(15.0));
    assert_eq!(dataset.tomorrow[0].max_temp, Some(20.0));
    assert_eq!(dataset.today[0].prcp48h, Some(3.0));
    assert_eq!(dataset.today[1].long, "27.2");

    let ankara = &dataset.yesterday[0];
    assert_eq!(ankara.district, "Cankaya");
    assert_eq!(ankara.max_temp, Some(31.2));
    assert_eq!(ankara.min_temp, Some(14.0));
    assert_eq!(ankara.prcp24h, Some(0.2));
}

#[tokio::test]
async fn weather_uses_camel_case_fields() {
    let test_app = spawn_app();
    test_app.loader.refresh().await.unwrap();

    let (_, body) = get(&test_app.app, "/weather").await;
    let json: Value = serde_json::from_slice(&body).unwrap();
    let row = &json["today"][0];

    assert_eq!(row["city"], "Ankara");
    assert_eq!(row["maxTemp"], 15.0);
    assert_eq!(row["maxCape"], 50.0);
    assert!(row.get("prcp72h").is_some());
    assert_eq!(json["yesterday"][0]["prcp24h"], 0.2);
}

#[tokio::test]
async fn weather_serves_partial_dataset_as_is() {
    let test_app = spawn_app();
    // mid-refresh: observations published, forecasts not yet
    let partial = Dataset {
        yesterday: vec![YesterdayRow {
            city: "Rize".to_string(),
            district: "Ardesen".to_string(),
            max_temp: None,
            min_temp: None,
            prcp24h: Some(3.5),
        }],
        ..Dataset::default()
    };
    test_app.state.dataset.replace(partial.clone());

    let (_, body) = get(&test_app.app, "/weather").await;
    let dataset: Dataset = serde_json::from_slice(&body).unwrap();
    assert_eq!(dataset, partial);

    let json: Value = serde_json::from_slice(&body).unwrap();
    let rize = &json["yesterday"][0];
    assert_eq!(rize["prcp24h"], 3.5);
    assert!(rize.get("maxTemp").is_none());
    assert!(rize.get("minTemp").is_none());
}

#[tokio::test]
async fn root_serves_index_page() {
    let test_app = spawn_app();

    let (status, body) = get(&test_app.app, "/").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(String::from_utf8(body).unwrap(), INDEX_HTML);
}

#[tokio::test]
async fn unknown_paths_fall_back_to_static_files() {
    let test_app = spawn_app();

    let (status, body) = get(&test_app.app, "/app.js").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(String::from_utf8(body).unwrap(), "console.log('ok');");

    let (status, _) = get(&test_app.app, "/missing.css").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn cors_allows_any_origin() {
    let test_app = spawn_app();
    let request = Request::builder()
        .method(Method::GET)
        .uri("/weather")
        .header(header::ORIGIN, "http://example.com")
        .body(Body::empty())
        .unwrap();

    let response = test_app.app.clone().oneshot(request).await.unwrap();

    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .unwrap(),
        "*"
    );
}

#[test]
fn landing_page_renders_cells_as_text() {
    let page = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../../public/index.html");
    let html = std::fs::read_to_string(page).unwrap();

    assert!(html.contains("textContent"));
    assert!(!html.contains("innerHTML"));
    assert!(html.contains("/ws"));
}
