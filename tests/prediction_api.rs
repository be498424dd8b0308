// End-to-end tests for the pricing API: toy artifacts on disk, full context
// load, real HTTP handlers.

use actix_web::{test, web, App};
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;

use pricing_service::artifacts::registry::ArtifactStore;
use pricing_service::artifacts::InferenceContext;
use pricing_service::config::ArtifactConfig;
use pricing_service::error::AppError;
use pricing_service::handlers::{
    explain_price, get_model_info, get_reference, predict_price, PricingHandlerState,
};

const SCHEMA: &[&str] = &[
    "SQUAREFOOTAGE",
    "BEDROOMS",
    "BATHROOMS",
    "LATITUDE",
    "LONGITUDE",
    "CITY",
    "STATE",
    "ZIPCODE",
    "LISTING_YEAR",
    "LISTING_MONTH",
    "LISTING_DAY",
    "PROPERTYTYPE_Apartment",
    "PROPERTYTYPE_Condo",
    "PROPERTYTYPE_Single Family",
];

fn constant_tree(value: f64) -> Value {
    json!({
        "feature": [-2],
        "threshold": [0.0],
        "left": [-1],
        "right": [-1],
        "value": [value]
    })
}

/// Write the full toy artifact set: a 3-tree constant ensemble predicting
/// [300000, 310000, 320000] for every input.
fn write_artifacts(dir: &TempDir) {
    let path = |name: &str| dir.path().join(name);

    std::fs::write(
        path("features_schema.json"),
        serde_json::to_vec(&SCHEMA).unwrap(),
    )
    .unwrap();

    std::fs::write(
        path("frequency_maps.json"),
        serde_json::to_vec(&json!({
            "ZIPCODE": {"94103": 0.021, "00501": 0.003},
            "CITY": {"San Francisco": 0.15},
            "STATE": {"CA": 0.4}
        }))
        .unwrap(),
    )
    .unwrap();

    std::fs::write(
        path("ensemble_model.json"),
        serde_json::to_vec(&json!({
            "n_features": SCHEMA.len(),
            "trees": [
                constant_tree(300_000.0),
                constant_tree(310_000.0),
                constant_tree(320_000.0)
            ]
        }))
        .unwrap(),
    )
    .unwrap();

    std::fs::write(
        path("reference_averages.json"),
        serde_json::to_vec(&json!({
            "zipcode": {"94103": 850000.0},
            "propertytype": {"condo": 700000.0}
        }))
        .unwrap(),
    )
    .unwrap();

    std::fs::write(
        path("explainer.json"),
        serde_json::to_vec(&json!({"expected_value": 310_000.0})).unwrap(),
    )
    .unwrap();
}

fn artifact_config(dir: &TempDir) -> ArtifactConfig {
    ArtifactConfig {
        local_dir: dir.path().to_string_lossy().to_string(),
        registry_url: None,
        registry_token: None,
        fetch_timeout_secs: 1,
        fetch_retries: 0,
        retry_backoff_ms: 1,
    }
}

async fn load_context(dir: &TempDir) -> InferenceContext {
    let store = ArtifactStore::from_config(&artifact_config(dir)).unwrap();
    InferenceContext::load(&store).await.unwrap()
}

fn request_body() -> Value {
    json!({
        "square_footage": 1600,
        "bedrooms": 3,
        "bathrooms": 2,
        "latitude": 37.7749,
        "longitude": -122.4194,
        "city": "San Francisco",
        "state": "CA",
        "zipcode": "94103",
        "propertytype": "Condo",
        "listed_date": "2024-06-01"
    })
}

macro_rules! pricing_app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data($state.clone())
                .route("/health", web::get().to(|| async { "OK" }))
                .service(predict_price)
                .service(explain_price)
                .service(get_reference)
                .service(get_model_info),
        )
        .await
    };
}

async fn open_state(dir: &TempDir) -> web::Data<PricingHandlerState> {
    web::Data::new(PricingHandlerState {
        context: Arc::new(load_context(dir).await),
        jwt_secret: None,
    })
}

#[actix_web::test]
async fn predict_returns_exact_wire_shape() {
    let dir = TempDir::new().unwrap();
    write_artifacts(&dir);
    let state = open_state(&dir).await;
    let app = pricing_app!(state);

    let req = test::TestRequest::post()
        .uri("/predict")
        .set_json(request_body())
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["predicted_price"], json!(310_000.0));
    // Interpolated p5/p95 over [300000, 310000, 320000].
    assert_eq!(body["confidence_interval_90"]["lower_bound"], json!(301_000.0));
    assert_eq!(body["confidence_interval_90"]["upper_bound"], json!(319_000.0));
}

#[actix_web::test]
async fn unknown_property_type_still_predicts() {
    let dir = TempDir::new().unwrap();
    write_artifacts(&dir);
    let state = open_state(&dir).await;
    let app = pricing_app!(state);

    let mut body = request_body();
    body["propertytype"] = json!("Castle");
    body["zipcode"] = json!("00501");

    let req = test::TestRequest::post()
        .uri("/predict")
        .set_json(body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
}

#[actix_web::test]
async fn explain_attributes_every_feature_in_schema_order() {
    let dir = TempDir::new().unwrap();
    write_artifacts(&dir);
    let state = open_state(&dir).await;
    let app = pricing_app!(state);

    let req = test::TestRequest::post()
        .uri("/explain")
        .set_json(request_body())
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["predicted_price"], json!(310_000.0));
    assert_eq!(body["baseline_value"], json!(310_000.0));

    let attributions = body["attributions"].as_array().unwrap();
    assert_eq!(attributions.len(), SCHEMA.len());
    for (entry, column) in attributions.iter().zip(SCHEMA) {
        assert_eq!(entry["feature"], json!(column));
    }
    // Constant trees attribute nothing to any feature.
    let sum: f64 = attributions
        .iter()
        .map(|a| a["value"].as_f64().unwrap())
        .sum();
    assert!(sum.abs() < 1e-9);
}

#[actix_web::test]
async fn reference_lookup_and_missing_key_fallback() {
    let dir = TempDir::new().unwrap();
    write_artifacts(&dir);
    let state = open_state(&dir).await;
    let app = pricing_app!(state);

    let req = test::TestRequest::get()
        .uri("/reference?estimate=900000&zipcode=94103")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["baseline"], json!(850_000.0));
    assert_eq!(body["delta"], json!(50_000.0));

    // Absent zipcode: baseline collapses to the estimate.
    let req = test::TestRequest::get()
        .uri("/reference?estimate=900000&zipcode=00501")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["baseline"], json!(900_000.0));
    assert_eq!(body["delta"], json!(0.0));
}

#[actix_web::test]
async fn reference_requires_exactly_one_key() {
    let dir = TempDir::new().unwrap();
    write_artifacts(&dir);
    let state = open_state(&dir).await;
    let app = pricing_app!(state);

    let req = test::TestRequest::get()
        .uri("/reference?estimate=900000&zipcode=94103&property_type=Condo")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    let body: Value = test::read_body_json(resp).await;
    assert!(body["detail"].as_str().unwrap().contains("exactly one"));
}

#[actix_web::test]
async fn model_info_reports_loaded_artifacts() {
    let dir = TempDir::new().unwrap();
    write_artifacts(&dir);
    let state = open_state(&dir).await;
    let app = pricing_app!(state);

    let req = test::TestRequest::get().uri("/model/info").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["tree_count"], json!(3));
    assert_eq!(body["feature_count"], json!(SCHEMA.len()));
    assert_eq!(body["explainer_available"], json!(true));
    assert_eq!(
        body["property_types"],
        json!(["Apartment", "Condo", "Single Family"])
    );
}

#[actix_web::test]
async fn predict_requires_token_when_auth_enabled() {
    let dir = TempDir::new().unwrap();
    write_artifacts(&dir);
    let state = web::Data::new(PricingHandlerState {
        context: Arc::new(load_context(&dir).await),
        jwt_secret: Some("test-secret".to_string()),
    });
    let app = pricing_app!(state);

    let req = test::TestRequest::post()
        .uri("/predict")
        .set_json(request_body())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);

    // Health stays open.
    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
}

#[actix_web::test]
async fn missing_required_artifact_fails_context_load() {
    let dir = TempDir::new().unwrap();
    write_artifacts(&dir);
    std::fs::remove_file(dir.path().join("ensemble_model.json")).unwrap();

    let store = ArtifactStore::from_config(&artifact_config(&dir)).unwrap();
    let err = InferenceContext::load(&store).await.unwrap_err();
    assert!(matches!(err, AppError::ArtifactNotFound(_)));
}

#[actix_web::test]
async fn feature_count_mismatch_fails_context_load() {
    let dir = TempDir::new().unwrap();
    write_artifacts(&dir);
    std::fs::write(
        dir.path().join("ensemble_model.json"),
        serde_json::to_vec(&json!({
            "n_features": 2,
            "trees": [constant_tree(1.0)]
        }))
        .unwrap(),
    )
    .unwrap();

    let store = ArtifactStore::from_config(&artifact_config(&dir)).unwrap();
    let err = InferenceContext::load(&store).await.unwrap_err();
    assert!(matches!(err, AppError::SchemaMismatch(_)));
}

#[actix_web::test]
async fn missing_explainer_degrades_not_fails() {
    let dir = TempDir::new().unwrap();
    write_artifacts(&dir);
    std::fs::remove_file(dir.path().join("explainer.json")).unwrap();

    let context = load_context(&dir).await;
    assert!(context.explainer.is_none());

    // Predictions still work; only /explain degrades.
    let state = web::Data::new(PricingHandlerState {
        context: Arc::new(context),
        jwt_secret: None,
    });
    let app = pricing_app!(state);

    let req = test::TestRequest::post()
        .uri("/predict")
        .set_json(request_body())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    let req = test::TestRequest::post()
        .uri("/explain")
        .set_json(request_body())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 503);

    let body: Value = test::read_body_json(resp).await;
    assert!(body["detail"].as_str().unwrap().contains("unavailable"));
}
