//! HTTP endpoints for the pricing API.

pub mod auth;

use crate::artifacts::InferenceContext;
use crate::error::{AppError, Result};
use crate::models::{
    round2, ConfidenceInterval, ExplanationResponse, FeatureAttribution, ModelInfo,
    PricingRequest, PricingResponse,
};
use crate::services::{compare, encode, predict, ReferenceKey};
use actix_web::{get, post, web, HttpRequest, HttpResponse};
use serde::Deserialize;
use std::sync::Arc;

pub struct PricingHandlerState {
    pub context: Arc<InferenceContext>,
    pub jwt_secret: Option<String>,
}

/// Point estimate plus empirical 90% interval.
///
/// POST /predict
#[post("/predict")]
pub async fn predict_price(
    state: web::Data<PricingHandlerState>,
    req: HttpRequest,
    body: web::Json<PricingRequest>,
) -> Result<HttpResponse> {
    auth::require_bearer(&req, state.jwt_secret.as_deref())?;

    let ctx = &state.context;
    let x = encode(&body, &ctx.schema, &ctx.frequency_maps);
    let result = predict(&x, &ctx.ensemble)?;

    Ok(HttpResponse::Ok().json(PricingResponse {
        predicted_price: round2(result.point_estimate),
        confidence_interval_90: ConfidenceInterval {
            lower_bound: round2(result.lower_bound),
            upper_bound: round2(result.upper_bound),
        },
    }))
}

/// Prediction plus per-feature attributions in schema order.
///
/// POST /explain
#[post("/explain")]
pub async fn explain_price(
    state: web::Data<PricingHandlerState>,
    req: HttpRequest,
    body: web::Json<PricingRequest>,
) -> Result<HttpResponse> {
    auth::require_bearer(&req, state.jwt_secret.as_deref())?;

    let ctx = &state.context;
    let explainer = ctx.explainer.as_ref().ok_or_else(|| {
        AppError::ExplainerUnavailable("no explainer loaded for this model".to_string())
    })?;

    let x = encode(&body, &ctx.schema, &ctx.frequency_maps);
    let result = predict(&x, &ctx.ensemble)?;
    let attributions = explainer.explain(&x, &ctx.ensemble)?;

    Ok(HttpResponse::Ok().json(ExplanationResponse {
        predicted_price: round2(result.point_estimate),
        baseline_value: round2(explainer.baseline()),
        attributions: ctx
            .schema
            .columns()
            .iter()
            .zip(attributions.iter())
            .map(|(feature, &value)| FeatureAttribution {
                feature: feature.clone(),
                value,
            })
            .collect(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct ReferenceQuery {
    pub estimate: f64,
    pub zipcode: Option<String>,
    pub property_type: Option<String>,
}

/// Market-average baseline and delta for an estimate.
///
/// GET /reference?estimate=..&zipcode=.. | &property_type=..
#[get("/reference")]
pub async fn get_reference(
    state: web::Data<PricingHandlerState>,
    req: HttpRequest,
    query: web::Query<ReferenceQuery>,
) -> Result<HttpResponse> {
    auth::require_bearer(&req, state.jwt_secret.as_deref())?;

    let key = match (&query.zipcode, &query.property_type) {
        (Some(zipcode), None) => ReferenceKey::Zipcode(zipcode),
        (None, Some(property_type)) => ReferenceKey::PropertyType(property_type),
        _ => {
            return Err(AppError::BadRequest(
                "provide exactly one of zipcode or property_type".to_string(),
            ))
        }
    };

    let comparison = compare(query.estimate, key, &state.context.reference);
    Ok(HttpResponse::Ok().json(comparison))
}

/// Loaded-model summary.
///
/// GET /model/info
#[get("/model/info")]
pub async fn get_model_info(
    state: web::Data<PricingHandlerState>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    auth::require_bearer(&req, state.jwt_secret.as_deref())?;

    let ctx = &state.context;
    Ok(HttpResponse::Ok().json(ModelInfo {
        tree_count: ctx.ensemble.tree_count(),
        feature_count: ctx.schema.len(),
        property_types: ctx.schema.property_types(),
        explainer_available: ctx.explainer.is_some(),
    }))
}
