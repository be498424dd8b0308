//! Wire types for the pricing API.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Closed set of property types the model was trained on.
pub const PROPERTY_TYPES: [&str; 6] = [
    "Apartment",
    "Condo",
    "Manufactured",
    "Multi-Family",
    "Single Family",
    "Townhouse",
];

/// Prediction request body.
///
/// `zipcode` is a string and stays a string through encoding and lookup —
/// leading zeros ("00501") are significant. `propertytype` is kept as free
/// text so a value outside [`PROPERTY_TYPES`] degrades inside the encoder
/// instead of failing deserialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingRequest {
    pub square_footage: f64,
    pub bedrooms: u32,
    pub bathrooms: f64,
    pub latitude: f64,
    pub longitude: f64,
    pub city: String,
    pub state: String,
    pub zipcode: String,
    pub propertytype: String,
    pub listed_date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    pub lower_bound: f64,
    pub upper_bound: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingResponse {
    pub predicted_price: f64,
    pub confidence_interval_90: ConfidenceInterval,
}

/// One feature's marginal contribution to a prediction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureAttribution {
    pub feature: String,
    pub value: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplanationResponse {
    pub predicted_price: f64,
    pub baseline_value: f64,
    /// One entry per feature column, in schema order.
    pub attributions: Vec<FeatureAttribution>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceComparison {
    pub baseline: f64,
    pub delta: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    pub tree_count: usize,
    pub feature_count: usize,
    pub property_types: Vec<String>,
    pub explainer_available: bool,
}

/// Round to cents, matching the wire contract's 2-decimal prices.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
