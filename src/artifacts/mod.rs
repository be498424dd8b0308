//! Trained-model artifacts and the immutable inference context.
//!
//! Everything here is loaded exactly once at startup, cross-checked, and then
//! shared read-only across request workers. A missing or corrupt required
//! artifact aborts startup; the service never runs partially initialized.

pub mod ensemble;
pub mod registry;

use crate::error::{AppError, Result};
use crate::services::explain::PathExplainer;
use ensemble::TreeEnsemble;
use registry::ArtifactStore;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{info, warn};

pub const ENSEMBLE_MODEL_FILE: &str = "ensemble_model.json";
pub const FEATURE_SCHEMA_FILE: &str = "features_schema.json";
pub const FREQUENCY_MAPS_FILE: &str = "frequency_maps.json";
pub const REFERENCE_AVERAGES_FILE: &str = "reference_averages.json";
pub const EXPLAINER_FILE: &str = "explainer.json";

const PROPERTY_TYPE_PREFIX: &str = "PROPERTYTYPE_";

/// Ordered feature-column list fixed at training time.
///
/// Carries two lookup tables built once at load: column name -> index, and
/// property-type value -> one-hot column index (so the encoder never scans
/// column names per request).
#[derive(Debug, Clone)]
pub struct FeatureSchema {
    columns: Vec<String>,
    index: HashMap<String, usize>,
    property_type_index: HashMap<String, usize>,
}

impl FeatureSchema {
    pub fn from_columns(columns: Vec<String>) -> Result<Self> {
        if columns.is_empty() {
            return Err(AppError::SchemaMismatch(
                "feature schema is empty".to_string(),
            ));
        }

        let mut index = HashMap::with_capacity(columns.len());
        let mut property_type_index = HashMap::new();
        for (i, col) in columns.iter().enumerate() {
            if index.insert(col.clone(), i).is_some() {
                return Err(AppError::SchemaMismatch(format!(
                    "duplicate feature column: {}",
                    col
                )));
            }
            if let Some(kind) = col.strip_prefix(PROPERTY_TYPE_PREFIX) {
                property_type_index.insert(kind.to_string(), i);
            }
        }

        Ok(Self {
            columns,
            index,
            property_type_index,
        })
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let columns: Vec<String> = serde_json::from_slice(bytes)
            .map_err(|e| AppError::SchemaMismatch(format!("feature schema: {}", e)))?;
        Self::from_columns(columns)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn index_of(&self, column: &str) -> Option<usize> {
        self.index.get(column).copied()
    }

    /// One-hot column index for a raw property-type value, if the schema has
    /// a matching `PROPERTYTYPE_*` column.
    pub fn property_type_column(&self, property_type: &str) -> Option<usize> {
        self.property_type_index.get(property_type).copied()
    }

    /// Property-type vocabulary present in the schema.
    pub fn property_types(&self) -> Vec<String> {
        let mut kinds: Vec<String> = self.property_type_index.keys().cloned().collect();
        kinds.sort();
        kinds
    }
}

/// Per-field frequency-encoding tables learned at training time.
///
/// An unseen category (or a whole field missing from the artifact) encodes to
/// 0.0 rather than erroring. Availability over accuracy under novel inputs;
/// vocabulary drift is a monitoring concern, not a request failure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct FrequencyMaps(HashMap<String, HashMap<String, f64>>);

impl FrequencyMaps {
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes)
            .map_err(|e| AppError::ArtifactCorrupt(format!("frequency maps: {}", e)))
    }

    pub fn lookup(&self, field: &str, value: &str) -> f64 {
        self.0
            .get(field)
            .and_then(|m| m.get(value))
            .copied()
            .unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct RawReferenceAverages {
    #[serde(default)]
    zipcode: HashMap<String, f64>,
    #[serde(default)]
    propertytype: HashMap<String, f64>,
}

/// Market-average baselines keyed by zipcode and by property type.
/// Keys are normalized once here, not per lookup.
#[derive(Debug, Clone, Default)]
pub struct ReferenceAverages {
    zipcode: HashMap<String, f64>,
    propertytype: HashMap<String, f64>,
}

impl ReferenceAverages {
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let raw: RawReferenceAverages = serde_json::from_slice(bytes)
            .map_err(|e| AppError::ArtifactCorrupt(format!("reference averages: {}", e)))?;
        Ok(Self {
            zipcode: raw
                .zipcode
                .into_iter()
                .map(|(k, v)| (k.trim().to_string(), v))
                .collect(),
            propertytype: raw
                .propertytype
                .into_iter()
                .map(|(k, v)| (k.trim().to_lowercase(), v))
                .collect(),
        })
    }

    pub fn by_zipcode(&self, zipcode: &str) -> Option<f64> {
        self.zipcode.get(zipcode.trim()).copied()
    }

    pub fn by_property_type(&self, property_type: &str) -> Option<f64> {
        self.propertytype
            .get(&property_type.trim().to_lowercase())
            .copied()
    }
}

#[derive(Debug, Clone, Deserialize)]
struct ExplainerArtifact {
    expected_value: f64,
}

/// All trained artifacts behind one immutable handle.
///
/// Built before the HTTP listener binds and shared by `Arc`; no locking is
/// needed because nothing mutates after construction.
#[derive(Debug)]
pub struct InferenceContext {
    pub schema: FeatureSchema,
    pub frequency_maps: FrequencyMaps,
    pub ensemble: TreeEnsemble,
    pub reference: ReferenceAverages,
    pub explainer: Option<PathExplainer>,
}

impl InferenceContext {
    /// Load and cross-check every artifact. Any failure on a required
    /// artifact is fatal to startup; only the explainer may be absent.
    pub async fn load(store: &ArtifactStore) -> Result<Self> {
        let schema = FeatureSchema::from_slice(&store.fetch(FEATURE_SCHEMA_FILE).await?)?;
        info!(columns = schema.len(), "feature schema loaded");

        let frequency_maps = FrequencyMaps::from_slice(&store.fetch(FREQUENCY_MAPS_FILE).await?)?;

        let ensemble = TreeEnsemble::from_slice(&store.fetch(ENSEMBLE_MODEL_FILE).await?)?;
        if ensemble.n_features != schema.len() {
            return Err(AppError::SchemaMismatch(format!(
                "ensemble expects {} features but schema has {} columns",
                ensemble.n_features,
                schema.len()
            )));
        }
        info!(trees = ensemble.tree_count(), "ensemble model loaded");

        let reference =
            ReferenceAverages::from_slice(&store.fetch(REFERENCE_AVERAGES_FILE).await?)?;

        // Explainer is advisory: degrade to "no explanations" on any failure.
        let explainer = match store.fetch(EXPLAINER_FILE).await {
            Ok(bytes) => match serde_json::from_slice::<ExplainerArtifact>(&bytes) {
                Ok(artifact) => match PathExplainer::build(&ensemble, artifact.expected_value) {
                    Ok(explainer) => {
                        info!(baseline = explainer.baseline(), "explainer ready");
                        Some(explainer)
                    }
                    Err(e) => {
                        warn!(error = %e, "explainer rejected, explanations disabled");
                        None
                    }
                },
                Err(e) => {
                    warn!(error = %e, "explainer artifact unreadable, explanations disabled");
                    None
                }
            },
            Err(e) => {
                warn!(error = %e, "explainer artifact unavailable, explanations disabled");
                None
            }
        };

        Ok(Self {
            schema,
            frequency_maps,
            ensemble,
            reference,
            explainer,
        })
    }
}
