//! Learned-Model Strategy
//!
//! Wraps an externally trained artifact behind the [`AmountModel`] trait.
//! The artifact is loaded once at startup and shared read-only; loading is
//! best-effort (`Option`), and prediction failures are typed so the engine
//! can fall back per assessment instead of propagating.
//!
//! The artifact format belongs to the training pipeline. This module only
//! commits to the load/predict contract plus a format-version gate.

use crate::features::FeatureVector;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Artifact format versions this build can read
const SUPPORTED_FORMAT_VERSION: u32 = 1;

/// A single prediction attempt failed for one assessment
///
/// Never fatal: the engine logs the failure and uses the rule table.
#[derive(Debug, Error)]
pub enum PredictionError {
    #[error("artifact has no amount for damage class '{0}'")]
    UnknownClass(String),
    #[error("predicted amount is not a finite number")]
    NonFinite,
}

/// Strategy interface for amount prediction
///
/// Injected into the engine at construction; implementations are shared
/// read-only across concurrent computations.
pub trait AmountModel: Send + Sync {
    /// Predict a raw (unclamped) amount for one feature record
    fn predict(&self, features: &FeatureVector) -> Result<f64, PredictionError>;
}

/// Linear weights over the numeric features
///
/// A feature that is undefined for a given assessment (missing measurement,
/// undefined flood/height ratio) contributes 0.0 to the linear term.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeatureWeights {
    #[serde(default)]
    pub flood_depth_m: f64,
    #[serde(default)]
    pub flood_height_ratio: f64,
    #[serde(default)]
    pub house_height_m: f64,
    #[serde(default)]
    pub house_width_m: f64,
    #[serde(default)]
    pub is_program_recipient: f64,
}

/// Trained amount model deserialized from an artifact file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactModel {
    pub format_version: u32,
    /// Base amount per damage class, keyed by wire label (NONE/PARTIAL/TOTAL)
    pub class_amounts: HashMap<String, f64>,
    #[serde(default)]
    pub weights: FeatureWeights,
    #[serde(default)]
    pub bias: f64,
}

impl ArtifactModel {
    /// Load the artifact, or None when it is missing or unusable
    ///
    /// Missing file, unreadable file, malformed body, and unsupported
    /// format version are all non-fatal: each is logged and the caller
    /// falls back to the rule table for the rest of the process lifetime.
    pub fn load(path: &Path) -> Option<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!("Model artifact unavailable at {:?}: {}", path, e);
                return None;
            }
        };

        let model: ArtifactModel = match serde_json::from_str(&contents) {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!("Failed to parse model artifact {:?}: {}", path, e);
                return None;
            }
        };

        if model.format_version != SUPPORTED_FORMAT_VERSION {
            tracing::warn!(
                "Model artifact {:?} has unsupported format version {}",
                path,
                model.format_version
            );
            return None;
        }

        tracing::info!(
            "Loaded model artifact {:?} ({} damage classes)",
            path,
            model.class_amounts.len()
        );
        Some(model)
    }
}

impl AmountModel for ArtifactModel {
    fn predict(&self, features: &FeatureVector) -> Result<f64, PredictionError> {
        let class = features.damage_status.as_str();
        let base = self
            .class_amounts
            .get(class)
            .copied()
            .ok_or_else(|| PredictionError::UnknownClass(class.to_string()))?;

        let w = &self.weights;
        let linear = w.flood_depth_m * features.flood_depth_m.unwrap_or(0.0)
            + w.flood_height_ratio * features.flood_height_ratio.unwrap_or(0.0)
            + w.house_height_m * features.house_height_m.unwrap_or(0.0)
            + w.house_width_m * features.house_width_m.unwrap_or(0.0)
            + w.is_program_recipient * features.is_program_recipient;

        let amount = base + linear + self.bias;
        if !amount.is_finite() {
            return Err(PredictionError::NonFinite);
        }
        Ok(amount)
    }
}
