//! ECT Recommendation Engine
//!
//! Maps one assessment's inputs (damage classification, flood depth) plus
//! household attributes to a bounded recommended amount. Two strategies in
//! fallback order:
//!
//! 1. Learned model (injected [`AmountModel`]), when constructed with one
//! 2. Rule-based classification table, always
//!
//! No failure in here surfaces to the caller: every path terminates in a
//! clamped amount tagged with the strategy that produced it.

use crate::data::{ComputedBy, DamageStatus, Household};
use crate::features::{build_features, FeatureVector};
use crate::model::AmountModel;
use crate::rules::{clamp_amount, fallback_amount};

/// One computed amount plus the strategy that produced it
///
/// The tag travels with the amount so the store's commit step can tell an
/// engine-computed value from a record that skipped computation entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Recommendation {
    /// Whole currency units, always within 0..=10000
    pub amount: u32,
    pub computed_by: ComputedBy,
}

/// Recommendation engine with an optionally injected learned model
///
/// Constructed once at startup; concurrent computations share it read-only.
pub struct EctEngine {
    model: Option<Box<dyn AmountModel>>,
}

impl EctEngine {
    /// Engine with an explicit strategy object (None = rule table only)
    pub fn new(model: Option<Box<dyn AmountModel>>) -> Self {
        Self { model }
    }

    /// Engine with no learned model; every amount comes from the rule table
    pub fn without_model() -> Self {
        Self { model: None }
    }

    /// Engine backed by the artifact at `path`, when loadable
    ///
    /// A missing or corrupt artifact is non-fatal: the load failure is
    /// logged inside [`crate::model::ArtifactModel::load`] and the engine
    /// runs rule-only for the rest of the process lifetime.
    pub fn from_artifact(path: &std::path::Path) -> Self {
        let model = crate::model::ArtifactModel::load(path)
            .map(|m| Box::new(m) as Box<dyn AmountModel>);
        Self { model }
    }

    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }

    /// Compute the recommendation for one assessment
    ///
    /// Deterministic for fixed inputs; recomputing with unchanged inputs
    /// yields an identical result.
    pub fn recommend(
        &self,
        damage_status: DamageStatus,
        flood_depth_m: Option<f64>,
        household: &Household,
    ) -> Recommendation {
        let features = build_features(damage_status, flood_depth_m, household);
        self.recommend_features(&features)
    }

    /// Strategy dispatch over an already-built feature record
    pub fn recommend_features(&self, features: &FeatureVector) -> Recommendation {
        if let Some(model) = &self.model {
            match model.predict(features) {
                Ok(raw) if raw.is_finite() => {
                    return Recommendation {
                        amount: clamp_amount(raw),
                        computed_by: ComputedBy::Model,
                    };
                }
                Ok(_) => {
                    tracing::warn!(
                        "Model returned non-finite amount for {} assessment; using rule table",
                        features.damage_status.as_str()
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        "Model prediction failed for {} assessment ({}); using rule table",
                        features.damage_status.as_str(),
                        e
                    );
                }
            }
        }

        Recommendation {
            amount: clamp_amount(fallback_amount(features.damage_status) as f64),
            computed_by: ComputedBy::RuleFallback,
        }
    }
}
