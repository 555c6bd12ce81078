//! ECT Recommendation Engine
//!
//! Computes recommended Emergency Cash Transfer amounts for post-disaster
//! damage assessments, with a learned-model strategy falling back to a
//! deterministic classification table.
//!
//! Module layout:
//! - `data`: entity records (households, disasters, assessments)
//! - `features`: feature construction for the amount strategies
//! - `model`: learned-model strategy (artifact load/predict contract)
//! - `rules`: rule-based fallback table and the amount clamp
//! - `engine`: strategy dispatch producing tagged recommendations
//! - `store`: in-memory persistence boundary with the commit safety net
//! - `geojson`: per-disaster FeatureCollection assembly
//! - `seed`: sample dataset
//! - `api_server` / `sms` (feature `api`): Axum REST layer + SMS drafting

pub mod data;
pub mod engine;
pub mod features;
pub mod geojson;
pub mod model;
pub mod rules;
pub mod seed;
pub mod store;

pub mod api_server;

#[cfg(feature = "api")]
pub mod sms;

// Re-export commonly used types
pub use data::{ComputedBy, DamageAssessment, DamageStatus, DisasterEvent, Household};
pub use engine::{EctEngine, Recommendation};
pub use features::{build_features, FeatureVector};
pub use model::{AmountModel, ArtifactModel, PredictionError};
pub use rules::{clamp_amount, fallback_amount, MAX_AMOUNT};
pub use store::{AssessmentStore, StoreError};

#[cfg(feature = "api")]
pub use api_server::{create_router, AppState};
