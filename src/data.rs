//! Entity Records
//!
//! Core records for the relief workflow: households (permanent),
//! disaster events (independent lifecycle), and damage assessments
//! (the link entity carrying the recommended ECT amount).

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Assessed structural damage classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DamageStatus {
    None,
    Partial,
    Total,
}

impl DamageStatus {
    pub fn display_text(&self) -> &'static str {
        match self {
            DamageStatus::None => "No Damage",
            DamageStatus::Partial => "Partial Damage",
            DamageStatus::Total => "Total Damage",
        }
    }

    /// Wire label, matching the serialized form
    pub fn as_str(&self) -> &'static str {
        match self {
            DamageStatus::None => "NONE",
            DamageStatus::Partial => "PARTIAL",
            DamageStatus::Total => "TOTAL",
        }
    }
}

/// Which strategy produced the stored amount
///
/// Carried explicitly on the assessment so the commit step can apply the
/// classification-table safety net without inferring state from field shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComputedBy {
    /// Learned-model strategy supplied the amount
    Model,
    /// Deterministic classification table supplied the amount
    RuleFallback,
    /// No strategy has run since the inputs last changed
    Uncomputed,
}

/// Permanent household record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Household {
    pub id: u64,
    pub name: String,
    pub address: String,
    pub barangay: String,
    pub latitude: f64,
    pub longitude: f64,
    pub contact_number: Option<String>,
    /// Height of the house in meters
    pub house_height_m: Option<f64>,
    /// Width of the house in meters
    pub house_width_m: Option<f64>,
    /// Enrollment in the means-tested social assistance program
    pub is_program_recipient: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Named disaster event; assessments hang off it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisasterEvent {
    pub id: u64,
    pub name: String,
    pub description: String,
    pub date_occurred: NaiveDate,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Damage assessment linking one household to one disaster
///
/// At most one assessment exists per (household, disaster) pair; the store
/// enforces the constraint. `recommended_amount` always holds a committed,
/// clamped value in 0..=10000.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DamageAssessment {
    pub id: u64,
    pub household_id: u64,
    pub disaster_id: u64,
    pub damage_status: DamageStatus,
    /// Depth of flood water in meters at the household location
    pub flood_depth_m: Option<f64>,
    /// Recommended ECT amount in whole currency units, 0..=10000
    pub recommended_amount: u32,
    pub computed_by: ComputedBy,
    pub notes: String,
    pub assessed_by: String,
    pub assessed_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ============================================================================
// Input payloads (store/API boundary)
// ============================================================================

/// Payload for creating or replacing a household
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewHousehold {
    pub name: String,
    pub address: String,
    pub barangay: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub contact_number: Option<String>,
    #[serde(default)]
    pub house_height_m: Option<f64>,
    #[serde(default)]
    pub house_width_m: Option<f64>,
    #[serde(default)]
    pub is_program_recipient: bool,
}

/// Payload for creating or replacing a disaster event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDisasterEvent {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub date_occurred: NaiveDate,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

/// Payload for creating an assessment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAssessment {
    pub household_id: u64,
    pub disaster_id: u64,
    pub damage_status: DamageStatus,
    #[serde(default)]
    pub flood_depth_m: Option<f64>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub assessed_by: String,
}

/// Payload for updating an assessment
///
/// The (household, disaster) pair is fixed at creation; updates touch the
/// inspection fields only. Changing `damage_status` or `flood_depth_m`
/// invalidates the stored amount and triggers recomputation in the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateAssessment {
    pub damage_status: DamageStatus,
    #[serde(default)]
    pub flood_depth_m: Option<f64>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub assessed_by: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_damage_status_wire_format() {
        let json = serde_json::to_string(&DamageStatus::Partial).unwrap();
        assert_eq!(json, "\"PARTIAL\"");

        let status: DamageStatus = serde_json::from_str("\"TOTAL\"").unwrap();
        assert_eq!(status, DamageStatus::Total);
        assert_eq!(status.as_str(), "TOTAL");
    }

    #[test]
    fn test_computed_by_wire_format() {
        let json = serde_json::to_string(&ComputedBy::RuleFallback).unwrap();
        assert_eq!(json, "\"RULE_FALLBACK\"");
    }

    #[test]
    fn test_new_assessment_defaults() {
        let payload: NewAssessment = serde_json::from_str(
            r#"{"household_id": 1, "disaster_id": 2, "damage_status": "NONE"}"#,
        )
        .unwrap();
        assert_eq!(payload.flood_depth_m, None);
        assert!(payload.notes.is_empty());
    }
}
