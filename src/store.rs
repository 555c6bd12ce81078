//! Assessment Store
//!
//! In-memory persistence boundary for the three entities, backed by
//! `FxHashMap` indexes. Stands in for the database at its interface
//! boundary: unique (household, disaster) pair constraint, cascade
//! deletes, input validation, and the commit-time safety net that
//! re-derives any amount not explicitly tagged by a strategy.
//!
//! Validation errors here DO surface to callers; engine failures never do.

use crate::data::{
    ComputedBy, DamageAssessment, DamageStatus, DisasterEvent, Household, NewAssessment,
    NewDisasterEvent, NewHousehold, UpdateAssessment,
};
use crate::engine::{EctEngine, Recommendation};
use crate::rules::{clamp_amount, fallback_amount};
use chrono::Utc;
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use thiserror::Error;

/// Validation and lookup failures at the persistence boundary
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("household {0} not found")]
    HouseholdNotFound(u64),
    #[error("disaster {0} not found")]
    DisasterNotFound(u64),
    #[error("assessment {0} not found")]
    AssessmentNotFound(u64),
    #[error("household {household_id} already has an assessment for disaster {disaster_id}")]
    DuplicateAssessment { household_id: u64, disaster_id: u64 },
    #[error("{field} must be a finite, non-negative number")]
    InvalidValue { field: &'static str },
}

/// In-memory entity store
pub struct AssessmentStore {
    households: FxHashMap<u64, Household>,
    disasters: FxHashMap<u64, DisasterEvent>,
    assessments: FxHashMap<u64, DamageAssessment>,
    /// (household_id, disaster_id) → assessment id; enforces the unique pair
    pair_index: FxHashMap<(u64, u64), u64>,
    next_household_id: u64,
    next_disaster_id: u64,
    next_assessment_id: u64,
}

impl Default for AssessmentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AssessmentStore {
    pub fn new() -> Self {
        Self {
            households: FxHashMap::default(),
            disasters: FxHashMap::default(),
            assessments: FxHashMap::default(),
            pair_index: FxHashMap::default(),
            next_household_id: 1,
            next_disaster_id: 1,
            next_assessment_id: 1,
        }
    }

    // ========================================================================
    // Households
    // ========================================================================

    pub fn create_household(&mut self, new: NewHousehold) -> Result<Household, StoreError> {
        validate_coordinate("latitude", new.latitude)?;
        validate_coordinate("longitude", new.longitude)?;
        validate_measurement("house_height_m", new.house_height_m)?;
        validate_measurement("house_width_m", new.house_width_m)?;

        let now = Utc::now();
        let id = self.next_household_id;
        self.next_household_id += 1;

        let household = Household {
            id,
            name: new.name,
            address: new.address,
            barangay: new.barangay,
            latitude: new.latitude,
            longitude: new.longitude,
            contact_number: new.contact_number,
            house_height_m: new.house_height_m,
            house_width_m: new.house_width_m,
            is_program_recipient: new.is_program_recipient,
            created_at: now,
            updated_at: now,
        };
        self.households.insert(id, household.clone());
        Ok(household)
    }

    pub fn household(&self, id: u64) -> Result<&Household, StoreError> {
        self.households.get(&id).ok_or(StoreError::HouseholdNotFound(id))
    }

    /// All households, ordered by name
    pub fn households(&self) -> Vec<&Household> {
        let mut all: Vec<&Household> = self.households.values().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        all
    }

    /// Replace a household's attributes
    ///
    /// A change to house height invalidates every assessment of this
    /// household and recomputes it before the call returns, so no read
    /// ever observes a stale amount.
    pub fn update_household(
        &mut self,
        engine: &EctEngine,
        id: u64,
        new: NewHousehold,
    ) -> Result<Household, StoreError> {
        validate_coordinate("latitude", new.latitude)?;
        validate_coordinate("longitude", new.longitude)?;
        validate_measurement("house_height_m", new.house_height_m)?;
        validate_measurement("house_width_m", new.house_width_m)?;

        let household = self
            .households
            .get_mut(&id)
            .ok_or(StoreError::HouseholdNotFound(id))?;

        let height_changed = household.house_height_m != new.house_height_m;

        household.name = new.name;
        household.address = new.address;
        household.barangay = new.barangay;
        household.latitude = new.latitude;
        household.longitude = new.longitude;
        household.contact_number = new.contact_number;
        household.house_height_m = new.house_height_m;
        household.house_width_m = new.house_width_m;
        household.is_program_recipient = new.is_program_recipient;
        household.updated_at = Utc::now();
        let updated = household.clone();

        if height_changed {
            let affected: Vec<u64> = self
                .assessments
                .values()
                .filter(|a| a.household_id == id)
                .map(|a| a.id)
                .collect();
            for assessment_id in affected {
                self.invalidate_and_recompute(engine, assessment_id)?;
            }
        }

        Ok(updated)
    }

    /// Delete a household and cascade to its assessments
    pub fn delete_household(&mut self, id: u64) -> Result<(), StoreError> {
        if self.households.remove(&id).is_none() {
            return Err(StoreError::HouseholdNotFound(id));
        }
        self.assessments.retain(|_, a| a.household_id != id);
        self.pair_index.retain(|(household_id, _), _| *household_id != id);
        Ok(())
    }

    // ========================================================================
    // Disasters
    // ========================================================================

    pub fn create_disaster(&mut self, new: NewDisasterEvent) -> DisasterEvent {
        let now = Utc::now();
        let id = self.next_disaster_id;
        self.next_disaster_id += 1;

        let disaster = DisasterEvent {
            id,
            name: new.name,
            description: new.description,
            date_occurred: new.date_occurred,
            is_active: new.is_active,
            created_at: now,
            updated_at: now,
        };
        self.disasters.insert(id, disaster.clone());
        disaster
    }

    pub fn disaster(&self, id: u64) -> Result<&DisasterEvent, StoreError> {
        self.disasters.get(&id).ok_or(StoreError::DisasterNotFound(id))
    }

    /// All disasters, most recent occurrence first
    pub fn disasters(&self) -> Vec<&DisasterEvent> {
        let mut all: Vec<&DisasterEvent> = self.disasters.values().collect();
        all.sort_by(|a, b| b.date_occurred.cmp(&a.date_occurred).then(a.id.cmp(&b.id)));
        all
    }

    pub fn update_disaster(
        &mut self,
        id: u64,
        new: NewDisasterEvent,
    ) -> Result<DisasterEvent, StoreError> {
        let disaster = self
            .disasters
            .get_mut(&id)
            .ok_or(StoreError::DisasterNotFound(id))?;
        disaster.name = new.name;
        disaster.description = new.description;
        disaster.date_occurred = new.date_occurred;
        disaster.is_active = new.is_active;
        disaster.updated_at = Utc::now();
        Ok(disaster.clone())
    }

    /// Delete a disaster and cascade to its assessments
    pub fn delete_disaster(&mut self, id: u64) -> Result<(), StoreError> {
        if self.disasters.remove(&id).is_none() {
            return Err(StoreError::DisasterNotFound(id));
        }
        self.assessments.retain(|_, a| a.disaster_id != id);
        self.pair_index.retain(|(_, disaster_id), _| *disaster_id != id);
        Ok(())
    }

    // ========================================================================
    // Assessments
    // ========================================================================

    /// Record an inspection, computing the amount through the engine
    pub fn create_assessment(
        &mut self,
        engine: &EctEngine,
        new: NewAssessment,
    ) -> Result<DamageAssessment, StoreError> {
        let household = self
            .households
            .get(&new.household_id)
            .ok_or(StoreError::HouseholdNotFound(new.household_id))?
            .clone();
        let recommendation =
            engine.recommend(new.damage_status, new.flood_depth_m, &household);
        self.insert_assessment(new, Some(recommendation))
    }

    /// Record an inspection without invoking the engine
    ///
    /// The commit-time safety net derives the amount from the
    /// classification table, so the stored record still satisfies the
    /// range invariant and the minimum behavior.
    pub fn create_assessment_unscored(
        &mut self,
        new: NewAssessment,
    ) -> Result<DamageAssessment, StoreError> {
        if !self.households.contains_key(&new.household_id) {
            return Err(StoreError::HouseholdNotFound(new.household_id));
        }
        self.insert_assessment(new, None)
    }

    fn insert_assessment(
        &mut self,
        new: NewAssessment,
        recommendation: Option<Recommendation>,
    ) -> Result<DamageAssessment, StoreError> {
        if !self.disasters.contains_key(&new.disaster_id) {
            return Err(StoreError::DisasterNotFound(new.disaster_id));
        }
        validate_measurement("flood_depth_m", new.flood_depth_m)?;

        let pair = (new.household_id, new.disaster_id);
        if self.pair_index.contains_key(&pair) {
            return Err(StoreError::DuplicateAssessment {
                household_id: new.household_id,
                disaster_id: new.disaster_id,
            });
        }

        let (amount, computed_by) = commit_amount(recommendation, new.damage_status);

        let now = Utc::now();
        let id = self.next_assessment_id;
        self.next_assessment_id += 1;

        let assessment = DamageAssessment {
            id,
            household_id: new.household_id,
            disaster_id: new.disaster_id,
            damage_status: new.damage_status,
            flood_depth_m: new.flood_depth_m,
            recommended_amount: amount,
            computed_by,
            notes: new.notes,
            assessed_by: new.assessed_by,
            assessed_at: now,
            updated_at: now,
        };
        self.assessments.insert(id, assessment.clone());
        self.pair_index.insert(pair, id);
        Ok(assessment)
    }

    pub fn assessment(&self, id: u64) -> Result<&DamageAssessment, StoreError> {
        self.assessments.get(&id).ok_or(StoreError::AssessmentNotFound(id))
    }

    /// All assessments, most recently assessed first
    pub fn assessments(&self) -> Vec<&DamageAssessment> {
        let mut all: Vec<&DamageAssessment> = self.assessments.values().collect();
        all.sort_by(|a, b| b.assessed_at.cmp(&a.assessed_at).then(a.id.cmp(&b.id)));
        all
    }

    pub fn assessments_for_disaster(&self, disaster_id: u64) -> Vec<&DamageAssessment> {
        self.assessments()
            .into_iter()
            .filter(|a| a.disaster_id == disaster_id)
            .collect()
    }

    pub fn assessments_for_household(&self, household_id: u64) -> Vec<&DamageAssessment> {
        self.assessments()
            .into_iter()
            .filter(|a| a.household_id == household_id)
            .collect()
    }

    /// Assessment for one (household, disaster) pair, if recorded
    pub fn assessment_for_pair(
        &self,
        household_id: u64,
        disaster_id: u64,
    ) -> Option<&DamageAssessment> {
        self.pair_index
            .get(&(household_id, disaster_id))
            .and_then(|id| self.assessments.get(id))
    }

    /// Update inspection fields; input changes trigger recomputation
    pub fn update_assessment(
        &mut self,
        engine: &EctEngine,
        id: u64,
        update: UpdateAssessment,
    ) -> Result<DamageAssessment, StoreError> {
        validate_measurement("flood_depth_m", update.flood_depth_m)?;

        let assessment = self
            .assessments
            .get_mut(&id)
            .ok_or(StoreError::AssessmentNotFound(id))?;

        let inputs_changed = assessment.damage_status != update.damage_status
            || assessment.flood_depth_m != update.flood_depth_m;

        assessment.damage_status = update.damage_status;
        assessment.flood_depth_m = update.flood_depth_m;
        assessment.notes = update.notes;
        assessment.assessed_by = update.assessed_by;
        assessment.updated_at = Utc::now();

        if inputs_changed {
            self.invalidate_and_recompute(engine, id)?;
        }
        Ok(self.assessment(id)?.clone())
    }

    pub fn delete_assessment(&mut self, id: u64) -> Result<(), StoreError> {
        let assessment = self
            .assessments
            .remove(&id)
            .ok_or(StoreError::AssessmentNotFound(id))?;
        self.pair_index
            .remove(&(assessment.household_id, assessment.disaster_id));
        Ok(())
    }

    /// Explicit recomputation of one assessment from its current inputs
    pub fn recompute_assessment(
        &mut self,
        engine: &EctEngine,
        id: u64,
    ) -> Result<DamageAssessment, StoreError> {
        self.invalidate_and_recompute(engine, id)?;
        Ok(self.assessment(id)?.clone())
    }

    /// Recompute every assessment of one disaster (rayon batch)
    ///
    /// Returns the number of records recomputed. The engine is shared
    /// read-only across the worker threads.
    pub fn recompute_for_disaster(
        &mut self,
        engine: &EctEngine,
        disaster_id: u64,
    ) -> Result<usize, StoreError> {
        if !self.disasters.contains_key(&disaster_id) {
            return Err(StoreError::DisasterNotFound(disaster_id));
        }

        let jobs: Vec<(u64, DamageStatus, Option<f64>, Household)> = self
            .assessments
            .values()
            .filter(|a| a.disaster_id == disaster_id)
            .filter_map(|a| {
                self.households
                    .get(&a.household_id)
                    .map(|h| (a.id, a.damage_status, a.flood_depth_m, h.clone()))
            })
            .collect();

        let recommendations: Vec<(u64, Recommendation)> = jobs
            .par_iter()
            .map(|(id, status, depth, household)| {
                (*id, engine.recommend(*status, *depth, household))
            })
            .collect();

        let count = recommendations.len();
        for (id, recommendation) in recommendations {
            if let Some(assessment) = self.assessments.get_mut(&id) {
                let (amount, computed_by) =
                    commit_amount(Some(recommendation), assessment.damage_status);
                assessment.recommended_amount = amount;
                assessment.computed_by = computed_by;
                assessment.updated_at = Utc::now();
            }
        }
        Ok(count)
    }

    /// Drop the stored amount back to Uncomputed and run the engine again
    fn invalidate_and_recompute(
        &mut self,
        engine: &EctEngine,
        id: u64,
    ) -> Result<(), StoreError> {
        let (household_id, status, depth) = {
            let assessment = self
                .assessments
                .get_mut(&id)
                .ok_or(StoreError::AssessmentNotFound(id))?;
            assessment.computed_by = ComputedBy::Uncomputed;
            (
                assessment.household_id,
                assessment.damage_status,
                assessment.flood_depth_m,
            )
        };

        let recommendation = self
            .households
            .get(&household_id)
            .map(|household| engine.recommend(status, depth, household));

        let assessment = self
            .assessments
            .get_mut(&id)
            .ok_or(StoreError::AssessmentNotFound(id))?;
        let (amount, computed_by) = commit_amount(recommendation, status);
        assessment.recommended_amount = amount;
        assessment.computed_by = computed_by;
        assessment.updated_at = Utc::now();
        Ok(())
    }

    pub fn household_count(&self) -> usize {
        self.households.len()
    }

    pub fn disaster_count(&self) -> usize {
        self.disasters.len()
    }

    pub fn assessment_count(&self) -> usize {
        self.assessments.len()
    }
}

/// Commit step: clamp whatever a strategy produced, or re-derive from the
/// classification table when no strategy explicitly tagged the amount
fn commit_amount(
    recommendation: Option<Recommendation>,
    status: DamageStatus,
) -> (u32, ComputedBy) {
    match recommendation {
        Some(rec) if rec.computed_by != ComputedBy::Uncomputed => {
            (clamp_amount(rec.amount as f64), rec.computed_by)
        }
        _ => (fallback_amount(status), ComputedBy::RuleFallback),
    }
}

fn validate_measurement(field: &'static str, value: Option<f64>) -> Result<(), StoreError> {
    match value {
        Some(v) if !v.is_finite() || v < 0.0 => Err(StoreError::InvalidValue { field }),
        _ => Ok(()),
    }
}

fn validate_coordinate(field: &'static str, value: f64) -> Result<(), StoreError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(StoreError::InvalidValue { field })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample_household(name: &str, height: Option<f64>) -> NewHousehold {
        NewHousehold {
            name: name.to_string(),
            address: format!("{} Street", name),
            barangay: "Barangay 1".to_string(),
            latitude: 14.5995,
            longitude: 120.9842,
            contact_number: None,
            house_height_m: height,
            house_width_m: Some(6.0),
            is_program_recipient: false,
        }
    }

    fn sample_disaster() -> NewDisasterEvent {
        NewDisasterEvent {
            name: "Typhoon Uwan".to_string(),
            description: String::new(),
            date_occurred: NaiveDate::from_ymd_opt(2024, 11, 1).unwrap(),
            is_active: true,
        }
    }

    fn seeded() -> (AssessmentStore, EctEngine, u64, u64) {
        let mut store = AssessmentStore::new();
        let engine = EctEngine::without_model();
        let household = store
            .create_household(sample_household("Juan Dela Cruz", Some(4.5)))
            .unwrap();
        let disaster = store.create_disaster(sample_disaster());
        (store, engine, household.id, disaster.id)
    }

    fn new_assessment(household_id: u64, disaster_id: u64, status: DamageStatus) -> NewAssessment {
        NewAssessment {
            household_id,
            disaster_id,
            damage_status: status,
            flood_depth_m: Some(1.0),
            notes: String::new(),
            assessed_by: "assessor-01".to_string(),
        }
    }

    #[test]
    fn test_create_assessment_computes_amount() {
        let (mut store, engine, hh, dis) = seeded();
        let assessment = store
            .create_assessment(&engine, new_assessment(hh, dis, DamageStatus::Partial))
            .unwrap();
        assert_eq!(assessment.recommended_amount, 5_000);
        assert_eq!(assessment.computed_by, ComputedBy::RuleFallback);
    }

    #[test]
    fn test_duplicate_pair_rejected() {
        let (mut store, engine, hh, dis) = seeded();
        store
            .create_assessment(&engine, new_assessment(hh, dis, DamageStatus::None))
            .unwrap();
        let err = store
            .create_assessment(&engine, new_assessment(hh, dis, DamageStatus::Total))
            .unwrap_err();
        assert_eq!(
            err,
            StoreError::DuplicateAssessment {
                household_id: hh,
                disaster_id: dis
            }
        );
    }

    #[test]
    fn test_unscored_commit_uses_safety_net() {
        let (mut store, _engine, hh, dis) = seeded();
        let assessment = store
            .create_assessment_unscored(new_assessment(hh, dis, DamageStatus::Total))
            .unwrap();
        // No strategy ran, yet the committed record matches the table
        assert_eq!(assessment.recommended_amount, 10_000);
        assert_eq!(assessment.computed_by, ComputedBy::RuleFallback);
    }

    #[test]
    fn test_update_inputs_recomputes() {
        let (mut store, engine, hh, dis) = seeded();
        let assessment = store
            .create_assessment(&engine, new_assessment(hh, dis, DamageStatus::Partial))
            .unwrap();

        let updated = store
            .update_assessment(
                &engine,
                assessment.id,
                UpdateAssessment {
                    damage_status: DamageStatus::Total,
                    flood_depth_m: Some(3.0),
                    notes: "roof gone".to_string(),
                    assessed_by: "assessor-01".to_string(),
                },
            )
            .unwrap();
        assert_eq!(updated.recommended_amount, 10_000);
        assert_eq!(updated.computed_by, ComputedBy::RuleFallback);
    }

    #[test]
    fn test_update_notes_only_keeps_amount() {
        let (mut store, engine, hh, dis) = seeded();
        let assessment = store
            .create_assessment(&engine, new_assessment(hh, dis, DamageStatus::Partial))
            .unwrap();
        let updated = store
            .update_assessment(
                &engine,
                assessment.id,
                UpdateAssessment {
                    damage_status: DamageStatus::Partial,
                    flood_depth_m: Some(1.0),
                    notes: "verified by barangay captain".to_string(),
                    assessed_by: "assessor-02".to_string(),
                },
            )
            .unwrap();
        assert_eq!(updated.recommended_amount, 5_000);
        assert_eq!(updated.notes, "verified by barangay captain");
    }

    #[test]
    fn test_household_height_change_invalidates() {
        let (mut store, engine, hh, dis) = seeded();
        store
            .create_assessment(&engine, new_assessment(hh, dis, DamageStatus::Partial))
            .unwrap();

        let payload = sample_household("Juan Dela Cruz", Some(2.0));
        store.update_household(&engine, hh, payload).unwrap();

        let assessment = store.assessment_for_pair(hh, dis).unwrap();
        // Rule-only engine: same amount, but the record went through
        // invalidation and recomputation rather than keeping a stale tag
        assert_eq!(assessment.recommended_amount, 5_000);
        assert_eq!(assessment.computed_by, ComputedBy::RuleFallback);
    }

    #[test]
    fn test_cascade_delete_household() {
        let (mut store, engine, hh, dis) = seeded();
        store
            .create_assessment(&engine, new_assessment(hh, dis, DamageStatus::None))
            .unwrap();
        store.delete_household(hh).unwrap();
        assert_eq!(store.assessment_count(), 0);
        // Pair slot is free again for a future household with the same id space
        assert!(store.assessment_for_pair(hh, dis).is_none());
    }

    #[test]
    fn test_cascade_delete_disaster() {
        let (mut store, engine, hh, dis) = seeded();
        store
            .create_assessment(&engine, new_assessment(hh, dis, DamageStatus::Total))
            .unwrap();
        store.delete_disaster(dis).unwrap();
        assert_eq!(store.assessment_count(), 0);
        assert!(store.assessments_for_household(hh).is_empty());
    }

    #[test]
    fn test_invalid_measurements_rejected() {
        let (mut store, engine, hh, dis) = seeded();

        let mut bad = new_assessment(hh, dis, DamageStatus::Partial);
        bad.flood_depth_m = Some(-0.5);
        let err = store.create_assessment(&engine, bad).unwrap_err();
        assert_eq!(err, StoreError::InvalidValue { field: "flood_depth_m" });

        let err = store
            .create_household(sample_household("Bad", Some(f64::NAN)))
            .unwrap_err();
        assert_eq!(err, StoreError::InvalidValue { field: "house_height_m" });
    }

    #[test]
    fn test_missing_references_rejected() {
        let (mut store, engine, hh, dis) = seeded();
        let err = store
            .create_assessment(&engine, new_assessment(999, dis, DamageStatus::None))
            .unwrap_err();
        assert_eq!(err, StoreError::HouseholdNotFound(999));

        let err = store
            .create_assessment(&engine, new_assessment(hh, 999, DamageStatus::None))
            .unwrap_err();
        assert_eq!(err, StoreError::DisasterNotFound(999));
    }

    #[test]
    fn test_recompute_for_disaster_counts() {
        let (mut store, engine, hh, dis) = seeded();
        let other = store
            .create_household(sample_household("Maria Santos", Some(3.8)))
            .unwrap();
        store
            .create_assessment(&engine, new_assessment(hh, dis, DamageStatus::Partial))
            .unwrap();
        store
            .create_assessment(&engine, new_assessment(other.id, dis, DamageStatus::Total))
            .unwrap();

        let count = store.recompute_for_disaster(&engine, dis).unwrap();
        assert_eq!(count, 2);
        assert_eq!(
            store.assessment_for_pair(other.id, dis).unwrap().recommended_amount,
            10_000
        );
    }

    #[test]
    fn test_list_ordering() {
        let (mut store, _engine, _hh, _dis) = seeded();
        store
            .create_household(sample_household("Ana Rodriguez", None))
            .unwrap();
        let names: Vec<&str> = store.households().iter().map(|h| h.name.as_str()).collect();
        assert_eq!(names, vec!["Ana Rodriguez", "Juan Dela Cruz"]);
    }
}
