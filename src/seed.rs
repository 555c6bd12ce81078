//! Sample Data Seeding
//!
//! Populates a store with one disaster, a set of Metro Manila households,
//! and an assessment per household, running the engine for each. Used by
//! the seed binary and optionally by the API server at startup.

use crate::data::{DamageStatus, NewAssessment, NewDisasterEvent, NewHousehold};
use crate::engine::EctEngine;
use crate::store::{AssessmentStore, StoreError};
use chrono::NaiveDate;

/// What the seeding pass created
#[derive(Debug, Clone, Copy)]
pub struct SeedSummary {
    pub disaster_id: u64,
    pub households: usize,
    pub assessments: usize,
}

struct HouseholdSeed {
    name: &'static str,
    address: &'static str,
    barangay: &'static str,
    latitude: f64,
    longitude: f64,
    contact_number: &'static str,
    house_height_m: f64,
    house_width_m: f64,
    is_program_recipient: bool,
    damage_status: DamageStatus,
    flood_depth_m: Option<f64>,
}

const HOUSEHOLDS: &[HouseholdSeed] = &[
    HouseholdSeed {
        name: "Juan Dela Cruz",
        address: "123 Rizal Street, Barangay 1",
        barangay: "Barangay 1",
        latitude: 14.5995,
        longitude: 120.9842,
        contact_number: "+639171234567",
        house_height_m: 4.50,
        house_width_m: 6.00,
        is_program_recipient: true,
        damage_status: DamageStatus::Total,
        flood_depth_m: Some(3.0),
    },
    HouseholdSeed {
        name: "Maria Santos",
        address: "456 Mabini Avenue, Barangay 2",
        barangay: "Barangay 2",
        latitude: 14.6042,
        longitude: 120.9822,
        contact_number: "+639172345678",
        house_height_m: 3.80,
        house_width_m: 5.50,
        is_program_recipient: false,
        damage_status: DamageStatus::Partial,
        flood_depth_m: Some(1.2),
    },
    HouseholdSeed {
        name: "Pedro Garcia",
        address: "789 Bonifacio Street, Barangay 3",
        barangay: "Barangay 3",
        latitude: 14.5948,
        longitude: 120.9862,
        contact_number: "+639173456789",
        house_height_m: 5.20,
        house_width_m: 7.00,
        is_program_recipient: true,
        damage_status: DamageStatus::None,
        flood_depth_m: Some(0.2),
    },
    HouseholdSeed {
        name: "Ana Rodriguez",
        address: "321 Quezon Boulevard, Barangay 4",
        barangay: "Barangay 4",
        latitude: 14.6095,
        longitude: 120.9802,
        contact_number: "+639174567890",
        house_height_m: 4.00,
        house_width_m: 6.50,
        is_program_recipient: false,
        damage_status: DamageStatus::Total,
        flood_depth_m: Some(2.8),
    },
    HouseholdSeed {
        name: "Carlos Mendoza",
        address: "654 Aguinaldo Street, Barangay 5",
        barangay: "Barangay 5",
        latitude: 14.5895,
        longitude: 120.9882,
        contact_number: "+639175678901",
        house_height_m: 3.50,
        house_width_m: 5.00,
        is_program_recipient: true,
        damage_status: DamageStatus::Partial,
        flood_depth_m: Some(0.9),
    },
    HouseholdSeed {
        name: "Rosa Villanueva",
        address: "987 Luna Street, Barangay 1",
        barangay: "Barangay 1",
        latitude: 14.6025,
        longitude: 120.9852,
        contact_number: "+639176789012",
        house_height_m: 4.75,
        house_width_m: 6.75,
        is_program_recipient: false,
        damage_status: DamageStatus::None,
        flood_depth_m: None,
    },
    HouseholdSeed {
        name: "Jose Torres",
        address: "147 Panganiban Street, Barangay 2",
        barangay: "Barangay 2",
        latitude: 14.5965,
        longitude: 120.9832,
        contact_number: "+639177890123",
        house_height_m: 3.90,
        house_width_m: 5.75,
        is_program_recipient: true,
        damage_status: DamageStatus::Partial,
        flood_depth_m: Some(1.6),
    },
    HouseholdSeed {
        name: "Lourdes Fernandez",
        address: "258 Roxas Avenue, Barangay 3",
        barangay: "Barangay 3",
        latitude: 14.6075,
        longitude: 120.9812,
        contact_number: "+639178901234",
        house_height_m: 5.00,
        house_width_m: 7.25,
        is_program_recipient: false,
        damage_status: DamageStatus::Total,
        flood_depth_m: Some(3.4),
    },
];

/// Seed the sample disaster, households, and assessments
pub fn seed_sample_data(
    store: &mut AssessmentStore,
    engine: &EctEngine,
) -> Result<SeedSummary, StoreError> {
    let disaster = store.create_disaster(NewDisasterEvent {
        name: "Typhoon Uwan".to_string(),
        description: "A severe typhoon that affected multiple barangays in Metro Manila"
            .to_string(),
        date_occurred: NaiveDate::from_ymd_opt(2024, 11, 1).expect("valid date"),
        is_active: true,
    });

    let mut assessments = 0;
    for seed in HOUSEHOLDS {
        let household = store.create_household(NewHousehold {
            name: seed.name.to_string(),
            address: seed.address.to_string(),
            barangay: seed.barangay.to_string(),
            latitude: seed.latitude,
            longitude: seed.longitude,
            contact_number: Some(seed.contact_number.to_string()),
            house_height_m: Some(seed.house_height_m),
            house_width_m: Some(seed.house_width_m),
            is_program_recipient: seed.is_program_recipient,
        })?;

        store.create_assessment(
            engine,
            NewAssessment {
                household_id: household.id,
                disaster_id: disaster.id,
                damage_status: seed.damage_status,
                flood_depth_m: seed.flood_depth_m,
                notes: String::new(),
                assessed_by: "seed".to_string(),
            },
        )?;
        assessments += 1;
    }

    tracing::info!(
        "Seeded disaster '{}' with {} households and {} assessments",
        disaster.name,
        HOUSEHOLDS.len(),
        assessments
    );

    Ok(SeedSummary {
        disaster_id: disaster.id,
        households: HOUSEHOLDS.len(),
        assessments,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::MAX_AMOUNT;

    #[test]
    fn test_seed_populates_store() {
        let mut store = AssessmentStore::new();
        let engine = EctEngine::without_model();
        let summary = seed_sample_data(&mut store, &engine).unwrap();

        assert_eq!(summary.households, 8);
        assert_eq!(summary.assessments, 8);
        assert_eq!(store.household_count(), 8);
        assert_eq!(store.assessment_count(), 8);

        // Every committed amount respects the range invariant
        for assessment in store.assessments_for_disaster(summary.disaster_id) {
            assert!(assessment.recommended_amount <= MAX_AMOUNT);
        }
    }
}
