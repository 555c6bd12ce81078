//! GeoJSON Assembly
//!
//! Builds one FeatureCollection per disaster: a Point feature per household
//! carrying that disaster's damage status, committed amount, and a marker
//! color. Households without an assessment for the disaster report NONE
//! with a zero amount. Pure data assembly over the store; the API layer
//! caches the result.

use crate::data::DamageStatus;
use crate::store::{AssessmentStore, StoreError};
use serde_json::{json, Value};

/// Marker color for a damage classification
pub fn marker_color(status: DamageStatus) -> &'static str {
    match status {
        DamageStatus::Total => "red",
        DamageStatus::Partial => "orange",
        DamageStatus::None => "green",
    }
}

/// Hex fill color for a damage classification
pub fn fill_color(status: DamageStatus) -> &'static str {
    match status {
        DamageStatus::Total => "#dc3545",
        DamageStatus::Partial => "#fd7e14",
        DamageStatus::None => "#28a745",
    }
}

/// FeatureCollection of every household's status for one disaster
pub fn feature_collection(
    store: &AssessmentStore,
    disaster_id: u64,
) -> Result<Value, StoreError> {
    store.disaster(disaster_id)?;

    let features: Vec<Value> = store
        .households()
        .into_iter()
        .map(|household| {
            let (status, amount) = store
                .assessment_for_pair(household.id, disaster_id)
                .map(|a| (a.damage_status, a.recommended_amount))
                .unwrap_or((DamageStatus::None, 0));

            json!({
                "type": "Feature",
                "geometry": {
                    "type": "Point",
                    "coordinates": [household.longitude, household.latitude],
                },
                "properties": {
                    "id": household.id,
                    "name": household.name,
                    "address": household.address,
                    "barangay": household.barangay,
                    "contact_number": household.contact_number.clone().unwrap_or_default(),
                    "damage_status": status.as_str(),
                    "ect_amount": amount,
                    "marker_color": marker_color(status),
                    "fill_color": fill_color(status),
                },
            })
        })
        .collect();

    Ok(json!({
        "type": "FeatureCollection",
        "features": features,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{NewAssessment, NewDisasterEvent, NewHousehold};
    use crate::engine::EctEngine;
    use chrono::NaiveDate;

    fn seeded() -> (AssessmentStore, u64) {
        let mut store = AssessmentStore::new();
        let engine = EctEngine::without_model();

        let disaster = store.create_disaster(NewDisasterEvent {
            name: "Typhoon Uwan".to_string(),
            description: String::new(),
            date_occurred: NaiveDate::from_ymd_opt(2024, 11, 1).unwrap(),
            is_active: true,
        });

        let assessed = store
            .create_household(NewHousehold {
                name: "Juan Dela Cruz".to_string(),
                address: "123 Rizal Street".to_string(),
                barangay: "Barangay 1".to_string(),
                latitude: 14.5995,
                longitude: 120.9842,
                contact_number: Some("+639171234567".to_string()),
                house_height_m: Some(4.5),
                house_width_m: Some(6.0),
                is_program_recipient: true,
            })
            .unwrap();
        store
            .create_household(NewHousehold {
                name: "Maria Santos".to_string(),
                address: "456 Mabini Avenue".to_string(),
                barangay: "Barangay 2".to_string(),
                latitude: 14.6042,
                longitude: 120.9822,
                contact_number: None,
                house_height_m: Some(3.8),
                house_width_m: Some(5.5),
                is_program_recipient: false,
            })
            .unwrap();

        store
            .create_assessment(
                &engine,
                NewAssessment {
                    household_id: assessed.id,
                    disaster_id: disaster.id,
                    damage_status: DamageStatus::Total,
                    flood_depth_m: Some(3.0),
                    notes: String::new(),
                    assessed_by: "assessor-01".to_string(),
                },
            )
            .unwrap();

        (store, disaster.id)
    }

    #[test]
    fn test_feature_collection_shape() {
        let (store, disaster_id) = seeded();
        let geojson = feature_collection(&store, disaster_id).unwrap();

        assert_eq!(geojson["type"], "FeatureCollection");
        let features = geojson["features"].as_array().unwrap();
        assert_eq!(features.len(), 2);

        // Households are name-ordered: Juan first (assessed TOTAL)
        let juan = &features[0]["properties"];
        assert_eq!(juan["damage_status"], "TOTAL");
        assert_eq!(juan["ect_amount"], 10_000);
        assert_eq!(juan["marker_color"], "red");

        // Unassessed household defaults to NONE / 0 / green
        let maria = &features[1]["properties"];
        assert_eq!(maria["damage_status"], "NONE");
        assert_eq!(maria["ect_amount"], 0);
        assert_eq!(maria["marker_color"], "green");
    }

    #[test]
    fn test_geometry_is_lon_lat() {
        let (store, disaster_id) = seeded();
        let geojson = feature_collection(&store, disaster_id).unwrap();
        let coords = geojson["features"][0]["geometry"]["coordinates"]
            .as_array()
            .unwrap();
        // GeoJSON order: [longitude, latitude]
        assert!((coords[0].as_f64().unwrap() - 120.9842).abs() < 1e-9);
        assert!((coords[1].as_f64().unwrap() - 14.5995).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_disaster_errors() {
        let (store, _) = seeded();
        assert_eq!(
            feature_collection(&store, 404).unwrap_err(),
            StoreError::DisasterNotFound(404)
        );
    }
}
