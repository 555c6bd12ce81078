//! Feature Construction
//!
//! Builds the feature record consumed by the amount strategies from an
//! assessment's inputs plus its household. Pure transformation, no side
//! effects.
//!
//! The flood/height ratio is the one derived signal: flood depth divided by
//! house height, capped at 1.0. A zero, missing, or non-finite house height
//! leaves the ratio undefined (`None`) rather than dividing by zero.

use crate::data::{DamageStatus, Household};

/// Structured feature record for one assessment
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    pub barangay: String,
    pub latitude: f64,
    pub longitude: f64,
    pub flood_depth_m: Option<f64>,
    pub house_height_m: Option<f64>,
    pub house_width_m: Option<f64>,
    pub damage_status: DamageStatus,
    /// 1.0 when enrolled in the social assistance program, else 0.0
    pub is_program_recipient: f64,
    /// min(flood_depth / house_height, 1.0); None when either input is unusable
    pub flood_height_ratio: Option<f64>,
}

/// Build the feature record for one assessment
///
/// Negative or non-finite measurements are treated as missing. The store
/// validates inputs on the way in, but the builder does not rely on that.
pub fn build_features(
    damage_status: DamageStatus,
    flood_depth_m: Option<f64>,
    household: &Household,
) -> FeatureVector {
    let flood_depth_m = sanitize_measurement(flood_depth_m);
    let house_height_m = sanitize_measurement(household.house_height_m);
    let house_width_m = sanitize_measurement(household.house_width_m);

    FeatureVector {
        barangay: household.barangay.clone(),
        latitude: household.latitude,
        longitude: household.longitude,
        flood_depth_m,
        house_height_m,
        house_width_m,
        damage_status,
        is_program_recipient: if household.is_program_recipient { 1.0 } else { 0.0 },
        flood_height_ratio: flood_height_ratio(flood_depth_m, house_height_m),
    }
}

/// Normalized flood severity: depth / height, capped at 1.0
///
/// Undefined (None) when depth is missing or height is missing or zero.
pub fn flood_height_ratio(flood_depth_m: Option<f64>, house_height_m: Option<f64>) -> Option<f64> {
    let depth = flood_depth_m?;
    let height = house_height_m?;
    if height <= 0.0 {
        return None;
    }
    Some((depth / height).min(1.0))
}

/// Treat negative or non-finite measurements as missing
fn sanitize_measurement(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v >= 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::Utc;

    fn household(height: Option<f64>) -> Household {
        Household {
            id: 1,
            name: "Juan Dela Cruz".to_string(),
            address: "123 Rizal Street, Barangay 1".to_string(),
            barangay: "Barangay 1".to_string(),
            latitude: 14.5995,
            longitude: 120.9842,
            contact_number: None,
            house_height_m: height,
            house_width_m: Some(6.0),
            is_program_recipient: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_ratio_capped_at_one() {
        // 6.0m flood on a 4.5m house → capped
        let ratio = flood_height_ratio(Some(6.0), Some(4.5)).unwrap();
        assert_relative_eq!(ratio, 1.0, epsilon = 0.0001);

        // 3.0 / 4.5 = 0.667
        let ratio = flood_height_ratio(Some(3.0), Some(4.5)).unwrap();
        assert_relative_eq!(ratio, 0.6667, epsilon = 0.001);
    }

    #[test]
    fn test_ratio_undefined_for_zero_height() {
        // Must not divide by zero; the ratio is explicitly undefined
        assert_eq!(flood_height_ratio(Some(2.5), Some(0.0)), None);
        assert_eq!(flood_height_ratio(Some(2.5), None), None);
        assert_eq!(flood_height_ratio(None, Some(4.5)), None);
    }

    #[test]
    fn test_build_features_program_flag() {
        let features = build_features(DamageStatus::Partial, Some(1.5), &household(Some(3.0)));
        assert_relative_eq!(features.is_program_recipient, 1.0, epsilon = 0.0001);
        assert_relative_eq!(features.flood_height_ratio.unwrap(), 0.5, epsilon = 0.0001);
        assert_eq!(features.damage_status, DamageStatus::Partial);
    }

    #[test]
    fn test_build_features_sanitizes_negatives() {
        let mut hh = household(Some(-4.0));
        hh.house_width_m = Some(f64::NAN);
        let features = build_features(DamageStatus::Total, Some(-1.0), &hh);
        assert_eq!(features.flood_depth_m, None);
        assert_eq!(features.house_height_m, None);
        assert_eq!(features.house_width_m, None);
        assert_eq!(features.flood_height_ratio, None);
    }
}
