//! Seed the sample dataset and print the computed recommendations
//!
//! Run with: cargo run --bin seed_data

use ect_engine_rust::engine::EctEngine;
use ect_engine_rust::seed::seed_sample_data;
use ect_engine_rust::store::AssessmentStore;
use std::path::PathBuf;

fn main() -> anyhow::Result<()> {
    let model_path: PathBuf = std::env::var("MODEL_PATH")
        .unwrap_or_else(|_| "artifacts/ect_model.json".to_string())
        .into();

    println!("Seeding sample disaster data...\n");
    let engine = EctEngine::from_artifact(&model_path);
    println!(
        "Amount strategy: {}",
        if engine.has_model() { "learned model" } else { "rule table (no model artifact)" }
    );

    let mut store = AssessmentStore::new();
    let summary = seed_sample_data(&mut store, &engine)?;

    let disaster = store.disaster(summary.disaster_id)?;
    println!("\n{}", "=".repeat(70));
    println!("{} ({})", disaster.name, disaster.date_occurred);
    println!("{}", "=".repeat(70));

    for assessment in store.assessments_for_disaster(summary.disaster_id) {
        let household = store.household(assessment.household_id)?;
        println!(
            "{:<20} {:<10} {:<8} flood {:>5}  ECT {:>6}",
            household.name,
            household.barangay,
            assessment.damage_status.as_str(),
            assessment
                .flood_depth_m
                .map(|d| format!("{:.1}m", d))
                .unwrap_or_else(|| "-".to_string()),
            assessment.recommended_amount,
        );
    }

    println!("\nSeeded {} households, {} assessments", summary.households, summary.assessments);
    Ok(())
}
