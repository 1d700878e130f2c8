//! Sample data for development.

use crate::db::Database;
use crate::error::Result;
use crate::models::*;

fn performed(target: f64, reps: u32) -> CreateSetInput {
    CreateSetInput {
        target_weight: Some(target),
        weight: Some(target),
        reps: Some(reps),
        ..CreateSetInput::default()
    }
}

fn sample_progression() -> TopSetProgression {
    TopSetProgression {
        num_sets: 3,
        top_weight: Some(250.0),
        percent_up: 5.0,
        percent_down: 10.0,
    }
}

/// Replace every lift with a bench press and a deadlift, each with three
/// performed sets and a top-set progression.
pub fn seed(db: &Database) -> Result<Vec<Lift>> {
    let removed = db.delete_all_lifts()?;
    tracing::info!(removed, "Cleared lifts before seeding");

    let bench = db.create_lift(CreateLiftInput {
        name: "bench press".to_string(),
        equipment: Some(EquipmentKind::Barbell),
        top_set_progression: Some(sample_progression()),
        sets: vec![
            performed(250.0, 10),
            performed(230.0, 10),
            performed(210.0, 10),
        ],
        ..CreateLiftInput::default()
    })?;

    let deadlift = db.create_lift(CreateLiftInput {
        name: "deadlift".to_string(),
        equipment: Some(EquipmentKind::Barbell),
        top_set_progression: Some(sample_progression()),
        sets: vec![
            performed(400.0, 3),
            performed(350.0, 5),
            performed(210.0, 7),
        ],
        ..CreateLiftInput::default()
    })?;

    tracing::info!("Finished seeding lifts");
    Ok(vec![bench, deadlift])
}
