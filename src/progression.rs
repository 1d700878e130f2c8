//! Weight progression.
//!
//! [`next_weight`] moves a target weight up or down by a percentage, quantized to
//! the equipment's step, and never by less than one step. [`generate_next_lift`]
//! chains it to build the next session of a top-set progression: the top set
//! goes up by `percent_up`, then every following set drops by `percent_down`
//! from the one before it.

use crate::error::{Error, Result};
use crate::models::{CreateLiftInput, CreateSetInput, Lift, TopSetProgression};

/// Percentage used when a caller asks for a suggestion without choosing one.
pub const DEFAULT_PERCENT: f64 = 2.5;

/// Next target weight after moving `current` by `percent`, rounded to the
/// nearest multiple of `step`.
///
/// For `percent >= 0` the result is at least `current + step`, so a
/// progression always moves by a full step even when the percentage rounds
/// back to `current`. For `percent < 0` the result is capped at
/// `current + step`.
pub fn next_weight(current: f64, step: f64, percent: f64) -> Result<f64> {
    if !step.is_finite() || step <= 0.0 {
        return Err(Error::InvalidArgument(format!(
            "weight step must be positive, got {}",
            step
        )));
    }
    if !current.is_finite() || !percent.is_finite() {
        return Err(Error::InvalidArgument(format!(
            "cannot progress weight {} by {}%",
            current, percent
        )));
    }

    let min_jump = current + step;
    let raw = current + current * percent / 100.0;
    let stepped = (raw / step).round() * step;

    // Deloads are capped by `current + step` as well, not `current - step`.
    if percent >= 0.0 {
        Ok(min_jump.max(stepped))
    } else {
        Ok(min_jump.min(stepped))
    }
}

/// Whether `reps` were recorded and fall within `[min, max]`. Missing bounds
/// are open-ended; zero or missing reps never count.
pub fn in_rep_range(reps: Option<u32>, min: Option<u32>, max: Option<u32>) -> bool {
    match reps {
        None | Some(0) => false,
        Some(reps) => min.is_none_or(|min| reps >= min) && max.is_none_or(|max| reps <= max),
    }
}

/// Target weights for one session of a top-set progression, heaviest first.
///
/// `top` is the new top-set target. Each following set is derived from the
/// one before it, so the ladder is computed strictly in order.
pub fn top_set_targets(top: f64, step: f64, progression: &TopSetProgression) -> Result<Vec<f64>> {
    progression.validate()?;

    let mut targets = Vec::with_capacity(progression.num_sets as usize);
    let mut running = top;
    for i in 0..progression.num_sets {
        targets.push(running);
        if i + 1 < progression.num_sets {
            running = next_weight(running, step, -progression.percent_down)?;
        }
    }
    Ok(targets)
}

/// Build the lift that follows `last` in its top-set progression.
///
/// The new lift copies the name, load constraints, equipment and progression
/// settings of `last`. Its top set rises from the last top set's target by
/// `percent_up`; the rest descend from there. Nothing is persisted here.
pub fn generate_next_lift(last: &Lift) -> Result<CreateLiftInput> {
    let progression = last.top_set_progression.ok_or_else(|| {
        Error::InvalidState(format!("lift {} has no top-set progression", last.id))
    })?;
    let step = last.weight_step.ok_or_else(|| {
        Error::InvalidState(format!("lift {} has no weight step", last.id))
    })?;
    let top_set = last
        .top_set()
        .ok_or_else(|| Error::InvalidState(format!("lift {} has no sets", last.id)))?;
    let base = top_set
        .target_weight
        .or(progression.top_weight)
        .ok_or_else(|| {
            Error::InvalidState(format!("lift {} has no top set target weight", last.id))
        })?;

    let top = next_weight(base, step, progression.percent_up)?;
    let targets = top_set_targets(top, step, &progression)?;

    tracing::debug!(
        lift_id = %last.id,
        name = %last.name,
        base,
        ?targets,
        "generated next top-set lift"
    );

    Ok(CreateLiftInput {
        name: last.name.clone(),
        equipment: last.equipment,
        weight_min: last.weight_min,
        weight_max: last.weight_max,
        weight_step: Some(step),
        top_set_progression: Some(progression),
        sets: targets
            .into_iter()
            .map(CreateSetInput::with_target_weight)
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EquipmentKind, LiftSet};
    use chrono::Utc;
    use proptest::prelude::*;
    use uuid::Uuid;

    fn bench(top_target: Option<f64>, progression: Option<TopSetProgression>) -> Lift {
        let id = Uuid::new_v4();
        let sets = top_target
            .map(|w| {
                vec![LiftSet {
                    lift_id: id,
                    set_index: 0,
                    target_min_reps: None,
                    target_max_reps: None,
                    target_weight: Some(w),
                    reps: Some(10),
                    weight: Some(w),
                }]
            })
            .unwrap_or_default();
        Lift {
            id,
            name: "bench_press".to_string(),
            equipment: Some(EquipmentKind::Barbell),
            weight_min: Some(45.0),
            weight_max: None,
            weight_step: Some(5.0),
            top_set_progression: progression,
            previous_lift_id: None,
            sets,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn three_sets() -> TopSetProgression {
        TopSetProgression {
            num_sets: 3,
            top_weight: Some(250.0),
            percent_up: 5.0,
            percent_down: 10.0,
        }
    }

    #[test]
    fn minimum_jump_wins_for_small_percentages_with_step_of_five() {
        assert_eq!(next_weight(100.0, 5.0, 2.5).unwrap(), 105.0);
        assert_eq!(next_weight(200.0, 5.0, 2.5).unwrap(), 205.0);
        assert_eq!(next_weight(300.0, 5.0, 2.5).unwrap(), 310.0);
        assert_eq!(next_weight(400.0, 5.0, 2.5).unwrap(), 410.0);
    }

    #[test]
    fn minimum_jump_wins_for_small_percentages_with_step_of_ten() {
        assert_eq!(next_weight(40.0, 10.0, 2.5).unwrap(), 50.0);
        assert_eq!(next_weight(50.0, 10.0, 2.5).unwrap(), 60.0);
        assert_eq!(next_weight(100.0, 10.0, 2.5).unwrap(), 110.0);
        assert_eq!(next_weight(200.0, 10.0, 2.5).unwrap(), 210.0);
    }

    #[test]
    fn zero_percent_moves_up_one_step() {
        assert_eq!(next_weight(135.0, 5.0, 0.0).unwrap(), 140.0);
    }

    #[test]
    fn deload_rounds_to_nearest_step() {
        assert_eq!(next_weight(265.0, 5.0, -10.0).unwrap(), 240.0);
        assert_eq!(next_weight(240.0, 5.0, -10.0).unwrap(), 215.0);
    }

    #[test]
    fn deload_is_capped_by_current_plus_step() {
        // A tiny deload rounds back to the current weight, which is below the
        // `current + step` cap, so the weight stays put rather than dropping a step.
        assert_eq!(next_weight(100.0, 5.0, -1.0).unwrap(), 100.0);
        assert_eq!(next_weight(0.0, 5.0, -50.0).unwrap(), 0.0);
    }

    #[test]
    fn rejects_non_positive_step() {
        assert!(matches!(
            next_weight(100.0, 0.0, 2.5),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            next_weight(100.0, -5.0, 2.5),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn rejects_non_finite_inputs() {
        assert!(next_weight(f64::NAN, 5.0, 2.5).is_err());
        assert!(next_weight(100.0, 5.0, f64::INFINITY).is_err());
    }

    #[test]
    fn rep_range_checks() {
        assert!(in_rep_range(Some(10), Some(8), Some(12)));
        assert!(in_rep_range(Some(8), Some(8), Some(12)));
        assert!(in_rep_range(Some(12), Some(8), Some(12)));
        assert!(!in_rep_range(None, Some(8), Some(12)));
        assert!(!in_rep_range(Some(0), None, None));
        assert!(!in_rep_range(Some(14), Some(8), Some(12)));
        assert!(!in_rep_range(Some(6), Some(8), Some(12)));
    }

    #[test]
    fn top_set_targets_chain_each_set_from_the_previous() {
        let targets = top_set_targets(265.0, 5.0, &three_sets()).unwrap();
        assert_eq!(targets, vec![265.0, 240.0, 215.0]);
    }

    #[test]
    fn generates_next_lift_from_top_set() {
        let last = bench(Some(250.0), Some(three_sets()));
        let next = generate_next_lift(&last).unwrap();

        let top = next_weight(250.0, 5.0, 5.0).unwrap();
        let second = next_weight(top, 5.0, -10.0).unwrap();
        let third = next_weight(second, 5.0, -10.0).unwrap();
        let targets: Vec<_> = next.sets.iter().map(|s| s.target_weight).collect();

        assert_eq!(targets, vec![Some(top), Some(second), Some(third)]);
        assert_eq!(targets, vec![Some(265.0), Some(240.0), Some(215.0)]);
        assert_eq!(next.name, "bench_press");
        assert_eq!(next.weight_min, Some(45.0));
        assert_eq!(next.equipment, Some(EquipmentKind::Barbell));
        assert_eq!(next.top_set_progression, Some(three_sets()));
    }

    #[test]
    fn falls_back_to_configured_top_weight() {
        let mut last = bench(Some(250.0), Some(three_sets()));
        last.sets[0].target_weight = None;

        let next = generate_next_lift(&last).unwrap();
        assert_eq!(next.sets[0].target_weight, Some(265.0));
    }

    #[test]
    fn generation_requires_progression() {
        let last = bench(Some(250.0), None);
        assert!(matches!(
            generate_next_lift(&last),
            Err(Error::InvalidState(_))
        ));
    }

    #[test]
    fn generation_requires_sets() {
        let last = bench(None, Some(three_sets()));
        assert!(matches!(
            generate_next_lift(&last),
            Err(Error::InvalidState(_))
        ));
    }

    #[test]
    fn generation_requires_step() {
        let mut last = bench(Some(250.0), Some(three_sets()));
        last.weight_step = None;
        assert!(matches!(
            generate_next_lift(&last),
            Err(Error::InvalidState(_))
        ));
    }

    proptest! {
        #[test]
        fn progression_moves_at_least_one_step(
            multiple in 0u32..200,
            step in prop::sample::select(vec![1.0, 2.5, 5.0, 10.0]),
            percent in 0.0f64..50.0,
        ) {
            let current = multiple as f64 * step;
            let next = next_weight(current, step, percent).unwrap();
            prop_assert!(next >= current + step);
            prop_assert_eq!((next / step).fract(), 0.0);
        }

        #[test]
        fn deload_never_exceeds_current_plus_step(
            current in 0.0f64..1000.0,
            step in prop::sample::select(vec![1.0, 2.5, 5.0, 10.0]),
            percent in -90.0f64..-0.001,
        ) {
            let next = next_weight(current, step, percent).unwrap();
            prop_assert!(next <= current + step);
        }

        #[test]
        fn next_weight_is_monotonic_in_percent(
            multiple in 0u32..200,
            step in prop::sample::select(vec![2.5, 5.0, 10.0]),
            low in -50.0f64..50.0,
            delta in 0.0f64..50.0,
        ) {
            let current = multiple as f64 * step;
            let a = next_weight(current, step, low).unwrap();
            let b = next_weight(current, step, low + delta).unwrap();
            prop_assert!(a <= b);
        }
    }
}
