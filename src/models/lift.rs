use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::set::{CreateSetInput, LiftSet};
use crate::error::{Error, Result};

/// A named exercise with an ordered list of sets.
///
/// Lifts generated by a top-set progression keep their source's name and point
/// back at it through `previous_lift_id`, so one exercise's training history is
/// a chain of lifts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lift {
    pub id: Uuid,
    /// Normalized name, e.g. `bench_press`.
    pub name: String,
    pub equipment: Option<EquipmentKind>,
    /// Lightest load that can be used. Dumbbells only go so small, barbells
    /// only get so light.
    pub weight_min: Option<f64>,
    /// Heaviest load. Free weights usually have none, cable machines do.
    pub weight_max: Option<f64>,
    /// Smallest amount the load can move by.
    pub weight_step: Option<f64>,
    pub top_set_progression: Option<TopSetProgression>,
    pub previous_lift_id: Option<Uuid>,
    /// Ordered by `set_index`.
    pub sets: Vec<LiftSet>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Lift {
    /// The first set, which top-set progressions treat as the heaviest.
    pub fn top_set(&self) -> Option<&LiftSet> {
        self.sets.first()
    }

    /// Merge a partial update into this lift and re-validate the result.
    ///
    /// When the equipment kind changes, load settings the update leaves out
    /// follow the new kind's defaults unless they were customized away from
    /// the old kind's defaults.
    pub fn apply_update(&mut self, input: UpdateLiftInput) -> Result<()> {
        if let Some(name) = input.name {
            self.name = name;
        }
        if let Some(equipment) = input.equipment {
            if self.equipment != Some(equipment) {
                let old = self.equipment.map(|kind| kind.defaults());
                let new = equipment.defaults();
                rebase_default(
                    &mut self.weight_min,
                    old.and_then(|d| d.weight_min),
                    new.weight_min,
                );
                rebase_default(
                    &mut self.weight_max,
                    old.and_then(|d| d.weight_max),
                    new.weight_max,
                );
                rebase_default(
                    &mut self.weight_step,
                    old.and_then(|d| d.weight_step),
                    new.weight_step,
                );
            }
            self.equipment = Some(equipment);
        }
        self.weight_min = input.weight_min.or(self.weight_min);
        self.weight_max = input.weight_max.or(self.weight_max);
        self.weight_step = input.weight_step.or(self.weight_step);
        if let Some(progression) = input.top_set_progression {
            self.top_set_progression = Some(progression);
        }

        self.name = normalize_name(&self.name);
        fill_equipment_defaults(
            self.equipment,
            &mut self.weight_min,
            &mut self.weight_max,
            &mut self.weight_step,
        );
        validate_settings(
            &self.name,
            self.weight_min,
            self.weight_max,
            self.weight_step,
            self.top_set_progression.as_ref(),
        )
    }
}

/// The kind of equipment a lift is loaded on.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EquipmentKind {
    Dumbbell,
    Barbell,
    /// Stack machines where a pin selects the load. Plates are usually 10 each.
    CableMachine,
}

/// Load constraints implied by an [`EquipmentKind`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadDefaults {
    pub weight_min: Option<f64>,
    pub weight_max: Option<f64>,
    pub weight_step: Option<f64>,
}

impl EquipmentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dumbbell => "dumbbell",
            Self::Barbell => "barbell",
            Self::CableMachine => "cable_machine",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "dumbbell" => Some(Self::Dumbbell),
            "barbell" => Some(Self::Barbell),
            "cable_machine" => Some(Self::CableMachine),
            _ => None,
        }
    }

    pub fn defaults(&self) -> LoadDefaults {
        match self {
            Self::Barbell => LoadDefaults {
                weight_min: Some(45.0),
                weight_max: None,
                weight_step: Some(5.0),
            },
            Self::Dumbbell => LoadDefaults {
                weight_min: Some(5.0),
                weight_max: Some(150.0),
                weight_step: Some(5.0),
            },
            Self::CableMachine => LoadDefaults {
                weight_min: None,
                weight_max: None,
                weight_step: Some(10.0),
            },
        }
    }
}

/// Most sets a top-set progression may generate for one lift.
pub const MAX_SETS: u32 = 100;

/// Top-set progression settings.
///
/// The first set of a lift is the heaviest. Each following set drops by
/// `percent_down` until there are `num_sets` sets. The next lift's top set
/// rises by `percent_up`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TopSetProgression {
    pub num_sets: u32,
    /// Top weight to start from when the top set has no target of its own.
    pub top_weight: Option<f64>,
    pub percent_up: f64,
    pub percent_down: f64,
}

impl TopSetProgression {
    pub fn validate(&self) -> Result<()> {
        if self.num_sets == 0 {
            return Err(Error::InvalidArgument(
                "top-set progression needs at least one set".to_string(),
            ));
        }
        if self.num_sets > MAX_SETS {
            return Err(Error::InvalidArgument(format!(
                "top-set progression allows at most {} sets",
                MAX_SETS
            )));
        }
        if !self.percent_up.is_finite() || !self.percent_down.is_finite() {
            return Err(Error::InvalidArgument(
                "top-set progression percentages must be finite".to_string(),
            ));
        }
        if self.percent_down < 0.0 {
            return Err(Error::InvalidArgument(
                "percent_down must not be negative".to_string(),
            ));
        }
        if let Some(top) = self.top_weight {
            if !top.is_finite() || top < 0.0 {
                return Err(Error::InvalidArgument(
                    "top_weight must be a non-negative number".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Input for creating a new lift, optionally with an initial batch of sets.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateLiftInput {
    pub name: String,
    pub equipment: Option<EquipmentKind>,
    pub weight_min: Option<f64>,
    pub weight_max: Option<f64>,
    pub weight_step: Option<f64>,
    pub top_set_progression: Option<TopSetProgression>,
    /// Indexes are assigned in order; callers cannot choose them.
    #[serde(default)]
    pub sets: Vec<CreateSetInput>,
}

impl CreateLiftInput {
    /// Normalize the name, fill in equipment defaults and check invariants.
    pub fn prepare(mut self) -> Result<Self> {
        self.name = normalize_name(&self.name);
        fill_equipment_defaults(
            self.equipment,
            &mut self.weight_min,
            &mut self.weight_max,
            &mut self.weight_step,
        );
        validate_settings(
            &self.name,
            self.weight_min,
            self.weight_max,
            self.weight_step,
            self.top_set_progression.as_ref(),
        )?;
        Ok(self)
    }
}

/// Input for updating a lift. All fields are optional for partial updates.
/// Sets are managed through their own operations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateLiftInput {
    pub name: Option<String>,
    pub equipment: Option<EquipmentKind>,
    pub weight_min: Option<f64>,
    pub weight_max: Option<f64>,
    pub weight_step: Option<f64>,
    pub top_set_progression: Option<TopSetProgression>,
}

/// Lowercase the name and replace each whitespace character with `_`,
/// so "Bench Press" becomes `bench_press`.
pub fn normalize_name(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect()
}

fn fill_equipment_defaults(
    equipment: Option<EquipmentKind>,
    weight_min: &mut Option<f64>,
    weight_max: &mut Option<f64>,
    weight_step: &mut Option<f64>,
) {
    let Some(equipment) = equipment else {
        return;
    };
    let defaults = equipment.defaults();
    *weight_min = weight_min.or(defaults.weight_min);
    *weight_max = weight_max.or(defaults.weight_max);
    *weight_step = weight_step.or(defaults.weight_step);
}

/// Swap a setting still at the old equipment default for the new default.
fn rebase_default(value: &mut Option<f64>, old: Option<f64>, new: Option<f64>) {
    if *value == old {
        *value = new;
    }
}

fn validate_settings(
    name: &str,
    weight_min: Option<f64>,
    weight_max: Option<f64>,
    weight_step: Option<f64>,
    progression: Option<&TopSetProgression>,
) -> Result<()> {
    if name.is_empty() {
        return Err(Error::InvalidArgument("lift name is required".to_string()));
    }
    if let Some(step) = weight_step {
        if !step.is_finite() || step <= 0.0 {
            return Err(Error::InvalidArgument(format!(
                "weight_step must be positive, got {}",
                step
            )));
        }
    }
    if let (Some(min), Some(max)) = (weight_min, weight_max) {
        if min > max {
            return Err(Error::InvalidArgument(format!(
                "weight_min {} exceeds weight_max {}",
                min, max
            )));
        }
    }
    if let Some(progression) = progression {
        progression.validate()?;
    }
    Ok(())
}
