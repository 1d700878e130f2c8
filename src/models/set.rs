use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::progression;

/// One planned or performed set within a [`Lift`](super::Lift).
///
/// Sets are owned by exactly one lift. `lift_id` is a plain back-reference;
/// anything that needs the owner's step size receives it explicitly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiftSet {
    pub lift_id: Uuid,
    /// Position within the lift, assigned at append time and never reused.
    pub set_index: u32,
    pub target_min_reps: Option<u32>,
    pub target_max_reps: Option<u32>,
    /// Prescribed load.
    pub target_weight: Option<f64>,
    /// Reps actually performed.
    pub reps: Option<u32>,
    /// Load actually used.
    pub weight: Option<f64>,
}

impl LiftSet {
    /// True when reps were recorded and fall inside the target rep range.
    pub fn in_rep_range(&self) -> bool {
        progression::in_rep_range(self.reps, self.target_min_reps, self.target_max_reps)
    }
}

/// Input for appending a set. The index is always assigned by the owning lift.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateSetInput {
    pub target_min_reps: Option<u32>,
    pub target_max_reps: Option<u32>,
    pub target_weight: Option<f64>,
    pub reps: Option<u32>,
    pub weight: Option<f64>,
}

impl CreateSetInput {
    pub fn with_target_weight(weight: f64) -> Self {
        Self {
            target_weight: Some(weight),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        check_weight("target_weight", self.target_weight)?;
        check_weight("weight", self.weight)?;
        if let (Some(min), Some(max)) = (self.target_min_reps, self.target_max_reps) {
            if min > max {
                return Err(Error::InvalidArgument(format!(
                    "target_min_reps {} exceeds target_max_reps {}",
                    min, max
                )));
            }
        }
        Ok(())
    }
}

/// Actual performance recorded against an existing set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordSetInput {
    pub reps: Option<u32>,
    pub weight: Option<f64>,
}

impl RecordSetInput {
    pub fn validate(&self) -> Result<()> {
        check_weight("weight", self.weight)
    }
}

fn check_weight(field: &str, weight: Option<f64>) -> Result<()> {
    match weight {
        Some(w) if !w.is_finite() || w < 0.0 => Err(Error::InvalidArgument(format!(
            "{} must be a non-negative number, got {}",
            field, w
        ))),
        _ => Ok(()),
    }
}
