//! Domain models for liftlog.
//!
//! - [`Lift`]: a named exercise owning an ordered list of sets, optionally with a
//!   [`TopSetProgression`] describing how to generate the next session.
//! - [`LiftSet`]: one planned or performed set. Its `set_index` is assigned by the
//!   owning lift at append time and never reused.

mod lift;
mod set;

pub use lift::*;
pub use set::*;
