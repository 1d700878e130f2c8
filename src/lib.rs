//! liftlog: a workout tracking server.
//!
//! Lifts own ordered sets; a lift with a top-set progression can generate the
//! next session's lift with target weights derived from its own.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod models;
pub mod progression;
pub mod seed;
