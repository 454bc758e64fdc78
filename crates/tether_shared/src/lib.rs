//! # Tether Shared
//!
//! Plain data used by both the view registry and the position feed.
//!
//! ## Rule
//!
//! This crate must NEVER depend on locking primitives or scene types.
//! If a type needs either, it belongs in `tether_views`.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod constants;
pub mod math;

pub use constants::{ARRIVAL_TOLERANCE, DEFAULT_PREDICT_MOVE_CORRECTION, TICK_RATE};
pub use math::{Vec2, Vec3};
