//! # Tether Views
//!
//! Per-frame registry that keeps scene views in step with remote simulation
//! entities and reclaims views whose entities have gone.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐  create/destroy   ┌──────────────────────────────┐
//! │ network side │ ────────────────→ │         ViewRegistry         │
//! │ (any thread) │  update_position  │  identity lock: users, npcs  │
//! └──────────────┘ ────────────────→ │  space lock:    space info   │
//!                                    └──────────────▲───────────────┘
//!                                                   │ tick()
//!                                          ┌────────┴────────┐
//!                                          │   FrameDriver   │
//!                                          │  (view thread)  │
//!                                          └─────────────────┘
//! ```
//!
//! ## Rules
//!
//! 1. **Nothing is fatal** - a missing or failing view is logged and skipped
//! 2. **One lock per pass** - identity updates never interleave with a create
//!    or destroy
//! 3. **No delete events for space views** - silence for a whole window is
//!    the only death signal
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tether_views::{FrameDriver, ViewConfig, ViewRegistry};
//!
//! let config = ViewConfig::load("config/views.toml")?;
//! let registry = Arc::new(ViewRegistry::new(backend));
//! let mut driver = FrameDriver::new(Arc::clone(&registry), &config);
//!
//! // network thread
//! registry.update_position(id, false, x, y, z, heading);
//!
//! // sim thread, once per tick
//! let stats = driver.tick();
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod driver;
pub mod error;
pub mod geometry;
pub mod registry;
pub mod view;

pub use config::ViewConfig;
pub use driver::{FrameDriver, FrameStats};
pub use error::{ViewError, ViewResult};
pub use geometry::{is_at_position, predict_move_duration, MovementSnapshot, MovementState};
pub use registry::{SpaceCycle, ViewLookup, ViewRegistry};
pub use view::{
    EntityId, IdentityCategory, IdentityView, InputState, SpaceInfo, SpaceProxy, ViewBackend,
};
