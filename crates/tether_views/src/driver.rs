//! # Frame Driver
//!
//! Called exactly once per simulation tick by the host runtime, always from
//! the same thread.
//!
//! ```text
//! tick()
//!   ├─ 1. lock identity views ── update each (failures logged, skipped)
//!   ├─ 2. unlock
//!   └─ 3. space views (if any, and reclamation on):
//!           sweep what the last window left flagged, then mark for the next
//! ```
//!
//! ## Reclamation Windows
//!
//! Position updates arrive on other threads *between* ticks. A tick therefore
//! closes the window opened by the previous tick (sweep) and opens the next
//! one (mark). An entity silent for a whole window is destroyed; one reported
//! at least once per window lives on.
//!
//! With reclamation off (debug inspection) neither pass runs, and the first
//! tick after turning it back on only marks. Views idle during inspection are
//! never swept on the strength of a mark from before it.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crate::config::ViewConfig;
use crate::error::ViewError;
use crate::registry::ViewRegistry;
use crate::view::{IdentityView, ViewBackend};

/// Statistics from one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Tick number, starting at 1.
    pub frame: u64,
    /// Identity-bound views updated successfully.
    pub views_updated: u32,
    /// Identity-bound views whose update failed this tick.
    pub update_failures: u32,
    /// Space views destroyed by the sweep.
    pub space_views_reclaimed: u32,
    /// Space views flagged for the next window.
    pub space_views_marked: u32,
}

/// Drives a [`ViewRegistry`] once per tick.
pub struct FrameDriver<B: ViewBackend> {
    registry: Arc<ViewRegistry<B>>,
    reclaim_enabled: bool,
    /// A mark is outstanding, so the next reclaim may sweep.
    window_open: bool,
    frame: u64,
    stats: FrameStats,
}

impl<B: ViewBackend> FrameDriver<B> {
    /// Creates a driver for `registry`.
    #[must_use]
    pub fn new(registry: Arc<ViewRegistry<B>>, config: &ViewConfig) -> Self {
        Self {
            registry,
            reclaim_enabled: config.reclaim_enabled,
            window_open: false,
            frame: 0,
            stats: FrameStats::default(),
        }
    }

    /// The driven registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<ViewRegistry<B>> {
        &self.registry
    }

    /// Turns space view reclamation on or off (off = debug inspection).
    pub fn set_reclaim_enabled(&mut self, enabled: bool) {
        if enabled != self.reclaim_enabled {
            let state = if enabled { "enabled" } else { "disabled" };
            tracing::info!("Space view reclamation {}", state);
        }
        self.reclaim_enabled = enabled;
        if !enabled {
            self.window_open = false;
        }
    }

    /// Whether space views are being reclaimed.
    #[must_use]
    pub fn reclaim_enabled(&self) -> bool {
        self.reclaim_enabled
    }

    /// Runs one tick.
    pub fn tick(&mut self) -> FrameStats {
        self.frame += 1;

        let (views_updated, update_failures) = self.update_identity_views();
        let (space_views_reclaimed, space_views_marked) = self.reclaim_space_views();

        self.stats = FrameStats {
            frame: self.frame,
            views_updated,
            update_failures,
            space_views_reclaimed,
            space_views_marked,
        };
        self.stats
    }

    /// Updates every identity-bound view under the identity lock.
    fn update_identity_views(&self) -> (u32, u32) {
        let mut views = self.registry.lock_identity();
        let mut updated = 0;
        let mut failed = 0;

        for view in views.iter_mut() {
            let id = view.id();
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| view.update()))
                .unwrap_or_else(|payload| {
                    Err(ViewError::UpdateFailed {
                        id,
                        reason: panic_reason(&*payload),
                    })
                });

            match outcome {
                Ok(()) => updated += 1,
                Err(err) => {
                    failed += 1;
                    tracing::error!("Frame {}: {}", self.frame, err);
                }
            }
        }

        (updated, failed)
    }

    fn reclaim_space_views(&mut self) -> (u32, u32) {
        if !self.reclaim_enabled || self.registry.space_len() == 0 {
            return (0, 0);
        }

        let cycle = self.registry.cycle_space_views(self.window_open);
        self.window_open = true;
        (saturate(cycle.reclaimed), saturate(cycle.marked))
    }

    /// Statistics from the last tick.
    #[must_use]
    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    /// Number of ticks run so far.
    #[must_use]
    pub fn frame(&self) -> u64 {
        self.frame
    }
}

fn saturate(count: usize) -> u32 {
    u32::try_from(count).unwrap_or(u32::MAX)
}

fn panic_reason(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("panicked: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("panicked: {message}")
    } else {
        "panicked".to_string()
    }
}
