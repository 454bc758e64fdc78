//! # View Capabilities
//!
//! What the registry needs from the scene side, expressed as traits the host
//! implements:
//!
//! ```text
//! Registry calls:              Host implements:
//! ┌─────────────────────┐      ┌─────────────────────────────┐
//! │ create / update /   │ ───→ │ IdentityView (user, npc)    │
//! │ destroy             │      │ SpaceProxy (space info)     │
//! │ resolve / spawn     │ ───→ │ ViewBackend (world data)     │
//! └─────────────────────┘      └─────────────────────────────┘
//! ```

use std::fmt;

use tether_shared::Vec3;

use crate::error::ViewResult;

/// Identifier of a remote simulation entity.
pub type EntityId = u32;

/// The two identity-bound view collections.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IdentityCategory {
    /// Self- or other-player-controlled entities.
    Controlled,
    /// Autonomous entities (npcs).
    Autonomous,
}

impl IdentityCategory {
    /// Order in which category-agnostic lookups search the collections.
    pub const LOOKUP_ORDER: [Self; 2] = [Self::Controlled, Self::Autonomous];
}

impl fmt::Display for IdentityCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Controlled => "controlled",
            Self::Autonomous => "autonomous",
        })
    }
}

/// A view tied to a persistent entity id with explicit create and destroy.
pub trait IdentityView: Send + Sized {
    /// Entity data the view is built from.
    type Source;

    /// Builds the view and its scene representation.
    fn create(id: EntityId, source: Self::Source) -> Self;

    /// The entity this view shows.
    fn id(&self) -> EntityId;

    /// Pushes the latest simulation state into the scene. Called once per
    /// tick under the identity lock.
    ///
    /// # Errors
    ///
    /// Any error is logged by the frame driver and skipped for this tick.
    ///
    /// # Deadlocks
    ///
    /// Runs with the identity lock held, and that lock is not re-entrant.
    /// Calling back into the registry's identity methods (`is_visible`,
    /// lookups, create, destroy) from here hangs the frame driver.
    fn update(&mut self) -> ViewResult<()>;

    /// Releases the scene representation.
    fn destroy(&mut self);

    /// Whether the scene representation is currently shown.
    fn is_visible(&self) -> bool;
}

/// Scene resource behind an ephemeral position view.
pub trait SpaceProxy: Send {
    /// Moves the proxy to the latest reported position.
    fn place(&mut self, position: Vec3, heading: f32);

    /// Releases the proxy.
    fn despawn(&mut self);
}

/// World data provider and scene factory the registry builds views from.
pub trait ViewBackend: Send + Sync {
    /// View type for both identity-bound categories.
    type Identity: IdentityView;
    /// Proxy type for space info views.
    type Proxy: SpaceProxy;

    /// Looks up the entity data for a create.
    ///
    /// Must be cheap and must tolerate ids that were just deleted.
    fn resolve(
        &self,
        category: IdentityCategory,
        id: EntityId,
    ) -> Option<<Self::Identity as IdentityView>::Source>;

    /// Spawns the proxy for a newly seen space info id.
    fn spawn_proxy(&self, id: EntityId, is_player: bool) -> Self::Proxy;
}

/// Local input state, reset when the player's own view appears.
pub trait InputState {
    /// Drops any held input so the new view starts idle.
    fn reset(&self);
}

/// Copy of a space info view's state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpaceInfo {
    /// Entity id.
    pub id: EntityId,
    /// Player or non-player role, fixed at creation.
    pub is_player: bool,
    /// Last reported position.
    pub position: Vec3,
    /// Last reported heading in radians.
    pub heading: f32,
    /// Set by a mark pass, cleared by an update.
    pub needs_destroy: bool,
}

/// Ephemeral view whose existence is inferred from the position feed.
pub(crate) struct SpaceInfoView<P> {
    info: SpaceInfo,
    proxy: P,
}

impl<P: SpaceProxy> SpaceInfoView<P> {
    pub(crate) fn new(id: EntityId, is_player: bool, proxy: P) -> Self {
        Self {
            info: SpaceInfo {
                id,
                is_player,
                position: Vec3::ZERO,
                heading: 0.0,
                needs_destroy: false,
            },
            proxy,
        }
    }

    pub(crate) fn info(&self) -> SpaceInfo {
        self.info
    }

    pub(crate) fn needs_destroy(&self) -> bool {
        self.info.needs_destroy
    }

    pub(crate) fn mark(&mut self) {
        self.info.needs_destroy = true;
    }

    pub(crate) fn apply(&mut self, position: Vec3, heading: f32) {
        self.info.needs_destroy = false;
        self.info.position = position;
        self.info.heading = heading;
        self.proxy.place(position, heading);
    }

    pub(crate) fn destroy(mut self) {
        self.proxy.despawn();
    }
}
