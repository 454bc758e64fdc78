//! # View Registry
//!
//! Sole owner of every view. Three keyed collections:
//!
//! ```text
//! ┌────────────────── ViewRegistry ───────────────────┐
//! │  identity lock ─┬─ users  (Controlled)            │
//! │                 └─ npcs   (Autonomous)            │
//! │  space lock ────── space info (mark-and-sweep)    │
//! └───────────────────────────────────────────────────┘
//! ```
//!
//! ## Locking
//!
//! Both identity collections share one coarse lock. The frame driver holds it
//! for its whole update pass and every external create/destroy takes it for
//! the duration of the mutation, so a destroy lands wholly before or after a
//! pass. The space collection has its own lock, taken by position updates and
//! by the mark and sweep passes, so any number of feed threads may call
//! [`ViewRegistry::update_position`].
//!
//! Lookups hand out lock-scoped guards. Holding one blocks the frame driver;
//! drop it before the next tick.

use std::collections::HashMap;

use parking_lot::{MappedMutexGuard, Mutex, MutexGuard};
use tether_shared::Vec3;

use crate::error::{ViewError, ViewResult};
use crate::view::{
    EntityId, IdentityCategory, IdentityView, InputState, SpaceInfo, SpaceInfoView, SpaceProxy,
    ViewBackend,
};

type IdentityOf<B> = <B as ViewBackend>::Identity;
type SourceOf<B> = <IdentityOf<B> as IdentityView>::Source;

/// The identity-bound collections, guarded together.
pub(crate) struct IdentityViews<V> {
    users: HashMap<EntityId, V>,
    npcs: HashMap<EntityId, V>,
}

impl<V> IdentityViews<V> {
    fn new() -> Self {
        Self {
            users: HashMap::new(),
            npcs: HashMap::new(),
        }
    }

    fn of(&self, category: IdentityCategory) -> &HashMap<EntityId, V> {
        match category {
            IdentityCategory::Controlled => &self.users,
            IdentityCategory::Autonomous => &self.npcs,
        }
    }

    fn of_mut(&mut self, category: IdentityCategory) -> &mut HashMap<EntityId, V> {
        match category {
            IdentityCategory::Controlled => &mut self.users,
            IdentityCategory::Autonomous => &mut self.npcs,
        }
    }

    /// Every identity-bound view, controlled first.
    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut V> {
        self.users.values_mut().chain(self.npcs.values_mut())
    }
}

/// Result of a category-agnostic lookup.
pub enum ViewLookup<'a, V> {
    /// An identity-bound view, borrowed under the identity lock.
    Identity {
        /// Collection the id was found in.
        category: IdentityCategory,
        /// The view.
        view: MappedMutexGuard<'a, V>,
    },
    /// A space info view's state.
    Space(SpaceInfo),
}

/// Outcome of one reclamation step over the space collection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SpaceCycle {
    /// Views destroyed by the sweep.
    pub reclaimed: usize,
    /// Views flagged by the mark.
    pub marked: usize,
}

/// Registry of every live view.
///
/// `new` is the host's `init`; [`ViewRegistry::release`] tears everything
/// down. Share it with `Arc` between the frame driver and the network side.
pub struct ViewRegistry<B: ViewBackend> {
    backend: B,
    identity: Mutex<IdentityViews<B::Identity>>,
    space: Mutex<HashMap<EntityId, SpaceInfoView<B::Proxy>>>,
}

impl<B: ViewBackend> ViewRegistry<B> {
    /// Creates an empty registry over `backend`.
    #[must_use]
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            identity: Mutex::new(IdentityViews::new()),
            space: Mutex::new(HashMap::new()),
        }
    }

    /// The backend views are built from.
    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    // ------------------------------------------------------------------
    // Identity-bound views
    // ------------------------------------------------------------------

    /// Creates the view for `id` unless one exists.
    ///
    /// If the backend cannot resolve `id` the create is logged and skipped.
    pub fn create_identity_view(&self, category: IdentityCategory, id: EntityId) {
        let mut views = self.identity.lock();
        let slot = views.of_mut(category);
        if slot.contains_key(&id) {
            return;
        }

        match self.resolve(category, id) {
            Ok(source) => {
                slot.insert(id, B::Identity::create(id, source));
                tracing::debug!("Created {} view {}", category, id);
            }
            Err(err) => tracing::warn!("{}; create skipped", err),
        }
    }

    fn resolve(&self, category: IdentityCategory, id: EntityId) -> ViewResult<SourceOf<B>> {
        self.backend
            .resolve(category, id)
            .ok_or(ViewError::SourceUnavailable { category, id })
    }

    /// Creates the local player's own view and resets input once it exists.
    pub fn create_self_view(&self, id: EntityId, input: &impl InputState) {
        self.create_identity_view(IdentityCategory::Controlled, id);
        if self.contains_identity_view(IdentityCategory::Controlled, id) {
            input.reset();
        }
    }

    /// Tears down and removes the view for `id`. Absent ids are ignored.
    pub fn destroy_identity_view(&self, category: IdentityCategory, id: EntityId) {
        let mut views = self.identity.lock();
        if let Some(mut view) = views.of_mut(category).remove(&id) {
            view.destroy();
            tracing::debug!("Destroyed {} view {}", category, id);
        }
    }

    /// Borrows the view for `id` in one category.
    ///
    /// # Deadlocks
    ///
    /// The returned guard holds the identity lock, which is not re-entrant.
    /// Calling any other identity method on this thread while it is alive
    /// never returns.
    #[must_use]
    pub fn get_identity_view(
        &self,
        category: IdentityCategory,
        id: EntityId,
    ) -> Option<MappedMutexGuard<'_, B::Identity>> {
        MutexGuard::try_map(self.identity.lock(), |views| views.of_mut(category).get_mut(&id))
            .ok()
    }

    /// Borrows a controlled (user) view.
    ///
    /// # Deadlocks
    ///
    /// The returned guard holds the identity lock, which is not re-entrant.
    /// Calling any other identity method on this thread while it is alive
    /// never returns.
    #[must_use]
    pub fn user_view(&self, id: EntityId) -> Option<MappedMutexGuard<'_, B::Identity>> {
        self.get_identity_view(IdentityCategory::Controlled, id)
    }

    /// Borrows an autonomous (npc) view.
    ///
    /// # Deadlocks
    ///
    /// The returned guard holds the identity lock, which is not re-entrant.
    /// Calling any other identity method on this thread while it is alive
    /// never returns.
    #[must_use]
    pub fn npc_view(&self, id: EntityId) -> Option<MappedMutexGuard<'_, B::Identity>> {
        self.get_identity_view(IdentityCategory::Autonomous, id)
    }

    /// Whether `category` holds a view for `id`.
    #[must_use]
    pub fn contains_identity_view(&self, category: IdentityCategory, id: EntityId) -> bool {
        self.identity.lock().of(category).contains_key(&id)
    }

    /// Finds `id` in whichever collection holds it.
    ///
    /// Searches [`IdentityCategory::LOOKUP_ORDER`], then the space views.
    ///
    /// # Deadlocks
    ///
    /// An [`ViewLookup::Identity`] result holds the identity lock, which is
    /// not re-entrant. Drop it before calling any other identity method on
    /// this thread.
    #[must_use]
    pub fn get_view_by_id(&self, id: EntityId) -> Option<ViewLookup<'_, B::Identity>> {
        let views = self.identity.lock();
        let found = IdentityCategory::LOOKUP_ORDER
            .into_iter()
            .find(|category| views.of(*category).contains_key(&id));

        match found {
            Some(category) => {
                MutexGuard::try_map(views, |views| views.of_mut(category).get_mut(&id))
                    .ok()
                    .map(|view| ViewLookup::Identity { category, view })
            }
            None => {
                drop(views);
                self.space_view(id).map(ViewLookup::Space)
            }
        }
    }

    /// Visibility of the identity-bound view for `id`; `false` if none.
    #[must_use]
    pub fn is_visible(&self, id: EntityId) -> bool {
        let views = self.identity.lock();
        IdentityCategory::LOOKUP_ORDER
            .into_iter()
            .find_map(|category| views.of(category).get(&id))
            .is_some_and(|view| view.is_visible())
    }

    /// Number of views in one identity category.
    #[must_use]
    pub fn identity_len(&self, category: IdentityCategory) -> usize {
        self.identity.lock().of(category).len()
    }

    /// Takes the identity lock for a frame update pass.
    pub(crate) fn lock_identity(&self) -> MutexGuard<'_, IdentityViews<B::Identity>> {
        self.identity.lock()
    }

    // ------------------------------------------------------------------
    // Space info views
    // ------------------------------------------------------------------

    /// Applies one position report from the feed.
    ///
    /// Creates the view on first sight. Either way the view leaves this call
    /// unmarked.
    pub fn update_position(
        &self,
        id: EntityId,
        is_player: bool,
        x: f32,
        y: f32,
        z: f32,
        heading: f32,
    ) {
        let mut space = self.space.lock();
        let view = space.entry(id).or_insert_with(|| {
            tracing::debug!("Created space view {} (player: {})", id, is_player);
            SpaceInfoView::new(id, is_player, self.backend.spawn_proxy(id, is_player))
        });
        view.apply(Vec3::new(x, y, z), heading);
    }

    /// State of the space view for `id`.
    #[must_use]
    pub fn space_view(&self, id: EntityId) -> Option<SpaceInfo> {
        self.space.lock().get(&id).map(SpaceInfoView::info)
    }

    /// Number of live space views.
    #[must_use]
    pub fn space_len(&self) -> usize {
        self.space.lock().len()
    }

    /// Flags every space view for destruction. Returns how many were flagged.
    pub fn mark_space_views(&self) -> usize {
        mark(&mut self.space.lock())
    }

    /// Destroys every space view still flagged. Returns how many went.
    pub fn sweep_space_views(&self) -> usize {
        sweep(&mut self.space.lock())
    }

    /// Sweeps (when `sweep_first` is set) then marks, under a single lock hold so no
    /// position update lands between the two.
    pub fn cycle_space_views(&self, sweep_first: bool) -> SpaceCycle {
        let mut space = self.space.lock();
        let reclaimed = if sweep_first { sweep(&mut space) } else { 0 };
        SpaceCycle {
            reclaimed,
            marked: mark(&mut space),
        }
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Tears down every view. The registry stays usable afterwards.
    pub fn release(&self) {
        let released_identity = {
            let mut views = self.identity.lock();
            let mut count = 0;
            for category in IdentityCategory::LOOKUP_ORDER {
                for (_, mut view) in views.of_mut(category).drain() {
                    view.destroy();
                    count += 1;
                }
            }
            count
        };

        let released_space = {
            let mut space = self.space.lock();
            let count = space.len();
            for (_, view) in space.drain() {
                view.destroy();
            }
            count
        };

        tracing::info!(
            "Released {} identity views and {} space views",
            released_identity,
            released_space
        );
    }
}

fn mark<P>(space: &mut HashMap<EntityId, SpaceInfoView<P>>) -> usize
where
    P: SpaceProxy,
{
    for view in space.values_mut() {
        view.mark();
    }
    space.len()
}

fn sweep<P>(space: &mut HashMap<EntityId, SpaceInfoView<P>>) -> usize
where
    P: SpaceProxy,
{
    let pending: Vec<EntityId> = space
        .iter()
        .filter(|(_, view)| view.needs_destroy())
        .map(|(id, _)| *id)
        .collect();

    for id in &pending {
        if let Some(view) = space.remove(id) {
            view.destroy();
        }
    }

    if !pending.is_empty() {
        tracing::debug!("Reclaimed {} silent space views", pending.len());
    }
    pending.len()
}
