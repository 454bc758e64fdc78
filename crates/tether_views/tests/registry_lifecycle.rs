//! # Registry Lifecycle Tests
//!
//! Create / lookup / destroy semantics of the identity-bound categories.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tether_shared::Vec3;
use tether_views::{
    EntityId, IdentityCategory, IdentityView, SpaceProxy, ViewBackend, ViewLookup, ViewRegistry,
    ViewResult,
};

/// Counts teardowns so tests can see resources released.
#[derive(Default)]
struct Ledger {
    destroyed: AtomicUsize,
}

struct ActorView {
    id: EntityId,
    name: String,
    ledger: Arc<Ledger>,
}

impl IdentityView for ActorView {
    type Source = (String, Arc<Ledger>);

    fn create(id: EntityId, (name, ledger): Self::Source) -> Self {
        Self { id, name, ledger }
    }

    fn id(&self) -> EntityId {
        self.id
    }

    fn update(&mut self) -> ViewResult<()> {
        Ok(())
    }

    fn destroy(&mut self) {
        self.ledger.destroyed.fetch_add(1, Ordering::SeqCst);
    }

    fn is_visible(&self) -> bool {
        true
    }
}

struct NoProxy;

impl SpaceProxy for NoProxy {
    fn place(&mut self, _position: Vec3, _heading: f32) {}
    fn despawn(&mut self) {}
}

/// World data: only ids on the roster resolve.
struct World {
    roster: Mutex<HashSet<EntityId>>,
    ledger: Arc<Ledger>,
}

impl World {
    fn with(ids: &[EntityId]) -> Self {
        Self {
            roster: Mutex::new(ids.iter().copied().collect()),
            ledger: Arc::new(Ledger::default()),
        }
    }
}

impl ViewBackend for World {
    type Identity = ActorView;
    type Proxy = NoProxy;

    fn resolve(&self, category: IdentityCategory, id: EntityId) -> Option<(String, Arc<Ledger>)> {
        self.roster
            .lock()
            .contains(&id)
            .then(|| (format!("{category}-{id}"), Arc::clone(&self.ledger)))
    }

    fn spawn_proxy(&self, _id: EntityId, _is_player: bool) -> NoProxy {
        NoProxy
    }
}

const CATEGORIES: [IdentityCategory; 2] = [
    IdentityCategory::Controlled,
    IdentityCategory::Autonomous,
];

#[test]
fn test_create_then_get() {
    let registry = ViewRegistry::new(World::with(&[1, 2, 3]));

    for category in CATEGORIES {
        for id in [1, 2, 3] {
            registry.create_identity_view(category, id);
            let view = registry
                .get_identity_view(category, id)
                .expect("view was created");
            assert_eq!(view.id(), id);
        }
        assert_eq!(registry.identity_len(category), 3);
    }
}

#[test]
fn test_duplicate_create_is_noop() {
    let registry = ViewRegistry::new(World::with(&[7]));
    registry.create_identity_view(IdentityCategory::Controlled, 7);
    let first_name = registry.user_view(7).unwrap().name.clone();

    registry.create_identity_view(IdentityCategory::Controlled, 7);

    assert_eq!(registry.identity_len(IdentityCategory::Controlled), 1);
    assert_eq!(registry.user_view(7).unwrap().name, first_name);
    assert_eq!(registry.backend().ledger.destroyed.load(Ordering::SeqCst), 0);
}

#[test]
fn test_same_id_in_both_categories() {
    let registry = ViewRegistry::new(World::with(&[5]));
    registry.create_identity_view(IdentityCategory::Controlled, 5);
    registry.create_identity_view(IdentityCategory::Autonomous, 5);

    assert_eq!(registry.user_view(5).unwrap().name, "controlled-5");
    assert_eq!(registry.npc_view(5).unwrap().name, "autonomous-5");
}

#[test]
fn test_unresolvable_source_is_skipped() {
    let registry = ViewRegistry::new(World::with(&[1]));

    registry.create_identity_view(IdentityCategory::Autonomous, 99);

    assert!(registry.npc_view(99).is_none());
    assert_eq!(registry.identity_len(IdentityCategory::Autonomous), 0);
    assert!(!registry.is_visible(99));
}

#[test]
fn test_entity_leaving_before_create() {
    let registry = ViewRegistry::new(World::with(&[4]));
    registry.backend().roster.lock().remove(&4);

    registry.create_identity_view(IdentityCategory::Controlled, 4);
    assert!(registry.user_view(4).is_none());
}

#[test]
fn test_destroy_then_get() {
    let registry = ViewRegistry::new(World::with(&[1, 2]));
    for category in CATEGORIES {
        registry.create_identity_view(category, 1);
        registry.create_identity_view(category, 2);

        registry.destroy_identity_view(category, 1);

        assert!(registry.get_identity_view(category, 1).is_none());
        assert!(registry.get_identity_view(category, 2).is_some());
    }
    assert_eq!(registry.backend().ledger.destroyed.load(Ordering::SeqCst), 2);
}

#[test]
fn test_double_destroy_is_idempotent() {
    let registry = ViewRegistry::new(World::with(&[3]));
    registry.create_identity_view(IdentityCategory::Autonomous, 3);

    registry.destroy_identity_view(IdentityCategory::Autonomous, 3);
    registry.destroy_identity_view(IdentityCategory::Autonomous, 3);
    registry.destroy_identity_view(IdentityCategory::Controlled, 3);
    registry.destroy_identity_view(IdentityCategory::Autonomous, 404);

    assert_eq!(registry.backend().ledger.destroyed.load(Ordering::SeqCst), 1);
    assert_eq!(registry.identity_len(IdentityCategory::Autonomous), 0);
}

#[test]
fn test_category_agnostic_lookup() {
    let registry = ViewRegistry::new(World::with(&[1, 2]));
    registry.create_identity_view(IdentityCategory::Autonomous, 2);
    registry.update_position(3, true, 0.0, 0.0, 0.0, 1.5);

    assert!(matches!(
        registry.get_view_by_id(2),
        Some(ViewLookup::Identity {
            category: IdentityCategory::Autonomous,
            ..
        })
    ));
    assert!(matches!(
        registry.get_view_by_id(3),
        Some(ViewLookup::Space(info)) if info.is_player && info.heading == 1.5
    ));
    assert!(registry.get_view_by_id(1).is_none());
}

#[test]
fn test_release_tears_down_views() {
    let registry = ViewRegistry::new(World::with(&[1, 2, 3]));
    for id in [1, 2, 3] {
        registry.create_identity_view(IdentityCategory::Controlled, id);
    }
    registry.create_identity_view(IdentityCategory::Autonomous, 1);

    registry.release();
    registry.release();

    assert_eq!(registry.backend().ledger.destroyed.load(Ordering::SeqCst), 4);
    assert!(registry.get_view_by_id(1).is_none());
}
