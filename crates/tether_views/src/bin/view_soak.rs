//! # View Soak
//!
//! Runs a registry the way the client does: a feed thread creates and
//! destroys npcs and streams positions for a sliding area-of-interest window
//! while the main thread ticks the frame driver.
//!
//! Usage: `view_soak [config.toml] [frames]`
//!
//! Build with `--features soak`.
//!
//! Log level follows `RUST_LOG` (default `info`).

use std::collections::HashSet;
use std::error::Error;
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use crossbeam_channel::bounded;
use parking_lot::RwLock;
use tether_shared::Vec3;
use tether_views::{
    EntityId, FrameDriver, IdentityCategory, IdentityView, SpaceProxy, ViewBackend, ViewConfig,
    ViewError, ViewRegistry, ViewResult,
};
use tracing_subscriber::filter::{EnvFilter, LevelFilter};

/// Space ids in the area-of-interest window at any time.
const AOI_WINDOW: u32 = 50;
/// Frames between npc spawns.
const SPAWN_EVERY: u64 = 30;
/// How many npcs stay alive at once.
const NPC_LIFETIME: u32 = 5;

type Roster = Arc<RwLock<HashSet<EntityId>>>;

struct NpcView {
    id: EntityId,
    roster: Roster,
    frames: u64,
}

impl IdentityView for NpcView {
    type Source = Roster;

    fn create(id: EntityId, roster: Roster) -> Self {
        Self {
            id,
            roster,
            frames: 0,
        }
    }

    fn id(&self) -> EntityId {
        self.id
    }

    fn update(&mut self) -> ViewResult<()> {
        // The world can drop an npc before its destroy arrives.
        if !self.roster.read().contains(&self.id) {
            return Err(ViewError::UpdateFailed {
                id: self.id,
                reason: "entity left the world".into(),
            });
        }
        self.frames += 1;
        Ok(())
    }

    fn destroy(&mut self) {
        tracing::trace!("npc {} torn down after {} frames", self.id, self.frames);
    }

    fn is_visible(&self) -> bool {
        true
    }
}

struct Blip {
    id: EntityId,
}

impl SpaceProxy for Blip {
    fn place(&mut self, position: Vec3, heading: f32) {
        tracing::trace!("blip {} at {:?} facing {}", self.id, position, heading);
    }

    fn despawn(&mut self) {
        tracing::trace!("blip {} gone", self.id);
    }
}

struct SoakWorld {
    roster: Roster,
}

impl ViewBackend for SoakWorld {
    type Identity = NpcView;
    type Proxy = Blip;

    fn resolve(&self, _category: IdentityCategory, id: EntityId) -> Option<Roster> {
        self.roster
            .read()
            .contains(&id)
            .then(|| Arc::clone(&self.roster))
    }

    fn spawn_proxy(&self, id: EntityId, _is_player: bool) -> Blip {
        Blip { id }
    }
}

fn init_logging() -> Result<(), Box<dyn Error>> {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env()?;
    tracing_subscriber::fmt().with_env_filter(filter).init();
    Ok(())
}

/// Feed side for one frame: npc churn plus a sliding AOI window.
fn feed_frame(registry: &ViewRegistry<SoakWorld>, frame: u64) {
    if frame % SPAWN_EVERY == 0 {
        let spawned = u32::try_from(frame / SPAWN_EVERY).unwrap_or(u32::MAX);
        let roster = &registry.backend().roster;
        roster.write().insert(spawned);
        registry.create_identity_view(IdentityCategory::Autonomous, spawned);

        if let Some(expired) = spawned.checked_sub(NPC_LIFETIME) {
            // World first, view second: the driver may see the gap.
            roster.write().remove(&expired);
            registry.destroy_identity_view(IdentityCategory::Autonomous, expired);
        }
    }

    let first = 10_000 + u32::try_from(frame / 10).unwrap_or(0);
    for id in first..first + AOI_WINDOW {
        #[allow(clippy::cast_precision_loss)]
        let t = frame as f32 / 60.0;
        registry.update_position(id, id % 5 == 0, t.cos(), 0.0, t.sin(), t);
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    init_logging()?;

    let mut args = std::env::args().skip(1);
    let config = args
        .next()
        .map(ViewConfig::load)
        .transpose()?
        .unwrap_or_default();
    let frames: u64 = args
        .next()
        .map(|arg| arg.parse())
        .transpose()?
        .unwrap_or(600);

    println!("=== Tether View Soak ===");
    println!("Frames:          {frames}");
    println!("Tick rate:       {} Hz", config.tick_rate);
    println!("Reclaim enabled: {}", config.reclaim_enabled);
    println!();

    let registry = Arc::new(ViewRegistry::new(SoakWorld {
        roster: Arc::new(RwLock::new(HashSet::new())),
    }));
    let mut driver = FrameDriver::new(Arc::clone(&registry), &config);

    let (frame_tx, frame_rx) = bounded::<u64>(1);
    let feed = {
        let registry = Arc::clone(&registry);
        thread::spawn(move || {
            for frame in frame_rx {
                feed_frame(&registry, frame);
            }
        })
    };

    let start = Instant::now();
    let mut updated = 0_u64;
    let mut failures = 0_u64;
    let mut reclaimed = 0_u64;

    for frame in 0..frames {
        frame_tx.send(frame)?;
        let stats = driver.tick();
        updated += u64::from(stats.views_updated);
        failures += u64::from(stats.update_failures);
        reclaimed += u64::from(stats.space_views_reclaimed);
    }

    drop(frame_tx);
    if feed.join().is_err() {
        return Err("feed thread panicked".into());
    }

    let elapsed = start.elapsed();
    println!("=== Results ===");
    println!("Elapsed:              {elapsed:?}");
    println!("Identity updates:     {updated}");
    println!("Update failures:      {failures}");
    println!("Space views reclaimed: {reclaimed}");
    println!(
        "Live at exit:         {} npcs, {} space views",
        registry.identity_len(IdentityCategory::Autonomous),
        registry.space_len()
    );

    registry.release();
    Ok(())
}
