use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Instant;

use aas_core::ea::ElementaryActions;
use aas_core::host::{HostCollision, HostPhysics, NullHost};
use aas_core::mover::MoveStateTable;
use aas_core::router::RoutingTables;
use aas_core::world::{AasWorld, Vec3};
use arc_swap::ArcSwap;

use crate::config::Config;

/// A map plus its derived routing tables, swapped in atomically by
/// `POST /maps/load` so in-flight reads never observe a half-loaded map.
pub struct LoadedMap {
    pub path: PathBuf,
    pub world: AasWorld,
    pub tables: RoutingTables,
}

/// The host services this process hands to the Mover. No game entities
/// of its own to collide against; wall-clock time since startup stands
/// in for the embedding game's server time.
pub struct ServiceHost {
    started_at: Instant,
    inner: NullHost,
}

impl ServiceHost {
    fn new() -> Self {
        Self {
            started_at: Instant::now(),
            inner: NullHost::default(),
        }
    }
}

impl HostCollision for ServiceHost {
    fn point_contents(&self, point: Vec3) -> u32 {
        self.inner.point_contents(point)
    }

    fn entity_collision(&self, entity: u32, start: Vec3, end: Vec3) -> Option<f32> {
        self.inner.entity_collision(entity, start, end)
    }
}

impl HostPhysics for ServiceHost {
    fn horizontal_velocity_for_jump(&self, zvel: f32, start: Vec3, end: Vec3) -> Option<f32> {
        self.inner.horizontal_velocity_for_jump(zvel, start, end)
    }

    fn jump_reach_run_start(&self, start: Vec3, end: Vec3) -> Vec3 {
        self.inner.jump_reach_run_start(start, end)
    }

    fn milliseconds(&self) -> u64 {
        self.started_at.elapsed().as_millis() as u64
    }
}

pub struct AppState {
    pub config: Config,
    pub map: ArcSwap<Option<LoadedMap>>,
    pub host: ServiceHost,
    pub moves: Mutex<MoveStateTable>,
    pub ea: Mutex<ElementaryActions>,
    /// Tracks which client slots have been allocated in `moves`, since
    /// `MoveStateTable` itself only exposes handle-indexed get/init.
    client_initialized: Mutex<Vec<bool>>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let moves = Mutex::new(MoveStateTable::new(config.max_clients));
        let ea = Mutex::new(ElementaryActions::new(config.max_clients));
        let client_initialized = Mutex::new(vec![false; config.max_clients + 1]);
        AppState {
            config,
            map: ArcSwap::from_pointee(None),
            host: ServiceHost::new(),
            moves,
            ea,
            client_initialized,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.map.load().is_some()
    }

    /// Ensures `client_num`'s movement state exists, initializing it on
    /// first use. Returns `false` if `client_num` is out of range.
    pub fn ensure_client(&self, client_num: u32, entity_num: u32) -> bool {
        if client_num == 0 || client_num as usize > self.config.max_clients {
            return false;
        }
        let mut seen = self.client_initialized.lock().unwrap();
        let idx = client_num as usize;
        if !seen[idx] {
            self.moves
                .lock()
                .unwrap()
                .init(aas_core::mover::MoveHandle(client_num), aas_core::mover::MoveState::new(entity_num, client_num));
            seen[idx] = true;
        }
        true
    }
}
