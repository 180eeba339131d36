//! `AasLibrary`: the single owner of a loaded world, its routing tables,
//! and the per-client movement/EA state. Mirrors the reference system's
//! global `aasworld` plus per-bot arrays, but encapsulated behind one
//! handle (§9 Open Questions: "encapsulate them inside a single handle")
//! instead of file-scope statics, so a process can embed more than one
//! instance (e.g. parallel test fixtures).
//!
//! This is the facade a host calls `setup`/`load_map`/`update_entity`
//! against; the engines themselves (`sampler`, `router`, `mover`) stay
//! ignorant of it and of each other.

use std::path::Path;

use crate::ea::ElementaryActions;
use crate::errors::LibraryError;
use crate::host::{HostCollision, HostPhysics};
use crate::loader;
use crate::mover::{self, MoveHandle, MoveInputs, MoveResult, MoveState, MoveStateTable};
use crate::router::RoutingTables;
use crate::travel::TravelFlags;
use crate::world::{AasWorld, AreaNum, Vec3};

struct LoadedWorld {
    world: AasWorld,
    tables: RoutingTables,
}

/// Tunables read once at [`AasLibrary::setup`], matching the reference
/// system's `maxclients`/`maxentities` config pair.
#[derive(Clone, Copy, Debug)]
pub struct LibraryConfig {
    pub max_clients: usize,
    pub max_entities: usize,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        LibraryConfig { max_clients: 128, max_entities: 4096 }
    }
}

pub struct AasLibrary {
    config: LibraryConfig,
    loaded: Option<LoadedWorld>,
    moves: MoveStateTable,
    ea: ElementaryActions,
    frame_time_ms: u64,
}

impl AasLibrary {
    /// `Setup`: allocates the per-client tables up front; no map is
    /// loaded yet.
    pub fn setup(config: LibraryConfig) -> Self {
        AasLibrary {
            moves: MoveStateTable::new(config.max_clients),
            ea: ElementaryActions::new(config.max_clients),
            loaded: None,
            config,
            frame_time_ms: 0,
        }
    }

    /// `Shutdown`: drops the loaded map and all per-client state.
    pub fn shutdown(&mut self) {
        self.loaded = None;
        self.moves = MoveStateTable::new(self.config.max_clients);
        self.ea = ElementaryActions::new(self.config.max_clients);
        self.frame_time_ms = 0;
    }

    /// `StartFrame(time)`: latches the host's frame time for this
    /// think, used as the Mover's `HostPhysics::milliseconds` would be
    /// in an embedder that drives time itself rather than reading a
    /// wall clock (contrast `aas-service`'s `ServiceHost`).
    pub fn start_frame(&mut self, time_ms: u64) {
        self.frame_time_ms = time_ms;
    }

    /// `LoadMap(name)`: loads a compiled `.aas` file and builds its
    /// routing tables, replacing whatever was loaded before.
    pub fn load_map(&mut self, path: &Path, checksum: Option<u32>) -> Result<(), LibraryError> {
        let world = loader::load_from_path(path, checksum)?;
        let tables = RoutingTables::build(&world)?;
        self.loaded = Some(LoadedWorld { world, tables });
        Ok(())
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.is_some()
    }

    /// `UpdateEntity(entNum, state)`: the facade only validates the
    /// entity index here; actual entity bookkeeping is the host's
    /// `HostCollision` implementation (the core holds no entity list
    /// of its own).
    pub fn update_entity(&self, entity_num: u32) -> Result<(), LibraryError> {
        if entity_num as usize >= self.config.max_entities {
            return Err(LibraryError::EntityOutOfRange(entity_num, self.config.max_entities));
        }
        Ok(())
    }

    pub fn init_client(&mut self, client_num: u32, entity_num: u32) {
        self.moves.init(MoveHandle(client_num), MoveState::new(entity_num, client_num));
    }

    /// `BotMoveToGoal`: one think for `client_num`, using whatever map
    /// and per-client state `setup`/`load_map`/`init_client` prepared.
    pub fn move_to_goal<C: HostCollision, P: HostPhysics>(
        &mut self,
        client_num: u32,
        collision: &C,
        physics: &P,
        goal_area: AreaNum,
        goal_origin: Vec3,
        travel_flags: TravelFlags,
    ) -> Result<MoveResult, LibraryError> {
        let loaded = self.loaded.as_ref().ok_or(LibraryError::NoMapLoaded)?;
        let inputs = MoveInputs {
            world: &loaded.world,
            tables: &loaded.tables,
            collision,
            physics,
            goal_area,
            goal_origin,
            travel_flags,
        };
        let state = self.moves.get_mut(MoveHandle(client_num));
        Ok(mover::move_to_goal(&inputs, &mut self.ea, state)?)
    }

    pub fn config(&self) -> LibraryConfig {
        self.config
    }

    pub fn frame_time_ms(&self) -> u64 {
        self.frame_time_ms
    }
}

#[cfg(feature = "ffi")]
pub mod ffi {
    //! Flat vtable boundary. A single process-wide instance, guarded by
    //! a mutex, exists only here — the safe API above has no global
    //! state and can be embedded multiple times in-process.

    use std::sync::{Mutex, OnceLock};

    use crate::host::NullHost;

    use super::{AasLibrary, LibraryConfig};

    static INSTANCE: OnceLock<Mutex<AasLibrary>> = OnceLock::new();

    fn instance() -> &'static Mutex<AasLibrary> {
        INSTANCE.get_or_init(|| Mutex::new(AasLibrary::setup(LibraryConfig::default())))
    }

    /// `Setup`: re-initializes the process-wide instance with the given
    /// tunables. Safe to call more than once; each call replaces state.
    #[no_mangle]
    pub extern "C" fn aas_setup(max_clients: u32, max_entities: u32) {
        let mut lib = instance().lock().unwrap();
        *lib = AasLibrary::setup(LibraryConfig {
            max_clients: max_clients as usize,
            max_entities: max_entities as usize,
        });
    }

    /// `Shutdown`.
    #[no_mangle]
    pub extern "C" fn aas_shutdown() {
        instance().lock().unwrap().shutdown();
    }

    /// `StartFrame(time)`.
    #[no_mangle]
    pub extern "C" fn aas_start_frame(time_ms: u64) {
        instance().lock().unwrap().start_frame(time_ms);
    }

    /// `UpdateEntity(entNum, ...)`. Returns `0` on success, nonzero if
    /// `ent_num` is out of range for the configured `maxentities`.
    #[no_mangle]
    pub extern "C" fn aas_update_entity(ent_num: u32) -> i32 {
        match instance().lock().unwrap().update_entity(ent_num) {
            Ok(()) => 0,
            Err(_) => -1,
        }
    }

    /// Placeholder collision host for the FFI boundary until a real
    /// embedder wires its own `EntityTrace`/`PointContents` imports
    /// through to `HostCollision`.
    pub fn null_host() -> NullHost {
        NullHost::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setup_starts_with_no_map_loaded() {
        let lib = AasLibrary::setup(LibraryConfig::default());
        assert!(!lib.is_loaded());
    }

    #[test]
    fn update_entity_rejects_out_of_range() {
        let lib = AasLibrary::setup(LibraryConfig { max_clients: 8, max_entities: 16 });
        assert!(lib.update_entity(15).is_ok());
        assert!(lib.update_entity(16).is_err());
    }

    #[test]
    fn shutdown_clears_loaded_map() {
        let mut lib = AasLibrary::setup(LibraryConfig::default());
        lib.init_client(1, 1);
        lib.shutdown();
        assert!(!lib.is_loaded());
    }
}
