//! Trait boundaries between this core and the embedding host. The
//! Sampler and Mover are generic over these rather than calling a fixed
//! FFI shim directly, so the core can be unit-tested with a fake host
//! and swapped onto a real simulation without touching engine code.

use crate::world::Vec3;

/// Host-provided entity collision and content queries the Sampler needs
/// but does not own (arbitrary dynamic entities are the host's domain).
pub trait HostCollision {
    fn point_contents(&self, point: Vec3) -> u32;

    /// Returns `Some(fraction)` if tracing the presence box from
    /// `start` to `end` hits `entity` first, else `None`.
    fn entity_collision(
        &self,
        entity: u32,
        start: Vec3,
        end: Vec3,
    ) -> Option<f32>;
}

/// Black-box ballistic services referenced by the Mover's jump handlers
/// (§9 Open Questions): these depend on per-map physics tuning the core
/// does not model itself.
pub trait HostPhysics {
    fn horizontal_velocity_for_jump(&self, zvel: f32, start: Vec3, end: Vec3) -> Option<f32>;
    fn jump_reach_run_start(&self, start: Vec3, end: Vec3) -> Vec3;
    fn milliseconds(&self) -> u64;
}

/// A deterministic test double: no entities, no liquids, a gravity-only
/// ballistic solver. Suitable for unit tests and for embedding contexts
/// that do not need entity collision (e.g. the offline map validator).
#[derive(Clone, Copy, Debug, Default)]
pub struct NullHost {
    pub time_ms: u64,
}

impl HostCollision for NullHost {
    fn point_contents(&self, _point: Vec3) -> u32 {
        0
    }

    fn entity_collision(&self, _entity: u32, _start: Vec3, _end: Vec3) -> Option<f32> {
        None
    }
}

impl HostPhysics for NullHost {
    fn horizontal_velocity_for_jump(&self, _zvel: f32, start: Vec3, end: Vec3) -> Option<f32> {
        let dist = crate::world::length(crate::world::sub(end, start));
        Some(dist.max(1.0))
    }

    fn jump_reach_run_start(&self, start: Vec3, _end: Vec3) -> Vec3 {
        start
    }

    fn milliseconds(&self) -> u64 {
        self.time_ms
    }
}
