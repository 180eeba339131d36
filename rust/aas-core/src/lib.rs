//! aas-core: the Area Awareness System core — a BSP-backed spatial
//! sampler, a travel-time-weighted route planner over the reachability
//! graph, and the movement-execution state machine that turns a chosen
//! reachability into elementary input actions.
//!
//! The three engines (`sampler`, `router`, `mover`) are independent of
//! any particular host simulation; [`host`] defines the trait boundary
//! an embedder implements to plug in real entity collision and physics.

pub mod ea;
pub mod errors;
pub mod goal;
pub mod host;
pub mod library;
pub mod linkheap;
pub mod loader;
pub mod mover;
pub mod router;
pub mod sampler;
pub mod travel;
pub mod world;

pub(crate) mod engine;

pub use errors::{LibraryError, MapLoadError, MoverError, RoutingError, SamplerError};
pub use host::{HostCollision, HostPhysics, NullHost};
pub use library::{AasLibrary, LibraryConfig};
pub use linkheap::LinkHeap;
pub use mover::{move_to_goal, MoveInputs, MoveState, MoveStateTable};
pub use router::{RouteResult, Router, RoutingTables};
pub use sampler::Sampler;
pub use travel::{TravelFlags, TravelType};
pub use world::AasWorld;

/// Returns the crate version for basic linkage diagnostics.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_non_empty() {
        assert!(!version().is_empty());
    }

    #[test]
    fn world_default_has_no_geometry() {
        let world = AasWorld::default();
        assert!(world.nodes.is_empty());
        assert!(world.reachability.is_empty());
    }
}
