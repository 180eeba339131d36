//! Error taxonomy for the three engines plus the compiled-map loader.
//!
//! Configuration, file, and capacity failures are ordinary values callers
//! are expected to handle; programmer errors (bad handles, out-of-range
//! presence types, routing-table invariants broken by corrupt data) panic,
//! matching the fatal/unwind behavior of the system this crate replaces.

use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum SamplerError {
    #[error("AAS world not loaded")]
    NotLoaded,
    #[error("trace stack overflow (descent exceeded {0} entries)")]
    TraceStackOverflow(usize),
    #[error("area {0} out of range")]
    AreaOutOfRange(i32),
}

#[derive(thiserror::Error, Debug)]
pub enum RoutingError {
    #[error("area {0} out of range")]
    AreaOutOfRange(i32),
    #[error("area {0} has no reachabilities")]
    NoReachabilities(i32),
    #[error("routing tables not built for this world")]
    TablesNotBuilt,
}

#[derive(thiserror::Error, Debug)]
pub enum MapLoadError {
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("bad AAS header: expected magic {expected:?}, found {found:?}")]
    BadMagic { expected: [u8; 4], found: [u8; 4] },
    #[error("unsupported AAS version {0}")]
    UnsupportedVersion(i32),
    #[error("lump {lump} truncated: need {need} bytes, have {have}")]
    TruncatedLump {
        lump: &'static str,
        need: usize,
        have: usize,
    },
    #[error("checksum mismatch against compiled geometry: expected {expected:#x}, found {found:#x}")]
    ChecksumMismatch { expected: u32, found: u32 },
}

#[derive(thiserror::Error, Debug)]
pub enum MoverError {
    #[error("unknown move handle {0}")]
    InvalidHandle(u32),
    #[error("origin not in any solid area")]
    InSolidArea,
}

#[derive(thiserror::Error, Debug)]
pub enum LibraryError {
    #[error(transparent)]
    Load(#[from] MapLoadError),
    #[error(transparent)]
    Routing(#[from] RoutingError),
    #[error(transparent)]
    Mover(#[from] MoverError),
    #[error("entity {0} out of range (maxentities {1})")]
    EntityOutOfRange(u32, usize),
    #[error("no map loaded")]
    NoMapLoaded,
}
