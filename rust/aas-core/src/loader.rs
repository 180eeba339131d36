//! Parser for the compiled `.aas` lump file: a little-endian header, a
//! fixed lump directory, then packed C-style struct arrays matching
//! §3's data model. Produces an [`AasWorld`] ready for
//! [`crate::router::RoutingTables::build`].

use std::hash::{Hash, Hasher};
use std::io::Read;
use std::path::Path;

use crate::errors::MapLoadError;
use crate::travel::TravelType;
use crate::world::{
    Area, AreaContents, AreaFlags, AreaSettings, AasWorld, Cluster, Edge, Face, FaceFlags, Node,
    Plane, PlaneNum, PlaneType, Portal, Reachability,
};

const MAGIC: [u8; 4] = *b"AAS1";
const VERSION: i32 = 1;
const LUMP_COUNT: usize = 14;

const LUMP_BBOXES: usize = 0;
const LUMP_VERTEXES: usize = 1;
const LUMP_PLANES: usize = 2;
const LUMP_EDGES: usize = 3;
const LUMP_EDGEINDEX: usize = 4;
const LUMP_FACES: usize = 5;
const LUMP_FACEINDEX: usize = 6;
const LUMP_AREAS: usize = 7;
const LUMP_AREASETTINGS: usize = 8;
const LUMP_REACHABILITY: usize = 9;
const LUMP_NODES: usize = 10;
const LUMP_PORTALS: usize = 11;
const LUMP_PORTALINDEX: usize = 12;
const LUMP_CLUSTERS: usize = 13;

const LUMP_NAMES: [&str; LUMP_COUNT] = [
    "BBOXES",
    "VERTEXES",
    "PLANES",
    "EDGES",
    "EDGEINDEX",
    "FACES",
    "FACEINDEX",
    "AREAS",
    "AREASETTINGS",
    "REACHABILITY",
    "NODES",
    "PORTALS",
    "PORTALINDEX",
    "CLUSTERS",
];

#[derive(Clone, Copy, Debug)]
struct LumpEntry {
    offset: u32,
    length: u32,
}

/// Load a compiled map from disk. `expected_checksum` is the value
/// recorded alongside the accompanying `.bsp`; pass `None` to skip the
/// check (offline inspection tools, tests).
pub fn load_from_path(path: &Path, expected_checksum: Option<u32>) -> Result<AasWorld, MapLoadError> {
    let mut file = std::fs::File::open(path).map_err(|source| MapLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)
        .map_err(|source| MapLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    load_from_bytes(&bytes, expected_checksum)
}

pub fn load_from_bytes(bytes: &[u8], expected_checksum: Option<u32>) -> Result<AasWorld, MapLoadError> {
    let mut cursor = Cursor::new(bytes);

    let mut magic = [0u8; 4];
    cursor.read_exact(&mut magic, "HEADER")?;
    if magic != MAGIC {
        return Err(MapLoadError::BadMagic {
            expected: MAGIC,
            found: magic,
        });
    }
    let version = cursor.read_i32("HEADER")?;
    if version != VERSION {
        return Err(MapLoadError::UnsupportedVersion(version));
    }

    let mut lumps = [LumpEntry { offset: 0, length: 0 }; LUMP_COUNT];
    for lump in lumps.iter_mut() {
        lump.offset = cursor.read_i32("LUMP_DIRECTORY")? as u32;
        lump.length = cursor.read_i32("LUMP_DIRECTORY")? as u32;
    }

    if let Some(expected) = expected_checksum {
        let found = checksum(bytes);
        if found != expected {
            return Err(MapLoadError::ChecksumMismatch { expected, found });
        }
    }

    let mut world = AasWorld::default();

    // BBOXES is present in the file for parity with the compiler's
    // output but carries no field in the in-memory world: presence
    // bounding boxes are the fixed constants in `crate::sampler`.
    validate_lump_only(bytes, &lumps[LUMP_BBOXES], LUMP_NAMES[LUMP_BBOXES], 24)?;

    world.vertices = read_records(bytes, &lumps[LUMP_VERTEXES], LUMP_NAMES[LUMP_VERTEXES], 12, |r| {
        Ok([r.f32_at(0), r.f32_at(4), r.f32_at(8)])
    })?;

    world.planes = read_records(bytes, &lumps[LUMP_PLANES], LUMP_NAMES[LUMP_PLANES], 20, |r| {
        Ok(Plane {
            normal: [r.f32_at(0), r.f32_at(4), r.f32_at(8)],
            dist: r.f32_at(12),
            plane_type: PlaneType::from_tag(r.i32_at(16) as u8),
        })
    })?;

    world.edges = read_records(bytes, &lumps[LUMP_EDGES], LUMP_NAMES[LUMP_EDGES], 8, |r| {
        Ok(Edge {
            v1: r.i32_at(0) as u32,
            v2: r.i32_at(4) as u32,
        })
    })?;

    world.edge_index = read_records(bytes, &lumps[LUMP_EDGEINDEX], LUMP_NAMES[LUMP_EDGEINDEX], 4, |r| {
        Ok(r.i32_at(0))
    })?;

    world.faces = read_records(bytes, &lumps[LUMP_FACES], LUMP_NAMES[LUMP_FACES], 16, |r| {
        Ok(Face {
            plane_num: PlaneNum(r.i32_at(0)),
            flags: FaceFlags(r.i32_at(4) as u32),
            first_edge: r.i32_at(8) as u32,
            num_edges: r.i32_at(12) as u32,
        })
    })?;

    world.face_index = read_records(bytes, &lumps[LUMP_FACEINDEX], LUMP_NAMES[LUMP_FACEINDEX], 4, |r| {
        Ok(r.i32_at(0))
    })?;

    world.areas = read_records(bytes, &lumps[LUMP_AREAS], LUMP_NAMES[LUMP_AREAS], 8, |r| {
        Ok(Area {
            first_face: r.i32_at(0) as u32,
            num_faces: r.i32_at(4) as u32,
        })
    })?;

    world.area_settings = read_records(
        bytes,
        &lumps[LUMP_AREASETTINGS],
        LUMP_NAMES[LUMP_AREASETTINGS],
        28,
        |r| {
            Ok(AreaSettings {
                presence_type: crate::world::PresenceType(r.i32_at(0) as u32),
                area_flags: AreaFlags(r.i32_at(4) as u32),
                contents: AreaContents(r.i32_at(8) as u32),
                cluster: r.i32_at(12),
                cluster_area_num: r.i32_at(16),
                first_reachable_area: r.i32_at(20) as u32,
                num_reachable_areas: r.i32_at(24) as u32,
            })
        },
    )?;

    world.reachability = read_records(
        bytes,
        &lumps[LUMP_REACHABILITY],
        LUMP_NAMES[LUMP_REACHABILITY],
        44,
        |r| {
            Ok(Reachability {
                area_num: crate::world::AreaNum(r.i32_at(0)),
                face_num: r.i32_at(4),
                edge_num: r.i32_at(8),
                start: [r.f32_at(12), r.f32_at(16), r.f32_at(20)],
                end: [r.f32_at(24), r.f32_at(28), r.f32_at(32)],
                travel_type: TravelType::from_u8(r.i32_at(36) as u8),
                travel_time: (r.i32_at(40).max(1)) as u32,
            })
        },
    )?;

    world.nodes = read_records(bytes, &lumps[LUMP_NODES], LUMP_NAMES[LUMP_NODES], 12, |r| {
        Ok(Node {
            plane_num: PlaneNum(r.i32_at(0)),
            children: [r.i32_at(4), r.i32_at(8)],
        })
    })?;

    world.portals = read_records(bytes, &lumps[LUMP_PORTALS], LUMP_NAMES[LUMP_PORTALS], 20, |r| {
        Ok(Portal {
            area_num: crate::world::AreaNum(r.i32_at(0)),
            front_cluster: crate::world::ClusterNum(r.i32_at(4)),
            back_cluster: crate::world::ClusterNum(r.i32_at(8)),
            cluster_area_num: [r.i32_at(12), r.i32_at(16)],
        })
    })?;

    world.portal_index = read_records(
        bytes,
        &lumps[LUMP_PORTALINDEX],
        LUMP_NAMES[LUMP_PORTALINDEX],
        4,
        |r| Ok(r.i32_at(0)),
    )?;

    world.clusters = read_records(bytes, &lumps[LUMP_CLUSTERS], LUMP_NAMES[LUMP_CLUSTERS], 20, |r| {
        Ok(Cluster {
            num_reachability_areas: r.i32_at(0) as u32,
            first_area: r.i32_at(4) as u32,
            num_areas: r.i32_at(8) as u32,
            first_portal: r.i32_at(12) as u32,
            num_portals: r.i32_at(16) as u32,
        })
    })?;

    Ok(world)
}

fn checksum(bytes: &[u8]) -> u32 {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    bytes.hash(&mut hasher);
    hasher.finish() as u32
}

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Cursor { bytes, pos: 0 }
    }

    fn read_exact(&mut self, buf: &mut [u8], lump: &'static str) -> Result<(), MapLoadError> {
        if self.pos + buf.len() > self.bytes.len() {
            return Err(MapLoadError::TruncatedLump {
                lump,
                need: buf.len(),
                have: self.bytes.len().saturating_sub(self.pos),
            });
        }
        buf.copy_from_slice(&self.bytes[self.pos..self.pos + buf.len()]);
        self.pos += buf.len();
        Ok(())
    }

    fn read_i32(&mut self, lump: &'static str) -> Result<i32, MapLoadError> {
        let mut buf = [0u8; 4];
        self.read_exact(&mut buf, lump)?;
        Ok(i32::from_le_bytes(buf))
    }
}

struct RecordReader<'a> {
    bytes: &'a [u8],
}

impl<'a> RecordReader<'a> {
    fn i32_at(&self, offset: usize) -> i32 {
        i32::from_le_bytes(self.bytes[offset..offset + 4].try_into().unwrap())
    }

    fn f32_at(&self, offset: usize) -> f32 {
        f32::from_le_bytes(self.bytes[offset..offset + 4].try_into().unwrap())
    }
}

fn lump_slice<'a>(
    bytes: &'a [u8],
    lump: &LumpEntry,
    name: &'static str,
) -> Result<&'a [u8], MapLoadError> {
    let start = lump.offset as usize;
    let end = start + lump.length as usize;
    bytes.get(start..end).ok_or(MapLoadError::TruncatedLump {
        lump: name,
        need: lump.length as usize,
        have: bytes.len().saturating_sub(start.min(bytes.len())),
    })
}

fn read_records<T>(
    bytes: &[u8],
    lump: &LumpEntry,
    name: &'static str,
    record_size: usize,
    decode: impl Fn(RecordReader<'_>) -> Result<T, MapLoadError>,
) -> Result<Vec<T>, MapLoadError> {
    let slice = lump_slice(bytes, lump, name)?;
    if slice.len() % record_size != 0 {
        return Err(MapLoadError::TruncatedLump {
            lump: name,
            need: record_size,
            have: slice.len() % record_size,
        });
    }
    let count = slice.len() / record_size;
    let mut out = Vec::with_capacity(count);
    for i in 0..count {
        let record = &slice[i * record_size..(i + 1) * record_size];
        out.push(decode(RecordReader { bytes: record })?);
    }
    Ok(out)
}

fn validate_lump_only(
    bytes: &[u8],
    lump: &LumpEntry,
    name: &'static str,
    record_size: usize,
) -> Result<(), MapLoadError> {
    let slice = lump_slice(bytes, lump, name)?;
    if slice.len() % record_size != 0 {
        return Err(MapLoadError::TruncatedLump {
            lump: name,
            need: record_size,
            have: slice.len() % record_size,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_header_and_empty_lumps() -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&MAGIC);
        buf.extend_from_slice(&VERSION.to_le_bytes());
        let directory_len = LUMP_COUNT * 8;
        let data_start = 8 + directory_len as i32;
        for _ in 0..LUMP_COUNT {
            buf.extend_from_slice(&data_start.to_le_bytes());
            buf.extend_from_slice(&0i32.to_le_bytes());
        }
        buf
    }

    #[test]
    fn empty_lumps_produce_empty_world() {
        let bytes = write_header_and_empty_lumps();
        let world = load_from_bytes(&bytes, None).unwrap();
        assert!(world.vertices.is_empty());
        assert!(world.reachability.is_empty());
    }

    #[test]
    fn bad_magic_is_rejected() {
        let mut bytes = write_header_and_empty_lumps();
        bytes[0] = b'X';
        let err = load_from_bytes(&bytes, None);
        assert!(matches!(err, Err(MapLoadError::BadMagic { .. })));
    }

    #[test]
    fn checksum_mismatch_is_rejected() {
        let bytes = write_header_and_empty_lumps();
        let err = load_from_bytes(&bytes, Some(0xdead_beef));
        assert!(matches!(err, Err(MapLoadError::ChecksumMismatch { .. })));
    }

    #[test]
    fn single_vertex_round_trips() {
        let mut bytes = write_header_and_empty_lumps();
        let vertex_offset = bytes.len() as i32;
        bytes.extend_from_slice(&1.0f32.to_le_bytes());
        bytes.extend_from_slice(&2.0f32.to_le_bytes());
        bytes.extend_from_slice(&3.0f32.to_le_bytes());
        let directory_pos = 8 + LUMP_VERTEXES * 8;
        bytes[directory_pos..directory_pos + 4].copy_from_slice(&vertex_offset.to_le_bytes());
        bytes[directory_pos + 4..directory_pos + 8].copy_from_slice(&12i32.to_le_bytes());

        let world = load_from_bytes(&bytes, None).unwrap();
        assert_eq!(world.vertices, vec![[1.0, 2.0, 3.0]]);
    }
}
