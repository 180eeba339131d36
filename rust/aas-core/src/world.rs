//! The static, immutable-after-load spatial database: vertices, planes,
//! the BSP tree, areas, clusters, portals, and the reachability graph.
//!
//! Everything here is arena storage plus typed indices — no pointer
//! chains, no cyclic ownership. A [`Node`]'s child convention mirrors the
//! source format exactly: a positive child is another node, a negative
//! child `-n` is area `n`, and `0` is the solid sentinel.

use crate::travel::TravelType;

/// A tiny hand-rolled bitflags macro. The reference crate pulls in
/// `bitvec` for bit-level storage of large flag vectors; these flag sets
/// are small and fixed, so a `u32` newtype with the usual bit ops is a
/// better fit than a dependency.
macro_rules! bitflags_like {
    ($(#[$meta:meta])* pub struct $name:ident: $int:ty { $(const $flag:ident = $val:expr;)* }) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
        pub struct $name(pub $int);

        impl $name {
            $(pub const $flag: $name = $name($val);)*

            pub const fn empty() -> Self {
                $name(0)
            }

            pub fn contains(self, other: Self) -> bool {
                self.0 & other.0 == other.0
            }

            pub fn intersects(self, other: Self) -> bool {
                self.0 & other.0 != 0
            }
        }

        impl std::ops::BitOr for $name {
            type Output = Self;
            fn bitor(self, rhs: Self) -> Self {
                $name(self.0 | rhs.0)
            }
        }

        impl std::ops::BitOrAssign for $name {
            fn bitor_assign(&mut self, rhs: Self) {
                self.0 |= rhs.0;
            }
        }

        impl std::ops::BitAnd for $name {
            type Output = Self;
            fn bitand(self, rhs: Self) -> Self {
                $name(self.0 & rhs.0)
            }
        }
    };
}

macro_rules! index_newtype {
    ($name:ident) => {
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(pub i32);

        impl $name {
            pub const INVALID: Self = Self(0);

            pub fn is_valid(self) -> bool {
                self.0 != 0
            }

            pub fn as_usize(self) -> usize {
                self.0 as usize
            }
        }

        impl From<i32> for $name {
            fn from(v: i32) -> Self {
                Self(v)
            }
        }
    };
}

index_newtype!(AreaNum);
index_newtype!(NodeNum);
index_newtype!(PlaneNum);
index_newtype!(ClusterNum);
index_newtype!(PortalNum);
index_newtype!(ReachNum);

pub type Vec3 = [f32; 3];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaneType {
    X = 0,
    Y = 1,
    Z = 2,
    NonAxial = 3,
}

impl PlaneType {
    pub fn from_tag(tag: u8) -> Self {
        match tag {
            0 => PlaneType::X,
            1 => PlaneType::Y,
            2 => PlaneType::Z,
            _ => PlaneType::NonAxial,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Plane {
    pub normal: Vec3,
    pub dist: f32,
    pub plane_type: PlaneType,
}

impl Plane {
    /// Signed distance of `point` from the plane; positive means the
    /// point is on the side the normal points toward.
    pub fn distance_to(&self, point: Vec3) -> f32 {
        dot(self.normal, point) - self.dist
    }
}

pub fn dot(a: Vec3, b: Vec3) -> f32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

pub fn sub(a: Vec3, b: Vec3) -> Vec3 {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

pub fn cross(a: Vec3, b: Vec3) -> Vec3 {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

pub fn scale(a: Vec3, s: f32) -> Vec3 {
    [a[0] * s, a[1] * s, a[2] * s]
}

pub fn add(a: Vec3, b: Vec3) -> Vec3 {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

pub fn length(a: Vec3) -> f32 {
    dot(a, a).sqrt()
}

pub fn normalize(a: Vec3) -> Vec3 {
    let len = length(a);
    if len < 1e-8 {
        [0.0, 0.0, 0.0]
    } else {
        scale(a, 1.0 / len)
    }
}

bitflags_like! {
    pub struct FaceFlags: u32 {
        const LADDER = 1 << 0;
    }
}

bitflags_like! {
    pub struct AreaFlags: u32 {
        const LADDER = 1 << 0;
        const WEAPONJUMP = 1 << 1;
    }
}

bitflags_like! {
    pub struct AreaContents: u32 {
        const WATER = 1 << 0;
        const SLIME = 1 << 1;
        const LAVA = 1 << 2;
        const DONOTENTER = 1 << 3;
        const NOTTEAM1 = 1 << 4;
        const NOTTEAM2 = 1 << 5;
        const BRIDGE = 1 << 6;
    }
}

bitflags_like! {
    pub struct PresenceType: u32 {
        const NORMAL = 1 << 0;
        const CROUCH = 1 << 1;
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Edge {
    pub v1: u32,
    pub v2: u32,
}

#[derive(Clone, Debug)]
pub struct Face {
    pub plane_num: PlaneNum,
    pub flags: FaceFlags,
    /// Range into the shared edge-index table; indices there are signed,
    /// negative meaning "traverse this edge reversed."
    pub first_edge: u32,
    pub num_edges: u32,
}

#[derive(Clone, Debug)]
pub struct Area {
    pub first_face: u32,
    pub num_faces: u32,
}

/// A portal area's `cluster` field is encoded as `-portal_index`; use
/// [`AreaSettings::portal`] rather than matching on sign yourself.
#[derive(Clone, Debug)]
pub struct AreaSettings {
    pub presence_type: PresenceType,
    pub area_flags: AreaFlags,
    pub contents: AreaContents,
    pub cluster: i32,
    pub cluster_area_num: i32,
    pub first_reachable_area: u32,
    pub num_reachable_areas: u32,
}

impl AreaSettings {
    pub fn portal(&self) -> Option<PortalNum> {
        if self.cluster < 0 {
            Some(PortalNum(-self.cluster))
        } else {
            None
        }
    }

    pub fn is_crouch_only(&self) -> bool {
        self.presence_type.contains(PresenceType::CROUCH)
            && !self.presence_type.contains(PresenceType::NORMAL)
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Node {
    pub plane_num: PlaneNum,
    /// Positive: another node. Negative `-n`: area `n`. Zero: solid leaf.
    pub children: [i32; 2],
}

#[derive(Clone, Debug)]
pub struct Cluster {
    pub num_reachability_areas: u32,
    pub first_area: u32,
    pub num_areas: u32,
    pub first_portal: u32,
    pub num_portals: u32,
}

#[derive(Clone, Copy, Debug)]
pub struct Portal {
    pub area_num: AreaNum,
    pub front_cluster: ClusterNum,
    pub back_cluster: ClusterNum,
    /// Per-cluster local area index of the portal area, indexed `[0]` for
    /// the front cluster and `[1]` for the back cluster.
    pub cluster_area_num: [i32; 2],
}

#[derive(Clone, Copy, Debug)]
pub struct Reachability {
    pub area_num: AreaNum,
    pub face_num: i32,
    pub edge_num: i32,
    pub start: Vec3,
    pub end: Vec3,
    pub travel_type: TravelType,
    /// Hundredths of a second; always >= 1.
    pub travel_time: u32,
}

/// Arena-backed, immutable-after-load spatial database for one compiled
/// map. All cross-references are by index into the arrays below, never
/// by pointer.
#[derive(Clone, Debug, Default)]
pub struct AasWorld {
    pub vertices: Vec<Vec3>,
    pub planes: Vec<Plane>,
    pub edges: Vec<Edge>,
    /// Signed indices into `edges`; negative means traverse reversed.
    pub edge_index: Vec<i32>,
    pub faces: Vec<Face>,
    pub face_index: Vec<i32>,
    pub areas: Vec<Area>,
    pub area_settings: Vec<AreaSettings>,
    pub nodes: Vec<Node>,
    pub clusters: Vec<Cluster>,
    pub portals: Vec<Portal>,
    /// Indices into `portals`, referenced by `Cluster::{first_portal,num_portals}`.
    pub portal_index: Vec<i32>,
    /// Indices into `areas`, referenced by `Cluster::{first_area,num_area}`.
    pub area_index: Vec<i32>,
    pub reachability: Vec<Reachability>,
}

impl AasWorld {
    pub fn area_settings(&self, area: AreaNum) -> Option<&AreaSettings> {
        self.area_settings.get(area.as_usize())
    }

    pub fn plane(&self, num: PlaneNum) -> &Plane {
        &self.planes[num.as_usize()]
    }

    pub fn node(&self, num: NodeNum) -> &Node {
        &self.nodes[num.as_usize()]
    }

    /// Outgoing reachabilities for `area`, as a contiguous slice of the
    /// flat `reachability` arena.
    pub fn reachabilities_of(&self, area: AreaNum) -> &[Reachability] {
        let Some(settings) = self.area_settings(area) else {
            return &[];
        };
        let start = settings.first_reachable_area as usize;
        let end = start + settings.num_reachable_areas as usize;
        &self.reachability[start.min(self.reachability.len())..end.min(self.reachability.len())]
    }

    pub fn face_edge(&self, face: &Face, local_idx: u32) -> (&Edge, bool) {
        let signed = self.edge_index[(face.first_edge + local_idx) as usize];
        let reversed = signed < 0;
        (&self.edges[signed.unsigned_abs() as usize], reversed)
    }

    pub fn face_vertices(&self, face: &Face) -> Vec<Vec3> {
        let mut out = Vec::with_capacity(face.num_edges as usize);
        for i in 0..face.num_edges {
            let (edge, reversed) = self.face_edge(face, i);
            let v = if reversed { edge.v2 } else { edge.v1 };
            out.push(self.vertices[v as usize]);
        }
        out
    }

    pub fn area_faces(&self, area: &Area) -> &[i32] {
        let start = area.first_face as usize;
        let end = start + area.num_faces as usize;
        &self.face_index[start..end]
    }
}
