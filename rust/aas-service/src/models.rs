use serde::{Deserialize, Serialize};

use aas_core::world::Vec3;

#[derive(Debug, Clone, Deserialize)]
pub struct LoadMapRequest {
    /// Path to a compiled `.aas` lump file, resolved on the server's
    /// filesystem. Falls back to `AAS_MAP` when omitted.
    pub path: Option<String>,
    /// Optional checksum to validate against the file's own.
    #[serde(default)]
    pub checksum: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoadMapResponse {
    pub path: String,
    pub areas: usize,
    pub clusters: usize,
    pub portals: usize,
    pub reachabilities: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PointAreaQuery {
    pub origin: Vec3,
}

#[derive(Debug, Clone, Serialize)]
pub struct PointAreaResponse {
    pub area_num: i32,
    pub reachability_area_num: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TraceQuery {
    pub start: Vec3,
    pub end: Vec3,
    #[serde(default)]
    pub crouch: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct TraceResponse {
    pub startsolid: bool,
    pub fraction: f32,
    pub endpos: Vec3,
    pub area: i32,
    pub plane_num: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RouteQuery {
    pub area_num: i32,
    pub origin: Vec3,
    pub goal_area_num: i32,
    #[serde(default)]
    pub travel_flags: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RouteResponse {
    AtGoal,
    Unreachable,
    Reachability { reach_num: u32, travel_type: String, time: u32 },
}

#[derive(Debug, Clone, Deserialize)]
pub struct MoveRequest {
    pub client_num: u32,
    pub entity_num: u32,
    pub origin: Vec3,
    pub goal_area_num: i32,
    pub goal_origin: Vec3,
    #[serde(default)]
    pub travel_flags: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct MoveResponse {
    pub failure: bool,
    pub blocked: bool,
    pub travel_type: Option<String>,
    pub forwardmove: f32,
    pub rightmove: f32,
    pub upmove: f32,
    pub viewangles: Vec3,
    pub actionflags: u32,
}
