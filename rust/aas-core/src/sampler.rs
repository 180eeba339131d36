//! The BSP point/trace engine: point-in-area queries, swept bounding-box
//! traces, and the small geometric predicates the mover and router rely
//! on (point-in-face, ladder test, on-ground test, swim test).
//!
//! The epsilons below are contracts, not tuning knobs (§9): changing them
//! changes which maps are navigable.

use crate::errors::SamplerError;
use crate::world::{add, cross, dot, scale, sub, AasWorld, AreaNum, NodeNum, PresenceType, Vec3};

pub const BBOX_NORMAL_EPSILON: f32 = 0.001;
pub const TRACEPLANE_EPSILON: f32 = 0.125;
pub const POINT_IN_FACE_EPSILON: f32 = 0.1;
pub const LADDER_PLANE_EPSILON: f32 = 3.0;
pub const ON_GROUND_DROP_LIMIT: f32 = 10.0;
pub const ON_GROUND_SLOPE_COSINE: f32 = 0.7;
pub const TRACE_STACK_SIZE: usize = 127;

#[derive(Clone, Copy, Debug)]
pub struct BoundingBox {
    pub mins: Vec3,
    pub maxs: Vec3,
}

/// `AAS_PresenceTypeBoundingBox`: the fixed per-posture bounding box.
/// Panics on a presence type that is neither `NORMAL` nor `CROUCH` — that
/// is a programmer error, not a runtime condition (§7).
pub fn presence_type_bounding_box(presence: PresenceType) -> BoundingBox {
    if presence.contains(PresenceType::NORMAL) {
        BoundingBox {
            mins: [-15.0, -15.0, -24.0],
            maxs: [15.0, 15.0, 32.0],
        }
    } else if presence.contains(PresenceType::CROUCH) {
        BoundingBox {
            mins: [-15.0, -15.0, -24.0],
            maxs: [15.0, 15.0, 8.0],
        }
    } else {
        panic!("presence type {:?} has no bounding box", presence);
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Trace {
    pub startsolid: bool,
    pub fraction: f32,
    pub endpos: Vec3,
    pub area: i32,
    pub plane_num: i32,
    pub ent: Option<u32>,
}

impl Trace {
    fn zero_hit(start: Vec3) -> Self {
        Trace {
            startsolid: false,
            fraction: 1.0,
            endpos: start,
            area: 0,
            plane_num: 0,
            ent: None,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct StackEntry {
    node: i32,
    start: Vec3,
    end: Vec3,
}

/// Fixed-capacity descent stack; growing past [`TRACE_STACK_SIZE`] is a
/// hard error, never a silent truncation (§9).
struct TraceStack {
    entries: [StackEntry; TRACE_STACK_SIZE],
    len: usize,
}

impl TraceStack {
    fn new() -> Self {
        TraceStack {
            entries: [StackEntry {
                node: 0,
                start: [0.0; 3],
                end: [0.0; 3],
            }; TRACE_STACK_SIZE],
            len: 0,
        }
    }

    fn push(&mut self, entry: StackEntry) -> Result<(), SamplerError> {
        if self.len == TRACE_STACK_SIZE {
            return Err(SamplerError::TraceStackOverflow(TRACE_STACK_SIZE));
        }
        self.entries[self.len] = entry;
        self.len += 1;
        Ok(())
    }

    fn pop(&mut self) -> Option<StackEntry> {
        if self.len == 0 {
            None
        } else {
            self.len -= 1;
            Some(self.entries[self.len])
        }
    }
}

pub struct Sampler<'w> {
    pub world: &'w AasWorld,
}

impl<'w> Sampler<'w> {
    pub fn new(world: &'w AasWorld) -> Self {
        Sampler { world }
    }

    /// `AAS_PointAreaNum`: descend the BSP from node 1 (node 0 is the
    /// solid sentinel). Returns 0 if the point lands in solid or the
    /// world has no geometry.
    pub fn point_area_num(&self, point: Vec3) -> AreaNum {
        if self.world.nodes.is_empty() {
            return AreaNum::INVALID;
        }
        let mut node_num: i32 = 1;
        loop {
            if node_num == 0 {
                return AreaNum::INVALID;
            }
            if node_num < 0 {
                return AreaNum(-node_num);
            }
            let node = self.world.node(NodeNum(node_num));
            let plane = self.world.plane(node.plane_num);
            let dist = plane.distance_to(point);
            node_num = if dist > 0.0 {
                node.children[0]
            } else {
                node.children[1]
            };
        }
    }

    /// `AAS_PointReachabilityAreaNum`: fuzzy lookup used when the exact
    /// point does not land in a reachable area — jitter a small cross of
    /// sample points around it and return the first reachable hit.
    pub fn point_reachability_area_num(&self, point: Vec3) -> AreaNum {
        let direct = self.point_area_num(point);
        if self.is_reachable(direct) {
            return direct;
        }

        let mut fallback = direct;
        // A 4-unit jitter step scaled ×8 horizontally and ×12 vertically,
        // sampled in a 10-point cross around `point` (§4.1).
        const JITTER: f32 = 4.0;
        const HORIZONTAL: f32 = 8.0;
        const VERTICAL: f32 = 12.0;
        let offsets: [Vec3; 10] = [
            [JITTER * HORIZONTAL, 0.0, 0.0],
            [-JITTER * HORIZONTAL, 0.0, 0.0],
            [0.0, JITTER * HORIZONTAL, 0.0],
            [0.0, -JITTER * HORIZONTAL, 0.0],
            [0.0, 0.0, JITTER * VERTICAL],
            [0.0, 0.0, -JITTER * VERTICAL],
            [JITTER * HORIZONTAL, JITTER * HORIZONTAL, 0.0],
            [-JITTER * HORIZONTAL, -JITTER * HORIZONTAL, 0.0],
            [JITTER * HORIZONTAL, -JITTER * HORIZONTAL, 0.0],
            [-JITTER * HORIZONTAL, JITTER * HORIZONTAL, 0.0],
        ];
        for offset in offsets {
            let jittered = add(point, offset);
            let candidate = self.point_area_num(jittered);
            if self.is_reachable(candidate) {
                return candidate;
            }
            if !fallback.is_valid() && candidate.is_valid() {
                fallback = candidate;
            }
        }
        fallback
    }

    fn is_reachable(&self, area: AreaNum) -> bool {
        area.is_valid()
            && self
                .world
                .area_settings(area)
                .map(|s| s.num_reachable_areas > 0)
                .unwrap_or(false)
    }

    /// `AAS_TraceClientBBox`: sweep a presence-sized box from `start` to
    /// `end` through the BSP, returning the first blocking collision.
    pub fn trace_client_bbox(
        &self,
        start: Vec3,
        end: Vec3,
        presence: PresenceType,
        pass_ent: Option<u32>,
    ) -> Result<Trace, SamplerError> {
        let bbox = presence_type_bounding_box(presence);
        if self.world.nodes.is_empty() {
            return Ok(Trace::zero_hit(start));
        }

        let mut stack = TraceStack::new();
        stack.push(StackEntry {
            node: 1,
            start,
            end,
        })?;

        while let Some(entry) = stack.pop() {
            if entry.node < 0 {
                let area = AreaNum(-entry.node);
                let Some(settings) = self.world.area_settings(area) else {
                    continue;
                };
                if !settings.presence_type.intersects(presence) {
                    return Ok(self.solid_trace(start, entry.start, entry.end));
                }
                if let Some(hit) =
                    self.check_entity_collision(area, entry.start, entry.end, pass_ent)
                {
                    return Ok(hit);
                }
                continue;
            }
            if entry.node == 0 {
                return Ok(self.solid_trace(start, entry.start, entry.end));
            }

            let node = self.world.node(NodeNum(entry.node));
            let plane = self.world.plane(node.plane_num);

            let d1 = plane.distance_to(entry.start) - box_offset(plane.normal, bbox);
            let d2 = plane.distance_to(entry.end) - box_offset(plane.normal, bbox);

            if d1 >= TRACEPLANE_EPSILON && d2 >= TRACEPLANE_EPSILON {
                stack.push(StackEntry {
                    node: node.children[0],
                    start: entry.start,
                    end: entry.end,
                })?;
                continue;
            }
            if d1 < -TRACEPLANE_EPSILON && d2 < -TRACEPLANE_EPSILON {
                stack.push(StackEntry {
                    node: node.children[1],
                    start: entry.start,
                    end: entry.end,
                })?;
                continue;
            }

            let mut frac = if (d1 - d2).abs() > 1e-8 {
                d1 / (d1 - d2)
            } else {
                0.0
            };
            frac = frac.clamp(0.001, 0.999);
            let mid = lerp(entry.start, entry.end, frac);

            let (near, far) = if d1 >= 0.0 {
                (node.children[0], node.children[1])
            } else {
                (node.children[1], node.children[0])
            };

            // Push the far side first so the near side (examined first)
            // yields the earliest collision along the segment.
            stack.push(StackEntry {
                node: far,
                start: mid,
                end: entry.end,
            })?;
            stack.push(StackEntry {
                node: near,
                start: entry.start,
                end: mid,
            })?;
        }

        Ok(Trace::zero_hit(end))
    }

    fn solid_trace(&self, orig_start: Vec3, seg_start: Vec3, _seg_end: Vec3) -> Trace {
        let startsolid = seg_start == orig_start;
        Trace {
            startsolid,
            fraction: if startsolid { 0.0 } else { 0.999 },
            endpos: seg_start,
            area: 0,
            plane_num: 0,
            ent: None,
        }
    }

    fn check_entity_collision(
        &self,
        _area: AreaNum,
        _seg_start: Vec3,
        _seg_end: Vec3,
        _pass_ent: Option<u32>,
    ) -> Option<Trace> {
        // Entity-vs-bbox collision is delegated to the host's
        // `EntityCollision` shim via `crate::host::HostCollision`; the
        // Sampler itself only knows about static world geometry.
        None
    }

    /// `AAS_TraceAreas`: multi-area variant, collecting every area the
    /// swept line enters (bounded by `maxareas`), ignoring presence type.
    pub fn trace_areas(&self, start: Vec3, end: Vec3, maxareas: usize) -> Vec<(AreaNum, Vec3)> {
        let mut out = Vec::new();
        if self.world.nodes.is_empty() || maxareas == 0 {
            return out;
        }
        let mut stack = vec![(1i32, start, end)];
        while let Some((node_num, seg_start, seg_end)) = stack.pop() {
            if out.len() >= maxareas {
                break;
            }
            if node_num == 0 {
                continue;
            }
            if node_num < 0 {
                out.push((AreaNum(-node_num), seg_start));
                continue;
            }
            let node = self.world.node(NodeNum(node_num));
            let plane = self.world.plane(node.plane_num);
            let d1 = plane.distance_to(seg_start);
            let d2 = plane.distance_to(seg_end);

            if d1 >= 0.0 && d2 >= 0.0 {
                stack.push((node.children[0], seg_start, seg_end));
            } else if d1 < 0.0 && d2 < 0.0 {
                stack.push((node.children[1], seg_start, seg_end));
            } else {
                let frac = (d1 / (d1 - d2)).clamp(0.001, 0.999);
                let mid = lerp(seg_start, seg_end, frac);
                let (near, far) = if d1 >= 0.0 {
                    (node.children[0], node.children[1])
                } else {
                    (node.children[1], node.children[0])
                };
                stack.push((far, mid, seg_end));
                stack.push((near, seg_start, mid));
            }
        }
        out
    }

    /// `AAS_PointInsideFace`: per-edge separating-normal test.
    pub fn point_inside_face(&self, face_idx: i32, point: Vec3, epsilon: f32) -> bool {
        let face = &self.world.faces[face_idx.unsigned_abs() as usize];
        let plane = self.world.plane(face.plane_num);
        let normal = if face_idx < 0 {
            scale(plane.normal, -1.0)
        } else {
            plane.normal
        };
        for i in 0..face.num_edges {
            let (edge, reversed) = self.world.face_edge(face, i);
            let (v1, v2) = if reversed {
                (edge.v2, edge.v1)
            } else {
                (edge.v1, edge.v2)
            };
            let p1 = self.world.vertices[v1 as usize];
            let p2 = self.world.vertices[v2 as usize];
            let edge_vec = sub(p2, p1);
            let sep_normal = cross(edge_vec, normal);
            if dot(sub(point, p1), sep_normal) < -epsilon {
                return false;
            }
        }
        true
    }

    /// `AAS_AreaLadder` test: is `point` against a ladder face of its
    /// (possibly jittered) area?
    pub fn against_ladder(&self, point: Vec3) -> bool {
        let mut area = self.point_area_num(point);
        if !area.is_valid() {
            area = self.point_area_num(add(point, [1.0, 0.0, 0.0]));
        }
        let Some(settings) = self.world.area_settings(area) else {
            return false;
        };
        if !settings.area_flags.contains(crate::world::AreaFlags::LADDER) {
            return false;
        }
        if !settings.presence_type.contains(PresenceType::NORMAL) {
            return false;
        }
        let Some(a) = self.world.areas.get(area.as_usize()) else {
            return false;
        };
        for &face_idx in self.world.area_faces(a) {
            let face = &self.world.faces[face_idx.unsigned_abs() as usize];
            if !face.flags.contains(crate::world::FaceFlags::LADDER) {
                continue;
            }
            let plane = self.world.plane(face.plane_num);
            if (dot(plane.normal, point) - plane.dist).abs() < LADDER_PLANE_EPSILON
                && self.point_inside_face(face_idx, point, POINT_IN_FACE_EPSILON)
            {
                return true;
            }
        }
        false
    }

    /// `AAS_OnGround`-equivalent: trace a short distance downward and
    /// check slope/drop against the contract constants.
    pub fn on_ground(&self, origin: Vec3, presence: PresenceType) -> Result<bool, SamplerError> {
        let down = [origin[0], origin[1], origin[2] - ON_GROUND_DROP_LIMIT];
        let trace = self.trace_client_bbox(origin, down, presence, None)?;
        if trace.startsolid || trace.fraction >= 1.0 {
            return Ok(false);
        }
        let drop = origin[2] - trace.endpos[2];
        if drop > ON_GROUND_DROP_LIMIT {
            return Ok(false);
        }
        let normal = self.plane_normal_for_trace(&trace);
        Ok(normal[2] >= ON_GROUND_SLOPE_COSINE)
    }

    fn plane_normal_for_trace(&self, trace: &Trace) -> Vec3 {
        if trace.plane_num == 0 {
            return [0.0, 0.0, 1.0];
        }
        let idx = (trace.plane_num >> 1) as usize;
        let plane = &self.world.planes[idx.min(self.world.planes.len().saturating_sub(1))];
        if trace.plane_num & 1 != 0 {
            scale(plane.normal, -1.0)
        } else {
            plane.normal
        }
    }

    /// `AAS_Swimming`: point contents two units below origin includes a
    /// liquid.
    pub fn swimming(&self, origin: Vec3, point_contents: impl Fn(Vec3) -> u32) -> bool {
        const WATER: u32 = 1 << 0;
        const SLIME: u32 = 1 << 1;
        const LAVA: u32 = 1 << 2;
        let probe = [origin[0], origin[1], origin[2] - 2.0];
        point_contents(probe) & (WATER | SLIME | LAVA) != 0
    }
}

fn lerp(a: Vec3, b: Vec3, t: f32) -> Vec3 {
    [
        a[0] + (b[0] - a[0]) * t,
        a[1] + (b[1] - a[1]) * t,
        a[2] + (b[2] - a[2]) * t,
    ]
}

fn box_offset(normal: Vec3, bbox: BoundingBox) -> f32 {
    // Maximum extent of the bbox along `normal`, used to bias the plane
    // test by the box's corner rather than its center (BBOX_NORMAL_EPSILON
    // absorbs the remaining float slack).
    let mut offset = 0.0f32;
    for i in 0..3 {
        offset += if normal[i] >= 0.0 {
            normal[i] * bbox.maxs[i]
        } else {
            normal[i] * bbox.mins[i]
        };
    }
    offset - BBOX_NORMAL_EPSILON
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{Area, AreaSettings, AreaContents, AreaFlags, Node, Plane, PlaneType};

    fn box_world() -> AasWorld {
        // A single axis-aligned box area: floor at z=0, ceiling far above.
        let mut w = AasWorld::default();
        w.planes.push(Plane {
            normal: [0.0, 0.0, 1.0],
            dist: 0.0,
            plane_type: PlaneType::Z,
        });
        w.nodes.push(Node {
            plane_num: crate::world::PlaneNum(0),
            children: [-1, 0],
        });
        w.areas.push(Area {
            first_face: 0,
            num_faces: 0,
        });
        w.area_settings.push(AreaSettings {
            presence_type: PresenceType::NORMAL | PresenceType::CROUCH,
            area_flags: AreaFlags::empty(),
            contents: AreaContents::empty(),
            cluster: 1,
            cluster_area_num: 1,
            first_reachable_area: 0,
            num_reachable_areas: 0,
        });
        w
    }

    #[test]
    fn point_above_floor_resolves_to_area_one() {
        let world = box_world();
        let sampler = Sampler::new(&world);
        assert_eq!(sampler.point_area_num([0.0, 0.0, 32.0]), AreaNum(1));
    }

    #[test]
    fn point_below_floor_is_solid() {
        let world = box_world();
        let sampler = Sampler::new(&world);
        assert_eq!(sampler.point_area_num([0.0, 0.0, -1.0]), AreaNum::INVALID);
    }

    #[test]
    fn trace_stack_overflow_is_reported_not_panicked() {
        let mut stack = TraceStack::new();
        for _ in 0..TRACE_STACK_SIZE {
            stack
                .push(StackEntry {
                    node: 1,
                    start: [0.0; 3],
                    end: [0.0; 3],
                })
                .unwrap();
        }
        let err = stack.push(StackEntry {
            node: 1,
            start: [0.0; 3],
            end: [0.0; 3],
        });
        assert!(matches!(err, Err(SamplerError::TraceStackOverflow(127))));
    }
}
