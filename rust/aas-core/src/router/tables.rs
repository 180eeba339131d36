//! Derived routing tables built once per loaded map, in the contract
//! order from §4.2: flag tables, content-flag tables, working-array
//! sizing, reversed reachability, area travel times, portal max travel
//! times, reachability areas.

use tracing::warn;

use crate::errors::RoutingError;
use crate::travel::{speed_factor, travel_flag_for_type, TravelFlags};
use crate::world::{AasWorld, AreaContents, AreaNum};

/// Hard cap on reverse-adjacency entries tracked per area; a map with
/// more triggers a warning and only the first `MAX_REVERSED_PER_AREA`
/// incoming links are used for routing (§4.2).
pub const MAX_REVERSED_PER_AREA: usize = 128;
/// Cap on pass-through areas recorded for multi-area reachability types.
pub const MAX_REACHABILITYPASSAREAS: usize = 32;

#[derive(Clone, Copy, Debug)]
pub struct ReversedLink {
    pub source_area: AreaNum,
    pub reach_index: u32,
}

pub struct RoutingTables {
    pub travel_flag_for_type: [TravelFlags; 19],
    pub area_contents_travel_flags: Vec<TravelFlags>,
    /// `reversedreachability[area]`: slab + per-area `(first, count)`.
    pub reversed_reachability: Vec<ReversedLink>,
    pub reversed_reachability_range: Vec<(u32, u32)>,
    /// `areaTravelTimes[area][localReachIdx][reverseLinkIdx]`.
    pub area_travel_times: Vec<Vec<Vec<u32>>>,
    pub portal_max_travel_times: Vec<u32>,
    pub reachability_areas: Vec<AreaNum>,
    pub reachability_area_range: Vec<(u32, u32)>,
}

impl RoutingTables {
    pub fn build(world: &AasWorld) -> Result<Self, RoutingError> {
        let travel_flag_for_type = init_travel_flag_from_type();
        let area_contents_travel_flags = init_area_contents_travel_flags(world);
        let (reversed_reachability, reversed_reachability_range) =
            create_reversed_reachability(world);
        let area_travel_times =
            calculate_area_travel_times(world, &reversed_reachability, &reversed_reachability_range);
        let portal_max_travel_times = init_portal_max_travel_times(world, &area_travel_times);
        let (reachability_areas, reachability_area_range) = init_reachability_areas(world);

        Ok(RoutingTables {
            travel_flag_for_type,
            area_contents_travel_flags,
            reversed_reachability,
            reversed_reachability_range,
            area_travel_times,
            portal_max_travel_times,
            reachability_areas,
            reachability_area_range,
        })
    }

    pub fn area_contents_flags(&self, area: AreaNum) -> TravelFlags {
        self.area_contents_travel_flags
            .get(area.as_usize())
            .copied()
            .unwrap_or(TravelFlags::default())
    }

    pub fn reversed_links_of(&self, area: AreaNum) -> &[ReversedLink] {
        let Some(&(first, count)) = self.reversed_reachability_range.get(area.as_usize()) else {
            return &[];
        };
        &self.reversed_reachability[first as usize..(first + count) as usize]
    }
}

fn init_travel_flag_from_type() -> [TravelFlags; 19] {
    let mut table = [TravelFlags::default(); 19];
    for t in crate::travel::TravelType::ALL {
        table[t as usize] = travel_flag_for_type(t);
    }
    table
}

/// `AAS_GetAreaContentsTravelFlags`: `WATER`/`SLIME`/`LAVA`/`AIR` are
/// mutually exclusive media bits; `DONOTENTER`/`NOTTEAM1`/`NOTTEAM2`/
/// `BRIDGE` OR in independently of medium.
fn init_area_contents_travel_flags(world: &AasWorld) -> Vec<TravelFlags> {
    world
        .area_settings
        .iter()
        .map(|settings| {
            let mut flags = TravelFlags::default();
            if settings.contents.contains(AreaContents::WATER) {
                flags |= TravelFlags::WATER;
            } else if settings.contents.contains(AreaContents::SLIME) {
                flags |= TravelFlags::SLIME;
            } else if settings.contents.contains(AreaContents::LAVA) {
                flags |= TravelFlags::LAVA;
            } else {
                flags |= TravelFlags::AIR;
            }
            if settings.contents.contains(AreaContents::DONOTENTER) {
                flags |= TravelFlags::DONOTENTER;
            }
            if settings.contents.contains(AreaContents::NOTTEAM1) {
                flags |= TravelFlags::NOTTEAM1;
            }
            if settings.contents.contains(AreaContents::NOTTEAM2) {
                flags |= TravelFlags::NOTTEAM2;
            }
            if settings.contents.contains(AreaContents::BRIDGE) {
                flags |= TravelFlags::BRIDGE;
            }
            flags
        })
        .collect()
}

fn create_reversed_reachability(world: &AasWorld) -> (Vec<ReversedLink>, Vec<(u32, u32)>) {
    let num_areas = world.area_settings.len();
    let mut per_area: Vec<Vec<ReversedLink>> = vec![Vec::new(); num_areas];

    for (src_idx, settings) in world.area_settings.iter().enumerate() {
        let src_area = AreaNum(src_idx as i32);
        for (local_idx, reach) in world
            .reachabilities_of(src_area)
            .iter()
            .enumerate()
        {
            let dest = reach.area_num.as_usize();
            if dest >= per_area.len() {
                continue;
            }
            if per_area[dest].len() >= MAX_REVERSED_PER_AREA {
                continue;
            }
            per_area[dest].push(ReversedLink {
                source_area: src_area,
                reach_index: (settings.first_reachable_area as usize + local_idx) as u32,
            });
        }
    }

    for (area, links) in per_area.iter().enumerate() {
        if links.len() >= MAX_REVERSED_PER_AREA {
            warn!(area, count = links.len(), "area has >= {MAX_REVERSED_PER_AREA} incoming reachabilities; truncating");
        }
    }

    let mut flat = Vec::new();
    let mut ranges = Vec::with_capacity(num_areas);
    for links in per_area {
        let first = flat.len() as u32;
        let count = links.len() as u32;
        flat.extend(links);
        ranges.push((first, count));
    }
    (flat, ranges)
}

/// `AAS_AreaTravelTime`: distance between two points scaled by the
/// locomotion speed factor for the area, rounded up, minimum 1.
fn area_travel_time(world: &AasWorld, area: AreaNum, from: [f32; 3], to: [f32; 3]) -> u32 {
    let dist = crate::world::length(crate::world::sub(to, from));
    let settings = world.area_settings(area);
    let crouch = settings.map(|s| s.is_crouch_only()).unwrap_or(false);
    let swimming = settings
        .map(|s| s.contents.intersects(AreaContents::WATER | AreaContents::SLIME | AreaContents::LAVA))
        .unwrap_or(false);
    let factor = speed_factor(crouch, swimming);
    let time = (dist * factor).ceil() as i64;
    time.max(1) as u32
}

fn calculate_area_travel_times(
    world: &AasWorld,
    reversed: &[ReversedLink],
    ranges: &[(u32, u32)],
) -> Vec<Vec<Vec<u32>>> {
    let mut out = Vec::with_capacity(world.area_settings.len());
    for (area_idx, _settings) in world.area_settings.iter().enumerate() {
        let area = AreaNum(area_idx as i32);
        let outgoing = world.reachabilities_of(area);
        let (first, count) = ranges.get(area_idx).copied().unwrap_or((0, 0));
        let incoming = &reversed[first as usize..(first + count) as usize];

        let mut per_outgoing = Vec::with_capacity(outgoing.len());
        for out_reach in outgoing {
            let mut per_incoming = Vec::with_capacity(incoming.len());
            for link in incoming {
                let pred = &world.reachability[link.reach_index as usize];
                per_incoming.push(area_travel_time(world, area, pred.end, out_reach.start));
            }
            per_outgoing.push(per_incoming);
        }
        out.push(per_outgoing);
    }
    out
}

fn init_portal_max_travel_times(world: &AasWorld, area_travel_times: &[Vec<Vec<u32>>]) -> Vec<u32> {
    let mut out = vec![0u32; world.portals.len() + 1];
    for (portal_idx, portal) in world.portals.iter().enumerate() {
        let area_idx = portal.area_num.as_usize();
        let max_time = area_travel_times
            .get(area_idx)
            .map(|per_outgoing| {
                per_outgoing
                    .iter()
                    .flat_map(|per_incoming| per_incoming.iter().copied())
                    .max()
                    .unwrap_or(0)
            })
            .unwrap_or(0);
        if portal_idx + 1 < out.len() {
            out[portal_idx + 1] = max_time;
        }
    }
    out
}

/// `InitReachabilityAreas`: for multi-area travel types, trace the
/// areas a bot actually passes through between `reach.start` and
/// `reach.end` so callers can check each pass-through area for hazards
/// (e.g. `DONOTENTER`) rather than only the reachability's endpoints.
fn init_reachability_areas(world: &AasWorld) -> (Vec<AreaNum>, Vec<(u32, u32)>) {
    let sampler = crate::sampler::Sampler::new(world);
    let mut flat = Vec::new();
    let mut ranges = Vec::with_capacity(world.reachability.len());
    for reach in &world.reachability {
        let first = flat.len() as u32;
        if reach.travel_type.is_multi_area() {
            let pass_areas = sampler.trace_areas(reach.start, reach.end, MAX_REACHABILITYPASSAREAS);
            flat.extend(pass_areas.into_iter().map(|(area, _point)| area));
        }
        ranges.push((first, (flat.len() as u32) - first));
    }
    (flat, ranges)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::travel::TravelType;
    use crate::world::{Area, AreaFlags, AreaSettings, PresenceType, Reachability};

    fn two_area_world() -> AasWorld {
        let mut w = AasWorld::default();
        // Index 0 is the unused solid-sentinel slot; areas are numbered
        // from 1, matching the BSP's `-area_num` convention.
        w.areas.push(Area {
            first_face: 0,
            num_faces: 0,
        });
        w.area_settings.push(AreaSettings {
            presence_type: PresenceType::NORMAL,
            area_flags: AreaFlags::empty(),
            contents: AreaContents::empty(),
            cluster: 0,
            cluster_area_num: 0,
            first_reachable_area: 0,
            num_reachable_areas: 0,
        });
        for _ in 0..2 {
            w.areas.push(Area {
                first_face: 0,
                num_faces: 0,
            });
            w.area_settings.push(AreaSettings {
                presence_type: PresenceType::NORMAL,
                area_flags: AreaFlags::empty(),
                contents: AreaContents::empty(),
                cluster: 1,
                cluster_area_num: 1,
                first_reachable_area: 0,
                num_reachable_areas: 0,
            });
        }
        w.area_settings[1].first_reachable_area = 0;
        w.area_settings[1].num_reachable_areas = 1;
        w.reachability.push(Reachability {
            area_num: AreaNum(2),
            face_num: 0,
            edge_num: 0,
            start: [0.0, 0.0, 0.0],
            end: [100.0, 0.0, 0.0],
            travel_type: TravelType::Walk,
            travel_time: 1,
        });
        w
    }

    #[test]
    fn reversed_reachability_points_back_to_source() {
        let world = two_area_world();
        let (flat, ranges) = create_reversed_reachability(&world);
        let (first, count) = ranges[2];
        assert_eq!(count, 1);
        assert_eq!(flat[first as usize].source_area, AreaNum(1));
    }

    #[test]
    fn area_travel_time_rounds_up_and_is_at_least_one() {
        let world = two_area_world();
        let t = area_travel_time(&world, AreaNum(1), [0.0, 0.0, 0.0], [0.1, 0.0, 0.0]);
        assert!(t >= 1);
    }

    #[test]
    fn table_covers_every_travel_type() {
        let table = init_travel_flag_from_type();
        for t in TravelType::ALL {
            assert_ne!(table[t as usize].0, 0);
        }
    }
}
