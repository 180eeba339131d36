//! Goal containment test (`BotTouchingGoal`, be_ai_goal.c): is an origin
//! within a goal volume, once the goal's own bounding box is contracted
//! by the agent's presence bbox so touching is exact rather than
//! center-point approximate.

use crate::sampler::presence_type_bounding_box;
use crate::world::{PresenceType, Vec3};

/// A goal entity: a world-space origin plus the mins/maxs of its own
/// bounding volume (item pickups, triggers, etc. — not the agent).
#[derive(Clone, Copy, Debug)]
pub struct Goal {
    pub area_num: crate::world::AreaNum,
    pub origin: Vec3,
    pub mins: Vec3,
    pub maxs: Vec3,
}

/// `BotTouchingGoal`: true iff `origin` lies within
/// `[goal.origin + goal.mins - presence.maxs, goal.origin + goal.maxs - presence.mins]`,
/// using the `NORMAL` presence bbox (standing height) per the contract.
pub fn bot_touching_goal(origin: Vec3, goal: &Goal) -> bool {
    let presence = presence_type_bounding_box(PresenceType::NORMAL);
    for i in 0..3 {
        let lo = goal.origin[i] + goal.mins[i] - presence.maxs[i];
        let hi = goal.origin[i] + goal.maxs[i] - presence.mins[i];
        if origin[i] < lo || origin[i] > hi {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::AreaNum;

    fn goal_at(origin: Vec3) -> Goal {
        Goal {
            area_num: AreaNum(1),
            origin,
            mins: [-8.0, -8.0, -8.0],
            maxs: [8.0, 8.0, 8.0],
        }
    }

    #[test]
    fn origin_at_goal_center_touches() {
        let goal = goal_at([100.0, 0.0, 0.0]);
        assert!(bot_touching_goal([100.0, 0.0, 0.0], &goal));
    }

    #[test]
    fn origin_far_away_does_not_touch() {
        let goal = goal_at([100.0, 0.0, 0.0]);
        assert!(!bot_touching_goal([500.0, 0.0, 0.0], &goal));
    }

    #[test]
    fn contraction_uses_presence_bbox_not_a_point() {
        // Standing maxs.z is 32; a goal box extending 8 units up should
        // still register as touched from a foot position near its base
        // because of the presence contraction, not just at its center.
        let goal = goal_at([0.0, 0.0, 40.0]);
        assert!(bot_touching_goal([0.0, 0.0, 20.0], &goal));
    }
}
