//! Travel-type handlers: each produces elementary actions (via
//! [`crate::ea`]) plus a [`MoveResult`] describing what happened this
//! tick. Dispatch is a `match` on [`TravelType`] (§9: tagged variant,
//! not inheritance) — handlers with no grounded reachability data
//! (`RocketJump`, `Bfgjump`, `GrappleHook`, `DoubleJump`, `RampJump`,
//! `StrafeJump`) fall through to [`MoveResult::unimplemented`].

use crate::ea::{ActionFlags, ElementaryActions};
use crate::host::{HostCollision, HostPhysics};
use crate::sampler::Sampler;
use crate::travel::TravelType;
use crate::world::{add, dot, length, normalize, scale, sub, AasWorld, PresenceType, Reachability, Vec3};

use super::air::{check_barrier_jump, gap_distance};
use super::physics::WATERJUMP_FINISH_CONTENTS_PROBE_DEPTH;
use super::state::{MoveResult, MoveResultFlags, MoveState};

pub struct HandlerContext<'a, C: HostCollision, P: HostPhysics> {
    pub ea: &'a mut ElementaryActions,
    pub physics: &'a P,
    pub sampler: &'a Sampler<'a>,
    pub collision: &'a C,
    pub world: &'a AasWorld,
    pub presence: PresenceType,
}

impl<'a, C: HostCollision, P: HostPhysics> HandlerContext<'a, C, P> {
    fn point_is_water(&self, point: Vec3) -> bool {
        const LIQUID: u32 = (1 << 0) | (1 << 1) | (1 << 2); // water | slime | lava
        self.collision.point_contents(point) & LIQUID != 0
    }
}

pub fn dispatch_ground<C: HostCollision, P: HostPhysics>(
    ctx: &mut HandlerContext<'_, C, P>,
    state: &mut MoveState,
    reach: &Reachability,
) -> MoveResult {
    match reach.travel_type {
        TravelType::Walk => travel_walk(ctx, state, reach),
        TravelType::Crouch => travel_crouch(ctx, state, reach),
        TravelType::BarrierJump => travel_barrier_jump(ctx, state, reach),
        TravelType::Swim => travel_swim(ctx, state, reach),
        TravelType::WaterJump => travel_water_jump(ctx, state, reach),
        TravelType::WalkOffLedge => travel_walk_off_ledge(ctx, state, reach),
        TravelType::Jump => travel_jump(ctx, state, reach),
        TravelType::Ladder => travel_ladder(ctx, state, reach),
        TravelType::Teleport => travel_teleport(ctx, state, reach),
        TravelType::JumpPad => travel_jump_pad(ctx, state, reach),
        other => MoveResult::unimplemented(other),
    }
}

pub fn dispatch_airborne_finish<C: HostCollision, P: HostPhysics>(
    ctx: &mut HandlerContext<'_, C, P>,
    state: &mut MoveState,
    reach: &Reachability,
) -> MoveResult {
    match reach.travel_type {
        TravelType::BarrierJump => finish_barrier_jump(ctx, state, reach),
        TravelType::WalkOffLedge => finish_walk_off_ledge(ctx, state, reach),
        TravelType::Jump => finish_jump(ctx, state, reach),
        TravelType::WaterJump => finish_water_jump(ctx, state, reach),
        TravelType::JumpPad => finish_jump_pad(ctx, state, reach),
        TravelType::Walk | TravelType::Ladder | TravelType::Swim => {
            dispatch_ground(ctx, state, reach)
        }
        TravelType::Crouch | TravelType::Teleport => MoveResult::default(),
        other => MoveResult::unimplemented(other),
    }
}

fn move_toward<C: HostCollision, P: HostPhysics>(
    ctx: &mut HandlerContext<'_, C, P>,
    state: &MoveState,
    target: Vec3,
    speed: f32,
) -> Vec3 {
    let dir = normalize(sub(target, state.origin));
    ctx.ea.move_in_direction(state.client_num, dir, speed, state.view_angles);
    dir
}

fn travel_walk<C: HostCollision, P: HostPhysics>(
    ctx: &mut HandlerContext<'_, C, P>,
    state: &mut MoveState,
    reach: &Reachability,
) -> MoveResult {
    let to_start = length(sub(reach.start, state.origin));
    let target = if to_start > 10.0 { reach.start } else { reach.end };
    let walking = state.move_flags.contains(super::state::MoveFlags::WALK);
    let dir = normalize(sub(target, state.origin));

    // `BotGapDistance`: ramp down toward a gap the same way the original
    // slows for one, ceiling 400 (200 with WALK) down to floor 40 (20
    // with WALK) as the gap closes to zero.
    let (ceiling, floor) = if walking { (200.0, 20.0) } else { (400.0, 40.0) };
    let gap = gap_distance(ctx.sampler, state.origin, dir, ctx.presence, |p| ctx.point_is_water(p));
    let speed = match gap {
        Some(dist) => floor + (ceiling - floor) * (dist / 100.0).clamp(0.0, 1.0),
        None => ceiling,
    };

    if walking {
        ctx.ea.set_action(state.client_num, ActionFlags::WALK);
    }

    let dest_crouch_only = ctx
        .world
        .area_settings(reach.area_num)
        .map(|s| s.is_crouch_only())
        .unwrap_or(false);
    if dest_crouch_only && length(sub(reach.end, state.origin)) < 20.0 {
        ctx.ea.set_action(state.client_num, ActionFlags::CROUCH);
    }

    if check_barrier_jump(ctx.sampler, state.origin, dir, ctx.presence) {
        ctx.ea.set_action(state.client_num, ActionFlags::JUMP);
    }

    let blocked = super::air::is_blocked(ctx.sampler, state.origin, dir, ctx.presence);
    let movedir = move_toward(ctx, state, target, speed);
    MoveResult {
        travel_type: Some(TravelType::Walk),
        blocked,
        movedir,
        ..Default::default()
    }
}

fn travel_crouch<C: HostCollision, P: HostPhysics>(
    ctx: &mut HandlerContext<'_, C, P>,
    state: &mut MoveState,
    reach: &Reachability,
) -> MoveResult {
    ctx.ea.set_action(state.client_num, ActionFlags::CROUCH);
    let movedir = move_toward(ctx, state, reach.end, 400.0);
    MoveResult {
        travel_type: Some(TravelType::Crouch),
        movedir,
        ..Default::default()
    }
}

fn travel_barrier_jump<C: HostCollision, P: HostPhysics>(
    ctx: &mut HandlerContext<'_, C, P>,
    state: &mut MoveState,
    reach: &Reachability,
) -> MoveResult {
    let dist = length(sub(reach.start, state.origin));
    let movedir;
    if dist < 9.0 {
        ctx.ea.set_action(state.client_num, ActionFlags::JUMP);
        movedir = move_toward(ctx, state, reach.end, 6.0 * dist.min(60.0));
    } else {
        movedir = move_toward(ctx, state, reach.start, 6.0 * dist.min(60.0));
    }
    state.move_flags.set(super::state::MoveFlags::BARRIERJUMP);
    MoveResult {
        travel_type: Some(TravelType::BarrierJump),
        movedir,
        ..Default::default()
    }
}

fn finish_barrier_jump<C: HostCollision, P: HostPhysics>(
    ctx: &mut HandlerContext<'_, C, P>,
    state: &mut MoveState,
    reach: &Reachability,
) -> MoveResult {
    if state.velocity[2] < 250.0 {
        let movedir = move_toward(ctx, state, reach.end, 400.0);
        return MoveResult {
            travel_type: Some(TravelType::BarrierJump),
            movedir,
            ..Default::default()
        };
    }
    MoveResult {
        travel_type: Some(TravelType::BarrierJump),
        ..Default::default()
    }
}

fn travel_swim<C: HostCollision, P: HostPhysics>(
    ctx: &mut HandlerContext<'_, C, P>,
    state: &mut MoveState,
    reach: &Reachability,
) -> MoveResult {
    let movedir = move_toward(ctx, state, reach.start, 400.0);
    state.view_angles = view_angles_for_dir(movedir);
    MoveResult {
        travel_type: Some(TravelType::Swim),
        movedir,
        flags: MoveResultFlags::SWIMVIEW,
        ideal_viewangles: Some(state.view_angles),
    }
}

fn travel_water_jump<C: HostCollision, P: HostPhysics>(
    ctx: &mut HandlerContext<'_, C, P>,
    state: &mut MoveState,
    reach: &Reachability,
) -> MoveResult {
    let mut dir = normalize(sub(reach.end, state.origin));
    // Fixed upward bias toward the lip; no RNG source here, so this is
    // a deterministic stand-in for the scatter the original adds.
    dir[2] += 0.35;
    ctx.ea.move_in_direction(state.client_num, dir, 200.0, state.view_angles);
    if length(sub(reach.end, state.origin)) < 40.0 {
        ctx.ea.set_action(state.client_num, ActionFlags::MOVEUP);
    }
    state.move_flags.set(super::state::MoveFlags::WATERJUMP);
    MoveResult {
        travel_type: Some(TravelType::WaterJump),
        movedir: dir,
        ..Default::default()
    }
}

/// Whether the bot has cleared a water-jump: still rising (`WATERJUMP`
/// flag set) counts as in-progress. Otherwise the caller is expected to
/// probe contents at `origin - (0, 0, WATERJUMP_FINISH_CONTENTS_PROBE_DEPTH)`
/// via [`crate::host::HostCollision`] — this module only sees
/// [`HostPhysics`], so the actual probe happens one layer up in
/// [`super::move_to_goal`].
pub fn water_jump_probe_point(origin: Vec3) -> Vec3 {
    [origin[0], origin[1], origin[2] - WATERJUMP_FINISH_CONTENTS_PROBE_DEPTH]
}

fn finish_water_jump<C: HostCollision, P: HostPhysics>(
    _ctx: &mut HandlerContext<'_, C, P>,
    _state: &mut MoveState,
    _reach: &Reachability,
) -> MoveResult {
    // Completion is area-transition driven (see move_to_goal); nothing to
    // steer here beyond holding still until the bot clears the lip.
    MoveResult {
        travel_type: Some(TravelType::WaterJump),
        ..Default::default()
    }
}

fn travel_walk_off_ledge<C: HostCollision, P: HostPhysics>(
    ctx: &mut HandlerContext<'_, C, P>,
    state: &mut MoveState,
    reach: &Reachability,
) -> MoveResult {
    let xy_dist = length([
        reach.end[0] - reach.start[0],
        reach.end[1] - reach.start[1],
        0.0,
    ]);
    let speed = if xy_dist < 20.0 {
        100.0
    } else if length(sub(reach.start, state.origin)) < 48.0 {
        ctx.physics
            .horizontal_velocity_for_jump(0.0, reach.start, reach.end)
            .unwrap_or(400.0)
    } else {
        400.0
    };
    let target = if length(sub(reach.start, state.origin)) < 48.0 {
        reach.end
    } else {
        reach.start
    };
    let movedir = move_toward(ctx, state, target, speed);
    MoveResult {
        travel_type: Some(TravelType::WalkOffLedge),
        movedir,
        ..Default::default()
    }
}

fn finish_walk_off_ledge<C: HostCollision, P: HostPhysics>(
    ctx: &mut HandlerContext<'_, C, P>,
    state: &mut MoveState,
    reach: &Reachability,
) -> MoveResult {
    match super::air::bot_air_control(state.origin, state.velocity, reach.end, super::physics::SV_GRAVITY)
    {
        Some((dir, speed)) => {
            ctx.ea.move_in_direction(state.client_num, dir, speed, state.view_angles);
            MoveResult {
                travel_type: Some(TravelType::WalkOffLedge),
                movedir: dir,
                ..Default::default()
            }
        }
        None => MoveResult {
            travel_type: Some(TravelType::WalkOffLedge),
            ..Default::default()
        },
    }
}

fn travel_jump<C: HostCollision, P: HostPhysics>(
    ctx: &mut HandlerContext<'_, C, P>,
    state: &mut MoveState,
    reach: &Reachability,
) -> MoveResult {
    let mut run_start = ctx.physics.jump_reach_run_start(reach.start, reach.end);

    // If a gap sits between the bot and the running path, back `run_start`
    // away from `reach.start` in 10-unit steps (up to 80) so the bot gets
    // a running start before the gap instead of stopping short of it.
    let back_dir = normalize(sub(run_start, reach.start));
    if back_dir != [0.0, 0.0, 0.0] {
        for _ in 0..8 {
            let probe_dir = normalize(sub(run_start, state.origin));
            if gap_distance(ctx.sampler, state.origin, probe_dir, ctx.presence, |p| {
                ctx.point_is_water(p)
            })
            .is_none()
            {
                break;
            }
            run_start = add(run_start, scale(back_dir, 10.0));
        }
    }

    let to_start = normalize(sub(reach.start, state.origin));
    let to_run_start = normalize(sub(run_start, state.origin));
    let at_jump_point =
        dot(to_start, to_run_start) < -0.8 || length(sub(state.origin, run_start)) < 5.0;

    if at_jump_point {
        state.view_angles = view_angles_for_dir(normalize(sub(reach.end, state.origin)));
        let dist_from_start = length(sub(state.origin, reach.start));
        if (24.0..=32.0).contains(&dist_from_start) {
            ctx.ea.set_action(state.client_num, ActionFlags::DELAYED_JUMP);
        } else {
            ctx.ea.set_action(state.client_num, ActionFlags::JUMP);
        }
        let movedir = move_toward(ctx, state, reach.end, 600.0);
        state.jump_reach = state.last_reach_num;
        return MoveResult {
            travel_type: Some(TravelType::Jump),
            movedir,
            ideal_viewangles: Some(state.view_angles),
            ..Default::default()
        };
    }

    let movedir = move_toward(ctx, state, run_start, 400.0);
    MoveResult {
        travel_type: Some(TravelType::Jump),
        movedir,
        ..Default::default()
    }
}

fn finish_jump<C: HostCollision, P: HostPhysics>(
    ctx: &mut HandlerContext<'_, C, P>,
    state: &mut MoveState,
    reach: &Reachability,
) -> MoveResult {
    if state.jump_reach.is_valid() {
        let movedir = move_toward(ctx, state, reach.end, 800.0);
        return MoveResult {
            travel_type: Some(TravelType::Jump),
            movedir,
            ..Default::default()
        };
    }
    MoveResult {
        travel_type: Some(TravelType::Jump),
        ..Default::default()
    }
}

fn travel_ladder<C: HostCollision, P: HostPhysics>(
    ctx: &mut HandlerContext<'_, C, P>,
    state: &mut MoveState,
    reach: &Reachability,
) -> MoveResult {
    let dir = normalize(sub(reach.end, state.origin));
    let mut view_dir = dir;
    view_dir[2] = 3.0 * dir[2];
    let view_angles = view_angles_for_dir(normalize(view_dir));
    state.view_angles = view_angles;
    ctx.ea.move_in_direction(state.client_num, [0.0, 0.0, 0.0], 0.0, view_angles);
    ctx.ea.set_action(state.client_num, ActionFlags::MOVEFORWARD);
    MoveResult {
        travel_type: Some(TravelType::Ladder),
        movedir: dir,
        flags: MoveResultFlags::MOVEMENTVIEW,
        ideal_viewangles: Some(view_angles),
    }
}

fn travel_teleport<C: HostCollision, P: HostPhysics>(
    ctx: &mut HandlerContext<'_, C, P>,
    state: &mut MoveState,
    reach: &Reachability,
) -> MoveResult {
    if state.move_flags.contains(super::state::MoveFlags::TELEPORTED) {
        return MoveResult {
            travel_type: Some(TravelType::Teleport),
            ..Default::default()
        };
    }
    let dist = length(sub(reach.start, state.origin));
    let speed = if dist < 30.0 { 200.0 } else { 400.0 };
    let movedir = move_toward(ctx, state, reach.start, speed);
    MoveResult {
        travel_type: Some(TravelType::Teleport),
        movedir,
        ..Default::default()
    }
}

fn travel_jump_pad<C: HostCollision, P: HostPhysics>(
    ctx: &mut HandlerContext<'_, C, P>,
    state: &mut MoveState,
    reach: &Reachability,
) -> MoveResult {
    let movedir = move_toward(ctx, state, reach.start, 400.0);
    MoveResult {
        travel_type: Some(TravelType::JumpPad),
        movedir,
        ..Default::default()
    }
}

fn finish_jump_pad<C: HostCollision, P: HostPhysics>(
    ctx: &mut HandlerContext<'_, C, P>,
    state: &mut MoveState,
    reach: &Reachability,
) -> MoveResult {
    match super::air::bot_air_control(state.origin, state.velocity, reach.end, super::physics::SV_GRAVITY)
    {
        Some((dir, speed)) => {
            ctx.ea.move_in_direction(state.client_num, dir, speed, state.view_angles);
            MoveResult {
                travel_type: Some(TravelType::JumpPad),
                movedir: dir,
                ..Default::default()
            }
        }
        None => MoveResult {
            travel_type: Some(TravelType::JumpPad),
            ..Default::default()
        },
    }
}

/// `BotMoveInGoalArea`: direct approach within the goal's own area;
/// speed ramps from 400 at 100 units down to 0 at the goal.
pub fn move_in_goal_area<C: HostCollision, P: HostPhysics>(
    ctx: &mut HandlerContext<'_, C, P>,
    state: &mut MoveState,
    goal_origin: Vec3,
) -> MoveResult {
    let to_goal = sub(goal_origin, state.origin);
    let dist = length(to_goal);
    let speed = (400.0 * (dist / 100.0)).clamp(0.0, 400.0);

    if state.move_flags.contains(super::state::MoveFlags::SWIMMING) {
        let dir = normalize(to_goal);
        ctx.ea.move_in_direction(state.client_num, dir, speed, state.view_angles);
        return MoveResult {
            travel_type: None,
            movedir: dir,
            flags: MoveResultFlags::SWIMVIEW,
            ideal_viewangles: None,
        };
    }

    let dir = normalize([to_goal[0], to_goal[1], 0.0]);
    ctx.ea.move_in_direction(state.client_num, dir, speed, state.view_angles);
    MoveResult {
        travel_type: None,
        movedir: dir,
        ..Default::default()
    }
}

fn view_angles_for_dir(dir: Vec3) -> Vec3 {
    let yaw = dir[1].atan2(dir[0]).to_degrees();
    let horiz = length([dir[0], dir[1], 0.0]);
    let pitch = (-dir[2]).atan2(horiz.max(1e-6)).to_degrees();
    [pitch, yaw, 0.0]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ladder_view_angles_pitch_up_steeply() {
        let dir = normalize([0.0, 0.0, 1.0 * 3.0]);
        let angles = view_angles_for_dir(dir);
        assert!(angles[0] < -70.0 && angles[0] > -90.0, "pitch was {}", angles[0]);
    }
}
