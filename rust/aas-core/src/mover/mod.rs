//! The Mover: turns "stand here, reach that goal area" into elementary
//! actions, one think at a time. `move_to_goal` is `BotMoveToGoal`'s
//! direct analogue — re-sense traction, pick or reuse a reachability,
//! dispatch to its travel-type handler, cache what was chosen.

pub mod air;
pub mod handlers;
pub mod physics;
pub mod state;

use crate::errors::MoverError;
use crate::host::{HostCollision, HostPhysics};
use crate::router::{RoutingTables, RouteResult, Router};
use crate::sampler::Sampler;
use crate::travel::{TravelFlags, TravelType};
use crate::world::{add, length, normalize, scale, AasWorld, AreaNum, PresenceType, ReachNum, Vec3};

use handlers::HandlerContext;
pub use state::{FailureReason, MoveFlags, MoveHandle, MoveResult, MoveResultFlags, MoveState, MoveStateTable};

/// One think's worth of movement. Borrows everything it needs rather
/// than owning a `Sampler`/`Router`, so callers can rebuild those cheaply
/// per-think without the Mover itself holding map state.
pub struct MoveInputs<'w, C: HostCollision, P: HostPhysics> {
    pub world: &'w AasWorld,
    pub tables: &'w RoutingTables,
    pub collision: &'w C,
    pub physics: &'w P,
    pub goal_area: AreaNum,
    pub goal_origin: Vec3,
    pub travel_flags: TravelFlags,
}

/// `BotMoveToGoal`. Returns `Err` only for a condition the caller must
/// react to structurally (the bot is nowhere, i.e. not in any area at
/// all); anything routable-but-failed comes back as a non-fatal
/// [`MoveResult::failure`].
pub fn move_to_goal<C: HostCollision, P: HostPhysics>(
    inputs: &MoveInputs<'_, C, P>,
    ea: &mut crate::ea::ElementaryActions,
    state: &mut MoveState,
) -> Result<MoveResult, MoverError> {
    let sampler = Sampler::new(inputs.world);
    let router = Router::new(inputs.world, inputs.tables);

    // Step 1: clear this think's transient traction flags, re-sense them
    // against current geometry rather than trusting last think's values.
    state
        .move_flags
        .clear(MoveFlags::ONGROUND | MoveFlags::SWIMMING | MoveFlags::AGAINSTLADDER);

    let presence = inputs
        .world
        .area_settings(state.area_num)
        .map(|s| if s.is_crouch_only() { PresenceType::CROUCH } else { PresenceType::NORMAL })
        .unwrap_or(PresenceType::NORMAL);

    let on_ground = sampler.on_ground(state.origin, presence).unwrap_or(false);
    let swimming = sampler.swimming(state.origin, |p| inputs.collision.point_contents(p));
    let against_ladder = sampler.against_ladder(state.origin);

    if on_ground {
        state.move_flags.set(MoveFlags::ONGROUND);
    }
    if swimming {
        state.move_flags.set(MoveFlags::SWIMMING);
    }
    if against_ladder {
        state.move_flags.set(MoveFlags::AGAINSTLADDER);
    }

    let mut ctx = HandlerContext {
        ea,
        physics: inputs.physics,
        sampler: &sampler,
        collision: inputs.collision,
        world: inputs.world,
        presence,
    };
    let has_traction = on_ground || swimming || against_ladder;

    let result = if has_traction {
        ground_think(&sampler, &router, inputs, &mut ctx, state)?
    } else {
        airborne_think(inputs, &sampler, &mut ctx, state)
    };

    // Step 4: a blocked think means the chosen reachability isn't working
    // out; pull its re-planning deadline closer instead of waiting out
    // the full per-type timeout.
    if result.blocked {
        state.reachability_time -= 10.0 * state.think_time as f64;
    }

    state.last_origin = state.origin;
    Ok(result)
}

fn ground_think<C: HostCollision, P: HostPhysics>(
    sampler: &Sampler<'_>,
    router: &Router<'_>,
    inputs: &MoveInputs<'_, C, P>,
    ctx: &mut HandlerContext<'_, C, P>,
    state: &mut MoveState,
) -> Result<MoveResult, MoverError> {
    // Landing clears any jump/waterjump in progress.
    state.move_flags.clear(MoveFlags::WATERJUMP | MoveFlags::BARRIERJUMP);
    state.jump_reach = ReachNum::INVALID;

    let area_num = sampler.point_reachability_area_num(state.origin);
    if !area_num.is_valid() {
        return Err(MoverError::InSolidArea);
    }
    state.area_num = area_num;
    ctx.presence = inputs
        .world
        .area_settings(area_num)
        .map(|s| if s.is_crouch_only() { PresenceType::CROUCH } else { PresenceType::NORMAL })
        .unwrap_or(PresenceType::NORMAL);

    if area_num == inputs.goal_area {
        state.last_goal_area_num = AreaNum::INVALID;
        return Ok(handlers::move_in_goal_area(ctx, state, inputs.goal_origin));
    }

    let now_secs = inputs.physics.milliseconds() as f64 / 1000.0;
    let cache_valid = state.last_goal_area_num == inputs.goal_area
        && state.last_area_num == area_num
        && state.last_reach_num.is_valid()
        && state.reachability_time > now_secs;

    let reach_num = if cache_valid {
        state.last_reach_num
    } else {
        match router.route(area_num, state.origin, inputs.goal_area, inputs.travel_flags) {
            RouteResult::AtGoal => ReachNum::INVALID,
            RouteResult::Unreachable => ReachNum::INVALID,
            RouteResult::Reachability { reach, .. } => {
                let travel_type = inputs.world.reachability[reach.as_usize()].travel_type;
                state.last_goal_area_num = inputs.goal_area;
                state.last_area_num = area_num;
                state.last_reach_num = reach;
                state.reachability_time = now_secs + travel_type.reachability_timeout_secs() as f64;
                reach
            }
        }
    };

    if !reach_num.is_valid() {
        return Ok(MoveResult::failure(FailureReason::NoRoute));
    }

    let reach = inputs.world.reachability[reach_num.as_usize()];
    Ok(handlers::dispatch_ground(ctx, state, &reach))
}

/// Airborne: no traction this think, so steer using whatever
/// reachability was last committed to (a jump, barrier-jump, water-jump
/// or jump-pad launch in progress). A jump pad can relaunch the bot
/// mid-flight onto a second jump-pad reachability — re-checking the
/// cached reachability's travel type each think, rather than latching a
/// single "airborne" mode, naturally picks that up.
fn airborne_think<C: HostCollision, P: HostPhysics>(
    inputs: &MoveInputs<'_, C, P>,
    sampler: &Sampler<'_>,
    ctx: &mut HandlerContext<'_, C, P>,
    state: &mut MoveState,
) -> MoveResult {
    if !state.last_reach_num.is_valid() {
        match detect_unplanned_jump_pad(inputs, sampler, state) {
            Some(reach_num) => state.last_reach_num = reach_num,
            None => return MoveResult::default(),
        }
    }
    let reach = inputs.world.reachability[state.last_reach_num.as_usize()];

    if reach.travel_type == TravelType::WaterJump
        && !state.move_flags.contains(MoveFlags::WATERJUMP)
    {
        const LIQUID: u32 = (1 << 0) | (1 << 1) | (1 << 2); // water | slime | lava
        let probe = handlers::water_jump_probe_point(state.origin);
        if inputs.collision.point_contents(probe) & LIQUID == 0 {
            state.last_reach_num = ReachNum::INVALID;
            return MoveResult::default();
        }
    }

    handlers::dispatch_airborne_finish(ctx, state, &reach)
}

/// Scans backward along the bot's velocity for an area the bot passed
/// through that carries a jump-pad reachability, covering the case
/// where the bot got launched without the Mover ever choosing that
/// reachability itself (e.g. a trigger-driven pad). Adopts the first
/// one found so `airborne_think` has something to steer by.
fn detect_unplanned_jump_pad<C: HostCollision, P: HostPhysics>(
    inputs: &MoveInputs<'_, C, P>,
    sampler: &Sampler<'_>,
    state: &MoveState,
) -> Option<ReachNum> {
    if length(state.velocity) < 1.0 {
        return None;
    }
    let back_dir = normalize(scale(state.velocity, -1.0));
    let scan_end = add(state.origin, scale(back_dir, 64.0));
    for (area, _point) in sampler.trace_areas(state.origin, scan_end, 8) {
        let Some(settings) = inputs.world.area_settings(area) else {
            continue;
        };
        for (local_idx, reach) in inputs.world.reachabilities_of(area).iter().enumerate() {
            if reach.travel_type == TravelType::JumpPad {
                let reach_idx = settings.first_reachable_area as usize + local_idx;
                return Some(ReachNum(reach_idx as i32));
            }
        }
    }
    None
}
