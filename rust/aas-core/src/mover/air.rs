//! Airborne steering (`BotAirControl`), gap detection, and the
//! barrier-jump feasibility test — shared by several travel-type
//! handlers.

use crate::sampler::Sampler;
use crate::world::{add, length, normalize, scale, sub, PresenceType, Vec3};

use super::physics::{SV_MAXBARRIER, SV_MAXSTEP};

/// Simulates up to 50 10ms gravity steps from `origin`/`velocity`
/// looking for the moment the ballistic path first crosses below
/// `target.z`; steers toward `target` with a speed ramp from 400 down to
/// 100 over the final 32 units. Returns `None` if the path never drops
/// to `target.z` within the simulated window.
pub fn bot_air_control(
    origin: Vec3,
    velocity: Vec3,
    target: Vec3,
    gravity: f32,
) -> Option<(Vec3, f32)> {
    let mut pos = origin;
    let mut vz = velocity[2];
    for _ in 0..50 {
        vz -= gravity * 0.01;
        pos[2] += vz * 0.01;
        if pos[2] <= target[2] {
            let to_target = sub(target, pos);
            let dist = length([to_target[0], to_target[1], 0.0]);
            let speed = if dist < 32.0 {
                100.0 + (400.0 - 100.0) * (dist / 32.0)
            } else {
                400.0
            };
            let dir = normalize([to_target[0], to_target[1], 0.0]);
            return Some((dir, speed));
        }
    }
    None
}

/// `BotGapDistance`: sample forward along `dir` looking for a drop of
/// more than `sv_maxstep + 8` relative to the running ground reference.
/// Water landings are not treated as gaps. Returns the forward distance
/// to the first gap, if any, within 100 units.
pub fn gap_distance(
    sampler: &Sampler<'_>,
    origin: Vec3,
    dir: Vec3,
    presence: PresenceType,
    point_is_water: impl Fn(Vec3) -> bool,
) -> Option<f32> {
    let dir = normalize(dir);
    let reference = sampler
        .trace_client_bbox(origin, sub(origin, [0.0, 0.0, 60.0]), presence, None)
        .ok()?;
    let mut ground_z = reference.endpos[2];

    let mut forward = 0.0f32;
    while forward <= 100.0 {
        forward += 8.0;
        let sample_xy = add(origin, scale(dir, forward));
        let down_to = sub(sample_xy, [0.0, 0.0, 48.0 + SV_MAXBARRIER]);
        let trace = sampler
            .trace_client_bbox(sample_xy, down_to, presence, None)
            .ok()?;
        if trace.fraction >= 1.0 {
            continue;
        }
        let landing_z = trace.endpos[2];
        if landing_z < ground_z - SV_MAXSTEP - 8.0 {
            if point_is_water(trace.endpos) {
                ground_z = landing_z;
                continue;
            }
            return Some(forward);
        }
        ground_z = landing_z;
    }
    None
}

/// Short forward probe at stand height: a near-immediate solid hit with
/// no step-up room means the bot is stuck against geometry it can
/// neither walk over nor barrier-jump, as opposed to merely approaching
/// a barrier it can still scale.
pub fn is_blocked(sampler: &Sampler<'_>, origin: Vec3, dir: Vec3, presence: PresenceType) -> bool {
    let dir = normalize(dir);
    let forward_to = add(origin, scale(dir, 16.0));
    let Ok(trace) = sampler.trace_client_bbox(origin, forward_to, presence, None) else {
        return false;
    };
    trace.fraction < 0.5 && !check_barrier_jump(sampler, origin, dir, presence)
}

/// `BotCheckBarrierJump`: is there a barrier ahead low enough to clear
/// with a jump, and high enough (> `sv_maxstep`) that walking over it
/// isn't simpler?
pub fn check_barrier_jump(
    sampler: &Sampler<'_>,
    origin: Vec3,
    dir: Vec3,
    presence: PresenceType,
) -> bool {
    let dir = normalize(dir);
    let up_to = add(origin, [0.0, 0.0, SV_MAXBARRIER]);
    let Ok(vertical) = sampler.trace_client_bbox(origin, up_to, presence, None) else {
        return false;
    };
    if vertical.fraction < 1.0 && vertical.endpos[2] - origin[2] < SV_MAXSTEP {
        return false;
    }

    let forward_to = add(vertical.endpos, scale(dir, 16.0));
    let Ok(horizontal) = sampler.trace_client_bbox(vertical.endpos, forward_to, presence, None)
    else {
        return false;
    };

    let down_to = sub(horizontal.endpos, [0.0, 0.0, SV_MAXBARRIER]);
    let Ok(landing) = sampler.trace_client_bbox(horizontal.endpos, down_to, presence, None) else {
        return false;
    };

    landing.endpos[2] > origin[2] + SV_MAXSTEP
}
