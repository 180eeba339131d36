//! Per-bot movement state table. Handles are opaque indices, guarded by
//! an `allocated` predicate — an unallocated or out-of-range handle is a
//! programmer error (§7), not a quiet no-op.

use crate::travel::TravelType;
use crate::world::{AreaNum, ReachNum, Vec3};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MoveFlags(pub u32);

impl MoveFlags {
    pub const ONGROUND: MoveFlags = MoveFlags(1 << 0);
    pub const SWIMMING: MoveFlags = MoveFlags(1 << 1);
    pub const AGAINSTLADDER: MoveFlags = MoveFlags(1 << 2);
    pub const WATERJUMP: MoveFlags = MoveFlags(1 << 3);
    pub const TELEPORTED: MoveFlags = MoveFlags(1 << 4);
    pub const WALK: MoveFlags = MoveFlags(1 << 5);
    pub const BARRIERJUMP: MoveFlags = MoveFlags(1 << 6);

    pub fn contains(self, other: MoveFlags) -> bool {
        self.0 & other.0 == other.0
    }
    pub fn set(&mut self, other: MoveFlags) {
        self.0 |= other.0;
    }
    pub fn clear(&mut self, other: MoveFlags) {
        self.0 &= !other.0;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MoveHandle(pub u32);

#[derive(Clone, Debug)]
pub struct MoveState {
    pub origin: Vec3,
    pub velocity: Vec3,
    pub view_offset: Vec3,
    pub entity_num: u32,
    pub client_num: u32,
    pub think_time: f32,
    pub view_angles: Vec3,

    pub area_num: AreaNum,
    pub last_area_num: AreaNum,
    pub last_goal_area_num: AreaNum,
    pub last_reach_num: ReachNum,
    pub last_origin: Vec3,
    pub reach_area_num: AreaNum,

    pub move_flags: MoveFlags,
    pub jump_reach: ReachNum,
    /// World time (seconds) at which the cached reachability expires.
    pub reachability_time: f64,
}

impl MoveState {
    pub fn new(entity_num: u32, client_num: u32) -> Self {
        MoveState {
            origin: [0.0; 3],
            velocity: [0.0; 3],
            view_offset: [0.0; 3],
            entity_num,
            client_num,
            think_time: 0.0,
            view_angles: [0.0; 3],
            area_num: AreaNum::INVALID,
            last_area_num: AreaNum::INVALID,
            last_goal_area_num: AreaNum::INVALID,
            last_reach_num: ReachNum::INVALID,
            last_origin: [0.0; 3],
            reach_area_num: AreaNum::INVALID,
            move_flags: MoveFlags::default(),
            jump_reach: ReachNum::INVALID,
            reachability_time: 0.0,
        }
    }

    pub fn reset(&mut self) {
        let entity_num = self.entity_num;
        let client_num = self.client_num;
        *self = MoveState::new(entity_num, client_num);
    }
}

/// Fixed-size table of per-bot movement state, indexed by [`MoveHandle`].
pub struct MoveStateTable {
    slots: Vec<Option<MoveState>>,
}

impl MoveStateTable {
    pub fn new(max_clients: usize) -> Self {
        MoveStateTable {
            slots: vec![None; max_clients + 1],
        }
    }

    pub fn alloc(&mut self, entity_num: u32, client_num: u32) -> MoveHandle {
        for (idx, slot) in self.slots.iter_mut().enumerate().skip(1) {
            if slot.is_none() {
                *slot = Some(MoveState::new(entity_num, client_num));
                return MoveHandle(idx as u32);
            }
        }
        panic!("move state table exhausted ({} slots)", self.slots.len() - 1);
    }

    pub fn free(&mut self, handle: MoveHandle) {
        if let Some(slot) = self.slots.get_mut(handle.0 as usize) {
            *slot = None;
        }
    }

    pub fn get(&self, handle: MoveHandle) -> &MoveState {
        self.slots[handle.0 as usize]
            .as_ref()
            .unwrap_or_else(|| panic!("invalid move handle {}", handle.0))
    }

    pub fn get_mut(&mut self, handle: MoveHandle) -> &mut MoveState {
        self.slots[handle.0 as usize]
            .as_mut()
            .unwrap_or_else(|| panic!("invalid move handle {}", handle.0))
    }

    pub fn init(&mut self, handle: MoveHandle, state: MoveState) {
        self.slots[handle.0 as usize] = Some(state);
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct MoveResultFlags(pub u32);

impl MoveResultFlags {
    pub const MOVEMENTVIEW: MoveResultFlags = MoveResultFlags(1 << 0);
    pub const SWIMVIEW: MoveResultFlags = MoveResultFlags(1 << 1);
    pub const ONTOPOFOBSTACLE: MoveResultFlags = MoveResultFlags(1 << 2);

    pub fn contains(self, other: MoveResultFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for MoveResultFlags {
    type Output = MoveResultFlags;
    fn bitor(self, rhs: MoveResultFlags) -> MoveResultFlags {
        MoveResultFlags(self.0 | rhs.0)
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct MoveResult {
    pub failure: bool,
    pub blocked: bool,
    pub block_entity: Option<u32>,
    pub travel_type: Option<TravelType>,
    pub flags: MoveResultFlags,
    pub movedir: Vec3,
    pub ideal_viewangles: Option<Vec3>,
}

impl MoveResult {
    pub fn failure(reason: FailureReason) -> Self {
        let _ = reason;
        MoveResult {
            failure: true,
            ..Default::default()
        }
    }

    pub fn unimplemented(travel_type: TravelType) -> Self {
        tracing::warn!(?travel_type, "travel type has no movement handler");
        MoveResult {
            failure: true,
            travel_type: Some(travel_type),
            ..Default::default()
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub enum FailureReason {
    InSolidArea,
    NoRoute,
}
