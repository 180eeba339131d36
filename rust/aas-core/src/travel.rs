//! Travel types and travel flags for the reachability graph.
//!
//! `RocketJump`, `Bfgjump`, `GrappleHook`, `DoubleJump`, `RampJump`, and
//! `StrafeJump` carry flag mappings for completeness but have no
//! [`crate::mover`] handler: no compiled map in this system emits
//! reachabilities of those types, and a handler written against no real
//! reachability data would be invented, not grounded. Wire them up when
//! reachabilities of those types exist.

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TravelType {
    Invalid = 0,
    Walk = 1,
    Crouch = 2,
    BarrierJump = 3,
    Jump = 4,
    Ladder = 5,
    WalkOffLedge = 6,
    Swim = 7,
    WaterJump = 8,
    Teleport = 9,
    Elevator = 10,
    RocketJump = 11,
    Bfgjump = 12,
    GrappleHook = 13,
    DoubleJump = 14,
    RampJump = 15,
    StrafeJump = 16,
    JumpPad = 17,
    FuncBob = 18,
}

impl TravelType {
    pub const ALL: [TravelType; 19] = [
        TravelType::Invalid,
        TravelType::Walk,
        TravelType::Crouch,
        TravelType::BarrierJump,
        TravelType::Jump,
        TravelType::Ladder,
        TravelType::WalkOffLedge,
        TravelType::Swim,
        TravelType::WaterJump,
        TravelType::Teleport,
        TravelType::Elevator,
        TravelType::RocketJump,
        TravelType::Bfgjump,
        TravelType::GrappleHook,
        TravelType::DoubleJump,
        TravelType::RampJump,
        TravelType::StrafeJump,
        TravelType::JumpPad,
        TravelType::FuncBob,
    ];

    pub fn from_u8(v: u8) -> TravelType {
        TravelType::ALL
            .iter()
            .copied()
            .find(|t| *t as u8 == v)
            .unwrap_or(TravelType::Invalid)
    }

    /// Types whose reachability crosses more than one area, requiring
    /// `InitReachabilityAreas` to trace the pass-through areas.
    pub fn is_multi_area(self) -> bool {
        matches!(
            self,
            TravelType::BarrierJump
                | TravelType::WaterJump
                | TravelType::WalkOffLedge
                | TravelType::GrappleHook
        )
    }

    /// Re-routing timeout once this reachability has been chosen, per
    /// §4.3's contract. `LADDER` gets one extra second; unknown types
    /// default to 8s (and the caller should log that as an error — an
    /// unknown travel type reaching this point means the map data or
    /// `TravelType::ALL` table is out of sync).
    pub fn reachability_timeout_secs(self) -> f32 {
        match self {
            TravelType::JumpPad => 10.0,
            TravelType::Ladder => 6.0,
            TravelType::Walk
            | TravelType::Crouch
            | TravelType::BarrierJump
            | TravelType::WalkOffLedge
            | TravelType::Jump
            | TravelType::Swim
            | TravelType::WaterJump
            | TravelType::Teleport => 5.0,
            _ => 8.0,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TravelFlags(pub u32);

impl TravelFlags {
    pub const INVALID: TravelFlags = TravelFlags(1 << 0);
    pub const WALK: TravelFlags = TravelFlags(1 << 1);
    pub const CROUCH: TravelFlags = TravelFlags(1 << 2);
    pub const BARRIERJUMP: TravelFlags = TravelFlags(1 << 3);
    pub const JUMP: TravelFlags = TravelFlags(1 << 4);
    pub const LADDER: TravelFlags = TravelFlags(1 << 5);
    pub const WALKOFFLEDGE: TravelFlags = TravelFlags(1 << 6);
    pub const SWIM: TravelFlags = TravelFlags(1 << 7);
    pub const WATERJUMP: TravelFlags = TravelFlags(1 << 8);
    pub const TELEPORT: TravelFlags = TravelFlags(1 << 9);
    pub const ELEVATOR: TravelFlags = TravelFlags(1 << 10);
    pub const ROCKETJUMP: TravelFlags = TravelFlags(1 << 11);
    pub const BFGJUMP: TravelFlags = TravelFlags(1 << 12);
    pub const GRAPPLEHOOK: TravelFlags = TravelFlags(1 << 13);
    pub const DOUBLEJUMP: TravelFlags = TravelFlags(1 << 14);
    pub const RAMPJUMP: TravelFlags = TravelFlags(1 << 15);
    pub const STRAFEJUMP: TravelFlags = TravelFlags(1 << 16);
    pub const JUMPPAD: TravelFlags = TravelFlags(1 << 17);
    pub const FUNCBOB: TravelFlags = TravelFlags(1 << 18);
    pub const NOTTEAM1: TravelFlags = TravelFlags(1 << 19);
    pub const NOTTEAM2: TravelFlags = TravelFlags(1 << 20);
    pub const DONOTENTER: TravelFlags = TravelFlags(1 << 21);
    pub const WATER: TravelFlags = TravelFlags(1 << 22);
    pub const SLIME: TravelFlags = TravelFlags(1 << 23);
    pub const LAVA: TravelFlags = TravelFlags(1 << 24);
    pub const AIR: TravelFlags = TravelFlags(1 << 25);
    pub const BRIDGE: TravelFlags = TravelFlags(1 << 26);

    pub const ALL_LOCOMOTION: TravelFlags = TravelFlags(
        Self::WALK.0
            | Self::CROUCH.0
            | Self::BARRIERJUMP.0
            | Self::JUMP.0
            | Self::LADDER.0
            | Self::WALKOFFLEDGE.0
            | Self::SWIM.0
            | Self::WATERJUMP.0
            | Self::TELEPORT.0
            | Self::ELEVATOR.0
            | Self::JUMPPAD.0
            | Self::FUNCBOB.0,
    );

    pub fn contains(self, other: TravelFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn intersects(self, other: TravelFlags) -> bool {
        self.0 & other.0 != 0
    }
}

impl std::ops::BitOr for TravelFlags {
    type Output = TravelFlags;
    fn bitor(self, rhs: TravelFlags) -> TravelFlags {
        TravelFlags(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for TravelFlags {
    fn bitor_assign(&mut self, rhs: TravelFlags) {
        self.0 |= rhs.0;
    }
}

/// `travelFlagForType[type]`: the capability bit a caller must include
/// in its requested flags to use a reachability of this type.
pub fn travel_flag_for_type(t: TravelType) -> TravelFlags {
    match t {
        TravelType::Invalid => TravelFlags::INVALID,
        TravelType::Walk => TravelFlags::WALK,
        TravelType::Crouch => TravelFlags::CROUCH,
        TravelType::BarrierJump => TravelFlags::BARRIERJUMP,
        TravelType::Jump => TravelFlags::JUMP,
        TravelType::Ladder => TravelFlags::LADDER,
        TravelType::WalkOffLedge => TravelFlags::WALKOFFLEDGE,
        TravelType::Swim => TravelFlags::SWIM,
        TravelType::WaterJump => TravelFlags::WATERJUMP,
        TravelType::Teleport => TravelFlags::TELEPORT,
        TravelType::Elevator => TravelFlags::ELEVATOR,
        TravelType::RocketJump => TravelFlags::ROCKETJUMP,
        TravelType::Bfgjump => TravelFlags::BFGJUMP,
        TravelType::GrappleHook => TravelFlags::GRAPPLEHOOK,
        TravelType::DoubleJump => TravelFlags::DOUBLEJUMP,
        TravelType::RampJump => TravelFlags::RAMPJUMP,
        TravelType::StrafeJump => TravelFlags::STRAFEJUMP,
        TravelType::JumpPad => TravelFlags::JUMPPAD,
        TravelType::FuncBob => TravelFlags::FUNCBOB,
    }
}

/// Locomotion speed factor used by `AreaTravelTime`: units of
/// hundredths-of-a-second per world unit at each presence/medium speed.
pub fn speed_factor(presence_crouch: bool, swimming: bool) -> f32 {
    if swimming {
        1.0
    } else if presence_crouch {
        1.3
    } else {
        0.33
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn travel_flag_table_covers_every_type() {
        for t in TravelType::ALL {
            let f = travel_flag_for_type(t);
            assert_ne!(f.0, 0, "{t:?} must map to a nonzero flag");
        }
    }

    #[test]
    fn reachability_timeout_table_matches_contract() {
        assert_eq!(TravelType::JumpPad.reachability_timeout_secs(), 10.0);
        assert_eq!(TravelType::Ladder.reachability_timeout_secs(), 6.0);
        assert_eq!(TravelType::Walk.reachability_timeout_secs(), 5.0);
        assert_eq!(TravelType::RocketJump.reachability_timeout_secs(), 8.0);
    }

    #[test]
    fn multi_area_types_match_spec() {
        assert!(TravelType::BarrierJump.is_multi_area());
        assert!(TravelType::WaterJump.is_multi_area());
        assert!(TravelType::WalkOffLedge.is_multi_area());
        assert!(TravelType::GrappleHook.is_multi_area());
        assert!(!TravelType::Walk.is_multi_area());
        assert!(!TravelType::Jump.is_multi_area());
    }
}
