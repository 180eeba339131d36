//! Elementary actions: the per-client input buffer the Mover writes
//! into and the host reads back out once per think, and the low-level
//! helper that turns a world-space move direction into forward/right
//! stick values relative to a view.
//!
//! This mirrors `be_ea.c`'s `bot_input_t` model: actions accumulate
//! across a think (multiple calls may set different flags) and are
//! cleared explicitly, not implicitly on read.

use crate::world::{dot, normalize, Vec3};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ActionFlags(pub u32);

impl ActionFlags {
    pub const ATTACK: ActionFlags = ActionFlags(1 << 0);
    pub const JUMP: ActionFlags = ActionFlags(1 << 1);
    pub const DELAYED_JUMP: ActionFlags = ActionFlags(1 << 2);
    pub const CROUCH: ActionFlags = ActionFlags(1 << 3);
    pub const MOVEUP: ActionFlags = ActionFlags(1 << 4);
    pub const MOVEDOWN: ActionFlags = ActionFlags(1 << 5);
    pub const MOVEFORWARD: ActionFlags = ActionFlags(1 << 6);
    pub const MOVEBACK: ActionFlags = ActionFlags(1 << 7);
    pub const MOVELEFT: ActionFlags = ActionFlags(1 << 8);
    pub const MOVERIGHT: ActionFlags = ActionFlags(1 << 9);
    pub const WALK: ActionFlags = ActionFlags(1 << 10);
    pub const TALK: ActionFlags = ActionFlags(1 << 11);
    pub const GESTURE: ActionFlags = ActionFlags(1 << 12);
    pub const USE: ActionFlags = ActionFlags(1 << 13);
    pub const RESPAWN: ActionFlags = ActionFlags(1 << 14);

    pub fn contains(self, other: ActionFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for ActionFlags {
    type Output = ActionFlags;
    fn bitor(self, rhs: ActionFlags) -> ActionFlags {
        ActionFlags(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for ActionFlags {
    fn bitor_assign(&mut self, rhs: ActionFlags) {
        self.0 |= rhs.0;
    }
}

/// One client's accumulated input for the current think: a world-space
/// move direction and speed (resolved to forward/right/up at read time),
/// a desired view angle, and the action flag accumulator.
#[derive(Clone, Copy, Debug, Default)]
pub struct BotInput {
    pub dir: Vec3,
    pub speed: f32,
    pub viewangles: Vec3,
    pub actionflags: ActionFlags,
}

/// `bot_input_t` table, one slot per client. The Mover writes through
/// [`ElementaryActions::move_in_direction`]/`set_action`; the host reads
/// the finished buffer back out with [`ElementaryActions::get_input`]
/// and is responsible for clearing it once consumed.
#[derive(Clone, Debug, Default)]
pub struct ElementaryActions {
    inputs: Vec<BotInput>,
}

impl ElementaryActions {
    pub fn new(max_clients: usize) -> Self {
        ElementaryActions {
            inputs: vec![BotInput::default(); max_clients + 1],
        }
    }

    fn slot_mut(&mut self, client_num: u32) -> &mut BotInput {
        let idx = client_num as usize;
        if idx >= self.inputs.len() {
            self.inputs.resize(idx + 1, BotInput::default());
        }
        &mut self.inputs[idx]
    }

    /// `EA_Move`: records a desired world-space direction and speed for
    /// this think. Later calls in the same think overwrite the
    /// direction but accumulate action flags.
    pub fn move_in_direction(&mut self, client_num: u32, dir: Vec3, speed: f32, viewangles: Vec3) {
        let input = self.slot_mut(client_num);
        input.dir = normalize(dir);
        input.speed = speed;
        input.viewangles = viewangles;
    }

    pub fn set_action(&mut self, client_num: u32, flags: ActionFlags) {
        self.slot_mut(client_num).actionflags |= flags;
    }

    /// `EA_GetInput`: projects the stored move direction onto the given
    /// forward/right view basis to produce forward/right/up stick
    /// values in `[-400, 400]`, matching the host's expected input range.
    pub fn get_input(&self, client_num: u32, forward: Vec3, right: Vec3) -> ResolvedInput {
        let Some(input) = self.inputs.get(client_num as usize) else {
            return ResolvedInput::default();
        };
        let forwardmove = (dot(input.dir, forward) * input.speed).clamp(-400.0, 400.0);
        let rightmove = (dot(input.dir, right) * input.speed).clamp(-400.0, 400.0);
        let upmove = if input.actionflags.contains(ActionFlags::MOVEUP) {
            400.0
        } else if input.actionflags.contains(ActionFlags::MOVEDOWN) {
            -400.0
        } else {
            0.0
        };

        ResolvedInput {
            forwardmove,
            rightmove,
            upmove,
            viewangles: input.viewangles,
            actionflags: input.actionflags,
        }
    }

    /// `EA_ResetInput`: clears the move direction and action flags
    /// ahead of the next think. View angles persist — the bot keeps
    /// looking where it was looking until something chooses otherwise.
    pub fn reset_input(&mut self, client_num: u32) {
        let input = self.slot_mut(client_num);
        input.dir = [0.0; 3];
        input.speed = 0.0;
        input.actionflags = ActionFlags::default();
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ResolvedInput {
    pub forwardmove: f32,
    pub rightmove: f32,
    pub upmove: f32,
    pub viewangles: Vec3,
    pub actionflags: ActionFlags,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn move_forward_resolves_to_forwardmove() {
        let mut ea = ElementaryActions::new(4);
        ea.move_in_direction(1, [1.0, 0.0, 0.0], 400.0, [0.0, 0.0, 0.0]);
        let resolved = ea.get_input(1, [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]);
        assert!((resolved.forwardmove - 400.0).abs() < 0.01);
        assert!(resolved.rightmove.abs() < 0.01);
    }

    #[test]
    fn reset_clears_action_flags_but_keeps_view() {
        let mut ea = ElementaryActions::new(4);
        ea.move_in_direction(1, [0.0, 1.0, 0.0], 300.0, [10.0, 20.0, 0.0]);
        ea.set_action(1, ActionFlags::JUMP);
        ea.reset_input(1);
        let resolved = ea.get_input(1, [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]);
        assert!(!resolved.actionflags.contains(ActionFlags::JUMP));
        assert_eq!(resolved.viewangles, [10.0, 20.0, 0.0]);
    }
}
