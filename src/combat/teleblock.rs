use crate::combat::effect::CombatEffect;
use crate::entities::entity::Entity;

/// Time-units a fresh teleblock lasts.
pub const TELEBLOCK_DURATION: u32 = 3000;

/// Time-units removed from the teleblock timer per processed cycle.
pub const TELEBLOCK_DRAIN: u32 = 50;

/// The combat effect applied when a player is teleblocked. Meaningless for
/// NPCs, which reject on apply and detach on the first removal check.
#[derive(Debug, Default)]
pub struct TeleblockEffect;

impl TeleblockEffect {
    pub const PERIOD: u32 = 50;

    pub fn new() -> Self {
        Self
    }
}

impl CombatEffect for TeleblockEffect {
    fn period(&self) -> u32 {
        Self::PERIOD
    }

    fn apply(&mut self, entity: &mut Entity) -> bool {
        if !entity.is_player() {
            return false;
        }
        if entity.teleblock_timer > 0 {
            return false;
        }
        entity.teleblock_timer = TELEBLOCK_DURATION;
        entity.send_message("You have just been teleblocked!");
        true
    }

    fn remove_on(&mut self, entity: &mut Entity) -> bool {
        if !entity.is_player() {
            return true;
        }
        if entity.teleblock_timer == 0 {
            // Expiry notification goes out exactly once, at the removal
            // check that observes it.
            entity.send_message("You feel the effects of the teleblock spell go away.");
            return true;
        }
        false
    }

    fn process(&mut self, entity: &mut Entity) {
        entity.teleblock_timer = entity.teleblock_timer.saturating_sub(TELEBLOCK_DRAIN);
    }

    fn on_login(&self, entity: &Entity) -> bool {
        entity.is_player() && entity.teleblock_timer > 0
    }
}
