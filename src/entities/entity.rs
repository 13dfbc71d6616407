use crate::combat::effect::EffectRegistry;
use crate::combat::hit::Hit;
use crate::combat::poison::PoisonTier;
use crate::combat::prayer::{PrayerDrain, PrayerKind};
use crate::entities::timers::{TimerKey, TimerRepository};
use crate::telemetry::logging;
use crate::world::npc::NpcTypeId;
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Player,
    Npc,
}

/// Fire-and-forget updates queued for an interactive entity's client. The
/// net layer drains these; nothing in the core blocks on them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundMessage {
    Text(String),
    ConfigState { id: u16, value: u8 },
}

/// A living entity in the simulation. Owns its timer repository, effect
/// registry and active-prayer set for its entire lifetime.
#[derive(Debug)]
pub struct Entity {
    pub id: EntityId,
    pub name: String,
    pub kind: EntityKind,
    pub npc_type: Option<NpcTypeId>,
    pub health: u32,
    pub max_health: u32,
    pub poison_tier: Option<PoisonTier>,
    pub poison_damage: u32,
    /// Teleblock countdown in raw time-units, not repository ticks.
    pub teleblock_timer: u32,
    pub prayer_points: u32,
    pub prayer_level: u32,
    pub active_prayers: HashSet<PrayerKind>,
    pub head_icon: Option<u8>,
    pub appearance_update: bool,
    pub timers: TimerRepository,
    pub effects: EffectRegistry,
    prayer_drain: Option<PrayerDrain>,
    pending_drain_spawn: bool,
    outbox: Vec<OutboundMessage>,
}

impl Entity {
    pub fn new_player(id: EntityId, name: impl Into<String>) -> Self {
        Self::new(id, name, EntityKind::Player, None)
    }

    pub fn new_npc(id: EntityId, name: impl Into<String>, npc_type: NpcTypeId) -> Self {
        Self::new(id, name, EntityKind::Npc, Some(npc_type))
    }

    fn new(
        id: EntityId,
        name: impl Into<String>,
        kind: EntityKind,
        npc_type: Option<NpcTypeId>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            npc_type,
            health: 100,
            max_health: 100,
            poison_tier: None,
            poison_damage: 0,
            teleblock_timer: 0,
            prayer_points: 99,
            prayer_level: 99,
            active_prayers: HashSet::new(),
            head_icon: None,
            appearance_update: false,
            timers: TimerRepository::new(),
            effects: EffectRegistry::new(),
            prayer_drain: None,
            pending_drain_spawn: false,
            outbox: Vec::new(),
        }
    }

    pub fn is_player(&self) -> bool {
        self.kind == EntityKind::Player
    }

    /// The poison flag is derived: an entity is poisoned while its damage
    /// counter is above zero.
    pub fn poisoned(&self) -> bool {
        self.poison_damage > 0
    }

    pub fn poison_immune(&self) -> bool {
        self.timers.has(TimerKey::PoisonImmunity)
    }

    pub fn grant_poison_immunity(&mut self, ticks: u32) {
        self.timers.add_or_extend(TimerKey::PoisonImmunity, ticks);
    }

    /// Applies a hit, flooring health at zero. Returns the damage actually
    /// applied.
    pub fn damage(&mut self, hit: Hit) -> u32 {
        let applied = hit.damage.min(self.health);
        self.health -= applied;
        if applied > 0 {
            logging::log_combat(&format!(
                "{} took {} damage ({})",
                self.name,
                applied,
                hit.hit_type.name()
            ));
        }
        applied
    }

    pub fn flag_appearance(&mut self) {
        self.appearance_update = true;
    }

    /// Queues a chat-box message. Non-interactive entities never receive
    /// messages, so this is a no-op for them.
    pub fn send_message(&mut self, message: impl Into<String>) {
        if self.is_player() {
            self.outbox.push(OutboundMessage::Text(message.into()));
        }
    }

    /// Queues a client config state, e.g. a prayer button toggle.
    pub fn send_config(&mut self, id: u16, value: u8) {
        if self.is_player() {
            self.outbox.push(OutboundMessage::ConfigState { id, value });
        }
    }

    pub fn take_outbox(&mut self) -> Vec<OutboundMessage> {
        std::mem::take(&mut self.outbox)
    }

    pub fn prayer_drain(&self) -> Option<&PrayerDrain> {
        self.prayer_drain.as_ref()
    }

    /// Ensures a live drain handle exists, creating one and flagging a spawn
    /// request when the previous task finished or none was ever started.
    /// Called under the world lock, so at most one task is ever live.
    pub fn ensure_prayer_drain(&mut self) {
        let running = self
            .prayer_drain
            .as_ref()
            .map_or(false, PrayerDrain::is_running);
        if !running {
            self.prayer_drain = Some(PrayerDrain::new_running());
            self.pending_drain_spawn = true;
        }
    }

    /// Hands out the handle for a requested drain task exactly once; the
    /// caller attaches the background thread to it.
    pub fn take_drain_spawn_request(&mut self) -> Option<PrayerDrain> {
        if !self.pending_drain_spawn {
            return None;
        }
        self.pending_drain_spawn = false;
        self.prayer_drain.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::hit::HitType;

    #[test]
    fn damage_floors_health_at_zero() {
        let mut entity = Entity::new_player(EntityId(1), "alice");
        entity.health = 3;
        let applied = entity.damage(Hit::new(10, HitType::Normal));
        assert_eq!(applied, 3);
        assert_eq!(entity.health, 0);
    }

    #[test]
    fn damage_reports_the_hit_type_to_the_combat_log() {
        let root = std::env::temp_dir().join(format!("edgeville-test-{}", std::process::id()));
        crate::telemetry::logging::init(&root).expect("logging init");
        let mut entity = Entity::new_player(EntityId(9), "erin");
        entity.damage(Hit::new(5, HitType::Poison));
        let log = std::fs::read_to_string(root.join("log/combat.log")).expect("combat log");
        assert!(log.contains("erin took 5 damage (poison)"));
    }

    #[test]
    fn npcs_never_queue_messages() {
        let mut npc = Entity::new_npc(EntityId(2), "rat", NpcTypeId(1));
        npc.send_message("you cannot read this");
        npc.send_config(83, 1);
        assert!(npc.take_outbox().is_empty());
    }

    #[test]
    fn poison_flag_follows_damage_counter() {
        let mut entity = Entity::new_player(EntityId(3), "bob");
        assert!(!entity.poisoned());
        entity.poison_damage = 2;
        assert!(entity.poisoned());
        entity.poison_damage = 0;
        assert!(!entity.poisoned());
    }

    #[test]
    fn poison_immunity_expires_with_its_timer() {
        let mut entity = Entity::new_player(EntityId(4), "carol");
        entity.grant_poison_immunity(2);
        assert!(entity.poison_immune());
        entity.timers.cycle();
        entity.timers.cycle();
        assert!(!entity.poison_immune());
    }

    #[test]
    fn drain_spawn_request_is_handed_out_once() {
        let mut entity = Entity::new_player(EntityId(5), "dave");
        assert!(entity.take_drain_spawn_request().is_none());
        entity.ensure_prayer_drain();
        assert!(entity.take_drain_spawn_request().is_some());
        assert!(entity.take_drain_spawn_request().is_none());
        // Handle still running, so a second ensure does not recreate it.
        entity.ensure_prayer_drain();
        assert!(entity.take_drain_spawn_request().is_none());
    }
}
