use crate::combat::poison::PoisonEffect;
use crate::combat::teleblock::TeleblockEffect;
use crate::entities::entity::Entity;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectKind {
    Poison,
    Teleblock,
}

impl EffectKind {
    pub const ALL: [EffectKind; 2] = [EffectKind::Poison, EffectKind::Teleblock];
}

/// The lifecycle contract for a transient condition attached to an entity.
///
/// `apply` runs exactly once on attach and may reject. `remove_on` is checked
/// before every periodic step; returning true detaches the effect without
/// processing that step. `process` runs once per period while attached.
/// `on_login` decides from persisted entity fields alone whether the effect
/// class should be re-attached after a reconnect.
pub trait CombatEffect: fmt::Debug + Send {
    fn period(&self) -> u32;
    fn apply(&mut self, entity: &mut Entity) -> bool;
    fn remove_on(&mut self, entity: &mut Entity) -> bool;
    fn process(&mut self, entity: &mut Entity);
    fn on_login(&self, entity: &Entity) -> bool;
}

#[derive(Debug)]
struct AttachedEffect {
    kind: EffectKind,
    effect: Box<dyn CombatEffect>,
    countdown: u32,
}

/// The attached effects of one entity, each advancing on its own period. At
/// most one instance per kind is ever attached.
#[derive(Debug, Default)]
pub struct EffectRegistry {
    attached: Vec<AttachedEffect>,
}

impl EffectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_attached(&self, kind: EffectKind) -> bool {
        self.attached.iter().any(|slot| slot.kind == kind)
    }

    pub fn len(&self) -> usize {
        self.attached.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attached.is_empty()
    }

    fn attach(&mut self, kind: EffectKind, effect: Box<dyn CombatEffect>) {
        let countdown = effect.period();
        self.attached.push(AttachedEffect {
            kind,
            effect,
            countdown,
        });
    }
}

/// Attempts to attach `effect` to `entity`. Rejected when an effect of the
/// same kind is already attached or when the effect's own `apply` refuses.
pub fn apply_effect(
    entity: &mut Entity,
    kind: EffectKind,
    mut effect: Box<dyn CombatEffect>,
) -> bool {
    if entity.effects.is_attached(kind) {
        return false;
    }
    if !effect.apply(entity) {
        return false;
    }
    entity.effects.attach(kind, effect);
    true
}

/// Advances every attached effect by one tick. An effect whose countdown
/// reaches zero is first asked whether it should detach; if kept, it is
/// processed and its countdown reset to a full period.
pub fn cycle_effects(entity: &mut Entity) {
    let mut attached = std::mem::take(&mut entity.effects.attached);
    let mut kept = Vec::with_capacity(attached.len());
    for mut slot in attached.drain(..) {
        slot.countdown = slot.countdown.saturating_sub(1);
        if slot.countdown > 0 {
            kept.push(slot);
            continue;
        }
        if slot.effect.remove_on(entity) {
            continue;
        }
        slot.effect.process(entity);
        slot.countdown = slot.effect.period();
        kept.push(slot);
    }
    // Anything attached while processing lands behind the surviving slots.
    kept.append(&mut entity.effects.attached);
    entity.effects.attached = kept;
}

/// Re-attaches effect classes whose `on_login` reports them still active for
/// this entity, without running `apply` again.
pub fn reattach_on_login(entity: &mut Entity) {
    for kind in EffectKind::ALL {
        if entity.effects.is_attached(kind) {
            continue;
        }
        let effect = fresh_effect(kind);
        if effect.on_login(entity) {
            entity.effects.attach(kind, effect);
        }
    }
}

fn fresh_effect(kind: EffectKind) -> Box<dyn CombatEffect> {
    match kind {
        EffectKind::Poison => Box::new(PoisonEffect::new()),
        EffectKind::Teleblock => Box::new(TeleblockEffect::new()),
    }
}
