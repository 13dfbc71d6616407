use crate::combat::effect::CombatEffect;
use crate::combat::hit::{Hit, HitType};
use crate::entities::entity::Entity;
use crate::entities::item::{ItemId, ItemStack};
use crate::world::npc::{NpcDefinitions, NpcTypeId};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Poison strength, ordered by severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoisonTier {
    DefaultNpc,
    StrongNpc,
    SuperNpc,
    DefaultPlayer,
}

impl PoisonTier {
    /// Starting damage per poison cycle for this tier.
    pub fn damage(self) -> u32 {
        match self {
            PoisonTier::DefaultNpc => 2,
            PoisonTier::StrongNpc => 4,
            PoisonTier::SuperNpc => 6,
            PoisonTier::DefaultPlayer => 8,
        }
    }
}

/// Picks the poison tier an NPC type inflicts. NPCs that are unknown, not
/// attackable or not poisonous inflict none; otherwise the tier scales with
/// combat level.
pub fn npc_poison_tier(definitions: &NpcDefinitions, npc_type: NpcTypeId) -> Option<PoisonTier> {
    let definition = definitions.get(npc_type)?;
    if !definition.attackable || !definition.poisonous {
        return None;
    }
    if definition.combat_level < 75 {
        Some(PoisonTier::DefaultNpc)
    } else if definition.combat_level < 200 {
        Some(PoisonTier::StrongNpc)
    } else {
        Some(PoisonTier::SuperNpc)
    }
}

#[derive(Debug, Deserialize)]
struct PoisonItemEntry {
    item: u32,
    tier: PoisonTier,
}

/// Read-only table mapping poisonous items to the tier they inflict.
#[derive(Debug, Clone, Default)]
pub struct PoisonItemTable {
    by_item: HashMap<ItemId, PoisonTier>,
}

impl PoisonItemTable {
    pub fn insert(&mut self, item: ItemId, tier: PoisonTier) {
        self.by_item.insert(item, tier);
    }

    /// The tier for an item stack; a zero id or zero amount never yields one.
    pub fn tier_for(&self, stack: ItemStack) -> Option<PoisonTier> {
        if stack.id.0 == 0 || stack.amount == 0 {
            return None;
        }
        self.by_item.get(&stack.id).copied()
    }

    pub fn len(&self) -> usize {
        self.by_item.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_item.is_empty()
    }
}

pub fn parse_poison_items(data: &str) -> Result<PoisonItemTable, String> {
    let entries: Vec<PoisonItemEntry> =
        serde_yaml::from_str(data).map_err(|err| format!("poison item parse failed: {}", err))?;
    let mut table = PoisonItemTable::default();
    for entry in entries {
        if entry.item == 0 {
            return Err("poison item id 0 is not a valid item".to_string());
        }
        table.insert(ItemId(entry.item), entry.tier);
    }
    Ok(table)
}

pub fn load_poison_items(path: &Path) -> Result<PoisonItemTable, String> {
    let data = fs::read_to_string(path)
        .map_err(|err| format!("poison item read {} failed: {}", path.display(), err))?;
    parse_poison_items(&data)
}

/// How many poison cycles pass between damage step-downs; also the cadence
/// counter's starting value, so the first activation behaves like every
/// later cadence.
const CYCLES_PER_STEP: u32 = 4;

/// The combat effect applied when an entity is poisoned. Processes every 30
/// ticks, dealing the entity's current poison damage and stepping that
/// damage down every fourth cycle until the entity's own flag logic clears.
#[derive(Debug)]
pub struct PoisonEffect {
    cycles_until_step: u32,
}

impl PoisonEffect {
    pub const PERIOD: u32 = 30;

    pub fn new() -> Self {
        Self {
            cycles_until_step: CYCLES_PER_STEP,
        }
    }
}

impl Default for PoisonEffect {
    fn default() -> Self {
        Self::new()
    }
}

impl CombatEffect for PoisonEffect {
    fn period(&self) -> u32 {
        Self::PERIOD
    }

    fn apply(&mut self, entity: &mut Entity) -> bool {
        if entity.poisoned() {
            return false;
        }
        let Some(tier) = entity.poison_tier else {
            return false;
        };
        if entity.is_player() {
            if entity.poison_immune() {
                return false;
            }
            entity.send_message("You have been poisoned!");
        }
        entity.poison_damage = tier.damage();
        true
    }

    fn remove_on(&mut self, entity: &mut Entity) -> bool {
        !entity.poisoned()
    }

    fn process(&mut self, entity: &mut Entity) {
        self.cycles_until_step -= 1;
        entity.damage(Hit::new(entity.poison_damage, HitType::Poison));
        if self.cycles_until_step == 0 {
            self.cycles_until_step = CYCLES_PER_STEP;
            entity.poison_damage = entity.poison_damage.saturating_sub(1);
        }
    }

    fn on_login(&self, entity: &Entity) -> bool {
        entity.poisoned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::effect::{apply_effect, cycle_effects, EffectKind};
    use crate::entities::entity::{EntityId, OutboundMessage};
    use crate::world::npc::NpcDefinition;

    fn player() -> Entity {
        Entity::new_player(EntityId(1), "alice")
    }

    fn poisoned_player(tier: PoisonTier) -> Entity {
        let mut entity = player();
        entity.poison_tier = Some(tier);
        assert!(apply_effect(
            &mut entity,
            EffectKind::Poison,
            Box::new(PoisonEffect::new()),
        ));
        entity
    }

    fn run_one_poison_cycle(entity: &mut Entity) {
        for _ in 0..PoisonEffect::PERIOD {
            cycle_effects(entity);
        }
    }

    #[test]
    fn apply_rejects_without_a_tier() {
        let mut entity = player();
        assert!(!apply_effect(
            &mut entity,
            EffectKind::Poison,
            Box::new(PoisonEffect::new()),
        ));
    }

    #[test]
    fn apply_rejects_when_already_poisoned() {
        let mut entity = poisoned_player(PoisonTier::StrongNpc);
        entity.effects = crate::combat::effect::EffectRegistry::new();
        // Damage counter is still above zero, so a fresh attach must fail.
        assert!(!apply_effect(
            &mut entity,
            EffectKind::Poison,
            Box::new(PoisonEffect::new()),
        ));
    }

    #[test]
    fn immune_player_never_becomes_poisoned() {
        let mut entity = player();
        entity.poison_tier = Some(PoisonTier::DefaultPlayer);
        entity.grant_poison_immunity(100);
        assert!(!apply_effect(
            &mut entity,
            EffectKind::Poison,
            Box::new(PoisonEffect::new()),
        ));
        assert!(!entity.poisoned());
    }

    #[test]
    fn apply_seeds_damage_and_notifies() {
        let entity = poisoned_player(PoisonTier::StrongNpc);
        assert!(entity.poisoned());
        assert_eq!(entity.poison_damage, 4);
        let mut entity = entity;
        assert_eq!(
            entity.take_outbox(),
            vec![OutboundMessage::Text("You have been poisoned!".to_string())]
        );
    }

    #[test]
    fn fourth_cycle_steps_damage_down() {
        let mut entity = poisoned_player(PoisonTier::StrongNpc);
        run_one_poison_cycle(&mut entity);
        assert_eq!(entity.health, 96);
        assert_eq!(entity.poison_damage, 4);
        run_one_poison_cycle(&mut entity);
        run_one_poison_cycle(&mut entity);
        assert_eq!(entity.poison_damage, 4);
        run_one_poison_cycle(&mut entity);
        assert_eq!(entity.poison_damage, 3);
    }

    #[test]
    fn poison_damage_is_non_increasing_and_reaches_zero() {
        let mut entity = poisoned_player(PoisonTier::SuperNpc);
        entity.max_health = 1000;
        entity.health = 1000;
        let mut previous = entity.poison_damage;
        for _ in 0..200 {
            run_one_poison_cycle(&mut entity);
            assert!(entity.poison_damage <= previous);
            previous = entity.poison_damage;
            if !entity.poisoned() {
                break;
            }
        }
        assert!(!entity.poisoned());
        // The next removal check detaches the effect.
        run_one_poison_cycle(&mut entity);
        assert!(!entity.effects.is_attached(EffectKind::Poison));
    }

    #[test]
    fn on_login_reattaches_only_while_poisoned() {
        let mut entity = player();
        entity.poison_damage = 3;
        crate::combat::effect::reattach_on_login(&mut entity);
        assert!(entity.effects.is_attached(EffectKind::Poison));

        let mut clean = player();
        crate::combat::effect::reattach_on_login(&mut clean);
        assert!(!clean.effects.is_attached(EffectKind::Poison));
    }

    fn npc_definition(combat_level: u32, attackable: bool, poisonous: bool) -> NpcDefinitions {
        let mut definitions = NpcDefinitions::default();
        definitions.insert(NpcDefinition {
            id: 50,
            name: "test npc".to_string(),
            combat_level,
            attackable,
            poisonous,
        });
        definitions
    }

    #[test]
    fn npc_tier_scales_with_combat_level() {
        let npc = NpcTypeId(50);
        assert_eq!(
            npc_poison_tier(&npc_definition(74, true, true), npc),
            Some(PoisonTier::DefaultNpc)
        );
        assert_eq!(
            npc_poison_tier(&npc_definition(75, true, true), npc),
            Some(PoisonTier::StrongNpc)
        );
        assert_eq!(
            npc_poison_tier(&npc_definition(199, true, true), npc),
            Some(PoisonTier::StrongNpc)
        );
        assert_eq!(
            npc_poison_tier(&npc_definition(200, true, true), npc),
            Some(PoisonTier::SuperNpc)
        );
    }

    #[test]
    fn harmless_npcs_inflict_no_tier() {
        let npc = NpcTypeId(50);
        assert_eq!(npc_poison_tier(&npc_definition(100, false, true), npc), None);
        assert_eq!(npc_poison_tier(&npc_definition(100, true, false), npc), None);
        assert_eq!(npc_poison_tier(&NpcDefinitions::default(), npc), None);
    }

    #[test]
    fn item_table_rejects_zero_id_and_amount() {
        let mut table = PoisonItemTable::default();
        table.insert(ItemId(113), PoisonTier::StrongNpc);
        assert_eq!(
            table.tier_for(ItemStack::new(ItemId(113), 1)),
            Some(PoisonTier::StrongNpc)
        );
        assert_eq!(table.tier_for(ItemStack::new(ItemId(113), 0)), None);
        assert_eq!(table.tier_for(ItemStack::new(ItemId(0), 1)), None);
        assert_eq!(table.tier_for(ItemStack::new(ItemId(999), 1)), None);
    }

    #[test]
    fn parse_poison_items_reads_yaml_entries() {
        let table = parse_poison_items(
            "- item: 113\n  tier: strong_npc\n- item: 221\n  tier: default_player\n",
        )
        .expect("parse");
        assert_eq!(table.len(), 2);
        assert_eq!(
            table.tier_for(ItemStack::new(ItemId(221), 1)),
            Some(PoisonTier::DefaultPlayer)
        );
    }

    #[test]
    fn parse_poison_items_rejects_item_zero() {
        assert!(parse_poison_items("- item: 0\n  tier: strong_npc\n").is_err());
    }

    #[test]
    fn tier_ordering_follows_severity() {
        assert!(PoisonTier::DefaultNpc < PoisonTier::StrongNpc);
        assert!(PoisonTier::StrongNpc < PoisonTier::SuperNpc);
        assert!(PoisonTier::SuperNpc < PoisonTier::DefaultPlayer);
        assert!(PoisonTier::DefaultNpc.damage() < PoisonTier::DefaultPlayer.damage());
    }
}
