use crate::entities::entity::Entity;
use crate::telemetry::logging;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// The closed catalog of combat prayers in the 317 protocol, in catalog
/// order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrayerKind {
    ThickSkin,
    BurstOfStrength,
    ClarityOfThought,
    RockSkin,
    SuperhumanStrength,
    ImprovedReflexes,
    RapidRestore,
    RapidHeal,
    ProtectItem,
    SteelSkin,
    UltimateStrength,
    IncredibleReflexes,
    ProtectFromMagic,
    ProtectFromMissiles,
    ProtectFromMelee,
    Retribution,
    Redemption,
    Smite,
}

impl PrayerKind {
    pub const ALL: [PrayerKind; 18] = [
        PrayerKind::ThickSkin,
        PrayerKind::BurstOfStrength,
        PrayerKind::ClarityOfThought,
        PrayerKind::RockSkin,
        PrayerKind::SuperhumanStrength,
        PrayerKind::ImprovedReflexes,
        PrayerKind::RapidRestore,
        PrayerKind::RapidHeal,
        PrayerKind::ProtectItem,
        PrayerKind::SteelSkin,
        PrayerKind::UltimateStrength,
        PrayerKind::IncredibleReflexes,
        PrayerKind::ProtectFromMagic,
        PrayerKind::ProtectFromMissiles,
        PrayerKind::ProtectFromMelee,
        PrayerKind::Retribution,
        PrayerKind::Redemption,
        PrayerKind::Smite,
    ];

    pub fn index(self) -> usize {
        Self::ALL
            .iter()
            .position(|kind| *kind == self)
            .unwrap_or(0)
    }

    pub fn name(self) -> &'static str {
        match self {
            PrayerKind::ThickSkin => "Thick Skin",
            PrayerKind::BurstOfStrength => "Burst of Strength",
            PrayerKind::ClarityOfThought => "Clarity of Thought",
            PrayerKind::RockSkin => "Rock Skin",
            PrayerKind::SuperhumanStrength => "Superhuman Strength",
            PrayerKind::ImprovedReflexes => "Improved Reflexes",
            PrayerKind::RapidRestore => "Rapid Restore",
            PrayerKind::RapidHeal => "Rapid Heal",
            PrayerKind::ProtectItem => "Protect Item",
            PrayerKind::SteelSkin => "Steel Skin",
            PrayerKind::UltimateStrength => "Ultimate Strength",
            PrayerKind::IncredibleReflexes => "Incredible Reflexes",
            PrayerKind::ProtectFromMagic => "Protect from Magic",
            PrayerKind::ProtectFromMissiles => "Protect from Missiles",
            PrayerKind::ProtectFromMelee => "Protect from Melee",
            PrayerKind::Retribution => "Retribution",
            PrayerKind::Redemption => "Redemption",
            PrayerKind::Smite => "Smite",
        }
    }
}

impl fmt::Display for PrayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-kind override for the activation/deactivation path; returning false
/// aborts the transition with no state change.
pub type PrayerHook = fn(&mut Entity) -> bool;

/// One catalog entry. Instances are static and immutable; what changes per
/// entity is membership in its active-prayer set.
#[derive(Debug, Clone)]
pub struct Prayer {
    pub kind: PrayerKind,
    /// Ticks per one point of drain while active; None never drains.
    pub drain_rate: Option<u32>,
    pub head_icon: Option<u8>,
    pub level: u32,
    /// Client config id that lights the prayer button.
    pub config: u16,
    /// Prayers automatically deactivated when this one activates.
    pub deactivates: Vec<PrayerKind>,
    pub on_activation: Option<PrayerHook>,
    pub on_deactivation: Option<PrayerHook>,
}

impl Prayer {
    fn new(
        kind: PrayerKind,
        drain_rate: Option<u32>,
        head_icon: Option<u8>,
        level: u32,
        config: u16,
        deactivates: Vec<PrayerKind>,
    ) -> Self {
        Self {
            kind,
            drain_rate,
            head_icon,
            level,
            config,
            deactivates,
            on_activation: None,
            on_deactivation: None,
        }
    }
}

/// The injected read-only prayer catalog, indexed by `PrayerKind`.
#[derive(Debug, Clone)]
pub struct PrayerBook {
    prayers: Vec<Prayer>,
}

impl PrayerBook {
    pub fn builtin() -> Self {
        Self {
            prayers: builtin_prayers(),
        }
    }

    pub fn get(&self, kind: PrayerKind) -> &Prayer {
        &self.prayers[kind.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Prayer> {
        self.prayers.iter()
    }

    pub fn len(&self) -> usize {
        self.prayers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prayers.is_empty()
    }

    /// Swaps in a modified catalog entry, keeping catalog order.
    pub fn replace(&mut self, prayer: Prayer) {
        let index = prayer.kind.index();
        self.prayers[index] = prayer;
    }
}

pub fn builtin_prayers() -> Vec<Prayer> {
    use PrayerKind::*;
    vec![
        Prayer::new(ThickSkin, Some(20), None, 1, 83, vec![RockSkin, SteelSkin]),
        Prayer::new(
            BurstOfStrength,
            Some(20),
            None,
            4,
            84,
            vec![SuperhumanStrength, UltimateStrength],
        ),
        Prayer::new(
            ClarityOfThought,
            Some(20),
            None,
            7,
            85,
            vec![ImprovedReflexes, IncredibleReflexes],
        ),
        Prayer::new(RockSkin, Some(10), None, 10, 86, vec![ThickSkin, SteelSkin]),
        Prayer::new(
            SuperhumanStrength,
            Some(10),
            None,
            13,
            87,
            vec![BurstOfStrength, UltimateStrength],
        ),
        Prayer::new(
            ImprovedReflexes,
            Some(10),
            None,
            16,
            88,
            vec![ClarityOfThought, IncredibleReflexes],
        ),
        Prayer::new(RapidRestore, Some(29), None, 19, 89, vec![]),
        Prayer::new(RapidHeal, Some(29), None, 22, 90, vec![]),
        Prayer::new(ProtectItem, None, None, 25, 91, vec![]),
        Prayer::new(SteelSkin, Some(5), None, 28, 92, vec![ThickSkin, RockSkin]),
        Prayer::new(
            UltimateStrength,
            Some(5),
            None,
            31,
            93,
            vec![BurstOfStrength, SuperhumanStrength],
        ),
        Prayer::new(
            IncredibleReflexes,
            Some(5),
            None,
            34,
            94,
            vec![ClarityOfThought, ImprovedReflexes],
        ),
        Prayer::new(
            ProtectFromMagic,
            Some(5),
            Some(2),
            37,
            95,
            vec![
                ProtectFromMissiles,
                ProtectFromMelee,
                Retribution,
                Redemption,
                Smite,
            ],
        ),
        Prayer::new(
            ProtectFromMissiles,
            Some(5),
            Some(1),
            40,
            96,
            vec![
                ProtectFromMagic,
                ProtectFromMelee,
                Retribution,
                Redemption,
                Smite,
            ],
        ),
        Prayer::new(
            ProtectFromMelee,
            Some(5),
            Some(0),
            43,
            97,
            vec![
                ProtectFromMagic,
                ProtectFromMissiles,
                Retribution,
                Redemption,
                Smite,
            ],
        ),
        Prayer::new(
            Retribution,
            Some(17),
            Some(3),
            46,
            98,
            vec![
                ProtectFromMagic,
                ProtectFromMissiles,
                ProtectFromMelee,
                Redemption,
                Smite,
            ],
        ),
        Prayer::new(
            Redemption,
            Some(6),
            Some(5),
            49,
            99,
            vec![
                ProtectFromMagic,
                ProtectFromMissiles,
                ProtectFromMelee,
                Retribution,
                Smite,
            ],
        ),
        Prayer::new(
            Smite,
            Some(7),
            Some(4),
            52,
            100,
            vec![
                ProtectFromMagic,
                ProtectFromMissiles,
                ProtectFromMelee,
                Retribution,
                Redemption,
            ],
        ),
    ]
}

pub fn validate_prayer_book(book: &PrayerBook) -> Vec<String> {
    let mut errors = Vec::new();
    if book.len() != PrayerKind::ALL.len() {
        errors.push(format!(
            "prayer book has {} entries, expected {}",
            book.len(),
            PrayerKind::ALL.len()
        ));
        return errors;
    }
    let mut configs = std::collections::HashSet::new();
    for (index, prayer) in book.iter().enumerate() {
        if prayer.kind.index() != index {
            errors.push(format!(
                "prayer {} stored out of catalog order",
                prayer.kind
            ));
        }
        if prayer.deactivates.contains(&prayer.kind) {
            errors.push(format!("prayer {} deactivates itself", prayer.kind));
        }
        if !configs.insert(prayer.config) {
            errors.push(format!(
                "prayer {} reuses config id {}",
                prayer.kind, prayer.config
            ));
        }
    }
    errors
}

pub fn is_activated(entity: &Entity, kind: PrayerKind) -> bool {
    entity.active_prayers.contains(&kind)
}

/// Activates a prayer for an entity. When already active, the
/// `deactivate_if_active` flag turns the call into a toggle; without it the
/// call is a silent no-op.
pub fn activate(entity: &mut Entity, book: &PrayerBook, kind: PrayerKind, deactivate_if_active: bool) {
    if is_activated(entity, kind) {
        if deactivate_if_active {
            deactivate(entity, book, kind);
        }
        return;
    }
    let prayer = book.get(kind);
    let rejection = if entity.prayer_level < prayer.level {
        Some(format!(
            "You need a Prayer level of {} to use {}.",
            prayer.level, kind
        ))
    } else if entity.prayer_points == 0 {
        Some("You need to recharge your prayer at an altar!".to_string())
    } else {
        None
    };
    if let Some(message) = rejection {
        // Force the button dark so the client stays in sync with the reject.
        entity.send_config(prayer.config, 0);
        entity.send_message(message);
        return;
    }
    if let Some(hook) = prayer.on_activation {
        if !hook(entity) {
            return;
        }
    }
    entity.ensure_prayer_drain();
    for other in &prayer.deactivates {
        deactivate(entity, book, *other);
    }
    entity.active_prayers.insert(kind);
    entity.send_config(prayer.config, 1);
    if let Some(icon) = prayer.head_icon {
        entity.head_icon = Some(icon);
        entity.flag_appearance();
    }
}

/// Deactivates a prayer; a no-op when it is not active or when the prayer's
/// deactivation hook refuses.
pub fn deactivate(entity: &mut Entity, book: &PrayerBook, kind: PrayerKind) {
    if !is_activated(entity, kind) {
        return;
    }
    let prayer = book.get(kind);
    if let Some(hook) = prayer.on_deactivation {
        if !hook(entity) {
            return;
        }
    }
    entity.active_prayers.remove(&kind);
    entity.send_config(prayer.config, 0);
    if prayer.head_icon.is_some() {
        entity.head_icon = None;
        entity.flag_appearance();
    }
}

/// Deactivates every catalog entry; already-inactive prayers are ignored.
pub fn deactivate_all(entity: &mut Entity, book: &PrayerBook) {
    for kind in PrayerKind::ALL {
        deactivate(entity, book, kind);
    }
}

/// Poll interval while only non-draining prayers are active.
pub const DRAIN_IDLE_POLL_TICKS: u32 = 50;

pub const OUT_OF_POINTS_MESSAGE: &str =
    "You have run out of prayer points; you must recharge at an altar!";

/// Shared handle for an entity's recurring drain task. The task clears the
/// flag when it terminates; activation inspects it to keep at most one task
/// live per entity.
#[derive(Debug, Clone)]
pub struct PrayerDrain {
    running: Arc<AtomicBool>,
}

impl PrayerDrain {
    pub fn new_running() -> Self {
        Self {
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainCycle {
    Continue { next_interval_ticks: u32 },
    Stop,
}

fn fastest_active_rate(entity: &Entity, book: &PrayerBook) -> Option<u32> {
    entity
        .active_prayers
        .iter()
        .filter_map(|kind| book.get(*kind).drain_rate)
        .min()
}

/// The interval until the drain task's next cycle, or None when no prayers
/// are active and no task should run. The fastest active rate wins; a lone
/// non-draining prayer keeps the task alive at the idle poll interval.
pub fn drain_interval(entity: &Entity, book: &PrayerBook) -> Option<u32> {
    if entity.active_prayers.is_empty() {
        return None;
    }
    Some(fastest_active_rate(entity, book).unwrap_or(DRAIN_IDLE_POLL_TICKS))
}

/// One cycle of the recurring drain task. Consumes a single prayer point
/// when any draining prayer is active; at zero points every prayer is
/// deactivated and the task stops itself.
pub fn drain_cycle(entity: &mut Entity, book: &PrayerBook) -> DrainCycle {
    if entity.active_prayers.is_empty() {
        if let Some(drain) = entity.prayer_drain() {
            drain.stop();
        }
        return DrainCycle::Stop;
    }
    let Some(rate) = fastest_active_rate(entity, book) else {
        return DrainCycle::Continue {
            next_interval_ticks: DRAIN_IDLE_POLL_TICKS,
        };
    };
    entity.prayer_points = entity.prayer_points.saturating_sub(1);
    if entity.prayer_points == 0 {
        deactivate_all(entity, book);
        entity.send_message(OUT_OF_POINTS_MESSAGE);
        logging::log_combat(&format!("{} ran out of prayer points", entity.name));
        if let Some(drain) = entity.prayer_drain() {
            drain.stop();
        }
        return DrainCycle::Stop;
    }
    DrainCycle::Continue {
        next_interval_ticks: rate,
    }
}
