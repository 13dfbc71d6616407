use crate::combat::effect;
use crate::combat::poison::PoisonItemTable;
use crate::combat::prayer::{self, DrainCycle, PrayerBook, PrayerDrain, PrayerKind};
use crate::entities::entity::{Entity, EntityId, OutboundMessage};
use crate::telemetry::logging;
use crate::world::npc::NpcDefinitions;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// The authoritative simulation state: every living entity plus the injected
/// read-only tables. Guarded by one mutex; the tick loop and the prayer
/// drain tasks serialize on it.
#[derive(Debug)]
pub struct WorldState {
    pub entities: HashMap<EntityId, Entity>,
    pub tick: u64,
    pub prayer_book: PrayerBook,
    pub npc_definitions: NpcDefinitions,
    pub poison_items: PoisonItemTable,
}

impl WorldState {
    pub fn new(
        prayer_book: PrayerBook,
        npc_definitions: NpcDefinitions,
        poison_items: PoisonItemTable,
    ) -> Self {
        Self {
            entities: HashMap::new(),
            tick: 0,
            prayer_book,
            npc_definitions,
            poison_items,
        }
    }

    pub fn add_entity(&mut self, entity: Entity) -> EntityId {
        let id = entity.id;
        self.entities.insert(id, entity);
        id
    }

    /// Removes an entity, stopping its drain task so the background thread
    /// winds down on its next cycle.
    pub fn remove_entity(&mut self, id: EntityId) -> Option<Entity> {
        let entity = self.entities.remove(&id)?;
        if let Some(drain) = entity.prayer_drain() {
            drain.stop();
        }
        Some(entity)
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    /// Advances the simulation by one tick: every entity's timer repository
    /// first, then its attached effects. Entities are independent units; no
    /// cross-entity ordering is observable.
    pub fn cycle(&mut self) {
        self.tick += 1;
        for entity in self.entities.values_mut() {
            entity.timers.cycle();
            effect::cycle_effects(entity);
        }
    }

    /// Re-attaches effects derived from persisted entity fields when an
    /// entity re-enters the simulation.
    pub fn handle_login(&mut self, id: EntityId) -> bool {
        let Some(entity) = self.entities.get_mut(&id) else {
            return false;
        };
        effect::reattach_on_login(entity);
        logging::log_game(&format!("{} logged in", entity.name));
        true
    }

    /// Runs the prayer activation state machine for one entity. Returns the
    /// drain handle when this activation requested a new drain task; the
    /// caller spawns the thread for it.
    pub fn activate_prayer(
        &mut self,
        id: EntityId,
        kind: PrayerKind,
        deactivate_if_active: bool,
    ) -> Option<PrayerDrain> {
        let book = &self.prayer_book;
        let entity = self.entities.get_mut(&id)?;
        prayer::activate(entity, book, kind, deactivate_if_active);
        entity.take_drain_spawn_request()
    }

    pub fn deactivate_prayer(&mut self, id: EntityId, kind: PrayerKind) {
        let book = &self.prayer_book;
        if let Some(entity) = self.entities.get_mut(&id) {
            prayer::deactivate(entity, book, kind);
        }
    }

    pub fn take_outbox(&mut self, id: EntityId) -> Vec<OutboundMessage> {
        self.entities
            .get_mut(&id)
            .map(Entity::take_outbox)
            .unwrap_or_default()
    }
}

/// The drain task's per-cycle interval check. Returns None when the task
/// should exit; a no-prayers exit retires the handle inside the same
/// critical section, so a concurrent activation can never observe a running
/// handle after the task has decided to stop.
fn next_drain_interval(
    state: &WorldState,
    id: EntityId,
    tick_length: Duration,
    drain: &PrayerDrain,
) -> Option<Duration> {
    let entity = state.entities.get(&id)?;
    match prayer::drain_interval(entity, &state.prayer_book) {
        Some(ticks) => Some(tick_length * ticks),
        None => {
            drain.stop();
            None
        }
    }
}

/// Spawns the recurring drain task for one entity. The task sleeps for the
/// fastest active drain interval, then takes the world lock and runs one
/// drain cycle; it terminates when the entity runs out of points, has no
/// prayers left, disappears, or its handle is stopped.
pub fn spawn_drain_task(
    world: Arc<Mutex<WorldState>>,
    id: EntityId,
    tick_length: Duration,
    drain: PrayerDrain,
) -> std::thread::JoinHandle<()> {
    std::thread::spawn(move || {
        logging::log_combat(&format!("prayer drain task started for entity {}", id.0));
        loop {
            if !drain.is_running() {
                break;
            }
            let interval = {
                let Ok(guard) = world.lock() else {
                    break;
                };
                match next_drain_interval(&guard, id, tick_length, &drain) {
                    Some(interval) => interval,
                    None => break,
                }
            };
            std::thread::sleep(interval);
            let Ok(mut guard) = world.lock() else {
                break;
            };
            let state = &mut *guard;
            let book = &state.prayer_book;
            let Some(entity) = state.entities.get_mut(&id) else {
                break;
            };
            match prayer::drain_cycle(entity, book) {
                DrainCycle::Continue { .. } => {}
                DrainCycle::Stop => break,
            }
        }
        drain.stop();
        logging::log_combat(&format!("prayer drain task stopped for entity {}", id.0));
    })
}
