use std::collections::HashMap;

/// Named purposes for entity countdown timers. Callers define what each key
/// means; the repository only counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKey {
    Attack,
    Stun,
    Frozen,
    PoisonImmunity,
    Skull,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timer {
    key: TimerKey,
    ticks: u32,
}

impl Timer {
    pub fn new(key: TimerKey, ticks: u32) -> Self {
        Self { key, ticks }
    }

    pub fn key(&self) -> TimerKey {
        self.key
    }

    pub fn ticks(&self) -> u32 {
        self.ticks
    }

    pub fn tick(&mut self) {
        self.ticks = self.ticks.saturating_sub(1);
    }
}

/// Per-entity store of independent countdown timers, one per key. Timers are
/// never auto-removed at zero; `has` is the only zero-aware query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimerRepository {
    timers: HashMap<TimerKey, Timer>,
}

impl TimerRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has(&self, key: TimerKey) -> bool {
        self.timers
            .get(&key)
            .map_or(false, |timer| timer.ticks() > 0)
    }

    pub fn add(&mut self, key: TimerKey, ticks: u32) {
        self.timers.insert(key, Timer::new(key, ticks));
    }

    /// Inserts the timer if absent, or replaces it only when `ticks` is
    /// strictly greater than what remains. Never shortens an existing timer.
    pub fn add_or_extend(&mut self, key: TimerKey, ticks: u32) {
        match self.timers.get(&key) {
            Some(timer) if timer.ticks() >= ticks => {}
            _ => self.add(key, ticks),
        }
    }

    pub fn cancel(&mut self, key: TimerKey) {
        self.timers.remove(&key);
    }

    pub fn remaining(&self, key: TimerKey) -> u32 {
        self.timers.get(&key).map_or(0, Timer::ticks)
    }

    /// Advances every stored timer by one tick, floored at zero. Called once
    /// per simulation tick.
    pub fn cycle(&mut self) {
        for timer in self.timers.values_mut() {
            timer.tick();
        }
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }
}
