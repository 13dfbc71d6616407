pub mod combat;
mod config;
pub mod entities;
pub mod net;
pub mod telemetry;
pub mod world;

pub use combat::effect::{apply_effect, cycle_effects, reattach_on_login, CombatEffect, EffectKind};
pub use combat::hit::{Hit, HitType};
pub use combat::poison::{PoisonEffect, PoisonItemTable, PoisonTier};
pub use combat::prayer::{DrainCycle, PrayerBook, PrayerDrain, PrayerKind};
pub use combat::teleblock::TeleblockEffect;
pub use entities::entity::{Entity, EntityId, EntityKind, OutboundMessage};
pub use entities::timers::{Timer, TimerKey, TimerRepository};
pub use world::state::{spawn_drain_task, WorldState};

pub fn run(args: &[String]) -> Result<(), String> {
    let config = config::AppConfig::from_args(args)?;
    telemetry::logging::init(&config.root)?;

    let prayer_book = combat::prayer::PrayerBook::builtin();
    let book_errors = combat::prayer::validate_prayer_book(&prayer_book);
    for err in &book_errors {
        eprintln!("edgeville: prayer validate {}", err);
        telemetry::logging::log_error(&format!("prayer validate {}", err));
    }
    if !book_errors.is_empty() {
        return Err(format!(
            "prayer book failed validation with {} errors",
            book_errors.len()
        ));
    }
    let npc_definitions = world::npc::load_npc_definitions(&config.root.join("npcs.yaml"))?;
    let poison_items = combat::poison::load_poison_items(&config.root.join("poison_items.yaml"))?;
    let message_sizes =
        net::message_sizes::load_message_sizes(&config.root.join("message_sizes.yaml"))?;

    telemetry::logging::log_game(&format!(
        "data scan: prayers={}, npcs={}, poison_items={}, message_sizes={}",
        prayer_book.len(),
        npc_definitions.len(),
        poison_items.len(),
        message_sizes.len()
    ));
    println!("edgeville: data scan");
    println!("- root: {}", config.root.display());
    println!("- prayers: {}", prayer_book.len());
    println!("- npc definitions: {}", npc_definitions.len());
    println!("- poison items: {}", poison_items.len());
    println!("- message sizes: {}", message_sizes.len());
    println!("- tick length: {}ms", config.tick_millis);

    let world = std::sync::Arc::new(std::sync::Mutex::new(world::state::WorldState::new(
        prayer_book,
        npc_definitions,
        poison_items,
    )));

    let run_ticks = match std::env::var("EDGEVILLE_RUN_TICKS") {
        Ok(value) => match value.trim().parse::<u64>() {
            Ok(parsed) => Some(parsed),
            Err(_) => {
                eprintln!("edgeville: invalid EDGEVILLE_RUN_TICKS '{}', ignored", value);
                None
            }
        },
        Err(_) => None,
    };

    let tick_length = config.tick_length();
    let mut ticks_run: u64 = 0;
    loop {
        if let Some(limit) = run_ticks {
            if ticks_run >= limit {
                telemetry::logging::log_game(&format!("shutting down after {} ticks", ticks_run));
                return Ok(());
            }
        }
        std::thread::sleep(tick_length);
        {
            let mut guard = world
                .lock()
                .map_err(|_| "world lock poisoned".to_string())?;
            guard.cycle();
        }
        ticks_run = ticks_run.saturating_add(1);
    }
}
