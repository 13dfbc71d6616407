pub mod npc;
pub mod state;
