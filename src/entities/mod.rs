pub mod entity;
pub mod item;
pub mod timers;
