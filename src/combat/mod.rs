pub mod effect;
pub mod hit;
pub mod poison;
pub mod prayer;
pub mod teleblock;
