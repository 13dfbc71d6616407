#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitType {
    Normal,
    Poison,
}

impl HitType {
    pub fn name(self) -> &'static str {
        match self {
            HitType::Normal => "normal",
            HitType::Poison => "poison",
        }
    }
}

/// A single application of damage against an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hit {
    pub damage: u32,
    pub hit_type: HitType,
}

impl Hit {
    pub fn new(damage: u32, hit_type: HitType) -> Self {
        Self { damage, hit_type }
    }
}
