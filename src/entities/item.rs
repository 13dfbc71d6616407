#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ItemId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemStack {
    pub id: ItemId,
    pub amount: u32,
}

impl ItemStack {
    pub fn new(id: ItemId, amount: u32) -> Self {
        Self { id, amount }
    }
}
