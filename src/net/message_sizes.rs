use serde::Deserialize;
use std::fs;
use std::path::Path;

/// One slot per opcode the 317 protocol can carry.
pub const MESSAGE_SIZE_SLOTS: usize = 257;

/// Payload size meaning "length prefixed by one byte".
pub const VARIABLE_BYTE: i32 = -1;

/// Payload size meaning "length prefixed by one short".
pub const VARIABLE_SHORT: i32 = -2;

#[derive(Debug, Deserialize)]
struct MessageSizeEntry {
    opcode: u16,
    size: i32,
}

/// The opcode to expected-payload-size table consumed by the message
/// dispatch layer. This core only loads and exposes it.
#[derive(Debug, Clone)]
pub struct MessageSizeTable {
    sizes: [Option<i32>; MESSAGE_SIZE_SLOTS],
}

impl Default for MessageSizeTable {
    fn default() -> Self {
        Self {
            sizes: [None; MESSAGE_SIZE_SLOTS],
        }
    }
}

impl MessageSizeTable {
    pub fn set(&mut self, opcode: u16, size: i32) -> Result<(), String> {
        if usize::from(opcode) >= MESSAGE_SIZE_SLOTS {
            return Err(format!("opcode {} out of range", opcode));
        }
        if size < VARIABLE_SHORT {
            return Err(format!("opcode {} has invalid size {}", opcode, size));
        }
        self.sizes[usize::from(opcode)] = Some(size);
        Ok(())
    }

    pub fn get(&self, opcode: u16) -> Option<i32> {
        self.sizes.get(usize::from(opcode)).copied().flatten()
    }

    pub fn len(&self) -> usize {
        self.sizes.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub fn parse_message_sizes(data: &str) -> Result<MessageSizeTable, String> {
    let entries: Vec<MessageSizeEntry> =
        serde_yaml::from_str(data).map_err(|err| format!("message size parse failed: {}", err))?;
    let mut table = MessageSizeTable::default();
    for entry in entries {
        table.set(entry.opcode, entry.size)?;
    }
    Ok(table)
}

pub fn load_message_sizes(path: &Path) -> Result<MessageSizeTable, String> {
    let data = fs::read_to_string(path)
        .map_err(|err| format!("message size read {} failed: {}", path.display(), err))?;
    parse_message_sizes(&data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_entries_including_variable_sizes() {
        let table = parse_message_sizes(
            "- opcode: 0\n  size: 0\n- opcode: 98\n  size: -1\n- opcode: 45\n  size: -2\n- opcode: 122\n  size: 6\n",
        )
        .expect("parse");
        assert_eq!(table.len(), 4);
        assert_eq!(table.get(0), Some(0));
        assert_eq!(table.get(98), Some(VARIABLE_BYTE));
        assert_eq!(table.get(45), Some(VARIABLE_SHORT));
        assert_eq!(table.get(122), Some(6));
    }

    #[test]
    fn unassigned_opcodes_yield_none() {
        let table = MessageSizeTable::default();
        assert_eq!(table.get(200), None);
        assert!(table.is_empty());
    }

    #[test]
    fn rejects_out_of_range_opcodes() {
        assert!(parse_message_sizes("- opcode: 257\n  size: 4\n").is_err());
    }

    #[test]
    fn rejects_sizes_below_the_variable_sentinels() {
        let mut table = MessageSizeTable::default();
        assert!(table.set(10, -3).is_err());
    }

    #[test]
    fn later_entries_override_earlier_ones() {
        let table =
            parse_message_sizes("- opcode: 10\n  size: 2\n- opcode: 10\n  size: 8\n").expect("parse");
        assert_eq!(table.get(10), Some(8));
    }
}
