use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NpcTypeId(pub u32);

/// Static definition of one NPC type, consulted read-only.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NpcDefinition {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub combat_level: u32,
    #[serde(default)]
    pub attackable: bool,
    #[serde(default)]
    pub poisonous: bool,
}

#[derive(Debug, Clone, Default)]
pub struct NpcDefinitions {
    by_id: HashMap<NpcTypeId, NpcDefinition>,
}

impl NpcDefinitions {
    pub fn insert(&mut self, definition: NpcDefinition) {
        self.by_id.insert(NpcTypeId(definition.id), definition);
    }

    pub fn get(&self, id: NpcTypeId) -> Option<&NpcDefinition> {
        self.by_id.get(&id)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

pub fn parse_npc_definitions(data: &str) -> Result<NpcDefinitions, String> {
    let entries: Vec<NpcDefinition> =
        serde_yaml::from_str(data).map_err(|err| format!("npc definition parse failed: {}", err))?;
    let mut definitions = NpcDefinitions::default();
    for entry in entries {
        if definitions.get(NpcTypeId(entry.id)).is_some() {
            return Err(format!("duplicate npc definition id {}", entry.id));
        }
        definitions.insert(entry);
    }
    Ok(definitions)
}

pub fn load_npc_definitions(path: &Path) -> Result<NpcDefinitions, String> {
    let data = fs::read_to_string(path)
        .map_err(|err| format!("npc definition read {} failed: {}", path.display(), err))?;
    parse_npc_definitions(&data)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
- id: 1
  name: Man
  combat_level: 3
  attackable: true
- id: 941
  name: Green dragon
  combat_level: 79
  attackable: true
  poisonous: false
- id: 1101
  name: Poison spider
  combat_level: 64
  attackable: true
  poisonous: true
";

    #[test]
    fn parses_definitions_with_defaults() {
        let definitions = parse_npc_definitions(SAMPLE).expect("parse");
        assert_eq!(definitions.len(), 3);
        let spider = definitions.get(NpcTypeId(1101)).expect("spider");
        assert!(spider.poisonous);
        let man = definitions.get(NpcTypeId(1)).expect("man");
        assert!(!man.poisonous);
    }

    #[test]
    fn rejects_duplicate_ids() {
        let data = "- id: 1\n  name: Man\n- id: 1\n  name: Man again\n";
        assert!(parse_npc_definitions(data).is_err());
    }

    #[test]
    fn unknown_id_yields_none() {
        let definitions = parse_npc_definitions(SAMPLE).expect("parse");
        assert!(definitions.get(NpcTypeId(9999)).is_none());
    }
}
