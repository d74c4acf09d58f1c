//! Catalog of ingredient items shared by crafting, quests and daily rewards

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemDef {
    pub id: &'static str,
    pub name: &'static str,
    pub icon: &'static str,
    pub description: &'static str,
}

const fn item_def(
    id: &'static str,
    name: &'static str,
    icon: &'static str,
    description: &'static str,
) -> ItemDef {
    ItemDef {
        id,
        name,
        icon,
        description,
    }
}

pub static ITEMS: &[ItemDef] = &[
    item_def("energy_crystal", "Energy Crystal", "💎", "A crystal pulsing with pure energy"),
    item_def("swift_feather", "Swift Feather", "🪶", "A feather that grants incredible speed"),
    item_def("protection_gem", "Protection Gem", "💠", "A gem that provides magical protection"),
    item_def("magic_essence", "Magic Essence", "✨", "Pure magical energy in crystalline form"),
    item_def("magnetic_ore", "Magnetic Ore", "🧲", "Ore with powerful magnetic properties"),
    item_def("gold_dust", "Gold Dust", "✨", "Magical dust that attracts valuable items"),
    item_def("cloud_essence", "Cloud Essence", "☁️", "The essence of clouds, light as air"),
    item_def("spring_core", "Spring Core", "🔩", "A mechanical core with bouncy properties"),
    item_def("fortune_crystal", "Fortune Crystal", "💎", "A crystal that brings good fortune"),
    item_def("rainbow_shard", "Rainbow Shard", "🌈", "A shard containing prismatic energy"),
];

/// Look up an item; unknown ids are a miss, not an error
pub fn item(id: &str) -> Option<&'static ItemDef> {
    ITEMS.iter().find(|i| i.id == id)
}

pub fn is_known(id: &str) -> bool {
    item(id).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        assert_eq!(item("rainbow_shard").map(|i| i.name), Some("Rainbow Shard"));
        assert!(item("bone").is_none());
        assert!(is_known("gold_dust"));
    }

    #[test]
    fn test_ids_unique() {
        for (i, a) in ITEMS.iter().enumerate() {
            assert!(ITEMS[i + 1..].iter().all(|b| b.id != a.id), "duplicate {}", a.id);
        }
    }
}
