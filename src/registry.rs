//! Static slot registry.
//!
//! Every entity class owns a closed set of slot codes, partitioned into
//! display groups. A [`SlotCode`] can only be obtained through a registry
//! lookup, so code outside this module never handles an unknown slot.

use std::fmt;

use serde::{Deserialize, Serialize, Serializer};

use crate::error::ValidationError;

/// Kind of parent entity the slots are attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityClass {
    /// Statistic-category images on a user profile
    UserStats,
    /// Home/away formation images on a match
    MatchFormation,
    /// Team logo
    TeamLogo,
}

impl EntityClass {
    /// Get all entity classes.
    pub fn all() -> &'static [EntityClass] {
        &[
            EntityClass::UserStats,
            EntityClass::MatchFormation,
            EntityClass::TeamLogo,
        ]
    }

    /// Parse the snake_case identifier used by the host page.
    pub fn from_id(id: &str) -> Option<Self> {
        match id {
            "user_stats" => Some(EntityClass::UserStats),
            "match_formation" => Some(EntityClass::MatchFormation),
            "team_logo" => Some(EntityClass::TeamLogo),
            _ => None,
        }
    }

    /// The slot registry for this class.
    pub fn registry(self) -> SlotRegistry {
        SlotRegistry::for_class(self)
    }
}

/// Reference to one parent entity; the key every store is scoped to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    /// Entity class, selects the slot set
    pub class: EntityClass,
    /// Externally supplied entity id
    pub id: String,
}

impl EntityRef {
    pub fn new(class: EntityClass, id: impl Into<String>) -> Self {
        Self {
            class,
            id: id.into(),
        }
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}/{}", self.class, self.id)
    }
}

/// A slot identifier from a registry's closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlotCode(&'static str);

impl SlotCode {
    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for SlotCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

impl Serialize for SlotCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.0)
    }
}

/// A named display group of slots.
#[derive(Debug, Clone, Copy)]
pub struct SlotGroup {
    /// Stable group identifier
    pub id: &'static str,
    /// Human-readable group label
    pub label: &'static str,
    /// Slot codes in display order
    pub codes: &'static [&'static str],
}

const USER_STAT_GROUPS: &[SlotGroup] = &[
    SlotGroup {
        id: "common",
        label: "Common",
        codes: &["SPD", "PAS", "PAC"],
    },
    SlotGroup {
        id: "positional",
        label: "Positional",
        codes: &["SHO", "DRV", "DEC", "DRI", "TAC", "BLD"],
    },
    SlotGroup {
        id: "personal",
        label: "Personal",
        codes: &["CRO", "HED", "FST", "ACT", "OFF", "TEC", "COP"],
    },
];

const MATCH_FORMATION_GROUPS: &[SlotGroup] = &[SlotGroup {
    id: "formation",
    label: "Formation",
    codes: &["home", "away"],
}];

const TEAM_LOGO_GROUPS: &[SlotGroup] = &[SlotGroup {
    id: "profile",
    label: "Profile",
    codes: &["logo"],
}];

/// Slot enumeration for one entity class.
#[derive(Debug, Clone, Copy)]
pub struct SlotRegistry {
    class: EntityClass,
    groups: &'static [SlotGroup],
}

impl SlotRegistry {
    /// Registry for the given entity class.
    pub fn for_class(class: EntityClass) -> Self {
        let groups = match class {
            EntityClass::UserStats => USER_STAT_GROUPS,
            EntityClass::MatchFormation => MATCH_FORMATION_GROUPS,
            EntityClass::TeamLogo => TEAM_LOGO_GROUPS,
        };
        Self { class, groups }
    }

    pub fn class(&self) -> EntityClass {
        self.class
    }

    pub fn groups(&self) -> &'static [SlotGroup] {
        self.groups
    }

    /// All slots in display order.
    pub fn slots(&self) -> impl Iterator<Item = SlotCode> + use<> {
        let groups: &'static [SlotGroup] = self.groups;
        groups
            .iter()
            .flat_map(|group| group.codes.iter().copied().map(SlotCode))
    }

    /// Number of slots in this registry.
    pub fn len(&self) -> usize {
        self.groups.iter().map(|group| group.codes.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resolve a slot code. Matching ignores ASCII case so `spd` and `SPD`
    /// name the same slot.
    pub fn lookup(&self, code: &str) -> Result<SlotCode, ValidationError> {
        self.slots()
            .find(|slot| slot.as_str().eq_ignore_ascii_case(code))
            .ok_or_else(|| ValidationError::unknown_slot(code, self.class))
    }

    /// Check whether a slot code belongs to this registry.
    pub fn contains(&self, slot: SlotCode) -> bool {
        self.slots().any(|s| s == slot)
    }

    /// Group a slot belongs to.
    pub fn group_of(&self, slot: SlotCode) -> Option<&'static SlotGroup> {
        self.groups
            .iter()
            .find(|group| group.codes.contains(&slot.as_str()))
    }
}
