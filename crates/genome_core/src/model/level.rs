//! Fixed hierarchy levels and their collection-key table.
//!
//! # Invariants
//! - Exactly four levels exist; `Atome` (depth 3) never has children.
//! - Every accepted key token maps to exactly one level.
//! - Output always uses the canonical path key of a level.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::{Display, Formatter};

/// Maximum number of levels in a genome tree.
pub const MAX_DEPTH: usize = 4;

/// One of the four genome hierarchy levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    /// Depth 0.
    Corps,
    /// Depth 1.
    Organe,
    /// Depth 2.
    Cellule,
    /// Depth 3, leaf level.
    Atome,
}

struct LevelKeys {
    level: Level,
    /// Key used in rendered paths.
    path_key: &'static str,
    /// Key of the collection holding nodes of this level in the document.
    collection_key: &'static str,
    /// Simplified token accepted on input.
    short_token: &'static str,
}

static LEVEL_TABLE: [LevelKeys; MAX_DEPTH] = [
    LevelKeys {
        level: Level::Corps,
        path_key: "n0",
        collection_key: "n0_phases",
        short_token: "n0",
    },
    LevelKeys {
        level: Level::Organe,
        path_key: "n1_sections",
        collection_key: "n1_sections",
        short_token: "n1",
    },
    LevelKeys {
        level: Level::Cellule,
        path_key: "n2_features",
        collection_key: "n2_features",
        short_token: "n2",
    },
    LevelKeys {
        level: Level::Atome,
        path_key: "n3_ui_elements",
        collection_key: "n3_ui_elements",
        short_token: "n3",
    },
];

static KEY_INDEX: Lazy<HashMap<&'static str, Level>> = Lazy::new(|| {
    let mut index = HashMap::new();
    for keys in &LEVEL_TABLE {
        for token in [keys.path_key, keys.collection_key, keys.short_token] {
            index.entry(token).or_insert(keys.level);
        }
    }
    index
});

static TABLE_CHECK: Lazy<Result<(), String>> = Lazy::new(check_level_table);

impl Level {
    /// All levels from root to leaf.
    pub const ALL: [Level; MAX_DEPTH] = [Level::Corps, Level::Organe, Level::Cellule, Level::Atome];

    pub fn depth(self) -> usize {
        self as usize
    }

    pub fn from_depth(depth: usize) -> Option<Self> {
        Self::ALL.get(depth).copied()
    }

    /// Level of this level's children, `None` for `Atome`.
    pub fn child(self) -> Option<Self> {
        Self::from_depth(self.depth() + 1)
    }

    pub fn parent(self) -> Option<Self> {
        self.depth().checked_sub(1).and_then(Self::from_depth)
    }

    pub fn is_deepest(self) -> bool {
        self.child().is_none()
    }

    /// Domain name of the level (`Corps`, `Organe`, ...).
    pub fn label(self) -> &'static str {
        match self {
            Self::Corps => "Corps",
            Self::Organe => "Organe",
            Self::Cellule => "Cellule",
            Self::Atome => "Atome",
        }
    }

    /// Canonical key used in rendered paths.
    pub fn path_key(self) -> &'static str {
        self.keys().path_key
    }

    /// Canonical key of the document collection holding this level's nodes.
    pub fn collection_key(self) -> &'static str {
        self.keys().collection_key
    }

    /// Resolves any accepted key token (canonical, collection or short form).
    pub fn from_key(token: &str) -> Option<Self> {
        KEY_INDEX.get(token).copied()
    }

    fn keys(self) -> &'static LevelKeys {
        &LEVEL_TABLE[self.depth()]
    }
}

impl Display for Level {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (level {})", self.label(), self.depth())
    }
}

/// Confirms the key table is a bijection between tokens and levels.
///
/// The check runs once per process; later calls return the cached outcome.
pub fn validate_level_table() -> Result<(), String> {
    TABLE_CHECK.clone()
}

fn check_level_table() -> Result<(), String> {
    let mut owners: HashMap<&'static str, Level> = HashMap::new();
    for (depth, keys) in LEVEL_TABLE.iter().enumerate() {
        if keys.level.depth() != depth {
            return Err(format!(
                "level table row {depth} declares {} out of order",
                keys.level
            ));
        }
        let prefix = format!("n{depth}");
        for token in [keys.path_key, keys.collection_key, keys.short_token] {
            if !token.starts_with(prefix.as_str()) {
                return Err(format!("key `{token}` does not belong to depth {depth}"));
            }
            if let Some(owner) = owners.insert(token, keys.level) {
                if owner != keys.level {
                    return Err(format!(
                        "key `{token}` is claimed by both {owner} and {}",
                        keys.level
                    ));
                }
            }
        }
    }
    Ok(())
}
