//! Game-mode partitions — independent progress tracks within one record.

use serde::{Deserialize, Serialize};

use crate::record::{RawModeData, RawProgress};

/// A progress partition. Each mode tracks its own completion facts;
/// switching modes never touches the other partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    #[default]
    Pvp,
    Pve,
}

impl GameMode {
    pub const ALL: [GameMode; 2] = [GameMode::Pvp, GameMode::Pve];

    pub fn key(self) -> &'static str {
        match self {
            Self::Pvp => "pvp",
            Self::Pve => "pve",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        match key.to_ascii_lowercase().as_str() {
            "pvp" => Some(Self::Pvp),
            "pve" => Some(Self::Pve),
            _ => None,
        }
    }
}

/// Pure lookup of one partition's raw maps. `None` when the user has never
/// saved anything under this mode.
pub fn select_mode(raw: &RawProgress, mode: GameMode) -> Option<&RawModeData> {
    raw.modes.get(mode.key())
}
