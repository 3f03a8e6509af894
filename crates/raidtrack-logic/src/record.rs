//! Raw stored progress — the per-user record as the store returns it.
//!
//! The engine reads one snapshot of this and never writes back. Maps are
//! `BTreeMap` so projection order is stable across calls.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One user's stored record. Every field may be absent for a never-saved user.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawProgress {
    pub display_name: Option<String>,
    pub level: Option<u32>,
    /// Purchase tier. Kept as a raw value: stored records have carried
    /// numbers, numeric strings, and garbage here. See
    /// [`crate::editions::coerce_game_edition`].
    pub game_edition: Option<Value>,
    pub pmc_faction: Option<String>,
    /// Independent progress partitions keyed by mode string (`"pvp"`, `"pve"`).
    pub modes: BTreeMap<String, RawModeData>,
}

/// One mode partition: four per-entity fact maps keyed by id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawModeData {
    pub task_completions: BTreeMap<String, RawTaskState>,
    pub task_objectives: BTreeMap<String, RawObjectiveState>,
    pub hideout_modules: BTreeMap<String, RawModuleState>,
    pub hideout_parts: BTreeMap<String, RawPartState>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawTaskState {
    pub complete: bool,
    pub failed: bool,
    pub timestamp: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawObjectiveState {
    pub complete: bool,
    pub count: Option<i64>,
    pub timestamp: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawModuleState {
    pub complete: bool,
    pub timestamp: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawPartState {
    pub complete: bool,
    pub count: Option<i64>,
    pub timestamp: Option<i64>,
}
