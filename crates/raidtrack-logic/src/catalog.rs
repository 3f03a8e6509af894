//! Static game catalog — task definitions and hideout stations.
//!
//! Supplied by the catalog provider and treated as read-only by the engine.
//! Collection fields default to empty so sparse provider payloads still load.

use serde::{Deserialize, Serialize};

// ============================================================================
// FACTIONS
// ============================================================================

/// PMC faction. Tasks carry one as a gate; players carry one as identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PmcFaction {
    /// No gate — the task is available to both factions.
    #[default]
    Any,
    #[serde(rename = "USEC")]
    Usec,
    #[serde(rename = "BEAR")]
    Bear,
}

impl PmcFaction {
    /// Parse the provider/store spelling (`"Any"`, `"USEC"`, `"BEAR"`).
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Any" => Some(Self::Any),
            "USEC" => Some(Self::Usec),
            "BEAR" => Some(Self::Bear),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Any => "Any",
            Self::Usec => "USEC",
            Self::Bear => "BEAR",
        }
    }

    /// Whether a task gated on `self` is open to a player of `player` faction.
    pub fn admits(self, player: PmcFaction) -> bool {
        self == Self::Any || self == player
    }
}

// ============================================================================
// TASKS
// ============================================================================

/// Completion/failure states a requirement edge can demand of its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequirementStatus {
    Complete,
    Failed,
    /// Any status string the engine does not model. Never matches.
    #[serde(other)]
    Other,
}

/// Directed requirement edge: this task needs `task` to be in one of `status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRequirement {
    pub task: String,
    #[serde(default)]
    pub status: Vec<RequirementStatus>,
}

/// A quest-like unit of progress with prerequisites.
///
/// `predecessors`/`successors` are forward and back edges of the same
/// relation and are kept symmetric by the provider. `alternatives` is a
/// symmetric exclusivity set: completing one forecloses the others.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub predecessors: Vec<String>,
    #[serde(default)]
    pub successors: Vec<String>,
    #[serde(default)]
    pub alternatives: Vec<String>,
    #[serde(default)]
    pub faction_name: PmcFaction,
    #[serde(default)]
    pub kappa_required: bool,
    #[serde(default)]
    pub lightkeeper_required: bool,
    #[serde(default)]
    pub min_player_level: u32,
    #[serde(default)]
    pub task_requirements: Vec<TaskRequirement>,
    /// Ids of the objectives contained in this task.
    #[serde(default)]
    pub objectives: Vec<String>,
}

// ============================================================================
// HIDEOUT
// ============================================================================

/// One buildable level of a hideout station.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StationLevel {
    pub id: String,
    pub level: u32,
    #[serde(default)]
    pub item_requirements: Vec<ItemRequirement>,
}

/// An item stack a station level consumes when built.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemRequirement {
    pub id: String,
    #[serde(default)]
    pub count: i64,
}

/// A hideout station and its levels, ordered by `level`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HideoutStation {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub levels: Vec<StationLevel>,
}

// ============================================================================
// CATALOG ROOT
// ============================================================================

/// Deserialization root for provider payloads and fixtures.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Catalog {
    pub tasks: Vec<Task>,
    pub hideout_stations: Vec<HideoutStation>,
}

impl Catalog {
    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn station(&self, id: &str) -> Option<&HideoutStation> {
        self.hideout_stations.iter().find(|s| s.id == id)
    }
}
