//! Display-ready progress view and its consistency helpers.
//!
//! Entry invariant, everywhere: `invalid == Some(true)` implies
//! `complete == false`. The `mark_*_invalid` helpers are the only code that
//! sets `invalid`, and they enforce it.

use serde::{Deserialize, Serialize};

use crate::catalog::PmcFaction;

/// Per-task progress entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TaskEntry {
    pub id: String,
    pub complete: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invalid: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl TaskEntry {
    pub fn is_failed(&self) -> bool {
        self.failed.unwrap_or(false)
    }

    pub fn is_invalid(&self) -> bool {
        self.invalid.unwrap_or(false)
    }
}

/// Per-objective progress entry. `count` is present only for
/// quantity-tracked objectives.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ObjectiveEntry {
    pub id: String,
    pub complete: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invalid: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl ObjectiveEntry {
    pub fn is_invalid(&self) -> bool {
        self.invalid.unwrap_or(false)
    }
}

/// Per-station-level ("module") progress entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModuleEntry {
    pub id: String,
    pub complete: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invalid: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

/// Per-item-requirement ("part") progress entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PartEntry {
    pub id: String,
    pub complete: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invalid: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

/// The per-user output of the engine. Constructed fresh on every formatting
/// call, consumed by the caller, never persisted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FormattedProgress {
    pub user_id: String,
    pub display_name: String,
    pub player_level: u32,
    pub game_edition: u8,
    pub pmc_faction: PmcFaction,
    pub tasks_progress: Vec<TaskEntry>,
    pub task_objectives_progress: Vec<ObjectiveEntry>,
    pub hideout_modules_progress: Vec<ModuleEntry>,
    pub hideout_parts_progress: Vec<PartEntry>,
}

impl FormattedProgress {
    pub fn task_entry(&self, id: &str) -> Option<&TaskEntry> {
        self.tasks_progress.iter().find(|e| e.id == id)
    }

    pub fn objective_entry(&self, id: &str) -> Option<&ObjectiveEntry> {
        self.task_objectives_progress.iter().find(|e| e.id == id)
    }

    pub fn module_entry(&self, id: &str) -> Option<&ModuleEntry> {
        self.hideout_modules_progress.iter().find(|e| e.id == id)
    }

    pub fn part_entry(&self, id: &str) -> Option<&PartEntry> {
        self.hideout_parts_progress.iter().find(|e| e.id == id)
    }

    /// Whether a task currently reads as completed: complete and not failed.
    pub fn task_completed(&self, id: &str) -> bool {
        self.task_entry(id)
            .is_some_and(|e| e.complete && !e.is_failed())
    }

    /// Mark a task entry structurally invalid, synthesizing the entry if it
    /// does not exist yet. Returns whether anything actually changed.
    pub fn mark_task_invalid(&mut self, id: &str) -> bool {
        match self.tasks_progress.iter_mut().find(|e| e.id == id) {
            Some(entry) => {
                let changed = !entry.is_invalid() || entry.complete;
                entry.invalid = Some(true);
                entry.complete = false;
                changed
            }
            None => {
                self.tasks_progress.push(TaskEntry {
                    id: id.to_string(),
                    complete: false,
                    invalid: Some(true),
                    ..TaskEntry::default()
                });
                true
            }
        }
    }

    /// Mark an objective entry invalid, synthesizing it if absent.
    /// Returns whether anything actually changed.
    pub fn mark_objective_invalid(&mut self, id: &str) -> bool {
        match self.task_objectives_progress.iter_mut().find(|e| e.id == id) {
            Some(entry) => {
                let changed = !entry.is_invalid() || entry.complete;
                entry.invalid = Some(true);
                entry.complete = false;
                changed
            }
            None => {
                self.task_objectives_progress.push(ObjectiveEntry {
                    id: id.to_string(),
                    complete: false,
                    invalid: Some(true),
                    ..ObjectiveEntry::default()
                });
                true
            }
        }
    }
}

/// Clamp a quantity-tracked count to `[0, required]`. The engine itself
/// never clamps; callers apply this before writing counts to the store.
pub fn clamp_count(count: i64, required: i64) -> i64 {
    count.clamp(0, required.max(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_task_invalid_clears_complete() {
        let mut progress = FormattedProgress::default();
        progress.tasks_progress.push(TaskEntry {
            id: "debut".into(),
            complete: true,
            ..TaskEntry::default()
        });
        assert!(progress.mark_task_invalid("debut"));
        let entry = progress.task_entry("debut").unwrap();
        assert_eq!(entry.invalid, Some(true));
        assert!(!entry.complete);
    }

    #[test]
    fn test_mark_task_invalid_is_idempotent() {
        let mut progress = FormattedProgress::default();
        assert!(progress.mark_task_invalid("debut"));
        assert!(!progress.mark_task_invalid("debut"));
        assert_eq!(progress.tasks_progress.len(), 1);
    }

    #[test]
    fn test_mark_task_invalid_synthesizes_missing_entry() {
        let mut progress = FormattedProgress::default();
        assert!(progress.mark_task_invalid("never-stored"));
        let entry = progress.task_entry("never-stored").unwrap();
        assert!(!entry.complete);
        assert_eq!(entry.invalid, Some(true));
        assert!(entry.failed.is_none());
        assert!(entry.timestamp.is_none());
    }

    #[test]
    fn test_mark_preserves_failed_flag() {
        let mut progress = FormattedProgress::default();
        progress.tasks_progress.push(TaskEntry {
            id: "chemical-part-4".into(),
            complete: true,
            failed: Some(true),
            ..TaskEntry::default()
        });
        progress.mark_task_invalid("chemical-part-4");
        let entry = progress.task_entry("chemical-part-4").unwrap();
        assert!(entry.is_failed());
        assert!(!entry.complete);
    }

    #[test]
    fn test_mark_objective_invalid() {
        let mut progress = FormattedProgress::default();
        progress.task_objectives_progress.push(ObjectiveEntry {
            id: "obj-1".into(),
            complete: true,
            count: Some(3),
            ..ObjectiveEntry::default()
        });
        assert!(progress.mark_objective_invalid("obj-1"));
        let entry = progress.objective_entry("obj-1").unwrap();
        assert!(!entry.complete);
        assert_eq!(entry.invalid, Some(true));
        assert_eq!(entry.count, Some(3));
    }

    #[test]
    fn test_task_completed_excludes_failed() {
        let mut progress = FormattedProgress::default();
        progress.tasks_progress.push(TaskEntry {
            id: "big-customer".into(),
            complete: true,
            failed: Some(true),
            ..TaskEntry::default()
        });
        assert!(!progress.task_completed("big-customer"));
        assert!(!progress.task_completed("missing"));
    }

    #[test]
    fn test_valid_entry_serializes_without_invalid_key() {
        let entry = TaskEntry {
            id: "debut".into(),
            complete: true,
            ..TaskEntry::default()
        };
        let json = serde_json::to_string(&entry).unwrap();
        assert!(!json.contains("invalid"));
        assert!(!json.contains("failed"));
        assert!(!json.contains("timestamp"));
    }

    #[test]
    fn test_clamp_count() {
        assert_eq!(clamp_count(-3, 10), 0);
        assert_eq!(clamp_count(4, 10), 4);
        assert_eq!(clamp_count(25, 10), 10);
        assert_eq!(clamp_count(5, -1), 0);
    }
}
