//! Derived progress aggregates for display surfaces.
//!
//! Pure counting over a formatted view plus the catalog. A task counts as
//! completed only when it is complete and neither failed nor invalid.

use serde::Serialize;

use crate::catalog::Catalog;
use crate::progress::FormattedProgress;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressStats {
    pub tasks_total: usize,
    pub tasks_completed: usize,
    pub tasks_failed: usize,
    pub tasks_invalid: usize,
    /// Not complete, not invalid, and the player meets the level floor.
    pub tasks_available: usize,
    pub kappa_total: usize,
    pub kappa_completed: usize,
    pub lightkeeper_total: usize,
    pub lightkeeper_completed: usize,
    pub objectives_completed: usize,
    pub modules_total: usize,
    pub modules_built: usize,
    pub parts_collected: usize,
}

pub fn compute_stats(progress: &FormattedProgress, catalog: &Catalog) -> ProgressStats {
    let mut stats = ProgressStats {
        tasks_total: catalog.tasks.len(),
        modules_total: catalog
            .hideout_stations
            .iter()
            .map(|s| s.levels.len())
            .sum(),
        ..ProgressStats::default()
    };

    for task in &catalog.tasks {
        let entry = progress.task_entry(&task.id);
        let invalid = entry.is_some_and(|e| e.is_invalid());
        let failed = entry.is_some_and(|e| e.complete && e.is_failed());
        let completed = entry.is_some_and(|e| e.complete && !e.is_failed()) && !invalid;

        if invalid {
            stats.tasks_invalid += 1;
        }
        if failed {
            stats.tasks_failed += 1;
        }
        if completed {
            stats.tasks_completed += 1;
            if task.kappa_required {
                stats.kappa_completed += 1;
            }
            if task.lightkeeper_required {
                stats.lightkeeper_completed += 1;
            }
        } else if !invalid && !failed && progress.player_level >= task.min_player_level {
            stats.tasks_available += 1;
        }

        if task.kappa_required {
            stats.kappa_total += 1;
        }
        if task.lightkeeper_required {
            stats.lightkeeper_total += 1;
        }
    }

    stats.objectives_completed = progress
        .task_objectives_progress
        .iter()
        .filter(|o| o.complete && !o.is_invalid())
        .count();
    stats.modules_built = progress
        .hideout_modules_progress
        .iter()
        .filter(|m| m.complete)
        .count();
    stats.parts_collected = progress
        .hideout_parts_progress
        .iter()
        .filter(|p| p.complete)
        .count();

    stats
}
