//! Raw record → display-ready view, plus the full pipeline entry point.
//!
//! Stage 1 (`build_progress`) defaults the scalars, projects the selected
//! mode partition's fact maps into entry arrays, and applies edition-granted
//! hideout completions. Stage 2 (the invalidator) then enforces the
//! dependency-graph invariants. `format_progress` runs both stages; the
//! stages are exposed separately so each can be tested on its own.

use crate::catalog::{HideoutStation, PmcFaction, Task};
use crate::editions::{coerce_game_edition, edition_grants_level};
use crate::invalidator::invalidate_inconsistent;
use crate::modes::{select_mode, GameMode};
use crate::progress::{FormattedProgress, ModuleEntry, ObjectiveEntry, PartEntry, TaskEntry};
use crate::record::{RawModeData, RawProgress};

/// Leading characters of the user id used when no display name was stored.
const FALLBACK_NAME_LEN: usize = 6;

pub const DEFAULT_PLAYER_LEVEL: u32 = 1;

/// The single formatting entry point: build the view for one mode partition
/// and enforce graph consistency on it. Re-run from scratch on every read;
/// nothing is cached or persisted.
pub fn format_progress(
    raw: Option<&RawProgress>,
    user_id: &str,
    hideout: &[HideoutStation],
    tasks: &[Task],
    mode: GameMode,
) -> FormattedProgress {
    let mut progress = build_progress(raw, user_id, hideout, mode);
    let faction = progress.pmc_faction;
    invalidate_inconsistent(&mut progress, tasks, faction, user_id);
    progress
}

/// Stage 1 alone: defaulted scalars, projected arrays, edition grants.
/// A missing record yields a fully-defaulted view with empty arrays.
pub fn build_progress(
    raw: Option<&RawProgress>,
    user_id: &str,
    hideout: &[HideoutStation],
    mode: GameMode,
) -> FormattedProgress {
    let display_name = raw
        .and_then(|r| r.display_name.clone())
        .unwrap_or_else(|| user_id.chars().take(FALLBACK_NAME_LEN).collect());
    let player_level = raw.and_then(|r| r.level).unwrap_or(DEFAULT_PLAYER_LEVEL);
    let game_edition = coerce_game_edition(raw.and_then(|r| r.game_edition.as_ref()), None);
    let pmc_faction = raw
        .and_then(|r| r.pmc_faction.as_deref())
        .and_then(PmcFaction::from_name)
        .filter(|f| *f != PmcFaction::Any)
        .unwrap_or(PmcFaction::Usec);

    let empty = RawModeData::default();
    let data = raw.and_then(|r| select_mode(r, mode)).unwrap_or(&empty);

    let mut progress = FormattedProgress {
        user_id: user_id.to_string(),
        display_name,
        player_level,
        game_edition,
        pmc_faction,
        tasks_progress: project_tasks(data),
        task_objectives_progress: project_objectives(data),
        hideout_modules_progress: project_modules(data),
        hideout_parts_progress: project_parts(data),
    };
    apply_edition_grants(&mut progress, hideout);
    progress
}

fn project_tasks(data: &RawModeData) -> Vec<TaskEntry> {
    data.task_completions
        .iter()
        .map(|(id, state)| TaskEntry {
            id: id.clone(),
            complete: state.complete,
            failed: state.failed.then_some(true),
            invalid: None,
            timestamp: state.timestamp,
        })
        .collect()
}

fn project_objectives(data: &RawModeData) -> Vec<ObjectiveEntry> {
    data.task_objectives
        .iter()
        .map(|(id, state)| ObjectiveEntry {
            id: id.clone(),
            complete: state.complete,
            count: state.count,
            invalid: None,
            timestamp: state.timestamp,
        })
        .collect()
}

fn project_modules(data: &RawModeData) -> Vec<ModuleEntry> {
    data.hideout_modules
        .iter()
        .map(|(id, state)| ModuleEntry {
            id: id.clone(),
            complete: state.complete,
            invalid: None,
            timestamp: state.timestamp,
        })
        .collect()
}

fn project_parts(data: &RawModeData) -> Vec<PartEntry> {
    data.hideout_parts
        .iter()
        .map(|(id, state)| PartEntry {
            id: id.clone(),
            complete: state.complete,
            count: state.count,
            invalid: None,
            timestamp: state.timestamp,
        })
        .collect()
}

/// Force edition-granted station levels (and their item requirements)
/// complete. Stored facts for exactly those entries are overridden; levels
/// the edition does not grant keep whatever the user stored.
fn apply_edition_grants(progress: &mut FormattedProgress, hideout: &[HideoutStation]) {
    let edition = progress.game_edition;
    for station in hideout {
        for level in &station.levels {
            if !edition_grants_level(edition, &station.id, level.level) {
                continue;
            }
            grant_module(&mut progress.hideout_modules_progress, &level.id);
            for item in &level.item_requirements {
                grant_part(&mut progress.hideout_parts_progress, &item.id, item.count);
            }
        }
    }
}

fn grant_module(modules: &mut Vec<ModuleEntry>, id: &str) {
    match modules.iter_mut().find(|m| m.id == id) {
        Some(module) => {
            module.complete = true;
            module.invalid = None;
        }
        None => modules.push(ModuleEntry {
            id: id.to_string(),
            complete: true,
            invalid: None,
            timestamp: None,
        }),
    }
}

fn grant_part(parts: &mut Vec<PartEntry>, id: &str, count: i64) {
    match parts.iter_mut().find(|p| p.id == id) {
        Some(part) => {
            part.complete = true;
            part.count = Some(count);
            part.invalid = None;
        }
        None => parts.push(PartEntry {
            id: id.to_string(),
            complete: true,
            count: Some(count),
            invalid: None,
            timestamp: None,
        }),
    }
}
