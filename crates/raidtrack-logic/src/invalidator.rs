//! Dependency-graph invalidation over a formatted view.
//!
//! Walks requirement edges and marks entries structurally invalid: faction
//! gates, mutually-exclusive alternatives, and unmet requirement statuses
//! each cascade through the successor graph. Invalidity is a derived
//! annotation recomputed on every pass — it is never persisted, so a catalog
//! update can never leave stale invalidations behind.

use std::collections::{HashMap, HashSet};

use log::{debug, warn};

use crate::catalog::{PmcFaction, RequirementStatus, Task, TaskRequirement};
use crate::progress::FormattedProgress;

/// Prebuilt traversal structure over the task catalog: id → task, and
/// id → successor ids (declared `successors` unioned with reverse
/// `predecessors` edges, deduped).
pub struct TaskGraph<'a> {
    tasks: HashMap<&'a str, &'a Task>,
    successors: HashMap<&'a str, Vec<&'a str>>,
}

impl<'a> TaskGraph<'a> {
    pub fn from_tasks(tasks: &'a [Task]) -> Self {
        let task_index: HashMap<&str, &Task> =
            tasks.iter().map(|t| (t.id.as_str(), t)).collect();
        let mut successors: HashMap<&str, Vec<&str>> = HashMap::new();
        for task in tasks {
            for succ in &task.successors {
                push_unique(successors.entry(task.id.as_str()).or_default(), succ);
            }
            for pred in &task.predecessors {
                push_unique(successors.entry(pred.as_str()).or_default(), &task.id);
            }
        }
        Self {
            tasks: task_index,
            successors,
        }
    }

    pub fn task(&self, id: &str) -> Option<&'a Task> {
        self.tasks.get(id).copied()
    }

    pub fn successors(&self, id: &str) -> &[&'a str] {
        self.successors.get(id).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.tasks.contains_key(id)
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }
}

fn push_unique<'a>(list: &mut Vec<&'a str>, id: &'a str) {
    if !list.iter().any(|existing| *existing == id) {
        list.push(id);
    }
}

/// Invalidate a task and cascade through its successors.
///
/// Marks the task entry invalid (synthesizing `{complete: false,
/// invalid: true}` when no entry exists yet), marks each of the task's
/// catalog objectives invalid the same way, then recurses into every
/// successor. With `child_only`, the named task itself is left untouched
/// and only its successors cascade. The visited set guarantees termination
/// on cyclic or self-referential graphs, with every reachable node
/// invalidated exactly once.
///
/// Returns whether any entry actually changed.
pub fn invalidate_task_recursive(
    progress: &mut FormattedProgress,
    graph: &TaskGraph<'_>,
    task_id: &str,
    child_only: bool,
) -> bool {
    let mut changed = false;
    let mut visited: HashSet<&str> = HashSet::new();
    let mut stack: Vec<&str> = Vec::new();

    if child_only {
        // Seeding the root as visited both preserves it and bounds cycles
        // that lead back to it.
        visited.insert(task_id);
        stack.extend_from_slice(graph.successors(task_id));
    } else {
        stack.push(task_id);
    }

    while let Some(id) = stack.pop() {
        if !visited.insert(id) {
            continue;
        }
        changed |= progress.mark_task_invalid(id);
        if let Some(task) = graph.task(id) {
            for objective in &task.objectives {
                changed |= progress.mark_objective_invalid(objective);
            }
        }
        for &succ in graph.successors(id) {
            if !visited.contains(succ) {
                stack.push(succ);
            }
        }
    }
    changed
}

/// Enforce the dependency-graph invariants over a whole formatted view.
///
/// Per task, three gates are evaluated independently (a task can trip more
/// than one; the outcome is the same):
///
/// 1. faction gate — `factionName` is neither `"Any"` nor the player's;
/// 2. alternative exclusivity — an alternative task is currently completed.
///    A task that is itself failed is exempt: its failed flag is already
///    the record of the exclusivity, and requirement edges demanding
///    `failed` depend on it surviving;
/// 3. requirement satisfaction — some `taskRequirements` edge has its
///    target in none of the demanded statuses.
///
/// Gates 1 and 3 cascade from the task itself; gate 2 marks the task
/// invalid inline and cascades only its successors, leaving the rest of the
/// task's own displayed state alone. The pass repeats until a full sweep
/// produces no new invalidation, so deep chains and diamond graphs settle
/// regardless of catalog order.
///
/// `user_id` is attribution for the log lines only; it never branches.
pub fn invalidate_inconsistent(
    progress: &mut FormattedProgress,
    tasks: &[Task],
    faction: PmcFaction,
    user_id: &str,
) {
    let graph = TaskGraph::from_tasks(tasks);
    // Marking is monotone, so a sweep count beyond one per task plus the
    // initial sweep means the pass is not settling.
    let max_sweeps = tasks.len() + 2;
    let mut sweeps = 0usize;

    loop {
        let mut changed = false;
        for task in tasks {
            let faction_blocked = !task.faction_name.admits(faction);
            let own_failure = progress
                .task_entry(&task.id)
                .is_some_and(|e| e.is_failed());
            let alternative_taken = !own_failure
                && task
                    .alternatives
                    .iter()
                    .any(|alt| progress.task_completed(alt));
            let requirement_unmet = task
                .task_requirements
                .iter()
                .any(|req| !requirement_satisfied(progress, req));

            if faction_blocked || requirement_unmet {
                if invalidate_task_recursive(progress, &graph, &task.id, false) {
                    changed = true;
                    let reason = if faction_blocked {
                        "faction gate"
                    } else {
                        "unmet requirement"
                    };
                    debug!("{user_id}: task {} invalidated ({reason})", task.id);
                }
            }
            if alternative_taken {
                let marked_root = progress.mark_task_invalid(&task.id);
                let cascaded = invalidate_task_recursive(progress, &graph, &task.id, true);
                if marked_root || cascaded {
                    changed = true;
                    debug!(
                        "{user_id}: task {} invalidated (alternative completed)",
                        task.id
                    );
                }
            }
        }
        sweeps += 1;
        if !changed {
            break;
        }
        if sweeps >= max_sweeps {
            warn!("{user_id}: invalidation pass did not settle after {sweeps} sweeps");
            break;
        }
    }
}

/// A requirement is satisfied when its target's current state matches one
/// of the demanded statuses: `complete` means completed and not failed,
/// `failed` means completed and failed. A missing entry matches nothing.
fn requirement_satisfied(progress: &FormattedProgress, req: &TaskRequirement) -> bool {
    let entry = progress.task_entry(&req.task);
    req.status.iter().any(|status| match status {
        RequirementStatus::Complete => entry.is_some_and(|e| e.complete && !e.is_failed()),
        RequirementStatus::Failed => entry.is_some_and(|e| e.complete && e.is_failed()),
        RequirementStatus::Other => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::TaskEntry;

    fn task(id: &str) -> Task {
        Task {
            id: id.to_string(),
            name: String::new(),
            predecessors: vec![],
            successors: vec![],
            alternatives: vec![],
            faction_name: PmcFaction::Any,
            kappa_required: false,
            lightkeeper_required: false,
            min_player_level: 0,
            task_requirements: vec![],
            objectives: vec![],
        }
    }

    fn completed_entry(id: &str) -> TaskEntry {
        TaskEntry {
            id: id.to_string(),
            complete: true,
            ..TaskEntry::default()
        }
    }

    fn progress_with(entries: &[TaskEntry]) -> FormattedProgress {
        FormattedProgress {
            tasks_progress: entries.to_vec(),
            ..FormattedProgress::default()
        }
    }

    // ── TaskGraph ──────────────────────────────────────────────────────

    #[test]
    fn test_graph_unions_declared_and_reverse_edges() {
        let mut t1 = task("t1");
        t1.successors = vec!["t2".into()];
        let mut t2 = task("t2");
        t2.predecessors = vec!["t1".into()];
        let mut t3 = task("t3");
        t3.predecessors = vec!["t1".into()];
        let tasks = vec![t1, t2, t3];

        let graph = TaskGraph::from_tasks(&tasks);
        let succ = graph.successors("t1");
        assert_eq!(succ.len(), 2);
        assert!(succ.contains(&"t2"));
        assert!(succ.contains(&"t3"));
        assert!(graph.successors("t3").is_empty());
        assert!(graph.contains("t2"));
        assert!(!graph.contains("t9"));
        assert_eq!(graph.task_count(), 3);
    }

    // ── Recursive invalidation ─────────────────────────────────────────

    #[test]
    fn test_transitive_cascade() {
        let mut t1 = task("t1");
        t1.successors = vec!["t2".into()];
        let mut t2 = task("t2");
        t2.predecessors = vec!["t1".into()];
        t2.successors = vec!["t3".into()];
        let mut t3 = task("t3");
        t3.predecessors = vec!["t2".into()];
        let tasks = vec![t1, t2, t3];

        let graph = TaskGraph::from_tasks(&tasks);
        let mut progress = progress_with(&[
            completed_entry("t1"),
            completed_entry("t2"),
            completed_entry("t3"),
        ]);
        assert!(invalidate_task_recursive(&mut progress, &graph, "t1", false));

        for id in ["t1", "t2", "t3"] {
            let entry = progress.task_entry(id).unwrap();
            assert_eq!(entry.invalid, Some(true), "{id}");
            assert!(!entry.complete, "{id}");
        }
    }

    #[test]
    fn test_cycle_terminates_and_invalidates_both() {
        let mut t1 = task("t1");
        t1.successors = vec!["t2".into()];
        let mut t2 = task("t2");
        t2.successors = vec!["t1".into()];
        let tasks = vec![t1, t2];

        let graph = TaskGraph::from_tasks(&tasks);
        let mut progress = progress_with(&[completed_entry("t1"), completed_entry("t2")]);
        invalidate_task_recursive(&mut progress, &graph, "t1", false);

        assert_eq!(progress.task_entry("t1").unwrap().invalid, Some(true));
        assert_eq!(progress.task_entry("t2").unwrap().invalid, Some(true));
    }

    #[test]
    fn test_self_referential_task_terminates() {
        let mut t1 = task("t1");
        t1.successors = vec!["t1".into()];
        let tasks = vec![t1];

        let graph = TaskGraph::from_tasks(&tasks);
        let mut progress = progress_with(&[completed_entry("t1")]);
        invalidate_task_recursive(&mut progress, &graph, "t1", false);
        assert_eq!(progress.task_entry("t1").unwrap().invalid, Some(true));
    }

    #[test]
    fn test_child_only_preserves_root() {
        let mut t1 = task("t1");
        t1.successors = vec!["t2".into()];
        let mut t2 = task("t2");
        t2.predecessors = vec!["t1".into()];
        let tasks = vec![t1, t2];

        let graph = TaskGraph::from_tasks(&tasks);
        let mut progress = progress_with(&[completed_entry("t1"), completed_entry("t2")]);
        invalidate_task_recursive(&mut progress, &graph, "t1", true);

        let root = progress.task_entry("t1").unwrap();
        assert!(root.invalid.is_none());
        assert!(root.complete);
        assert_eq!(progress.task_entry("t2").unwrap().invalid, Some(true));
    }

    #[test]
    fn test_child_only_cycle_back_to_root_leaves_root_alone() {
        let mut t1 = task("t1");
        t1.successors = vec!["t2".into()];
        let mut t2 = task("t2");
        t2.successors = vec!["t1".into()];
        let tasks = vec![t1, t2];

        let graph = TaskGraph::from_tasks(&tasks);
        let mut progress = progress_with(&[completed_entry("t1"), completed_entry("t2")]);
        invalidate_task_recursive(&mut progress, &graph, "t1", true);

        assert!(progress.task_entry("t1").unwrap().invalid.is_none());
        assert_eq!(progress.task_entry("t2").unwrap().invalid, Some(true));
    }

    #[test]
    fn test_invalidation_covers_objectives() {
        let mut t1 = task("t1");
        t1.objectives = vec!["obj-a".into(), "obj-b".into()];
        let tasks = vec![t1];

        let graph = TaskGraph::from_tasks(&tasks);
        let mut progress = progress_with(&[completed_entry("t1")]);
        invalidate_task_recursive(&mut progress, &graph, "t1", false);

        for id in ["obj-a", "obj-b"] {
            let entry = progress.objective_entry(id).unwrap();
            assert_eq!(entry.invalid, Some(true));
            assert!(!entry.complete);
        }
    }

    #[test]
    fn test_missing_entries_are_synthesized() {
        let mut t1 = task("t1");
        t1.successors = vec!["t2".into()];
        let mut t2 = task("t2");
        t2.predecessors = vec!["t1".into()];
        let tasks = vec![t1, t2];

        let graph = TaskGraph::from_tasks(&tasks);
        let mut progress = FormattedProgress::default();
        invalidate_task_recursive(&mut progress, &graph, "t1", false);

        for id in ["t1", "t2"] {
            let entry = progress.task_entry(id).unwrap();
            assert!(!entry.complete);
            assert_eq!(entry.invalid, Some(true));
        }
    }

    // ── Whole-record pass ──────────────────────────────────────────────

    #[test]
    fn test_faction_gate_scenario() {
        let mut t1 = task("t1");
        t1.faction_name = PmcFaction::Usec;
        let mut t2 = task("t2");
        t2.faction_name = PmcFaction::Bear;
        let t3 = task("t3");
        let tasks = vec![t1, t2, t3];

        let mut progress = progress_with(&[
            completed_entry("t1"),
            completed_entry("t2"),
            completed_entry("t3"),
        ]);
        invalidate_inconsistent(&mut progress, &tasks, PmcFaction::Usec, "user-1");

        assert!(progress.task_entry("t1").unwrap().invalid.is_none());
        assert_eq!(progress.task_entry("t2").unwrap().invalid, Some(true));
        assert!(!progress.task_entry("t2").unwrap().complete);
        assert!(progress.task_entry("t3").unwrap().invalid.is_none());
    }

    #[test]
    fn test_faction_gate_ignores_stored_complete() {
        let mut t1 = task("t1");
        t1.faction_name = PmcFaction::Bear;
        let tasks = vec![t1];

        // Never stored at all — the gate is permanent either way.
        let mut progress = FormattedProgress::default();
        invalidate_inconsistent(&mut progress, &tasks, PmcFaction::Usec, "user-1");
        assert_eq!(progress.task_entry("t1").unwrap().invalid, Some(true));
    }

    #[test]
    fn test_alternative_exclusivity() {
        let mut t1 = task("t1");
        t1.alternatives = vec!["t2".into()];
        let mut t2 = task("t2");
        t2.alternatives = vec!["t1".into()];
        let tasks = vec![t1, t2];

        let mut progress = progress_with(&[completed_entry("t2")]);
        invalidate_inconsistent(&mut progress, &tasks, PmcFaction::Usec, "user-1");

        assert_eq!(progress.task_entry("t1").unwrap().invalid, Some(true));
        assert!(progress.task_entry("t2").unwrap().invalid.is_none());
        assert!(progress.task_entry("t2").unwrap().complete);
    }

    #[test]
    fn test_failed_alternative_keeps_its_failed_state() {
        let mut t1 = task("t1");
        t1.alternatives = vec!["t2".into()];
        let mut t2 = task("t2");
        t2.alternatives = vec!["t1".into()];
        let tasks = vec![t1, t2];

        let mut progress = progress_with(&[
            completed_entry("t1"),
            TaskEntry {
                id: "t2".into(),
                complete: true,
                failed: Some(true),
                ..TaskEntry::default()
            },
        ]);
        invalidate_inconsistent(&mut progress, &tasks, PmcFaction::Usec, "user-1");

        // t2 was failed by taking t1: t1 stands, and t2's failed record
        // survives so that `failed`-status requirements stay satisfiable.
        assert!(progress.task_entry("t1").unwrap().invalid.is_none());
        assert!(progress.task_entry("t1").unwrap().complete);
        let t2_entry = progress.task_entry("t2").unwrap();
        assert!(t2_entry.invalid.is_none());
        assert!(t2_entry.complete);
        assert!(t2_entry.is_failed());
    }

    #[test]
    fn test_failed_task_unlocks_failed_status_dependent() {
        // t1 and t2 are alternatives; t3 follows t2's failure path.
        let mut t1 = task("t1");
        t1.alternatives = vec!["t2".into()];
        let mut t2 = task("t2");
        t2.alternatives = vec!["t1".into()];
        t2.successors = vec!["t3".into()];
        let mut t3 = task("t3");
        t3.predecessors = vec!["t2".into()];
        t3.task_requirements = vec![TaskRequirement {
            task: "t2".into(),
            status: vec![RequirementStatus::Failed],
        }];
        let tasks = vec![t1, t2, t3];

        let mut progress = progress_with(&[
            completed_entry("t1"),
            TaskEntry {
                id: "t2".into(),
                complete: true,
                failed: Some(true),
                ..TaskEntry::default()
            },
            completed_entry("t3"),
        ]);
        invalidate_inconsistent(&mut progress, &tasks, PmcFaction::Usec, "user-1");

        assert!(progress.task_entry("t3").unwrap().invalid.is_none());
        assert!(progress.task_entry("t3").unwrap().complete);
    }

    #[test]
    fn test_alternative_cascades_successors_but_not_own_state() {
        let mut t1 = task("t1");
        t1.alternatives = vec!["t2".into()];
        t1.successors = vec!["t3".into()];
        t1.objectives = vec!["obj-t1".into()];
        let mut t2 = task("t2");
        t2.alternatives = vec!["t1".into()];
        let mut t3 = task("t3");
        t3.predecessors = vec!["t1".into()];
        let tasks = vec![t1, t2, t3];

        let mut progress = progress_with(&[completed_entry("t2"), completed_entry("t3")]);
        invalidate_inconsistent(&mut progress, &tasks, PmcFaction::Usec, "user-1");

        assert_eq!(progress.task_entry("t1").unwrap().invalid, Some(true));
        assert_eq!(progress.task_entry("t3").unwrap().invalid, Some(true));
        // The childOnly cascade does not touch t1's objectives.
        assert!(progress.objective_entry("obj-t1").is_none());
    }

    #[test]
    fn test_requirement_wants_failed_but_target_completed() {
        let mut t1 = task("t1");
        t1.task_requirements = vec![TaskRequirement {
            task: "t2".into(),
            status: vec![RequirementStatus::Failed],
        }];
        let t2 = task("t2");
        let tasks = vec![t1, t2];

        let mut progress = progress_with(&[completed_entry("t1"), completed_entry("t2")]);
        invalidate_inconsistent(&mut progress, &tasks, PmcFaction::Usec, "user-1");

        assert_eq!(progress.task_entry("t1").unwrap().invalid, Some(true));
        assert!(progress.task_entry("t2").unwrap().invalid.is_none());
    }

    #[test]
    fn test_requirement_satisfied_by_failed_target() {
        let mut t1 = task("t1");
        t1.task_requirements = vec![TaskRequirement {
            task: "t2".into(),
            status: vec![RequirementStatus::Failed],
        }];
        let t2 = task("t2");
        let tasks = vec![t1, t2];

        let mut progress = progress_with(&[
            completed_entry("t1"),
            TaskEntry {
                id: "t2".into(),
                complete: true,
                failed: Some(true),
                ..TaskEntry::default()
            },
        ]);
        invalidate_inconsistent(&mut progress, &tasks, PmcFaction::Usec, "user-1");
        assert!(progress.task_entry("t1").unwrap().invalid.is_none());
    }

    #[test]
    fn test_requirement_with_either_status_accepts_both() {
        let mut t1 = task("t1");
        t1.task_requirements = vec![TaskRequirement {
            task: "t2".into(),
            status: vec![RequirementStatus::Complete, RequirementStatus::Failed],
        }];
        let t2 = task("t2");
        let tasks = vec![t1, t2];

        let mut progress = progress_with(&[completed_entry("t1"), completed_entry("t2")]);
        invalidate_inconsistent(&mut progress, &tasks, PmcFaction::Usec, "user-1");
        assert!(progress.task_entry("t1").unwrap().invalid.is_none());
    }

    #[test]
    fn test_unknown_status_requirement_is_unsatisfiable() {
        let mut t1 = task("t1");
        t1.task_requirements = vec![TaskRequirement {
            task: "t2".into(),
            status: vec![RequirementStatus::Other],
        }];
        let t2 = task("t2");
        let tasks = vec![t1, t2];

        let mut progress = progress_with(&[completed_entry("t1"), completed_entry("t2")]);
        invalidate_inconsistent(&mut progress, &tasks, PmcFaction::Usec, "user-1");
        assert_eq!(progress.task_entry("t1").unwrap().invalid, Some(true));
    }

    #[test]
    fn test_diamond_settles_regardless_of_order() {
        // t4 requires both arms of a diamond rooted at t1. Listing t4
        // first forces the pass to need a second sweep.
        let mut t4 = task("t4");
        t4.predecessors = vec!["t2".into(), "t3".into()];
        t4.task_requirements = vec![
            TaskRequirement {
                task: "t2".into(),
                status: vec![RequirementStatus::Complete],
            },
            TaskRequirement {
                task: "t3".into(),
                status: vec![RequirementStatus::Complete],
            },
        ];
        let mut t1 = task("t1");
        t1.faction_name = PmcFaction::Bear;
        t1.successors = vec!["t2".into(), "t3".into()];
        let mut t2 = task("t2");
        t2.predecessors = vec!["t1".into()];
        t2.successors = vec!["t4".into()];
        let mut t3 = task("t3");
        t3.predecessors = vec!["t1".into()];
        t3.successors = vec!["t4".into()];
        let tasks = vec![t4, t1, t2, t3];

        let mut progress = progress_with(&[
            completed_entry("t1"),
            completed_entry("t2"),
            completed_entry("t3"),
            completed_entry("t4"),
        ]);
        invalidate_inconsistent(&mut progress, &tasks, PmcFaction::Usec, "user-1");

        for id in ["t1", "t2", "t3", "t4"] {
            assert_eq!(progress.task_entry(id).unwrap().invalid, Some(true), "{id}");
        }
    }

    #[test]
    fn test_empty_catalog_is_a_no_op() {
        let mut progress = progress_with(&[completed_entry("t1")]);
        invalidate_inconsistent(&mut progress, &[], PmcFaction::Usec, "user-1");
        assert!(progress.task_entry("t1").unwrap().invalid.is_none());
    }

    #[test]
    fn test_gates_evaluated_independently() {
        // Faction mismatch and unmet requirement both true — still just invalid.
        let mut t1 = task("t1");
        t1.faction_name = PmcFaction::Bear;
        t1.task_requirements = vec![TaskRequirement {
            task: "t2".into(),
            status: vec![RequirementStatus::Complete],
        }];
        let t2 = task("t2");
        let tasks = vec![t1, t2];

        let mut progress = progress_with(&[completed_entry("t1")]);
        invalidate_inconsistent(&mut progress, &tasks, PmcFaction::Usec, "user-1");
        let entry = progress.task_entry("t1").unwrap();
        assert_eq!(entry.invalid, Some(true));
        assert!(!entry.complete);
    }
}
