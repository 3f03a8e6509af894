//! raidtrack Headless Validation Harness
//!
//! Exercises the progress engine against the bundled catalog without a
//! store, a server, or a UI. Runs entirely in-process.
//!
//! Usage:
//!   cargo run -p raidtrack-simtest
//!   cargo run -p raidtrack-simtest -- --verbose

use std::collections::BTreeSet;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use raidtrack_logic::catalog::Catalog;
use raidtrack_logic::editions::{
    BASE_EDITION, CULTIST_CIRCLE_STATION_ID, STASH_STATION_ID, TOP_EDITION,
};
use raidtrack_logic::formatter::{build_progress, format_progress};
use raidtrack_logic::invalidator::{invalidate_task_recursive, TaskGraph};
use raidtrack_logic::modes::GameMode;
use raidtrack_logic::progress::FormattedProgress;
use raidtrack_logic::record::{RawModeData, RawProgress, RawTaskState};

// ── Catalog fixture (same JSON shape the provider serves) ───────────────
const CATALOG_JSON: &str = include_str!("../../../data/catalog.json");

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

fn check(name: &str, passed: bool, detail: String) -> TestResult {
    TestResult {
        name: name.to_string(),
        passed,
        detail,
    }
}

fn main() {
    let verbose = std::env::args().any(|a| a == "--verbose");
    println!("=== raidtrack Progress Engine Harness ===\n");

    let catalog: Catalog = match serde_json::from_str(CATALOG_JSON) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("catalog fixture failed to parse: {e}");
            std::process::exit(1);
        }
    };

    let mut results = Vec::new();

    // 1. Catalog shape
    results.extend(validate_catalog(&catalog, verbose));

    // 2. Formatter defaults
    results.extend(validate_formatter_defaults(&catalog, verbose));

    // 3. Edition-granted hideout
    results.extend(validate_edition_grants(&catalog, verbose));

    // 4. Faction gating
    results.extend(validate_faction_gate(&catalog, verbose));

    // 5. Alternatives & requirement statuses
    results.extend(validate_alternatives(&catalog, verbose));

    // 6. Cascade & graph traversal
    results.extend(validate_cascade(&catalog, verbose));

    // 7. Randomized consistency sweep
    results.extend(validate_random_sweep(&catalog, verbose));

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
}

// ── Record builders ─────────────────────────────────────────────────────

fn record_with_completions(ids: &[&str]) -> RawProgress {
    let mut data = RawModeData::default();
    for id in ids {
        data.task_completions.insert(
            (*id).to_string(),
            RawTaskState {
                complete: true,
                ..RawTaskState::default()
            },
        );
    }
    let mut raw = RawProgress::default();
    raw.modes.insert("pvp".into(), data);
    raw
}

fn pipeline(raw: Option<&RawProgress>, catalog: &Catalog) -> FormattedProgress {
    format_progress(
        raw,
        "harness-user",
        &catalog.hideout_stations,
        &catalog.tasks,
        GameMode::Pvp,
    )
}

// ── 1. Catalog shape ────────────────────────────────────────────────────

fn validate_catalog(catalog: &Catalog, verbose: bool) -> Vec<TestResult> {
    let mut results = Vec::new();

    let mut ids = BTreeSet::new();
    let duplicate = catalog.tasks.iter().find(|t| !ids.insert(t.id.as_str()));
    results.push(check(
        "catalog.unique_task_ids",
        duplicate.is_none(),
        format!("{} tasks", catalog.tasks.len()),
    ));

    let mut asymmetric = Vec::new();
    for task in &catalog.tasks {
        for succ in &task.successors {
            let back = catalog
                .task(succ)
                .is_some_and(|s| s.predecessors.contains(&task.id));
            if !back {
                asymmetric.push(format!("{}→{}", task.id, succ));
            }
        }
        for alt in &task.alternatives {
            let back = catalog
                .task(alt)
                .is_some_and(|a| a.alternatives.contains(&task.id));
            if !back {
                asymmetric.push(format!("{}↔{}", task.id, alt));
            }
        }
    }
    results.push(check(
        "catalog.symmetric_edges",
        asymmetric.is_empty(),
        if asymmetric.is_empty() {
            "successor and alternative edges mirrored".to_string()
        } else {
            asymmetric.join(", ")
        },
    ));

    let dangling: Vec<String> = catalog
        .tasks
        .iter()
        .flat_map(|t| t.task_requirements.iter())
        .filter(|req| catalog.task(&req.task).is_none())
        .map(|req| req.task.clone())
        .collect();
    results.push(check(
        "catalog.requirement_targets_exist",
        dangling.is_empty(),
        if dangling.is_empty() {
            "all requirement edges resolve".to_string()
        } else {
            dangling.join(", ")
        },
    ));

    let stash = catalog.station(STASH_STATION_ID);
    results.push(check(
        "catalog.special_stations_present",
        stash.is_some_and(|s| s.levels.len() == 4)
            && catalog.station(CULTIST_CIRCLE_STATION_ID).is_some(),
        "stash (4 levels) and cultist circle".to_string(),
    ));

    if verbose {
        let objective_count: usize = catalog.tasks.iter().map(|t| t.objectives.len()).sum();
        println!("  catalog: {} objectives across tasks", objective_count);
    }
    results
}

// ── 2. Formatter defaults ───────────────────────────────────────────────

fn validate_formatter_defaults(catalog: &Catalog, _verbose: bool) -> Vec<TestResult> {
    let mut results = Vec::new();

    let progress = build_progress(None, "fresh-user", &catalog.hideout_stations, GameMode::Pvp);
    results.push(check(
        "formatter.defaults",
        progress.player_level == 1
            && progress.game_edition == BASE_EDITION
            && progress.display_name == "fresh-"
            && progress.tasks_progress.is_empty(),
        format!(
            "level={} edition={} name={:?}",
            progress.player_level, progress.game_edition, progress.display_name
        ),
    ));

    let raw: RawProgress =
        serde_json::from_str(r#"{"gameEdition": "not-a-number"}"#).expect("raw record");
    let progress = build_progress(
        Some(&raw),
        "fresh-user",
        &catalog.hideout_stations,
        GameMode::Pvp,
    );
    results.push(check(
        "formatter.malformed_edition_falls_back",
        progress.game_edition == BASE_EDITION,
        format!("edition={}", progress.game_edition),
    ));

    results
}

// ── 3. Edition-granted hideout ──────────────────────────────────────────

fn validate_edition_grants(catalog: &Catalog, verbose: bool) -> Vec<TestResult> {
    let mut results = Vec::new();

    for edition in BASE_EDITION..=TOP_EDITION {
        let raw: RawProgress =
            serde_json::from_str(&format!(r#"{{"gameEdition": {edition}}}"#)).expect("raw record");
        let progress = build_progress(
            Some(&raw),
            "harness-user",
            &catalog.hideout_stations,
            GameMode::Pvp,
        );

        let stash_built = progress
            .hideout_modules_progress
            .iter()
            .filter(|m| m.id.starts_with("stash-") && m.complete)
            .count();
        let expected_stash = edition.min(4) as usize;
        let cultist_built = progress
            .module_entry("cultist-circle-1")
            .map(|m| m.complete)
            .unwrap_or(false);

        if verbose {
            println!(
                "  edition {edition}: stash levels {stash_built}, cultist {cultist_built}"
            );
        }
        results.push(check(
            &format!("editions.grants_edition_{edition}"),
            stash_built == expected_stash && cultist_built == (edition == TOP_EDITION),
            format!("stash {stash_built}/{expected_stash}, cultist {cultist_built}"),
        ));
    }

    results
}

// ── 4. Faction gating ───────────────────────────────────────────────────

fn validate_faction_gate(catalog: &Catalog, _verbose: bool) -> Vec<TestResult> {
    let mut results = Vec::new();

    let mut raw = record_with_completions(&["textile-part-1-usec", "textile-part-1-bear"]);
    raw.pmc_faction = Some("BEAR".to_string());
    let progress = pipeline(Some(&raw), catalog);

    let usec = progress.task_entry("textile-part-1-usec");
    let bear = progress.task_entry("textile-part-1-bear");
    results.push(check(
        "faction.gate_blocks_other_faction",
        usec.is_some_and(|e| e.is_invalid() && !e.complete),
        "USEC task invalid for a BEAR player".to_string(),
    ));
    results.push(check(
        "faction.gate_admits_own_faction",
        bear.is_some_and(|e| e.complete && !e.is_invalid()),
        "BEAR task stands for a BEAR player".to_string(),
    ));

    results
}

// ── 5. Alternatives & requirement statuses ──────────────────────────────

fn validate_alternatives(catalog: &Catalog, _verbose: bool) -> Vec<TestResult> {
    let mut results = Vec::new();

    // Taking Big Customer forecloses Chemical Part 4.
    let raw = record_with_completions(&["chemical-part-3", "big-customer"]);
    let progress = pipeline(Some(&raw), catalog);
    results.push(check(
        "alternatives.completion_forecloses_other",
        progress
            .task_entry("chemical-part-4")
            .is_some_and(|e| e.is_invalid()),
        "chemical-part-4 invalid after big-customer".to_string(),
    ));
    results.push(check(
        "alternatives.taken_task_stands",
        progress
            .task_entry("big-customer")
            .is_some_and(|e| e.complete && !e.is_invalid()),
        "big-customer stays complete".to_string(),
    ));

    // loyalty-buyout wants big-customer *failed*; completing it instead
    // leaves the requirement unmet.
    results.push(check(
        "requirements.failed_status_unmet_by_completion",
        progress
            .task_entry("loyalty-buyout")
            .is_some_and(|e| e.is_invalid()),
        "loyalty-buyout invalid while big-customer is completed".to_string(),
    ));

    // A failed big-customer satisfies it.
    let mut raw = record_with_completions(&["chemical-part-3", "chemical-part-4"]);
    if let Some(data) = raw.modes.get_mut("pvp") {
        data.task_completions.insert(
            "big-customer".to_string(),
            RawTaskState {
                complete: true,
                failed: true,
                timestamp: None,
            },
        );
    }
    let progress = pipeline(Some(&raw), catalog);
    results.push(check(
        "requirements.failed_status_met_by_failure",
        progress
            .task_entry("loyalty-buyout")
            .map(|e| !e.is_invalid())
            .unwrap_or(true),
        "loyalty-buyout unlocked by failed big-customer".to_string(),
    ));

    results
}

// ── 6. Cascade & graph traversal ────────────────────────────────────────

fn validate_cascade(catalog: &Catalog, _verbose: bool) -> Vec<TestResult> {
    let mut results = Vec::new();

    // Stored completions above a hole in the chain collapse.
    let raw = record_with_completions(&["checking", "shootout-picnic", "network-provider-1"]);
    let progress = pipeline(Some(&raw), catalog);
    let all_invalid = ["checking", "shootout-picnic", "network-provider-1"]
        .iter()
        .all(|id| progress.task_entry(id).is_some_and(|e| e.is_invalid()));
    results.push(check(
        "cascade.hole_in_chain_collapses_dependents",
        all_invalid,
        "checking → shootout-picnic → network-provider-1 all invalid".to_string(),
    ));

    // Direct recursive invalidation from the chain root reaches the leaf.
    let graph = TaskGraph::from_tasks(&catalog.tasks);
    let raw = record_with_completions(&["debut", "checking", "shootout-picnic"]);
    let mut progress = pipeline(Some(&raw), catalog);
    invalidate_task_recursive(&mut progress, &graph, "debut", false);
    let leaf_invalid = progress
        .task_entry("network-provider-1")
        .is_some_and(|e| e.is_invalid());
    let objectives_invalid = progress
        .objective_entry("obj-debut-eliminate")
        .is_some_and(|e| e.is_invalid());
    results.push(check(
        "cascade.recursive_reaches_leaf_and_objectives",
        leaf_invalid && objectives_invalid,
        "debut cascade reaches network-provider-1 and debut objectives".to_string(),
    ));

    // child_only leaves the root alone.
    let raw = record_with_completions(&["debut", "checking"]);
    let mut progress = pipeline(Some(&raw), catalog);
    invalidate_task_recursive(&mut progress, &graph, "debut", true);
    let root_intact = progress
        .task_entry("debut")
        .is_some_and(|e| e.complete && !e.is_invalid());
    let child_invalid = progress
        .task_entry("checking")
        .is_some_and(|e| e.is_invalid());
    results.push(check(
        "cascade.child_only_preserves_root",
        root_intact && child_invalid,
        "debut untouched, checking invalidated".to_string(),
    ));

    results
}

// ── 7. Randomized consistency sweep ─────────────────────────────────────

fn validate_random_sweep(catalog: &Catalog, verbose: bool) -> Vec<TestResult> {
    const SWEEPS: usize = 200;
    let mut rng = StdRng::seed_from_u64(7);
    let mut violations = Vec::new();
    let mut nondeterministic = 0usize;

    for sweep in 0..SWEEPS {
        let raw = random_record(catalog, &mut rng);
        for mode in GameMode::ALL {
            let view = format_progress(
                Some(&raw),
                "sweep-user",
                &catalog.hideout_stations,
                &catalog.tasks,
                mode,
            );
            let again = format_progress(
                Some(&raw),
                "sweep-user",
                &catalog.hideout_stations,
                &catalog.tasks,
                mode,
            );

            if serde_json::to_string(&view).expect("serialize")
                != serde_json::to_string(&again).expect("serialize")
            {
                nondeterministic += 1;
            }

            for entry in &view.tasks_progress {
                if entry.is_invalid() && entry.complete {
                    violations.push(format!("sweep {sweep} task {}", entry.id));
                }
            }
            for entry in &view.task_objectives_progress {
                if entry.is_invalid() && entry.complete {
                    violations.push(format!("sweep {sweep} objective {}", entry.id));
                }
            }
        }
    }

    if verbose {
        println!("  sweep: {SWEEPS} randomized records × both modes");
    }

    vec![
        check(
            "sweep.invalid_implies_incomplete",
            violations.is_empty(),
            if violations.is_empty() {
                format!("{SWEEPS} records clean")
            } else {
                violations.join(", ")
            },
        ),
        check(
            "sweep.deterministic",
            nondeterministic == 0,
            format!("{nondeterministic} divergent re-runs"),
        ),
    ]
}

fn random_record(catalog: &Catalog, rng: &mut StdRng) -> RawProgress {
    let mut raw = RawProgress::default();
    raw.level = Some(rng.gen_range(1..=79));
    raw.pmc_faction = Some(
        match rng.gen_range(0..3) {
            0 => "USEC",
            1 => "BEAR",
            _ => "SCAV",
        }
        .to_string(),
    );
    raw.game_edition = Some(match rng.gen_range(0..4) {
        0 => serde_json::json!(rng.gen_range(1..=5)),
        1 => serde_json::json!(rng.gen_range(1..=5).to_string()),
        2 => serde_json::json!(rng.gen_range(-3..12)),
        _ => serde_json::json!("unheard"),
    });

    for mode in GameMode::ALL {
        let mut data = RawModeData::default();
        for task in &catalog.tasks {
            if rng.gen_bool(0.5) {
                continue;
            }
            data.task_completions.insert(
                task.id.clone(),
                RawTaskState {
                    complete: rng.gen_bool(0.8),
                    failed: rng.gen_bool(0.2),
                    timestamp: Some(rng.gen_range(1_600_000_000_000..1_800_000_000_000)),
                },
            );
            for objective in &task.objectives {
                if rng.gen_bool(0.5) {
                    data.task_objectives.insert(
                        objective.clone(),
                        raidtrack_logic::record::RawObjectiveState {
                            complete: rng.gen_bool(0.5),
                            count: rng.gen_bool(0.5).then(|| rng.gen_range(0..30)),
                            timestamp: None,
                        },
                    );
                }
            }
        }
        raw.modes.insert(mode.key().to_string(), data);
    }
    raw
}
