//! Game edition constants and edition-granted hideout unlocks.
//!
//! Purchase tiers run 1 (standard) through 5 (top). Higher tiers ship with
//! stash levels pre-built, and the top tier also unlocks the Cultist Circle.
//! These grants come from the edition alone and override stored facts.

use serde_json::Value;

/// Lowest purchase tier, and the fallback for unusable stored values.
pub const BASE_EDITION: u8 = 1;
/// Highest purchase tier — the only one that grants the Cultist Circle.
pub const TOP_EDITION: u8 = 5;

/// Catalog id of the Stash station.
pub const STASH_STATION_ID: &str = "5d484fc0654e76006657e0ab";
/// Catalog id of the Cultist Circle station.
pub const CULTIST_CIRCLE_STATION_ID: &str = "667298e75ea6b4493c08f266";

/// Minimum edition that grants a given stash level. Levels outside the
/// table are never edition-granted.
pub fn stash_level_grant_edition(level: u32) -> Option<u8> {
    match level {
        1 => Some(1),
        2 => Some(2),
        3 => Some(3),
        4 => Some(4),
        _ => None,
    }
}

/// Whether `edition` auto-grants level `level` of station `station_id`.
pub fn edition_grants_level(edition: u8, station_id: &str, level: u32) -> bool {
    match station_id {
        STASH_STATION_ID => {
            stash_level_grant_edition(level).is_some_and(|needed| edition >= needed)
        }
        CULTIST_CIRCLE_STATION_ID => edition == TOP_EDITION,
        _ => false,
    }
}

/// Coerce a stored `gameEdition` value to a usable tier.
///
/// Integers and integral floats in `1..=5` pass through; numeric strings are
/// parsed; everything else falls back to `fallback` (the catalog-provided
/// root edition, when the caller has one) or [`BASE_EDITION`].
pub fn coerce_game_edition(raw: Option<&Value>, fallback: Option<u8>) -> u8 {
    let fallback = fallback.unwrap_or(BASE_EDITION);
    let Some(value) = raw else {
        return fallback;
    };
    let parsed = match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    match parsed {
        Some(e) if (BASE_EDITION as i64..=TOP_EDITION as i64).contains(&e) => e as u8,
        _ => fallback,
    }
}
