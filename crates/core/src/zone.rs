//! Canonical settlement zones and hubs.
//!
//! Raw provider spellings ("North Hub", "LZ_SOUTH", "hb-west") are mapped onto
//! the fixed [`Zone`] set by [`normalize_zone`]. The lookup is tiered:
//! exact canonical identifier, then the alias table, then a prefix-stripped
//! retry of both. Exact matches always win over the heuristics.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A canonical load zone or trading hub.
///
/// Variant order matches the lexical order of the identifiers, so sorting by
/// `Zone` is the same as sorting by its string form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Zone {
    HbHouston,
    HbNorth,
    HbSouth,
    HbWest,
    Houston,
    North,
    South,
    West,
}

impl Zone {
    /// Every canonical zone, in sort order.
    pub const ALL: [Zone; 8] = [
        Zone::HbHouston,
        Zone::HbNorth,
        Zone::HbSouth,
        Zone::HbWest,
        Zone::Houston,
        Zone::North,
        Zone::South,
        Zone::West,
    ];

    /// Canonical identifier.
    pub fn as_str(self) -> &'static str {
        match self {
            Zone::HbHouston => "HB_HOUSTON",
            Zone::HbNorth => "HB_NORTH",
            Zone::HbSouth => "HB_SOUTH",
            Zone::HbWest => "HB_WEST",
            Zone::Houston => "HOUSTON",
            Zone::North => "NORTH",
            Zone::South => "SOUTH",
            Zone::West => "WEST",
        }
    }

    /// Exact match against the canonical identifiers only.
    pub fn from_canonical(value: &str) -> Option<Zone> {
        Zone::ALL.iter().copied().find(|zone| zone.as_str() == value)
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Zone {
    type Err = Error;

    /// Strict parse of a canonical identifier. Use [`normalize_zone`] for raw input.
    fn from_str(s: &str) -> Result<Self> {
        Zone::from_canonical(s).ok_or_else(|| Error::data(format!("not a canonical zone: '{s}'")))
    }
}

/// Known naming variants, keyed by their separator-normalized spelling.
pub const ZONE_ALIASES: &[(&str, Zone)] = &[
    ("NORTH_ZONE", Zone::North),
    ("SOUTH_ZONE", Zone::South),
    ("HOUSTON_ZONE", Zone::Houston),
    ("WEST_ZONE", Zone::West),
    ("LZ_NORTH", Zone::North),
    ("LZ_SOUTH", Zone::South),
    ("LZ_HOUSTON", Zone::Houston),
    ("LZ_WEST", Zone::West),
    ("HB_NORTH_HUB", Zone::HbNorth),
    ("HB_SOUTH_HUB", Zone::HbSouth),
    ("HB_HOUSTON_HUB", Zone::HbHouston),
    ("HB_WEST_HUB", Zone::HbWest),
    ("NORTH_HUB", Zone::HbNorth),
    ("SOUTH_HUB", Zone::HbSouth),
    ("HOUSTON_HUB", Zone::HbHouston),
    ("WEST_HUB", Zone::HbWest),
];

/// Prefixes stripped before the final lookup, tried in order.
pub const ZONE_PREFIXES: &[&str] = &["LZ_", "HZ_", "HZON_", "LOAD_ZONE_", "HB_"];

const SEPARATOR: char = '_';

/// Trim, uppercase, and collapse runs of spaces/hyphens into one separator.
///
/// Runs collapse rather than map one-to-one, so `"HB  West"` and
/// `"hb - west"` both key to `HB_WEST`.
fn separator_key(raw: &str) -> String {
    let mut key = String::with_capacity(raw.len());
    let mut pending_separator = false;

    for ch in raw.trim().chars() {
        if ch == '-' || ch.is_whitespace() {
            pending_separator = true;
            continue;
        }
        if pending_separator {
            key.push(SEPARATOR);
            pending_separator = false;
        }
        key.extend(ch.to_uppercase());
    }

    key
}

fn lookup_alias(key: &str) -> Option<Zone> {
    ZONE_ALIASES
        .iter()
        .find(|(alias, _)| *alias == key)
        .map(|&(_, zone)| zone)
}

fn lookup(key: &str) -> Option<Zone> {
    Zone::from_canonical(key).or_else(|| lookup_alias(key))
}

/// Map a raw zone/hub spelling onto its canonical zone.
///
/// Returns `None` for anything unrecognized; callers decide whether that is a
/// hard failure or a filter.
pub fn normalize_zone(raw: &str) -> Option<Zone> {
    let key = separator_key(raw);
    if key.is_empty() {
        return None;
    }

    if let Some(zone) = lookup(&key) {
        return Some(zone);
    }

    ZONE_PREFIXES.iter().find_map(|prefix| {
        key.strip_prefix(prefix)
            .filter(|rest| !rest.is_empty())
            .and_then(lookup)
    })
}
