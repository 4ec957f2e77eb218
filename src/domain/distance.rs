// ============================================================
// Layer 3 — Distance Kinds
// ============================================================
// The six linguistic distances computed for every language pair.
// Their order is fixed: engines return values in the order the
// kinds were requested, and tables store them under the
// uppercase header names in this same order.

use std::fmt;
use std::str::FromStr;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceKind {
    Genetic,
    Syntactic,
    Featural,
    Phonological,
    Inventory,
    Geographic,
}

impl DistanceKind {
    /// All six kinds in canonical order.
    pub const ALL: [DistanceKind; 6] = [
        DistanceKind::Genetic,
        DistanceKind::Syntactic,
        DistanceKind::Featural,
        DistanceKind::Phonological,
        DistanceKind::Inventory,
        DistanceKind::Geographic,
    ];

    /// Lowercase metric name, as the engine knows it.
    pub fn name(self) -> &'static str {
        match self {
            DistanceKind::Genetic      => "genetic",
            DistanceKind::Syntactic    => "syntactic",
            DistanceKind::Featural     => "featural",
            DistanceKind::Phonological => "phonological",
            DistanceKind::Inventory    => "inventory",
            DistanceKind::Geographic   => "geographic",
        }
    }

    /// Uppercase column header used in distance and dataset tables.
    pub fn header(self) -> &'static str {
        match self {
            DistanceKind::Genetic      => "GENETIC",
            DistanceKind::Syntactic    => "SYNTACTIC",
            DistanceKind::Featural     => "FEATURAL",
            DistanceKind::Phonological => "PHONOLOGICAL",
            DistanceKind::Inventory    => "INVENTORY",
            DistanceKind::Geographic   => "GEOGRAPHIC",
        }
    }

    /// The six headers in canonical order.
    pub fn headers() -> Vec<&'static str> {
        Self::ALL.iter().map(|k| k.header()).collect()
    }
}

impl fmt::Display for DistanceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DistanceKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "genetic"      => Ok(DistanceKind::Genetic),
            "syntactic"    => Ok(DistanceKind::Syntactic),
            "featural"     => Ok(DistanceKind::Featural),
            "phonological" => Ok(DistanceKind::Phonological),
            "inventory"    => Ok(DistanceKind::Inventory),
            "geographic"   => Ok(DistanceKind::Geographic),
            other          => bail!("Unknown distance kind '{other}'"),
        }
    }
}

// ─── DistanceVector ───────────────────────────────────────────────────────────
/// Six non-negative distances for one pair, in `DistanceKind::ALL` order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DistanceVector(pub [f64; 6]);

impl DistanceVector {
    /// Build from engine output; the engine must return exactly six values.
    pub fn from_values(values: &[f64]) -> Result<Self> {
        let arr: [f64; 6] = match values.try_into() {
            Ok(arr) => arr,
            Err(_)  => bail!("Expected 6 distance values, got {}", values.len()),
        };
        if let Some(v) = arr.iter().find(|v| !v.is_finite() || **v < 0.0) {
            bail!("Distance values must be finite and non-negative, got {v}");
        }
        Ok(Self(arr))
    }

    /// `v1,v2,...,v6` with four decimals, the per-row progress line.
    pub fn progress_line(&self) -> String {
        self.0
            .iter()
            .map(|v| format!("{v:.4}"))
            .collect::<Vec<_>>()
            .join(",")
    }
}
