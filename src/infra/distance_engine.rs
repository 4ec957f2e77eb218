// ============================================================
// Layer 6 — Vector Distance Engine
// ============================================================
// The concrete DistanceEngine used by the CLI. Every distance
// kind has its own table of language vectors, one CSV per kind:
//
//   {vectors_dir}/genetic.csv
//   {vectors_dir}/syntactic.csv
//   ...
//   {vectors_dir}/geographic.csv
//
//   glottocode,F1,F2,F3,...
//   stan1293,1,0,--,...
//
// The first column is the glottocode, the rest are numeric
// features; empty cells and "--" mark missing values.
//
// The distance between two languages is the angular distance
// between their vectors, restricted to features both languages
// have:
//
//   cos θ = a·b / (|a| |b|)
//   d     = arccos(cos θ) / π          ∈ [0, 1]
//
// The engine is built once by the caller with an explicit
// EngineConfig and passed by reference to every table build, so
// with caching on a pair shared between tasks is computed once.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    cell::RefCell,
    collections::HashMap,
    path::Path,
};

use crate::data::table::Table;
use crate::domain::distance::DistanceKind;
use crate::domain::language::LanguagePair;
use crate::domain::traits::DistanceEngine;

/// Per-language feature vector; `None` = missing value.
pub type LanguageVector = Vec<Option<f64>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Remember every computed (kind, pair) distance for the engine's lifetime
    pub cache: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { cache: true }
    }
}

#[derive(Debug)]
pub struct VectorDistanceEngine {
    config:  EngineConfig,
    vectors: HashMap<DistanceKind, HashMap<String, LanguageVector>>,
    cache:   RefCell<HashMap<(DistanceKind, LanguagePair), f64>>,
}

impl VectorDistanceEngine {
    /// An engine with no vectors loaded yet.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            vectors: HashMap::new(),
            cache:   RefCell::new(HashMap::new()),
        }
    }

    /// Load `{dir}/{kind}.csv` for all six kinds.
    pub fn load_dir(dir: impl AsRef<Path>, config: EngineConfig) -> Result<Self> {
        let dir = dir.as_ref();
        let mut engine = Self::new(config);

        for kind in DistanceKind::ALL {
            let path    = dir.join(format!("{}.csv", kind.name()));
            let vectors = load_vectors(&path)
                .with_context(|| format!("Cannot load {kind} vectors from '{}'", path.display()))?;
            tracing::info!("Loaded {} {kind} vectors", vectors.len());
            engine.insert_vectors(kind, vectors);
        }

        tracing::debug!("Distance engine ready (cache: {})", config.cache);
        Ok(engine)
    }

    /// Add or replace the vectors for one distance kind.
    pub fn insert_vectors(&mut self, kind: DistanceKind, vectors: HashMap<String, LanguageVector>) {
        self.vectors.insert(kind, vectors);
        self.cache.borrow_mut().retain(|(k, _), _| *k != kind);
    }

    /// Number of (kind, pair) distances currently cached.
    pub fn cached_entries(&self) -> usize {
        self.cache.borrow().len()
    }

    fn compute(&self, kind: DistanceKind, pair: &LanguagePair) -> Result<f64> {
        let table = self
            .vectors
            .get(&kind)
            .with_context(|| format!("No {kind} vectors loaded"))?;
        let a = table
            .get(&pair.first)
            .with_context(|| format!("No {kind} vector for '{}'", pair.first))?;
        let b = table
            .get(&pair.second)
            .with_context(|| format!("No {kind} vector for '{}'", pair.second))?;
        angular_distance(a, b).with_context(|| format!("{kind} distance for {pair}"))
    }
}

impl DistanceEngine for VectorDistanceEngine {
    fn distances(&self, kinds: &[DistanceKind], pair: &LanguagePair) -> Result<Vec<f64>> {
        kinds
            .iter()
            .map(|&kind| {
                if self.config.cache {
                    if let Some(&d) = self.cache.borrow().get(&(kind, pair.clone())) {
                        return Ok(d);
                    }
                }
                let d = self.compute(kind, pair)?;
                if self.config.cache {
                    self.cache.borrow_mut().insert((kind, pair.clone()), d);
                }
                Ok(d)
            })
            .collect()
    }
}

/// Angular distance over the features both vectors define.
pub fn angular_distance(a: &[Option<f64>], b: &[Option<f64>]) -> Result<f64> {
    if a.len() != b.len() {
        bail!("Vectors have different lengths ({} vs {})", a.len(), b.len());
    }

    let (mut dot, mut norm_a, mut norm_b, mut shared) = (0.0, 0.0, 0.0, 0usize);
    for (x, y) in a.iter().zip(b) {
        if let (Some(x), Some(y)) = (x, y) {
            dot    += x * y;
            norm_a += x * x;
            norm_b += y * y;
            shared += 1;
        }
    }

    if shared == 0 {
        bail!("No features in common");
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        bail!("Zero vector over the {shared} shared features");
    }

    let cos = (dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0);
    Ok(cos.acos() / std::f64::consts::PI)
}

fn load_vectors(path: &Path) -> Result<HashMap<String, LanguageVector>> {
    let table = Table::read_csv(path)?;
    if table.headers().len() < 2 {
        bail!("Expected a glottocode column followed by feature columns");
    }
    if table.is_empty() {
        bail!("'{}' has no language rows", path.display());
    }

    let mut vectors = HashMap::with_capacity(table.len());
    for (i, row) in table.rows().iter().enumerate() {
        let vector = row[1..]
            .iter()
            .enumerate()
            .map(|(j, cell)| parse_feature(cell).with_context(|| {
                format!("Row {}, column '{}'", i + 1, table.headers()[j + 1])
            }))
            .collect::<Result<LanguageVector>>()?;
        vectors.insert(row[0].clone(), vector);
    }
    Ok(vectors)
}

fn parse_feature(cell: &str) -> Result<Option<f64>> {
    let cell = cell.trim();
    if cell.is_empty() || cell == "--" {
        return Ok(None);
    }
    let v: f64 = cell
        .parse()
        .with_context(|| format!("'{cell}' is not a number"))?;
    Ok(Some(v))
}
