// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The two collaborators the pipeline treats as black boxes.
//
//   DistanceEngine → VectorDistanceEngine (infra), fakes in tests
//   Ranker         → LambdaMart (ml)
//
// Code that builds distance tables or runs cross-validation only
// sees these traits, so a different engine (a URIEL+ service, a
// precomputed pair table) or a different ranker drops in without
// touching the orchestration.
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;

use crate::domain::distance::DistanceKind;
use crate::domain::language::LanguagePair;

// ─── DistanceEngine ───────────────────────────────────────────────────────────
/// Anything that can compute linguistic distances between two languages.
pub trait DistanceEngine {
    /// Compute the requested distances for a pair of glottocodes.
    ///
    /// Returns one value per requested kind, in request order. An error
    /// means the pair cannot be resolved (unknown language, no shared
    /// features); callers decide whether that aborts the run.
    fn distances(&self, kinds: &[DistanceKind], pair: &LanguagePair) -> Result<Vec<f64>>;
}

// ─── Ranker ───────────────────────────────────────────────────────────────────
/// A list-wise learning-to-rank model.
pub trait Ranker {
    /// Fit on a row-major feature matrix and relevance labels.
    ///
    /// `group_sizes` partitions the rows into consecutive query lists;
    /// the sizes must sum to the number of rows. Fitting again discards
    /// the previous model.
    fn fit(&mut self, features: &[Vec<f64>], labels: &[f64], group_sizes: &[usize]) -> Result<()>;

    /// Score rows; higher means more relevant. Fails if not fitted.
    fn predict(&self, features: &[Vec<f64>]) -> Result<Vec<f64>>;
}
