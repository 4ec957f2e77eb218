// ============================================================
// Layer 5 — Ranking & Statistics Layer
// ============================================================
// All the numerical work lives here:
//
//   ndcg.rs         — the shared NDCG@k metric (linear gains,
//                     tie-averaged), used for every task
//
//   lambdamart.rs   — gradient-boosted trees with the
//                     lambdarank objective; implements the
//                     domain `Ranker` trait
//
//   evaluator.rs    — leave-one-language-out cross-validation
//                     producing one NDCG@3 per held-out language
//
//   significance.rs — Wilcoxon signed-rank test over two paired
//                     per-fold score sets
//
// Nothing in this layer touches the filesystem.

/// Top-k normalised discounted cumulative gain
pub mod ndcg;

/// LambdaMART ranker
pub mod lambdamart;

/// Leave-one-group-out evaluation loop and its report
pub mod evaluator;

/// Paired significance test
pub mod significance;
