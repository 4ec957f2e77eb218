// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Everything that touches files outside the data tables
// themselves:
//
//   distance_engine.rs — the concrete DistanceEngine: per-kind
//                        language vectors loaded from CSV,
//                        angular distance, optional in-memory
//                        cache
//
//   report_store.rs    — EvaluationReport and RankConfig as
//                        JSON, read back by the significance
//                        command
//
//   metrics.rs         — per-fold CSV log appended by every
//                        ranking run

/// Vector-based distance engine
pub mod distance_engine;

/// Evaluation report persistence
pub mod report_store;

/// Fold metrics CSV logger
pub mod metrics;
