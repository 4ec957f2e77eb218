// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything that reads, reshapes and writes tables.
//
// The pipeline flows in this order:
//
//   experiment_csvs/URIEL/{task}.csv
//       │
//       ▼
//   DistanceTableBuilder  → normalise codes, query the engine
//       │
//       ▼
//   distances/{task}_distances.csv
//       │
//       ▼
//   merge_distances       → key-based join into the experiment table
//       │
//       ▼
//   csv_datasets/{task}.csv
//       │
//       ▼
//   assign_relevance      → 0..=10 labels per target language
//       │
//       ▼
//   RankingDataset        → feature matrix + labels + groups
//       │
//       ▼
//   leave_one_group_out   → one fold per language
//
// Reference: csv crate documentation
//            Rust Book §13 (Iterators and Closures)

/// In-memory CSV table with string cells
pub mod table;

/// File layout and glottocode map loading
pub mod loader;

/// Builds per-task distance tables through a DistanceEngine
pub mod distances;

/// Key-based merge of distance columns into experiment tables
pub mod merger;

/// Metric → relevance label conversion
pub mod labeler;

/// Numeric feature/label view used by the evaluator
pub mod dataset;

/// Leave-one-group-out cross-validation folds
pub mod splitter;
