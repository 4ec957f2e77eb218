// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust types and traits describing what the system works
// with: language pairs, distance metrics, task presets and the
// two collaborators (distance engine, ranker) everything else
// is written against.
//
// Rules for this layer:
//   - NO file I/O
//   - NO clap types
//   - NO ranker internals
//
// Reference: Rust Book §5 (Structs), §6 (Enums), §10 (Traits)

/// Language pairs and the two-stage code normalisation
pub mod language;

/// The six linguistic distance kinds and their value vector
pub mod distance;

/// Per-task presets: column names, tie-breaking, group layout, features
pub mod task;

/// Core abstractions (traits) that other layers implement
pub mod traits;
