// ============================================================
// Layer 2 — DistanceUseCase
// ============================================================
// Builds the distance table of every requested task:
//
//   Step 1: Load the ISO → glottocode map      (Layer 4 - data)
//   Step 2: Load the distance engine once      (Layer 6 - infra)
//   Step 3: For each task
//             read experiment_csvs/URIEL/{task}.csv
//             build the distance table         (Layer 4 - data)
//             write distances/{task}_distances.csv
//
// The engine is shared by every task, so with caching on a
// language pair that appears in several tables is resolved once.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::data::{
    distances::{DistanceTableBuilder, MissingPairPolicy},
    loader::{distance_table_path, load_glottocode_map, task_table_path},
    table::Table,
};
use crate::domain::language::CodeNormalizer;
use crate::domain::task::Task;
use crate::domain::traits::DistanceEngine;
use crate::infra::distance_engine::{EngineConfig, VectorDistanceEngine};

// ─── Distance Configuration ──────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistanceConfig {
    pub tasks:           Vec<Task>,
    pub experiments_dir: String,
    pub out_dir:         String,
    pub glottocode_map:  String,
    pub vectors_dir:     String,
    pub engine:          EngineConfig,
    pub on_missing:      MissingPairPolicy,
}

impl Default for DistanceConfig {
    fn default() -> Self {
        Self {
            tasks:           Task::ALL.to_vec(),
            experiments_dir: "experiment_csvs/URIEL".to_string(),
            out_dir:         "distances".to_string(),
            glottocode_map:  "uriel_glottocode_map.csv".to_string(),
            vectors_dir:     "uriel_vectors".to_string(),
            engine:          EngineConfig::default(),
            on_missing:      MissingPairPolicy::default(),
        }
    }
}

/// What one task's build produced.
#[derive(Debug, Clone)]
pub struct DistanceOutcome {
    pub task:        Task,
    pub rows:        usize,
    pub null_filled: usize,
    pub path:        PathBuf,
}

// ─── DistanceUseCase ──────────────────────────────────────────────────────────
pub struct DistanceUseCase {
    config: DistanceConfig,
}

impl DistanceUseCase {
    pub fn new(config: DistanceConfig) -> Self {
        Self { config }
    }

    /// Load the map and the vector engine, then build every task.
    pub fn execute(&self) -> Result<Vec<DistanceOutcome>> {
        let cfg = &self.config;

        let glottocodes = load_glottocode_map(&cfg.glottocode_map)?;
        let normalizer  = CodeNormalizer::new(glottocodes);

        tracing::info!("Loading language vectors from '{}'", cfg.vectors_dir);
        let engine = VectorDistanceEngine::load_dir(&cfg.vectors_dir, cfg.engine)?;

        let outcomes = self.run_with(&engine, &normalizer)?;
        tracing::info!("{} distance entries cached", engine.cached_entries());
        Ok(outcomes)
    }

    /// Build every configured task with an already constructed engine.
    pub fn run_with<E: DistanceEngine + ?Sized>(
        &self,
        engine:     &E,
        normalizer: &CodeNormalizer,
    ) -> Result<Vec<DistanceOutcome>> {
        let cfg     = &self.config;
        let builder = DistanceTableBuilder::new(engine, normalizer, cfg.on_missing);

        let mut outcomes = Vec::with_capacity(cfg.tasks.len());
        for &task in &cfg.tasks {
            let input_path = task_table_path(&cfg.experiments_dir, task);
            tracing::info!("{task}: computing distances for '{}'", input_path.display());

            let input = Table::read_csv(&input_path)
                .with_context(|| format!("Cannot load {task} experiments"))?;
            let built = builder.build(&input, task)?;

            let path = distance_table_path(&cfg.out_dir, task);
            built.table.write_csv(&path)?;

            if built.null_filled > 0 {
                tracing::warn!("{task}: {} rows written without distances", built.null_filled);
            }
            tracing::info!("{task}: wrote {} rows to '{}'", built.table.len(), path.display());

            outcomes.push(DistanceOutcome {
                task,
                rows: built.table.len(),
                null_filled: built.null_filled,
                path,
            });
        }
        Ok(outcomes)
    }
}
