// ============================================================
// Layer 2 — MergeUseCase
// ============================================================
// For each task:
//
//   experiment_csvs/URIEL/{task}.csv  ─┐
//                                      ├─ merge_distances ─▶ csv_datasets/{task}.csv
//   distances/{task}_distances.csv    ─┘
//
// Each task reads its OWN distance table, matched by key.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::data::{
    loader::{distance_table_path, task_table_path},
    merger::merge_distances,
    table::Table,
};
use crate::domain::task::Task;

// ─── Merge Configuration ─────────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeConfig {
    pub tasks:           Vec<Task>,
    pub experiments_dir: String,
    pub distances_dir:   String,
    pub out_dir:         String,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            tasks:           Task::ALL.to_vec(),
            experiments_dir: "experiment_csvs/URIEL".to_string(),
            distances_dir:   "distances".to_string(),
            out_dir:         "csv_datasets".to_string(),
        }
    }
}

pub struct MergeUseCase {
    config: MergeConfig,
}

impl MergeUseCase {
    pub fn new(config: MergeConfig) -> Self {
        Self { config }
    }

    /// Merge every configured task; returns the written paths.
    pub fn execute(&self) -> Result<Vec<PathBuf>> {
        let cfg = &self.config;
        let mut written = Vec::with_capacity(cfg.tasks.len());

        for &task in &cfg.tasks {
            let experiments = Table::read_csv(task_table_path(&cfg.experiments_dir, task))
                .with_context(|| format!("Cannot load {task} experiments"))?;
            let distances = Table::read_csv(distance_table_path(&cfg.distances_dir, task))
                .with_context(|| {
                    format!("Cannot load {task} distances. Run 'distances' first.")
                })?;

            let merged = merge_distances(&experiments, &distances, task)?;

            let path = task_table_path(&cfg.out_dir, task);
            merged.write_csv(&path)?;
            tracing::info!("{task}: merged {} rows into '{}'", merged.len(), path.display());
            written.push(path);
        }

        Ok(written)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::{fs, path::Path};

    fn config(root: &Path) -> MergeConfig {
        MergeConfig {
            tasks:           vec![Task::Mt],
            experiments_dir: root.join("exp").display().to_string(),
            distances_dir:   root.join("dist").display().to_string(),
            out_dir:         root.join("out/nested").display().to_string(),
        }
    }

    #[test]
    fn test_merges_and_creates_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("exp")).unwrap();
        fs::create_dir_all(dir.path().join("dist")).unwrap();
        fs::write(
            dir.path().join("exp/mt.csv"),
            "Source lang,Transfer lang,BLEU\nara,deu,12.5\ndeu,ara,9.0\n",
        )
        .unwrap();
        // distance rows in the opposite order: the join must not care
        fs::write(
            dir.path().join("dist/mt_distances.csv"),
            "Source lang,Transfer lang,GENETIC,SYNTACTIC,FEATURAL,PHONOLOGICAL,INVENTORY,GEOGRAPHIC\n\
             deu,ara,0.2,0.2,0.2,0.2,0.2,0.2\n\
             ara,deu,0.1,0.1,0.1,0.1,0.1,0.1\n",
        )
        .unwrap();

        let written = MergeUseCase::new(config(dir.path())).execute().unwrap();
        let merged  = Table::read_csv(&written[0]).unwrap();

        assert_eq!(merged.headers().len(), 9);
        assert_eq!(merged.column("BLEU").unwrap(), vec!["12.5", "9.0"]);
        assert_eq!(merged.column("GENETIC").unwrap(), vec!["0.1", "0.2"]);
    }

    #[test]
    fn test_missing_distance_table_points_at_distances_command() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("exp")).unwrap();
        fs::write(dir.path().join("exp/mt.csv"), "Source lang,Transfer lang\nara,deu\n").unwrap();

        let err = MergeUseCase::new(config(dir.path())).execute().unwrap_err();
        assert!(err.to_string().contains("Run 'distances' first"));
    }
}
