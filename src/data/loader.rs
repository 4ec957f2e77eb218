// ============================================================
// Layer 4 — File Loaders
// ============================================================
// Knows where each task's files live and loads the lookup
// tables the pipeline needs besides the task tables themselves.
//
// Directory layout (all roots configurable from the CLI):
//
//   experiment_csvs/URIEL/{task}.csv        ← raw experiment tables
//   distances/{task}_distances.csv          ← Distance Table Builder output
//   csv_datasets/{task}.csv                 ← merged datasets
//
// The glottocode map is a CSV with `code` and `glottocode`
// columns. The manual fixes from the domain layer are applied
// on top of it, so they win over whatever the file says.

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};

use crate::data::table::Table;
use crate::domain::language::{CodeMap, MANUAL_CODE_FIXES};
use crate::domain::task::Task;

/// `{dir}/{task}.csv`: raw experiment table or merged dataset.
pub fn task_table_path(dir: impl AsRef<Path>, task: Task) -> PathBuf {
    dir.as_ref().join(format!("{}.csv", task.name()))
}

/// `{dir}/{task}_distances.csv`
pub fn distance_table_path(dir: impl AsRef<Path>, task: Task) -> PathBuf {
    dir.as_ref().join(format!("{}_distances.csv", task.name()))
}

/// Load the ISO 639-3 → glottocode map and apply the manual fixes.
pub fn load_glottocode_map(path: impl AsRef<Path>) -> Result<CodeMap> {
    let path  = path.as_ref();
    let table = Table::read_csv(path)
        .with_context(|| format!("Cannot load glottocode map '{}'", path.display()))?;

    let codes  = table.column("code")?;
    let glotto = table.column("glottocode")?;

    let mut map = CodeMap::new();
    map.extend(
        codes
            .into_iter()
            .zip(glotto)
            .filter(|(c, g)| !c.is_empty() && !g.is_empty())
            .map(|(c, g)| (c.to_string(), g.to_string())),
    );
    if map.is_empty() {
        bail!("Glottocode map '{}' has no code/glottocode pairs", path.display());
    }
    map.extend(
        MANUAL_CODE_FIXES
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string())),
    );

    tracing::info!("Loaded {} ISO → glottocode entries", map.len());
    Ok(map)
}
