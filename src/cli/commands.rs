// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the four subcommands and all their flags. Defaults
// mirror the project's directory layout, so running the stages
// in order from the project root needs no flags at all:
//
//   langrank distances
//   langrank merge
//   langrank rank --task dep
//   langrank significance --baseline-report ... --candidate-report ...

use anyhow::{bail, Context, Result};
use clap::{ArgGroup, Args, Subcommand, ValueEnum};

use crate::application::{
    distance_use_case::DistanceConfig,
    merge_use_case::MergeConfig,
    rank_use_case::RankConfig,
    significance_use_case::{ScoreSource, SignificanceConfig},
};
use crate::data::distances::MissingPairPolicy;
use crate::domain::task::{FeatureMode, Task};
use crate::infra::distance_engine::EngineConfig;
use crate::ml::lambdamart::LambdaMartConfig;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compute the six linguistic distances for every experiment row
    Distances(DistancesArgs),

    /// Splice computed distances into the experiment tables
    Merge(MergeArgs),

    /// Leave-one-language-out LambdaMART evaluation (NDCG@3)
    Rank(RankArgs),

    /// Wilcoxon signed-rank test between two paired score sets
    Significance(SignificanceArgs),
}

// ─── Value enums ─────────────────────────────────────────────────────────────
// Kept on the CLI side so the domain types don't depend on clap.

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskArg {
    Dep,
    El,
    Mt,
    Pos,
    All,
}

impl TaskArg {
    fn tasks(self) -> Vec<Task> {
        match self {
            TaskArg::Dep => vec![Task::Dep],
            TaskArg::El  => vec![Task::El],
            TaskArg::Mt  => vec![Task::Mt],
            TaskArg::Pos => vec![Task::Pos],
            TaskArg::All => Task::ALL.to_vec(),
        }
    }
}

/// Tasks with a ranking experiment
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum RankTaskArg {
    Dep,
    Mt,
}

impl From<RankTaskArg> for Task {
    fn from(t: RankTaskArg) -> Self {
        match t {
            RankTaskArg::Dep => Task::Dep,
            RankTaskArg::Mt  => Task::Mt,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModeArg {
    /// The six distance features only
    Lang,
    /// Distances plus the task's dataset features
    All,
}

impl From<ModeArg> for FeatureMode {
    fn from(m: ModeArg) -> Self {
        match m {
            ModeArg::Lang => FeatureMode::Lang,
            ModeArg::All  => FeatureMode::All,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OnMissingArg {
    /// Stop at the first pair the engine cannot resolve
    Fail,
    /// Leave the row's distances empty and carry on
    Null,
}

impl From<OnMissingArg> for MissingPairPolicy {
    fn from(p: OnMissingArg) -> Self {
        match p {
            OnMissingArg::Fail => MissingPairPolicy::Fail,
            OnMissingArg::Null => MissingPairPolicy::Null,
        }
    }
}

// ─── distances ───────────────────────────────────────────────────────────────
#[derive(Args, Debug)]
pub struct DistancesArgs {
    /// Which task tables to process
    #[arg(long, value_enum, default_value_t = TaskArg::All)]
    pub task: TaskArg,

    /// Directory with the raw {task}.csv experiment tables
    #[arg(long, default_value = "experiment_csvs/URIEL")]
    pub experiments_dir: String,

    /// Where {task}_distances.csv files are written
    #[arg(long, default_value = "distances")]
    pub out_dir: String,

    /// CSV with `code` and `glottocode` columns
    #[arg(long, default_value = "uriel_glottocode_map.csv")]
    pub glottocode_map: String,

    /// Directory with one {kind}.csv language-vector table per distance kind
    #[arg(long, default_value = "uriel_vectors")]
    pub vectors_dir: String,

    /// Recompute every pair instead of caching results for the run
    #[arg(long)]
    pub no_cache: bool,

    /// What to do with a pair the engine cannot resolve
    #[arg(long, value_enum, default_value_t = OnMissingArg::Fail)]
    pub on_missing: OnMissingArg,
}

impl From<DistancesArgs> for DistanceConfig {
    fn from(a: DistancesArgs) -> Self {
        DistanceConfig {
            tasks:           a.task.tasks(),
            experiments_dir: a.experiments_dir,
            out_dir:         a.out_dir,
            glottocode_map:  a.glottocode_map,
            vectors_dir:     a.vectors_dir,
            engine:          EngineConfig { cache: !a.no_cache },
            on_missing:      a.on_missing.into(),
        }
    }
}

// ─── merge ───────────────────────────────────────────────────────────────────
#[derive(Args, Debug)]
pub struct MergeArgs {
    #[arg(long, value_enum, default_value_t = TaskArg::All)]
    pub task: TaskArg,

    #[arg(long, default_value = "experiment_csvs/URIEL")]
    pub experiments_dir: String,

    #[arg(long, default_value = "distances")]
    pub distances_dir: String,

    /// Where merged {task}.csv datasets are written
    #[arg(long, default_value = "csv_datasets")]
    pub out_dir: String,
}

impl From<MergeArgs> for MergeConfig {
    fn from(a: MergeArgs) -> Self {
        MergeConfig {
            tasks:           a.task.tasks(),
            experiments_dir: a.experiments_dir,
            distances_dir:   a.distances_dir,
            out_dir:         a.out_dir,
        }
    }
}

// ─── rank ────────────────────────────────────────────────────────────────────
#[derive(Args, Debug)]
pub struct RankArgs {
    #[arg(long, value_enum)]
    pub task: RankTaskArg,

    /// Feature set fed to the ranker
    #[arg(long, value_enum, default_value_t = ModeArg::All)]
    pub mode: ModeArg,

    /// Directory with the merged {task}.csv datasets
    #[arg(long, default_value = "csv_datasets")]
    pub datasets_dir: String,

    /// Where the report JSON and folds.csv are written
    #[arg(long, default_value = "reports")]
    pub report_dir: String,

    /// Label appended to the report name, e.g. `urielplus`
    #[arg(long)]
    pub tag: Option<String>,
}

impl From<RankArgs> for RankConfig {
    fn from(a: RankArgs) -> Self {
        let task: Task = a.task.into();
        RankConfig {
            task,
            mode:         a.mode.into(),
            datasets_dir: a.datasets_dir,
            report_dir:   a.report_dir,
            tag:          a.tag,
            ranker:       LambdaMartConfig::for_task(task),
        }
    }
}

// ─── significance ────────────────────────────────────────────────────────────
#[derive(Args, Debug)]
#[command(
    group(ArgGroup::new("baseline_src").required(true).args(["baseline", "baseline_report"])),
    group(ArgGroup::new("candidate_src").required(true).args(["candidate", "candidate_report"]))
)]
pub struct SignificanceArgs {
    /// Comma-separated baseline scores, e.g. 0.81,0.52,0.66
    #[arg(long)]
    pub baseline: Option<String>,

    /// Comma-separated candidate scores, paired with --baseline
    #[arg(long)]
    pub candidate: Option<String>,

    /// Report JSON produced by `rank`
    #[arg(long)]
    pub baseline_report: Option<String>,

    #[arg(long)]
    pub candidate_report: Option<String>,
}

impl TryFrom<SignificanceArgs> for SignificanceConfig {
    type Error = anyhow::Error;

    fn try_from(a: SignificanceArgs) -> Result<Self> {
        Ok(SignificanceConfig {
            baseline:  score_source("baseline", a.baseline, a.baseline_report)?,
            candidate: score_source("candidate", a.candidate, a.candidate_report)?,
        })
    }
}

fn score_source(side: &str, inline: Option<String>, report: Option<String>) -> Result<ScoreSource> {
    match (inline, report) {
        (Some(list), None) => Ok(ScoreSource::Inline(
            parse_scores(&list).with_context(|| format!("Invalid --{side} scores"))?,
        )),
        (None, Some(path)) => Ok(ScoreSource::Report(path)),
        _ => bail!("Give either --{side} or --{side}-report"),
    }
}

/// `"0.81, 0.5,0.66"` → `[0.81, 0.5, 0.66]`
pub fn parse_scores(list: &str) -> Result<Vec<f64>> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<f64>().with_context(|| format!("'{s}' is not a number")))
        .collect()
}
