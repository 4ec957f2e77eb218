// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Parses the command line with `clap` and hands every command
// to its use case in Layer 2. User-facing result lines (fold
// scores, averages, test statistics) are printed here.
//
// Four commands, one per pipeline stage:
//   1. `distances`    — experiment tables → distance tables
//   2. `merge`        — distance tables → merged datasets
//   3. `rank`         — LambdaMART, leave one language out
//   4. `significance` — Wilcoxon test between two runs

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, DistancesArgs, MergeArgs, RankArgs, SignificanceArgs};

#[derive(Parser, Debug)]
#[command(
    name = "langrank",
    version,
    about = "Rank transfer languages with linguistic distances and LambdaMART."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Distances(args)    => run_distances(args),
            Commands::Merge(args)        => run_merge(args),
            Commands::Rank(args)         => run_rank(args),
            Commands::Significance(args) => run_significance(args),
        }
    }
}

fn run_distances(args: DistancesArgs) -> Result<()> {
    use crate::application::distance_use_case::DistanceUseCase;

    let outcomes = DistanceUseCase::new(args.into()).execute()?;
    for o in &outcomes {
        tracing::info!(
            "{}: {} rows ({} without distances) → {}",
            o.task,
            o.rows,
            o.null_filled,
            o.path.display()
        );
    }
    Ok(())
}

fn run_merge(args: MergeArgs) -> Result<()> {
    use crate::application::merge_use_case::MergeUseCase;

    let written = MergeUseCase::new(args.into()).execute()?;
    tracing::info!("Merged {} task table(s)", written.len());
    Ok(())
}

fn run_rank(args: RankArgs) -> Result<()> {
    use crate::application::rank_use_case::RankUseCase;

    tracing::info!("Ranking {:?} with {:?} features", args.task, args.mode);
    let report = RankUseCase::new(args.into()).execute()?;

    println!("{}", report.rounded_scores_line());
    println!("{}", report.average_line());
    Ok(())
}

fn run_significance(args: SignificanceArgs) -> Result<()> {
    use crate::application::significance_use_case::SignificanceUseCase;

    let result = SignificanceUseCase::new(args.try_into()?).execute()?;

    println!("Statistic: {}", result.statistic);
    println!("p-value: {}", result.p_value);
    Ok(())
}
