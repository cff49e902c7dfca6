mod cache;
mod classify;
mod combine;
mod error;
mod input;
mod markers;
mod matcher;
mod model;
mod prune;
mod report;
mod stats;

use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use crate::cache::ResultCache;
use crate::classify::ScoreParams;
use crate::combine::{CombineParams, combine};
use crate::input::{Reference, align, load_dataset, load_reference};
use crate::markers::MarkerMethod;
use crate::matcher::cross_match;
use crate::prune::{PruneMode, PruneOutcome, prune};
use crate::report::json::{write_match_json, write_summary_json};
use crate::report::table::{write_cell_table, write_match_table};
use crate::report::build_summary;

#[derive(Debug, Parser)]
#[command(name = "cellanno", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Annotate a test dataset against one or more labeled references.
    Run(RunArgs),
    /// Cross-classify two references to diagnose label correspondence.
    Match(MatchArgs),
}

#[derive(Debug, Args)]
struct RunArgs {
    /// Test expression matrix (genes x cells TSV, optionally gzipped).
    #[arg(long)]
    test: PathBuf,
    /// Identifier for the test dataset; defaults to the file stem.
    #[arg(long)]
    test_id: Option<String>,
    /// Labeled reference as NAME=EXPR_PATH:LABELS_PATH; repeatable.
    #[arg(long = "reference", required = true)]
    references: Vec<String>,
    /// Output directory.
    #[arg(long)]
    out: PathBuf,
    /// Label map (raw<TAB>term TSV) applied to every reference before
    /// classification.
    #[arg(long)]
    harmonize: Option<PathBuf>,
    /// Favor markers recurring across references (requires --harmonize or
    /// references that already share a vocabulary).
    #[arg(long)]
    consistent_markers: bool,
    #[command(flatten)]
    scoring: ScoringArgs,
    /// Low-confidence pruning policy.
    #[arg(long, value_enum, default_value_t = PruneModeArg::Outliers)]
    prune_mode: PruneModeArg,
    /// MAD multiple for outlier pruning.
    #[arg(long, default_value_t = 3.0)]
    nmads: f32,
    /// Minimum label group size for outlier pruning; smaller groups are
    /// skipped and reported.
    #[arg(long, default_value_t = 20)]
    min_group: usize,
    /// Threshold for the min-delta and min-gap prune modes.
    #[arg(long, default_value_t = 0.1)]
    prune_threshold: f32,
}

#[derive(Debug, Args)]
struct MatchArgs {
    /// Exactly two references as NAME=EXPR_PATH:LABELS_PATH.
    #[arg(long = "reference", required = true)]
    references: Vec<String>,
    /// Output directory.
    #[arg(long)]
    out: PathBuf,
    #[command(flatten)]
    scoring: ScoringArgs,
}

#[derive(Debug, Args)]
struct ScoringArgs {
    /// Quantile of per-sample correlations used as the label score.
    #[arg(long, default_value_t = 0.8)]
    quantile: f32,
    /// Refine assignments by iterative fine-tuning on shrinking marker sets.
    #[arg(long)]
    fine_tune: bool,
    /// Margin below the per-cell maximum that keeps a label in fine-tuning.
    #[arg(long, default_value_t = 0.05)]
    tune_thresh: f32,
    /// Marker genes kept per ordered label pair.
    #[arg(long, default_value_t = 10)]
    markers_per_pair: usize,
}

impl ScoringArgs {
    fn to_params(&self) -> ScoreParams {
        ScoreParams {
            quantile: self.quantile,
            fine_tune: self.fine_tune,
            tune_thresh: self.tune_thresh,
            markers_per_pair: self.markers_per_pair,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum PruneModeArg {
    Outliers,
    MinDelta,
    MinGap,
    None,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Run(args) => run(args),
        Command::Match(args) => run_match(args),
    }
}

fn run(args: RunArgs) -> anyhow::Result<()> {
    let test_id = match &args.test_id {
        Some(id) => id.clone(),
        None => dataset_id_from_path(&args.test),
    };
    let test = load_dataset(&test_id, &args.test)?;

    let mut references = Vec::with_capacity(args.references.len());
    for spec in &args.references {
        let (name, expr_path, labels_path) = parse_reference_spec(spec)?;
        references.push(load_reference(
            &name,
            &expr_path,
            &labels_path,
            args.harmonize.as_deref(),
        )?);
    }

    let (test, references) = align(&test, &references)?;
    let n_shared_genes = test.expr.n_genes();

    let params = CombineParams {
        score: args.scoring.to_params(),
        method: if args.consistent_markers {
            MarkerMethod::Consistent
        } else {
            MarkerMethod::Classic
        },
    };

    let mut result_cache = ResultCache::new();
    let (table, ref_results) =
        combine(&test, &references, &params, Some(&mut result_cache))?;

    let prune_mode = match args.prune_mode {
        PruneModeArg::Outliers => Some(PruneMode::Outliers {
            nmads: args.nmads,
            min_group: args.min_group,
        }),
        PruneModeArg::MinDelta => Some(PruneMode::MinDelta {
            threshold: args.prune_threshold,
        }),
        PruneModeArg::MinGap => Some(PruneMode::MinGap {
            threshold: args.prune_threshold,
        }),
        PruneModeArg::None => None,
    };

    let prune_outcomes: Option<Vec<PruneOutcome>> = match prune_mode {
        Some(mode) => {
            let mut outcomes = Vec::with_capacity(ref_results.len());
            for result in &ref_results {
                outcomes.push(prune(result, &mode)?);
            }
            Some(outcomes)
        }
        None => None,
    };

    write_cell_table(
        &args.out.join("cells.tsv"),
        &table,
        prune_outcomes.as_deref(),
    )?;

    let ref_label_counts: Vec<usize> = references.iter().map(|r| r.vocab.len()).collect();
    let summary = build_summary(
        &test.id,
        n_shared_genes,
        &table,
        &ref_label_counts,
        prune_outcomes
            .as_deref()
            .map(|o| (prune_mode_name(args.prune_mode), o)),
    );
    write_summary_json(&args.out.join("summary.json"), &summary)?;

    Ok(())
}

fn run_match(args: MatchArgs) -> anyhow::Result<()> {
    if args.references.len() != 2 {
        bail!(
            "match requires exactly 2 --reference arguments, got {}",
            args.references.len()
        );
    }
    let mut references: Vec<Reference> = Vec::with_capacity(2);
    for spec in &args.references {
        let (name, expr_path, labels_path) = parse_reference_spec(spec)?;
        references.push(load_reference(&name, &expr_path, &labels_path, None)?);
    }

    let params = args.scoring.to_params();
    let table = cross_match(&references[0], &references[1], &params)?;

    let stem = format!("match_{}_{}", table.reference_a, table.reference_b);
    write_match_table(&args.out.join(format!("{stem}.tsv")), &table)?;
    write_match_json(&args.out.join(format!("{stem}.json")), &table)?;

    Ok(())
}

fn prune_mode_name(mode: PruneModeArg) -> &'static str {
    match mode {
        PruneModeArg::Outliers => "outliers",
        PruneModeArg::MinDelta => "min-delta",
        PruneModeArg::MinGap => "min-gap",
        PruneModeArg::None => "none",
    }
}

fn dataset_id_from_path(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "test".to_string())
}

/// Parses NAME=EXPR_PATH:LABELS_PATH.
fn parse_reference_spec(spec: &str) -> anyhow::Result<(String, PathBuf, PathBuf)> {
    let (name, paths) = spec
        .split_once('=')
        .with_context(|| format!("invalid --reference '{}': expected NAME=EXPR:LABELS", spec))?;
    let (expr, labels) = paths
        .split_once(':')
        .with_context(|| format!("invalid --reference '{}': expected NAME=EXPR:LABELS", spec))?;
    if name.is_empty() || expr.is_empty() || labels.is_empty() {
        bail!("invalid --reference '{}': empty component", spec);
    }
    Ok((name.to_string(), PathBuf::from(expr), PathBuf::from(labels)))
}
