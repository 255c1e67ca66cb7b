//! Command-line parsing for the credit-application scoring pipeline.
//!
//! Argument parsing and command dispatch stay separate from the cleaning and
//! modeling code; every subcommand maps to one pipeline stage (or the whole
//! chain).

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use crate::domain::{Lender, TrainMethod};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "credit",
    version,
    about = "Credit-application cleaning, feature and scoring pipeline"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands, one per pipeline stage.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Parse the raw export into typed application rows.
    Prepare(StageArgs),
    /// Drop duplicates and impute missing values.
    FillMissing(StageArgs),
    /// Remove outliers and fix seniority/expense anomalies.
    FixAnomalies(StageArgs),
    /// Derive the numeric feature frame (codes, one-hots, targets).
    DeriveFeatures(StageArgs),
    /// Fit the shared scaler and write per-lender training frames.
    LenderPrepare(LenderArgs),
    /// Stratified train/test split of the per-lender frames.
    Split(LenderArgs),
    /// Train per-lender classifiers on the split frames.
    Train(TrainArgs),
    /// Evaluate trained models on the held-out partitions.
    Evaluate(TrainArgs),
    /// Score a raw export with previously trained models.
    Predict(PredictArgs),
    /// Run the whole chain in memory: prepare through evaluate.
    Run(TrainArgs),
}

/// Options shared by every stage.
#[derive(Debug, Parser, Clone)]
pub struct StageArgs {
    /// Raw CSV exported from the application system.
    #[arg(short, long, default_value = "data/applications.csv")]
    pub input: PathBuf,

    /// Directory holding the per-stage CSV outputs.
    #[arg(long, default_value = "data")]
    pub data_dir: PathBuf,

    /// Directory holding model, scaler and metrics artifacts.
    #[arg(long, default_value = "models")]
    pub models_dir: PathBuf,

    /// Pipeline parameters file.
    #[arg(long, default_value = "params.yaml")]
    pub params: PathBuf,

    /// Reference date for ages and seniority (defaults to today).
    #[arg(long)]
    pub asof: Option<NaiveDate>,
}

/// Stage options plus a lender filter.
#[derive(Debug, Parser, Clone)]
pub struct LenderArgs {
    #[command(flatten)]
    pub stage: StageArgs,

    /// Restrict to one lender (default: all five).
    #[arg(short, long, value_enum)]
    pub lender: Option<Lender>,
}

/// Training/evaluation options.
#[derive(Debug, Parser, Clone)]
pub struct TrainArgs {
    #[command(flatten)]
    pub stage: StageArgs,

    /// Restrict to one lender (default: all five).
    #[arg(short, long, value_enum)]
    pub lender: Option<Lender>,

    /// Training method (overrides the params file).
    #[arg(short, long, value_enum)]
    pub method: Option<TrainMethod>,
}

/// Scoring options.
#[derive(Debug, Parser, Clone)]
pub struct PredictArgs {
    #[command(flatten)]
    pub stage: StageArgs,

    /// Restrict to one lender (default: all five).
    #[arg(short, long, value_enum)]
    pub lender: Option<Lender>,

    /// Training method of the models to load (overrides the params file).
    #[arg(short, long, value_enum)]
    pub method: Option<TrainMethod>,

    /// Where to write the predictions CSV.
    #[arg(short, long, default_value = "data/predictions.csv")]
    pub output: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_stage_defaults() {
        let cli = Cli::parse_from(["credit", "prepare"]);
        let Command::Prepare(args) = cli.command else {
            panic!("expected prepare");
        };
        assert_eq!(args.input, PathBuf::from("data/applications.csv"));
        assert_eq!(args.data_dir, PathBuf::from("data"));
        assert!(args.asof.is_none());
    }

    #[test]
    fn parses_train_overrides() {
        let cli = Cli::parse_from(["credit", "train", "-l", "b", "-m", "logreg"]);
        let Command::Train(args) = cli.command else {
            panic!("expected train");
        };
        assert_eq!(args.lender, Some(Lender::B));
        assert_eq!(args.method, Some(TrainMethod::Logreg));
    }

    #[test]
    fn parses_asof_date() {
        let cli = Cli::parse_from(["credit", "run", "--asof", "2024-02-01"]);
        let Command::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(
            args.stage.asof,
            NaiveDate::from_ymd_opt(2024, 2, 1)
        );
    }
}
