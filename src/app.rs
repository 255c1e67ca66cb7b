//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that
//! parses CLI arguments, dispatches to the pipeline stages and prints the
//! stage summaries.

use clap::Parser;

use crate::cli::{Cli, Command, LenderArgs, StageArgs, TrainArgs};
use crate::domain::Lender;
use crate::error::AppError;
use crate::report::{Evaluation, format_report};

pub mod pipeline;

use pipeline::StageReport;

/// Entry point for the `credit` binary.
pub fn run() -> Result<(), AppError> {
    let cli = Cli::parse();

    match cli.command {
        Command::Prepare(args) => handle_stage("prepare", &args, pipeline::run_prepare),
        Command::FillMissing(args) => handle_stage("fill-missing", &args, pipeline::run_fill_missing),
        Command::FixAnomalies(args) => {
            handle_stage("fix-anomalies", &args, pipeline::run_fix_anomalies)
        }
        Command::DeriveFeatures(args) => {
            handle_stage("derive-features", &args, pipeline::run_derive_features)
        }
        Command::LenderPrepare(args) => handle_lender_stage("lender-prepare", &args, pipeline::run_lender_prepare),
        Command::Split(args) => handle_lender_stage("split", &args, pipeline::run_split),
        Command::Train(args) => handle_train(&args),
        Command::Evaluate(args) => handle_evaluate(&args),
        Command::Predict(args) => {
            let out = pipeline::run_predict(&args)?;
            print_stage_report("prepare", &out.prepare);
            println!(
                "Scored {} applications with `{}` models -> {}",
                out.rows_scored,
                out.method.display_name(),
                out.output.display()
            );
            Ok(())
        }
        Command::Run(args) => handle_run(&args),
    }
}

fn handle_stage(
    name: &str,
    args: &StageArgs,
    stage: impl Fn(&StageArgs) -> Result<StageReport, AppError>,
) -> Result<(), AppError> {
    let report = stage(args)?;
    print_stage_report(name, &report);
    Ok(())
}

fn handle_lender_stage(
    name: &str,
    args: &LenderArgs,
    stage: impl Fn(&LenderArgs) -> Result<Vec<(Lender, StageReport)>, AppError>,
) -> Result<(), AppError> {
    for (lender, report) in stage(args)? {
        print_stage_report(&format!("{name} [{}]", lender.display_name()), &report);
    }
    Ok(())
}

fn handle_train(args: &TrainArgs) -> Result<(), AppError> {
    for (lender, method, rows) in pipeline::run_train(args)? {
        println!(
            "Trained `{}` model for lender {} on {rows} rows",
            method.display_name(),
            lender.display_name()
        );
    }
    Ok(())
}

fn handle_evaluate(args: &TrainArgs) -> Result<(), AppError> {
    for (lender, eval) in pipeline::run_evaluate(args)? {
        print_evaluation(lender, &eval);
    }
    Ok(())
}

fn handle_run(args: &TrainArgs) -> Result<(), AppError> {
    let out = pipeline::run_all(args)?;
    for (name, report) in &out.stage_reports {
        print_stage_report(name, report);
    }
    println!();
    println!("Training method: {}", out.method.display_name());
    for (lender, eval) in &out.evaluations {
        print_evaluation(*lender, eval);
    }
    Ok(())
}

fn print_stage_report(name: &str, report: &StageReport) {
    println!(
        "[{name}] {} rows in, {} rows out ({} dropped)",
        report.rows_in, report.rows_out, report.rows_dropped
    );
    for note in &report.notes {
        println!("  {note}");
    }
    for err in &report.row_errors {
        eprintln!("  row {}: {}", err.line, err.message);
    }
}

fn print_evaluation(lender: Lender, eval: &Evaluation) {
    println!();
    println!(
        "Lender {} ({} test rows, micro F1 {:.3})",
        lender.display_name(),
        eval.n_rows,
        eval.micro_f1
    );
    println!("{}", format_report(eval));
}
