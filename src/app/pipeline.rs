//! End-to-end pipeline orchestration.
//!
//! Each `run_*` function implements one CLI stage: read the previous stage's
//! output, apply the transform, persist the result. `run_all` and
//! `run_predict` chain the same transforms in memory instead of going through
//! the stage files.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::cli::{LenderArgs, PredictArgs, StageArgs, TrainArgs};
use crate::config::Params;
use crate::domain::{Application, FeatureFrame, Lender, TrainMethod};
use crate::error::AppError;
use crate::io::artifacts::{read_json, write_json};
use crate::io::dataset::{read_applications, read_frame, write_applications, write_frame};
use crate::io::ingest::{RowError, read_raw_csv};
use crate::math::scaler::StandardScaler;
use crate::models::{ModelFile, train_model};
use crate::report::{Evaluation, MetricsFile, evaluate};
use crate::stages::{
    derive_features, fill_missing, fit_scaler, fix_anomalies, fix_anomalies_for_scoring,
    impute_missing, prepare_applications, prepare_for_lender, prepare_for_prediction,
    stratified_split,
};

const TOOL_NAME: &str = "credit-pipeline";

/// Resolved file layout of a pipeline run.
pub struct Paths {
    pub data_dir: PathBuf,
    pub models_dir: PathBuf,
}

impl Paths {
    pub fn from_args(args: &StageArgs) -> Self {
        Self {
            data_dir: args.data_dir.clone(),
            models_dir: args.models_dir.clone(),
        }
    }

    pub fn prepared(&self) -> PathBuf {
        self.data_dir.join("stage_prepare").join("applications.csv")
    }

    pub fn filled(&self) -> PathBuf {
        self.data_dir.join("stage_fill_missing").join("applications.csv")
    }

    pub fn fixed(&self) -> PathBuf {
        self.data_dir.join("stage_fix_anomalies").join("applications.csv")
    }

    pub fn features(&self) -> PathBuf {
        self.data_dir.join("stage_features").join("features.csv")
    }

    pub fn lender_frame(&self, lender: Lender) -> PathBuf {
        self.data_dir
            .join("stage_lender")
            .join(format!("{}_frame.csv", lender.display_name().to_lowercase()))
    }

    pub fn train_frame(&self, lender: Lender) -> PathBuf {
        self.data_dir
            .join("stage_split")
            .join(format!("{}_train.csv", lender.display_name().to_lowercase()))
    }

    pub fn test_frame(&self, lender: Lender) -> PathBuf {
        self.data_dir
            .join("stage_split")
            .join(format!("{}_test.csv", lender.display_name().to_lowercase()))
    }

    pub fn scaler(&self) -> PathBuf {
        self.models_dir.join("scaler.json")
    }

    pub fn model(&self, lender: Lender, method: TrainMethod) -> PathBuf {
        self.models_dir.join(format!(
            "{}_{}.json",
            lender.display_name().to_lowercase(),
            method.display_name()
        ))
    }

    pub fn metrics(&self, lender: Lender, method: TrainMethod) -> PathBuf {
        self.models_dir.join(format!(
            "{}_{}_metrics.json",
            lender.display_name().to_lowercase(),
            method.display_name()
        ))
    }
}

/// Reference date for ages and seniority.
pub fn resolve_asof(args: &StageArgs) -> NaiveDate {
    args.asof.unwrap_or_else(|| chrono::Local::now().date_naive())
}

pub fn lenders(filter: Option<Lender>) -> Vec<Lender> {
    match filter {
        Some(l) => vec![l],
        None => Lender::ALL.to_vec(),
    }
}

fn resolve_method(override_method: Option<TrainMethod>, params: &Params) -> TrainMethod {
    override_method.unwrap_or(params.general.train_method)
}

fn ensure_parent(path: &Path) -> Result<(), AppError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::io(format!(
                    "Failed to create directory '{}': {e}",
                    parent.display()
                ))
            })?;
        }
    }
    Ok(())
}

fn write_stage_applications(path: &Path, apps: &[Application]) -> Result<(), AppError> {
    ensure_parent(path)?;
    write_applications(path, apps)
}

fn write_stage_frame(path: &Path, frame: &FeatureFrame) -> Result<(), AppError> {
    ensure_parent(path)?;
    write_frame(path, frame)
}

/// Summary counts of one cleaning stage, for terminal output.
#[derive(Debug, Clone, Default)]
pub struct StageReport {
    pub rows_in: usize,
    pub rows_out: usize,
    pub rows_dropped: usize,
    pub row_errors: Vec<RowError>,
    pub notes: Vec<String>,
}

/// Stage 1: raw CSV to typed applications.
pub fn run_prepare(args: &StageArgs) -> Result<StageReport, AppError> {
    let paths = Paths::from_args(args);
    let (apps, _, report) = prepare_in_memory(&args.input)?;
    write_stage_applications(&paths.prepared(), &apps)?;
    Ok(report)
}

fn prepare_in_memory(
    input: &Path,
) -> Result<(Vec<Application>, Vec<usize>, StageReport), AppError> {
    let ingest = read_raw_csv(input)?;
    let out = prepare_applications(&ingest.records);
    if out.apps.is_empty() {
        return Err(AppError::new(3, "No usable application rows in the input.".to_string()));
    }

    let mut row_errors = ingest.row_errors;
    row_errors.extend(out.row_errors);
    let report = StageReport {
        rows_in: ingest.rows_read,
        rows_out: out.apps.len(),
        rows_dropped: ingest.rows_read - out.apps.len(),
        row_errors,
        notes: vec![format!("{} blank rows skipped", out.rows_blank)],
    };
    Ok((out.apps, out.source_lines, report))
}

/// Stage 2: deduplicate and impute.
pub fn run_fill_missing(args: &StageArgs) -> Result<StageReport, AppError> {
    let paths = Paths::from_args(args);
    let apps = read_applications(&paths.prepared())?;
    let (filled, report) = fill_missing_in_memory(&apps);
    write_stage_applications(&paths.filled(), &filled)?;
    Ok(report)
}

fn fill_missing_in_memory(apps: &[Application]) -> (Vec<Application>, StageReport) {
    let out = fill_missing(apps);
    let report = StageReport {
        rows_in: apps.len(),
        rows_out: out.apps.len(),
        rows_dropped: out.duplicates_removed,
        row_errors: Vec::new(),
        notes: vec![format!("{} duplicate rows removed", out.duplicates_removed)],
    };
    (out.apps, report)
}

/// Stage 3: outliers, seniority, expense floor.
pub fn run_fix_anomalies(args: &StageArgs) -> Result<StageReport, AppError> {
    let paths = Paths::from_args(args);
    let asof = resolve_asof(args);
    let apps = read_applications(&paths.filled())?;
    let (fixed, report) = fix_anomalies_in_memory(&apps, asof)?;
    write_stage_applications(&paths.fixed(), &fixed)?;
    Ok(report)
}

fn fix_anomalies_in_memory(
    apps: &[Application],
    asof: NaiveDate,
) -> Result<(Vec<Application>, StageReport), AppError> {
    let out = fix_anomalies(apps, asof);
    if out.apps.is_empty() {
        return Err(AppError::new(3, "No rows survived anomaly screening.".to_string()));
    }
    let report = StageReport {
        rows_in: apps.len(),
        rows_out: out.apps.len(),
        rows_dropped: apps.len() - out.apps.len(),
        row_errors: out.row_errors,
        notes: vec![
            format!("{} outlier rows removed", out.outliers_removed),
            format!("{} seniority values corrected", out.seniority_fixed),
            format!("{} expenses raised to the living-wage floor", out.expense_fixed),
        ],
    };
    Ok((out.apps, report))
}

/// Stage 4: feature derivation.
pub fn run_derive_features(args: &StageArgs) -> Result<StageReport, AppError> {
    let paths = Paths::from_args(args);
    let asof = resolve_asof(args);
    let apps = read_applications(&paths.fixed())?;
    let out = derive_features(&apps, asof)?;
    write_stage_frame(&paths.features(), &out.frame)?;
    Ok(StageReport {
        rows_in: apps.len(),
        rows_out: out.frame.n_rows(),
        rows_dropped: 0,
        row_errors: out.row_errors,
        notes: vec![format!("{} feature columns", out.frame.n_cols())],
    })
}

/// Stage 5: shared scaler plus per-lender frames.
pub fn run_lender_prepare(args: &LenderArgs) -> Result<Vec<(Lender, StageReport)>, AppError> {
    let paths = Paths::from_args(&args.stage);
    let frame = read_frame(&paths.features())?;

    let scaler = fit_scaler(&frame)?;
    write_json(&paths.scaler(), &scaler, "scaler")?;

    let mut reports = Vec::new();
    for lender in lenders(args.lender) {
        let out = prepare_for_lender(&frame, lender, &scaler)?;
        if out.frame.n_rows() == 0 {
            return Err(AppError::new(
                3,
                format!("No labeled rows for lender {}.", lender.display_name()),
            ));
        }
        write_stage_frame(&paths.lender_frame(lender), &out.frame)?;
        reports.push((
            lender,
            StageReport {
                rows_in: frame.n_rows(),
                rows_out: out.frame.n_rows(),
                rows_dropped: out.rows_dropped,
                row_errors: Vec::new(),
                notes: vec![format!("{} columns after screening", out.frame.n_cols())],
            },
        ));
    }
    Ok(reports)
}

/// Stage 6: stratified split.
pub fn run_split(args: &LenderArgs) -> Result<Vec<(Lender, StageReport)>, AppError> {
    let paths = Paths::from_args(&args.stage);
    let params = Params::load(&args.stage.params)?;

    let mut reports = Vec::new();
    for lender in lenders(args.lender) {
        let frame = read_frame(&paths.lender_frame(lender))?;
        let split = stratified_split(&frame, "y", params.split.test_ratio, params.split.seed)?;
        write_stage_frame(&paths.train_frame(lender), &split.train)?;
        write_stage_frame(&paths.test_frame(lender), &split.test)?;
        reports.push((
            lender,
            StageReport {
                rows_in: frame.n_rows(),
                rows_out: split.train.n_rows(),
                rows_dropped: split.test.n_rows(),
                row_errors: Vec::new(),
                notes: vec![format!(
                    "{} train / {} test rows",
                    split.train.n_rows(),
                    split.test.n_rows()
                )],
            },
        ));
    }
    Ok(reports)
}

/// Stage 7: fit and persist per-lender models.
pub fn run_train(args: &TrainArgs) -> Result<Vec<(Lender, TrainMethod, usize)>, AppError> {
    let paths = Paths::from_args(&args.stage);
    let params = Params::load(&args.stage.params)?;
    let method = resolve_method(args.method, &params);

    let mut trained = Vec::new();
    for lender in lenders(args.lender) {
        let train = read_frame(&paths.train_frame(lender))?;
        let (model, feature_names) = train_model(&train, method, &params)?;
        let file = ModelFile {
            tool: TOOL_NAME.to_string(),
            lender,
            method,
            feature_names,
            model,
        };
        write_json(&paths.model(lender, method), &file, "model")?;
        trained.push((lender, method, train.n_rows()));
    }
    Ok(trained)
}

/// Stage 8: score the held-out partitions.
pub fn run_evaluate(args: &TrainArgs) -> Result<Vec<(Lender, Evaluation)>, AppError> {
    let paths = Paths::from_args(&args.stage);
    let params = Params::load(&args.stage.params)?;
    let method = resolve_method(args.method, &params);

    let mut results = Vec::new();
    for lender in lenders(args.lender) {
        let test = read_frame(&paths.test_frame(lender))?;
        let file: ModelFile = read_json(&paths.model(lender, method), "model")?;
        let eval = evaluate_model(&test, &file)?;
        write_json(
            &paths.metrics(lender, method),
            &MetricsFile {
                tool: TOOL_NAME.to_string(),
                lender,
                method,
                evaluation: eval.clone(),
            },
            "metrics",
        )?;
        results.push((lender, eval));
    }
    Ok(results)
}

fn evaluate_model(test: &FeatureFrame, file: &ModelFile) -> Result<Evaluation, AppError> {
    let (x, y) = test.split_xy("y")?;
    // Realign to the training schema instead of trusting column order.
    let x = x.select(&file.feature_names)?;
    let predictions = file.model.predict(&x);
    evaluate(&y, &predictions)
}

/// Whole-chain run: prepare through evaluate, all stage files written.
pub fn run_all(args: &TrainArgs) -> Result<RunOutput, AppError> {
    let paths = Paths::from_args(&args.stage);
    let asof = resolve_asof(&args.stage);
    let params = Params::load(&args.stage.params)?;
    let method = resolve_method(args.method, &params);

    let (apps, _, prepare_report) = prepare_in_memory(&args.stage.input)?;
    write_stage_applications(&paths.prepared(), &apps)?;

    let (filled, fill_report) = fill_missing_in_memory(&apps);
    write_stage_applications(&paths.filled(), &filled)?;

    let (fixed, fix_report) = fix_anomalies_in_memory(&filled, asof)?;
    write_stage_applications(&paths.fixed(), &fixed)?;

    let features = derive_features(&fixed, asof)?;
    write_stage_frame(&paths.features(), &features.frame)?;

    let scaler = fit_scaler(&features.frame)?;
    write_json(&paths.scaler(), &scaler, "scaler")?;

    let mut evaluations = Vec::new();
    for lender in lenders(args.lender) {
        let prepared = prepare_for_lender(&features.frame, lender, &scaler)?;
        write_stage_frame(&paths.lender_frame(lender), &prepared.frame)?;

        let split = stratified_split(
            &prepared.frame,
            "y",
            params.split.test_ratio,
            params.split.seed,
        )?;
        write_stage_frame(&paths.train_frame(lender), &split.train)?;
        write_stage_frame(&paths.test_frame(lender), &split.test)?;

        let (model, feature_names) = train_model(&split.train, method, &params)?;
        let file = ModelFile {
            tool: TOOL_NAME.to_string(),
            lender,
            method,
            feature_names,
            model,
        };
        write_json(&paths.model(lender, method), &file, "model")?;

        let eval = evaluate_model(&split.test, &file)?;
        write_json(
            &paths.metrics(lender, method),
            &MetricsFile {
                tool: TOOL_NAME.to_string(),
                lender,
                method,
                evaluation: eval.clone(),
            },
            "metrics",
        )?;
        evaluations.push((lender, eval));
    }

    Ok(RunOutput {
        method,
        stage_reports: vec![
            ("prepare", prepare_report),
            ("fill-missing", fill_report),
            ("fix-anomalies", fix_report),
        ],
        evaluations,
    })
}

/// Output of a whole-chain run.
pub struct RunOutput {
    pub method: TrainMethod,
    pub stage_reports: Vec<(&'static str, StageReport)>,
    pub evaluations: Vec<(Lender, Evaluation)>,
}

/// Score a raw export with saved models; writes one row per application.
///
/// The scoring chain deliberately differs from training: no deduplication and
/// no outlier removal, so every prepared row produces exactly one prediction.
/// The leading `row` column carries the input CSV line number, which is what
/// maps a prediction back to its application when prepare had to drop rows.
pub fn run_predict(args: &PredictArgs) -> Result<PredictOutput, AppError> {
    let paths = Paths::from_args(&args.stage);
    let asof = resolve_asof(&args.stage);
    let params = Params::load(&args.stage.params)?;
    let method = resolve_method(args.method, &params);

    let (mut apps, source_lines, prepare_report) = prepare_in_memory(&args.stage.input)?;
    impute_missing(&mut apps);
    let fixed = fix_anomalies_for_scoring(&apps, asof);
    let features = derive_features(&fixed.apps, asof)?;

    let scaler: StandardScaler = read_json(&paths.scaler(), "scaler")?;

    let mut scored = Vec::new();
    for lender in lenders(args.lender) {
        let file: ModelFile = read_json(&paths.model(lender, method), "model")?;
        if file.method != method {
            return Err(AppError::io(format!(
                "Model file for lender {} was trained with `{}`.",
                lender.display_name(),
                file.method.display_name()
            )));
        }
        let frame = prepare_for_prediction(&features.frame, lender, &scaler)?;
        let frame = frame.select(&file.feature_names)?;
        let probas: Vec<f64> = frame.rows.iter().map(|r| file.model.predict_proba(r)).collect();
        scored.push((lender, probas));
    }

    let out = prediction_frame(&source_lines, &scored)?;
    ensure_parent(&args.output)?;
    write_frame(&args.output, &out)?;

    Ok(PredictOutput {
        method,
        rows_scored: out.n_rows(),
        output: args.output.clone(),
        prepare: prepare_report,
    })
}

/// Assemble the prediction frame: input line number, then probability and
/// 0/1 decision per lender.
fn prediction_frame(
    source_lines: &[usize],
    scored: &[(Lender, Vec<f64>)],
) -> Result<FeatureFrame, AppError> {
    let mut columns = Vec::with_capacity(1 + 2 * scored.len());
    columns.push("row".to_string());
    for (lender, _) in scored {
        let l = lender.display_name().to_lowercase();
        columns.push(format!("proba_{l}"));
        columns.push(format!("decision_{l}"));
    }

    let mut out = FeatureFrame::new(columns);
    for (i, &line) in source_lines.iter().enumerate() {
        let mut row = Vec::with_capacity(1 + 2 * scored.len());
        row.push(line as f64);
        for (lender, probas) in scored {
            let Some(&proba) = probas.get(i) else {
                return Err(AppError::new(
                    4,
                    format!(
                        "Lender {} produced {} predictions for {} rows.",
                        lender.display_name(),
                        probas.len(),
                        source_lines.len()
                    ),
                ));
            };
            row.push(proba);
            row.push(if proba >= 0.5 { 1.0 } else { 0.0 });
        }
        out.push_row(row)?;
    }
    Ok(out)
}

/// Output of a scoring run.
pub struct PredictOutput {
    pub method: TrainMethod,
    pub rows_scored: usize,
    pub output: PathBuf,
    pub prepare: StageReport,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prediction_rows_keep_source_lines() {
        let scored = vec![(Lender::A, vec![0.9, 0.2]), (Lender::B, vec![0.4, 0.6])];
        let out = prediction_frame(&[2, 5], &scored).unwrap();

        assert_eq!(
            out.columns,
            vec!["row", "proba_a", "decision_a", "proba_b", "decision_b"]
        );
        // Line 3 of the input was dropped in prepare; line 5 still maps back.
        assert_eq!(out.rows[0], vec![2.0, 0.9, 1.0, 0.4, 0.0]);
        assert_eq!(out.rows[1], vec![5.0, 0.2, 0.0, 0.6, 1.0]);
    }

    #[test]
    fn prediction_frame_rejects_short_score_vectors() {
        let scored = vec![(Lender::A, vec![0.9])];
        assert!(prediction_frame(&[2, 3], &scored).is_err());
    }
}
