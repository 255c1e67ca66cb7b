//! Stage 5: per-lender feature preparation.
//!
//! Each lender gets its own view of the derived frame:
//!
//! - the scaler is fitted on the full frame first, so every lender shares one
//!   scaling of the raw numeric columns
//! - rows whose decision is an error or missing are dropped (binary target)
//! - the target column is renamed to `y`, other decisions are removed
//! - ordinal code columns plus a lender-specific drop list are removed
//! - age is rescaled to [0, ~1], the scaled numerics get polynomial terms

use crate::domain::{FeatureFrame, Lender};
use crate::error::AppError;
use crate::math::poly::{expand_row, poly_column_names};
use crate::math::scaler::StandardScaler;

/// Ordinal code columns present only for inspection; models use one-hots.
pub const CODE_COLUMNS: [&str; 7] = [
    "last_seniority_code",
    "goods_code",
    "family_code",
    "education_code",
    "employment_code",
    "seniority_code",
    "children_code",
];

/// Numeric columns that are standard-scaled and polynomial-expanded.
pub const SCALE_COLUMNS: [&str; 4] = [
    "monthly_income",
    "monthly_expense",
    "loan_amount",
    "credit_burden",
];

/// Degree of the polynomial expansion applied to the scaled numerics.
pub const POLY_ORDER: u32 = 3;

/// Columns dropped for a given lender, on top of the generic drops.
///
/// These lists came out of per-lender feature screening in the source system:
/// columns with near-zero variance or no signal for that lender's decisions.
pub fn lender_drop_columns(lender: Lender) -> &'static [&'static str] {
    match lender {
        Lender::A => &[
            "goods_education",
            "goods_other",
            "employment_other",
            "term_18",
            "term_24",
        ],
        Lender::B => &[
            "goods_education",
            "goods_travel",
            "goods_furniture",
            "employment_other",
            "term_12",
            "term_6",
        ],
        Lender::C => &[
            "goods_travel",
            "goods_furniture",
            "goods_other",
            "employment_self",
            "employment_other",
            "employment_employed",
            "term_12",
            "term_24",
        ],
        Lender::D => &[
            "goods_education",
            "goods_furniture",
            "employment_self",
            "employment_employed",
            "term_12",
            "term_24",
            "term_6",
        ],
        Lender::E => &["goods_other", "term_18", "term_24"],
    }
}

/// Fit the shared scaler on the full derived frame (before any row filtering).
pub fn fit_scaler(frame: &FeatureFrame) -> Result<StandardScaler, AppError> {
    let columns: Vec<String> = SCALE_COLUMNS.iter().map(|s| s.to_string()).collect();
    let mut data = Vec::with_capacity(columns.len());
    for name in &columns {
        data.push(frame.column_values(name)?);
    }
    StandardScaler::fit(&columns, &data)
}

/// Prepared per-lender output.
#[derive(Debug, Clone)]
pub struct LenderOutput {
    pub frame: FeatureFrame,
    pub rows_dropped: usize,
}

/// Produce the lender-specific training frame.
///
/// `scaler` must have been fitted with [`fit_scaler`] on the full frame.
pub fn prepare_for_lender(
    frame: &FeatureFrame,
    lender: Lender,
    scaler: &StandardScaler,
) -> Result<LenderOutput, AppError> {
    let target = lender.target_column();
    let target_idx = frame
        .column_index(target)
        .ok_or_else(|| AppError::new(2, format!("Feature frame lacks column `{target}`.")))?;

    // Keep binary decisions only.
    let filtered = frame.filter_rows(|row| row[target_idx] == 0.0 || row[target_idx] == 1.0);
    let rows_dropped = frame.n_rows() - filtered.n_rows();

    // Drop the other lenders' targets and rename ours to `y`.
    let other_targets: Vec<&str> = Lender::ALL
        .iter()
        .filter(|l| **l != lender)
        .map(|l| l.target_column())
        .collect();
    let mut out = filtered.drop_columns(&other_targets);
    let target_idx = out
        .column_index(target)
        .ok_or_else(|| AppError::new(4, format!("Target column `{target}` lost in drop.")))?;
    out.columns[target_idx] = "y".to_string();

    // Generic and lender-specific screening drops.
    out = out.drop_columns(&CODE_COLUMNS);
    out = out.drop_columns(lender_drop_columns(lender));

    // Age on a unit-ish scale.
    if let Some(age_idx) = out.column_index("age") {
        for row in &mut out.rows {
            row[age_idx] /= 100.0;
        }
    }

    let frame = apply_scaling(&out, scaler)?;
    Ok(LenderOutput {
        frame,
        rows_dropped,
    })
}

/// Produce the lender-specific frame for prediction.
///
/// Same column transforms as [`prepare_for_lender`] but without any row
/// filtering or target handling: all decision columns are dropped and every
/// input row yields a prediction.
pub fn prepare_for_prediction(
    frame: &FeatureFrame,
    lender: Lender,
    scaler: &StandardScaler,
) -> Result<FeatureFrame, AppError> {
    let targets: Vec<&str> = Lender::ALL.iter().map(|l| l.target_column()).collect();
    let mut out = frame.drop_columns(&targets);
    out = out.drop_columns(&CODE_COLUMNS);
    out = out.drop_columns(lender_drop_columns(lender));

    if let Some(age_idx) = out.column_index("age") {
        for row in &mut out.rows {
            row[age_idx] /= 100.0;
        }
    }

    apply_scaling(&out, scaler)
}

/// Replace the raw numeric columns with scaled polynomial terms.
///
/// Shared by training preparation and prediction, so the transform applied to
/// unseen rows is exactly the one the model was fitted on.
pub fn apply_scaling(
    frame: &FeatureFrame,
    scaler: &StandardScaler,
) -> Result<FeatureFrame, AppError> {
    let indices: Vec<usize> = scaler
        .columns
        .iter()
        .map(|name| {
            frame
                .column_index(name)
                .ok_or_else(|| AppError::new(2, format!("Feature frame lacks column `{name}`.")))
        })
        .collect::<Result<_, _>>()?;

    let expanded_names = poly_column_names(&scaler.columns, POLY_ORDER);
    let mut columns: Vec<String> = frame
        .columns
        .iter()
        .enumerate()
        .filter(|(i, _)| !indices.contains(i))
        .map(|(_, c)| c.clone())
        .collect();
    columns.extend(expanded_names);

    let mut out = FeatureFrame::new(columns);
    for row in &frame.rows {
        let raw: Vec<f64> = indices.iter().map(|&i| row[i]).collect();
        let scaled = scaler.transform_row(&raw)?;
        let mut new_row: Vec<f64> = row
            .iter()
            .enumerate()
            .filter(|(i, _)| !indices.contains(i))
            .map(|(_, v)| *v)
            .collect();
        new_row.extend(expand_row(&scaled, POLY_ORDER));
        out.push_row(new_row)?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::features::feature_columns;

    fn frame_with_targets() -> FeatureFrame {
        let mut frame = FeatureFrame::new(feature_columns());
        let n = frame.n_cols();
        let income = frame.column_index("monthly_income").unwrap();
        let target_a = frame.column_index("decision_a").unwrap();
        let age = frame.column_index("age").unwrap();

        for (i, y) in [(0usize, 1.0), (1, 0.0), (2, 2.0), (3, -1.0), (4, 1.0)] {
            let mut row = vec![0.0; n];
            row[income] = 40_000.0 + 10_000.0 * i as f64;
            row[age] = 30.0 + i as f64;
            row[target_a] = y;
            frame.push_row(row).unwrap();
        }
        frame
    }

    #[test]
    fn keeps_binary_rows_only() {
        let frame = frame_with_targets();
        let scaler = fit_scaler(&frame).unwrap();
        let out = prepare_for_lender(&frame, Lender::A, &scaler).unwrap();
        assert_eq!(out.frame.n_rows(), 3);
        assert_eq!(out.rows_dropped, 2);
    }

    #[test]
    fn renames_target_and_drops_others() {
        let frame = frame_with_targets();
        let scaler = fit_scaler(&frame).unwrap();
        let out = prepare_for_lender(&frame, Lender::A, &scaler).unwrap();
        assert!(out.frame.column_index("y").is_some());
        for lender in Lender::ALL {
            assert!(out.frame.column_index(lender.target_column()).is_none());
        }
        for code in CODE_COLUMNS {
            assert!(out.frame.column_index(code).is_none());
        }
        for dropped in lender_drop_columns(Lender::A) {
            assert!(out.frame.column_index(dropped).is_none());
        }
    }

    #[test]
    fn numeric_columns_get_polynomial_terms() {
        let frame = frame_with_targets();
        let scaler = fit_scaler(&frame).unwrap();
        let out = prepare_for_lender(&frame, Lender::A, &scaler).unwrap();
        assert!(out.frame.column_index("monthly_income").is_some());
        assert!(out.frame.column_index("monthly_income_2").is_some());
        assert!(out.frame.column_index("monthly_income_3").is_some());
        assert!(out.frame.column_index("credit_burden_3").is_some());
    }

    #[test]
    fn age_is_rescaled() {
        let frame = frame_with_targets();
        let scaler = fit_scaler(&frame).unwrap();
        let out = prepare_for_lender(&frame, Lender::A, &scaler).unwrap();
        let age = out.frame.column_index("age").unwrap();
        assert_eq!(out.frame.rows[0][age], 0.30);
    }

    #[test]
    fn prediction_frame_matches_training_columns() {
        let frame = frame_with_targets();
        let scaler = fit_scaler(&frame).unwrap();
        let train = prepare_for_lender(&frame, Lender::B, &scaler).unwrap();
        let predict = prepare_for_prediction(&frame, Lender::B, &scaler).unwrap();

        let expected: Vec<String> = train
            .frame
            .columns
            .iter()
            .filter(|c| *c != "y")
            .cloned()
            .collect();
        assert_eq!(predict.columns, expected);
        // No row filtering on the prediction path.
        assert_eq!(predict.n_rows(), frame.n_rows());
    }

    #[test]
    fn scaler_is_fitted_on_all_rows() {
        let frame = frame_with_targets();
        let scaler = fit_scaler(&frame).unwrap();
        let income = scaler
            .columns
            .iter()
            .position(|c| c == "monthly_income")
            .unwrap();
        // Mean over all five rows, including the ones later filtered out.
        assert_eq!(scaler.means[income], 60_000.0);
    }
}
