//! Stage 4: feature derivation.
//!
//! Converts cleaned applications into a flat numeric frame:
//!
//! - derived numerics: has-income flag, credit burden, loan-feasible flag, age
//! - ordinal codes for every coarse categorical (unknown label = -1)
//! - one-hot blocks: total seniority, education, employment, family status,
//!   loan term, goods category, merchant code, last-job seniority, children
//! - lender decisions encoded as ordinal targets (denied=0, success=1, error=2,
//!   missing=-1)
//!
//! The column layout is produced by [`feature_columns`] and is the single
//! source of truth for every downstream stage.

use chrono::NaiveDate;

use crate::domain::{
    Application, ChildBucket, EducationBand, EmploymentKind, FamilyBand, FeatureFrame,
    GoodsCategory, LOAN_TERMS, Lender, MERCH_CODE_MAX, SeniorityBucket, age_years,
    last_seniority_months,
};
use crate::error::AppError;
use crate::io::ingest::RowError;

/// Credit-burden ratio above which a loan is considered feasible.
pub const FEASIBLE_BURDEN: f64 = 1.25;

/// Column layout of the derived feature frame, targets last.
pub fn feature_columns() -> Vec<String> {
    let mut cols: Vec<String> = [
        "gender",
        "has_snils",
        "monthly_income",
        "monthly_expense",
        "loan_amount",
        "has_income",
        "credit_burden",
        "loan_feasible",
        "age",
        "last_seniority_code",
        "goods_code",
        "family_code",
        "education_code",
        "employment_code",
        "seniority_code",
        "children_code",
    ]
    .into_iter()
    .map(str::to_string)
    .collect();

    cols.extend(
        SeniorityBucket::ALL
            .iter()
            .map(|b| format!("seniority_{}", b.feature_suffix())),
    );
    cols.extend(EducationBand::ALL.iter().map(|b| b.feature_name().to_string()));
    cols.extend(EmploymentKind::ALL.iter().map(|k| k.feature_name().to_string()));
    cols.extend(FamilyBand::ALL.iter().map(|b| b.feature_name().to_string()));
    cols.extend(LOAN_TERMS.iter().map(|t| format!("term_{t}")));
    cols.extend(GoodsCategory::ALL.iter().map(|c| c.feature_name().to_string()));
    cols.extend((1..=MERCH_CODE_MAX).map(|c| format!("merch_{c}")));
    cols.extend(
        SeniorityBucket::ALL
            .iter()
            .map(|b| format!("last_seniority_{}", b.feature_suffix())),
    );
    cols.extend(ChildBucket::ALL.iter().map(|b| b.feature_name().to_string()));
    cols.extend(Lender::ALL.iter().map(|l| l.target_column().to_string()));

    cols
}

/// Derived frame plus row-level accounting.
#[derive(Debug, Clone)]
pub struct FeatureOutput {
    pub frame: FeatureFrame,
    pub row_errors: Vec<RowError>,
}

/// Run the derive-features stage. `asof` anchors the age computation.
pub fn derive_features(apps: &[Application], asof: NaiveDate) -> Result<FeatureOutput, AppError> {
    let columns = feature_columns();
    let mut frame = FeatureFrame::new(columns);
    let mut row_errors = Vec::new();

    for (idx, app) in apps.iter().enumerate() {
        let line = idx + 2;
        let mut row = vec![0.0; frame.n_cols()];
        let mut set = |frame: &FeatureFrame, name: &str, value: f64| -> Result<(), AppError> {
            let i = frame
                .column_index(name)
                .ok_or_else(|| AppError::new(4, format!("Unknown feature column `{name}`.")))?;
            row[i] = value;
            Ok(())
        };

        let income = app.monthly_income.unwrap_or(0) as f64;
        let expense = app.monthly_expense.unwrap_or(0) as f64;
        let amount = app.loan_amount.unwrap_or(0) as f64;
        let term = app.loan_term.unwrap_or(0) as f64;

        set(&frame, "gender", f64::from(app.gender.unwrap_or(0)))?;
        set(&frame, "has_snils", f64::from(app.has_snils.unwrap_or(0)))?;
        set(&frame, "monthly_income", income)?;
        set(&frame, "monthly_expense", expense)?;
        set(&frame, "loan_amount", amount)?;
        set(&frame, "has_income", if app.has_income() { 1.0 } else { 0.0 })?;

        let burden = if amount > 0.0 && term > 0.0 {
            (income - expense) / (amount / term)
        } else {
            row_errors.push(RowError {
                line,
                message: "Zero loan amount/term; credit burden set to 0.".to_string(),
            });
            0.0
        };
        set(&frame, "credit_burden", burden)?;
        set(
            &frame,
            "loan_feasible",
            if burden > FEASIBLE_BURDEN { 1.0 } else { 0.0 },
        )?;
        set(&frame, "age", f64::from(age_years(app.birth_date, asof)))?;

        // Ordinal codes (-1 for unknown, matching the original encoding).
        let last_bucket = app
            .has_income()
            .then(|| last_seniority_months(app.job_start_date, asof))
            .flatten()
            .map(SeniorityBucket::from_months);
        set(
            &frame,
            "last_seniority_code",
            last_bucket.map_or(-1.0, SeniorityBucket::code),
        )?;
        set(
            &frame,
            "goods_code",
            app.goods_category.map_or(-1.0, GoodsCategory::code),
        )?;
        set(
            &frame,
            "family_code",
            app.family_status.map_or(-1.0, |f| f.band().code()),
        )?;
        set(
            &frame,
            "education_code",
            app.education.map_or(-1.0, |e| e.band().code()),
        )?;
        set(
            &frame,
            "employment_code",
            app.employment.map_or(-1.0, |e| e.kind().code()),
        )?;
        set(
            &frame,
            "seniority_code",
            app.seniority.map_or(-1.0, |s| s.bucket().code()),
        )?;
        let children = ChildBucket::from_count(app.child_count.unwrap_or(0));
        set(&frame, "children_code", children.code())?;

        // One-hot blocks.
        if let Some(s) = app.seniority {
            set(
                &frame,
                &format!("seniority_{}", s.bucket().feature_suffix()),
                1.0,
            )?;
        }
        if let Some(e) = app.education {
            set(&frame, e.band().feature_name(), 1.0)?;
        }
        if let Some(e) = app.employment {
            set(&frame, e.kind().feature_name(), 1.0)?;
        }
        if let Some(f) = app.family_status {
            set(&frame, f.band().feature_name(), 1.0)?;
        }
        if let Some(term) = app.loan_term {
            if LOAN_TERMS.contains(&term) {
                set(&frame, &format!("term_{term}"), 1.0)?;
            }
        }
        if let Some(g) = app.goods_category {
            set(&frame, g.feature_name(), 1.0)?;
        }
        if let Some(code) = app.merch_code {
            if (1..=MERCH_CODE_MAX).contains(&code) {
                set(&frame, &format!("merch_{code}"), 1.0)?;
            }
        }
        if let Some(bucket) = last_bucket {
            set(
                &frame,
                &format!("last_seniority_{}", bucket.feature_suffix()),
                1.0,
            )?;
        }
        set(&frame, children.feature_name(), 1.0)?;

        // Targets.
        for lender in Lender::ALL {
            set(
                &frame,
                lender.target_column(),
                app.decision(lender).map_or(-1.0, |d| d.code()),
            )?;
        }

        frame.push_row(row)?;
    }

    Ok(FeatureOutput { frame, row_errors })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Decision, EducationLevel, EmploymentStatus, FamilyStatus, SeniorityBand};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn app() -> Application {
        Application {
            birth_date: date(1994, 1, 1),
            education: Some(EducationLevel::Bachelor),
            employment: Some(EmploymentStatus::FullTime),
            seniority: Some(SeniorityBand::FourToFiveYears),
            job_start_date: Some(date(2022, 1, 1)),
            monthly_income: Some(90_000),
            monthly_expense: Some(40_000),
            gender: Some(1),
            family_status: Some(FamilyStatus::CivilUnion),
            child_count: Some(1),
            has_snils: Some(1),
            loan_amount: Some(120_000),
            loan_term: Some(12),
            goods_category: Some(GoodsCategory::Travel),
            merch_code: Some(17),
            decision_a: Some(Decision::Success),
            decision_b: Some(Decision::Denied),
            decision_c: Some(Decision::Error),
            decision_d: None,
            decision_e: Some(Decision::Success),
        }
    }

    fn value(frame: &FeatureFrame, name: &str) -> f64 {
        frame.rows[0][frame.column_index(name).unwrap()]
    }

    #[test]
    fn derives_numeric_features() {
        let out = derive_features(&[app()], date(2024, 1, 1)).unwrap();
        let f = &out.frame;
        assert!(out.row_errors.is_empty());

        assert_eq!(value(f, "age"), 30.0);
        assert_eq!(value(f, "has_income"), 1.0);
        // (90000 - 40000) / (120000 / 12) = 5.0
        assert_eq!(value(f, "credit_burden"), 5.0);
        assert_eq!(value(f, "loan_feasible"), 1.0);
    }

    #[test]
    fn one_hot_blocks_are_exclusive() {
        let out = derive_features(&[app()], date(2024, 1, 1)).unwrap();
        let f = &out.frame;

        assert_eq!(value(f, "education_higher"), 1.0);
        assert_eq!(value(f, "education_secondary"), 0.0);
        assert_eq!(value(f, "family_married"), 1.0);
        assert_eq!(value(f, "term_12"), 1.0);
        assert_eq!(value(f, "term_6"), 0.0);
        assert_eq!(value(f, "goods_travel"), 1.0);
        assert_eq!(value(f, "merch_17"), 1.0);
        assert_eq!(value(f, "merch_18"), 0.0);
        assert_eq!(value(f, "children_one"), 1.0);
        // job held for 2 years as of 2024-01-01
        assert_eq!(value(f, "last_seniority_lt5y"), 1.0);
    }

    #[test]
    fn targets_are_ordinal() {
        let out = derive_features(&[app()], date(2024, 1, 1)).unwrap();
        let f = &out.frame;
        assert_eq!(value(f, "decision_a"), 1.0);
        assert_eq!(value(f, "decision_b"), 0.0);
        assert_eq!(value(f, "decision_c"), 2.0);
        assert_eq!(value(f, "decision_d"), -1.0);
    }

    #[test]
    fn zero_term_reports_row_error() {
        let mut a = app();
        a.loan_term = Some(0);
        let out = derive_features(&[a], date(2024, 1, 1)).unwrap();
        assert_eq!(out.row_errors.len(), 1);
        assert_eq!(value(&out.frame, "credit_burden"), 0.0);
    }

    #[test]
    fn unknown_categoricals_code_minus_one() {
        let mut a = app();
        a.education = None;
        a.goods_category = None;
        let out = derive_features(&[a], date(2024, 1, 1)).unwrap();
        let f = &out.frame;
        assert_eq!(value(f, "education_code"), -1.0);
        assert_eq!(value(f, "goods_code"), -1.0);
        for band in EducationBand::ALL {
            assert_eq!(value(f, band.feature_name()), 0.0);
        }
    }
}
