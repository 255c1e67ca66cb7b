//! Stage 2: deduplication and imputation.
//!
//! - exact duplicate applications are removed (first occurrence wins)
//! - missing values are filled with the conventions of the source system:
//!   mode for gender / family status / loan term, zero for child count and
//!   the SNILS flag, median for the loan amount, "no experience" for the
//!   seniority band

use std::collections::HashSet;

use crate::domain::{Application, SeniorityBand};
use crate::math::stats::{median, mode};

/// Cleaning output plus bookkeeping for the run report.
#[derive(Debug, Clone)]
pub struct CleanOutput {
    pub apps: Vec<Application>,
    pub duplicates_removed: usize,
}

/// Run the fill-missing stage.
pub fn fill_missing(apps: &[Application]) -> CleanOutput {
    // Dedupe first so the imputation statistics are not skewed by repeats.
    let mut seen: HashSet<Application> = HashSet::new();
    let mut unique: Vec<Application> = Vec::with_capacity(apps.len());
    for app in apps {
        if seen.insert(app.clone()) {
            unique.push(app.clone());
        }
    }
    let duplicates_removed = apps.len() - unique.len();

    impute_missing(&mut unique);

    CleanOutput {
        apps: unique,
        duplicates_removed,
    }
}

/// Fill missing values in place; statistics come from the rows given.
///
/// The scoring path uses this directly: duplicates in a scoring batch are
/// legitimate and must each keep their output row.
pub fn impute_missing(apps: &mut [Application]) {
    let gender_mode = mode(apps.iter().filter_map(|a| a.gender));
    let family_mode = mode(apps.iter().filter_map(|a| a.family_status));
    let term_mode = mode(apps.iter().filter_map(|a| a.loan_term));
    let amount_median = median(
        &apps
            .iter()
            .filter_map(|a| a.loan_amount.map(|v| v as f64))
            .collect::<Vec<_>>(),
    )
    .map(|v| v.round() as i64);

    for app in apps {
        if app.seniority.is_none() {
            app.seniority = Some(SeniorityBand::NoExperience);
        }
        if app.gender.is_none() {
            app.gender = gender_mode;
        }
        if app.family_status.is_none() {
            app.family_status = family_mode;
        }
        if app.child_count.is_none() {
            app.child_count = Some(0);
        }
        if app.has_snils.is_none() {
            app.has_snils = Some(0);
        }
        if app.loan_amount.is_none() {
            app.loan_amount = amount_median;
        }
        if app.loan_term.is_none() {
            app.loan_term = term_mode;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FamilyStatus;
    use chrono::NaiveDate;

    fn app(income: i64) -> Application {
        Application {
            birth_date: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
            education: None,
            employment: None,
            seniority: None,
            job_start_date: None,
            monthly_income: Some(income),
            monthly_expense: Some(20000),
            gender: Some(1),
            family_status: Some(FamilyStatus::Married),
            child_count: Some(0),
            has_snils: Some(1),
            loan_amount: Some(100_000),
            loan_term: Some(12),
            goods_category: None,
            merch_code: None,
            decision_a: None,
            decision_b: None,
            decision_c: None,
            decision_d: None,
            decision_e: None,
        }
    }

    #[test]
    fn removes_exact_duplicates() {
        let a = app(50_000);
        let out = fill_missing(&[a.clone(), a.clone(), app(60_000)]);
        assert_eq!(out.apps.len(), 2);
        assert_eq!(out.duplicates_removed, 1);
    }

    #[test]
    fn fills_with_mode_and_median() {
        let mut missing = app(70_000);
        missing.gender = None;
        missing.family_status = None;
        missing.loan_amount = None;
        missing.loan_term = None;
        missing.seniority = None;
        missing.child_count = None;

        let mut other = app(50_000);
        other.loan_amount = Some(200_000);

        let out = fill_missing(&[app(40_000), other, missing]);
        let filled = &out.apps[2];
        assert_eq!(filled.gender, Some(1));
        assert_eq!(filled.family_status, Some(FamilyStatus::Married));
        assert_eq!(filled.loan_term, Some(12));
        assert_eq!(filled.seniority, Some(SeniorityBand::NoExperience));
        assert_eq!(filled.child_count, Some(0));
        // median of 100k and 200k
        assert_eq!(filled.loan_amount, Some(150_000));
    }

    #[test]
    fn imputation_alone_keeps_duplicates() {
        let mut missing = app(50_000);
        missing.gender = None;
        let mut batch = vec![app(50_000), app(50_000), missing];

        impute_missing(&mut batch);
        assert_eq!(batch.len(), 3);
        assert_eq!(batch[2].gender, Some(1));
    }
}
