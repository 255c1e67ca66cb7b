//! Stage 3: anomaly correction.
//!
//! Three fixes, in order:
//!
//! 1. **Outlier removal** — rows whose monthly income or expense fall outside
//!    an asymmetric IQR fence (q25/q85, 1.5×IQR) are dropped.
//! 2. **Seniority correction** — declared seniority cannot exceed what the
//!    applicant's age allows (working age starts at 16), and the last-job
//!    tenure can exceed neither the legal maximum nor the total. Violations
//!    are clamped, not dropped; the job start date is rewritten to match.
//! 3. **Expense floor** — the declared monthly expense is raised to a
//!    household living-wage estimate when it falls below it.

use chrono::NaiveDate;

use crate::domain::{
    Application, SeniorityBand, last_seniority_months, max_seniority_months, months_between,
};
use crate::io::ingest::RowError;
use crate::math::stats::outlier_bounds;

/// Subsistence minimums used for the household expense floor.
pub const ADULT_LIVING_WAGE: i64 = 15_669;
pub const CHILD_LIVING_WAGE: i64 = 13_944;

/// Quartile positions of the outlier fence. The upper position is
/// deliberately q85: the income/expense distributions are right-skewed and a
/// symmetric fence was found to cut into the legitimate upper tail.
const FENCE_Q_LO: f64 = 25.0;
const FENCE_Q_HI: f64 = 85.0;

/// Anomaly-stage output plus bookkeeping for the run report.
#[derive(Debug, Clone)]
pub struct AnomalyOutput {
    pub apps: Vec<Application>,
    pub outliers_removed: usize,
    pub seniority_fixed: usize,
    pub expense_fixed: usize,
    pub row_errors: Vec<RowError>,
}

/// Run the fix-anomalies stage. `asof` anchors all age computations.
pub fn fix_anomalies(apps: &[Application], asof: NaiveDate) -> AnomalyOutput {
    let mut row_errors = Vec::new();

    // Fences are computed on the rows that actually carry values.
    let incomes: Vec<f64> = apps
        .iter()
        .filter_map(|a| a.monthly_income.map(|v| v as f64))
        .collect();
    let expenses: Vec<f64> = apps
        .iter()
        .filter_map(|a| a.monthly_expense.map(|v| v as f64))
        .collect();
    let income_fence = outlier_bounds(&incomes, FENCE_Q_LO, FENCE_Q_HI);
    let expense_fence = outlier_bounds(&expenses, FENCE_Q_LO, FENCE_Q_HI);

    let mut kept = Vec::with_capacity(apps.len());
    let mut outliers_removed = 0usize;

    for (idx, app) in apps.iter().enumerate() {
        let line = idx + 2;
        let (Some(income), Some(expense)) = (app.monthly_income, app.monthly_expense) else {
            row_errors.push(RowError {
                line,
                message: "Missing income/expense; row dropped before outlier screening.".to_string(),
            });
            continue;
        };

        let income_ok = income_fence.is_none_or(|(lo, hi)| (income as f64) >= lo && (income as f64) <= hi);
        let expense_ok =
            expense_fence.is_none_or(|(lo, hi)| (expense as f64) >= lo && (expense as f64) <= hi);

        if income_ok && expense_ok {
            kept.push(app.clone());
        } else {
            outliers_removed += 1;
        }
    }

    let mut seniority_fixed = 0usize;
    let mut expense_fixed = 0usize;

    for app in &mut kept {
        if fix_seniority(app, asof) {
            seniority_fixed += 1;
        }
        if fix_expense(app) {
            expense_fixed += 1;
        }
    }

    AnomalyOutput {
        apps: kept,
        outliers_removed,
        seniority_fixed,
        expense_fixed,
        row_errors,
    }
}

/// Scoring-path variant: apply the seniority and expense corrections without
/// removing any rows.
///
/// Outlier screening is a training-data concern; a scoring batch must keep a
/// one-to-one mapping between input applications and output predictions.
pub fn fix_anomalies_for_scoring(apps: &[Application], asof: NaiveDate) -> AnomalyOutput {
    let mut kept = apps.to_vec();
    let mut seniority_fixed = 0usize;
    let mut expense_fixed = 0usize;

    for app in &mut kept {
        if fix_seniority(app, asof) {
            seniority_fixed += 1;
        }
        if fix_expense(app) {
            expense_fixed += 1;
        }
    }

    AnomalyOutput {
        apps: kept,
        outliers_removed: 0,
        seniority_fixed,
        expense_fixed,
        row_errors: Vec::new(),
    }
}

/// Clamp seniority values to what the applicant's age allows.
///
/// Returns true when anything was changed.
pub fn fix_seniority(app: &mut Application, asof: NaiveDate) -> bool {
    let age_months = months_between(app.birth_date, asof);

    // Below the legal working age nothing can be valid.
    if age_months < 16 * 12 {
        let changed =
            app.seniority != Some(SeniorityBand::NoExperience) || app.job_start_date.is_some();
        app.seniority = Some(SeniorityBand::NoExperience);
        app.job_start_date = None;
        return changed;
    }

    let max_months = max_seniority_months(app.birth_date, asof);
    let declared = app
        .seniority
        .unwrap_or(SeniorityBand::NoExperience)
        .months();
    let new_total = declared.min(max_months);

    let mut changed = false;

    // Last-job tenure: bounded by both the legal maximum and the total.
    if app.has_income() {
        if let Some(last) = last_seniority_months(app.job_start_date, asof) {
            let new_last = last.min(max_months).min(new_total);
            if new_last != last {
                app.job_start_date = asof.checked_sub_months(chrono::Months::new(new_last));
                changed = true;
            }
        }
    }

    let new_band = SeniorityBand::from_months(new_total);
    if app.seniority != Some(new_band) {
        app.seniority = Some(new_band);
        changed = true;
    }

    changed
}

/// Raise the declared expense to the household living-wage floor.
///
/// Returns true when the expense was adjusted.
pub fn fix_expense(app: &mut Application) -> bool {
    let mut floor = ADULT_LIVING_WAGE;
    if app.family_status.is_some_and(|f| f.has_partner()) {
        floor += ADULT_LIVING_WAGE;
    }
    floor += CHILD_LIVING_WAGE * i64::from(app.child_count.unwrap_or(0));

    match app.monthly_expense {
        Some(expense) if expense >= floor => false,
        _ => {
            app.monthly_expense = Some(floor);
            true
        }
    }
}
