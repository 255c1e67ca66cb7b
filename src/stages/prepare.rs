//! Stage 1: type normalization.
//!
//! Turns `RawRecord`s into typed `Application`s:
//!
//! - dates parsed (birth date is required; job start date optional)
//! - gender binarized (raw values > 0 map to 1)
//! - numeric fields parsed with float-suffix tolerance
//! - categorical labels resolved against the known vocabularies
//!
//! Unknown categorical labels become `None` (and later an ordinal code of -1),
//! mirroring how the decision data was originally encoded; only a missing or
//! unparseable birth date rejects a row, since age drives the anomaly checks.

use crate::domain::{
    Application, Decision, EducationLevel, EmploymentStatus, FamilyStatus, GoodsCategory,
    RawRecord, SeniorityBand,
};
use crate::io::ingest::{RowError, parse_date, parse_int_like};

/// Prepared applications plus row-level accounting.
#[derive(Debug, Clone)]
pub struct PrepareOutput {
    pub apps: Vec<Application>,
    /// Source CSV line of each prepared application (1-based, header = 1).
    ///
    /// Kept parallel to `apps` so scoring output can be mapped back to the
    /// input file even when blank or malformed rows were skipped.
    pub source_lines: Vec<usize>,
    pub rows_blank: usize,
    pub row_errors: Vec<RowError>,
}

/// Run the prepare stage over ingested raw records.
pub fn prepare_applications(records: &[RawRecord]) -> PrepareOutput {
    let mut apps = Vec::with_capacity(records.len());
    let mut source_lines = Vec::with_capacity(records.len());
    let mut row_errors = Vec::new();
    let mut rows_blank = 0usize;

    for (idx, record) in records.iter().enumerate() {
        let line = idx + 2;

        if record.is_empty() {
            rows_blank += 1;
            continue;
        }

        match prepare_record(record) {
            Ok(app) => {
                apps.push(app);
                source_lines.push(line);
            }
            Err(message) => row_errors.push(RowError { line, message }),
        }
    }

    PrepareOutput {
        apps,
        source_lines,
        rows_blank,
        row_errors,
    }
}

fn prepare_record(record: &RawRecord) -> Result<Application, String> {
    let birth_date = record
        .birth_date
        .as_deref()
        .ok_or_else(|| "Missing birth date.".to_string())
        .and_then(|s| parse_date(s))?;

    let job_start_date = record
        .job_start_date
        .as_deref()
        .and_then(|s| parse_date(s).ok());

    let gender = parse_opt_int(record.gender.as_deref())?.map(|v| u8::from(v > 0));
    let has_snils = parse_opt_int(record.snils.as_deref())?.map(|v| u8::from(v != 0));

    let child_count = parse_opt_int(record.child_count.as_deref())?.map(|v| v.max(0) as u32);
    let loan_term = parse_opt_int(record.loan_term.as_deref())?.map(|v| v.max(0) as u32);
    let merch_code = parse_opt_int(record.merch_code.as_deref())?.map(|v| v.max(0) as u32);

    let decisions: Vec<Option<Decision>> = record
        .decisions
        .iter()
        .map(|d| d.as_deref().and_then(Decision::from_label))
        .collect();

    Ok(Application {
        birth_date,
        education: record.education.as_deref().and_then(EducationLevel::from_label),
        employment: record.employment.as_deref().and_then(EmploymentStatus::from_label),
        seniority: record.seniority.as_deref().and_then(SeniorityBand::from_label),
        job_start_date,
        monthly_income: parse_opt_int(record.monthly_income.as_deref())?,
        monthly_expense: parse_opt_int(record.monthly_expense.as_deref())?,
        gender,
        family_status: record
            .family_status
            .as_deref()
            .and_then(FamilyStatus::from_label),
        child_count,
        has_snils,
        loan_amount: parse_opt_int(record.loan_amount.as_deref())?,
        loan_term,
        goods_category: record
            .goods_category
            .as_deref()
            .and_then(GoodsCategory::from_label),
        merch_code,
        decision_a: decisions[0],
        decision_b: decisions[1],
        decision_c: decisions[2],
        decision_d: decisions[3],
        decision_e: decisions[4],
    })
}

fn parse_opt_int(s: Option<&str>) -> Result<Option<i64>, String> {
    match s {
        None => Ok(None),
        Some(s) => parse_int_like(s).map(Some),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw() -> RawRecord {
        RawRecord {
            birth_date: Some("1990-03-15".to_string()),
            education: Some("Бакалавр".to_string()),
            employment: Some("Собственное дело".to_string()),
            seniority: Some("1 - 2 года".to_string()),
            job_start_date: Some("2022-01-01 00:00:00".to_string()),
            monthly_income: Some("80000.0".to_string()),
            monthly_expense: Some("30000".to_string()),
            gender: Some("1.0".to_string()),
            family_status: Some("Женат / замужем".to_string()),
            child_count: Some("2".to_string()),
            snils: Some("1".to_string()),
            loan_amount: Some("120000".to_string()),
            loan_term: Some("12".to_string()),
            goods_category: Some("Travel".to_string()),
            merch_code: Some("17".to_string()),
            decisions: [
                Some("success".to_string()),
                Some("denied".to_string()),
                Some("error".to_string()),
                None,
                Some("success".to_string()),
            ],
        }
    }

    #[test]
    fn prepares_a_full_record() {
        let out = prepare_applications(&[raw()]);
        assert!(out.row_errors.is_empty());
        assert_eq!(out.apps.len(), 1);

        let app = &out.apps[0];
        assert_eq!(app.gender, Some(1));
        assert_eq!(app.monthly_income, Some(80000));
        assert_eq!(app.seniority, Some(SeniorityBand::OneToTwoYears));
        assert_eq!(app.decision_c, Some(Decision::Error));
        assert_eq!(app.decision_d, None);
    }

    #[test]
    fn missing_birth_date_is_a_row_error() {
        let mut record = raw();
        record.birth_date = None;
        let out = prepare_applications(&[record]);
        assert!(out.apps.is_empty());
        assert_eq!(out.row_errors.len(), 1);
    }

    #[test]
    fn blank_rows_are_counted_not_errored() {
        let out = prepare_applications(&[RawRecord::default(), raw()]);
        assert_eq!(out.rows_blank, 1);
        assert_eq!(out.apps.len(), 1);
        assert!(out.row_errors.is_empty());
    }

    #[test]
    fn source_lines_skip_rejected_rows() {
        let mut bad = raw();
        bad.birth_date = Some("not a date".to_string());
        let out = prepare_applications(&[raw(), RawRecord::default(), bad, raw()]);
        assert_eq!(out.apps.len(), 2);
        // Data starts at line 2; the blank line 3 and the bad line 4 are skipped.
        assert_eq!(out.source_lines, vec![2, 5]);
    }

    #[test]
    fn unknown_labels_become_none() {
        let mut record = raw();
        record.education = Some("PhD".to_string());
        record.goods_category = Some("Boats".to_string());
        let out = prepare_applications(&[record]);
        assert_eq!(out.apps[0].education, None);
        assert_eq!(out.apps[0].goods_category, None);
    }
}
