//! Raw CSV ingest.
//!
//! This module turns the upstream application-system export (semicolon
//! delimited, mixed-language headers, numbers that may arrive as `35000.0`)
//! into `RawRecord`s that the `prepare` stage can type-check.
//!
//! Design goals:
//! - **Strict schema** for required columns (clear errors + exit code 2)
//! - **Row-level tolerance**: a malformed row is recorded, not fatal
//! - **Deterministic behavior** (no hidden randomness)
//! - **Separation of concerns**: no cleaning or feature logic here

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use chrono::NaiveDate;
use csv::StringRecord;

use crate::domain::{Lender, RawRecord};
use crate::error::AppError;

/// Delimiter used by the upstream export and all stage files.
pub const STAGE_DELIMITER: u8 = b';';

/// A row-level problem encountered during ingest or a stage transform.
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Ingest output: raw records plus bookkeeping for the run report.
#[derive(Debug, Clone)]
pub struct RawIngest {
    pub records: Vec<RawRecord>,
    pub rows_read: usize,
    pub row_errors: Vec<RowError>,
}

/// Read the raw export into `RawRecord`s.
pub fn read_raw_csv(path: &Path) -> Result<RawIngest, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::io(format!("Failed to open CSV '{}': {e}", path.display())))?;

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(STAGE_DELIMITER)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = reader
        .headers()
        .map_err(|e| AppError::io(format!("Failed to read CSV headers: {e}")))?
        .clone();

    let header_map = build_header_map(&headers);
    ensure_required_columns_exist(&header_map)?;

    let mut records = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // +2: records() starts after the header row and CSV lines are 1-based.
        let line = idx + 2;
        rows_read += 1;

        match result {
            Ok(record) => records.push(parse_raw_record(&record, &header_map)),
            Err(e) => row_errors.push(RowError {
                line,
                message: format!("CSV parse error: {e}"),
            }),
        }
    }

    Ok(RawIngest {
        records,
        rows_read,
        row_errors,
    })
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Excel and other tools sometimes emit UTF-8 CSVs with a BOM prefix on the
    // first header. If we don't strip it, schema validation will incorrectly
    // report missing columns.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn ensure_required_columns_exist(header_map: &HashMap<String, usize>) -> Result<(), AppError> {
    // Identifier and free-text columns (`skillfactory_id`, `position`) are
    // dropped by the cleaning stage, so they are not required here.
    const REQUIRED: [&str; 10] = [
        "birthdate",
        "education",
        "employment status",
        "value",
        "monthprofit",
        "monthexpense",
        "family status",
        "loan_amount",
        "loan_term",
        "merch_code",
    ];
    for name in REQUIRED {
        if !header_map.contains_key(name) {
            return Err(AppError::io(format!("Missing required column: `{name}`")));
        }
    }
    Ok(())
}

fn parse_raw_record(record: &StringRecord, header_map: &HashMap<String, usize>) -> RawRecord {
    let get = |name: &str| get_optional(record, header_map, name).map(str::to_string);

    let mut decisions: [Option<String>; 5] = Default::default();
    for (slot, lender) in decisions.iter_mut().zip(Lender::ALL) {
        *slot = get(lender.raw_decision_column());
    }

    RawRecord {
        birth_date: get("birthdate"),
        education: get("education"),
        employment: get("employment status"),
        seniority: get("value"),
        job_start_date: get("jobstartdate"),
        monthly_income: get("monthprofit"),
        monthly_expense: get("monthexpense"),
        gender: get("gender"),
        family_status: get("family status"),
        child_count: get("childcount"),
        snils: get("snils"),
        loan_amount: get("loan_amount"),
        loan_term: get("loan_term"),
        goods_category: get("goods_category"),
        merch_code: get("merch_code"),
        decisions,
    }
}

fn get_optional<'a>(
    record: &'a StringRecord,
    header_map: &HashMap<String, usize>,
    name: &str,
) -> Option<&'a str> {
    let idx = header_map.get(name)?;
    record.get(*idx).map(str::trim).filter(|s| !s.is_empty())
}

/// Parse a date from the formats seen in the wild for this export.
pub fn parse_date(s: &str) -> Result<NaiveDate, String> {
    // ISO dates, ISO datetimes (job start dates are exported with a midnight
    // time component), and the occasional European short form.
    const FMTS: [&str; 3] = ["%Y-%m-%d", "%d.%m.%Y", "%d/%m/%Y"];
    let s = s.trim();
    for fmt in FMTS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(d);
        }
    }
    if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Ok(dt.date());
    }
    Err(format!(
        "Invalid date '{s}'. Expected YYYY-MM-DD, YYYY-MM-DD HH:MM:SS, DD.MM.YYYY or DD/MM/YYYY."
    ))
}

/// Parse an integer field that may be exported with a float suffix (`12.0`).
pub fn parse_int_like(s: &str) -> Result<i64, String> {
    let s = s.trim();
    if let Ok(v) = s.parse::<i64>() {
        return Ok(v);
    }
    let v = s
        .parse::<f64>()
        .map_err(|_| format!("Invalid number '{s}'."))?;
    if !v.is_finite() {
        return Err(format!("Non-finite number '{s}'."));
    }
    Ok(v.round() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_formats() {
        let d = NaiveDate::from_ymd_opt(2000, 6, 21).unwrap();
        assert_eq!(parse_date("2000-06-21"), Ok(d));
        assert_eq!(parse_date("2000-06-21 00:00:00"), Ok(d));
        assert_eq!(parse_date("21.06.2000"), Ok(d));
        assert!(parse_date("June 21st").is_err());
    }

    #[test]
    fn int_like_parsing() {
        assert_eq!(parse_int_like("12"), Ok(12));
        assert_eq!(parse_int_like("35000.0"), Ok(35000));
        assert_eq!(parse_int_like("-3.4"), Ok(-3));
        assert!(parse_int_like("abc").is_err());
    }

    #[test]
    fn header_normalization_strips_bom() {
        assert_eq!(normalize_header_name("\u{feff}BirthDate"), "birthdate");
        assert_eq!(normalize_header_name("  Family status "), "family status");
    }
}
