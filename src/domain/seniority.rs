//! Work-seniority bucketing.
//!
//! The application form captures total seniority as one of 14 fine-grained
//! bands; the models use a coarser 6-bucket vocabulary. Both vocabularies are
//! defined here together with the month-count conversions the anomaly-fixing
//! stage relies on:
//!
//! - band → representative month count (the *upper* end of its range, so a
//!   declared band is treated as the most optimistic reading)
//! - month count → fine band / coarse bucket
//! - job start date → last-job seniority in whole months

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Sentinel month count for open-ended "10+ years" bands.
const OPEN_ENDED_MONTHS: u32 = 999;

/// Fine-grained seniority bands (raw form vocabulary).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeniorityBand {
    NoExperience,
    UnderFourMonths,
    FourToSixMonths,
    SixMonthsToYear,
    OneToTwoYears,
    TwoToThreeYears,
    ThreeToFourYears,
    FourToFiveYears,
    FiveToSixYears,
    SixToSevenYears,
    SevenToEightYears,
    EightToNineYears,
    NineToTenYears,
    TenPlusYears,
}

impl SeniorityBand {
    pub const ALL: [SeniorityBand; 14] = [
        SeniorityBand::NoExperience,
        SeniorityBand::UnderFourMonths,
        SeniorityBand::FourToSixMonths,
        SeniorityBand::SixMonthsToYear,
        SeniorityBand::OneToTwoYears,
        SeniorityBand::TwoToThreeYears,
        SeniorityBand::ThreeToFourYears,
        SeniorityBand::FourToFiveYears,
        SeniorityBand::FiveToSixYears,
        SeniorityBand::SixToSevenYears,
        SeniorityBand::SevenToEightYears,
        SeniorityBand::EightToNineYears,
        SeniorityBand::NineToTenYears,
        SeniorityBand::TenPlusYears,
    ];

    /// Half-open month range `[start, end)` covered by this band.
    pub fn month_range(self) -> (u32, u32) {
        match self {
            SeniorityBand::NoExperience => (0, 1),
            SeniorityBand::UnderFourMonths => (1, 4),
            SeniorityBand::FourToSixMonths => (4, 6),
            SeniorityBand::SixMonthsToYear => (6, 12),
            SeniorityBand::OneToTwoYears => (12, 24),
            SeniorityBand::TwoToThreeYears => (24, 36),
            SeniorityBand::ThreeToFourYears => (36, 48),
            SeniorityBand::FourToFiveYears => (48, 60),
            SeniorityBand::FiveToSixYears => (60, 72),
            SeniorityBand::SixToSevenYears => (72, 84),
            SeniorityBand::SevenToEightYears => (84, 96),
            SeniorityBand::EightToNineYears => (96, 108),
            SeniorityBand::NineToTenYears => (108, 120),
            SeniorityBand::TenPlusYears => (120, OPEN_ENDED_MONTHS + 1),
        }
    }

    /// Representative month count: the last month inside the range.
    pub fn months(self) -> u32 {
        let (_, end) = self.month_range();
        end - 1
    }

    /// Band containing the given month count.
    pub fn from_months(months: u32) -> Self {
        for band in Self::ALL {
            let (start, end) = band.month_range();
            if months >= start && months < end {
                return band;
            }
        }
        SeniorityBand::TenPlusYears
    }

    /// Parse the raw form label (Russian vocabulary).
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim() {
            "Нет стажа" => Some(Self::NoExperience),
            "менее 4 месяцев" => Some(Self::UnderFourMonths),
            "4 - 6 месяцев" => Some(Self::FourToSixMonths),
            "6 месяцев - 1 год" => Some(Self::SixMonthsToYear),
            "1 - 2 года" => Some(Self::OneToTwoYears),
            "2 - 3 года" => Some(Self::TwoToThreeYears),
            "3 - 4 года" => Some(Self::ThreeToFourYears),
            "4 - 5 лет" => Some(Self::FourToFiveYears),
            "5 - 6 лет" => Some(Self::FiveToSixYears),
            "6 - 7 лет" => Some(Self::SixToSevenYears),
            "7 - 8 лет" => Some(Self::SevenToEightYears),
            "8 - 9 лет" => Some(Self::EightToNineYears),
            "9 - 10 лет" => Some(Self::NineToTenYears),
            "10 и более лет" => Some(Self::TenPlusYears),
        _ => None,
        }
    }

    /// Coarse bucket containing this band.
    pub fn bucket(self) -> SeniorityBucket {
        SeniorityBucket::from_months(self.months())
    }
}

/// Coarse seniority buckets (model vocabulary, ordinal).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeniorityBucket {
    NoExperience,
    UnderSixMonths,
    UnderTwoYears,
    UnderFiveYears,
    UnderTenYears,
    TenPlusYears,
}

impl SeniorityBucket {
    pub const ALL: [SeniorityBucket; 6] = [
        SeniorityBucket::NoExperience,
        SeniorityBucket::UnderSixMonths,
        SeniorityBucket::UnderTwoYears,
        SeniorityBucket::UnderFiveYears,
        SeniorityBucket::UnderTenYears,
        SeniorityBucket::TenPlusYears,
    ];

    /// Half-open month range `[start, end)` covered by this bucket.
    pub fn month_range(self) -> (u32, u32) {
        match self {
            SeniorityBucket::NoExperience => (0, 1),
            SeniorityBucket::UnderSixMonths => (1, 6),
            SeniorityBucket::UnderTwoYears => (6, 24),
            SeniorityBucket::UnderFiveYears => (24, 60),
            SeniorityBucket::UnderTenYears => (60, 120),
            SeniorityBucket::TenPlusYears => (120, OPEN_ENDED_MONTHS + 1),
        }
    }

    pub fn from_months(months: u32) -> Self {
        for bucket in Self::ALL {
            let (start, end) = bucket.month_range();
            if months >= start && months < end {
                return bucket;
            }
        }
        SeniorityBucket::TenPlusYears
    }

    pub fn code(self) -> f64 {
        Self::ALL.iter().position(|b| *b == self).unwrap_or(0) as f64
    }

    /// Feature-name suffix shared by the total- and last-seniority one-hots.
    pub fn feature_suffix(self) -> &'static str {
        match self {
            SeniorityBucket::NoExperience => "none",
            SeniorityBucket::UnderSixMonths => "lt6m",
            SeniorityBucket::UnderTwoYears => "lt2y",
            SeniorityBucket::UnderFiveYears => "lt5y",
            SeniorityBucket::UnderTenYears => "lt10y",
            SeniorityBucket::TenPlusYears => "ge10y",
        }
    }
}

/// Whole months elapsed from `start` to `asof` (0 when `start` is in the future).
pub fn months_between(start: NaiveDate, asof: NaiveDate) -> u32 {
    if start >= asof {
        return 0;
    }
    let mut months =
        (asof.year() - start.year()) * 12 + (asof.month() as i32 - start.month() as i32);
    if asof.day() < start.day() {
        months -= 1;
    }
    months.max(0) as u32
}

/// Last-job seniority in months given the job start date, if any.
pub fn last_seniority_months(job_start: Option<NaiveDate>, asof: NaiveDate) -> Option<u32> {
    job_start.map(|d| months_between(d, asof))
}

/// Full years between a birth date and the as-of date.
pub fn age_years(birth: NaiveDate, asof: NaiveDate) -> u32 {
    months_between(birth, asof) / 12
}

/// Legal maximum of total work-seniority in months (working age starts at 16).
pub fn max_seniority_months(birth: NaiveDate, asof: NaiveDate) -> u32 {
    months_between(birth, asof).saturating_sub(16 * 12)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn band_month_ranges_are_contiguous() {
        let mut expected_start = 0;
        for band in SeniorityBand::ALL {
            let (start, end) = band.month_range();
            assert_eq!(start, expected_start, "gap before {band:?}");
            assert!(end > start);
            expected_start = end;
        }
    }

    #[test]
    fn months_round_trip_through_bands() {
        for months in [0, 1, 3, 4, 5, 6, 11, 12, 23, 24, 60, 119, 120, 500] {
            let band = SeniorityBand::from_months(months);
            let (start, end) = band.month_range();
            assert!(months >= start && months < end);
        }
    }

    #[test]
    fn representative_months_is_range_maximum() {
        assert_eq!(SeniorityBand::NoExperience.months(), 0);
        assert_eq!(SeniorityBand::UnderFourMonths.months(), 3);
        assert_eq!(SeniorityBand::OneToTwoYears.months(), 23);
        assert_eq!(SeniorityBand::TenPlusYears.months(), 999);
    }

    #[test]
    fn coarse_buckets() {
        assert_eq!(SeniorityBucket::from_months(0), SeniorityBucket::NoExperience);
        assert_eq!(SeniorityBucket::from_months(5), SeniorityBucket::UnderSixMonths);
        assert_eq!(SeniorityBucket::from_months(6), SeniorityBucket::UnderTwoYears);
        assert_eq!(SeniorityBucket::from_months(59), SeniorityBucket::UnderFiveYears);
        assert_eq!(SeniorityBucket::from_months(119), SeniorityBucket::UnderTenYears);
        assert_eq!(SeniorityBucket::from_months(120), SeniorityBucket::TenPlusYears);
        assert_eq!(SeniorityBand::OneToTwoYears.bucket(), SeniorityBucket::UnderTwoYears);
    }

    #[test]
    fn months_between_respects_day_of_month() {
        let asof = date(2024, 6, 15);
        assert_eq!(months_between(date(2024, 3, 15), asof), 3);
        assert_eq!(months_between(date(2024, 3, 16), asof), 2);
        assert_eq!(months_between(date(2024, 7, 1), asof), 0);
    }

    #[test]
    fn age_and_max_seniority() {
        let asof = date(2024, 1, 1);
        let birth = date(1990, 1, 1);
        assert_eq!(age_years(birth, asof), 34);
        assert_eq!(max_seniority_months(birth, asof), (34 - 16) * 12);

        let minor = date(2010, 6, 1);
        assert_eq!(max_seniority_months(minor, asof), 0);
    }
}
