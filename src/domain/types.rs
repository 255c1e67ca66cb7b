//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory while chaining stages
//! - round-tripped through the semicolon-delimited stage CSV files
//! - embedded in model/scaler JSON files
//!
//! Raw dataset labels (mostly Russian application-form vocabulary) are parsed
//! once at ingest; everything downstream works with typed enums.

use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::domain::SeniorityBand;

/// The five lenders whose approval decisions we model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Lender {
    A,
    B,
    C,
    D,
    E,
}

impl Lender {
    pub const ALL: [Lender; 5] = [Lender::A, Lender::B, Lender::C, Lender::D, Lender::E];

    /// Raw decision column in the source CSV (lower-cased header).
    pub fn raw_decision_column(self) -> &'static str {
        match self {
            Lender::A => "banka_decision",
            Lender::B => "bankb_decision",
            Lender::C => "bankc_decision",
            Lender::D => "bankd_decision",
            Lender::E => "banke_decision",
        }
    }

    /// Target column name in the derived feature frame.
    pub fn target_column(self) -> &'static str {
        match self {
            Lender::A => "decision_a",
            Lender::B => "decision_b",
            Lender::C => "decision_c",
            Lender::D => "decision_d",
            Lender::E => "decision_e",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Lender::A => "A",
            Lender::B => "B",
            Lender::C => "C",
            Lender::D => "D",
            Lender::E => "E",
        }
    }
}

/// A lender's decision on an application.
///
/// The ordinal codes mirror the target encoding used for training:
/// denied = 0, success = 1, error = 2. Rows with `Error` are removed before
/// fitting, so the classifiers are binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Denied,
    Success,
    Error,
}

impl Decision {
    pub fn code(self) -> f64 {
        match self {
            Decision::Denied => 0.0,
            Decision::Success => 1.0,
            Decision::Error => 2.0,
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "denied" => Some(Decision::Denied),
            "success" => Some(Decision::Success),
            "error" => Some(Decision::Error),
            _ => None,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Decision::Denied => "denied",
            Decision::Success => "success",
            Decision::Error => "error",
        }
    }
}

/// Training algorithm for the per-lender classifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TrainMethod {
    /// Logistic regression fitted by IRLS.
    Logreg,
    /// Small feed-forward network (two hidden layers).
    Mlp,
    /// Gradient-boosted decision trees on log-loss.
    Gbdt,
}

impl TrainMethod {
    pub fn display_name(self) -> &'static str {
        match self {
            TrainMethod::Logreg => "logreg",
            TrainMethod::Mlp => "mlp",
            TrainMethod::Gbdt => "gbdt",
        }
    }
}

/// Education as captured on the application form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EducationLevel {
    IncompleteSecondary,
    Secondary,
    Vocational,
    IncompleteHigher,
    HigherSpecialist,
    Bachelor,
    Master,
    MultipleHigher,
}

impl EducationLevel {
    /// Parse the raw form label (Russian vocabulary).
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim() {
            "Неоконченное среднее" => Some(Self::IncompleteSecondary),
            "Среднее" => Some(Self::Secondary),
            "Среднее профессиональное" => Some(Self::Vocational),
            "Неоконченное высшее" => Some(Self::IncompleteHigher),
            "Высшее - специалист" => Some(Self::HigherSpecialist),
            "Бакалавр" => Some(Self::Bachelor),
            "Магистр" => Some(Self::Master),
            "Несколько высших" => Some(Self::MultipleHigher),
            _ => None,
        }
    }

    /// Coarse band used for modeling.
    pub fn band(self) -> EducationBand {
        match self {
            Self::IncompleteSecondary | Self::Secondary | Self::IncompleteHigher => {
                EducationBand::Secondary
            }
            Self::Vocational => EducationBand::Vocational,
            Self::HigherSpecialist | Self::Bachelor | Self::Master | Self::MultipleHigher => {
                EducationBand::Higher
            }
        }
    }
}

/// Coarse education bands (ordinal: secondary < vocational < higher).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EducationBand {
    Secondary,
    Vocational,
    Higher,
}

impl EducationBand {
    pub const ALL: [EducationBand; 3] = [
        EducationBand::Secondary,
        EducationBand::Vocational,
        EducationBand::Higher,
    ];

    pub fn code(self) -> f64 {
        Self::ALL.iter().position(|b| *b == self).unwrap_or(0) as f64
    }

    pub fn feature_name(self) -> &'static str {
        match self {
            EducationBand::Secondary => "education_secondary",
            EducationBand::Vocational => "education_vocational",
            EducationBand::Higher => "education_higher",
        }
    }
}

/// Employment status as captured on the application form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmploymentStatus {
    FullTime,
    PartTime,
    SelfEmployed,
    Pensioner,
    Student,
    MaternityLeave,
    Unemployed,
}

impl EmploymentStatus {
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim() {
            "Работаю по найму полный рабочий день/служу" => Some(Self::FullTime),
            "Работаю по найму неполный рабочий день" => Some(Self::PartTime),
            "Собственное дело" => Some(Self::SelfEmployed),
            "Пенсионер" => Some(Self::Pensioner),
            "Студент" => Some(Self::Student),
            "Декретный отпуск" => Some(Self::MaternityLeave),
            "Не работаю" => Some(Self::Unemployed),
            _ => None,
        }
    }

    /// Coarse employment kind used for modeling.
    pub fn kind(self) -> EmploymentKind {
        match self {
            Self::FullTime | Self::PartTime => EmploymentKind::Employed,
            Self::SelfEmployed => EmploymentKind::SelfEmployed,
            Self::Pensioner | Self::Student | Self::MaternityLeave | Self::Unemployed => {
                EmploymentKind::Other
            }
        }
    }
}

/// Coarse employment kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmploymentKind {
    Employed,
    SelfEmployed,
    Other,
}

impl EmploymentKind {
    pub const ALL: [EmploymentKind; 3] = [
        EmploymentKind::Employed,
        EmploymentKind::SelfEmployed,
        EmploymentKind::Other,
    ];

    pub fn code(self) -> f64 {
        Self::ALL.iter().position(|k| *k == self).unwrap_or(0) as f64
    }

    pub fn feature_name(self) -> &'static str {
        match self {
            EmploymentKind::Employed => "employment_employed",
            EmploymentKind::SelfEmployed => "employment_self",
            EmploymentKind::Other => "employment_other",
        }
    }
}

/// Family status as captured on the application form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FamilyStatus {
    NeverMarried,
    Married,
    CivilUnion,
    Divorced,
    Widowed,
}

impl FamilyStatus {
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim() {
            "Никогда в браке не состоял(а)" => Some(Self::NeverMarried),
            "Женат / замужем" => Some(Self::Married),
            "Гражданский брак / совместное проживание" => Some(Self::CivilUnion),
            "Разведён / Разведена" => Some(Self::Divorced),
            "Вдовец / вдова" => Some(Self::Widowed),
            _ => None,
        }
    }

    /// Whether the household includes a partner (drives the living-wage floor).
    pub fn has_partner(self) -> bool {
        matches!(self, Self::Married | Self::CivilUnion)
    }

    /// Coarse band: civil union folds into married, widowed into divorced.
    pub fn band(self) -> FamilyBand {
        match self {
            Self::NeverMarried => FamilyBand::Single,
            Self::Married | Self::CivilUnion => FamilyBand::Married,
            Self::Divorced | Self::Widowed => FamilyBand::Divorced,
        }
    }
}

/// Coarse family bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FamilyBand {
    Single,
    Married,
    Divorced,
}

impl FamilyBand {
    pub const ALL: [FamilyBand; 3] = [FamilyBand::Single, FamilyBand::Married, FamilyBand::Divorced];

    pub fn code(self) -> f64 {
        Self::ALL.iter().position(|b| *b == self).unwrap_or(0) as f64
    }

    pub fn feature_name(self) -> &'static str {
        match self {
            FamilyBand::Single => "family_single",
            FamilyBand::Married => "family_married",
            FamilyBand::Divorced => "family_divorced",
        }
    }
}

/// Purchased goods category (the source data uses English labels here).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoodsCategory {
    Furniture,
    MobileDevices,
    Travel,
    MedicalServices,
    Education,
    Fitness,
    Other,
}

impl GoodsCategory {
    pub const ALL: [GoodsCategory; 7] = [
        GoodsCategory::Furniture,
        GoodsCategory::MobileDevices,
        GoodsCategory::Travel,
        GoodsCategory::MedicalServices,
        GoodsCategory::Education,
        GoodsCategory::Fitness,
        GoodsCategory::Other,
    ];

    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim() {
            "Furniture" => Some(Self::Furniture),
            "Mobile_devices" => Some(Self::MobileDevices),
            "Travel" => Some(Self::Travel),
            "Medical_services" => Some(Self::MedicalServices),
            "Education" => Some(Self::Education),
            "Fitness" => Some(Self::Fitness),
            "Other" => Some(Self::Other),
            _ => None,
        }
    }

    pub fn code(self) -> f64 {
        Self::ALL.iter().position(|c| *c == self).unwrap_or(0) as f64
    }

    pub fn feature_name(self) -> &'static str {
        match self {
            GoodsCategory::Furniture => "goods_furniture",
            GoodsCategory::MobileDevices => "goods_mobile",
            GoodsCategory::Travel => "goods_travel",
            GoodsCategory::MedicalServices => "goods_medical",
            GoodsCategory::Education => "goods_education",
            GoodsCategory::Fitness => "goods_fitness",
            GoodsCategory::Other => "goods_other",
        }
    }
}

/// Child-count buckets (0 / 1 / 2+).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChildBucket {
    None,
    One,
    TwoPlus,
}

impl ChildBucket {
    pub const ALL: [ChildBucket; 3] = [ChildBucket::None, ChildBucket::One, ChildBucket::TwoPlus];

    pub fn from_count(count: u32) -> Self {
        match count {
            0 => ChildBucket::None,
            1 => ChildBucket::One,
            _ => ChildBucket::TwoPlus,
        }
    }

    pub fn code(self) -> f64 {
        Self::ALL.iter().position(|b| *b == self).unwrap_or(0) as f64
    }

    pub fn feature_name(self) -> &'static str {
        match self {
            ChildBucket::None => "children_none",
            ChildBucket::One => "children_one",
            ChildBucket::TwoPlus => "children_many",
        }
    }
}

/// Valid loan terms (months). Anything else gets an all-zero one-hot.
pub const LOAN_TERMS: [u32; 4] = [6, 12, 18, 24];

/// Merchant codes run 1..=89 in the source data.
pub const MERCH_CODE_MAX: u32 = 89;

/// A raw row of the source CSV (everything optional, everything a string).
///
/// This mirrors the export schema of the upstream application system and lets
/// us do row-level validation with useful error messages before committing to
/// typed values.
#[derive(Debug, Clone, Default)]
pub struct RawRecord {
    pub birth_date: Option<String>,
    pub education: Option<String>,
    pub employment: Option<String>,
    pub seniority: Option<String>,
    pub job_start_date: Option<String>,
    pub monthly_income: Option<String>,
    pub monthly_expense: Option<String>,
    pub gender: Option<String>,
    pub family_status: Option<String>,
    pub child_count: Option<String>,
    pub snils: Option<String>,
    pub loan_amount: Option<String>,
    pub loan_term: Option<String>,
    pub goods_category: Option<String>,
    pub merch_code: Option<String>,
    pub decisions: [Option<String>; 5],
}

impl RawRecord {
    /// True when every field is absent (blank line in the export).
    pub fn is_empty(&self) -> bool {
        self.birth_date.is_none()
            && self.education.is_none()
            && self.employment.is_none()
            && self.seniority.is_none()
            && self.job_start_date.is_none()
            && self.monthly_income.is_none()
            && self.monthly_expense.is_none()
            && self.gender.is_none()
            && self.family_status.is_none()
            && self.child_count.is_none()
            && self.snils.is_none()
            && self.loan_amount.is_none()
            && self.loan_term.is_none()
            && self.goods_category.is_none()
            && self.merch_code.is_none()
            && self.decisions.iter().all(Option::is_none)
    }
}

/// A typed application record, the unit of work for the cleaning stages.
///
/// After `prepare` the required fields are parsed but may still be missing;
/// after `fill-missing` only `job_start_date`, `education`, `goods_category`
/// and `merch_code` may legitimately be `None`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Application {
    pub birth_date: NaiveDate,
    pub education: Option<EducationLevel>,
    pub employment: Option<EmploymentStatus>,
    /// Total work-seniority band as declared on the form.
    pub seniority: Option<SeniorityBand>,
    pub job_start_date: Option<NaiveDate>,
    pub monthly_income: Option<i64>,
    pub monthly_expense: Option<i64>,
    /// Binarized gender flag (raw values > 0 map to 1).
    pub gender: Option<u8>,
    pub family_status: Option<FamilyStatus>,
    pub child_count: Option<u32>,
    /// Whether a SNILS number was supplied.
    pub has_snils: Option<u8>,
    pub loan_amount: Option<i64>,
    pub loan_term: Option<u32>,
    pub goods_category: Option<GoodsCategory>,
    pub merch_code: Option<u32>,
    pub decision_a: Option<Decision>,
    pub decision_b: Option<Decision>,
    pub decision_c: Option<Decision>,
    pub decision_d: Option<Decision>,
    pub decision_e: Option<Decision>,
}

impl Application {
    pub fn decision(&self, lender: Lender) -> Option<Decision> {
        match lender {
            Lender::A => self.decision_a,
            Lender::B => self.decision_b,
            Lender::C => self.decision_c,
            Lender::D => self.decision_d,
            Lender::E => self.decision_e,
        }
    }

    /// Whether the applicant currently earns a salary.
    ///
    /// Requires a job start date and an employment status other than
    /// "unemployed" (a stale start date with no job means no income).
    pub fn has_income(&self) -> bool {
        self.job_start_date.is_some() && self.employment != Some(EmploymentStatus::Unemployed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decision_labels_round_trip() {
        for d in [Decision::Denied, Decision::Success, Decision::Error] {
            assert_eq!(Decision::from_label(d.display_name()), Some(d));
        }
        assert_eq!(Decision::from_label(" SUCCESS "), Some(Decision::Success));
        assert_eq!(Decision::from_label("approved"), None);
    }

    #[test]
    fn education_bands_coarsen_as_expected() {
        assert_eq!(
            EducationLevel::from_label("Бакалавр").map(EducationLevel::band),
            Some(EducationBand::Higher)
        );
        assert_eq!(
            EducationLevel::from_label("Неоконченное высшее").map(EducationLevel::band),
            Some(EducationBand::Secondary)
        );
        assert_eq!(
            EducationLevel::from_label("Среднее профессиональное").map(EducationLevel::band),
            Some(EducationBand::Vocational)
        );
    }

    #[test]
    fn family_partner_flag() {
        assert!(FamilyStatus::Married.has_partner());
        assert!(FamilyStatus::CivilUnion.has_partner());
        assert!(!FamilyStatus::Widowed.has_partner());
        assert_eq!(FamilyStatus::Widowed.band(), FamilyBand::Divorced);
        assert_eq!(FamilyStatus::CivilUnion.band(), FamilyBand::Married);
    }

    #[test]
    fn child_buckets() {
        assert_eq!(ChildBucket::from_count(0), ChildBucket::None);
        assert_eq!(ChildBucket::from_count(1), ChildBucket::One);
        assert_eq!(ChildBucket::from_count(5), ChildBucket::TwoPlus);
    }

    #[test]
    fn employment_kinds() {
        assert_eq!(
            EmploymentStatus::from_label("Работаю по найму неполный рабочий день")
                .map(EmploymentStatus::kind),
            Some(EmploymentKind::Employed)
        );
        assert_eq!(
            EmploymentStatus::from_label("Декретный отпуск").map(EmploymentStatus::kind),
            Some(EmploymentKind::Other)
        );
    }
}
