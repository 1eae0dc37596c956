//! Payloads of the statistics reports.

use serde::Serialize;

use crate::db::Document;

/// Number of records sharing one value of the grouped field(s).
///
/// Serialized flat: `{"subject": "Math", "count": 3}`.
#[derive(Debug, Clone, Serialize)]
pub struct GroupCount {
    #[serde(flatten)]
    pub key: Document,
    pub count: i64,
}

/// Total with male/female sub-counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GenderBreakdown {
    pub total: i64,
    pub male: i64,
    pub female: i64,
}

/// One group of a gender-split report, e.g. `{"className": "9", "religion": "Islam",
/// "total": 12, "male": 7, "female": 5}`.
#[derive(Debug, Clone, Serialize)]
pub struct Breakdown {
    #[serde(flatten)]
    pub key: Document,
    #[serde(flatten)]
    pub counts: GenderBreakdown,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct ReligionCounts {
    pub islam: i64,
    pub hinduism: i64,
}

/// Headline numbers for the dashboard.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub teachers: GenderBreakdown,
    pub support_staff: GenderBreakdown,
    pub students: GenderBreakdown,
    pub religion: ReligionCounts,
}
