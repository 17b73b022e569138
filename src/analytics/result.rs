//! Typed aggregation results.
//!
//! Every operation has its own result shape. All of them serialize to the
//! flat JSON mapping returned to callers and render to `key: value` lines for
//! the narration prompt.

use itertools::Itertools;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::cmp::Ordering;

const UNDEFINED: &str = "undefined (no denials)";

/// Category → value pairs ordered by descending value.
#[derive(Debug, Clone, PartialEq)]
pub struct Ranking<V> {
    entries: Vec<(String, V)>,
}

impl<V: PartialOrd + Copy> Ranking<V> {
    /// Sorts descending by value; ties fall back to ascending key.
    pub fn descending(entries: Vec<(String, V)>) -> Self {
        let entries = entries
            .into_iter()
            .sorted_by(|a, b| {
                b.1.partial_cmp(&a.1)
                    .unwrap_or(Ordering::Equal)
                    .then_with(|| a.0.cmp(&b.0))
            })
            .collect();
        Self { entries }
    }

    pub fn get(&self, key: &str) -> Option<V> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| *v)
    }
}

impl<V> Ranking<V> {
    pub fn entries(&self) -> &[(String, V)] {
        &self.entries
    }

    pub fn keys(&self) -> Vec<&str> {
        self.entries.iter().map(|(k, _)| k.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V: Serialize> Serialize for Ranking<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SheetShape {
    pub rows: usize,
    pub columns: Vec<String>,
}

/// Sheet name → shape, in dataset order.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetOverview {
    pub sheets: Vec<(String, SheetShape)>,
}

impl Serialize for DatasetOverview {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.sheets.len()))?;
        for (name, shape) in &self.sheets {
            map.serialize_entry(name, shape)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: Option<String>,
    pub end: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DenialsSummary {
    pub total_denials: u64,
    pub date_range: DateRange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareKind {
    Authorization,
    Preventable,
    Appealed,
}

impl ShareKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            ShareKind::Authorization => "authorization",
            ShareKind::Preventable => "preventable",
            ShareKind::Appealed => "appealed",
        }
    }
}

/// Share of distinct denials matching a condition.
///
/// `percentage` is `None` when there are no denials at all.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DenialShare {
    pub kind: ShareKind,
    pub matching: u64,
    pub total: u64,
    pub percentage: Option<f64>,
}

impl DenialShare {
    pub fn new(kind: ShareKind, matching: u64, total: u64) -> Self {
        Self {
            kind,
            matching,
            total,
            percentage: percentage_of(matching, total),
        }
    }

    fn matching_key(&self) -> String {
        format!("{}_denials", self.kind.prefix())
    }

    fn percentage_key(&self) -> String {
        format!("{}_percentage", self.kind.prefix())
    }
}

impl Serialize for DenialShare {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(3))?;
        map.serialize_entry(&self.matching_key(), &self.matching)?;
        map.serialize_entry("total_denials", &self.total)?;
        map.serialize_entry(&self.percentage_key(), &self.percentage)?;
        map.end()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TotalDeniedAmount {
    pub total_denied_amount: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TotalRecoveredAmount {
    pub total_recovered_amount: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AverageDenialAge {
    pub average_denial_age_days: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AnalyticsResult {
    DatasetOverview(DatasetOverview),
    TopDenialCategories(Ranking<u64>),
    DenialsSummary(DenialsSummary),
    AuthorizationDenialPercentage(DenialShare),
    TotalDeniedAmount(TotalDeniedAmount),
    FinancialImpactByDenialCategory(Ranking<f64>),
    PreventableDenialPercentage(DenialShare),
    ArBalanceByPayer(Ranking<f64>),
    AppealedDenialPercentage(DenialShare),
    TotalRecoveredAmount(TotalRecoveredAmount),
    TopPreventableDepartment(Ranking<u64>),
    AverageDenialAge(AverageDenialAge),
}

impl AnalyticsResult {
    /// Every key/value pair of the result as text, in result order.
    pub fn key_values(&self) -> Vec<(String, String)> {
        match self {
            AnalyticsResult::DatasetOverview(overview) => overview
                .sheets
                .iter()
                .map(|(name, shape)| {
                    (
                        name.clone(),
                        format!("{} rows; columns: {}", shape.rows, shape.columns.join(", ")),
                    )
                })
                .collect(),
            AnalyticsResult::TopDenialCategories(ranking)
            | AnalyticsResult::TopPreventableDepartment(ranking) => ranking
                .entries()
                .iter()
                .map(|(k, v)| (k.clone(), v.to_string()))
                .collect(),
            AnalyticsResult::FinancialImpactByDenialCategory(ranking)
            | AnalyticsResult::ArBalanceByPayer(ranking) => ranking
                .entries()
                .iter()
                .map(|(k, v)| (k.clone(), format_amount(*v)))
                .collect(),
            AnalyticsResult::DenialsSummary(summary) => vec![
                ("total_denials".to_string(), summary.total_denials.to_string()),
                (
                    "date_range".to_string(),
                    format!(
                        "start={}, end={}",
                        summary.date_range.start.as_deref().unwrap_or("unknown"),
                        summary.date_range.end.as_deref().unwrap_or("unknown")
                    ),
                ),
            ],
            AnalyticsResult::AuthorizationDenialPercentage(share)
            | AnalyticsResult::PreventableDenialPercentage(share)
            | AnalyticsResult::AppealedDenialPercentage(share) => vec![
                (share.matching_key(), share.matching.to_string()),
                ("total_denials".to_string(), share.total.to_string()),
                (share.percentage_key(), format_optional(share.percentage)),
            ],
            AnalyticsResult::TotalDeniedAmount(total) => vec![(
                "total_denied_amount".to_string(),
                format_amount(total.total_denied_amount),
            )],
            AnalyticsResult::TotalRecoveredAmount(total) => vec![(
                "total_recovered_amount".to_string(),
                format_amount(total.total_recovered_amount),
            )],
            AnalyticsResult::AverageDenialAge(age) => vec![(
                "average_denial_age_days".to_string(),
                format_optional(age.average_denial_age_days),
            )],
        }
    }
}

/// Rounds half away from zero to 2 decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn percentage_of(part: u64, total: u64) -> Option<f64> {
    if total == 0 {
        None
    } else {
        Some(round2(part as f64 / total as f64 * 100.0))
    }
}

fn format_amount(value: f64) -> String {
    format!("{:.2}", value)
}

fn format_optional(value: Option<f64>) -> String {
    value.map(format_amount).unwrap_or_else(|| UNDEFINED.to_string())
}
