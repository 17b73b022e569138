//! Aggregation Library
//!
//! The fixed catalogue of RCM aggregations. Each operation is pure and
//! deterministic: it reads sheets through a [`TabularSource`] and returns a
//! typed [`AnalyticsResult`].

pub mod claims;
pub mod denials;
pub mod frame;
pub mod overview;
pub mod result;

use crate::dataset::schema::{CLAIM_FINANCIALS_SHEET, DENIALS_SHEET};
use crate::dataset::TabularSource;
use crate::error::Result;
use std::fmt;
use std::str::FromStr;
use tracing::info;

pub use frame::JoinedDenialClaims;
pub use result::{
    AnalyticsResult, AverageDenialAge, DatasetOverview, DateRange, DenialShare, DenialsSummary,
    Ranking, ShareKind, SheetShape, TotalDeniedAmount, TotalRecoveredAmount,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    DatasetOverview,
    TopDenialCategories,
    DenialsSummary,
    AuthorizationDenialPercentage,
    TotalDeniedAmount,
    FinancialImpactByDenialCategory,
    PreventableDenialPercentage,
    ArBalanceByPayer,
    AppealedDenialPercentage,
    TotalRecoveredAmount,
    TopPreventableDepartment,
    AverageDenialAge,
}

impl OperationKind {
    pub const ALL: [OperationKind; 12] = [
        OperationKind::DatasetOverview,
        OperationKind::TopDenialCategories,
        OperationKind::DenialsSummary,
        OperationKind::AuthorizationDenialPercentage,
        OperationKind::TotalDeniedAmount,
        OperationKind::FinancialImpactByDenialCategory,
        OperationKind::PreventableDenialPercentage,
        OperationKind::ArBalanceByPayer,
        OperationKind::AppealedDenialPercentage,
        OperationKind::TotalRecoveredAmount,
        OperationKind::TopPreventableDepartment,
        OperationKind::AverageDenialAge,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            OperationKind::DatasetOverview => "dataset_overview",
            OperationKind::TopDenialCategories => "top_denial_categories",
            OperationKind::DenialsSummary => "denials_summary",
            OperationKind::AuthorizationDenialPercentage => "authorization_denial_percentage",
            OperationKind::TotalDeniedAmount => "total_denied_amount",
            OperationKind::FinancialImpactByDenialCategory => "financial_impact_by_denial_category",
            OperationKind::PreventableDenialPercentage => "preventable_denial_percentage",
            OperationKind::ArBalanceByPayer => "ar_balance_by_payer",
            OperationKind::AppealedDenialPercentage => "appealed_denial_percentage",
            OperationKind::TotalRecoveredAmount => "total_recovered_amount",
            OperationKind::TopPreventableDepartment => "top_preventable_department",
            OperationKind::AverageDenialAge => "average_denial_age",
        }
    }

    /// The payer filter only applies to `top_denial_categories`.
    pub fn with_payer(self, payer: Option<String>) -> Operation {
        match self {
            OperationKind::DatasetOverview => Operation::DatasetOverview,
            OperationKind::TopDenialCategories => Operation::TopDenialCategories { payer },
            OperationKind::DenialsSummary => Operation::DenialsSummary,
            OperationKind::AuthorizationDenialPercentage => {
                Operation::AuthorizationDenialPercentage
            }
            OperationKind::TotalDeniedAmount => Operation::TotalDeniedAmount,
            OperationKind::FinancialImpactByDenialCategory => {
                Operation::FinancialImpactByDenialCategory
            }
            OperationKind::PreventableDenialPercentage => Operation::PreventableDenialPercentage,
            OperationKind::ArBalanceByPayer => Operation::ArBalanceByPayer,
            OperationKind::AppealedDenialPercentage => Operation::AppealedDenialPercentage,
            OperationKind::TotalRecoveredAmount => Operation::TotalRecoveredAmount,
            OperationKind::TopPreventableDepartment => Operation::TopPreventableDepartment,
            OperationKind::AverageDenialAge => Operation::AverageDenialAge,
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for OperationKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace('-', "_");
        OperationKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.name() == wanted)
            .ok_or_else(|| {
                format!(
                    "Unknown operation '{}'. Available: {}",
                    s,
                    OperationKind::ALL.map(|k| k.name()).join(", ")
                )
            })
    }
}

/// A fully parameterized aggregation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    DatasetOverview,
    TopDenialCategories { payer: Option<String> },
    DenialsSummary,
    AuthorizationDenialPercentage,
    TotalDeniedAmount,
    FinancialImpactByDenialCategory,
    PreventableDenialPercentage,
    ArBalanceByPayer,
    AppealedDenialPercentage,
    TotalRecoveredAmount,
    TopPreventableDepartment,
    AverageDenialAge,
}

impl Operation {
    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::DatasetOverview => OperationKind::DatasetOverview,
            Operation::TopDenialCategories { .. } => OperationKind::TopDenialCategories,
            Operation::DenialsSummary => OperationKind::DenialsSummary,
            Operation::AuthorizationDenialPercentage => {
                OperationKind::AuthorizationDenialPercentage
            }
            Operation::TotalDeniedAmount => OperationKind::TotalDeniedAmount,
            Operation::FinancialImpactByDenialCategory => {
                OperationKind::FinancialImpactByDenialCategory
            }
            Operation::PreventableDenialPercentage => OperationKind::PreventableDenialPercentage,
            Operation::ArBalanceByPayer => OperationKind::ArBalanceByPayer,
            Operation::AppealedDenialPercentage => OperationKind::AppealedDenialPercentage,
            Operation::TotalRecoveredAmount => OperationKind::TotalRecoveredAmount,
            Operation::TopPreventableDepartment => OperationKind::TopPreventableDepartment,
            Operation::AverageDenialAge => OperationKind::AverageDenialAge,
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind().name()
    }

    /// Loads the sheets this operation needs from `source` and aggregates them.
    pub fn execute<S: TabularSource + ?Sized>(&self, source: &S) -> Result<AnalyticsResult> {
        info!("📊 Running aggregation: {}", self);

        let result = match self {
            Operation::DatasetOverview => {
                let sheets = source.load_all()?;
                AnalyticsResult::DatasetOverview(overview::dataset_overview(&sheets))
            }
            Operation::TopDenialCategories { payer } => {
                let joined = JoinedDenialClaims::build(
                    &source.load(DENIALS_SHEET)?,
                    &source.load(CLAIM_FINANCIALS_SHEET)?,
                )?;
                AnalyticsResult::TopDenialCategories(denials::top_denial_categories(
                    &joined,
                    payer.as_deref(),
                )?)
            }
            Operation::DenialsSummary => AnalyticsResult::DenialsSummary(
                denials::denials_summary(&source.load(DENIALS_SHEET)?)?,
            ),
            Operation::AuthorizationDenialPercentage => {
                AnalyticsResult::AuthorizationDenialPercentage(
                    denials::authorization_denial_percentage(&source.load(DENIALS_SHEET)?)?,
                )
            }
            Operation::TotalDeniedAmount => AnalyticsResult::TotalDeniedAmount(
                denials::total_denied_amount(&source.load(DENIALS_SHEET)?)?,
            ),
            Operation::FinancialImpactByDenialCategory => {
                AnalyticsResult::FinancialImpactByDenialCategory(
                    denials::financial_impact_by_denial_category(&source.load(DENIALS_SHEET)?)?,
                )
            }
            Operation::PreventableDenialPercentage => AnalyticsResult::PreventableDenialPercentage(
                denials::preventable_denial_percentage(&source.load(DENIALS_SHEET)?)?,
            ),
            Operation::ArBalanceByPayer => AnalyticsResult::ArBalanceByPayer(
                claims::ar_balance_by_payer(&source.load(CLAIM_FINANCIALS_SHEET)?)?,
            ),
            Operation::AppealedDenialPercentage => AnalyticsResult::AppealedDenialPercentage(
                denials::appealed_denial_percentage(&source.load(DENIALS_SHEET)?)?,
            ),
            Operation::TotalRecoveredAmount => AnalyticsResult::TotalRecoveredAmount(
                denials::total_recovered_amount(&source.load(DENIALS_SHEET)?)?,
            ),
            Operation::TopPreventableDepartment => AnalyticsResult::TopPreventableDepartment(
                denials::top_preventable_department(&source.load(DENIALS_SHEET)?)?,
            ),
            Operation::AverageDenialAge => AnalyticsResult::AverageDenialAge(
                denials::average_denial_age(&source.load(DENIALS_SHEET)?)?,
            ),
        };

        Ok(result)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::TopDenialCategories { payer: Some(payer) } => {
                write!(f, "{}(payer={})", self.name(), payer)
            }
            _ => f.write_str(self.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_names_round_trip() {
        for kind in OperationKind::ALL {
            assert_eq!(kind.name().parse::<OperationKind>().unwrap(), kind);
            assert_eq!(kind.with_payer(None).kind(), kind);
        }
        assert_eq!(
            "Top-Denial-Categories".parse::<OperationKind>().unwrap(),
            OperationKind::TopDenialCategories
        );
    }

    #[test]
    fn test_unknown_operation_lists_available_names() {
        let err = "denial_forecast".parse::<OperationKind>().unwrap_err();
        assert!(err.contains("denial_forecast"));
        assert!(err.contains("ar_balance_by_payer"));
    }

    #[test]
    fn test_payer_only_kept_for_top_categories() {
        assert_eq!(
            OperationKind::TopDenialCategories.with_payer(Some("BCBS".to_string())),
            Operation::TopDenialCategories {
                payer: Some("BCBS".to_string())
            }
        );
        assert_eq!(
            OperationKind::DenialsSummary.with_payer(Some("BCBS".to_string())),
            Operation::DenialsSummary
        );
    }

    #[test]
    fn test_display_includes_payer_filter() {
        let op = Operation::TopDenialCategories {
            payer: Some("BCBS".to_string()),
        };
        assert_eq!(op.to_string(), "top_denial_categories(payer=BCBS)");
        assert_eq!(Operation::ArBalanceByPayer.to_string(), "ar_balance_by_payer");
    }
}
