//! Question Classifier
//!
//! Routes a free-text question to one aggregation using an ordered table of
//! substring rules. The first rule whose conditions all hold wins, so more
//! specific rules must come before the generic ones they overlap with.

use crate::analytics::{Operation, OperationKind};

/// Pins the payer filter when `keyword` appears in the question.
#[derive(Debug, Clone, Copy)]
pub struct PayerHint {
    pub keyword: &'static str,
    pub payer: &'static str,
}

#[derive(Debug, Clone, Copy)]
pub struct RoutingRule {
    /// Every group must match; a group matches when any of its substrings is present.
    pub all_of: &'static [&'static [&'static str]],
    pub operation: OperationKind,
    pub payer_hints: &'static [PayerHint],
}

impl RoutingRule {
    /// `question` must already be lower-cased.
    pub fn matches(&self, question: &str) -> bool {
        self.all_of
            .iter()
            .all(|group| group.iter().any(|needle| question.contains(needle)))
    }

    fn resolve(&self, question: &str) -> Operation {
        let payer = self
            .payer_hints
            .iter()
            .find(|hint| question.contains(hint.keyword))
            .map(|hint| hint.payer.to_string());
        self.operation.with_payer(payer)
    }
}

pub const ROUTING_RULES: &[RoutingRule] = &[
    RoutingRule {
        all_of: &[&["ar balance"]],
        operation: OperationKind::ArBalanceByPayer,
        payer_hints: &[],
    },
    RoutingRule {
        all_of: &[&["denied amount", "denial amount"]],
        operation: OperationKind::TotalDeniedAmount,
        payer_hints: &[],
    },
    RoutingRule {
        all_of: &[&["financial impact"], &["denial"]],
        operation: OperationKind::FinancialImpactByDenialCategory,
        payer_hints: &[],
    },
    RoutingRule {
        all_of: &[&["preventable"], &["denial"]],
        operation: OperationKind::PreventableDenialPercentage,
        payer_hints: &[],
    },
    RoutingRule {
        all_of: &[&["percentage"], &["authorization"]],
        operation: OperationKind::AuthorizationDenialPercentage,
        payer_hints: &[],
    },
    RoutingRule {
        all_of: &[&["top"], &["denial"]],
        operation: OperationKind::TopDenialCategories,
        payer_hints: &[PayerHint {
            keyword: "bcbs",
            payer: "BCBS",
        }],
    },
    RoutingRule {
        all_of: &[&["how many"], &["denial"]],
        operation: OperationKind::DenialsSummary,
        payer_hints: &[],
    },
    RoutingRule {
        all_of: &[&["dataset"]],
        operation: OperationKind::DatasetOverview,
        payer_hints: &[],
    },
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Aggregate(Operation),
    /// No rule matched; answered by the completion service alone.
    General,
}

pub fn classify(question: &str) -> Route {
    classify_with(ROUTING_RULES, question)
}

pub fn classify_with(rules: &[RoutingRule], question: &str) -> Route {
    let lowered = question.to_lowercase();
    rules
        .iter()
        .find(|rule| rule.matches(&lowered))
        .map(|rule| Route::Aggregate(rule.resolve(&lowered)))
        .unwrap_or(Route::General)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn routed(question: &str) -> Operation {
        match classify(question) {
            Route::Aggregate(op) => op,
            Route::General => panic!("expected '{}' to route to an aggregation", question),
        }
    }

    #[test]
    fn test_each_rule_routes() {
        assert_eq!(routed("What is the AR balance by payer?"), Operation::ArBalanceByPayer);
        assert_eq!(routed("Total denied amount?"), Operation::TotalDeniedAmount);
        assert_eq!(routed("What's the denial amount this year"), Operation::TotalDeniedAmount);
        assert_eq!(
            routed("Financial impact of each denial category"),
            Operation::FinancialImpactByDenialCategory
        );
        assert_eq!(
            routed("What share of denials were preventable?"),
            Operation::PreventableDenialPercentage
        );
        assert_eq!(
            routed("Percentage of authorization denials"),
            Operation::AuthorizationDenialPercentage
        );
        assert_eq!(
            routed("Top denial categories"),
            Operation::TopDenialCategories { payer: None }
        );
        assert_eq!(routed("How many denials are there?"), Operation::DenialsSummary);
        assert_eq!(routed("Describe the dataset"), Operation::DatasetOverview);
    }

    #[test]
    fn test_bcbs_pins_payer_filter() {
        assert_eq!(
            routed("top denial reasons for bcbs"),
            Operation::TopDenialCategories {
                payer: Some("BCBS".to_string())
            }
        );
    }

    #[test]
    fn test_preventable_takes_precedence_over_top() {
        assert_eq!(
            routed("top preventable denial departments"),
            Operation::PreventableDenialPercentage
        );
    }

    #[test]
    fn test_ar_balance_wins_over_everything_else() {
        assert_eq!(
            routed("Top denial payers by AR balance in the dataset"),
            Operation::ArBalanceByPayer
        );
    }

    #[test]
    fn test_unmatched_question_is_general() {
        assert_eq!(classify("What's the weather today?"), Route::General);
        assert_eq!(classify(""), Route::General);
        // "denial" alone is not enough for any rule
        assert_eq!(classify("Explain what a denial is"), Route::General);
    }

    #[test]
    fn test_classification_is_case_insensitive_and_idempotent() {
        let question = "HOW MANY DENIALS ARE THERE?";
        let first = classify(question);
        assert_eq!(first, classify(question));
        assert_eq!(first, classify(&question.to_lowercase()));
        assert_eq!(first, Route::Aggregate(Operation::DenialsSummary));
    }

    #[test]
    fn test_custom_rule_table() {
        let rules = [RoutingRule {
            all_of: &[&["recovered"]],
            operation: OperationKind::TotalRecoveredAmount,
            payer_hints: &[],
        }];
        assert_eq!(
            classify_with(&rules, "How much was recovered?"),
            Route::Aggregate(Operation::TotalRecoveredAmount)
        );
        assert_eq!(classify_with(&rules, "AR balance"), Route::General);
    }
}
