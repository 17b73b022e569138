//! Sheet and column names of the RCM dataset.

pub const DENIALS_SHEET: &str = "fact_denials";
pub const CLAIM_FINANCIALS_SHEET: &str = "fact_claim_financials";

// fact_denials
pub const DENIAL_ID: &str = "denial_id";
pub const CLAIM_ID: &str = "claim_id";
pub const DENIAL_CATEGORY: &str = "denial_category";
pub const PREVENTABLE_FLAG: &str = "preventable_flag";
pub const APPEAL_FILED: &str = "appeal_filed";
pub const EXPECTED_RECOVERY: &str = "expected_recovery";
pub const RECOVERED_AMOUNT: &str = "recovered_amount";
pub const DENIAL_AGE_DAYS: &str = "denial_age_days";
pub const DEPARTMENT_AT_FAULT: &str = "department_at_fault";
pub const DENIAL_DATE: &str = "denial_date";

// fact_claim_financials
pub const PAYER_NAME: &str = "payer_name";
pub const AR_BALANCE: &str = "ar_balance";

/// Category value counted by the authorization share.
pub const AUTHORIZATION_CATEGORY: &str = "Authorization";

/// Normalized value of a set flag.
pub const FLAG_SET: &str = "Y";
