//! Aggregations over the denials sheet and the joined denial-claim view.

use super::frame::{
    distinct_count, distinct_counts_by, flagged_rows, mean_amount, sums_by, text_mask,
    total_amount, JoinedDenialClaims,
};
use super::result::{
    AverageDenialAge, DateRange, DenialShare, DenialsSummary, Ranking, ShareKind,
    TotalDeniedAmount, TotalRecoveredAmount,
};
use crate::dataset::schema::*;
use crate::dataset::Sheet;
use crate::error::Result;
use chrono::{NaiveDate, NaiveDateTime};
use polars::prelude::*;
use tracing::warn;

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%m/%d/%Y"];
const DATETIME_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
];

pub fn top_denial_categories(
    joined: &JoinedDenialClaims,
    payer: Option<&str>,
) -> Result<Ranking<u64>> {
    let frame = joined.frame();

    let filtered = match payer {
        Some(payer) => {
            let needle = payer.to_uppercase();
            let mask = text_mask(frame, PAYER_NAME, |name| {
                name.to_uppercase().contains(&needle)
            })?;
            frame.filter(&mask)?
        }
        None => frame.clone(),
    };

    distinct_counts_by(&filtered, DENIAL_CATEGORY, DENIAL_ID)
}

pub fn denials_summary(denials: &Sheet) -> Result<DenialsSummary> {
    denials.require_columns(&[DENIAL_ID, DENIAL_DATE])?;
    let frame = denials.frame();

    Ok(DenialsSummary {
        total_denials: distinct_count(frame, DENIAL_ID)?,
        date_range: date_range(frame, DENIAL_DATE)?,
    })
}

pub fn authorization_denial_percentage(denials: &Sheet) -> Result<DenialShare> {
    denials.require_columns(&[DENIAL_ID, DENIAL_CATEGORY])?;
    let frame = denials.frame();

    let total = distinct_count(frame, DENIAL_ID)?;
    let mask = text_mask(frame, DENIAL_CATEGORY, |category| category == AUTHORIZATION_CATEGORY)?;
    let authorization = distinct_count(&frame.filter(&mask)?, DENIAL_ID)?;

    Ok(DenialShare::new(ShareKind::Authorization, authorization, total))
}

pub fn preventable_denial_percentage(denials: &Sheet) -> Result<DenialShare> {
    flagged_share(denials, PREVENTABLE_FLAG, ShareKind::Preventable)
}

pub fn appealed_denial_percentage(denials: &Sheet) -> Result<DenialShare> {
    flagged_share(denials, APPEAL_FILED, ShareKind::Appealed)
}

fn flagged_share(denials: &Sheet, flag_column: &str, kind: ShareKind) -> Result<DenialShare> {
    denials.require_columns(&[DENIAL_ID, flag_column])?;
    let frame = denials.frame();

    let total = distinct_count(frame, DENIAL_ID)?;
    let flagged = distinct_count(&flagged_rows(frame, flag_column)?, DENIAL_ID)?;

    Ok(DenialShare::new(kind, flagged, total))
}

pub fn total_denied_amount(denials: &Sheet) -> Result<TotalDeniedAmount> {
    denials.require_numeric(&[EXPECTED_RECOVERY])?;
    Ok(TotalDeniedAmount {
        total_denied_amount: total_amount(denials.frame(), EXPECTED_RECOVERY)?,
    })
}

pub fn financial_impact_by_denial_category(denials: &Sheet) -> Result<Ranking<f64>> {
    denials.require_columns(&[DENIAL_CATEGORY])?;
    denials.require_numeric(&[EXPECTED_RECOVERY])?;
    sums_by(denials.frame(), DENIAL_CATEGORY, EXPECTED_RECOVERY)
}

pub fn total_recovered_amount(denials: &Sheet) -> Result<TotalRecoveredAmount> {
    denials.require_numeric(&[RECOVERED_AMOUNT])?;
    Ok(TotalRecoveredAmount {
        total_recovered_amount: total_amount(denials.frame(), RECOVERED_AMOUNT)?,
    })
}

pub fn top_preventable_department(denials: &Sheet) -> Result<Ranking<u64>> {
    denials.require_columns(&[DENIAL_ID, PREVENTABLE_FLAG, DEPARTMENT_AT_FAULT])?;
    let preventable = flagged_rows(denials.frame(), PREVENTABLE_FLAG)?;
    distinct_counts_by(&preventable, DEPARTMENT_AT_FAULT, DENIAL_ID)
}

pub fn average_denial_age(denials: &Sheet) -> Result<AverageDenialAge> {
    denials.require_numeric(&[DENIAL_AGE_DAYS])?;
    Ok(AverageDenialAge {
        average_denial_age_days: mean_amount(denials.frame(), DENIAL_AGE_DAYS)?,
    })
}

/// Earliest and latest parseable date in `column`, as `YYYY-MM-DD`.
fn date_range(frame: &DataFrame, column: &str) -> Result<DateRange> {
    let as_text = frame.column(column)?.cast(&DataType::String)?;

    let mut unparsed = 0usize;
    let mut bounds: Option<(NaiveDate, NaiveDate)> = None;
    for value in as_text.str()?.into_iter().flatten() {
        match parse_date(value) {
            Some(date) => {
                bounds = Some(match bounds {
                    Some((start, end)) => (start.min(date), end.max(date)),
                    None => (date, date),
                });
            }
            None => unparsed += 1,
        }
    }

    if unparsed > 0 {
        warn!("Skipped {} unparseable values in '{}'", unparsed, column);
    }

    Ok(DateRange {
        start: bounds.map(|(start, _)| start.format("%Y-%m-%d").to_string()),
        end: bounds.map(|(_, end)| end.format("%Y-%m-%d").to_string()),
    })
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
                .map(|dt| dt.date())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn denials_sheet() -> Sheet {
        let frame = df![
            "denial_id" => ["D1", "D2", "D3", "D4", "D4"],
            "claim_id" => ["C1", "C2", "C3", "C4", "C4"],
            "denial_category" => [
                "Authorization",
                "Coding",
                "Authorization",
                "Eligibility",
                "Eligibility"
            ],
            "preventable_flag" => [Some("Y"), Some(" n"), Some("y "), None, None],
            "appeal_filed" => [Some("N"), Some("Y"), None, Some("Y"), Some("Y")],
            "expected_recovery" => [Some(100.0), Some(250.5), None, Some(40.0), Some(40.0)],
            "recovered_amount" => [Some(10.0), None, Some(5.25), None, None],
            "denial_age_days" => [Some(10.0), Some(20.0), None, Some(30.0), Some(30.0)],
            "department_at_fault" => [
                Some("Front Desk"),
                Some("Coding"),
                Some("Front Desk"),
                None,
                None
            ],
            "denial_date" => [
                "2024-03-15",
                "2024-01-02",
                "not a date",
                "2024-05-31 08:00:00",
                "2024-05-31 08:00:00"
            ]
        ]
        .unwrap();
        Sheet::new(DENIALS_SHEET, frame)
    }

    #[test]
    fn test_denials_summary_counts_distinct_ids() {
        let summary = denials_summary(&denials_sheet()).unwrap();
        assert_eq!(summary.total_denials, 4);
        assert_eq!(summary.date_range.start.as_deref(), Some("2024-01-02"));
        assert_eq!(summary.date_range.end.as_deref(), Some("2024-05-31"));
    }

    #[test]
    fn test_authorization_percentage() {
        let share = authorization_denial_percentage(&denials_sheet()).unwrap();
        assert_eq!(share.matching, 2);
        assert_eq!(share.total, 4);
        assert_eq!(share.percentage, Some(50.0));
    }

    #[test]
    fn test_preventable_percentage_normalizes_flags() {
        let share = preventable_denial_percentage(&denials_sheet()).unwrap();
        assert_eq!(share.kind, ShareKind::Preventable);
        assert_eq!(share.matching, 2);
        assert_eq!(share.percentage, Some(50.0));
    }

    #[test]
    fn test_appealed_percentage_counts_duplicated_denial_once() {
        let share = appealed_denial_percentage(&denials_sheet()).unwrap();
        assert_eq!(share.matching, 2);
        assert_eq!(share.percentage, Some(50.0));
    }

    #[test]
    fn test_total_amounts() {
        let denied = total_denied_amount(&denials_sheet()).unwrap();
        assert_eq!(denied.total_denied_amount, 430.5);

        let recovered = total_recovered_amount(&denials_sheet()).unwrap();
        assert_eq!(recovered.total_recovered_amount, 15.25);
    }

    #[test]
    fn test_financial_impact_by_category() {
        let ranking = financial_impact_by_denial_category(&denials_sheet()).unwrap();
        assert_eq!(ranking.keys(), vec!["Coding", "Authorization", "Eligibility"]);
        assert_eq!(ranking.get("Authorization"), Some(100.0));
        assert_eq!(ranking.get("Eligibility"), Some(80.0));
    }

    #[test]
    fn test_top_preventable_department() {
        let ranking = top_preventable_department(&denials_sheet()).unwrap();
        assert_eq!(ranking.keys(), vec!["Front Desk"]);
        assert_eq!(ranking.get("Front Desk"), Some(2));
    }

    #[test]
    fn test_average_denial_age_counts_nulls_as_zero() {
        let age = average_denial_age(&denials_sheet()).unwrap();
        assert_eq!(age.average_denial_age_days, Some(18.0));
    }

    #[test]
    fn test_all_null_expected_recovery_totals_zero() {
        let frame = df![
            "denial_id" => ["D1", "D2"],
            "expected_recovery" => [None::<f64>, None]
        ]
        .unwrap();
        let total = total_denied_amount(&Sheet::new(DENIALS_SHEET, frame)).unwrap();
        assert_eq!(total.total_denied_amount, 0.0);
    }

    #[test]
    fn test_empty_denials_have_undefined_percentages() {
        let frame = df![
            "denial_id" => Vec::<&str>::new(),
            "denial_category" => Vec::<&str>::new(),
            "preventable_flag" => Vec::<&str>::new(),
            "denial_age_days" => Vec::<f64>::new()
        ]
        .unwrap();
        let sheet = Sheet::new(DENIALS_SHEET, frame);

        assert_eq!(authorization_denial_percentage(&sheet).unwrap().percentage, None);
        assert_eq!(preventable_denial_percentage(&sheet).unwrap().percentage, None);
        assert_eq!(average_denial_age(&sheet).unwrap().average_denial_age_days, None);
    }

    #[test]
    fn test_missing_column_is_data_unavailable() {
        let frame = df!["denial_id" => ["D1"]].unwrap();
        let sheet = Sheet::new(DENIALS_SHEET, frame);
        assert!(matches!(
            total_recovered_amount(&sheet),
            Err(crate::error::AnalyticsError::DataUnavailable(_))
        ));
    }

    #[test]
    fn test_malformed_amounts_are_data_unavailable() {
        let frame = df![
            "denial_id" => ["D1", "D2", "D3", "D4"],
            "denial_category" => ["Coding", "Coding", "Authorization", "Coding"],
            "expected_recovery" => [Some("100.0"), Some("$1,200.00"), Some("N/A"), None],
            "recovered_amount" => [Some("5"), None, Some("n/a"), None],
            "denial_age_days" => [Some("12"), Some("unknown"), None, None]
        ]
        .unwrap();
        let sheet = Sheet::new(DENIALS_SHEET, frame);

        match total_denied_amount(&sheet) {
            Err(crate::error::AnalyticsError::DataUnavailable(msg)) => {
                assert!(msg.contains(DENIALS_SHEET));
                assert!(msg.contains(EXPECTED_RECOVERY));
            }
            other => panic!("expected DataUnavailable, got {:?}", other),
        }
        assert!(matches!(
            financial_impact_by_denial_category(&sheet),
            Err(crate::error::AnalyticsError::DataUnavailable(_))
        ));
        assert!(matches!(
            total_recovered_amount(&sheet),
            Err(crate::error::AnalyticsError::DataUnavailable(_))
        ));
        assert!(matches!(
            average_denial_age(&sheet),
            Err(crate::error::AnalyticsError::DataUnavailable(_))
        ));
    }

    #[test]
    fn test_numeric_text_amounts_are_summed() {
        let frame = df![
            "denial_id" => ["D1", "D2", "D3"],
            "expected_recovery" => [Some("100.0"), Some("250.5"), None]
        ]
        .unwrap();
        let total = total_denied_amount(&Sheet::new(DENIALS_SHEET, frame)).unwrap();
        assert_eq!(total.total_denied_amount, 350.5);
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 6, 30);
        assert_eq!(parse_date("2024-06-30"), expected);
        assert_eq!(parse_date("06/30/2024"), expected);
        assert_eq!(parse_date("2024-06-30T12:00:00"), expected);
        assert_eq!(parse_date("2024-06-30 00:00:00.000"), expected);
        assert_eq!(parse_date("June 30"), None);
    }
}
