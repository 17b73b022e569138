use super::result::{DatasetOverview, SheetShape};
use crate::dataset::Sheet;

/// Row count and column names of every sheet.
pub fn dataset_overview(sheets: &[Sheet]) -> DatasetOverview {
    DatasetOverview {
        sheets: sheets
            .iter()
            .map(|sheet| {
                (
                    sheet.name().to_string(),
                    SheetShape {
                        rows: sheet.row_count(),
                        columns: sheet.column_names(),
                    },
                )
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    #[test]
    fn test_overview_keeps_sheet_order() {
        let denials = Sheet::new("fact_denials", df!["denial_id" => ["D1", "D2"]].unwrap());
        let claims = Sheet::new(
            "fact_claim_financials",
            df!["claim_id" => ["C1"], "ar_balance" => [10.0]].unwrap(),
        );

        let overview = dataset_overview(&[denials, claims]);
        assert_eq!(overview.sheets.len(), 2);
        assert_eq!(overview.sheets[0].0, "fact_denials");
        assert_eq!(overview.sheets[0].1.rows, 2);
        assert_eq!(
            overview.sheets[1].1.columns,
            vec!["claim_id".to_string(), "ar_balance".to_string()]
        );
    }
}
