//! DataFrame building blocks shared by the aggregation operations.

use super::result::{round2, Ranking};
use crate::dataset::schema::{CLAIM_ID, DENIAL_ID, FLAG_SET, PAYER_NAME};
use crate::dataset::Sheet;
use crate::error::Result;
use polars::prelude::*;

const VALUE_COLUMN: &str = "__value";

/// Denials left-joined onto claim financials by claim id.
///
/// Denials without a matching claim keep null claim columns; a denial
/// matching several claim rows appears once per match.
#[derive(Debug, Clone)]
pub struct JoinedDenialClaims {
    frame: DataFrame,
}

impl JoinedDenialClaims {
    pub fn build(denials: &Sheet, claims: &Sheet) -> Result<Self> {
        denials.require_columns(&[DENIAL_ID, CLAIM_ID])?;
        claims.require_columns(&[CLAIM_ID, PAYER_NAME])?;

        let frame = denials
            .frame()
            .clone()
            .lazy()
            .join(
                claims.frame().clone().lazy(),
                [col(CLAIM_ID)],
                [col(CLAIM_ID)],
                JoinArgs::new(JoinType::Left),
            )
            .collect()?;

        Ok(Self { frame })
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }
}

/// Number of unique non-null values in `column`.
pub fn distinct_count(frame: &DataFrame, column: &str) -> Result<u64> {
    Ok(frame.column(column)?.drop_nulls().n_unique()? as u64)
}

/// Flag normalization: trimmed, uppercased, equal to "Y".
pub fn is_flag_set(value: &str) -> bool {
    value.trim().to_uppercase() == FLAG_SET
}

/// Rows whose `column` satisfies `predicate`; nulls never match.
pub fn text_mask(
    frame: &DataFrame,
    column: &str,
    predicate: impl Fn(&str) -> bool,
) -> Result<BooleanChunked> {
    let as_text = frame.column(column)?.cast(&DataType::String)?;
    let mask: Vec<bool> = as_text
        .str()?
        .into_iter()
        .map(|value| value.map(&predicate).unwrap_or(false))
        .collect();
    Ok(BooleanChunked::from_slice("mask", &mask))
}

pub fn flagged_rows(frame: &DataFrame, flag_column: &str) -> Result<DataFrame> {
    let mask = text_mask(frame, flag_column, is_flag_set)?;
    Ok(frame.filter(&mask)?)
}

/// Values of `column` as floats with nulls read as 0. Non-numeric text is an error.
pub fn amounts(frame: &DataFrame, column: &str) -> Result<Vec<f64>> {
    let numeric = frame.column(column)?.strict_cast(&DataType::Float64)?;
    Ok(numeric
        .f64()?
        .into_iter()
        .map(|value| value.unwrap_or(0.0))
        .collect())
}

pub fn total_amount(frame: &DataFrame, column: &str) -> Result<f64> {
    Ok(round2(amounts(frame, column)?.iter().sum()))
}

/// Mean of `column` with nulls read as 0; `None` for an empty frame.
pub fn mean_amount(frame: &DataFrame, column: &str) -> Result<Option<f64>> {
    let values = amounts(frame, column)?;
    if values.is_empty() {
        return Ok(None);
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    Ok(Some(round2(mean)))
}

/// Unique non-null `id` values per non-null `key`, descending.
pub fn distinct_counts_by(frame: &DataFrame, key: &str, id: &str) -> Result<Ranking<u64>> {
    let grouped = frame
        .clone()
        .lazy()
        .filter(col(key).is_not_null().and(col(id).is_not_null()))
        .group_by([col(key)])
        .agg([col(id).n_unique().cast(DataType::UInt64).alias(VALUE_COLUMN)])
        .collect()?;

    let keys = grouped.column(key)?.cast(&DataType::String)?;
    let counts = grouped.column(VALUE_COLUMN)?.cast(&DataType::UInt64)?;

    let entries = keys
        .str()?
        .into_iter()
        .zip(counts.u64()?.into_iter())
        .filter_map(|(k, count)| Some((k?.to_string(), count.unwrap_or(0))))
        .collect();

    Ok(Ranking::descending(entries))
}

/// Sum of `amount` (nulls as 0) per non-null `key`, rounded to cents, descending.
pub fn sums_by(frame: &DataFrame, key: &str, amount: &str) -> Result<Ranking<f64>> {
    let grouped = frame
        .clone()
        .lazy()
        .filter(col(key).is_not_null())
        .group_by([col(key)])
        .agg([col(amount)
            .strict_cast(DataType::Float64)
            .fill_null(lit(0.0))
            .sum()
            .alias(VALUE_COLUMN)])
        .collect()?;

    let keys = grouped.column(key)?.cast(&DataType::String)?;
    let sums = grouped.column(VALUE_COLUMN)?.cast(&DataType::Float64)?;

    let entries = keys
        .str()?
        .into_iter()
        .zip(sums.f64()?.into_iter())
        .filter_map(|(k, sum)| Some((k?.to_string(), round2(sum.unwrap_or(0.0)))))
        .collect();

    Ok(Ranking::descending(entries))
}
