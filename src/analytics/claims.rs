use super::frame::sums_by;
use super::result::Ranking;
use crate::dataset::schema::{AR_BALANCE, PAYER_NAME};
use crate::dataset::Sheet;
use crate::error::Result;

/// Outstanding AR per payer, largest first.
pub fn ar_balance_by_payer(claims: &Sheet) -> Result<Ranking<f64>> {
    claims.require_columns(&[PAYER_NAME])?;
    claims.require_numeric(&[AR_BALANCE])?;
    sums_by(claims.frame(), PAYER_NAME, AR_BALANCE)
}
