use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;

use crate::error::ValuationError;
use crate::types::{Money, Rate};
use crate::DcfResult;

/// Compound growth of one unit over `periods` whole years: (1 + rate)^periods.
///
/// Rejects `rate <= -100%` up front; a base that underflows to zero over a long
/// horizon is rejected the same way rather than being divided by later.
pub fn compound_factor(rate: Rate, periods: u32) -> DcfResult<Decimal> {
    if rate <= dec!(-1) {
        return Err(ValuationError::DegenerateDiscountRate { rate });
    }

    let factor = (Decimal::ONE + rate)
        .checked_powi(i64::from(periods))
        .ok_or_else(|| ValuationError::Overflow {
            context: format!("compound factor (1 + {rate})^{periods}"),
        })?;

    if factor.is_zero() {
        return Err(ValuationError::DegenerateDiscountRate { rate });
    }

    Ok(factor)
}

/// End-of-period discount factor: 1 / (1 + rate)^periods
pub fn discount_factor(rate: Rate, periods: u32) -> DcfResult<Decimal> {
    Ok(Decimal::ONE / compound_factor(rate, periods)?)
}

/// Present value of a series of year-end cash flows, the first received at the
/// end of period 1.
pub fn present_value(rate: Rate, cash_flows: &[Money]) -> DcfResult<Money> {
    let mut total = Decimal::ZERO;
    for (idx, cf) in cash_flows.iter().enumerate() {
        let period = idx as u32 + 1;
        total += cf / compound_factor(rate, period)?;
    }
    Ok(total)
}
