use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::{Money, Rate};

/// Lowest effective tax rate considered plausible for a seeded estimate.
pub const MIN_PLAUSIBLE_TAX_RATE: Rate = dec!(0.05);
/// Highest effective tax rate considered plausible for a seeded estimate.
pub const MAX_PLAUSIBLE_TAX_RATE: Rate = dec!(0.40);
/// Fallback when neither statements nor disclosure give a usable rate.
pub const DEFAULT_TAX_RATE: Rate = dec!(0.25);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaxRateSource {
    /// |income tax expense / pre-tax income|, clamped to the plausible band
    Implied,
    /// Reported effective rate inside the plausible band
    Disclosed,
    Default,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxRateEstimate {
    pub rate: Rate,
    pub source: TaxRateSource,
}

/// Estimate an effective tax rate from reported figures.
///
/// The statement-implied rate wins whenever both figures are reported and
/// non-zero and their ratio is representable; a disclosed rate outside
/// [5%, 40%] is discarded.
pub fn estimate_tax_rate(
    disclosed: Option<Rate>,
    income_tax_expense: Option<Money>,
    pre_tax_income: Option<Money>,
) -> TaxRateEstimate {
    if let (Some(tax), Some(pre_tax)) = (income_tax_expense, pre_tax_income) {
        // A ratio outside Decimal's range is not a usable estimate
        let implied = if tax.is_zero() || pre_tax.is_zero() {
            None
        } else {
            tax.checked_div(pre_tax).map(|r| r.abs())
        };
        if let Some(implied) = implied {
            return TaxRateEstimate {
                rate: implied.max(MIN_PLAUSIBLE_TAX_RATE).min(MAX_PLAUSIBLE_TAX_RATE),
                source: TaxRateSource::Implied,
            };
        }
    }

    match disclosed {
        Some(rate) if (MIN_PLAUSIBLE_TAX_RATE..=MAX_PLAUSIBLE_TAX_RATE).contains(&rate) => {
            TaxRateEstimate {
                rate,
                source: TaxRateSource::Disclosed,
            }
        }
        _ => TaxRateEstimate {
            rate: DEFAULT_TAX_RATE,
            source: TaxRateSource::Default,
        },
    }
}

impl TaxRateEstimate {
    pub fn is_default(&self) -> bool {
        self.source == TaxRateSource::Default
    }
}
