pub mod dcf;
pub mod forecast;
pub mod wacc;
pub mod wacc_override;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::types::Rate;

/// Upper bound applied to every tax rate before use.
pub const MAX_TAX_RATE: Rate = dec!(0.5);

/// Clamp a tax rate into [0, MAX_TAX_RATE].
pub fn clamp_tax_rate(tax_rate: Rate) -> Rate {
    tax_rate.max(Decimal::ZERO).min(MAX_TAX_RATE)
}
