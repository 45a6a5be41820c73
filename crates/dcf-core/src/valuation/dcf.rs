use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::{checked, ValuationError};
use crate::time_value::compound_factor;
use crate::types::{with_metadata, ComputationOutput, Money, Multiple, Rate};
use crate::DcfResult;

use super::forecast::ForecastTable;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// JSON-friendly request bundling the three valuation inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationRequest {
    pub forecast: ForecastTable,
    pub wacc: Rate,
    pub exit_multiple: Multiple,
}

/// Discounting detail for one forecast year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscountedCashFlow {
    pub year: u32,
    pub fcff: Money,
    pub discount_factor: Rate,
    pub pv_fcff: Money,
}

/// Output of the exit-multiple DCF valuation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationOutput {
    /// Sum of present values of explicit-period FCFFs
    pub pv_fcff: Money,
    /// Terminal value = final-year EBITDA * exit multiple
    pub terminal_value: Money,
    /// Terminal value discounted over the full horizon
    pub pv_terminal: Money,
    /// Enterprise value = PV(FCFFs) + PV(TV)
    pub enterprise_value: Money,
    /// PV of terminal value as a fraction of enterprise value
    pub terminal_value_pct: Rate,
    pub wacc_used: Rate,
    pub exit_multiple: Multiple,
    pub discounted_cash_flows: Vec<DiscountedCashFlow>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Discount a forecast and an exit-multiple terminal value into enterprise value.
///
/// Cash flows are discounted at year end: PV_t = FCFF_t / (1 + wacc)^t.
/// The terminal value is discounted over the full forecast horizon.
pub fn valuate(
    forecast: &ForecastTable,
    wacc: Rate,
    exit_multiple: Multiple,
) -> DcfResult<ComputationOutput<ValuationOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    // --- Validate ---
    if wacc <= dec!(-1) {
        return Err(ValuationError::DegenerateDiscountRate { rate: wacc });
    }
    if exit_multiple < Decimal::ZERO {
        return Err(ValuationError::InvalidArgument {
            field: "exit_multiple".into(),
            reason: "Exit multiple cannot be negative".into(),
        });
    }
    let last = forecast.last().ok_or_else(|| ValuationError::InvalidArgument {
        field: "forecast".into(),
        reason: "Forecast table has no rows".into(),
    })?;

    if wacc <= Decimal::ZERO {
        warnings.push(format!(
            "WACC of {wacc} is not positive; present values are not below nominal cash flows"
        ));
    }

    // --- Discount explicit-period cash flows ---
    let mut discounted_cash_flows = Vec::with_capacity(forecast.rows.len());
    let mut pv_fcff = Decimal::ZERO;
    for (idx, row) in forecast.iter().enumerate() {
        let period = idx as u32 + 1;
        let compound = compound_factor(wacc, period)?;
        let context = format!("discounting year {} FCFF", row.year);
        let discount_factor = checked(Decimal::ONE.checked_div(compound), &context)?;
        let pv = checked(row.fcff.checked_div(compound), &context)?;
        pv_fcff = checked(pv_fcff.checked_add(pv), "sum of discounted FCFF")?;
        discounted_cash_flows.push(DiscountedCashFlow {
            year: row.year,
            fcff: row.fcff,
            discount_factor,
            pv_fcff: pv,
        });
    }

    // --- Terminal value (exit multiple) ---
    let terminal_value = checked(last.ebitda.checked_mul(exit_multiple), "terminal value")?;
    let pv_terminal = checked(
        terminal_value.checked_div(compound_factor(wacc, forecast.years())?),
        "discounting terminal value",
    )?;

    // --- Enterprise value ---
    let enterprise_value = checked(pv_fcff.checked_add(pv_terminal), "enterprise value")?;

    let terminal_value_pct = if enterprise_value.is_zero() {
        Decimal::ZERO
    } else {
        checked(
            pv_terminal.checked_div(enterprise_value),
            "terminal value share of enterprise value",
        )?
    };
    if terminal_value_pct > dec!(0.75) {
        let share = match terminal_value_pct.checked_mul(dec!(100)) {
            Some(pct) => format!("{pct:.1}%"),
            None => format!("{terminal_value_pct}x"),
        };
        warnings.push(format!(
            "Terminal value represents {share} of enterprise value; consider extending the explicit forecast period"
        ));
    }

    log::debug!(
        "valuation: {} years at wacc {wacc}, exit {exit_multiple}x -> EV {enterprise_value}",
        forecast.years()
    );

    let output = ValuationOutput {
        pv_fcff,
        terminal_value,
        pv_terminal,
        enterprise_value,
        terminal_value_pct,
        wacc_used: wacc,
        exit_multiple,
        discounted_cash_flows,
    };

    let request = ValuationRequest {
        forecast: forecast.clone(),
        wacc,
        exit_multiple,
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "FCFF DCF with exit-multiple terminal value",
        &request,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
