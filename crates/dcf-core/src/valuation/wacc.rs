use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::{checked, ValuationError};
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::DcfResult;

use super::clamp_tax_rate;
use super::forecast::default_equity_risk_premium;

/// Market capital structure and risk inputs for the WACC calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapitalInputs {
    /// Market value of equity (market capitalisation); must be positive
    pub market_cap: Money,
    /// Total debt; negative values are treated as zero
    pub total_debt: Money,
    /// Annual interest expense; the sign is ignored
    pub interest_expense: Money,
    /// Levered beta of equity
    pub beta: Decimal,
    /// Marginal corporate tax rate (clamped to [0, 0.5] before use)
    pub tax_rate: Rate,
    /// Risk-free rate (e.g. 10-year government bond yield)
    pub risk_free_rate: Rate,
    /// Equity risk premium (market return minus risk-free rate)
    #[serde(default = "default_equity_risk_premium")]
    pub equity_risk_premium: Rate,
}

/// Output of the WACC calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaccOutput {
    /// Weighted average cost of capital
    pub wacc: Rate,
    /// Cost of equity via CAPM
    pub cost_of_equity: Rate,
    /// Pre-tax cost of debt implied by interest expense / debt
    pub cost_of_debt: Rate,
    /// Cost of debt after the tax shield
    pub after_tax_cost_of_debt: Rate,
    /// E / V
    pub equity_weight: Rate,
    /// D / V
    pub debt_weight: Rate,
    /// V = E + D used for the weights
    pub capital_base: Money,
    /// Tax rate after clamping
    pub tax_rate_used: Rate,
    /// Equity weight before an override was applied
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_equity_weight: Option<Rate>,
    /// Debt weight before an override was applied
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_debt_weight: Option<Rate>,
    /// Capital base before an override was applied
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_capital_base: Option<Money>,
}

/// Calculate the Weighted Average Cost of Capital from market capital structure.
///
/// E = market_cap, D = max(total_debt, 0), V = E + D
/// Ke = Rf + Beta * ERP
/// Kd = |interest_expense| / D (zero when there is no debt or no interest)
/// WACC = E/V * Ke + D/V * Kd * (1 - t)
pub fn compute_wacc(input: &CapitalInputs) -> DcfResult<ComputationOutput<WaccOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    // --- Validation ---
    let (equity, debt, capital_base) = capital_structure(input)?;

    if input.total_debt < Decimal::ZERO {
        warnings.push(format!(
            "Negative total debt ({}) treated as zero",
            input.total_debt
        ));
    }

    // --- Cost of equity (CAPM) ---
    let cost_of_equity =
        capm_cost_of_equity(input.risk_free_rate, input.beta, input.equity_risk_premium)?;

    // --- Cost of debt ---
    let cost_of_debt = implied_cost_of_debt(input.interest_expense, debt)?;
    if debt.is_zero() {
        warnings.push(
            "No debt in capital structure; cost of debt set to 0 assuming all-equity financing"
                .into(),
        );
    } else if input.interest_expense.is_zero() {
        warnings.push(format!(
            "Debt of {debt} carries no interest expense; cost of debt set to 0"
        ));
    }

    let tax_rate = clamp_tax_rate(input.tax_rate);
    if tax_rate != input.tax_rate {
        warnings.push(format!(
            "Tax rate {} clamped to {tax_rate} (allowed range 0 to 0.5)",
            input.tax_rate
        ));
    }

    // --- Weights ---
    let equity_weight = equity / capital_base;
    let debt_weight = Decimal::ONE - equity_weight;

    // --- WACC ---
    let after_tax_cost_of_debt = checked(
        cost_of_debt.checked_mul(Decimal::ONE - tax_rate),
        "after-tax cost of debt",
    )?;
    let wacc = checked(
        equity_weight
            .checked_mul(cost_of_equity)
            .zip(debt_weight.checked_mul(after_tax_cost_of_debt))
            .and_then(|(equity_leg, debt_leg)| equity_leg.checked_add(debt_leg)),
        "WACC",
    )?;

    // --- Reasonableness warnings ---
    if input.beta.is_zero() {
        warnings.push("Beta is zero; cost of equity equals the risk-free rate".into());
    } else if input.beta > dec!(3.0) {
        warnings.push(format!(
            "High beta ({}): verify market data; betas above 3.0 are unusual",
            input.beta
        ));
    }
    if input.equity_risk_premium > dec!(0.10) {
        warnings.push(format!(
            "Equity risk premium ({}) exceeds 10%; verify estimate",
            input.equity_risk_premium
        ));
    }
    if wacc > dec!(0.20) {
        warnings.push(format!(
            "WACC of {wacc} exceeds 20%; appropriate for high-risk situations only"
        ));
    }

    log::debug!("wacc: E={equity} D={debt} Ke={cost_of_equity} Kd={cost_of_debt} -> {wacc}");

    let output = WaccOutput {
        wacc,
        cost_of_equity,
        cost_of_debt,
        after_tax_cost_of_debt,
        equity_weight,
        debt_weight,
        capital_base,
        tax_rate_used: tax_rate,
        base_equity_weight: None,
        base_debt_weight: None,
        base_capital_base: None,
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "WACC via CAPM and market capital structure",
        input,
        warnings,
        elapsed,
        output,
    ))
}

/// CAPM cost of equity: Rf + Beta * ERP
pub fn capm_cost_of_equity(
    risk_free_rate: Rate,
    beta: Decimal,
    equity_risk_premium: Rate,
) -> DcfResult<Rate> {
    checked(
        beta.checked_mul(equity_risk_premium)
            .and_then(|premium| risk_free_rate.checked_add(premium)),
        "CAPM cost of equity",
    )
}

/// Pre-tax cost of debt implied by the interest bill: |interest| / debt.
///
/// Returns zero when there is no debt or no interest expense. A debt balance
/// tiny against the interest bill fails with `Overflow`.
pub fn implied_cost_of_debt(interest_expense: Money, debt: Money) -> DcfResult<Rate> {
    if debt > Decimal::ZERO && !interest_expense.is_zero() {
        checked(
            interest_expense.abs().checked_div(debt),
            "implied cost of debt (interest / debt)",
        )
    } else {
        Ok(Decimal::ZERO)
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Returns (E, D, V) after validating the capital structure.
fn capital_structure(input: &CapitalInputs) -> DcfResult<(Money, Money, Money)> {
    if input.market_cap <= Decimal::ZERO {
        return Err(ValuationError::InvalidCapitalStructure(format!(
            "Market capitalisation must be positive, got {}",
            input.market_cap
        )));
    }

    let equity = input.market_cap;
    let debt = input.total_debt.max(Decimal::ZERO);
    let capital_base = equity
        .checked_add(debt)
        .ok_or_else(|| ValuationError::Overflow {
            context: "capital base E + D".into(),
        })?;

    if capital_base <= Decimal::ZERO {
        return Err(ValuationError::InvalidCapitalStructure(format!(
            "Total capital (E + D) must be positive, got {capital_base}"
        )));
    }

    Ok((equity, debt, capital_base))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
