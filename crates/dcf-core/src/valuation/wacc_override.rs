use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::types::{with_metadata, ComputationOutput, Rate};
use crate::DcfResult;

use super::wacc::{compute_wacc, CapitalInputs, WaccOutput};

/// JSON-friendly request for the override resolver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaccRequest {
    #[serde(flatten)]
    pub capital: CapitalInputs,
    /// Target equity weight E/V; clamped to [0, 1]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equity_weight_override: Option<Rate>,
}

/// Compute WACC, optionally pinning the equity weight while keeping the
/// capital base V from the market inputs.
///
/// With an override `ew`, the structure is rescaled to E' = V * ew and
/// D' = V * (1 - ew) and WACC is recomputed with the same beta, tax rate,
/// risk-free rate, ERP and interest expense. Interest expense stays fixed in
/// absolute terms, so the implied cost of debt moves with D'. The pre-override
/// weights and capital base are attached to the result.
pub fn resolve_wacc(
    input: &CapitalInputs,
    equity_weight_override: Option<Rate>,
) -> DcfResult<ComputationOutput<WaccOutput>> {
    let Some(requested) = equity_weight_override else {
        return compute_wacc(input);
    };

    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let base = compute_wacc(input)?;
    for w in &base.warnings {
        warnings.push(format!("[base] {w}"));
    }
    let base = base.result;

    let equity_weight = requested.max(Decimal::ZERO).min(Decimal::ONE);
    if equity_weight != requested {
        warnings.push(format!(
            "Equity weight override {requested} clamped to {equity_weight}"
        ));
    }

    let capital_base = base.capital_base;
    let rescaled = CapitalInputs {
        market_cap: capital_base * equity_weight,
        total_debt: capital_base * (Decimal::ONE - equity_weight),
        ..input.clone()
    };

    let overridden = compute_wacc(&rescaled)?;
    for w in &overridden.warnings {
        warnings.push(format!("[override] {w}"));
    }
    let mut output = overridden.result;

    if !output.cost_of_debt.is_zero() && output.cost_of_debt != base.cost_of_debt {
        warnings.push(format!(
            "Interest expense held fixed at {}; implied cost of debt moves from {} to {}",
            input.interest_expense.abs(),
            base.cost_of_debt,
            output.cost_of_debt
        ));
    }

    log::debug!(
        "wacc override: equity weight {} -> {equity_weight}, wacc {} -> {}",
        base.equity_weight,
        base.wacc,
        output.wacc
    );

    output.base_equity_weight = Some(base.equity_weight);
    output.base_debt_weight = Some(base.debt_weight);
    output.base_capital_base = Some(base.capital_base);

    let request = WaccRequest {
        capital: input.clone(),
        equity_weight_override,
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "WACC with equity-weight override (capital base preserved)",
        &request,
        warnings,
        elapsed,
        output,
    ))
}
