use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::{checked, ValuationError};
use crate::types::{with_metadata, ComputationOutput, Money, Multiple, Rate};
use crate::DcfResult;

use super::clamp_tax_rate;

/// Longest explicit forecast horizon accepted by the engine.
pub const MAX_FORECAST_YEARS: u32 = 50;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Ratio-based operating assumptions driving the FCFF forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assumptions {
    /// Base (Year 0) revenue
    pub revenue0: Money,
    /// Number of explicit forecast years
    pub years: u32,
    /// Constant annual revenue growth rate; may be negative but must exceed -100%
    pub revenue_growth: Rate,
    /// EBITDA margin as a fraction of revenue
    pub ebitda_margin: Rate,
    /// Depreciation & amortisation as a percentage of revenue
    pub da_pct_revenue: Rate,
    /// Capital expenditure as a percentage of revenue
    pub capex_pct_revenue: Rate,
    /// Net working capital balance as a percentage of revenue
    pub nwc_pct_revenue: Rate,
    /// Marginal tax rate on operating income (clamped to [0, 0.5] before use)
    pub tax_rate: Rate,
    /// Exit EV/EBITDA multiple for the terminal value
    #[serde(default = "default_exit_multiple")]
    pub exit_multiple: Multiple,
    /// Equity risk premium for the CAPM cost of equity
    #[serde(default = "default_equity_risk_premium")]
    pub equity_risk_premium: Rate,
}

pub(crate) fn default_exit_multiple() -> Multiple {
    dec!(8.0)
}

pub(crate) fn default_equity_risk_premium() -> Rate {
    dec!(0.055)
}

impl Default for Assumptions {
    fn default() -> Self {
        Assumptions {
            revenue0: dec!(100000000),
            years: 5,
            revenue_growth: dec!(0.06),
            ebitda_margin: dec!(0.25),
            da_pct_revenue: dec!(0.05),
            capex_pct_revenue: dec!(0.05),
            nwc_pct_revenue: dec!(0.02),
            tax_rate: dec!(0.25),
            exit_multiple: default_exit_multiple(),
            equity_risk_premium: default_equity_risk_premium(),
        }
    }
}

/// One year of the cash-flow forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRow {
    /// Forecast year, 1-indexed
    pub year: u32,
    pub revenue: Money,
    pub ebitda: Money,
    pub da: Money,
    pub ebit: Money,
    pub taxes: Money,
    pub nopat: Money,
    pub capex: Money,
    /// Closing net working capital balance
    pub nwc: Money,
    /// Change in NWC versus the prior year (year 1 compares against revenue0)
    pub delta_nwc: Money,
    /// FCFF = NOPAT + D&A - CapEx - Delta NWC
    pub fcff: Money,
}

/// Chronological forecast; one row per year, row i depends on row i-1's NWC.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForecastTable {
    pub rows: Vec<ForecastRow>,
}

impl ForecastTable {
    pub fn years(&self) -> u32 {
        self.rows.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn last(&self) -> Option<&ForecastRow> {
        self.rows.last()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ForecastRow> {
        self.rows.iter()
    }

    /// FCFF series in chronological order
    pub fn fcff(&self) -> Vec<Money> {
        self.rows.iter().map(|r| r.fcff).collect()
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Project year-by-year free cash flow to firm from percentage-of-revenue drivers.
///
/// revenue_t = revenue0 * (1 + g)^t, taxes are levied on positive EBIT only, and
/// the change in NWC for year 1 is measured against the year-0 balance
/// revenue0 * nwc_pct_revenue.
pub fn forecast_fcff(input: &Assumptions) -> DcfResult<ComputationOutput<ForecastTable>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_assumptions(input)?;

    let tax_rate = clamp_tax_rate(input.tax_rate);
    if tax_rate != input.tax_rate {
        warnings.push(format!(
            "Tax rate {} clamped to {tax_rate} (allowed range 0 to 0.5)",
            input.tax_rate
        ));
    }

    let table = build_rows(input, tax_rate)?;

    let negative_years: Vec<String> = table
        .iter()
        .filter(|r| r.fcff < Decimal::ZERO)
        .map(|r| r.year.to_string())
        .collect();
    if !negative_years.is_empty() {
        warnings.push(format!(
            "FCFF is negative in year(s) {}",
            negative_years.join(", ")
        ));
    }

    log::debug!(
        "forecast: {} years from revenue0 {} at growth {}",
        input.years,
        input.revenue0,
        input.revenue_growth
    );

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "FCFF forecast (percentage-of-revenue drivers)",
        input,
        warnings,
        elapsed,
        table,
    ))
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn validate_assumptions(input: &Assumptions) -> DcfResult<()> {
    if input.years < 1 {
        return Err(ValuationError::InvalidArgument {
            field: "years".into(),
            reason: "Forecast horizon must be at least 1 year".into(),
        });
    }
    if input.years > MAX_FORECAST_YEARS {
        return Err(ValuationError::InvalidArgument {
            field: "years".into(),
            reason: format!("Forecast horizon cannot exceed {MAX_FORECAST_YEARS} years"),
        });
    }
    if input.revenue0 <= Decimal::ZERO {
        return Err(ValuationError::InvalidArgument {
            field: "revenue0".into(),
            reason: "Base revenue must be positive".into(),
        });
    }
    if input.revenue_growth <= dec!(-1) {
        return Err(ValuationError::InvalidArgument {
            field: "revenue_growth".into(),
            reason: "Revenue growth must be greater than -100%".into(),
        });
    }

    Ok(())
}

fn build_rows(input: &Assumptions, tax_rate: Rate) -> DcfResult<ForecastTable> {
    let growth_factor = checked(Decimal::ONE.checked_add(input.revenue_growth), "growth factor")?;
    let mut rows = Vec::with_capacity(input.years as usize);
    let mut revenue = input.revenue0;
    let mut prev_nwc = checked(
        input.revenue0.checked_mul(input.nwc_pct_revenue),
        "opening net working capital",
    )?;

    for year in 1..=input.years {
        let ctx = |item: &str| format!("{item} in year {year}");

        revenue = checked(revenue.checked_mul(growth_factor), &ctx("revenue"))?;
        let ebitda = checked(revenue.checked_mul(input.ebitda_margin), &ctx("EBITDA"))?;
        let da = checked(revenue.checked_mul(input.da_pct_revenue), &ctx("D&A"))?;
        let ebit = checked(ebitda.checked_sub(da), &ctx("EBIT"))?;
        // No tax benefit on operating losses
        let taxes = checked(ebit.max(Decimal::ZERO).checked_mul(tax_rate), &ctx("taxes"))?;
        let nopat = checked(ebit.checked_sub(taxes), &ctx("NOPAT"))?;
        let capex = checked(revenue.checked_mul(input.capex_pct_revenue), &ctx("capex"))?;
        let nwc = checked(revenue.checked_mul(input.nwc_pct_revenue), &ctx("NWC"))?;
        let delta_nwc = checked(nwc.checked_sub(prev_nwc), &ctx("change in NWC"))?;
        let fcff = checked(
            nopat
                .checked_add(da)
                .and_then(|v| v.checked_sub(capex))
                .and_then(|v| v.checked_sub(delta_nwc)),
            &ctx("FCFF"),
        )?;

        rows.push(ForecastRow {
            year,
            revenue,
            ebitda,
            da,
            ebit,
            taxes,
            nopat,
            capex,
            nwc,
            delta_nwc,
            fcff,
        });

        prev_nwc = nwc;
    }

    Ok(ForecastTable { rows })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
