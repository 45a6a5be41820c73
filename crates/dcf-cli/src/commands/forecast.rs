use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use dcf_core::valuation::forecast::{self, Assumptions};

use crate::input;

/// Arguments for the FCFF forecast
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct ForecastArgs {
    /// Path to JSON/YAML assumptions file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Base-year revenue
    #[arg(long)]
    pub revenue0: Option<Decimal>,

    /// Number of forecast years
    #[arg(long)]
    pub years: Option<u32>,

    /// Annual revenue growth (e.g. 0.06 for 6%)
    #[arg(long, alias = "growth")]
    pub revenue_growth: Option<Decimal>,

    /// EBITDA as a fraction of revenue
    #[arg(long)]
    pub ebitda_margin: Option<Decimal>,

    /// Depreciation & amortisation as a fraction of revenue
    #[arg(long, alias = "da")]
    pub da_pct_revenue: Option<Decimal>,

    /// Capital expenditure as a fraction of revenue
    #[arg(long, alias = "capex")]
    pub capex_pct_revenue: Option<Decimal>,

    /// Net working capital as a fraction of revenue
    #[arg(long, alias = "nwc")]
    pub nwc_pct_revenue: Option<Decimal>,

    /// Tax rate applied to positive EBIT
    #[arg(long)]
    pub tax_rate: Option<Decimal>,
}

impl ForecastArgs {
    /// Build assumptions from flags, starting from the library defaults.
    pub fn to_assumptions(&self) -> Assumptions {
        let base = Assumptions::default();
        Assumptions {
            revenue0: self.revenue0.unwrap_or(base.revenue0),
            years: self.years.unwrap_or(base.years),
            revenue_growth: self.revenue_growth.unwrap_or(base.revenue_growth),
            ebitda_margin: self.ebitda_margin.unwrap_or(base.ebitda_margin),
            da_pct_revenue: self.da_pct_revenue.unwrap_or(base.da_pct_revenue),
            capex_pct_revenue: self.capex_pct_revenue.unwrap_or(base.capex_pct_revenue),
            nwc_pct_revenue: self.nwc_pct_revenue.unwrap_or(base.nwc_pct_revenue),
            tax_rate: self.tax_rate.unwrap_or(base.tax_rate),
            ..base
        }
    }
}

pub fn run_forecast(args: ForecastArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let assumptions: Assumptions = match input::read_request(args.input.as_deref())? {
        Some(assumptions) => assumptions,
        None => args.to_assumptions(),
    };

    let result = forecast::forecast_fcff(&assumptions)?;
    Ok(serde_json::to_value(result)?)
}
