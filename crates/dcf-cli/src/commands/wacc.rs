use clap::Args;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::Value;

use dcf_core::valuation::wacc::CapitalInputs;
use dcf_core::valuation::wacc_override::{self, WaccRequest};

use crate::input;

/// Arguments for WACC calculation
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct WaccArgs {
    /// Market value of equity
    #[arg(long)]
    pub market_cap: Option<Decimal>,

    /// Total debt (book value used as a market proxy)
    #[arg(long)]
    pub total_debt: Option<Decimal>,

    /// Annual interest expense
    #[arg(long)]
    pub interest_expense: Option<Decimal>,

    /// Levered equity beta
    #[arg(long)]
    pub beta: Option<Decimal>,

    /// Marginal corporate tax rate
    #[arg(long)]
    pub tax_rate: Option<Decimal>,

    /// Risk-free rate (e.g. 0.042 for 4.2%)
    #[arg(long)]
    pub risk_free_rate: Option<Decimal>,

    /// Equity risk premium (e.g. 0.055 for 5.5%)
    #[arg(long, alias = "erp")]
    pub equity_risk_premium: Option<Decimal>,

    /// Pin the equity weight E/V while keeping the capital base
    #[arg(long)]
    pub equity_weight: Option<Decimal>,

    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_wacc(args: WaccArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut request: WaccRequest = match input::read_request(args.input.as_deref())? {
        Some(request) => request,
        None => WaccRequest {
            capital: CapitalInputs {
                market_cap: args
                    .market_cap
                    .ok_or("--market-cap is required (or provide --input)")?,
                total_debt: args.total_debt.unwrap_or(Decimal::ZERO),
                interest_expense: args.interest_expense.unwrap_or(Decimal::ZERO),
                beta: args.beta.unwrap_or(dec!(1.0)),
                tax_rate: args
                    .tax_rate
                    .ok_or("--tax-rate is required (or provide --input)")?,
                risk_free_rate: args
                    .risk_free_rate
                    .ok_or("--risk-free-rate is required (or provide --input)")?,
                equity_risk_premium: args.equity_risk_premium.unwrap_or(dec!(0.055)),
            },
            equity_weight_override: None,
        },
    };

    // The flag wins over an override carried in the input document
    if args.equity_weight.is_some() {
        request.equity_weight_override = args.equity_weight;
    }

    let result =
        wacc_override::resolve_wacc(&request.capital, request.equity_weight_override)?;
    Ok(serde_json::to_value(result)?)
}
