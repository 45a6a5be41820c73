use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use dcf_core::valuation::dcf::{self, ValuationRequest};

use crate::input;

/// Arguments for the exit-multiple DCF valuation
#[derive(Args)]
pub struct ValuateArgs {
    /// Path to JSON/YAML file with `forecast`, `wacc` and `exit_multiple`
    #[arg(long)]
    pub input: Option<String>,

    /// Discount rate; replaces the `wacc` in the input document
    #[arg(long, alias = "discount-rate")]
    pub wacc: Option<Decimal>,

    /// EV/EBITDA exit multiple; replaces the one in the input document
    #[arg(long)]
    pub exit_multiple: Option<Decimal>,
}

pub fn run_valuate(args: ValuateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut document: Value = input::read_request(args.input.as_deref())?
        .ok_or("--input file (or piped JSON) with a forecast table is required")?;

    // Accept the envelope printed by `dcf forecast` as the forecast table
    if let Some(forecast) = document.get_mut("forecast") {
        if let Some(table) = forecast.get("result").cloned() {
            *forecast = table;
        }
    }

    if let Value::Object(map) = &mut document {
        if let Some(wacc) = args.wacc {
            map.insert("wacc".into(), serde_json::to_value(wacc)?);
        }
        if let Some(multiple) = args.exit_multiple {
            map.insert("exit_multiple".into(), serde_json::to_value(multiple)?);
        }
    }

    let request: ValuationRequest = serde_json::from_value(document)?;
    let result = dcf::valuate(&request.forecast, request.wacc, request.exit_multiple)?;
    Ok(serde_json::to_value(result)?)
}
