use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use dcf_core::session::Session;

use crate::input;

/// Arguments for a full session recompute
#[derive(Args)]
pub struct RunArgs {
    /// Path to JSON/YAML session (assumptions, capital, overrides)
    #[arg(long)]
    pub input: Option<String>,

    /// Pin the equity weight E/V for this run
    #[arg(long)]
    pub equity_weight: Option<Decimal>,

    /// Manual discount rate, used when the session has no capital inputs
    #[arg(long)]
    pub discount_rate: Option<Decimal>,

    /// Replace the exit multiple in the session assumptions
    #[arg(long)]
    pub exit_multiple: Option<Decimal>,
}

pub fn run_session(args: RunArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut session: Session = input::read_request(args.input.as_deref())?
        .ok_or("--input file (or piped JSON) with a session is required")?;

    if args.equity_weight.is_some() {
        session.set_equity_weight_override(args.equity_weight);
    }
    if args.discount_rate.is_some() {
        session.set_discount_rate(args.discount_rate);
    }
    if let Some(multiple) = args.exit_multiple {
        let mut assumptions = session.assumptions().clone();
        assumptions.exit_multiple = multiple;
        session.set_assumptions(assumptions);
    }

    let result = session.recompute()?;
    Ok(serde_json::to_value(result)?)
}
