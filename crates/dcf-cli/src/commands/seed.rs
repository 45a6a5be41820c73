use clap::Args;
use serde_json::Value;

use dcf_core::inputs::snapshot::{self, AssumptionDefaults, FinancialSnapshot};

use crate::input;

/// Arguments for seeding inputs from reported financials
#[derive(Args)]
pub struct SeedArgs {
    /// Path to JSON/YAML financial snapshot
    #[arg(long)]
    pub input: Option<String>,

    /// Path to JSON/YAML fallback defaults (library defaults when omitted)
    #[arg(long)]
    pub defaults: Option<String>,
}

pub fn run_seed(args: SeedArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let snapshot: FinancialSnapshot = input::read_request(args.input.as_deref())?
        .ok_or("--input file (or piped JSON) with a financial snapshot is required")?;

    let defaults: AssumptionDefaults = match args.defaults {
        Some(ref path) => input::file::read_document(path)?,
        None => AssumptionDefaults::default(),
    };

    let result = snapshot::seed_inputs(&snapshot, &defaults)?;
    Ok(serde_json::to_value(result)?)
}
