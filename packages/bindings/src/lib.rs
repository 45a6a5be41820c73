use napi::Result as NapiResult;
use napi_derive::napi;

use dcf_core::inputs::snapshot::SeedRequest;
use dcf_core::session::Session;
use dcf_core::valuation::dcf::ValuationRequest;
use dcf_core::valuation::forecast::Assumptions;
use dcf_core::valuation::wacc::CapitalInputs;
use dcf_core::valuation::wacc_override::WaccRequest;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Forecast & WACC
// ---------------------------------------------------------------------------

#[napi]
pub fn forecast_fcff(input_json: String) -> NapiResult<String> {
    let input: Assumptions = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = dcf_core::valuation::forecast::forecast_fcff(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn compute_wacc(input_json: String) -> NapiResult<String> {
    let input: CapitalInputs = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = dcf_core::valuation::wacc::compute_wacc(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn resolve_wacc(input_json: String) -> NapiResult<String> {
    let input: WaccRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = dcf_core::valuation::wacc_override::resolve_wacc(
        &input.capital,
        input.equity_weight_override,
    )
    .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Valuation
// ---------------------------------------------------------------------------

#[napi]
pub fn valuate(input_json: String) -> NapiResult<String> {
    let input: ValuationRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        dcf_core::valuation::dcf::valuate(&input.forecast, input.wacc, input.exit_multiple)
            .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Inputs & session
// ---------------------------------------------------------------------------

/// Accepts `{ "snapshot": {...}, "defaults": {...}? }`.
#[napi]
pub fn seed_inputs(input_json: String) -> NapiResult<String> {
    let input: SeedRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = dcf_core::inputs::snapshot::seed_inputs(&input.snapshot, &input.defaults)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn run_session(input_json: String) -> NapiResult<String> {
    let mut session: Session = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = session.recompute().map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
