//! JSON request shapes accepted by the Node bindings, exercised through the
//! same deserialize, compute, serialize path.

use dcf_core::inputs::snapshot::{seed_inputs, SeedRequest};
use dcf_core::session::Session;
use dcf_core::valuation::dcf::{self, ValuationRequest};
use dcf_core::valuation::forecast::{self, Assumptions};
use dcf_core::valuation::wacc_override::{self, WaccRequest};
use dcf_core::ValuationError;
use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;
use serde_json::{json, Value};

fn assumptions_json() -> Value {
    json!({
        "revenue0": "5000", "years": 5, "revenue_growth": "0.06",
        "ebitda_margin": "0.22", "da_pct_revenue": "0.03",
        "capex_pct_revenue": "0.04", "nwc_pct_revenue": "0.10",
        "tax_rate": "0.25", "exit_multiple": "8", "equity_risk_premium": "0.055"
    })
}

#[test]
fn test_seed_request_without_defaults() {
    let json = r#"{ "snapshot": { "revenue": "1000", "ebitda": "250", "market_cap": "3000" } }"#;
    let request: SeedRequest = serde_json::from_str(json).unwrap();
    let out = seed_inputs(&request.snapshot, &request.defaults).unwrap();
    assert_eq!(out.result.assumptions.ebitda_margin, dec!(0.25));

    // The envelope echoes the request it was given
    let echoed: SeedRequest = serde_json::from_value(out.assumptions.clone()).unwrap();
    assert_eq!(echoed, request);
}

#[test]
fn test_forecast_output_feeds_valuation_request() {
    let assumptions: Assumptions = serde_json::from_value(assumptions_json()).unwrap();
    let table = forecast::forecast_fcff(&assumptions).unwrap().result;

    let request: ValuationRequest = serde_json::from_value(json!({
        "forecast": serde_json::to_value(&table).unwrap(),
        "wacc": "0.09",
        "exit_multiple": "8"
    }))
    .unwrap();
    let out = dcf::valuate(&request.forecast, request.wacc, request.exit_multiple).unwrap();

    let rendered = serde_json::to_value(&out).unwrap();
    assert!(rendered["result"]["enterprise_value"].is_string());
    assert_eq!(request.forecast, table);
}

#[test]
fn test_wacc_request_with_override() {
    let request: WaccRequest = serde_json::from_value(json!({
        "market_cap": "3000", "total_debt": "1000", "interest_expense": "50",
        "beta": "1.10", "tax_rate": "0.21", "risk_free_rate": "0.042",
        "equity_risk_premium": "0.055", "equity_weight_override": "1"
    }))
    .unwrap();
    let out = wacc_override::resolve_wacc(&request.capital, request.equity_weight_override)
        .unwrap()
        .result;
    assert_eq!(out.wacc, dec!(0.1025));
}

#[test]
fn test_session_document_with_manual_rate() {
    let mut session: Session = serde_json::from_value(json!({
        "assumptions": assumptions_json(),
        "discount_rate": "0.09"
    }))
    .unwrap();
    let run = session.recompute().unwrap().result;
    assert!(run.wacc.is_none());
    assert_eq!(run.discount_rate, dec!(0.09));
}

#[test]
fn test_overflowing_request_reports_error_text() {
    let mut raw = assumptions_json();
    raw["revenue0"] = json!("50000000000000000000000000000");
    raw["revenue_growth"] = json!("0");
    raw["ebitda_margin"] = json!("1");
    raw["da_pct_revenue"] = json!("-1");
    let assumptions: Assumptions = serde_json::from_value(raw).unwrap();

    let err = forecast::forecast_fcff(&assumptions).unwrap_err();
    assert!(matches!(err, ValuationError::Overflow { .. }));
    assert!(!err.to_string().is_empty());
}
