use dcf_core::inputs::snapshot::{seed_inputs, AssumptionDefaults, FinancialSnapshot};
use dcf_core::inputs::tax_rate::TaxRateSource;
use dcf_core::session::Session;
use dcf_core::valuation::wacc;
use dcf_core::ValuationError;
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn snapshot_json() -> &'static str {
    r#"{
        "ticker": "NRTH",
        "company_name": "Northwind Industrial",
        "currency": "USD",
        "period_end": "2024-12-31",
        "revenue": "5000",
        "ebitda": "1100",
        "depreciation_amortization": "-150",
        "capital_expenditures": "-200",
        "net_working_capital": "500",
        "income_tax_expense": "168",
        "pre_tax_income": "800",
        "interest_expense": "-40",
        "total_debt": "1000",
        "market_cap": "4000",
        "beta": "1.2",
        "risk_free_rate": "0.04"
    }"#
}

#[test]
fn test_seeded_inputs_from_json_snapshot() {
    let snapshot: FinancialSnapshot = serde_json::from_str(snapshot_json()).unwrap();
    let out = seed_inputs(&snapshot, &AssumptionDefaults::default()).unwrap();
    let seeded = out.result;

    assert!(out.warnings.is_empty(), "unexpected warnings: {:?}", out.warnings);
    assert_eq!(seeded.assumptions.ebitda_margin, dec!(0.22));
    assert_eq!(seeded.assumptions.da_pct_revenue, dec!(0.03));
    assert_eq!(seeded.assumptions.capex_pct_revenue, dec!(0.04));
    assert_eq!(seeded.assumptions.nwc_pct_revenue, dec!(0.10));
    assert_eq!(seeded.assumptions.tax_rate, dec!(0.21));
    assert_eq!(seeded.tax_rate_source, TaxRateSource::Implied);
    assert_eq!(seeded.capital.interest_expense, dec!(40));
}

#[test]
fn test_seed_then_recompute_session() {
    let snapshot: FinancialSnapshot = serde_json::from_str(snapshot_json()).unwrap();
    let seeded = seed_inputs(&snapshot, &AssumptionDefaults::default())
        .unwrap()
        .result;
    let capital = seeded.capital.clone();

    let mut session = Session::from_seeded(seeded);
    let run = session.recompute().unwrap().result;

    let direct = wacc::compute_wacc(&capital).unwrap().result;
    assert_eq!(run.wacc.as_ref(), Some(&direct));
    assert_eq!(run.discount_rate, direct.wacc);
    assert_eq!(run.forecast.years(), 5);
    assert_eq!(
        run.valuation.enterprise_value,
        run.valuation.pv_fcff + run.valuation.pv_terminal
    );
    assert_eq!(session.profile().and_then(|p| p.ticker.as_deref()), Some("NRTH"));
}

#[test]
fn test_equity_override_changes_session_value() {
    let snapshot: FinancialSnapshot = serde_json::from_str(snapshot_json()).unwrap();
    let seeded = seed_inputs(&snapshot, &AssumptionDefaults::default())
        .unwrap()
        .result;

    let mut session = Session::from_seeded(seeded);
    let market = session.recompute().unwrap().result;

    session.set_equity_weight_override(Some(Decimal::ONE));
    assert!(session.latest().is_none());
    let all_equity = session.recompute().unwrap().result;

    // Ke = 0.04 + 1.2 * 0.055
    assert_eq!(all_equity.discount_rate, dec!(0.106));
    assert!(all_equity.discount_rate > market.discount_rate);
    assert!(all_equity.valuation.enterprise_value < market.valuation.enterprise_value);
}

#[test]
fn test_sparse_snapshot_falls_back_with_warnings() {
    let json = r#"{ "revenue": "1000", "market_cap": "3000" }"#;
    let snapshot: FinancialSnapshot = serde_json::from_str(json).unwrap();
    let out = seed_inputs(&snapshot, &AssumptionDefaults::default()).unwrap();

    let defaults = AssumptionDefaults::default();
    assert_eq!(out.result.assumptions.ebitda_margin, defaults.ebitda_margin);
    assert_eq!(out.result.capital.total_debt, Decimal::ZERO);
    assert_eq!(out.result.capital.beta, defaults.beta);
    assert!(out.warnings.iter().any(|w| w.contains("all-equity")));
    assert!(out.warnings.iter().any(|w| w.starts_with("Tax rate")));

    // Sparse seeds still value cleanly
    let mut session = Session::from_seeded(out.result);
    assert!(session.recompute().is_ok());
}

#[test]
fn test_unreported_revenue_blocks_seeding() {
    let json = r#"{ "market_cap": "3000" }"#;
    let snapshot: FinancialSnapshot = serde_json::from_str(json).unwrap();
    assert!(matches!(
        seed_inputs(&snapshot, &AssumptionDefaults::default()),
        Err(ValuationError::MissingData(_))
    ));
}

#[test]
fn test_session_round_trips_through_json() {
    let snapshot: FinancialSnapshot = serde_json::from_str(snapshot_json()).unwrap();
    let seeded = seed_inputs(&snapshot, &AssumptionDefaults::default())
        .unwrap()
        .result;
    let mut session = Session::from_seeded(seeded);
    session.set_equity_weight_override(Some(dec!(0.7)));
    let before = session.recompute().unwrap().result;

    let json = serde_json::to_string(&session).unwrap();
    let mut restored: Session = serde_json::from_str(&json).unwrap();
    assert!(restored.latest().is_none());
    let after = restored.recompute().unwrap().result;
    assert_eq!(before, after);
}

#[test]
fn test_working_capital_heavy_company_values_end_to_end() {
    let json = r#"{
        "revenue": "100", "ebitda": "30", "depreciation_amortization": "-5",
        "capital_expenditures": "-6", "net_working_capital": "150",
        "total_debt": "50", "interest_expense": "-3", "market_cap": "400"
    }"#;
    let snapshot: FinancialSnapshot = serde_json::from_str(json).unwrap();
    let seeded = seed_inputs(&snapshot, &AssumptionDefaults::default())
        .unwrap()
        .result;
    assert_eq!(seeded.assumptions.nwc_pct_revenue, dec!(1.5));

    let mut session = Session::from_seeded(seeded);
    let run = session.recompute().unwrap().result;
    // Year-1 NWC build: 106 * 1.5 - 100 * 1.5
    assert_eq!(run.forecast.rows[0].delta_nwc, dec!(9));
    assert!(session.latest().is_some());
}
