use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::{checked, ValuationError};
use crate::types::{with_metadata, CompanyProfile, ComputationOutput, Money, Multiple, Rate};
use crate::valuation::forecast::Assumptions;
use crate::valuation::wacc::CapitalInputs;
use crate::DcfResult;

use super::tax_rate::{estimate_tax_rate, TaxRateSource};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Latest reported figures for a company, as supplied by a data loader.
///
/// `None` means the figure was not reported; `Some(0)` is a reported zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialSnapshot {
    #[serde(flatten)]
    pub profile: CompanyProfile,
    pub revenue: Option<Money>,
    pub ebitda: Option<Money>,
    /// Operating income (EBIT), used to rebuild EBITDA when it is not reported
    pub operating_income: Option<Money>,
    pub depreciation_amortization: Option<Money>,
    pub capital_expenditures: Option<Money>,
    pub net_working_capital: Option<Money>,
    pub current_assets: Option<Money>,
    pub current_liabilities: Option<Money>,
    pub income_tax_expense: Option<Money>,
    pub pre_tax_income: Option<Money>,
    pub disclosed_tax_rate: Option<Rate>,
    pub interest_expense: Option<Money>,
    pub total_debt: Option<Money>,
    pub long_term_debt: Option<Money>,
    pub short_term_debt: Option<Money>,
    pub market_cap: Option<Money>,
    pub beta: Option<Decimal>,
    pub risk_free_rate: Option<Rate>,
}

/// Fallback policy applied when a snapshot figure is missing, plus the
/// forward-looking assumptions a snapshot cannot supply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssumptionDefaults {
    pub years: u32,
    pub revenue_growth: Rate,
    pub ebitda_margin: Rate,
    pub da_pct_revenue: Rate,
    pub capex_pct_revenue: Rate,
    pub nwc_pct_revenue: Rate,
    pub exit_multiple: Multiple,
    pub equity_risk_premium: Rate,
    pub risk_free_rate: Rate,
    pub beta: Decimal,
}

impl Default for AssumptionDefaults {
    fn default() -> Self {
        AssumptionDefaults {
            years: 5,
            revenue_growth: dec!(0.06),
            ebitda_margin: dec!(0.25),
            da_pct_revenue: dec!(0.05),
            capex_pct_revenue: dec!(0.05),
            nwc_pct_revenue: dec!(0.02),
            exit_multiple: dec!(8.0),
            equity_risk_premium: dec!(0.055),
            risk_free_rate: dec!(0.03),
            beta: dec!(1.0),
        }
    }
}

/// Core inputs derived from a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeededInputs {
    pub profile: CompanyProfile,
    pub assumptions: Assumptions,
    pub capital: CapitalInputs,
    pub tax_rate_source: TaxRateSource,
}

/// JSON-friendly request bundling a snapshot with its fallback policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedRequest {
    pub snapshot: FinancialSnapshot,
    #[serde(default)]
    pub defaults: AssumptionDefaults,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Derive forecast assumptions and capital inputs from reported financials.
///
/// Revenue and market capitalisation are required; every other missing
/// figure falls back to `defaults` and is reported as a warning.
pub fn seed_inputs(
    snapshot: &FinancialSnapshot,
    defaults: &AssumptionDefaults,
) -> DcfResult<ComputationOutput<SeededInputs>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let revenue = match snapshot.revenue {
        Some(r) if r > Decimal::ZERO => r,
        Some(r) => {
            return Err(ValuationError::MissingData(format!(
                "revenue must be positive to derive ratios, got {r}"
            )))
        }
        None => return Err(ValuationError::MissingData("revenue".into())),
    };
    let market_cap = snapshot
        .market_cap
        .ok_or_else(|| ValuationError::MissingData("market capitalisation".into()))?;

    // --- Operating ratios ---
    let ebitda = match (
        snapshot.ebitda,
        snapshot.operating_income,
        snapshot.depreciation_amortization,
    ) {
        (Some(ebitda), _, _) => Some(ebitda),
        (None, Some(ebit), Some(da)) => Some(checked(
            ebit.checked_add(da.abs()),
            "EBITDA from operating income",
        )?),
        _ => None,
    };
    let nwc = match (
        snapshot.net_working_capital,
        snapshot.current_assets,
        snapshot.current_liabilities,
    ) {
        (Some(nwc), _, _) => Some(nwc),
        (None, Some(ca), Some(cl)) => Some(checked(
            ca.checked_sub(cl),
            "net working capital from current balances",
        )?),
        _ => None,
    };

    let ebitda_margin = ratio_or_default(
        ebitda,
        revenue,
        defaults.ebitda_margin,
        "EBITDA",
        &mut warnings,
    )?;
    let da_pct_revenue = ratio_or_default(
        snapshot.depreciation_amortization.map(|v| v.abs()),
        revenue,
        defaults.da_pct_revenue,
        "Depreciation & amortisation",
        &mut warnings,
    )?;
    let capex_pct_revenue = ratio_or_default(
        snapshot.capital_expenditures.map(|v| v.abs()),
        revenue,
        defaults.capex_pct_revenue,
        "Capital expenditures",
        &mut warnings,
    )?;
    let nwc_pct_revenue = ratio_or_default(
        nwc,
        revenue,
        defaults.nwc_pct_revenue,
        "Net working capital",
        &mut warnings,
    )?;

    // --- Tax ---
    let tax = estimate_tax_rate(
        snapshot.disclosed_tax_rate,
        snapshot.income_tax_expense,
        snapshot.pre_tax_income,
    );
    if tax.is_default() {
        warnings.push(format!(
            "Tax rate not disclosed and could not be estimated; using {}",
            tax.rate
        ));
    }

    // --- Capital structure ---
    let total_debt = match snapshot.total_debt {
        Some(debt) => debt,
        None => {
            let parts: Vec<Money> = [snapshot.long_term_debt, snapshot.short_term_debt]
                .into_iter()
                .flatten()
                .map(|v| v.abs())
                .collect();
            if parts.is_empty() {
                warnings.push("Total debt not reported; assuming all-equity financing".into());
            }
            checked(
                parts
                    .into_iter()
                    .try_fold(Decimal::ZERO, |acc, part| acc.checked_add(part)),
                "total debt from components",
            )?
        }
    };
    let interest_expense = match snapshot.interest_expense {
        Some(interest) => interest.abs(),
        None => {
            if total_debt > Decimal::ZERO {
                warnings.push(
                    "Interest expense not reported; cost of debt will be zero".into(),
                );
            }
            Decimal::ZERO
        }
    };
    let beta = snapshot.beta.unwrap_or_else(|| {
        warnings.push(format!("Beta not reported; using {}", defaults.beta));
        defaults.beta
    });
    let risk_free_rate = snapshot.risk_free_rate.unwrap_or_else(|| {
        warnings.push(format!(
            "Risk-free rate not supplied; using {}",
            defaults.risk_free_rate
        ));
        defaults.risk_free_rate
    });

    log::debug!(
        "seed: revenue {revenue}, market cap {market_cap}, tax {:?} {}",
        tax.source,
        tax.rate
    );

    let seeded = SeededInputs {
        profile: snapshot.profile.clone(),
        assumptions: Assumptions {
            revenue0: revenue,
            years: defaults.years,
            revenue_growth: defaults.revenue_growth,
            ebitda_margin,
            da_pct_revenue,
            capex_pct_revenue,
            nwc_pct_revenue,
            tax_rate: tax.rate,
            exit_multiple: defaults.exit_multiple,
            equity_risk_premium: defaults.equity_risk_premium,
        },
        capital: CapitalInputs {
            market_cap,
            total_debt,
            interest_expense,
            beta,
            tax_rate: tax.rate,
            risk_free_rate,
            equity_risk_premium: defaults.equity_risk_premium,
        },
        tax_rate_source: tax.source,
    };

    let request = SeedRequest {
        snapshot: snapshot.clone(),
        defaults: defaults.clone(),
    };
    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Assumptions seeded from reported financials",
        &request,
        warnings,
        elapsed,
        seeded,
    ))
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn ratio_or_default(
    amount: Option<Money>,
    revenue: Money,
    default: Rate,
    label: &str,
    warnings: &mut Vec<String>,
) -> DcfResult<Rate> {
    match amount {
        Some(value) => checked(
            value.checked_div(revenue),
            &format!("{label} as a fraction of revenue"),
        ),
        None => {
            warnings.push(format!(
                "{label} not reported; using default {default} of revenue"
            ));
            Ok(default)
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Currency;

    fn full_snapshot() -> FinancialSnapshot {
        FinancialSnapshot {
            profile: CompanyProfile {
                ticker: Some("ACME".into()),
                company_name: Some("Acme Corp".into()),
                currency: Currency::USD,
                period_end: None,
            },
            revenue: Some(dec!(1000)),
            ebitda: Some(dec!(250)),
            operating_income: Some(dec!(200)),
            depreciation_amortization: Some(dec!(-50)),
            capital_expenditures: Some(dec!(-60)),
            net_working_capital: Some(dec!(80)),
            current_assets: None,
            current_liabilities: None,
            income_tax_expense: Some(dec!(42)),
            pre_tax_income: Some(dec!(200)),
            disclosed_tax_rate: None,
            interest_expense: Some(dec!(-12)),
            total_debt: Some(dec!(300)),
            long_term_debt: None,
            short_term_debt: None,
            market_cap: Some(dec!(2000)),
            beta: Some(dec!(1.1)),
            risk_free_rate: Some(dec!(0.042)),
        }
    }

    #[test]
    fn test_full_snapshot_needs_no_fallbacks() {
        let out = seed_inputs(&full_snapshot(), &AssumptionDefaults::default()).unwrap();
        let seeded = &out.result;

        assert!(out.warnings.is_empty(), "unexpected warnings: {:?}", out.warnings);
        assert_eq!(seeded.assumptions.revenue0, dec!(1000));
        assert_eq!(seeded.assumptions.ebitda_margin, dec!(0.25));
        assert_eq!(seeded.assumptions.da_pct_revenue, dec!(0.05));
        assert_eq!(seeded.assumptions.capex_pct_revenue, dec!(0.06));
        assert_eq!(seeded.assumptions.nwc_pct_revenue, dec!(0.08));
        // 42 / 200
        assert_eq!(seeded.assumptions.tax_rate, dec!(0.21));
        assert_eq!(seeded.tax_rate_source, TaxRateSource::Implied);
        assert_eq!(seeded.capital.interest_expense, dec!(12));
        assert_eq!(seeded.capital.tax_rate, seeded.assumptions.tax_rate);
        assert_eq!(seeded.profile.ticker.as_deref(), Some("ACME"));
    }

    #[test]
    fn test_missing_revenue() {
        let mut snap = full_snapshot();
        snap.revenue = None;
        match seed_inputs(&snap, &AssumptionDefaults::default()) {
            Err(ValuationError::MissingData(what)) => assert_eq!(what, "revenue"),
            other => panic!("Expected MissingData, got {other:?}"),
        }
    }

    #[test]
    fn test_zero_revenue_is_missing_data() {
        let mut snap = full_snapshot();
        snap.revenue = Some(Decimal::ZERO);
        assert!(matches!(
            seed_inputs(&snap, &AssumptionDefaults::default()),
            Err(ValuationError::MissingData(_))
        ));
    }

    #[test]
    fn test_missing_market_cap() {
        let mut snap = full_snapshot();
        snap.market_cap = None;
        assert!(matches!(
            seed_inputs(&snap, &AssumptionDefaults::default()),
            Err(ValuationError::MissingData(_))
        ));
    }

    #[test]
    fn test_reported_zero_differs_from_missing() {
        let mut snap = full_snapshot();
        snap.capital_expenditures = Some(Decimal::ZERO);
        let out = seed_inputs(&snap, &AssumptionDefaults::default()).unwrap();
        assert_eq!(out.result.assumptions.capex_pct_revenue, Decimal::ZERO);
        assert!(out.warnings.is_empty());

        snap.capital_expenditures = None;
        let out = seed_inputs(&snap, &AssumptionDefaults::default()).unwrap();
        assert_eq!(out.result.assumptions.capex_pct_revenue, dec!(0.05));
        assert!(out.warnings.iter().any(|w| w.starts_with("Capital expenditures")));
    }

    #[test]
    fn test_ebitda_rebuilt_from_operating_income() {
        let mut snap = full_snapshot();
        snap.ebitda = None;
        let out = seed_inputs(&snap, &AssumptionDefaults::default()).unwrap();
        // 200 + |-50| = 250
        assert_eq!(out.result.assumptions.ebitda_margin, dec!(0.25));
    }

    #[test]
    fn test_nwc_from_current_balances() {
        let mut snap = full_snapshot();
        snap.net_working_capital = None;
        snap.current_assets = Some(dec!(400));
        snap.current_liabilities = Some(dec!(350));
        let out = seed_inputs(&snap, &AssumptionDefaults::default()).unwrap();
        assert_eq!(out.result.assumptions.nwc_pct_revenue, dec!(0.05));
    }

    #[test]
    fn test_debt_from_components() {
        let mut snap = full_snapshot();
        snap.total_debt = None;
        snap.long_term_debt = Some(dec!(250));
        snap.short_term_debt = Some(dec!(25));
        let out = seed_inputs(&snap, &AssumptionDefaults::default()).unwrap();
        assert_eq!(out.result.capital.total_debt, dec!(275));
    }

    #[test]
    fn test_no_debt_reported() {
        let mut snap = full_snapshot();
        snap.total_debt = None;
        snap.interest_expense = None;
        let out = seed_inputs(&snap, &AssumptionDefaults::default()).unwrap();
        assert_eq!(out.result.capital.total_debt, Decimal::ZERO);
        assert_eq!(out.result.capital.interest_expense, Decimal::ZERO);
        assert!(out.warnings.iter().any(|w| w.contains("all-equity")));
    }

    #[test]
    fn test_market_fallbacks() {
        let mut snap = full_snapshot();
        snap.beta = None;
        snap.risk_free_rate = None;
        snap.income_tax_expense = None;
        let out = seed_inputs(&snap, &AssumptionDefaults::default()).unwrap();
        assert_eq!(out.result.capital.beta, dec!(1.0));
        assert_eq!(out.result.capital.risk_free_rate, dec!(0.03));
        assert_eq!(out.result.assumptions.tax_rate, dec!(0.25));
        assert_eq!(out.result.tax_rate_source, TaxRateSource::Default);
        assert_eq!(out.warnings.len(), 3);
    }

    #[test]
    fn test_custom_defaults_flow_through() {
        let defaults = AssumptionDefaults {
            years: 10,
            exit_multiple: dec!(12),
            ..AssumptionDefaults::default()
        };
        let out = seed_inputs(&full_snapshot(), &defaults).unwrap();
        assert_eq!(out.result.assumptions.years, 10);
        assert_eq!(out.result.assumptions.exit_multiple, dec!(12));
    }

    #[test]
    fn test_working_capital_above_revenue_seeds_as_is() {
        let mut snap = full_snapshot();
        snap.net_working_capital = Some(dec!(1500));
        let out = seed_inputs(&snap, &AssumptionDefaults::default()).unwrap();
        assert_eq!(out.result.assumptions.nwc_pct_revenue, dec!(1.5));
    }

    #[test]
    fn test_tiny_revenue_overflows_instead_of_panicking() {
        let mut snap = full_snapshot();
        snap.revenue = Some(dec!(0.0000000001));
        snap.ebitda = Some(dec!(10000000000000000000000));
        match seed_inputs(&snap, &AssumptionDefaults::default()) {
            Err(ValuationError::Overflow { context }) => {
                assert_eq!(context, "EBITDA as a fraction of revenue")
            }
            other => panic!("Expected Overflow, got {other:?}"),
        }
    }

    #[test]
    fn test_debt_components_overflow() {
        let mut snap = full_snapshot();
        snap.total_debt = None;
        snap.long_term_debt = Some(dec!(70000000000000000000000000000));
        snap.short_term_debt = Some(dec!(70000000000000000000000000000));
        assert!(matches!(
            seed_inputs(&snap, &AssumptionDefaults::default()),
            Err(ValuationError::Overflow { .. })
        ));
    }

    #[test]
    fn test_seed_request_defaults_optional() {
        let json = r#"{ "snapshot": { "revenue": "1000", "market_cap": "2500" } }"#;
        let req: SeedRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.defaults, AssumptionDefaults::default());
        assert_eq!(req.snapshot.revenue, Some(dec!(1000)));
    }

    #[test]
    fn test_snapshot_deserializes_with_flattened_profile() {
        let json = r#"{
            "ticker": "ACME", "currency": "EUR", "period_end": "2024-12-31",
            "revenue": "1000", "market_cap": "2500"
        }"#;
        let snap: FinancialSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snap.profile.ticker.as_deref(), Some("ACME"));
        assert_eq!(snap.profile.currency, Currency::EUR);
        assert!(snap.profile.period_end.is_some());
        assert!(snap.ebitda.is_none());
    }
}
