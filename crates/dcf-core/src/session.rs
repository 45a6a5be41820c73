//! Caller-owned record of the "current" valuation session.
//!
//! The valuation operations themselves are pure. An orchestrator (CLI, UI,
//! bindings) keeps one `Session`, changes it through the setters and asks it
//! to recompute; the last successful run is cached on the record itself.

use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::ValuationError;
use crate::types::{with_metadata, CompanyProfile, ComputationOutput, Rate};
use crate::valuation::dcf::{valuate, ValuationOutput};
use crate::valuation::forecast::{forecast_fcff, Assumptions, ForecastTable};
use crate::valuation::wacc::{CapitalInputs, WaccOutput};
use crate::valuation::wacc_override::resolve_wacc;
use crate::DcfResult;

#[cfg(feature = "inputs")]
use crate::inputs::snapshot::SeededInputs;

/// Results of one successful recompute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRun {
    /// WACC breakdown, present when the rate came from capital inputs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wacc: Option<WaccOutput>,
    /// Discount rate applied to the forecast
    pub discount_rate: Rate,
    pub forecast: ForecastTable,
    pub valuation: ValuationOutput,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Session {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    profile: Option<CompanyProfile>,
    #[serde(default)]
    assumptions: Assumptions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    capital: Option<CapitalInputs>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    equity_weight_override: Option<Rate>,
    /// Manual WACC, used only when no capital inputs are present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    discount_rate: Option<Rate>,
    #[serde(skip)]
    latest: Option<SessionRun>,
}

impl Session {
    pub fn new(assumptions: Assumptions) -> Self {
        Session {
            assumptions,
            ..Session::default()
        }
    }

    #[cfg(feature = "inputs")]
    pub fn from_seeded(seeded: SeededInputs) -> Self {
        Session {
            profile: Some(seeded.profile),
            assumptions: seeded.assumptions,
            capital: Some(seeded.capital),
            ..Session::default()
        }
    }

    pub fn profile(&self) -> Option<&CompanyProfile> {
        self.profile.as_ref()
    }

    pub fn assumptions(&self) -> &Assumptions {
        &self.assumptions
    }

    pub fn capital(&self) -> Option<&CapitalInputs> {
        self.capital.as_ref()
    }

    pub fn equity_weight_override(&self) -> Option<Rate> {
        self.equity_weight_override
    }

    pub fn discount_rate(&self) -> Option<Rate> {
        self.discount_rate
    }

    /// Last successful run, if the inputs have not changed since.
    pub fn latest(&self) -> Option<&SessionRun> {
        self.latest.as_ref()
    }

    pub fn set_profile(&mut self, profile: Option<CompanyProfile>) {
        self.profile = profile;
    }

    pub fn set_assumptions(&mut self, assumptions: Assumptions) {
        self.assumptions = assumptions;
        self.latest = None;
    }

    pub fn set_capital(&mut self, capital: Option<CapitalInputs>) {
        self.capital = capital;
        self.latest = None;
    }

    pub fn set_equity_weight_override(&mut self, equity_weight: Option<Rate>) {
        self.equity_weight_override = equity_weight;
        self.latest = None;
    }

    pub fn set_discount_rate(&mut self, rate: Option<Rate>) {
        self.discount_rate = rate;
        self.latest = None;
    }

    /// Resolve the discount rate, forecast, and value the company.
    ///
    /// `latest` is replaced only when every step succeeds.
    pub fn recompute(&mut self) -> DcfResult<ComputationOutput<SessionRun>> {
        let start = Instant::now();
        let mut warnings: Vec<String> = Vec::new();

        let (wacc, discount_rate) = self.resolve_discount_rate(&mut warnings)?;

        let forecast = forecast_fcff(&self.assumptions)?;
        for w in &forecast.warnings {
            warnings.push(format!("[forecast] {w}"));
        }

        let valuation = valuate(
            &forecast.result,
            discount_rate,
            self.assumptions.exit_multiple,
        )?;
        for w in &valuation.warnings {
            warnings.push(format!("[valuation] {w}"));
        }

        let run = SessionRun {
            wacc,
            discount_rate,
            forecast: forecast.result,
            valuation: valuation.result,
        };
        self.latest = Some(run.clone());

        let elapsed = start.elapsed().as_micros() as u64;

        Ok(with_metadata(
            "Session recompute: WACC, FCFF forecast, exit-multiple DCF",
            &*self,
            warnings,
            elapsed,
            run,
        ))
    }

    fn resolve_discount_rate(
        &self,
        warnings: &mut Vec<String>,
    ) -> DcfResult<(Option<WaccOutput>, Rate)> {
        if let Some(capital) = &self.capital {
            if capital.equity_risk_premium != self.assumptions.equity_risk_premium {
                log::debug!(
                    "session: capital ERP {} replaced by assumptions ERP {}",
                    capital.equity_risk_premium,
                    self.assumptions.equity_risk_premium
                );
            }
            let capital = CapitalInputs {
                equity_risk_premium: self.assumptions.equity_risk_premium,
                ..capital.clone()
            };
            let wacc = resolve_wacc(&capital, self.equity_weight_override)?;
            for w in &wacc.warnings {
                warnings.push(format!("[wacc] {w}"));
            }
            if self.discount_rate.is_some() {
                warnings.push(
                    "Manual discount rate ignored; WACC derived from capital inputs".into(),
                );
            }
            let rate = wacc.result.wacc;
            return Ok((Some(wacc.result), rate));
        }

        match self.discount_rate {
            Some(rate) => {
                if self.equity_weight_override.is_some() {
                    warnings.push(
                        "Equity weight override ignored without capital inputs".into(),
                    );
                }
                Ok((None, rate))
            }
            None => Err(ValuationError::MissingData(
                "discount rate: provide capital inputs or a manual discount rate".into(),
            )),
        }
    }
}
