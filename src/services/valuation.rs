// src/services/valuation.rs
//! Valuation derivation: turns a raw price quote into the full EPS / P/E / PEG
//! band record for the current and next fiscal year.
//!
//! The pipeline runs in four stages (EPS, growth %, P/E, PEG) and each stage
//! only consumes the outputs of the one before it. Any division with a zero
//! divisor produces `None` instead of `NaN`/`Infinity`, and growth within
//! rounding noise of the baseline counts as zero.
use log::debug;
use thiserror::Error;

use crate::models::{RawQuote, ValuationRecord};

/// EPS changes smaller than this fraction of the baseline count as zero growth.
const GROWTH_EPSILON: f64 = 1e-12;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValuationError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Fixed policy constants used to fabricate the estimate bands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValuationAssumptions {
    /// Assumed trailing P/E used to back out trailing EPS from price.
    pub trailing_pe: f64,
    /// Prior-year EPS as a fraction of trailing EPS.
    pub prior_year_factor: f64,
    /// Current-year average EPS as a multiple of trailing EPS.
    pub cy_growth: f64,
    /// Half-width of the current-year band, as a fraction of the average.
    pub cy_band: f64,
    /// Next-year average EPS as a multiple of current-year average EPS.
    pub ny_growth: f64,
    /// Half-width of the next-year band.
    pub ny_band: f64,
}

impl Default for ValuationAssumptions {
    fn default() -> Self {
        ValuationAssumptions {
            trailing_pe: 20.0,
            prior_year_factor: 0.90,
            cy_growth: 1.05,
            cy_band: 0.05,
            ny_growth: 1.08,
            ny_band: 0.08,
        }
    }
}

impl ValuationAssumptions {
    fn validate(&self) -> Result<(), ValuationError> {
        let multipliers = [
            ("trailing_pe", self.trailing_pe),
            ("prior_year_factor", self.prior_year_factor),
            ("cy_growth", self.cy_growth),
            ("ny_growth", self.ny_growth),
        ];
        for (name, value) in multipliers {
            if !value.is_finite() || value <= 0.0 {
                return Err(ValuationError::InvalidInput(format!(
                    "{} must be a positive number, got {}",
                    name, value
                )));
            }
        }
        for (name, value) in [("cy_band", self.cy_band), ("ny_band", self.ny_band)] {
            if !value.is_finite() || !(0.0..1.0).contains(&value) {
                return Err(ValuationError::InvalidInput(format!(
                    "{} must be in [0, 1), got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Band<T> {
    low: T,
    avg: T,
    high: T,
}

impl Band<f64> {
    fn around(avg: f64, half_width: f64) -> Self {
        Band {
            low: avg * (1.0 - half_width),
            avg,
            high: avg * (1.0 + half_width),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct YearProjection {
    eps: Band<f64>,
    change_percent: Band<Option<f64>>,
    pe: Band<Option<f64>>,
    peg: Band<Option<f64>>,
}

fn safe_div(numerator: f64, divisor: f64) -> Option<f64> {
    if !divisor.is_finite() || divisor == 0.0 {
        return None;
    }
    let quotient = numerator / divisor;
    quotient.is_finite().then_some(quotient)
}

// Tolerance is relative to the baseline so it holds at any price scale.
fn change_percent(value: f64, baseline: f64) -> Option<f64> {
    let delta = value - baseline;
    if delta.abs() <= baseline.abs() * GROWTH_EPSILON {
        return safe_div(0.0, baseline);
    }
    safe_div(delta, baseline).map(|ratio| ratio * 100.0)
}

fn peg(pe: Option<f64>, growth_percent: Option<f64>) -> Option<f64> {
    safe_div(pe?, growth_percent?.abs())
}

/// Growth, P/E and PEG for one fiscal year given its EPS band.
///
/// P/E is inversely related to EPS, so the low P/E comes from the high EPS.
/// PEG keeps the same crossing: the low PEG pairs the low P/E with the high
/// growth figure.
fn project_year(price: f64, eps: Band<f64>, baseline: f64) -> YearProjection {
    let change_percent = Band {
        low: change_percent(eps.low, baseline),
        avg: change_percent(eps.avg, baseline),
        high: change_percent(eps.high, baseline),
    };
    let pe = Band {
        low: safe_div(price, eps.high),
        avg: safe_div(price, eps.avg),
        high: safe_div(price, eps.low),
    };
    let peg = Band {
        low: peg(pe.low, change_percent.high),
        avg: peg(pe.avg, change_percent.avg),
        high: peg(pe.high, change_percent.low),
    };
    YearProjection { eps, change_percent, pe, peg }
}

/// Stateless engine; cheap to copy into every request.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ValuationEngine {
    assumptions: ValuationAssumptions,
}

impl ValuationEngine {
    pub fn new(assumptions: ValuationAssumptions) -> Self {
        ValuationEngine { assumptions }
    }

    pub fn with_trailing_pe(trailing_pe: f64) -> Self {
        ValuationEngine::new(ValuationAssumptions {
            trailing_pe,
            ..ValuationAssumptions::default()
        })
    }

    pub fn assumptions(&self) -> &ValuationAssumptions {
        &self.assumptions
    }

    pub fn derive(&self, quote: &RawQuote) -> Result<ValuationRecord, ValuationError> {
        let price = quote.price;
        if !price.is_finite() || price <= 0.0 {
            return Err(ValuationError::InvalidInput(format!(
                "price for {} must be positive, got {}",
                quote.symbol, price
            )));
        }
        self.assumptions.validate()?;
        let a = &self.assumptions;

        // Trailing and prior-year EPS
        let trailing_eps = price / a.trailing_pe;
        let py_eps = trailing_eps * a.prior_year_factor;

        // EPS bands, next year compounds from the current-year average
        let cy_eps = Band::around(trailing_eps * a.cy_growth, a.cy_band);
        let ny_eps = Band::around(cy_eps.avg * a.ny_growth, a.ny_band);

        let cy = project_year(price, cy_eps, py_eps);
        let ny = project_year(price, ny_eps, cy_eps.avg);

        debug!(
            "Derived valuation for {}: cy_eps_avg={} ny_eps_avg={} cy_peg_avg={:?}",
            quote.symbol, cy.eps.avg, ny.eps.avg, cy.peg.avg
        );

        let symbol = quote.symbol.trim().to_uppercase();
        let company_name = quote
            .company_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| symbol.clone());

        Ok(ValuationRecord {
            symbol,
            company_name,
            price,
            pe: a.trailing_pe,
            py_eps,

            cy_eps_low: Some(cy.eps.low),
            cy_eps_avg: Some(cy.eps.avg),
            cy_eps_high: Some(cy.eps.high),
            cy_eps_change_percent_low: cy.change_percent.low,
            cy_eps_change_percent_avg: cy.change_percent.avg,
            cy_eps_change_percent_high: cy.change_percent.high,
            cy_pe_low: cy.pe.low,
            cy_pe_avg: cy.pe.avg,
            cy_pe_high: cy.pe.high,
            cy_peg_low: cy.peg.low,
            cy_peg_avg: cy.peg.avg,
            cy_peg_high: cy.peg.high,

            ny_eps_low: Some(ny.eps.low),
            ny_eps_avg: Some(ny.eps.avg),
            ny_eps_high: Some(ny.eps.high),
            ny_eps_change_percent_low: ny.change_percent.low,
            ny_eps_change_percent_avg: ny.change_percent.avg,
            ny_eps_change_percent_high: ny.change_percent.high,
            ny_pe_low: ny.pe.low,
            ny_pe_avg: ny.pe.avg,
            ny_pe_high: ny.pe.high,
            ny_peg_low: ny.peg.low,
            ny_peg_avg: ny.peg.avg,
            ny_peg_high: ny.peg.high,
        })
    }
}

/// Derive a record with the default assumptions.
pub fn derive(quote: &RawQuote) -> Result<ValuationRecord, ValuationError> {
    ValuationEngine::default().derive(quote)
}
