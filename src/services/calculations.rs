// src/services/calculations.rs
use chrono::{DateTime, Utc};
use serde::Serialize;
use log::warn;

use crate::models::{Company, ValuationRecord};

/// P/E treated as fair when estimating a price target.
const FAIR_PE: f64 = 15.0;
/// P/E above which a valuation alert is raised.
const HIGH_PE_ALERT: f64 = 100.0;

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CompanyMetrics {
    pub calculated_pe: Option<f64>,
    pub cy_peg_from_growth: Option<f64>,
    pub ny_peg_from_growth: Option<f64>,
    pub eps_growth_rate: Option<f64>,
    pub fair_value: Option<f64>,
    pub current_valuation: Option<f64>,
    pub margin_of_safety: Option<f64>,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioStats {
    pub total_companies: usize,
    pub average_pe: f64,
    pub top_performer: Option<String>,
    pub last_updated: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MarketTrends {
    pub average_pe: f64,
    pub average_growth: f64,
    pub average_peg: f64,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum InsightKind {
    Info,
    Growth,
    Warning,
    Success,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct Insight {
    pub kind: InsightKind,
    pub title: String,
    pub message: String,
}

fn ratio(numerator: f64, divisor: f64) -> Option<f64> {
    if divisor == 0.0 {
        return None;
    }
    let value = numerator / divisor;
    value.is_finite().then_some(value)
}

fn calculate_average(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Fair value and margin-of-safety style figures for a single record.
pub fn company_metrics(record: &ValuationRecord) -> CompanyMetrics {
    let positive_growth = |growth: Option<f64>| growth.filter(|g| *g > 0.0);

    let cy_peg_from_growth = match (record.cy_pe_avg, positive_growth(record.cy_eps_change_percent_avg)) {
        (Some(pe), Some(growth)) => ratio(pe, growth),
        _ => None,
    };
    let ny_peg_from_growth = match (record.ny_pe_avg, positive_growth(record.ny_eps_change_percent_avg)) {
        (Some(pe), Some(growth)) => ratio(pe, growth),
        _ => None,
    };

    let eps_growth_rate = match (record.cy_eps_avg, record.ny_eps_avg) {
        (Some(cy), Some(ny)) => ratio(ny - cy, cy).map(|r| r * 100.0),
        _ => None,
    };

    let fair_value = record.ny_eps_avg.map(|eps| eps * FAIR_PE);
    let margin_of_safety = fair_value
        .and_then(|fair| ratio(fair - record.price, fair))
        .map(|r| r * 100.0);

    CompanyMetrics {
        calculated_pe: record.cy_eps_avg.and_then(|eps| ratio(record.price, eps)),
        cy_peg_from_growth,
        ny_peg_from_growth,
        eps_growth_rate,
        fair_value,
        current_valuation: record.ny_eps_avg.and_then(|eps| ratio(record.price, eps)),
        margin_of_safety,
    }
}

fn ny_growth(company: &Company) -> Option<f64> {
    company.record.ny_eps_change_percent_avg
}

fn best_growth(companies: &[Company]) -> Option<&Company> {
    companies
        .iter()
        .filter(|c| ny_growth(c).is_some())
        .max_by(|a, b| {
            ny_growth(a)
                .unwrap_or_default()
                .total_cmp(&ny_growth(b).unwrap_or_default())
        })
}

pub fn portfolio_stats(companies: &[Company]) -> PortfolioStats {
    let pes: Vec<f64> = companies.iter().map(|c| c.record.pe).collect();

    PortfolioStats {
        total_companies: companies.len(),
        average_pe: calculate_average(&pes),
        top_performer: best_growth(companies).map(|c| c.record.symbol.clone()),
        last_updated: companies.iter().map(|c| c.updated_at).max(),
    }
}

pub fn market_trends(companies: &[Company]) -> MarketTrends {
    let pes: Vec<f64> = companies.iter().map(|c| c.record.pe).collect();
    let growth: Vec<f64> = companies.iter().filter_map(ny_growth).collect();
    let pegs: Vec<f64> = companies
        .iter()
        .filter_map(|c| c.record.ny_peg_avg)
        .filter(|peg| *peg > 0.0)
        .collect();

    if !companies.is_empty() && pegs.is_empty() {
        warn!("No defined next-year PEG values across {} companies", companies.len());
    }

    MarketTrends {
        average_pe: calculate_average(&pes),
        average_growth: calculate_average(&growth),
        average_peg: calculate_average(&pegs),
    }
}

/// Narrative observations about the watchlist as a whole.
pub fn portfolio_insights(companies: &[Company]) -> Vec<Insight> {
    if companies.is_empty() {
        return vec![Insight {
            kind: InsightKind::Info,
            title: "Get Started".to_string(),
            message: "Add companies to your watchlist to see portfolio insights".to_string(),
        }];
    }

    let mut insights = Vec::new();

    if let Some(best) = best_growth(companies) {
        insights.push(Insight {
            kind: InsightKind::Growth,
            title: "Growth Opportunity".to_string(),
            message: format!(
                "{} shows strong future EPS growth potential with {:.0}% projected increase",
                best.record.symbol,
                ny_growth(best).unwrap_or_default()
            ),
        });
    }

    let highest_pe = companies
        .iter()
        .max_by(|a, b| a.record.pe.total_cmp(&b.record.pe));
    if let Some(highest) = highest_pe.filter(|c| c.record.pe > HIGH_PE_ALERT) {
        insights.push(Insight {
            kind: InsightKind::Warning,
            title: "Valuation Alert".to_string(),
            message: format!(
                "{} trading at high P/E ratio of {:.0}, monitor for value correction",
                highest.record.symbol, highest.record.pe
            ),
        });
    }

    insights.push(Insight {
        kind: InsightKind::Success,
        title: "Portfolio Analysis".to_string(),
        message: format!(
            "Good diversification across {} companies with mixed growth and value characteristics",
            companies.len()
        ),
    });

    insights
}
