// src/services/export.rs
use anyhow::{anyhow, Result};
use csv::Writer;

use crate::models::Company;

const HEADERS: [&str; 31] = [
    "symbol", "company_name", "price", "pe", "py_eps",
    "cy_eps_low", "cy_eps_avg", "cy_eps_high",
    "cy_eps_change_percent_low", "cy_eps_change_percent_avg", "cy_eps_change_percent_high",
    "cy_pe_low", "cy_pe_avg", "cy_pe_high",
    "cy_peg_low", "cy_peg_avg", "cy_peg_high",
    "ny_eps_low", "ny_eps_avg", "ny_eps_high",
    "ny_eps_change_percent_low", "ny_eps_change_percent_avg", "ny_eps_change_percent_high",
    "ny_pe_low", "ny_pe_avg", "ny_pe_high",
    "ny_peg_low", "ny_peg_avg", "ny_peg_high",
    "synthetic", "updated_at",
];

// Undefined metrics export as empty cells.
fn cell(value: Option<f64>) -> String {
    value.map(|v| format!("{:.4}", v)).unwrap_or_default()
}

/// Render the watchlist as CSV, one row per company.
pub fn watchlist_csv(companies: &[Company]) -> Result<String> {
    let mut writer = Writer::from_writer(Vec::new());
    writer.write_record(HEADERS)?;

    for company in companies {
        let r = &company.record;
        writer.write_record([
            r.symbol.clone(),
            r.company_name.clone(),
            format!("{:.2}", r.price),
            format!("{:.2}", r.pe),
            format!("{:.4}", r.py_eps),
            cell(r.cy_eps_low),
            cell(r.cy_eps_avg),
            cell(r.cy_eps_high),
            cell(r.cy_eps_change_percent_low),
            cell(r.cy_eps_change_percent_avg),
            cell(r.cy_eps_change_percent_high),
            cell(r.cy_pe_low),
            cell(r.cy_pe_avg),
            cell(r.cy_pe_high),
            cell(r.cy_peg_low),
            cell(r.cy_peg_avg),
            cell(r.cy_peg_high),
            cell(r.ny_eps_low),
            cell(r.ny_eps_avg),
            cell(r.ny_eps_high),
            cell(r.ny_eps_change_percent_low),
            cell(r.ny_eps_change_percent_avg),
            cell(r.ny_eps_change_percent_high),
            cell(r.ny_pe_low),
            cell(r.ny_pe_avg),
            cell(r.ny_pe_high),
            cell(r.ny_peg_low),
            cell(r.ny_peg_avg),
            cell(r.ny_peg_high),
            company.synthetic.to_string(),
            company.updated_at.to_rfc3339(),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow!("Failed to flush CSV writer: {}", e.error()))?;
    Ok(String::from_utf8(bytes)?)
}
