//! Export computed emissions: CSV, JSON report, and a shareable mailto link.
//!
//! The CSV is meant to be easy to consume in spreadsheets or downstream scripts.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::domain::{Recommendation, Scope, TotalEmissions};
use crate::error::AppError;

/// Car trips around the Earth per tCO2e.
pub const EARTH_TRIPS_PER_TONNE: f64 = 111.0;

pub fn earth_trips(total_t: f64) -> f64 {
    (total_t * EARTH_TRIPS_PER_TONNE).round()
}

/// Write the emission breakdown as CSV to any writer.
///
/// Rows: every category detail, every category, the three scopes, the total,
/// the car-trip equivalence, then one row per recommendation (item is
/// `Priority: title`, the value column carries the estimated impact).
pub fn write_emissions_csv<W: Write>(
    writer: W,
    totals: &TotalEmissions,
    recommendations: &[Recommendation],
) -> Result<(), AppError> {
    let mut wtr = csv::Writer::from_writer(writer);

    write_row(&mut wtr, ["section", "category", "scope", "item", "emissions_t", "share_pct"])?;

    for r in &totals.by_category {
        let scope = r.scope.number().to_string();
        for (item, value) in &r.details {
            write_row(
                &mut wtr,
                [
                    "detail",
                    r.category.as_str(),
                    &scope,
                    item,
                    &fmt_t(*value),
                    &fmt_pct(totals.share_pct(*value)),
                ],
            )?;
        }
    }

    for r in &totals.by_category {
        write_row(
            &mut wtr,
            [
                "category",
                r.category.as_str(),
                &r.scope.number().to_string(),
                r.category.display_name(),
                &fmt_t(r.emissions),
                &fmt_pct(totals.share_pct(r.emissions)),
            ],
        )?;
    }

    for scope in Scope::ALL {
        let value = totals.scope_total(scope);
        write_row(
            &mut wtr,
            [
                "scope",
                "",
                &scope.number().to_string(),
                scope.description(),
                &fmt_t(value),
                &fmt_pct(totals.share_pct(value)),
            ],
        )?;
    }

    let total_share = if totals.total > 0.0 { 100.0 } else { 0.0 };
    write_row(
        &mut wtr,
        ["total", "", "", "Total", &fmt_t(totals.total), &fmt_pct(total_share)],
    )?;
    write_row(
        &mut wtr,
        [
            "equivalence",
            "",
            "",
            &format!("{} car trips around the Earth", earth_trips(totals.total)),
            &fmt_t(totals.total),
            "",
        ],
    )?;

    for rec in recommendations {
        let (topic, scope) = match rec.category {
            Some(c) => (c.as_str(), c.scope().number().to_string()),
            None => ("general", String::new()),
        };
        write_row(
            &mut wtr,
            [
                "recommendation",
                topic,
                &scope,
                &format!("{}: {}", rec.priority.display_name(), rec.title),
                &fmt_t(rec.impact),
                "",
            ],
        )?;
    }

    wtr.flush()
        .map_err(|e| AppError::input(format!("Failed to flush export CSV: {e}")))?;
    Ok(())
}

fn write_row<W: Write>(wtr: &mut csv::Writer<W>, fields: [&str; 6]) -> Result<(), AppError> {
    wtr.write_record(fields)
        .map_err(|e| AppError::input(format!("Failed to write export CSV row: {e}")))
}

/// Write the emission breakdown to a CSV file.
pub fn write_emissions_csv_file(
    path: &Path,
    totals: &TotalEmissions,
    recommendations: &[Recommendation],
) -> Result<(), AppError> {
    let file = File::create(path).map_err(|e| {
        AppError::input(format!("Failed to create export CSV '{}': {e}", path.display()))
    })?;
    write_emissions_csv(file, totals, recommendations)?;
    log::info!("wrote CSV export to {}", path.display());
    Ok(())
}

/// The JSON report document.
#[derive(Debug, Clone, Serialize)]
pub struct ReportFile<'a> {
    pub tool: &'static str,
    pub generated_at: DateTime<Utc>,
    pub emissions: &'a TotalEmissions,
    pub recommendations: &'a [Recommendation],
}

impl<'a> ReportFile<'a> {
    pub fn new(
        emissions: &'a TotalEmissions,
        recommendations: &'a [Recommendation],
        generated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            tool: "ges",
            generated_at,
            emissions,
            recommendations,
        }
    }

    pub fn to_json_pretty(&self) -> Result<String, AppError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| AppError::internal(format!("Failed to serialize report: {e}")))
    }
}

pub fn write_report_json(path: &Path, report: &ReportFile<'_>) -> Result<(), AppError> {
    let file = File::create(path).map_err(|e| {
        AppError::input(format!("Failed to create report JSON '{}': {e}", path.display()))
    })?;
    serde_json::to_writer_pretty(file, report)
        .map_err(|e| AppError::input(format!("Failed to write report JSON: {e}")))?;
    log::info!("wrote JSON report to {}", path.display());
    Ok(())
}

/// Build a `mailto:` link sharing the headline numbers.
pub fn mailto_link(totals: &TotalEmissions, date: NaiveDate) -> String {
    let subject = format!("GHG assessment - {:.2} tCO2e/year", totals.total);

    let mut body = String::new();
    body.push_str("Hello,\n\nHere is our greenhouse gas emissions assessment:\n\n");
    body.push_str(&format!("Total emissions: {:.2} tCO2e/year\n", totals.total));
    body.push_str(&format!(
        "Equivalent to {} car trips around the Earth\n\n",
        earth_trips(totals.total)
    ));
    body.push_str("By scope:\n");
    for scope in Scope::ALL {
        body.push_str(&format!(
            "- {scope}: {:.1} tCO2e ({})\n",
            totals.scope_total(scope),
            scope.description()
        ));
    }
    let ranked = totals.ranked();
    if !ranked.is_empty() {
        body.push_str("\nTop categories:\n");
        for r in ranked.iter().take(3) {
            body.push_str(&format!(
                "- {}: {:.2} tCO2e ({:.1}%)\n",
                r.category.display_name(),
                r.emissions,
                totals.share_pct(r.emissions)
            ));
        }
    }
    body.push_str(&format!("\nReport generated on {date}\n"));

    format!(
        "mailto:?subject={}&body={}",
        percent_encode(&subject),
        percent_encode(&body)
    )
}

/// URI component encoding: everything but `A-Z a-z 0-9 - _ . ! ~ * ' ( )` as UTF-8 `%XX`.
fn percent_encode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'-'
            | b'_'
            | b'.'
            | b'!'
            | b'~'
            | b'*'
            | b'\''
            | b'('
            | b')' => out.push(b as char),
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}

fn fmt_t(v: f64) -> String {
    format!("{v:.6}")
}

fn fmt_pct(v: f64) -> String {
    format!("{v:.2}")
}
