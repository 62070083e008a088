//! Horizontal bar charts for terminal output.
//!
//! Fixed width and no terminal probing, so the output is deterministic and can be
//! compared against golden strings.

use crate::domain::{Scope, TotalEmissions};

const LABEL_WIDTH: usize = 24;

/// Bars for each category, largest first, scaled to the largest category.
pub fn render_category_bars(totals: &TotalEmissions, width: usize) -> String {
    let rows: Vec<(&str, f64)> = totals
        .ranked()
        .into_iter()
        .map(|r| (r.category.display_name(), r.emissions))
        .collect();
    render_bars("Emissions by category (tCO2e)", &rows, totals.total, width)
}

/// Bars for the three scopes, in scope order.
pub fn render_scope_bars(totals: &TotalEmissions, width: usize) -> String {
    let labels = ["Scope 1", "Scope 2", "Scope 3"];
    let rows: Vec<(&str, f64)> = Scope::ALL
        .into_iter()
        .zip(labels)
        .map(|(s, label)| (label, totals.scope_total(s)))
        .collect();
    render_bars("Emissions by scope (tCO2e)", &rows, totals.total, width)
}

fn render_bars(title: &str, rows: &[(&str, f64)], total: f64, width: usize) -> String {
    let width = width.max(10);
    let max = rows.iter().map(|&(_, v)| v).fold(0.0_f64, f64::max);

    let mut out = String::new();
    out.push_str(title);
    out.push('\n');

    if max <= 0.0 {
        out.push_str("(no emissions)\n");
        return out;
    }

    for &(label, value) in rows {
        let len = bar_len(value, max, width);
        let share = if total > 0.0 { value / total * 100.0 } else { 0.0 };
        let line = format!(
            "{:<lw$} |{:<width$}| {value:>10.2} {share:>5.1}%",
            truncate(label, LABEL_WIDTH),
            "#".repeat(len),
            lw = LABEL_WIDTH,
        );
        out.push_str(&line);
        out.push('\n');
    }
    out
}

/// Bar length in cells; any positive value gets at least one cell.
fn bar_len(value: f64, max: f64, width: usize) -> usize {
    if value.is_nan() || value <= 0.0 {
        return 0;
    }
    let cells = (value / max * width as f64).round() as usize;
    cells.clamp(1, width)
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('.');
    out
}
