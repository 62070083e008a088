//! Formatted terminal output.
//!
//! Formatting lives in one place so the aggregation code stays clean and output
//! changes stay localized (the golden tests below pin the layout).

use crate::domain::{Priority, Recommendation, Scope, TotalEmissions};
use crate::factors::{EmissionFactorTable, FactorGroup};
use crate::io::earth_trips;
use crate::report::{EntityRanking, RankBy};
use crate::store::{Progress, ScenarioBook, ScenarioComparison};

/// Headline numbers plus the scope table.
pub fn format_summary(totals: &TotalEmissions, source: &str) -> String {
    let mut out = String::new();

    out.push_str("=== ges - GHG emissions assessment ===\n");
    out.push_str(&format!("Input: {source}\n"));
    out.push_str(&format!("Total: {:.2} tCO2e/year\n", totals.total));
    out.push_str(&format!(
        "Equivalent to {} car trips around the Earth\n",
        earth_trips(totals.total)
    ));

    out.push_str("\nBy scope:\n");
    push_row(
        &mut out,
        format!("{:<8} {:<20} {:>12} {:>7}", "scope", "description", "tCO2e", "share"),
    );
    push_row(&mut out, format!("{:-<8} {:-<20} {:-<12} {:-<7}", "", "", "", ""));
    for scope in Scope::ALL {
        let value = totals.scope_total(scope);
        push_row(
            &mut out,
            format!(
                "{:<8} {:<20} {:>12.3} {:>6.1}%",
                scope.to_string(),
                scope.description(),
                value,
                totals.share_pct(value)
            ),
        );
    }

    out
}

/// Category table, largest first, with per-field details.
pub fn format_categories(totals: &TotalEmissions) -> String {
    let mut out = String::new();
    out.push_str("By category:\n");

    if totals.by_category.is_empty() {
        out.push_str("(no emissions)\n");
        return out;
    }

    push_row(
        &mut out,
        format!("{:<28} {:>5} {:>12} {:>7}", "category", "scope", "tCO2e", "share"),
    );
    push_row(&mut out, format!("{:-<28} {:-<5} {:-<12} {:-<7}", "", "", "", ""));

    for r in totals.ranked() {
        push_row(
            &mut out,
            format!(
                "{:<28} {:>5} {:>12.3} {:>6.1}%",
                truncate(r.category.display_name(), 28),
                r.scope.number(),
                r.emissions,
                totals.share_pct(r.emissions)
            ),
        );
        for (item, value) in &r.details {
            push_row(&mut out, format!("    {:<24} {:>18.3}", truncate(item, 24), value));
        }
    }

    out
}

pub fn format_recommendations(recs: &[Recommendation]) -> String {
    let mut out = String::new();
    out.push_str("Recommendations:\n");

    for (i, r) in recs.iter().enumerate() {
        let topic = r.category.map(|c| c.display_name()).unwrap_or("General");
        out.push_str(&format!(
            "{}. [{}] {} ({topic})\n",
            i + 1,
            priority_tag(r.priority),
            r.title
        ));
        out.push_str(&format!("   {}\n", r.description));
        out.push_str(&format!("   Potential reduction: ~{:.0} tCO2e/year\n", r.impact));
        if !r.actions.is_empty() {
            out.push_str(&format!("   Actions: {}\n", r.actions.join("; ")));
        }
    }

    out
}

fn priority_tag(p: Priority) -> &'static str {
    match p {
        Priority::High => "HIGH",
        Priority::Medium => "MEDIUM",
        Priority::Low => "LOW",
    }
}

/// Factor table listing, optionally restricted to one group.
pub fn format_factors(table: &EmissionFactorTable, group: Option<FactorGroup>) -> String {
    let mut out = String::new();
    push_row(
        &mut out,
        format!("{:<10} {:<24} {:>12} {:<8}", "group", "name", "kgCO2e", "per"),
    );
    push_row(&mut out, format!("{:-<10} {:-<24} {:-<12} {:-<8}", "", "", "", ""));

    for (g, name, value) in table.entries() {
        if group.is_some_and(|want| want != g) {
            continue;
        }
        push_row(
            &mut out,
            format!(
                "{:<10} {:<24} {:>12.4} {:<8}",
                g.as_str(),
                truncate(name, 24),
                value,
                EmissionFactorTable::unit(g, name).unwrap_or("")
            ),
        );
    }

    out
}

pub fn format_scenario_list(book: &ScenarioBook) -> String {
    if book.is_empty() {
        return "No saved scenarios.\n".to_string();
    }

    let mut out = String::new();
    push_row(
        &mut out,
        format!("{:<24} {:<20} {:>12} {:<16}", "id", "name", "tCO2e", "updated"),
    );
    push_row(&mut out, format!("{:-<24} {:-<20} {:-<12} {:-<16}", "", "", "", ""));
    for s in book.iter() {
        push_row(
            &mut out,
            format!(
                "{:<24} {:<20} {:>12.3} {:<16}",
                truncate(&s.id, 24),
                truncate(&s.name, 20),
                s.emissions.total,
                s.updated_at.format("%Y-%m-%d %H:%M")
            ),
        );
        if !s.description.is_empty() {
            push_row(&mut out, format!("    {}", s.description));
        }
    }
    out
}

/// Side-by-side scenario values with deltas against the first (baseline) column.
pub fn format_scenario_comparison(cmp: &ScenarioComparison) -> String {
    let mut out = String::new();
    if let Some(baseline) = cmp.names.first() {
        out.push_str(&format!("Baseline: {baseline}\n"));
    }

    let mut header = format!("{:<26}", "tCO2e");
    for name in &cmp.names {
        header.push_str(&format!(" {:>14}", truncate(name, 14)));
    }
    push_row(&mut out, header);

    for row in &cmp.rows {
        let mut line = format!("{:<26}", truncate(&row.label, 26));
        for (i, v) in row.values.iter().enumerate() {
            let cell = if i == 0 {
                format!("{v:.3}")
            } else {
                format!("{v:.3} {}", fmt_delta_pct(row.delta_pct(i), row.delta(i)))
            };
            line.push_str(&format!(" {cell:>14}"));
        }
        push_row(&mut out, line);
    }
    out
}

fn fmt_delta_pct(pct: Option<f64>, abs: f64) -> String {
    match pct {
        Some(p) => format!("({p:+.0}%)"),
        None if abs == 0.0 => "(=)".to_string(),
        None => "(new)".to_string(),
    }
}

pub fn format_entity_ranking(ranking: &EntityRanking) -> String {
    let mut out = String::new();
    let by = match ranking.rank_by {
        RankBy::Total => "total emissions",
        RankBy::Intensity => "tCO2e per employee",
        RankBy::Efficiency => "tCO2e per m2",
    };
    out.push_str(&format!("Ranked by {by}\n"));
    push_row(
        &mut out,
        format!(
            "{:>4} {:<24} {:>12} {:>10} {:>10} {:>10} {:>9} {:>9} {:>7} {}",
            "#", "entity", "total", "scope1", "scope2", "scope3", "per empl", "per m2", "vs max", "benchmark"
        ),
    );
    let rule = format!(
        "{:-<4} {:-<24} {:-<12} {:-<10} {:-<10} {:-<10} {:-<9} {:-<9} {:-<7} {:-<9}",
        "", "", "", "", "", "", "", "", "", ""
    );
    push_row(&mut out, rule.clone());
    for r in &ranking.rows {
        push_row(
            &mut out,
            format!(
                "{:>4} {:<24} {:>12.3} {:>10.3} {:>10.3} {:>10.3} {:>9} {:>9} {:>6.1}% {}",
                r.rank,
                truncate(&r.name, 24),
                r.total,
                r.scope1,
                r.scope2,
                r.scope3,
                ratio(r.intensity, 3),
                ratio(r.efficiency, 4),
                r.share_of_max_pct,
                r.benchmark.as_str()
            ),
        );
    }
    if ranking.rows.is_empty() {
        return out;
    }

    let avg = &ranking.average;
    push_row(&mut out, rule);
    push_row(
        &mut out,
        format!(
            "{:>4} {:<24} {:>12.3} {:>10.3} {:>10.3} {:>10.3} {:>9} {:>9}",
            "",
            "average",
            avg.total,
            avg.scope1,
            avg.scope2,
            avg.scope3,
            ratio(avg.intensity, 3),
            ratio(avg.efficiency, 4)
        ),
    );
    if let Some(best) = ranking.lowest_intensity() {
        out.push_str(&format!(
            "\nLowest intensity: {} ({} tCO2e/employee)\n",
            best.name,
            ratio(best.intensity, 3)
        ));
    }
    out
}

fn ratio(value: Option<f64>, decimals: usize) -> String {
    match value {
        Some(v) => format!("{v:.decimals$}"),
        None => "-".to_string(),
    }
}

pub fn format_progress(progress: Option<&Progress>) -> String {
    let Some(p) = progress else {
        return "No saved progress.\n".to_string();
    };

    let mut out = String::new();
    out.push_str(&format!("Current step: {}\n", p.current_step));
    let steps: Vec<String> = p.completed_steps.iter().map(|s| s.to_string()).collect();
    out.push_str(&format!("Completed steps: [{}]\n", steps.join(", ")));
    let categories: Vec<&str> = p.form_data.iter().map(|d| d.category().as_str()).collect();
    out.push_str(&format!("Answered categories: [{}]\n", categories.join(", ")));
    if let Some(at) = p.last_saved {
        out.push_str(&format!("Last saved: {}\n", at.format("%Y-%m-%d %H:%M:%S UTC")));
    }
    out
}

fn push_row(out: &mut String, row: String) {
    out.push_str(row.trim_end());
    out.push('\n');
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}
