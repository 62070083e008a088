//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and loads configuration
//! - runs the assessment pipeline
//! - prints reports/charts
//! - writes optional exports and store entries

use chrono::Utc;
use clap::Parser;

use crate::cache::Calculator;
use crate::cli::{
    Cli, Command, CompareArgs, ComputeArgs, FactorsArgs, ProgressCommand, RecommendArgs,
    ScenarioCommand,
};
use crate::config::Config;
use crate::domain::CategoryData;
use crate::error::AppError;
use crate::factors::EmissionFactorTable;
use crate::io::{ReportFile, load_questionnaire, mailto_link, write_emissions_csv_file, write_report_json};
use crate::store::{
    FileStore, KeyValueStore, Progress, REPORT_BACKUP_KEY, ScenarioBook, clear_progress,
    compare_scenarios, restore_progress, save_progress,
};

pub mod pipeline;

/// Entry point for the `ges` binary.
pub fn run() -> Result<(), AppError> {
    // `ges site.json` behaves like `ges compute --input site.json`.
    let argv = rewrite_args(std::env::args().collect());
    let cli = Cli::parse_from(argv);

    let mut config = Config::from_env()?;
    if let Some(dir) = cli.store {
        config.store_dir = dir;
    }
    if let Some(path) = cli.factors {
        config.factors_path = Some(path);
    }
    let table = config.factor_table()?;

    match cli.command {
        Command::Compute(args) => handle_compute(args, &config, &table),
        Command::Recommend(args) => handle_recommend(args, &config, &table),
        Command::Factors(args) => handle_factors(args, &table),
        Command::Compare(args) => handle_compare(args, &table),
        Command::Scenario(cmd) => handle_scenario(cmd, &config, table),
        Command::Progress(cmd) => handle_progress(cmd, &config),
    }
}

fn handle_compute(args: ComputeArgs, config: &Config, table: &EmissionFactorTable) -> Result<(), AppError> {
    let run = pipeline::run_assessment(&args.input, table, &config.policy)?;
    let report = ReportFile::new(&run.totals, &run.recommendations, Utc::now());

    if args.json {
        println!("{}", report.to_json_pretty()?);
    } else {
        println!("{}", crate::report::format_summary(&run.totals, &run.source));
        println!("{}", crate::report::format_categories(&run.totals));
        println!("{}", crate::report::format_recommendations(&run.recommendations));
        if args.chart {
            println!("{}", crate::plot::render_category_bars(&run.totals, args.width));
            println!("{}", crate::plot::render_scope_bars(&run.totals, args.width));
        }
    }

    // Optional exports.
    if let Some(path) = &args.export_csv {
        write_emissions_csv_file(path, &run.totals, &run.recommendations)?;
    }
    if let Some(path) = &args.export_json {
        write_report_json(path, &report)?;
        let mut store = FileStore::open(&config.store_dir)?;
        store.set(REPORT_BACKUP_KEY, &report.to_json_pretty()?)?;
        log::info!("report backup stored in {}", store.dir().display());
    }
    if args.mailto {
        println!("{}", mailto_link(&run.totals, Utc::now().date_naive()));
    }

    Ok(())
}

fn handle_recommend(args: RecommendArgs, config: &Config, table: &EmissionFactorTable) -> Result<(), AppError> {
    let run = pipeline::run_assessment(&args.input, table, &config.policy)?;
    if args.json {
        let json = serde_json::to_string_pretty(&run.recommendations)
            .map_err(|e| AppError::internal(format!("Failed to serialize recommendations: {e}")))?;
        println!("{json}");
    } else {
        print!("{}", crate::report::format_recommendations(&run.recommendations));
    }
    Ok(())
}

fn handle_factors(args: FactorsArgs, table: &EmissionFactorTable) -> Result<(), AppError> {
    print!("{}", crate::report::format_factors(table, args.group));
    Ok(())
}

fn handle_compare(args: CompareArgs, table: &EmissionFactorTable) -> Result<(), AppError> {
    let entities = pipeline::compare_entities(&args.inputs, table)?;
    let ranking = crate::report::rank_entities(&entities, args.by);
    if args.json {
        let json = serde_json::to_string_pretty(&ranking)
            .map_err(|e| AppError::internal(format!("Failed to serialize ranking: {e}")))?;
        println!("{json}");
    } else {
        print!("{}", crate::report::format_entity_ranking(&ranking));
    }
    Ok(())
}

fn handle_scenario(cmd: ScenarioCommand, config: &Config, table: EmissionFactorTable) -> Result<(), AppError> {
    let mut store = FileStore::open(&config.store_dir)?;
    let mut book = ScenarioBook::load(&store)?;
    let mut calculator = Calculator::new(table, config.cache_capacity);

    match cmd {
        ScenarioCommand::Save {
            name,
            description,
            input,
        } => {
            let questionnaire = load_questionnaire(&input)?;
            let saved = book.upsert(&name, &description, questionnaire, &mut calculator, Utc::now())?;
            println!(
                "Saved scenario '{}' ({}): {:.3} tCO2e",
                saved.name, saved.id, saved.emissions.total
            );
            book.save(&mut store)?;
        }
        ScenarioCommand::List => {
            book.refresh(&mut calculator);
            print!("{}", crate::report::format_scenario_list(&book));
        }
        ScenarioCommand::Delete { id } => {
            let removed = book
                .remove(&id)
                .ok_or_else(|| AppError::input(format!("No scenario with id '{id}'.")))?;
            book.save(&mut store)?;
            println!("Deleted scenario '{}' ({}).", removed.name, removed.id);
        }
        ScenarioCommand::Compare { ids } => {
            book.refresh(&mut calculator);
            let selected = if ids.is_empty() {
                book.iter().collect::<Vec<_>>()
            } else {
                ids.iter()
                    .map(|id| {
                        book.find(id)
                            .ok_or_else(|| AppError::input(format!("No scenario '{id}'.")))
                    })
                    .collect::<Result<Vec<_>, _>>()?
            };
            if selected.len() < 2 {
                return Err(AppError::input("Need at least two scenarios to compare."));
            }
            print!("{}", crate::report::format_scenario_comparison(&compare_scenarios(&selected)));
        }
    }

    let (hits, misses) = calculator.cache().stats();
    log::debug!("calculation cache: {hits} hits, {misses} misses");
    Ok(())
}

fn handle_progress(cmd: ProgressCommand, config: &Config) -> Result<(), AppError> {
    let mut store = FileStore::open(&config.store_dir)?;

    match cmd {
        ProgressCommand::Save { input, step } => {
            let form_data = load_questionnaire(&input)?;
            let previous = restore_progress(&store)?;
            let current_step = step
                .or(previous.as_ref().map(|p| p.current_step))
                .unwrap_or(0);
            let progress = Progress {
                current_step,
                completed_steps: (0..current_step).collect(),
                available_categories: form_data.iter().map(CategoryData::category).collect(),
                form_data,
                last_saved: None,
            };
            if save_progress(&mut store, &progress, Utc::now())? {
                println!("Progress saved (step {current_step}).");
            } else {
                println!("Progress unchanged.");
            }
        }
        ProgressCommand::Show => {
            let progress = restore_progress(&store)?;
            print!("{}", crate::report::format_progress(progress.as_ref()));
        }
        ProgressCommand::Clear => {
            clear_progress(&mut store)?;
            println!("Progress cleared.");
        }
    }
    Ok(())
}

/// Rewrite argv so a bare questionnaire path means `compute --input <path>`.
///
/// Rules:
/// - `ges site.json ...`           -> `ges compute --input site.json ...`
/// - `ges`, flags, subcommands     -> unchanged
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1) else {
        return argv;
    };

    let is_subcommand = matches!(
        arg1.as_str(),
        "compute" | "recommend" | "factors" | "compare" | "scenario" | "progress" | "help"
    );
    if is_subcommand || arg1.starts_with('-') {
        return argv;
    }

    if arg1.to_ascii_lowercase().ends_with(".json") {
        argv.insert(1, "--input".to_string());
        argv.insert(1, "compute".to_string());
    }
    argv
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_json_path_becomes_compute() {
        assert_eq!(
            rewrite_args(args(&["ges", "site.JSON", "--chart"])),
            args(&["ges", "compute", "--input", "site.JSON", "--chart"])
        );
    }

    #[test]
    fn subcommands_and_flags_are_untouched() {
        for argv in [
            args(&["ges"]),
            args(&["ges", "--help"]),
            args(&["ges", "compare", "a.json", "b.json"]),
            args(&["ges", "scenario", "list"]),
        ] {
            assert_eq!(rewrite_args(argv.clone()), argv);
        }
    }
}
