//! Command-line parsing for the GHG emissions aggregator.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! calculation and reporting code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::factors::FactorGroup;
use crate::report::RankBy;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "ges", version, about = "Greenhouse gas emissions assessment (tCO2e per year)")]
pub struct Cli {
    /// Key-value store directory (overrides GES_STORE_DIR).
    #[arg(long, global = true, value_name = "DIR")]
    pub store: Option<PathBuf>,

    /// Emission factor override JSON (overrides GES_FACTORS).
    #[arg(long, global = true, value_name = "JSON")]
    pub factors: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Compute emissions for a questionnaire, print the report and optionally export it.
    Compute(ComputeArgs),
    /// Print recommendations only.
    Recommend(RecommendArgs),
    /// List emission factors.
    Factors(FactorsArgs),
    /// Compute several questionnaires and rank them by total emissions.
    Compare(CompareArgs),
    /// Save, list, delete and compare what-if scenarios.
    #[command(subcommand)]
    Scenario(ScenarioCommand),
    /// Save, show and clear questionnaire progress.
    #[command(subcommand)]
    Progress(ProgressCommand),
}

#[derive(Debug, Args, Clone)]
pub struct ComputeArgs {
    /// Questionnaire JSON (`-` for stdin).
    #[arg(short, long, value_name = "FILE")]
    pub input: PathBuf,

    /// Print the JSON report instead of tables.
    #[arg(long)]
    pub json: bool,

    /// Render category and scope bar charts.
    #[arg(long)]
    pub chart: bool,

    /// Chart width (columns).
    #[arg(long, default_value_t = 40)]
    pub width: usize,

    /// Export the breakdown to CSV.
    #[arg(long = "export-csv", value_name = "PATH")]
    pub export_csv: Option<PathBuf>,

    /// Export the JSON report (also kept as the store's report backup).
    #[arg(long = "export-json", value_name = "PATH")]
    pub export_json: Option<PathBuf>,

    /// Print a mailto link sharing the headline numbers.
    #[arg(long)]
    pub mailto: bool,
}

#[derive(Debug, Args, Clone)]
pub struct RecommendArgs {
    /// Questionnaire JSON (`-` for stdin).
    #[arg(short, long, value_name = "FILE")]
    pub input: PathBuf,

    /// Print recommendations as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args, Clone)]
pub struct FactorsArgs {
    /// Restrict the listing to one group.
    #[arg(long, value_enum)]
    pub group: Option<FactorGroup>,
}

#[derive(Debug, Args, Clone)]
pub struct CompareArgs {
    /// Questionnaire JSON files, one per entity.
    #[arg(required = true, num_args = 1.., value_name = "FILE")]
    pub inputs: Vec<PathBuf>,

    /// Ranking order.
    #[arg(long, value_enum, default_value_t = RankBy::Total)]
    pub by: RankBy,

    /// Print the ranking as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Subcommand)]
pub enum ScenarioCommand {
    /// Save a questionnaire as a named scenario (replaces a scenario of the same name).
    Save {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        description: String,
        /// Questionnaire JSON (`-` for stdin).
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,
    },
    /// List saved scenarios.
    List,
    /// Delete a scenario by id.
    Delete { id: String },
    /// Compare scenarios (ids or names) against the first one; all when none given.
    Compare { ids: Vec<String> },
}

#[derive(Debug, Subcommand)]
pub enum ProgressCommand {
    /// Save questionnaire answers as in-progress work.
    Save {
        /// Questionnaire JSON (`-` for stdin).
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,
        /// Current questionnaire step.
        #[arg(long)]
        step: Option<usize>,
    },
    /// Show saved progress.
    Show,
    /// Forget saved progress.
    Clear,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_compute_flags() {
        let cli = Cli::parse_from([
            "ges", "compute", "-i", "site.json", "--chart", "--export-csv", "out.csv", "--store", "/tmp/s",
        ]);
        assert_eq!(cli.store, Some(PathBuf::from("/tmp/s")));
        match cli.command {
            Command::Compute(args) => {
                assert_eq!(args.input, PathBuf::from("site.json"));
                assert!(args.chart);
                assert!(!args.json);
                assert_eq!(args.export_csv, Some(PathBuf::from("out.csv")));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_nested_scenario_commands() {
        let cli = Cli::parse_from(["ges", "scenario", "compare", "a", "b"]);
        match cli.command {
            Command::Scenario(ScenarioCommand::Compare { ids }) => assert_eq!(ids, vec!["a", "b"]),
            other => panic!("unexpected command: {other:?}"),
        }
        let cli = Cli::parse_from(["ges", "compare", "a.json", "b.json", "--by", "efficiency"]);
        match cli.command {
            Command::Compare(args) => {
                assert_eq!(args.inputs.len(), 2);
                assert_eq!(args.by, RankBy::Efficiency);
            }
            other => panic!("unexpected command: {other:?}"),
        }
        let cli = Cli::parse_from(["ges", "factors", "--group", "waste"]);
        match cli.command {
            Command::Factors(args) => assert_eq!(args.group, Some(FactorGroup::Waste)),
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
