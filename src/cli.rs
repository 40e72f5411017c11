//! CLI interface for opstrack.
//!
//! Reads the tracker's exported listings from a data directory and prints
//! derived views. Every command is read-only: arguments in, a report out,
//! as text or as JSON with `--json`.
//!
//! - `opstrack events list|show|facets`: browse events.
//! - `opstrack overlaps|dashboard|insights`: views over events.
//! - `opstrack catalog list|show|deps|compliance`: browse the catalog.

mod catalog;
mod events;
mod format;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use jiff::tz::TimeZone;
use serde::Serialize;
use tracing::info;

use crate::config::Config;
use crate::dataset::Dataset;
use crate::pipeline::{Dimension, FilterState, GroupBy, SortDirection, TimeField};

use catalog::CatalogCommand;
use events::{DashboardArgs, EventsCommand, InsightsArgs, OverlapsArgs};

/// opstrack: deployments, incidents and the service catalog.
#[derive(Debug, Parser)]
#[command(name = "opstrack", version, after_long_help = USAGE_HELP)]
pub struct Cli {
    /// Directory holding `events.json` and `catalogs.json`.
    /// Defaults to `$OPSTRACK_DATA`, then `data-dir` in the config file.
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    /// IANA time zone days are counted in (e.g. `Europe/Paris`).
    #[arg(long, global = true)]
    tz: Option<String>,

    /// Print JSON instead of text.
    #[arg(long, global = true)]
    json: bool,

    /// Log debug detail to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

const USAGE_HELP: &str = r"Examples:
  opstrack events list --env production --type incident --days 7
  opstrack events list --group-by service --sort asc
  opstrack events show 3f2a
  opstrack overlaps --days 14
  opstrack insights --project auth
  opstrack catalog compliance --type container";

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Browse events: list with filters, show one, list filter values.
    Events {
        #[command(subcommand)]
        command: EventsCommand,
    },

    /// Events running at the same time in the same environment.
    Overlaps(OverlapsArgs),

    /// Today's counters and most recent events.
    Dashboard(DashboardArgs),

    /// Activity breakdowns over the last days.
    Insights(InsightsArgs),

    /// Browse the service catalog.
    Catalog {
        #[command(subcommand)]
        command: CatalogCommand,
    },
}

/// Filter flags shared by event commands. Each can be repeated; values of
/// one flag are alternatives, different flags must all match.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct FilterArgs {
    /// Environment (e.g. `production`).
    #[arg(long = "env")]
    environments: Vec<String>,

    /// Event type (e.g. `deployment`).
    #[arg(long = "type")]
    types: Vec<String>,

    /// Priority (`p1` to `p5`).
    #[arg(long = "priority")]
    priorities: Vec<String>,

    /// Status (e.g. `failure`).
    #[arg(long = "status")]
    statuses: Vec<String>,

    /// Service name, case-insensitive.
    #[arg(long = "service")]
    services: Vec<String>,
}

impl FilterArgs {
    fn to_filters(&self) -> Result<FilterState, String> {
        let mut filters = FilterState::default();
        let selections = [
            (Dimension::Environment, &self.environments),
            (Dimension::Type, &self.types),
            (Dimension::Priority, &self.priorities),
            (Dimension::Status, &self.statuses),
            (Dimension::Service, &self.services),
        ];
        for (dimension, values) in selections {
            filters
                .select(dimension, values.as_slice())
                .map_err(|e| e.to_string())?;
        }
        Ok(filters)
    }
}

/// CLI-facing time field, mapped to the domain `TimeField`.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum FieldArg {
    /// When the event was recorded.
    #[default]
    Created,
    /// When the event began.
    Start,
}

impl FieldArg {
    fn to_domain(self) -> TimeField {
        match self {
            Self::Created => TimeField::CreatedAt,
            Self::Start => TimeField::StartDate,
        }
    }
}

/// CLI-facing sort direction, mapped to the domain `SortDirection`.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum SortArg {
    /// Oldest first.
    Asc,
    /// Newest first.
    #[default]
    Desc,
}

impl SortArg {
    fn to_domain(self) -> SortDirection {
        match self {
            Self::Asc => SortDirection::Ascending,
            Self::Desc => SortDirection::Descending,
        }
    }
}

/// CLI-facing grouping, mapped to the domain `GroupBy`.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum GroupByArg {
    Service,
    Environment,
}

impl GroupByArg {
    fn to_domain(self) -> GroupBy {
        match self {
            Self::Service => GroupBy::Service,
            Self::Environment => GroupBy::Environment,
        }
    }
}

/// What every command runs with: resolved settings and the loaded records.
pub(crate) struct Context {
    config: Config,
    tz: TimeZone,
    json: bool,
    dataset: Dataset,
}

impl Context {
    fn load(cli: &Cli, config: Config) -> Result<Self, String> {
        let tz = config.time_zone(cli.tz.as_deref())?;
        let data_dir = config.data_dir(cli.data.as_deref())?;
        let dataset = Dataset::open(&data_dir).map_err(|e| e.to_string())?;
        info!(
            data_dir = %data_dir.display(),
            events = dataset.events.len(),
            catalogs = dataset.catalogs.len(),
            "dataset ready"
        );
        Ok(Self {
            config,
            tz,
            json: cli.json,
            dataset,
        })
    }

    /// Print `value` as pretty JSON.
    fn print_json<T: Serialize + ?Sized>(&self, value: &T) -> Result<(), String> {
        let json = serde_json::to_string_pretty(value)
            .map_err(|e| format!("failed to serialize output: {e}"))?;
        println!("{json}");
        Ok(())
    }
}

/// Run the CLI, returning an error message on failure.
pub fn run(cli: Cli, config: Config) -> Result<(), String> {
    let ctx = Context::load(&cli, config)?;

    match cli.command {
        Command::Events { command } => match command {
            EventsCommand::List(args) => events::cmd_list(&ctx, &args),
            EventsCommand::Show { reference } => events::cmd_show(&ctx, &reference),
            EventsCommand::Facets => events::cmd_facets(&ctx),
        },
        Command::Overlaps(args) => events::cmd_overlaps(&ctx, &args),
        Command::Dashboard(args) => events::cmd_dashboard(&ctx, &args),
        Command::Insights(args) => events::cmd_insights(&ctx, &args),
        Command::Catalog { command } => match command {
            CatalogCommand::List(args) => catalog::cmd_list(&ctx, &args),
            CatalogCommand::Show { name } => catalog::cmd_show(&ctx, &name),
            CatalogCommand::Deps(args) => catalog::cmd_deps(&ctx, &args),
            CatalogCommand::Compliance(args) => catalog::cmd_compliance(&ctx, &args),
        },
    }
}
