//! Event commands: list, show, facets, overlaps, dashboard and insights.

use clap::Subcommand;
use jiff::civil::Date;
use serde::Serialize;

use crate::catalog::CatalogIndex;
use crate::dataset::find_event;
use crate::model::Event;
use crate::overlap::{self, OverlapPair};
use crate::pipeline::{EventQuery, SortDirection, TimeField, group_events, sort_by_time};
use crate::stats::{self, DashboardStats, Facets, Insights};
use crate::window::{self, DateWindow, WindowDays};

use super::format::{
    format_breakdown, format_event_detail, format_event_line, format_overlap, format_type_counts,
    join_values,
};
use super::{Context, FieldArg, FilterArgs, GroupByArg, SortArg};

/// How many events the dashboard lists.
const RECENT_EVENTS: usize = 10;

#[derive(Debug, Subcommand)]
pub enum EventsCommand {
    /// List events, filtered, windowed and sorted.
    List(ListArgs),

    /// Show one event in full.
    Show {
        /// Event ID (full UUID or unambiguous prefix) or Slack message ID.
        reference: String,
    },

    /// List the distinct values each filter can take.
    Facets,
}

#[derive(Debug, clap::Args)]
pub struct ListArgs {
    #[command(flatten)]
    pub(super) filters: FilterArgs,

    /// Only events from the last N days (1, 3, 7, 14, 30, 60 or 90).
    #[arg(long)]
    days: Option<WindowDays>,

    /// Day the window ends on (defaults to today). Implies a window.
    #[arg(long)]
    anchor: Option<Date>,

    /// Timestamp used for the window and the sort.
    #[arg(long, value_enum, default_value_t)]
    field: FieldArg,

    /// Sort order.
    #[arg(long, value_enum, default_value_t)]
    sort: SortArg,

    /// Bucket the events, largest group first.
    #[arg(long, value_enum)]
    group_by: Option<GroupByArg>,

    /// Print at most N events.
    #[arg(long)]
    limit: Option<usize>,
}

#[derive(Debug, clap::Args)]
pub struct OverlapsArgs {
    /// Number of days to scan (1, 3, 7, 14, 30, 60 or 90).
    #[arg(long, conflicts_with_all = ["from", "to"])]
    days: Option<WindowDays>,

    /// First day to scan (defaults to today).
    #[arg(long, conflicts_with_all = ["from", "to"])]
    anchor: Option<Date>,

    /// First day of a custom period.
    #[arg(long, requires = "to")]
    from: Option<Date>,

    /// Last day of a custom period.
    #[arg(long, requires = "from")]
    to: Option<Date>,

    #[command(flatten)]
    filters: FilterArgs,
}

#[derive(Debug, clap::Args)]
pub struct DashboardArgs {
    /// Day to report on (defaults to today).
    #[arg(long)]
    date: Option<Date>,
}

#[derive(Debug, clap::Args)]
pub struct InsightsArgs {
    /// Number of days to report on (1, 3, 7, 14, 30, 60 or 90).
    #[arg(long, default_value = "30")]
    days: WindowDays,

    /// Only services whose name starts with this project name.
    #[arg(long)]
    project: Option<String>,

    #[command(flatten)]
    filters: FilterArgs,
}

pub(super) fn cmd_list(ctx: &Context, args: &ListArgs) -> Result<(), String> {
    let window = if args.days.is_some() || args.anchor.is_some() {
        let anchor = args.anchor.unwrap_or_else(|| window::today(&ctx.tz));
        let days = args
            .days
            .unwrap_or_else(|| ctx.config.default_days(WindowDays::WEEK));
        Some(DateWindow::lookback(anchor, days, &ctx.tz).map_err(|e| e.to_string())?)
    } else {
        None
    };

    let query = EventQuery {
        filters: args.filters.to_filters()?,
        window,
        time_field: args.field.to_domain(),
        sort: Some(args.sort.to_domain()),
    };
    let mut events = query.apply(&ctx.dataset.events);
    if let Some(limit) = args.limit {
        events.truncate(limit);
    }

    if let Some(group_by) = args.group_by {
        let groups = group_events(&events, group_by.to_domain());
        if ctx.json {
            return ctx.print_json(&groups);
        }
        for group in &groups {
            println!("{} ({})", group.key, group.events.len());
            for event in &group.events {
                println!("  {}", format_event_line(event, &ctx.tz));
            }
        }
        return Ok(());
    }

    if ctx.json {
        return ctx.print_json(&events);
    }
    if events.is_empty() {
        println!("No events");
        return Ok(());
    }
    for event in &events {
        println!("{}", format_event_line(event, &ctx.tz));
    }
    if let Some(window) = &query.window {
        eprintln!("{} events, {window}", events.len());
    }
    Ok(())
}

pub(super) fn cmd_show(ctx: &Context, reference: &str) -> Result<(), String> {
    let event = find_event(&ctx.dataset.events, reference).map_err(|e| e.to_string())?;
    if ctx.json {
        return ctx.print_json(event);
    }
    let catalogs = CatalogIndex::new(&ctx.dataset.catalogs);
    println!("{}", format_event_detail(event, &ctx.tz, &catalogs));
    Ok(())
}

pub(super) fn cmd_facets(ctx: &Context) -> Result<(), String> {
    let events: Vec<&Event> = ctx.dataset.events.iter().collect();
    let facets = Facets::from_events(&events);
    if ctx.json {
        return ctx.print_json(&facets);
    }
    println!("environments: {}", join_values(&facets.environments));
    println!("types:        {}", join_values(&facets.types));
    println!("priorities:   {}", join_values(&facets.priorities));
    println!("statuses:     {}", join_values(&facets.statuses));
    println!("services:     {}", join_values(&facets.services));
    Ok(())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OverlapReport<'a> {
    from: Date,
    to: Date,
    events_scanned: usize,
    days: Vec<OverlapDay<'a>>,
}

#[derive(Serialize)]
struct OverlapDay<'a> {
    date: Date,
    overlaps: Vec<OverlapPair<'a>>,
}

pub(super) fn cmd_overlaps(ctx: &Context, args: &OverlapsArgs) -> Result<(), String> {
    let window = match (args.from, args.to) {
        (Some(from), Some(to)) => DateWindow::custom(from, to, &ctx.tz),
        _ => {
            let anchor = args.anchor.unwrap_or_else(|| window::today(&ctx.tz));
            let days = args
                .days
                .unwrap_or_else(|| ctx.config.default_days(WindowDays::WEEK));
            DateWindow::leading(anchor, days, &ctx.tz)
        }
    }
    .map_err(|e| e.to_string())?;

    let filters = args.filters.to_filters()?;
    let in_period: Vec<&Event> = overlap::events_in_window(&ctx.dataset.events, &window)
        .into_iter()
        .filter(|event| filters.matches(event))
        .collect();
    let pairs = overlap::detect_overlaps(in_period.iter().copied());
    let total = pairs.len();
    let by_day = overlap::group_by_day(pairs, &ctx.tz);

    if ctx.json {
        let report = OverlapReport {
            from: window.first_day(),
            to: window.last_day(),
            events_scanned: in_period.len(),
            days: by_day
                .into_iter()
                .map(|(date, overlaps)| OverlapDay { date, overlaps })
                .collect(),
        };
        return ctx.print_json(&report);
    }

    println!(
        "{total} overlaps among {} events, {window}",
        in_period.len()
    );
    let catalogs = CatalogIndex::new(&ctx.dataset.catalogs);
    for (date, pairs) in &by_day {
        println!();
        println!("{date} ({})", pairs.len());
        for pair in pairs {
            println!("{}", format_overlap(pair, &ctx.tz, &catalogs));
        }
    }
    Ok(())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Dashboard<'a> {
    date: Date,
    stats: DashboardStats,
    recent: Vec<&'a Event>,
}

pub(super) fn cmd_dashboard(ctx: &Context, args: &DashboardArgs) -> Result<(), String> {
    let window = match args.date {
        Some(date) => DateWindow::custom(date, date, &ctx.tz),
        None => DateWindow::today(&ctx.tz),
    }
    .map_err(|e| e.to_string())?;
    let date = window.first_day();
    let query = EventQuery {
        window: Some(window),
        ..EventQuery::default()
    };
    let mut todays = query.apply(&ctx.dataset.events);
    let stats = DashboardStats::from_events(&todays);
    sort_by_time(&mut todays, TimeField::CreatedAt, SortDirection::Descending);
    todays.truncate(RECENT_EVENTS);

    if ctx.json {
        return ctx.print_json(&Dashboard {
            date,
            stats,
            recent: todays,
        });
    }

    println!("{date}");
    println!("  total:        {}", stats.total);
    println!("  success:      {}", stats.success);
    println!("  failure:      {}", stats.failure);
    println!("  in progress:  {}", stats.in_progress);
    println!("  critical:     {}", stats.critical);
    if !todays.is_empty() {
        println!();
        println!("Recent events");
        for event in &todays {
            println!("  {}", format_event_line(event, &ctx.tz));
        }
    }
    Ok(())
}

pub(super) fn cmd_insights(ctx: &Context, args: &InsightsArgs) -> Result<(), String> {
    let window = DateWindow::trailing(window::today(&ctx.tz), args.days, &ctx.tz)
        .map_err(|e| e.to_string())?;
    let query = EventQuery {
        filters: args.filters.to_filters()?,
        window: Some(window.clone()),
        ..EventQuery::default()
    };
    let mut events = query.apply(&ctx.dataset.events);
    if let Some(project) = args.project.as_deref() {
        events.retain(|event| stats::in_project(event, project));
    }
    let insights = Insights::compute(&events, &window);

    if ctx.json {
        return ctx.print_json(&insights);
    }

    println!("{} events, {window}", insights.total);
    println!("  {}", format_type_counts(&insights.counts));
    match insights.deployment_success_rate {
        Some(rate) => println!("  deployment success rate: {rate}%"),
        None => println!("  deployment success rate: -"),
    }

    if !insights.services.is_empty() {
        println!();
        println!("Top services");
        for row in &insights.services {
            println!("{}", format_breakdown(row));
        }
    }
    if !insights.projects.is_empty() {
        println!();
        println!("Top projects");
        for row in &insights.projects {
            println!("{}", format_breakdown(row));
        }
    }

    println!();
    println!("Daily");
    for day in &insights.daily {
        println!(
            "  {}  {:>4}  {}",
            day.date,
            day.counts.total(),
            format_type_counts(&day.counts)
        );
    }
    Ok(())
}
