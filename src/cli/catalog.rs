//! Catalog commands: list, show, deps and compliance.

use std::collections::BTreeSet;
use std::str::FromStr;

use clap::Subcommand;
use serde::Serialize;

use crate::catalog::{CatalogFilter, CatalogIndex};
use crate::compliance::{
    ComplianceReport, ComplianceSummary, ProjectCompliance, sort_versions_desc,
};
use crate::dependencies::{self, DependencyStats, Edge};
use crate::model::{Catalog, CatalogType, SlaLevel};

use super::Context;
use super::format::{format_catalog_line, format_percent, format_project_compliance, join_values};

#[derive(Debug, Subcommand)]
pub enum CatalogCommand {
    /// List catalog entries, sorted by name.
    List(ListArgs),

    /// Show one entry with its SLA budget and versions.
    Show {
        /// Entry name.
        name: String,
    },

    /// Dependency edges between entries.
    Deps(DepsArgs),

    /// Check projects against the reference versions of their deliverables.
    Compliance(ComplianceArgs),
}

#[derive(Debug, clap::Args)]
pub struct ListArgs {
    /// Case-insensitive part of the entry name.
    #[arg(long)]
    search: Option<String>,

    /// Entry type (e.g. `project`, `container`). Repeatable.
    #[arg(long = "type")]
    types: Vec<String>,

    /// SLA level (`critical`, `high`, `medium`, `low`). Repeatable.
    #[arg(long = "sla")]
    sla_levels: Vec<String>,
}

#[derive(Debug, clap::Args)]
pub struct DepsArgs {
    /// Case-insensitive part of the entry name.
    #[arg(long)]
    search: Option<String>,

    /// SLA level (`critical`, `high`, `medium`, `low`). Repeatable.
    #[arg(long = "sla")]
    sla_levels: Vec<String>,
}

#[derive(Debug, clap::Args)]
pub struct ComplianceArgs {
    /// Case-insensitive part of a project or deliverable name.
    #[arg(long)]
    search: Option<String>,

    /// Deliverable type (`package`, `chart`, `container`, `module`). Repeatable.
    #[arg(long = "type")]
    types: Vec<String>,
}

/// Parse repeated flag values into a set, naming the flag on error.
fn parse_set<T>(flag: &str, values: &[String]) -> Result<BTreeSet<T>, String>
where
    T: FromStr + Ord,
    T::Err: std::fmt::Display,
{
    values
        .iter()
        .map(|v| v.parse().map_err(|e| format!("invalid --{flag}: {e}")))
        .collect()
}

pub(super) fn cmd_list(ctx: &Context, args: &ListArgs) -> Result<(), String> {
    let filter = CatalogFilter {
        search: args.search.clone(),
        types: parse_set::<CatalogType>("type", &args.types)?,
        sla_levels: parse_set::<SlaLevel>("sla", &args.sla_levels)?,
    };
    let catalogs = filter.apply(&ctx.dataset.catalogs);

    if ctx.json {
        return ctx.print_json(&catalogs);
    }
    if catalogs.is_empty() {
        println!("No catalog entries");
        return Ok(());
    }
    for catalog in &catalogs {
        println!("{}", format_catalog_line(catalog));
    }
    Ok(())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CatalogDetail<'a> {
    #[serde(flatten)]
    catalog: &'a Catalog,
    monthly_downtime: Option<String>,
    versions: Vec<String>,
}

pub(super) fn cmd_show(ctx: &Context, name: &str) -> Result<(), String> {
    let index = CatalogIndex::new(&ctx.dataset.catalogs);
    let catalog = index
        .get(name)
        .ok_or_else(|| format!("no catalog entry named '{name}'"))?;

    let mut versions = catalog.available_versions.clone();
    sort_versions_desc(&mut versions);
    let downtime = catalog.sla.as_ref().and_then(|sla| sla.monthly_downtime());

    if ctx.json {
        return ctx.print_json(&CatalogDetail {
            catalog,
            monthly_downtime: downtime,
            versions,
        });
    }

    println!("{}", format_catalog_line(catalog));
    if let Some(description) = catalog.description.as_deref() {
        println!("  {description}");
    }
    if let Some(language) = catalog.languages {
        println!("  language:     {language}");
    }
    if let Some(repository) = catalog.repository.as_deref() {
        println!("  repository:   {repository}");
    }
    if let Some(sla) = &catalog.sla {
        let level = sla
            .level
            .map_or_else(|| "-".to_string(), |level| level.to_string());
        println!("  sla:          {level}");
        if let Some(uptime) = sla.uptime_percentage {
            println!(
                "  uptime:       {uptime}% ({} downtime per month)",
                downtime.as_deref().unwrap_or("-")
            );
        }
        if let Some(ms) = sla.response_time_ms {
            println!("  response:     {ms}ms");
        }
    }
    println!("  depends on:   {}", join_values(&catalog.dependencies_in));
    println!("  used by:      {}", join_values(&catalog.dependencies_out));
    if !versions.is_empty() {
        println!("  versions:     {}", versions.join(", "));
    }
    if let Some(reference) = catalog.reference_version.as_deref() {
        println!("  reference:    {reference}");
    }
    if let Some(latest) = catalog.latest_version.as_deref() {
        println!("  latest:       {latest}");
    }
    for used in &catalog.used_deliverables {
        println!("  uses:         {} {}", used.name, used.version_used);
    }
    for channel in &catalog.communication_channels {
        let link = channel.link.as_deref().unwrap_or("");
        println!("  {}:  {} {link}", channel.kind, channel.name);
    }
    Ok(())
}

#[derive(Serialize)]
struct DependencyGraph<'a> {
    edges: Vec<Edge<'a>>,
    stats: DependencyStats,
}

pub(super) fn cmd_deps(ctx: &Context, args: &DepsArgs) -> Result<(), String> {
    let filter = CatalogFilter {
        search: args.search.clone(),
        sla_levels: parse_set::<SlaLevel>("sla", &args.sla_levels)?,
        ..CatalogFilter::default()
    };
    let selected: Vec<&Catalog> = ctx
        .dataset
        .catalogs
        .iter()
        .filter(|c| filter.matches(c))
        .collect();
    let edges = dependencies::edges(&selected);
    let stats = DependencyStats::from_catalogs(&ctx.dataset.catalogs);

    if ctx.json {
        return ctx.print_json(&DependencyGraph { edges, stats });
    }

    println!(
        "{} entries, {} with dependencies, {} dependencies declared",
        stats.total, stats.with_dependencies, stats.total_dependencies
    );
    for edge in &edges {
        println!("  {} -> {}", edge.from, edge.to);
    }
    Ok(())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FilteredCompliance<'a> {
    projects: Vec<ProjectCompliance>,
    summary: &'a ComplianceSummary,
}

pub(super) fn cmd_compliance(ctx: &Context, args: &ComplianceArgs) -> Result<(), String> {
    let types = parse_set::<CatalogType>("type", &args.types)?;
    let report = ComplianceReport::build(&ctx.dataset.catalogs);
    let projects = report.filtered(args.search.as_deref(), &types);

    if ctx.json {
        return ctx.print_json(&FilteredCompliance {
            projects,
            summary: &report.summary,
        });
    }

    let summary = &report.summary;
    println!(
        "{}/{} projects compliant ({}), {} not compliant",
        summary.compliant_projects,
        summary.total_projects,
        format_percent(summary.overall_compliance_percentage),
        summary.non_compliant_projects,
    );
    for project in &projects {
        println!();
        println!("{}", format_project_compliance(project));
    }

    if !summary.deliverable_stats.is_empty() {
        println!();
        println!("Deliverables");
        for stats in &summary.deliverable_stats {
            println!(
                "  {:<24} {:<10} used by {}, outdated in {}",
                stats.name,
                stats.kind.to_string(),
                stats.projects_using,
                stats.projects_outdated
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_set_names_the_flag() {
        let ok = parse_set::<SlaLevel>("sla", &["Critical".to_string(), "low".to_string()]).unwrap();
        assert_eq!(ok.len(), 2);

        let err = parse_set::<CatalogType>("type", &["service".to_string()]).unwrap_err();
        assert!(err.starts_with("invalid --type"));
    }
}
