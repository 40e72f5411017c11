//! Output formatting for CLI display.

use std::fmt::Display;

use jiff::Timestamp;
use jiff::tz::TimeZone;

use crate::catalog::CatalogIndex;
use crate::compliance::{DeliverableUsage, ProjectCompliance};
use crate::dataset::short_id;
use crate::model::{Catalog, Event};
use crate::overlap::OverlapPair;
use crate::stats::{Breakdown, TypeCounts};

/// Placeholder for missing values.
const NONE: &str = "-";

pub(super) fn format_time(at: Option<Timestamp>, tz: &TimeZone) -> String {
    match at {
        Some(at) => at.to_zoned(tz.clone()).strftime("%Y-%m-%d %H:%M").to_string(),
        None => NONE.to_string(),
    }
}

fn format_clock(at: Timestamp, tz: &TimeZone) -> String {
    at.to_zoned(tz.clone()).strftime("%H:%M").to_string()
}

pub(super) fn join_values<T: Display>(values: &[T]) -> String {
    if values.is_empty() {
        return NONE.to_string();
    }
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn or_none(value: Option<&str>) -> &str {
    value.filter(|v| !v.is_empty()).unwrap_or(NONE)
}

fn or_dash(value: &str) -> &str {
    or_none(Some(value))
}

/// One event per line: id, time, environment, type, priority, status,
/// service and title.
pub(super) fn format_event_line(event: &Event, tz: &TimeZone) -> String {
    let attrs = &event.attributes;
    let env = attrs
        .environment
        .map_or_else(|| NONE.to_string(), |env| env.to_string());
    format!(
        "{:<8}  {}  {env:<13} {:<10} {} {:<14} {}  {}",
        event.id().map_or_else(|| NONE.to_string(), short_id),
        format_time(event.created_at(), tz),
        attrs.kind.to_string(),
        attrs.priority,
        attrs.status.to_string(),
        or_dash(&attrs.service),
        event.title,
    )
}

/// Full detail for a single event.
pub(super) fn format_event_detail(event: &Event, tz: &TimeZone, catalogs: &CatalogIndex<'_>) -> String {
    let attrs = &event.attributes;
    let mut lines = vec![
        event.title.clone(),
        format!("  id:           {}", or_none(event.id())),
        format!("  type:         {}", attrs.kind),
        format!("  priority:     {}", attrs.priority),
        format!("  status:       {}", attrs.status),
        format!(
            "  environment:  {}",
            attrs
                .environment
                .map_or_else(|| NONE.to_string(), |env| env.to_string())
        ),
        format!("  service:      {}", or_dash(&attrs.service)),
        format!(
            "  service owner: {}",
            or_none(catalogs.owner_of(&attrs.service))
        ),
        format!("  source:       {}", or_dash(&attrs.source)),
        format!("  created:      {}", format_time(event.created_at(), tz)),
        format!("  start:        {}", format_time(attrs.start_date, tz)),
        format!("  end:          {}", format_time(attrs.end_date, tz)),
    ];

    if let Some(duration) = event.metadata.as_ref().and_then(|m| m.duration.as_deref()) {
        lines.push(format!("  duration:     {duration}"));
    }
    if let Some(owner) = attrs.owner.as_deref() {
        lines.push(format!("  owner:        {owner}"));
    }
    if !attrs.stake_holders.is_empty() {
        lines.push(format!("  stakeholders: {}", attrs.stake_holders.join(", ")));
    }
    if let Some(impact) = attrs.impact {
        lines.push(format!("  impact:       {}", if impact { "yes" } else { "no" }));
    }
    if let Some(related) = attrs.related_id.as_deref() {
        lines.push(format!("  related:      {related}"));
    }
    if let Some(slack) = event.slack_id() {
        lines.push(format!("  slack:        {slack}"));
    }
    if let Some(links) = &event.links {
        if let Some(pr) = links.pull_request_link.as_deref() {
            lines.push(format!("  pull request: {pr}"));
        }
        if let Some(ticket) = links.ticket.as_deref() {
            lines.push(format!("  ticket:       {ticket}"));
        }
    }
    if !attrs.message.is_empty() {
        lines.push(String::new());
        lines.extend(attrs.message.lines().map(|line| format!("  {line}")));
    }
    lines.join("\n")
}

/// One overlap: the shared span and both events with their owners.
pub(super) fn format_overlap(
    pair: &OverlapPair<'_>,
    tz: &TimeZone,
    catalogs: &CatalogIndex<'_>,
) -> String {
    let side = |event: &Event| {
        let service = &event.attributes.service;
        format!(
            "    {} [{}] {} ({}, owner {})",
            event.id().map_or_else(|| NONE.to_string(), short_id),
            event.attributes.kind,
            event.title,
            or_dash(service),
            or_none(catalogs.owner_of(service)),
        )
    };
    format!(
        "  {} {}-{}\n{}\n{}",
        pair.environment,
        format_clock(pair.overlap_start, tz),
        format_clock(pair.overlap_end, tz),
        side(pair.event1),
        side(pair.event2),
    )
}

pub(super) fn format_type_counts(counts: &TypeCounts) -> String {
    format!(
        "{} deployments, {} incidents, {} operations, {} drifts, {} rpa usages",
        counts.deployments, counts.incidents, counts.operations, counts.drifts, counts.rpa_usages
    )
}

pub(super) fn format_breakdown(row: &Breakdown) -> String {
    format!(
        "  {:<24} {:>4}  ({} dep, {} inc, {} ops, {} drift)",
        row.name,
        row.total,
        row.counts.deployments,
        row.counts.incidents,
        row.counts.operations,
        row.counts.drifts,
    )
}

pub(super) fn format_catalog_line(catalog: &Catalog) -> String {
    let sla = catalog
        .sla
        .as_ref()
        .and_then(|sla| sla.level)
        .map_or_else(|| NONE.to_string(), |level| level.to_string());
    format!(
        "{:<28} {:<10} {:<9} {:<10} {}",
        catalog.name,
        catalog.kind.to_string(),
        sla,
        or_dash(&catalog.version),
        or_dash(&catalog.owner),
    )
}

/// Percentages print with one decimal, trimmed when whole.
pub(super) fn format_percent(value: f64) -> String {
    let rounded = (value * 10.0).round() / 10.0;
    if rounded.fract().abs() < f64::EPSILON {
        format!("{rounded:.0}%")
    } else {
        format!("{rounded:.1}%")
    }
}

pub(super) fn format_project_compliance(project: &ProjectCompliance) -> String {
    let mark = if project.is_compliant() { "ok" } else { "outdated" };
    let mut lines = vec![format!(
        "{} [{mark}] {}/{} up to date ({})",
        project.project_name,
        project.total_count - project.outdated_count,
        project.total_count,
        format_percent(project.compliance_percentage),
    )];
    lines.extend(project.deliverables.iter().map(format_usage));
    lines.join("\n")
}

fn format_usage(usage: &DeliverableUsage) -> String {
    let status = if usage.is_outdated {
        "outdated"
    } else if usage.is_latest {
        "latest"
    } else {
        "ok"
    };
    format!(
        "  {:<24} {:<10} {:<10} reference {:<10} latest {:<10} {status}",
        usage.name,
        usage.kind.to_string(),
        or_dash(&usage.current_version),
        or_none(usage.reference_version.as_deref()),
        or_none(usage.latest_version.as_deref()),
    )
}
