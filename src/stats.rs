//! Counters and breakdowns derived from a set of events.

use std::collections::{BTreeMap, BTreeSet};

use jiff::civil::Date;
use serde::Serialize;

use crate::model::{Environment, Event, EventType, Priority, Status};
use crate::window::DateWindow;

/// How many rows the service and project breakdowns keep.
pub const TOP_BREAKDOWNS: usize = 10;

/// Label for events whose service is blank.
const UNKNOWN: &str = "Unknown";

/// The dashboard's headline counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total: usize,
    pub success: usize,

    /// Events that ended in `failure` or `error`.
    pub failure: usize,

    /// Events still at `start`.
    pub in_progress: usize,

    /// `P1` events.
    pub critical: usize,
}

impl DashboardStats {
    pub fn from_events(events: &[&Event]) -> Self {
        let mut stats = Self::default();
        for event in events {
            stats.total += 1;
            match event.attributes.status {
                Status::Success => stats.success += 1,
                Status::Failure | Status::Error => stats.failure += 1,
                Status::Start => stats.in_progress += 1,
                _ => {}
            }
            if event.attributes.priority == Priority::P1 {
                stats.critical += 1;
            }
        }
        stats
    }
}

/// Event counts per type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeCounts {
    pub deployments: usize,
    pub incidents: usize,
    pub operations: usize,
    pub drifts: usize,
    pub rpa_usages: usize,
}

impl TypeCounts {
    pub fn add(&mut self, kind: EventType) {
        match kind {
            EventType::Deployment => self.deployments += 1,
            EventType::Incident => self.incidents += 1,
            EventType::Operation => self.operations += 1,
            EventType::Drift => self.drifts += 1,
            EventType::RpaUsage => self.rpa_usages += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.deployments + self.incidents + self.operations + self.drifts + self.rpa_usages
    }
}

/// Counts for one service or project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Breakdown {
    pub name: String,
    pub total: usize,
    #[serde(flatten)]
    pub counts: TypeCounts,
}

/// Counts for one day of the series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyCounts {
    pub date: Date,
    #[serde(flatten)]
    pub counts: TypeCounts,
}

/// Activity over a window: totals, deployment health and where events come
/// from.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Insights {
    pub from: Date,
    pub to: Date,
    pub total: usize,
    pub counts: TypeCounts,

    /// Percent of deployments that succeeded, rounded. `None` without
    /// deployments.
    pub deployment_success_rate: Option<u32>,

    pub services: Vec<Breakdown>,
    pub projects: Vec<Breakdown>,

    /// One row per day of the window, dated by `createdAt`.
    pub daily: Vec<DailyCounts>,
}

impl Insights {
    pub fn compute(events: &[&Event], window: &DateWindow) -> Self {
        let mut counts = TypeCounts::default();
        let mut deployments = 0_usize;
        let mut succeeded = 0_usize;
        let mut services: BTreeMap<String, TypeCounts> = BTreeMap::new();
        let mut projects: BTreeMap<String, TypeCounts> = BTreeMap::new();
        let mut daily: BTreeMap<Date, TypeCounts> = window
            .days()
            .map(|day| (day, TypeCounts::default()))
            .collect();

        for event in events {
            let kind = event.attributes.kind;
            counts.add(kind);
            if kind == EventType::Deployment {
                deployments += 1;
                if event.attributes.status == Status::Success {
                    succeeded += 1;
                }
            }

            let service = match event.attributes.service.as_str() {
                "" => UNKNOWN,
                name => name,
            };
            services.entry(service.to_string()).or_default().add(kind);
            projects
                .entry(project_of(&event.attributes.service).to_string())
                .or_default()
                .add(kind);

            if let Some(day) = event
                .created_at()
                .map(|at| window.local_date(at))
                .and_then(|day| daily.get_mut(&day))
            {
                day.add(kind);
            }
        }

        Self {
            from: window.first_day(),
            to: window.last_day(),
            total: events.len(),
            counts,
            deployment_success_rate: percent(succeeded, deployments),
            services: top(services),
            projects: top(projects),
            daily: daily
                .into_iter()
                .map(|(date, counts)| DailyCounts { date, counts })
                .collect(),
        }
    }
}

/// The project a service belongs to: its name up to the first `-`.
pub fn project_of(service: &str) -> &str {
    match service.split('-').next() {
        Some(project) if !project.is_empty() => project,
        _ => UNKNOWN,
    }
}

/// Whether an event's service belongs to `project`.
pub fn in_project(event: &Event, project: &str) -> bool {
    event.attributes.service.starts_with(project)
}

#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn percent(part: usize, whole: usize) -> Option<u32> {
    (whole > 0).then(|| (part as f64 / whole as f64 * 100.0).round() as u32)
}

/// Largest first, ties by name, cut to [`TOP_BREAKDOWNS`].
fn top(counts: BTreeMap<String, TypeCounts>) -> Vec<Breakdown> {
    let mut rows: Vec<Breakdown> = counts
        .into_iter()
        .map(|(name, counts)| Breakdown {
            name,
            total: counts.total(),
            counts,
        })
        .collect();
    rows.sort_by(|a, b| b.total.cmp(&a.total));
    rows.truncate(TOP_BREAKDOWNS);
    rows
}

/// The distinct values present in each filter dimension.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Facets {
    pub environments: Vec<Environment>,
    pub types: Vec<EventType>,
    pub priorities: Vec<Priority>,
    pub statuses: Vec<Status>,
    pub services: Vec<String>,
}

impl Facets {
    pub fn from_events(events: &[&Event]) -> Self {
        let mut environments = BTreeSet::new();
        let mut types = BTreeSet::new();
        let mut priorities = BTreeSet::new();
        let mut statuses = BTreeSet::new();
        let mut services = BTreeSet::new();

        for event in events {
            let attrs = &event.attributes;
            environments.extend(attrs.environment);
            types.insert(attrs.kind);
            priorities.insert(attrs.priority);
            statuses.insert(attrs.status);
            if !attrs.service.is_empty() {
                services.insert(attrs.service.clone());
            }
        }

        Self {
            environments: environments.into_iter().collect(),
            types: types.into_iter().collect(),
            priorities: priorities.into_iter().collect(),
            statuses: statuses.into_iter().collect(),
            services: services.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use jiff::civil::date;
    use jiff::tz::TimeZone;

    use super::*;
    use crate::model::{EventAttributes, EventMetadata};

    fn event(kind: EventType, status: Status, priority: Priority, service: &str) -> Event {
        Event {
            title: String::new(),
            attributes: EventAttributes {
                message: String::new(),
                source: String::new(),
                kind,
                priority,
                related_id: None,
                service: service.to_string(),
                status,
                environment: None,
                impact: None,
                start_date: None,
                end_date: None,
                owner: None,
                stake_holders: Vec::new(),
                notification: None,
            },
            links: None,
            metadata: None,
        }
    }

    fn created(mut event: Event, at: &str) -> Event {
        event.metadata = Some(EventMetadata {
            id: String::new(),
            created_at: Some(at.parse().unwrap()),
            duration: None,
            slack_id: None,
        });
        event
    }

    #[test]
    fn dashboard_counts_error_as_failure() {
        let events = [
            event(EventType::Deployment, Status::Success, Priority::P3, "a"),
            event(EventType::Deployment, Status::Failure, Priority::P1, "a"),
            event(EventType::Incident, Status::Error, Priority::P1, "b"),
            event(EventType::Deployment, Status::Start, Priority::P2, "b"),
            event(EventType::Drift, Status::Open, Priority::P4, "c"),
        ];
        let refs: Vec<&Event> = events.iter().collect();
        let stats = DashboardStats::from_events(&refs);
        assert_eq!(
            stats,
            DashboardStats {
                total: 5,
                success: 1,
                failure: 2,
                in_progress: 1,
                critical: 2,
            }
        );
    }

    #[test]
    fn projects_are_service_prefixes() {
        assert_eq!(project_of("auth-service"), "auth");
        assert_eq!(project_of("billing"), "billing");
        assert_eq!(project_of(""), "Unknown");
        assert_eq!(project_of("-edge"), "Unknown");
    }

    #[test]
    fn insights_breakdowns_and_series() {
        let window = DateWindow::custom(date(2024, 6, 1), date(2024, 6, 3), &TimeZone::UTC)
            .unwrap();
        let events = [
            created(event(EventType::Deployment, Status::Success, Priority::P3, "auth-api"), "2024-06-01T10:00:00Z"),
            created(event(EventType::Deployment, Status::Failure, Priority::P3, "auth-worker"), "2024-06-01T11:00:00Z"),
            created(event(EventType::Deployment, Status::Success, Priority::P3, "auth-api"), "2024-06-03T09:00:00Z"),
            created(event(EventType::Incident, Status::Open, Priority::P1, "billing"), "2024-06-03T09:30:00Z"),
            event(EventType::Operation, Status::Done, Priority::P5, ""),
        ];
        let refs: Vec<&Event> = events.iter().collect();
        let insights = Insights::compute(&refs, &window);

        assert_eq!(insights.total, 5);
        assert_eq!(insights.counts.deployments, 3);
        assert_eq!(insights.deployment_success_rate, Some(67));

        let services: Vec<(&str, usize)> = insights
            .services
            .iter()
            .map(|b| (b.name.as_str(), b.total))
            .collect();
        assert_eq!(
            services,
            vec![("auth-api", 2), ("Unknown", 1), ("auth-worker", 1), ("billing", 1)]
        );
        assert_eq!(insights.projects[0].name, "auth");
        assert_eq!(insights.projects[0].total, 3);

        let series: Vec<(Date, usize)> = insights
            .daily
            .iter()
            .map(|d| (d.date, d.counts.total()))
            .collect();
        assert_eq!(
            series,
            vec![
                (date(2024, 6, 1), 2),
                (date(2024, 6, 2), 0),
                (date(2024, 6, 3), 2),
            ]
        );
    }

    #[test]
    fn no_deployments_means_no_success_rate() {
        let window = DateWindow::today(&TimeZone::UTC).unwrap();
        let events = [event(EventType::Incident, Status::Open, Priority::P2, "db")];
        let refs: Vec<&Event> = events.iter().collect();
        assert_eq!(Insights::compute(&refs, &window).deployment_success_rate, None);
    }

    #[test]
    fn breakdowns_keep_the_top_ten() {
        let window = DateWindow::today(&TimeZone::UTC).unwrap();
        let events: Vec<Event> = (0..12)
            .map(|i| event(EventType::Operation, Status::Done, Priority::P3, &format!("svc{i:02}-x")))
            .collect();
        let refs: Vec<&Event> = events.iter().collect();
        let insights = Insights::compute(&refs, &window);
        assert_eq!(insights.services.len(), TOP_BREAKDOWNS);
        assert_eq!(insights.services[0].name, "svc00-x");
        assert_eq!(insights.projects.len(), TOP_BREAKDOWNS);
    }

    #[test]
    fn project_filter_matches_prefixes() {
        let auth = event(EventType::Drift, Status::Open, Priority::P3, "auth-service");
        assert!(in_project(&auth, "auth"));
        assert!(!in_project(&auth, "billing"));
    }

    #[test]
    fn facets_are_sorted_and_skip_blanks() {
        let mut prod = event(EventType::Incident, Status::Open, Priority::P2, "user-api");
        prod.attributes.environment = Some(Environment::Production);
        let mut dev = event(EventType::Deployment, Status::Success, Priority::P2, "auth-service");
        dev.attributes.environment = Some(Environment::Development);
        let blank = event(EventType::Deployment, Status::Start, Priority::P1, "");
        let events = [prod, dev, blank];
        let refs: Vec<&Event> = events.iter().collect();

        let facets = Facets::from_events(&refs);
        assert_eq!(
            facets.environments,
            vec![Environment::Development, Environment::Production]
        );
        assert_eq!(facets.types, vec![EventType::Deployment, EventType::Incident]);
        assert_eq!(facets.priorities, vec![Priority::P1, Priority::P2]);
        assert_eq!(facets.services, vec!["auth-service".to_string(), "user-api".to_string()]);
    }
}
