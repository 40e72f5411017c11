//! The event filter/sort pipeline.
//!
//! A query narrows a list of events in three steps: an optional date window,
//! then the conjunction of five multi-select filters, then an optional stable
//! sort on a timestamp. The input is never touched; the result is a fresh
//! list of references into it.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use jiff::Timestamp;
use serde::Serialize;
use tracing::debug;

use crate::model::{Environment, Event, EventType, Priority, Status, UnknownValue};
use crate::window::DateWindow;

/// A field events can be filtered on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Environment,
    Type,
    Priority,
    Status,
    Service,
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Environment => "environment",
            Self::Type => "type",
            Self::Priority => "priority",
            Self::Status => "status",
            Self::Service => "service",
        })
    }
}

/// A filter value that names nothing in its dimension.
#[derive(Debug, thiserror::Error)]
#[error("invalid {dimension} filter: {source}")]
pub struct SelectionError {
    pub dimension: Dimension,
    #[source]
    pub source: UnknownValue,
}

/// The user's current selection in each filter dimension.
///
/// An empty selection imposes no constraint. Service names are kept
/// lowercased and compared case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    pub environments: BTreeSet<Environment>,
    pub types: BTreeSet<EventType>,
    pub priorities: BTreeSet<Priority>,
    pub statuses: BTreeSet<Status>,
    services: BTreeSet<String>,
}

impl FilterState {
    /// Add user-supplied values to one dimension.
    ///
    /// Values go through the same normalization as ingested records, so
    /// `Production`, `production` and `7` select the same environment.
    pub fn select<S: AsRef<str>>(
        &mut self,
        dimension: Dimension,
        values: &[S],
    ) -> Result<(), SelectionError> {
        let wrap = |source| SelectionError { dimension, source };
        for value in values {
            let value = value.as_ref();
            match dimension {
                Dimension::Environment => {
                    self.environments.insert(value.parse().map_err(wrap)?);
                }
                Dimension::Type => {
                    self.types.insert(value.parse().map_err(wrap)?);
                }
                Dimension::Priority => {
                    self.priorities.insert(value.parse().map_err(wrap)?);
                }
                Dimension::Status => {
                    self.statuses.insert(value.parse().map_err(wrap)?);
                }
                Dimension::Service => {
                    self.services.insert(value.trim().to_lowercase());
                }
            }
        }
        Ok(())
    }

    /// Number of selected values across all dimensions.
    pub fn active_count(&self) -> usize {
        self.environments.len()
            + self.types.len()
            + self.priorities.len()
            + self.statuses.len()
            + self.services.len()
    }

    /// Whether an event passes every active dimension.
    pub fn matches(&self, event: &Event) -> bool {
        let attrs = &event.attributes;
        let environment_ok = self.environments.is_empty()
            || attrs
                .environment
                .is_some_and(|env| self.environments.contains(&env));

        environment_ok
            && passes(&self.types, &attrs.kind)
            && passes(&self.priorities, &attrs.priority)
            && passes(&self.statuses, &attrs.status)
            && (self.services.is_empty() || self.services.contains(&attrs.service.to_lowercase()))
    }
}

fn passes<T: Ord>(selected: &BTreeSet<T>, value: &T) -> bool {
    selected.is_empty() || selected.contains(value)
}

/// Which timestamp places an event in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TimeField {
    /// When the event was recorded.
    #[default]
    CreatedAt,

    /// When the event began, falling back to when it was recorded.
    StartDate,
}

impl TimeField {
    pub fn resolve(self, event: &Event) -> Option<Timestamp> {
        match self {
            Self::CreatedAt => event.created_at(),
            Self::StartDate => event.start(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    #[default]
    Descending,
}

/// A complete view request: window, filters and sort.
#[derive(Debug, Clone, Default)]
pub struct EventQuery {
    pub filters: FilterState,
    pub window: Option<DateWindow>,
    pub time_field: TimeField,
    pub sort: Option<SortDirection>,
}

impl EventQuery {
    /// Run the query over `events`.
    ///
    /// Events whose timestamp cannot be resolved are dropped when a window
    /// is set and sorted last otherwise.
    pub fn apply<'a>(&self, events: &'a [Event]) -> Vec<&'a Event> {
        let mut selected: Vec<&Event> = events
            .iter()
            .filter(|event| self.in_window(event))
            .filter(|event| self.filters.matches(event))
            .collect();

        if let Some(direction) = self.sort {
            sort_by_time(&mut selected, self.time_field, direction);
        }

        debug!(
            input = events.len(),
            output = selected.len(),
            filters = self.filters.active_count(),
            from = ?self.window.as_ref().map(DateWindow::start),
            to = ?self.window.as_ref().map(DateWindow::end),
            "applied event query"
        );
        selected
    }

    fn in_window(&self, event: &Event) -> bool {
        match &self.window {
            None => true,
            Some(window) => self
                .time_field
                .resolve(event)
                .is_some_and(|at| window.contains(at)),
        }
    }
}

/// Stable sort on a timestamp field. Undated events go last in input order.
pub fn sort_by_time(events: &mut [&Event], field: TimeField, direction: SortDirection) {
    events.sort_by(|a, b| match (field.resolve(a), field.resolve(b)) {
        (Some(x), Some(y)) => match direction {
            SortDirection::Ascending => x.cmp(&y),
            SortDirection::Descending => y.cmp(&x),
        },
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}

/// What to bucket events by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupBy {
    Service,
    Environment,
}

/// Events sharing a service or environment.
#[derive(Debug, Clone, Serialize)]
pub struct EventGroup<'a> {
    pub key: String,
    pub events: Vec<&'a Event>,
}

/// Bucket events, largest group first, ties by key.
///
/// Services group case-insensitively under their lowercased name, the same
/// way service filters match. Events without an environment group under
/// `unknown`. Within a group, events keep their input order.
pub fn group_events<'a>(events: &[&'a Event], by: GroupBy) -> Vec<EventGroup<'a>> {
    let mut buckets: BTreeMap<String, Vec<&'a Event>> = BTreeMap::new();
    for &event in events {
        let key = match by {
            GroupBy::Service => event.attributes.service.to_lowercase(),
            GroupBy::Environment => event
                .attributes
                .environment
                .map_or_else(|| "unknown".to_string(), |env| env.to_string()),
        };
        buckets.entry(key).or_default().push(event);
    }

    let mut groups: Vec<EventGroup<'a>> = buckets
        .into_iter()
        .map(|(key, events)| EventGroup { key, events })
        .collect();
    groups.sort_by(|a, b| b.events.len().cmp(&a.events.len()));
    groups
}

#[cfg(test)]
mod tests {
    use jiff::civil::date;
    use jiff::tz::TimeZone;

    use super::*;
    use crate::model::EventAttributes;
    use crate::model::EventMetadata;
    use crate::window::WindowDays;

    fn event(
        id: &str,
        env: Option<Environment>,
        kind: EventType,
        service: &str,
        created_at: Option<&str>,
    ) -> Event {
        Event {
            title: id.to_string(),
            attributes: EventAttributes {
                message: String::new(),
                source: "test".to_string(),
                kind,
                priority: Priority::P3,
                related_id: None,
                service: service.to_string(),
                status: Status::Success,
                environment: env,
                impact: None,
                start_date: None,
                end_date: None,
                owner: None,
                stake_holders: Vec::new(),
                notification: None,
            },
            links: None,
            metadata: Some(EventMetadata {
                id: id.to_string(),
                created_at: created_at.map(|s| s.parse().unwrap()),
                duration: None,
                slack_id: None,
            }),
        }
    }

    /// Five events across three environments and two types.
    fn fixture() -> Vec<Event> {
        use Environment::{Development, Preproduction, Production};
        use EventType::{Deployment, Incident};
        vec![
            event("a", Some(Production), Incident, "auth-service", Some("2024-06-05T10:00:00Z")),
            event("b", Some(Production), Deployment, "auth-service", Some("2024-06-05T11:00:00Z")),
            event("c", Some(Preproduction), Incident, "user-api", Some("2024-06-06T09:00:00Z")),
            event("d", Some(Development), Deployment, "user-api", Some("2024-06-07T09:00:00Z")),
            event("e", Some(Production), Incident, "billing", Some("2024-06-08T09:00:00Z")),
        ]
    }

    fn titles(events: &[&Event]) -> Vec<String> {
        events.iter().map(|e| e.title.clone()).collect()
    }

    #[test]
    fn empty_selection_passes_everything_through() {
        let events = fixture();
        let result = EventQuery::default().apply(&events);
        assert_eq!(titles(&result), vec!["a", "b", "c", "d", "e"]);
    }

    #[test]
    fn dimensions_combine_with_and() {
        let events = fixture();
        let mut query = EventQuery::default();
        query
            .filters
            .select(Dimension::Environment, &["production"])
            .unwrap();
        query.filters.select(Dimension::Type, &["incident"]).unwrap();

        let result = query.apply(&events);
        assert_eq!(titles(&result), vec!["a", "e"]);
        for event in result {
            assert_eq!(event.attributes.environment, Some(Environment::Production));
            assert_eq!(event.attributes.kind, EventType::Incident);
        }
    }

    #[test]
    fn values_within_a_dimension_combine_with_or() {
        let events = fixture();
        let mut query = EventQuery::default();
        query
            .filters
            .select(Dimension::Environment, &["Development", "PREPRODUCTION"])
            .unwrap();
        assert_eq!(titles(&query.apply(&events)), vec!["c", "d"]);
    }

    #[test]
    fn services_match_case_insensitively() {
        let events = fixture();
        let mut query = EventQuery::default();
        query
            .filters
            .select(Dimension::Service, &["Auth-Service"])
            .unwrap();
        assert_eq!(titles(&query.apply(&events)), vec!["a", "b"]);
    }

    #[test]
    fn missing_environment_fails_an_active_environment_filter() {
        let events = vec![event("x", None, EventType::Drift, "svc", None)];
        let mut filters = FilterState::default();
        assert!(filters.matches(&events[0]));
        filters
            .select(Dimension::Environment, &["production"])
            .unwrap();
        assert!(!filters.matches(&events[0]));
    }

    #[test]
    fn unknown_selection_is_rejected() {
        let mut filters = FilterState::default();
        let err = filters
            .select(Dimension::Priority, &["urgent"])
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid priority filter: unknown priority `urgent`"
        );
        assert_eq!(filters.active_count(), 0);
    }

    #[test]
    fn active_count_sums_dimensions() {
        let mut filters = FilterState::default();
        filters
            .select(Dimension::Environment, &["uat", "tnr"])
            .unwrap();
        filters.select(Dimension::Service, &["billing"]).unwrap();
        assert_eq!(filters.active_count(), 3);
    }

    #[test]
    fn descending_sort_keeps_ties_in_input_order() {
        let events = vec![
            event("first", None, EventType::Operation, "s", Some("2024-06-05T10:00:00Z")),
            event("later", None, EventType::Operation, "s", Some("2024-06-06T10:00:00Z")),
            event("second", None, EventType::Operation, "s", Some("2024-06-05T10:00:00Z")),
        ];
        let query = EventQuery {
            sort: Some(SortDirection::Descending),
            ..EventQuery::default()
        };
        assert_eq!(titles(&query.apply(&events)), vec!["later", "first", "second"]);
    }

    #[test]
    fn ascending_sort_puts_undated_events_last() {
        let events = vec![
            event("undated", None, EventType::Operation, "s", None),
            event("late", None, EventType::Operation, "s", Some("2024-06-06T10:00:00Z")),
            event("early", None, EventType::Operation, "s", Some("2024-06-05T10:00:00Z")),
        ];
        let query = EventQuery {
            sort: Some(SortDirection::Ascending),
            ..EventQuery::default()
        };
        assert_eq!(titles(&query.apply(&events)), vec!["early", "late", "undated"]);
    }

    #[test]
    fn week_window_edges() {
        let events = vec![
            event("inside", None, EventType::Operation, "s", Some("2024-06-03T00:00:00Z")),
            event("outside", None, EventType::Operation, "s", Some("2024-06-02T23:59:59Z")),
            event("undated", None, EventType::Operation, "s", None),
        ];
        let window =
            DateWindow::lookback(date(2024, 6, 10), WindowDays::new(7).unwrap(), &TimeZone::UTC)
                .unwrap();
        let query = EventQuery {
            window: Some(window),
            ..EventQuery::default()
        };
        assert_eq!(titles(&query.apply(&events)), vec!["inside"]);
    }

    #[test]
    fn start_date_field_falls_back_to_created_at() {
        let mut started = event("started", None, EventType::Operation, "s", Some("2024-05-01T00:00:00Z"));
        started.attributes.start_date = Some("2024-06-05T08:00:00Z".parse().unwrap());
        let recorded = event("recorded", None, EventType::Operation, "s", Some("2024-06-05T09:00:00Z"));
        let events = vec![started, recorded];

        let window = DateWindow::custom(date(2024, 6, 5), date(2024, 6, 5), &TimeZone::UTC)
            .unwrap();
        let by_start = EventQuery {
            window: Some(window.clone()),
            time_field: TimeField::StartDate,
            ..EventQuery::default()
        };
        assert_eq!(titles(&by_start.apply(&events)), vec!["started", "recorded"]);

        let by_creation = EventQuery {
            window: Some(window),
            ..EventQuery::default()
        };
        assert_eq!(titles(&by_creation.apply(&events)), vec!["recorded"]);
    }

    #[test]
    fn input_is_left_untouched() {
        let events = fixture();
        let before: Vec<String> = events.iter().map(|e| e.title.clone()).collect();
        let query = EventQuery {
            sort: Some(SortDirection::Ascending),
            ..EventQuery::default()
        };
        let _ = query.apply(&events);
        let after: Vec<String> = events.iter().map(|e| e.title.clone()).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn groups_by_size_then_key() {
        let events = fixture();
        let refs: Vec<&Event> = events.iter().collect();

        let by_service = group_events(&refs, GroupBy::Service);
        let keys: Vec<&str> = by_service.iter().map(|g| g.key.as_str()).collect();
        assert_eq!(keys, vec!["auth-service", "user-api", "billing"]);

        let by_env = group_events(&refs, GroupBy::Environment);
        assert_eq!(by_env[0].key, "production");
        assert_eq!(titles(&by_env[0].events), vec!["a", "b", "e"]);
    }

    #[test]
    fn service_groups_ignore_case() {
        let events = vec![
            event("a", None, EventType::Deployment, "Auth-Service", None),
            event("b", None, EventType::Deployment, "auth-service", None),
            event("c", None, EventType::Deployment, "billing", None),
        ];
        let refs: Vec<&Event> = events.iter().collect();
        let groups = group_events(&refs, GroupBy::Service);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].key, "auth-service");
        assert_eq!(titles(&groups[0].events), vec!["a", "b"]);
    }

}
