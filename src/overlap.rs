//! Detection of events that run at the same time in the same environment.

use std::collections::BTreeMap;

use jiff::Timestamp;
use jiff::civil::Date;
use jiff::tz::TimeZone;
use serde::Serialize;
use tracing::debug;

use crate::model::{Environment, Event};
use crate::window::{DateWindow, Interval};

/// Two events whose intervals intersect in one environment.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlapPair<'a> {
    pub event1: &'a Event,
    pub event2: &'a Event,
    pub environment: Environment,
    pub overlap_start: Timestamp,
    pub overlap_end: Timestamp,
}

/// Find every same-environment pair of overlapping events.
///
/// Pairs come out in input order: for events at positions `i < j`, `event1`
/// is the one at `i`. Events without an environment, or without any
/// timestamp to place them, never pair up.
pub fn detect_overlaps<'a, I>(events: I) -> Vec<OverlapPair<'a>>
where
    I: IntoIterator<Item = &'a Event>,
{
    let placed: Vec<(&Event, Environment, Interval)> = events
        .into_iter()
        .filter_map(|event| {
            let env = event.attributes.environment?;
            let interval = event.interval()?;
            Some((event, env, interval))
        })
        .collect();

    let mut pairs = Vec::new();
    for (i, &(first, env, a)) in placed.iter().enumerate() {
        for &(second, other_env, b) in &placed[i + 1..] {
            if env != other_env {
                continue;
            }
            if let Some(shared) = a.intersection(&b) {
                pairs.push(OverlapPair {
                    event1: first,
                    event2: second,
                    environment: env,
                    overlap_start: shared.start,
                    overlap_end: shared.end,
                });
            }
        }
    }

    debug!(
        candidates = placed.len(),
        pairs = pairs.len(),
        "scanned for overlaps"
    );
    pairs
}

/// Events whose interval touches the window.
pub fn events_in_window<'a>(events: &'a [Event], window: &DateWindow) -> Vec<&'a Event> {
    events
        .iter()
        .filter(|event| {
            event
                .interval()
                .is_some_and(|interval| window.intersects(&interval))
        })
        .collect()
}

/// Bucket pairs by the local day their overlap begins.
///
/// Within a day, pairs are ordered by overlap start; ties keep detection
/// order.
pub fn group_by_day<'a>(
    pairs: Vec<OverlapPair<'a>>,
    tz: &TimeZone,
) -> BTreeMap<Date, Vec<OverlapPair<'a>>> {
    let mut days: BTreeMap<Date, Vec<OverlapPair<'a>>> = BTreeMap::new();
    for pair in pairs {
        let day = pair.overlap_start.to_zoned(tz.clone()).date();
        days.entry(day).or_default().push(pair);
    }
    for bucket in days.values_mut() {
        bucket.sort_by_key(|pair| pair.overlap_start);
    }
    days
}
