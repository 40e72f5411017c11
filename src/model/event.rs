//! Event types: something that happened to a service.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use super::time;
use super::wire::{self, wire_enum};
use crate::window::Interval;

wire_enum! {
    /// What kind of event was recorded.
    pub enum EventType as "event type" {
        Deployment => "deployment",
        Operation => "operation",
        Drift => "drift",
        Incident => "incident",
        RpaUsage => "rpa_usage",
    }
}

wire_enum! {
    /// Event priority. `P1` is the most urgent.
    pub enum Priority as "priority" {
        P1 => "p1",
        P2 => "p2",
        P3 => "p3",
        P4 => "p4",
        P5 => "p5",
    }
}

wire_enum! {
    /// Event status. Which statuses make sense depends on the event type.
    pub enum Status as "status" {
        Start => "start",
        Failure => "failure",
        Success => "success",
        Warning => "warning",
        Error => "error",
        Snapshot => "snapshot",
        UserUpdate => "user_update",
        Recommendation => "recommendation",
        Open => "open",
        Close => "close",
        Done => "done",
    }
}

wire_enum! {
    /// Deployment environment, from least to most critical.
    pub enum Environment as "environment" {
        Development => "development",
        Integration => "integration",
        Tnr => "tnr",
        Uat => "uat",
        Recette => "recette",
        Preproduction => "preproduction",
        Production => "production",
        Mco => "mco",
    }
}

/// A recorded occurrence tied to a service, environment and time window.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(default)]
    pub title: String,

    pub attributes: EventAttributes,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<EventLinks>,

    /// Server-assigned identity. Absent on events that were never stored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<EventMetadata>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventAttributes {
    #[serde(default)]
    pub message: String,

    #[serde(default)]
    pub source: String,

    #[serde(rename = "type")]
    pub kind: EventType,

    pub priority: Priority,

    /// Id of a related event, e.g. the incident a drift was detected for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_id: Option<String>,

    #[serde(default)]
    pub service: String,

    pub status: Status,

    #[serde(
        default,
        deserialize_with = "wire::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub environment: Option<Environment>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impact: Option<bool>,

    #[serde(
        default,
        deserialize_with = "time::lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub start_date: Option<Timestamp>,

    #[serde(
        default,
        deserialize_with = "time::lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub end_date: Option<Timestamp>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stake_holders: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventLinks {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pull_request_link: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticket: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventMetadata {
    #[serde(default)]
    pub id: String,

    #[serde(
        default,
        deserialize_with = "time::lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<Timestamp>,

    /// Time between creation and the terminal status, as the server formats it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slack_id: Option<String>,
}

/// The response body of the event list endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventListing {
    #[serde(default)]
    pub events: Vec<Event>,

    #[serde(default)]
    pub total_count: u64,
}

impl Event {
    pub fn id(&self) -> Option<&str> {
        self.metadata
            .as_ref()
            .map(|m| m.id.as_str())
            .filter(|id| !id.is_empty())
    }

    pub fn slack_id(&self) -> Option<&str> {
        self.metadata
            .as_ref()
            .and_then(|m| m.slack_id.as_deref())
            .filter(|id| !id.is_empty())
    }

    pub fn created_at(&self) -> Option<Timestamp> {
        self.metadata.as_ref().and_then(|m| m.created_at)
    }

    /// When the event began: `startDate`, falling back to `createdAt`.
    pub fn start(&self) -> Option<Timestamp> {
        self.attributes.start_date.or_else(|| self.created_at())
    }

    /// The closed time interval the event occupies.
    ///
    /// Without an `endDate` the event is a single point at its start. An
    /// `endDate` earlier than the start is ignored the same way. `None` when
    /// the event has neither `startDate` nor `createdAt`.
    pub fn interval(&self) -> Option<Interval> {
        let start = self.start()?;
        Some(match self.attributes.end_date {
            Some(end) if end >= start => Interval { start, end },
            _ => Interval::point(start),
        })
    }
}
