//! Catalog types: services, libraries and deliverables with their metadata.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use super::time;
use super::wire::{self, wire_enum};

wire_enum! {
    /// What a catalog entry describes.
    pub enum CatalogType as "catalog type" {
        Module => "module",
        Library => "library",
        Workflow => "workflow",
        Project => "project",
        Chart => "chart",
        Package => "package",
        Container => "container",
    }
}

wire_enum! {
    /// Primary language of a catalog entry.
    pub enum Language as "language" {
        Golang => "golang",
        Kotlin => "kotlin",
        Java => "java",
        Terraform => "terraform",
        Helm => "helm",
        Javascript => "javascript",
        Yaml => "yaml",
        Docker => "docker",
        Python => "python",
        Php => "php",
        Rust => "rust",
        Typescript => "typescript",
        Groovy => "groovy",
    }
}

wire_enum! {
    /// Service level tier, most demanding first.
    pub enum SlaLevel as "SLA level" {
        Critical => "critical",
        High => "high",
        Medium => "medium",
        Low => "low",
    }
}

impl CatalogType {
    /// Deliverables are versioned artifacts that projects consume.
    pub fn is_deliverable(self) -> bool {
        matches!(
            self,
            Self::Package | Self::Chart | Self::Container | Self::Module
        )
    }
}

/// A registered service, library or module.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    pub name: String,

    #[serde(rename = "type")]
    pub kind: CatalogType,

    #[serde(
        default,
        deserialize_with = "wire::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub languages: Option<Language>,

    #[serde(default)]
    pub owner: String,

    #[serde(default)]
    pub version: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,

    /// Names of entries this one depends on.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies_in: Vec<String>,

    /// Names of entries that depend on this one.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies_out: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sla: Option<Sla>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub used_deliverables: Vec<UsedDeliverable>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub communication_channels: Vec<CommunicationChannel>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub available_versions: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_version: Option<String>,

    /// The version projects are expected to run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_version: Option<String>,

    #[serde(
        default,
        deserialize_with = "time::lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<Timestamp>,

    #[serde(
        default,
        deserialize_with = "time::lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<Timestamp>,
}

/// Service level agreement attached to a catalog entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sla {
    #[serde(
        default,
        deserialize_with = "wire::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub level: Option<SlaLevel>,

    #[serde(default, alias = "uptime", skip_serializing_if = "Option::is_none")]
    pub uptime_percentage: Option<f64>,

    #[serde(
        default,
        alias = "responseTime",
        skip_serializing_if = "Option::is_none"
    )]
    pub response_time_ms: Option<u32>,
}

/// A deliverable a project consumes, pinned at a version.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsedDeliverable {
    pub name: String,

    #[serde(
        rename = "type",
        default,
        deserialize_with = "wire::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub kind: Option<CatalogType>,

    #[serde(default)]
    pub version_used: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Where to reach the team behind an entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunicationChannel {
    #[serde(rename = "type", default)]
    pub kind: String,

    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

/// The response body of the catalog list endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogListing {
    #[serde(default)]
    pub catalogs: Vec<Catalog>,

    #[serde(default)]
    pub total_count: u64,
}

/// Minutes in the 30-day month SLA budgets are computed over.
const MONTH_MINUTES: f64 = 30.0 * 24.0 * 60.0;

impl Sla {
    /// Allowed downtime per 30-day month, e.g. `43min` for 99.9% uptime.
    ///
    /// `None` when no uptime target is set.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn monthly_downtime(&self) -> Option<String> {
        let uptime = self.uptime_percentage?;
        let minutes = ((100.0 - uptime) / 100.0 * MONTH_MINUTES).max(0.0);

        if minutes < 1.0 {
            return Some(format!("{}s", (minutes * 60.0).round() as u64));
        }
        if minutes < 60.0 {
            return Some(format!("{}min", minutes.round() as u64));
        }

        let mut hours = (minutes / 60.0).floor() as u64;
        let mut rest = (minutes % 60.0).round() as u64;
        if rest == 60 {
            hours += 1;
            rest = 0;
        }
        if rest > 0 {
            Some(format!("{hours}h {rest}min"))
        } else {
            Some(format!("{hours}h"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sla(uptime: f64) -> Sla {
        Sla {
            uptime_percentage: Some(uptime),
            ..Sla::default()
        }
    }

    #[test]
    fn reads_catalog_entry() {
        let json = r##"{
            "name": "auth-service",
            "type": "project",
            "languages": "golang",
            "owner": "team-identity",
            "version": "2.3.1",
            "dependenciesIn": ["user-api"],
            "sla": { "level": "critical", "uptimePercentage": 99.99, "responseTimeMs": 100 },
            "usedDeliverables": [
                { "name": "base-docker-image", "type": "container", "versionUsed": "1.2.0" }
            ],
            "communicationChannels": [
                { "type": "slack", "name": "#identity", "link": "https://slack.example/identity" }
            ]
        }"##;
        let catalog: Catalog = serde_json::from_str(json).unwrap();
        assert_eq!(catalog.kind, CatalogType::Project);
        assert_eq!(catalog.languages, Some(Language::Golang));
        assert_eq!(catalog.dependencies_in, vec!["user-api".to_string()]);
        let sla = catalog.sla.unwrap();
        assert_eq!(sla.level, Some(SlaLevel::Critical));
        assert_eq!(sla.response_time_ms, Some(100));
        assert_eq!(
            catalog.used_deliverables[0].kind,
            Some(CatalogType::Container)
        );
        assert_eq!(catalog.communication_channels[0].kind, "slack");
    }

    #[test]
    fn reads_short_sla_field_names() {
        let json = r#"{ "level": "high", "uptime": 99.9, "responseTime": 200 }"#;
        let sla: Sla = serde_json::from_str(json).unwrap();
        assert_eq!(sla.level, Some(SlaLevel::High));
        assert_eq!(sla.uptime_percentage, Some(99.9));
        assert_eq!(sla.response_time_ms, Some(200));
    }

    #[test]
    fn deliverable_types() {
        assert!(CatalogType::Package.is_deliverable());
        assert!(CatalogType::Chart.is_deliverable());
        assert!(CatalogType::Container.is_deliverable());
        assert!(CatalogType::Module.is_deliverable());
        assert!(!CatalogType::Project.is_deliverable());
        assert!(!CatalogType::Library.is_deliverable());
    }

    #[test]
    fn monthly_downtime_budgets() {
        assert_eq!(sla(99.9).monthly_downtime().as_deref(), Some("43min"));
        assert_eq!(sla(99.99).monthly_downtime().as_deref(), Some("4min"));
        assert_eq!(sla(99.999).monthly_downtime().as_deref(), Some("26s"));
        assert_eq!(sla(99.0).monthly_downtime().as_deref(), Some("7h 12min"));
        assert_eq!(sla(95.0).monthly_downtime().as_deref(), Some("36h"));
        assert_eq!(Sla::default().monthly_downtime(), None);
    }
}
