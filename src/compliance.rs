//! Version compliance: do projects run the versions their deliverables
//! recommend?
//!
//! Deliverables (packages, charts, containers and modules) may carry a
//! reference version. A project using a deliverable at any other version is
//! outdated for that usage; a project with no outdated usage is compliant.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::Serialize;
use tracing::info;

use crate::catalog::contains_ignore_case;
use crate::model::{Catalog, CatalogType};

/// One deliverable as a project uses it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliverableUsage {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: CatalogType,
    pub current_version: String,
    pub latest_version: Option<String>,
    pub reference_version: Option<String>,
    pub is_outdated: bool,
    pub is_latest: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectCompliance {
    pub project_name: String,
    pub deliverables: Vec<DeliverableUsage>,
    pub outdated_count: usize,
    pub total_count: usize,
    pub compliance_percentage: f64,
}

impl ProjectCompliance {
    pub fn is_compliant(&self) -> bool {
        self.outdated_count == 0
    }
}

/// How widely one deliverable is used, and how often at the wrong version.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliverableStats {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: CatalogType,
    pub projects_using: usize,
    pub projects_outdated: usize,
    pub latest_version: Option<String>,
    pub reference_version: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceSummary {
    pub total_projects: usize,
    pub compliant_projects: usize,
    pub non_compliant_projects: usize,
    pub overall_compliance_percentage: f64,
    pub deliverable_stats: Vec<DeliverableStats>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceReport {
    pub projects: Vec<ProjectCompliance>,
    pub summary: ComplianceSummary,
}

impl ComplianceReport {
    /// Check every project in the catalog against its deliverables.
    ///
    /// Used deliverables that are not catalogued as deliverables are
    /// skipped. Projects and deliverable stats are ordered by name.
    pub fn build(catalogs: &[Catalog]) -> Self {
        let deliverables: HashMap<&str, &Catalog> = catalogs
            .iter()
            .filter(|c| c.kind.is_deliverable())
            .map(|c| (c.name.as_str(), c))
            .collect();
        let projects: BTreeMap<&str, &Catalog> = catalogs
            .iter()
            .filter(|c| c.kind == CatalogType::Project)
            .map(|c| (c.name.as_str(), c))
            .collect();

        let mut stats: BTreeMap<&str, DeliverableStats> = BTreeMap::new();
        let mut report = Vec::with_capacity(projects.len());

        for project in projects.values() {
            let mut usages = Vec::new();
            for used in &project.used_deliverables {
                let Some(deliverable) = deliverables.get(used.name.as_str()) else {
                    continue;
                };
                let usage = usage_of(deliverable, &used.version_used);

                let entry = stats
                    .entry(deliverable.name.as_str())
                    .or_insert_with(|| DeliverableStats {
                        name: deliverable.name.clone(),
                        kind: deliverable.kind,
                        projects_using: 0,
                        projects_outdated: 0,
                        latest_version: deliverable.latest_version.clone(),
                        reference_version: deliverable.reference_version.clone(),
                    });
                entry.projects_using += 1;
                if usage.is_outdated {
                    entry.projects_outdated += 1;
                }
                usages.push(usage);
            }
            report.push(project_compliance(project.name.clone(), usages));
        }

        let total = report.len();
        let compliant = report.iter().filter(|p| p.is_compliant()).count();
        let summary = ComplianceSummary {
            total_projects: total,
            compliant_projects: compliant,
            non_compliant_projects: total - compliant,
            overall_compliance_percentage: percentage(compliant, total),
            deliverable_stats: stats.into_values().collect(),
        };

        info!(
            total_projects = total,
            compliant_projects = compliant,
            deliverables_available = deliverables.len(),
            overall_compliance = summary.overall_compliance_percentage,
            "version compliance check completed"
        );

        Self {
            projects: report,
            summary,
        }
    }

    /// Projects matching `search`, with usages narrowed to `types`.
    ///
    /// The search matches a project name or any of its deliverable names,
    /// ignoring case. With a type selection, projects left without
    /// deliverables are dropped. The summary is left as computed.
    pub fn filtered(&self, search: Option<&str>, types: &BTreeSet<CatalogType>) -> Vec<ProjectCompliance> {
        let search = search.filter(|s| !s.is_empty());
        self.projects
            .iter()
            .filter(|project| {
                search.is_none_or(|query| {
                    contains_ignore_case(&project.project_name, query)
                        || project
                            .deliverables
                            .iter()
                            .any(|d| contains_ignore_case(&d.name, query))
                })
            })
            .filter_map(|project| {
                if types.is_empty() {
                    return Some(project.clone());
                }
                let mut narrowed = project.clone();
                narrowed.deliverables.retain(|d| types.contains(&d.kind));
                (!narrowed.deliverables.is_empty()).then_some(narrowed)
            })
            .collect()
    }
}

fn usage_of(deliverable: &Catalog, version_used: &str) -> DeliverableUsage {
    let reference = non_empty(deliverable.reference_version.as_deref());
    let latest = non_empty(deliverable.latest_version.as_deref());
    DeliverableUsage {
        name: deliverable.name.clone(),
        kind: deliverable.kind,
        current_version: version_used.to_string(),
        latest_version: latest.map(ToString::to_string),
        reference_version: reference.map(ToString::to_string),
        is_outdated: reference.is_some_and(|r| r != version_used),
        is_latest: latest.is_some_and(|l| l == version_used),
    }
}

fn project_compliance(project_name: String, deliverables: Vec<DeliverableUsage>) -> ProjectCompliance {
    let total = deliverables.len();
    let outdated = deliverables.iter().filter(|d| d.is_outdated).count();
    ProjectCompliance {
        project_name,
        deliverables,
        outdated_count: outdated,
        total_count: total,
        compliance_percentage: percentage(total - outdated, total),
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

#[allow(clippy::cast_precision_loss)]
fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

/// Sort version strings newest first, comparing digit runs as numbers.
///
/// `1.10.0` lands ahead of `1.9.2`.
pub fn sort_versions_desc(versions: &mut [String]) {
    versions.sort_by(|a, b| compare_versions(b, a));
}

/// Natural ordering of two version strings.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let mut left = chunks(a);
    let mut right = chunks(b);
    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                let ordering = compare_chunks(x, y);
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
        }
    }
}

/// Split into alternating runs of digits and non-digits.
fn chunks(s: &str) -> impl Iterator<Item = &str> {
    let mut rest = s;
    std::iter::from_fn(move || {
        let first = rest.chars().next()?;
        let digits = first.is_ascii_digit();
        let end = rest
            .find(|c: char| c.is_ascii_digit() != digits)
            .unwrap_or(rest.len());
        let (chunk, tail) = rest.split_at(end);
        rest = tail;
        Some(chunk)
    })
}

fn compare_chunks(a: &str, b: &str) -> Ordering {
    let numeric = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if numeric(a) && numeric(b) {
        let a = a.trim_start_matches('0');
        let b = b.trim_start_matches('0');
        a.len().cmp(&b.len()).then_with(|| a.cmp(b))
    } else {
        a.to_lowercase().cmp(&b.to_lowercase())
    }
}
