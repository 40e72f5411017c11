//! Catalog lookup and filtering.

use std::collections::{BTreeSet, HashMap};

use crate::model::{Catalog, CatalogType, SlaLevel};

/// Narrows the catalog by name, type and SLA level.
#[derive(Debug, Clone, Default)]
pub struct CatalogFilter {
    /// Case-insensitive substring of the entry name.
    pub search: Option<String>,
    pub types: BTreeSet<CatalogType>,
    pub sla_levels: BTreeSet<SlaLevel>,
}

impl CatalogFilter {
    pub fn matches(&self, catalog: &Catalog) -> bool {
        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty())
            && !contains_ignore_case(&catalog.name, search)
        {
            return false;
        }
        if !self.types.is_empty() && !self.types.contains(&catalog.kind) {
            return false;
        }
        if !self.sla_levels.is_empty() {
            let level = catalog.sla.as_ref().and_then(|sla| sla.level);
            if !level.is_some_and(|level| self.sla_levels.contains(&level)) {
                return false;
            }
        }
        true
    }

    /// Matching entries ordered by name.
    pub fn apply<'a>(&self, catalogs: &'a [Catalog]) -> Vec<&'a Catalog> {
        let mut matched: Vec<&Catalog> = catalogs.iter().filter(|c| self.matches(c)).collect();
        matched.sort_by(|a, b| a.name.cmp(&b.name));
        matched
    }
}

pub(crate) fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Catalog entries by name.
///
/// Later entries with a duplicate name shadow earlier ones.
#[derive(Debug, Default)]
pub struct CatalogIndex<'a> {
    by_name: HashMap<&'a str, &'a Catalog>,
}

impl<'a> CatalogIndex<'a> {
    pub fn new(catalogs: &'a [Catalog]) -> Self {
        Self {
            by_name: catalogs.iter().map(|c| (c.name.as_str(), c)).collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&'a Catalog> {
        self.by_name.get(name).copied()
    }

    /// Owner of the named entry, if it is catalogued and has one.
    pub fn owner_of(&self, name: &str) -> Option<&'a str> {
        self.get(name)
            .map(|c| c.owner.as_str())
            .filter(|owner| !owner.is_empty())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::model::Sla;

    pub(crate) fn entry(name: &str, kind: CatalogType) -> Catalog {
        Catalog {
            name: name.to_string(),
            kind,
            languages: None,
            owner: String::new(),
            version: String::new(),
            link: None,
            description: None,
            repository: None,
            dependencies_in: Vec::new(),
            dependencies_out: Vec::new(),
            sla: None,
            used_deliverables: Vec::new(),
            communication_channels: Vec::new(),
            available_versions: Vec::new(),
            latest_version: None,
            reference_version: None,
            created_at: None,
            updated_at: None,
        }
    }

    fn with_sla(mut catalog: Catalog, level: SlaLevel) -> Catalog {
        catalog.sla = Some(Sla {
            level: Some(level),
            ..Sla::default()
        });
        catalog
    }

    fn names(catalogs: &[&Catalog]) -> Vec<String> {
        catalogs.iter().map(|c| c.name.clone()).collect()
    }

    fn sample() -> Vec<Catalog> {
        vec![
            with_sla(entry("user-api", CatalogType::Project), SlaLevel::High),
            with_sla(entry("auth-service", CatalogType::Project), SlaLevel::Critical),
            entry("base-image", CatalogType::Container),
            with_sla(entry("Auth-Chart", CatalogType::Chart), SlaLevel::Low),
        ]
    }

    #[test]
    fn empty_filter_sorts_by_name() {
        let catalogs = sample();
        assert_eq!(
            names(&CatalogFilter::default().apply(&catalogs)),
            vec!["Auth-Chart", "auth-service", "base-image", "user-api"]
        );
    }

    #[test]
    fn search_ignores_case() {
        let catalogs = sample();
        let filter = CatalogFilter {
            search: Some("AUTH".to_string()),
            ..CatalogFilter::default()
        };
        assert_eq!(names(&filter.apply(&catalogs)), vec!["Auth-Chart", "auth-service"]);
    }

    #[test]
    fn sla_filter_drops_entries_without_sla() {
        let catalogs = sample();
        let filter = CatalogFilter {
            sla_levels: [SlaLevel::Critical, SlaLevel::Low].into(),
            ..CatalogFilter::default()
        };
        assert_eq!(names(&filter.apply(&catalogs)), vec!["Auth-Chart", "auth-service"]);
    }

    #[test]
    fn type_and_search_combine() {
        let catalogs = sample();
        let filter = CatalogFilter {
            search: Some("auth".to_string()),
            types: [CatalogType::Project].into(),
            ..CatalogFilter::default()
        };
        assert_eq!(names(&filter.apply(&catalogs)), vec!["auth-service"]);
    }

    #[test]
    fn index_finds_owners() {
        let mut catalogs = sample();
        catalogs[1].owner = "team-identity".to_string();
        let index = CatalogIndex::new(&catalogs);
        assert!(index.get("Auth-Chart").is_some());
        assert_eq!(index.owner_of("auth-service"), Some("team-identity"));
        assert_eq!(index.owner_of("user-api"), None);
        assert!(index.get("missing").is_none());
    }
}
