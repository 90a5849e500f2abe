//! Domain filter restricting which registrar zones are managed

use serde::{Deserialize, Serialize};

/// A list of domain suffixes
///
/// An empty filter matches every zone. Otherwise a zone matches when it equals
/// an entry, lies below one, or is the parent of one (so the filter
/// `www.example.com` still admits the zone `example.com` that owns it).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct DomainFilter {
    domains: Vec<String>,
}

impl DomainFilter {
    /// Create a filter from domain entries
    ///
    /// Entries are lower-cased, trailing dots removed and empty entries dropped.
    pub fn new<I, S>(domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let domains = domains
            .into_iter()
            .map(|d| normalize(d.as_ref()))
            .filter(|d| !d.is_empty())
            .collect();
        Self { domains }
    }

    /// Parse a comma-separated list
    pub fn parse(list: &str) -> Self {
        Self::new(list.split(','))
    }

    /// The normalized entries
    pub fn domains(&self) -> &[String] {
        &self.domains
    }

    /// True when the filter has no entries
    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }

    /// Check whether `zone` is managed under this filter
    pub fn matches(&self, zone: &str) -> bool {
        if self.domains.is_empty() {
            return true;
        }
        let zone = normalize(zone);
        self.domains
            .iter()
            .any(|domain| is_same_or_below(&zone, domain) || is_same_or_below(domain, &zone))
    }
}

impl From<Vec<String>> for DomainFilter {
    fn from(domains: Vec<String>) -> Self {
        Self::new(domains)
    }
}

impl From<DomainFilter> for Vec<String> {
    fn from(filter: DomainFilter) -> Self {
        filter.domains
    }
}

fn normalize(domain: &str) -> String {
    domain.trim().trim_end_matches('.').to_ascii_lowercase()
}

fn is_same_or_below(name: &str, domain: &str) -> bool {
    name == domain
        || name
            .strip_suffix(domain)
            .is_some_and(|rest| rest.ends_with('.'))
}
