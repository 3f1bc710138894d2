use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// How far a crawl may wander from its seed URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkFilter {
    /// Same host, and under the seed's parent directory
    #[default]
    SamePath,
    /// Same host, any path
    SameDomain,
    /// Anything reachable
    All,
}

impl LinkFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SamePath => "same_path",
            Self::SameDomain => "same_domain",
            Self::All => "all",
        }
    }
}

impl fmt::Display for LinkFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decides whether a candidate URL is inside the crawl's scope
///
/// The scope is computed once from the seed URL and reused for every page of
/// the crawl, so a page at depth 3 is judged against the seed's directory and
/// not against its own.
#[derive(Debug, Clone)]
pub struct ScopeFilter {
    filter: LinkFilter,
    seed_host: Option<String>,
    seed_port: Option<u16>,
    /// Seed path without its trailing slash
    seed_path: String,
    /// Seed path with its last component removed
    parent_path: String,
}

impl ScopeFilter {
    /// Builds the scope for a crawl seeded at `seed`
    ///
    /// # Examples
    ///
    /// ```
    /// use site_harvest::url::{LinkFilter, ScopeFilter};
    /// use url::Url;
    ///
    /// let seed = Url::parse("https://example.com/a/b/c").unwrap();
    /// let scope = ScopeFilter::new(&seed, LinkFilter::SamePath);
    /// assert!(scope.should_follow(&Url::parse("https://example.com/a/b/d").unwrap()));
    /// assert!(!scope.should_follow(&Url::parse("https://example.com/a/x").unwrap()));
    /// ```
    pub fn new(seed: &Url, filter: LinkFilter) -> Self {
        let seed_path = seed.path().trim_end_matches('/').to_string();
        let parent_path = match seed_path.rfind('/') {
            Some(idx) => seed_path[..idx].to_string(),
            None => String::new(),
        };

        Self {
            filter,
            seed_host: seed.host_str().map(str::to_lowercase),
            seed_port: seed.port_or_known_default(),
            seed_path,
            parent_path,
        }
    }

    /// The filter mode this scope applies
    pub fn filter(&self) -> LinkFilter {
        self.filter
    }

    /// The directory `same_path` candidates must live under
    pub fn parent_path(&self) -> &str {
        &self.parent_path
    }

    /// Returns true if `url` is admissible under the configured filter
    pub fn should_follow(&self, url: &Url) -> bool {
        match self.filter {
            LinkFilter::All => true,
            LinkFilter::SameDomain => self.same_host(url),
            LinkFilter::SamePath => self.same_host(url) && self.under_parent(url),
        }
    }

    fn same_host(&self, url: &Url) -> bool {
        let host = url.host_str().map(str::to_lowercase);
        host.is_some() && host == self.seed_host && url.port_or_known_default() == self.seed_port
    }

    fn under_parent(&self, url: &Url) -> bool {
        let path = url.path().trim_end_matches('/');

        if path == self.seed_path || self.parent_path.is_empty() {
            return true;
        }

        path == self.parent_path
            || path
                .strip_prefix(self.parent_path.as_str())
                .is_some_and(|rest| rest.starts_with('/'))
    }
}
