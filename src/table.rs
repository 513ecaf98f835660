//! In-memory response table.
//!
//! Normalized model of every canned response the mock server can emit,
//! keyed by path, then (optionally) by method, then by status code.

use bytes::Bytes;
use std::collections::BTreeMap;

/// Header name to value mapping.
pub type Headers = BTreeMap<String, String>;

/// Status code to raw response body.
///
/// Ordered so that "pick any entry" fallbacks are deterministic (lowest code first).
pub type ResponseSet = BTreeMap<u16, Bytes>;

/// Responses of a single path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Responses {
    /// One response set shared by every HTTP method
    Common(ResponseSet),
    /// Response sets keyed by lowercase HTTP method name
    PerMethod(BTreeMap<String, ResponseSet>),
}

impl Default for Responses {
    fn default() -> Self {
        Responses::Common(ResponseSet::new())
    }
}

/// Configuration of a single registered path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathEntry {
    /// Headers applied to every response of this path
    pub headers: Headers,
    /// Canned responses
    pub responses: Responses,
}

impl PathEntry {
    /// Create a common-mode entry.
    pub fn common(responses: ResponseSet) -> Self {
        Self {
            headers: Headers::new(),
            responses: Responses::Common(responses),
        }
    }

    /// Create a per-method entry. Method names are lowercased.
    pub fn per_method(methods: impl IntoIterator<Item = (String, ResponseSet)>) -> Self {
        let methods = methods
            .into_iter()
            .map(|(method, set)| (method.to_lowercase(), set))
            .collect();
        Self {
            headers: Headers::new(),
            responses: Responses::PerMethod(methods),
        }
    }

    /// Attach path-level headers.
    pub fn with_headers(mut self, headers: Headers) -> Self {
        self.headers = headers;
        self
    }

    pub fn has_per_method_responses(&self) -> bool {
        matches!(self.responses, Responses::PerMethod(_))
    }

    /// Response set applicable to `method` (lowercase).
    ///
    /// Returns `None` when the path is per-method and `method` is not configured.
    pub fn responses_for(&self, method: &str) -> Option<&ResponseSet> {
        match &self.responses {
            Responses::Common(set) => Some(set),
            Responses::PerMethod(methods) => methods.get(method),
        }
    }

    /// Total number of stored responses across all methods.
    pub fn response_count(&self) -> usize {
        match &self.responses {
            Responses::Common(set) => set.len(),
            Responses::PerMethod(methods) => methods.values().map(BTreeMap::len).sum(),
        }
    }
}

/// Complete set of canned responses served by one mock server.
///
/// Built once at startup and read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseTable {
    /// Headers applied to every path unless overridden per path
    pub headers: Headers,
    /// Entries keyed by exact request path
    pub paths: BTreeMap<String, PathEntry>,
}

impl ResponseTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a path entry.
    pub fn with_path(mut self, path: impl Into<String>, entry: PathEntry) -> Self {
        self.paths.insert(path.into(), entry);
        self
    }

    /// Add a table-level header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, path: &str) -> Option<&PathEntry> {
        self.paths.get(path)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}
