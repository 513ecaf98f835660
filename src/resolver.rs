//! Response resolution.
//!
//! Picks the status code and body for a request against one path entry,
//! and computes the header set of a path. Resolution is total: missing
//! data degrades to an empty-bodied default, never to an error.

use crate::table::{Headers, PathEntry, ResponseSet};
use bytes::Bytes;

/// Status used when a response set is empty.
pub const DEFAULT_STATUS: u16 = 200;

/// How a resolution was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionKind {
    /// The requested status code exists in the response set
    Exact,
    /// Fallback to the 200 entry, or the lowest status code present
    Default,
    /// The response set is empty
    Empty,
}

/// Outcome of resolving a request against a path entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub status: u16,
    pub body: Bytes,
    pub kind: ResolutionKind,
}

impl Resolution {
    /// Status to put on the wire.
    ///
    /// A client-requested status is honored even when it fell back to the
    /// default body; the resolved status only applies without a preference.
    pub fn wire_status(&self, requested: Option<u16>) -> u16 {
        requested.unwrap_or(self.status)
    }

    pub fn is_fallback(&self) -> bool {
        self.kind != ResolutionKind::Exact
    }
}

/// Resolve `method` (lowercase) and an optional requested status against `entry`.
pub fn resolve(entry: &PathEntry, method: &str, requested: Option<u16>) -> Resolution {
    match entry.responses_for(method) {
        Some(set) => resolve_in(set, requested),
        None => resolve_in(&ResponseSet::new(), requested),
    }
}

/// Resolve against a single response set.
pub fn resolve_in(set: &ResponseSet, requested: Option<u16>) -> Resolution {
    if let Some((status, body)) = requested.and_then(|code| set.get_key_value(&code)) {
        return Resolution {
            status: *status,
            body: body.clone(),
            kind: ResolutionKind::Exact,
        };
    }

    default_response(set)
}

/// Default response of a set: 200 if present, otherwise the lowest status code.
pub fn default_response(set: &ResponseSet) -> Resolution {
    let picked = set
        .get_key_value(&DEFAULT_STATUS)
        .or_else(|| set.iter().next());

    match picked {
        Some((status, body)) => Resolution {
            status: *status,
            body: body.clone(),
            kind: ResolutionKind::Default,
        },
        None => Resolution {
            status: DEFAULT_STATUS,
            body: Bytes::new(),
            kind: ResolutionKind::Empty,
        },
    }
}

/// Merge table-level and path-level headers; path headers win.
pub fn resolve_headers(common: &Headers, path: &Headers) -> Headers {
    let mut merged = common.clone();
    merged.extend(path.iter().map(|(k, v)| (k.clone(), v.clone())));
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(entries: &[(u16, &str)]) -> ResponseSet {
        entries
            .iter()
            .map(|(code, body)| (*code, Bytes::from(body.to_string())))
            .collect()
    }

    #[test]
    fn test_exact_match_wins() {
        let entry = PathEntry::common(set(&[(200, "ok"), (404, "missing"), (500, "boom")]));

        let res = resolve(&entry, "get", Some(404));
        assert_eq!(res.status, 404);
        assert_eq!(res.body, "missing");
        assert_eq!(res.kind, ResolutionKind::Exact);
        assert!(!res.is_fallback());
    }

    #[test]
    fn test_default_prefers_200() {
        let entry = PathEntry::common(set(&[(201, "created"), (200, "ok"), (500, "boom")]));

        let res = resolve(&entry, "get", None);
        assert_eq!((res.status, res.body.as_ref()), (200, b"ok".as_ref()));

        let res = resolve(&entry, "get", Some(418));
        assert_eq!((res.status, res.body.as_ref()), (200, b"ok".as_ref()));
        assert_eq!(res.kind, ResolutionKind::Default);
    }

    #[test]
    fn test_default_without_200() {
        let entry = PathEntry::common(set(&[(404, "b")]));

        let res = resolve(&entry, "get", Some(500));
        assert_eq!((res.status, res.body.as_ref()), (404, b"b".as_ref()));

        let res = resolve(&entry, "get", None);
        assert_eq!(res.status, 404);
    }

    #[test]
    fn test_default_picks_lowest_non_200() {
        let entry = PathEntry::common(set(&[(503, "c"), (404, "a"), (422, "b")]));
        let res = resolve(&entry, "get", None);
        assert_eq!(res.status, 404);
    }

    #[test]
    fn test_empty_set() {
        let entry = PathEntry::common(ResponseSet::new());
        for requested in [None, Some(200), Some(404)] {
            let res = resolve(&entry, "get", requested);
            assert_eq!(res.status, DEFAULT_STATUS);
            assert!(res.body.is_empty());
            assert_eq!(res.kind, ResolutionKind::Empty);
        }
    }

    #[test]
    fn test_per_method_isolation() {
        let entry = PathEntry::per_method([
            ("get".to_string(), set(&[(200, "G")])),
            ("post".to_string(), set(&[(201, "P")])),
        ]);

        let res = resolve(&entry, "post", None);
        assert_eq!((res.status, res.body.as_ref()), (201, b"P".as_ref()));

        let res = resolve(&entry, "post", Some(200));
        assert_eq!((res.status, res.body.as_ref()), (201, b"P".as_ref()));

        let res = resolve(&entry, "get", None);
        assert_eq!((res.status, res.body.as_ref()), (200, b"G".as_ref()));
    }

    #[test]
    fn test_unconfigured_method_is_empty() {
        let entry = PathEntry::per_method([("get".to_string(), set(&[(200, "G")]))]);
        let res = resolve(&entry, "delete", None);
        assert_eq!(res.status, DEFAULT_STATUS);
        assert!(res.body.is_empty());
    }

    #[test]
    fn test_wire_status() {
        let entry = PathEntry::common(set(&[(404, "b")]));

        let res = resolve(&entry, "get", None);
        assert_eq!(res.wire_status(None), 404);

        let res = resolve(&entry, "get", Some(503));
        assert_eq!(res.wire_status(Some(503)), 503);
        assert_eq!(res.body, "b");
    }

    #[test]
    fn test_header_precedence() {
        let common = Headers::from([("A".to_string(), "x".to_string())]);
        let path = Headers::from([
            ("A".to_string(), "y".to_string()),
            ("B".to_string(), "z".to_string()),
        ]);

        let merged = resolve_headers(&common, &path);
        assert_eq!(merged, path);

        let merged = resolve_headers(&common, &Headers::new());
        assert_eq!(merged, common);
    }
}
