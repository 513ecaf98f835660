//! Merging of response tables.
//!
//! Used to layer a user config on top of contract-derived defaults. The
//! override wins on every leaf key; nothing is invented.

use crate::table::{PathEntry, ResponseSet, ResponseTable, Responses};
use tracing::{debug, warn};

impl ResponseTable {
    /// Merge `overrides` into this table and return the result.
    pub fn merge(mut self, overrides: ResponseTable) -> ResponseTable {
        self.headers.extend(overrides.headers);

        for (path, entry) in overrides.paths {
            match self.paths.remove(&path) {
                Some(base) => {
                    debug!(path = %path, "Merging path override");
                    let merged = merge_entry(&path, base, entry);
                    self.paths.insert(path, merged);
                }
                None => {
                    debug!(path = %path, "Adding path from override");
                    self.paths.insert(path, entry);
                }
            }
        }

        self
    }
}

fn merge_entry(path: &str, mut base: PathEntry, overrides: PathEntry) -> PathEntry {
    base.headers.extend(overrides.headers);

    base.responses = match (base.responses, overrides.responses) {
        (Responses::Common(mut base_set), Responses::Common(set)) => {
            merge_set(&mut base_set, set);
            Responses::Common(base_set)
        }
        (Responses::PerMethod(mut base_methods), Responses::PerMethod(methods)) => {
            for (method, set) in methods {
                merge_set(base_methods.entry(method).or_default(), set);
            }
            Responses::PerMethod(base_methods)
        }
        (_, replacement) => {
            warn!(
                path = %path,
                per_method = matches!(replacement, Responses::PerMethod(_)),
                "Override changes response mode of path, replacing base responses"
            );
            replacement
        }
    };

    base
}

fn merge_set(base: &mut ResponseSet, overrides: ResponseSet) {
    base.extend(overrides);
}
