//! On-disk mock configuration.
//!
//! Defines the JSON file shape and converts it to and from a [`ResponseTable`].
//! A path either lists its `responses` directly (shared by all methods) or
//! lists one block per method, each with its own `responses`.

use crate::error::ConfigError;
use crate::table::{Headers, PathEntry, ResponseSet, ResponseTable, Responses};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info, warn};

/// Status code (as a string key) to JSON body, as written in the file.
pub type RawResponses = BTreeMap<String, serde_json::Value>;

/// Top-level mock config file.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct MockConfig {
    /// Headers sent on every response
    #[serde(default)]
    pub headers: Headers,

    /// Path definitions keyed by exact request path
    #[serde(default)]
    pub paths: BTreeMap<String, PathConfig>,
}

/// A single path block.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct PathConfig {
    /// Headers sent on every response of this path
    #[serde(default, skip_serializing_if = "Headers::is_empty")]
    pub headers: Headers,

    /// Responses shared by every method
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub responses: Option<RawResponses>,

    /// Any other key is an HTTP method block
    #[serde(flatten)]
    pub methods: BTreeMap<String, MethodConfig>,
}

/// Responses of one method of a path.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct MethodConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub responses: Option<RawResponses>,
}

impl MockConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_slice(&content)?;
        info!(path = %path.display(), paths = config.paths.len(), "Config file read");
        Ok(config)
    }

    /// Parse configuration from JSON bytes.
    pub fn from_slice(content: &[u8]) -> Result<Self, ConfigError> {
        serde_json::from_slice(content).map_err(ConfigError::Parse)
    }

    /// Convert into the in-memory response table.
    pub fn into_table(self) -> Result<ResponseTable, ConfigError> {
        let mut paths = BTreeMap::new();
        for (path, path_config) in self.paths {
            let entry = path_config.into_entry(&path)?;
            paths.insert(path, entry);
        }

        Ok(ResponseTable {
            headers: self.headers,
            paths,
        })
    }

    /// Build the on-disk shape of a response table.
    ///
    /// Empty bodies are written as `null`.
    pub fn from_table(table: &ResponseTable) -> Self {
        let paths = table
            .paths
            .iter()
            .map(|(path, entry)| (path.clone(), PathConfig::from_entry(entry)))
            .collect();

        Self {
            headers: table.headers.clone(),
            paths,
        }
    }

    /// Serialize as tab-indented JSON.
    pub fn to_json(&self) -> Result<Vec<u8>, ConfigError> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"\t");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut serializer)
            .map_err(ConfigError::Serialize)?;
        Ok(buf)
    }

    /// Write the config to `path`, replacing any existing file.
    pub fn write_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let content = self.to_json()?;
        let write_err = |source: std::io::Error| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };

        let mut options = std::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o644);
        }

        let mut file = options.open(path).map_err(write_err)?;
        file.write_all(&content).map_err(write_err)?;
        info!(path = %path.display(), paths = self.paths.len(), "Config exported");
        Ok(())
    }
}

/// Read a config file and convert it into a response table.
pub fn load_table(path: &Path) -> Result<ResponseTable, ConfigError> {
    MockConfig::from_file(path)?.into_table()
}

impl PathConfig {
    fn into_entry(self, path: &str) -> Result<PathEntry, ConfigError> {
        let responses = match self.responses {
            Some(raw) => {
                if !self.methods.is_empty() {
                    warn!(
                        path = %path,
                        methods = ?self.methods.keys().collect::<Vec<_>>(),
                        "Path has common responses, ignoring method blocks"
                    );
                }
                debug!(path = %path, "Loading common responses");
                Responses::Common(parse_responses(path, raw)?)
            }
            None => {
                let mut methods = BTreeMap::new();
                for (method, method_config) in self.methods {
                    let raw = method_config.responses.ok_or_else(|| {
                        ConfigError::MissingResponses {
                            path: path.to_string(),
                            method: method.clone(),
                        }
                    })?;
                    debug!(path = %path, method = %method, "Loading method responses");
                    let key = method.to_lowercase();
                    if methods.contains_key(&key) {
                        return Err(ConfigError::DuplicateMethod {
                            path: path.to_string(),
                            method,
                        });
                    }
                    methods.insert(key, parse_responses(path, raw)?);
                }
                Responses::PerMethod(methods)
            }
        };

        Ok(PathEntry {
            headers: self.headers,
            responses,
        })
    }

    fn from_entry(entry: &PathEntry) -> Self {
        let (responses, methods) = match &entry.responses {
            Responses::Common(set) => (Some(export_responses(set)), BTreeMap::new()),
            Responses::PerMethod(methods) => (
                None,
                methods
                    .iter()
                    .map(|(method, set)| {
                        (
                            method.clone(),
                            MethodConfig {
                                responses: Some(export_responses(set)),
                            },
                        )
                    })
                    .collect(),
            ),
        };

        Self {
            headers: entry.headers.clone(),
            responses,
            methods,
        }
    }
}

fn parse_responses(path: &str, raw: RawResponses) -> Result<ResponseSet, ConfigError> {
    let mut set = ResponseSet::new();
    for (code, value) in raw {
        let status = parse_status(&code).ok_or_else(|| ConfigError::InvalidStatus {
            path: path.to_string(),
            code: code.clone(),
        })?;
        if set.insert(status, body_from_value(&value)?).is_some() {
            return Err(ConfigError::DuplicateStatus {
                path: path.to_string(),
                status,
            });
        }
    }
    Ok(set)
}

fn parse_status(code: &str) -> Option<u16> {
    code.trim()
        .parse::<u16>()
        .ok()
        .filter(|status| (100..=599).contains(status))
}

/// `null` is the "no body" marker.
fn body_from_value(value: &serde_json::Value) -> Result<Bytes, ConfigError> {
    if value.is_null() {
        return Ok(Bytes::new());
    }
    serde_json::to_vec(value)
        .map(Bytes::from)
        .map_err(ConfigError::Serialize)
}

fn export_responses(set: &ResponseSet) -> RawResponses {
    set.iter()
        .map(|(status, body)| (status.to_string(), body_to_value(body)))
        .collect()
}

/// Bodies that are not JSON (raw contract examples) are exported as JSON strings.
///
/// The file format cannot tell a raw body from a JSON string, so such a body
/// re-imports as the quoted string and is then served as JSON.
fn body_to_value(body: &Bytes) -> serde_json::Value {
    if body.is_empty() {
        return serde_json::Value::Null;
    }
    serde_json::from_slice(body).unwrap_or_else(|_| {
        let text = String::from_utf8_lossy(body).into_owned();
        warn!(body = %text, "Exporting non-JSON body as a JSON string");
        serde_json::Value::String(text)
    })
}
