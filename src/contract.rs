//! Contract import.
//!
//! Seeds a response table from an API contract: every declared
//! (path, method, status) becomes a canned response whose body is the
//! example of the response schema. OpenAPI 3 documents are read with
//! `openapiv3`; Swagger 2 documents are walked as plain JSON.

use crate::error::ContractError;
use crate::table::{PathEntry, ResponseSet, ResponseTable};
use bytes::Bytes;
use openapiv3::{
    Components, MediaType, OpenAPI, Operation, PathItem, ReferenceOr, Response, Schema,
    StatusCode,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info, warn};

const JSON_MEDIA_TYPE: &str = "application/json";

/// Contract format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ContractVersion {
    /// Swagger 2.0
    V2,
    /// OpenAPI 3.x
    #[default]
    V3,
}

/// Read a contract file (JSON or YAML) and convert it into a response table.
pub fn load_contract(
    path: &Path,
    version: ContractVersion,
) -> Result<ResponseTable, ContractError> {
    let content = std::fs::read_to_string(path).map_err(|source| ContractError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), ?version, "Loading contract");
    parse_contract(&content, version)
}

/// Parse contract text and convert it into a response table.
pub fn parse_contract(
    content: &str,
    version: ContractVersion,
) -> Result<ResponseTable, ContractError> {
    match version {
        ContractVersion::V3 => {
            let spec: OpenAPI = parse_document(content)?;
            if !spec.openapi.starts_with("3.") {
                return Err(ContractError::Invalid(format!(
                    "unsupported openapi version '{}'",
                    spec.openapi
                )));
            }
            Ok(table_from_openapi(&spec))
        }
        ContractVersion::V2 => {
            let doc: Value = parse_document(content)?;
            table_from_swagger(&doc)
        }
    }
}

fn parse_document<T: DeserializeOwned>(content: &str) -> Result<T, ContractError> {
    // Numbers nested in flattened openapiv3 types only deserialize from a `Value`
    let json = serde_json::from_str::<Value>(content).and_then(serde_json::from_value);
    match json {
        Ok(doc) => Ok(doc),
        Err(json) => {
            serde_yaml::from_str(content).map_err(|yaml| ContractError::Parse { json, yaml })
        }
    }
}

/// Convert an OpenAPI 3 document. Contracts carry no headers.
pub fn table_from_openapi(spec: &OpenAPI) -> ResponseTable {
    let components = spec.components.as_ref();
    let mut table = ResponseTable::new();

    for (path, path_ref) in &spec.paths.paths {
        let path_item = match path_ref {
            ReferenceOr::Item(item) => item,
            ReferenceOr::Reference { reference } => {
                warn!(path = %path, reference = %reference, "Skipping path $ref");
                continue;
            }
        };

        info!(path = %path, "Parsing path contract");
        let methods = operations(path_item)
            .map(|(method, operation)| {
                debug!(path = %path, method, "Parsing responses");
                (method.to_string(), operation_responses(components, operation))
            })
            .collect::<Vec<_>>();

        table.paths.insert(path.clone(), PathEntry::per_method(methods));
    }

    table
}

fn operations(item: &PathItem) -> impl Iterator<Item = (&'static str, &Operation)> {
    [
        ("get", &item.get),
        ("put", &item.put),
        ("post", &item.post),
        ("delete", &item.delete),
        ("options", &item.options),
        ("head", &item.head),
        ("patch", &item.patch),
        ("trace", &item.trace),
    ]
    .into_iter()
    .filter_map(|(method, op)| op.as_ref().map(|o| (method, o)))
}

fn operation_responses(components: Option<&Components>, operation: &Operation) -> ResponseSet {
    let mut set = ResponseSet::new();

    for (code, response_ref) in &operation.responses.responses {
        let status = match code {
            StatusCode::Code(status) => *status,
            StatusCode::Range(range) => {
                debug!(range = %format!("{}XX", range), "Skipping status code range");
                continue;
            }
        };

        let body = match resolve_response(components, response_ref) {
            Some(response) => response_body(components, response),
            None => Bytes::new(),
        };
        set.insert(status, body);
    }

    if operation.responses.default.is_some() {
        debug!("Skipping default response, it has no status code");
    }

    set
}

fn response_body(components: Option<&Components>, response: &Response) -> Bytes {
    let Some((media_type, content)) = pick_content(&response.content) else {
        return Bytes::new();
    };

    let example = content
        .schema
        .as_ref()
        .and_then(|schema_ref| resolve_schema(components, schema_ref))
        .and_then(|schema| schema.schema_data.example.as_ref());

    example_body(media_type, example)
}

/// Prefer JSON, otherwise the first declared content type.
fn pick_content<'a, I>(content: I) -> Option<(&'a str, &'a MediaType)>
where
    I: IntoIterator<Item = (&'a String, &'a MediaType)>,
{
    let mut first = None;
    for (media_type, media) in content {
        if media_type == JSON_MEDIA_TYPE {
            return Some((media_type.as_str(), media));
        }
        if first.is_none() {
            first = Some((media_type.as_str(), media));
        }
    }

    if let Some((media_type, _)) = first {
        info!(media_type, "Using response from content type");
    }
    first
}

fn resolve_response<'a>(
    components: Option<&'a Components>,
    response_ref: &'a ReferenceOr<Response>,
) -> Option<&'a Response> {
    match response_ref {
        ReferenceOr::Item(response) => Some(response),
        ReferenceOr::Reference { reference } => {
            let resolved = reference
                .strip_prefix("#/components/responses/")
                .and_then(|name| components?.responses.get(name))
                .and_then(|r| match r {
                    ReferenceOr::Item(response) => Some(response),
                    ReferenceOr::Reference { .. } => None,
                });
            if resolved.is_none() {
                warn!(reference = %reference, "Unable to resolve response $ref");
            }
            resolved
        }
    }
}

fn resolve_schema<'a>(
    components: Option<&'a Components>,
    schema_ref: &'a ReferenceOr<Schema>,
) -> Option<&'a Schema> {
    match schema_ref {
        ReferenceOr::Item(schema) => Some(schema),
        ReferenceOr::Reference { reference } => {
            let resolved = reference
                .strip_prefix("#/components/schemas/")
                .and_then(|name| components?.schemas.get(name))
                .and_then(|s| match s {
                    ReferenceOr::Item(schema) => Some(schema),
                    ReferenceOr::Reference { .. } => None,
                });
            if resolved.is_none() {
                warn!(reference = %reference, "Unable to resolve schema $ref");
            }
            resolved
        }
    }
}

/// Convert a Swagger 2 document.
pub fn table_from_swagger(doc: &Value) -> Result<ResponseTable, ContractError> {
    let version = doc.get("swagger").and_then(Value::as_str).unwrap_or_default();
    if !version.starts_with('2') {
        return Err(ContractError::Invalid(format!(
            "expected a swagger 2 document, found swagger version '{}'",
            version
        )));
    }

    let paths = match doc.get("paths") {
        Some(Value::Object(paths)) => paths,
        Some(_) => return Err(ContractError::Invalid("'paths' must be an object".to_string())),
        None => return Ok(ResponseTable::new()),
    };
    let definitions = doc.get("definitions");
    let mut table = ResponseTable::new();

    for (path, item) in paths {
        let Some(item) = item.as_object() else {
            return Err(ContractError::Invalid(format!("path {} must be an object", path)));
        };

        info!(path = %path, "Parsing path contract");
        let mut methods = BTreeMap::new();
        for method in ["get", "put", "post", "delete", "options", "head", "patch"] {
            let Some(operation) = item.get(method) else {
                continue;
            };
            debug!(path = %path, method, "Parsing responses");
            methods.insert(method.to_string(), swagger_responses(definitions, operation));
        }

        table.paths.insert(path.clone(), PathEntry::per_method(methods));
    }

    Ok(table)
}

fn swagger_responses(definitions: Option<&Value>, operation: &Value) -> ResponseSet {
    let mut set = ResponseSet::new();
    let Some(responses) = operation.get("responses").and_then(Value::as_object) else {
        return set;
    };

    for (code, response) in responses {
        let Ok(status) = code.parse::<u16>() else {
            debug!(code = %code, "Skipping non-numeric status code");
            continue;
        };
        set.insert(status, swagger_body(definitions, response));
    }

    set
}

fn swagger_body(definitions: Option<&Value>, response: &Value) -> Bytes {
    if let Some(examples) = response.get("examples").and_then(Value::as_object) {
        let picked = examples
            .get(JSON_MEDIA_TYPE)
            .map(|example| (JSON_MEDIA_TYPE, example))
            .or_else(|| examples.iter().next().map(|(k, v)| (k.as_str(), v)));
        if let Some((media_type, example)) = picked {
            if media_type != JSON_MEDIA_TYPE {
                info!(media_type = %media_type, "Using response from content type");
            }
            return example_body(media_type, Some(example));
        }
    }

    let schema = response.get("schema").map(|schema| {
        schema
            .get("$ref")
            .and_then(Value::as_str)
            .and_then(|r| r.strip_prefix("#/definitions/"))
            .and_then(|name| definitions?.get(name))
            .unwrap_or(schema)
    });
    example_body(JSON_MEDIA_TYPE, schema.and_then(|s| s.get("example")))
}

/// JSON examples are serialized; raw string examples of other media types are used verbatim.
fn example_body(media_type: &str, example: Option<&Value>) -> Bytes {
    match example {
        None => Bytes::new(),
        Some(value) if is_json(media_type) => match serde_json::to_vec(value) {
            Ok(body) => Bytes::from(body),
            Err(err) => {
                warn!(error = %err, "Unable to serialize example");
                Bytes::new()
            }
        },
        Some(Value::String(raw)) => {
            debug!(media_type, "Processing raw example");
            Bytes::from(raw.clone())
        }
        Some(_) => Bytes::new(),
    }
}

fn is_json(media_type: &str) -> bool {
    media_type == JSON_MEDIA_TYPE || media_type.ends_with("+json")
}
