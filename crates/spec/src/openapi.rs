//! OpenAPI 3.1 document model, restricted to what the generator emits and
//! reloads. Maps are ordered so serialized output is deterministic.

use crate::counters::{Counter, CounterMap};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

pub const OPENAPI_VERSION: &str = "3.1.0";
pub const INITIAL_INFO_VERSION: &str = "0.0";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenApi {
    pub openapi: String,

    pub info: Info,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub servers: Vec<Server>,

    #[serde(default)]
    pub paths: BTreeMap<String, PathItem>,

    #[serde(
        rename = "x-counters-total",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub counters_total: Option<Counter>,

    #[serde(
        rename = "x-counters-per-source",
        default,
        skip_serializing_if = "CounterMap::is_empty"
    )]
    pub counters_per_source: CounterMap,
}

impl OpenApi {
    /// Empty document describing the service reachable at `server_url`.
    pub fn skeleton(server_url: &str) -> Self {
        Self {
            openapi: OPENAPI_VERSION.to_string(),
            info: Info {
                title: server_url.to_string(),
                version: INITIAL_INFO_VERSION.to_string(),
                description: None,
            },
            servers: vec![Server {
                url: server_url.to_string(),
                description: None,
            }],
            paths: BTreeMap::new(),
            counters_total: None,
            counters_per_source: CounterMap::default(),
        }
    }

    /// Every operation in the document with its path and method.
    pub fn operations(&self) -> impl Iterator<Item = (&str, Method, &Operation)> {
        self.paths.iter().flat_map(|(path, item)| {
            item.operations()
                .map(move |(method, op)| (path.as_str(), method, op))
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Info {
    pub title: String,

    pub version: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Server {
    pub url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Method {
    Get,
    Put,
    Post,
    Delete,
    Options,
    Head,
    Patch,
    Trace,
}

impl Method {
    pub const ALL: [Method; 8] = [
        Method::Get,
        Method::Put,
        Method::Post,
        Method::Delete,
        Method::Options,
        Method::Head,
        Method::Patch,
        Method::Trace,
    ];

    /// Case-insensitive; `None` for methods OpenAPI has no slot for.
    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|method| method.as_str().eq_ignore_ascii_case(raw.trim()))
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "get",
            Method::Put => "put",
            Method::Post => "post",
            Method::Delete => "delete",
            Method::Options => "options",
            Method::Head => "head",
            Method::Patch => "patch",
            Method::Trace => "trace",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub get: Option<Operation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub put: Option<Operation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post: Option<Operation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete: Option<Operation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Operation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head: Option<Operation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patch: Option<Operation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<Operation>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,
}

impl PathItem {
    pub fn operation(&self, method: Method) -> Option<&Operation> {
        match method {
            Method::Get => self.get.as_ref(),
            Method::Put => self.put.as_ref(),
            Method::Post => self.post.as_ref(),
            Method::Delete => self.delete.as_ref(),
            Method::Options => self.options.as_ref(),
            Method::Head => self.head.as_ref(),
            Method::Patch => self.patch.as_ref(),
            Method::Trace => self.trace.as_ref(),
        }
    }

    pub fn slot_mut(&mut self, method: Method) -> &mut Option<Operation> {
        match method {
            Method::Get => &mut self.get,
            Method::Put => &mut self.put,
            Method::Post => &mut self.post,
            Method::Delete => &mut self.delete,
            Method::Options => &mut self.options,
            Method::Head => &mut self.head,
            Method::Patch => &mut self.patch,
            Method::Trace => &mut self.trace,
        }
    }

    pub fn operations(&self) -> impl Iterator<Item = (Method, &Operation)> {
        [
            (Method::Get, &self.get),
            (Method::Put, &self.put),
            (Method::Post, &self.post),
            (Method::Delete, &self.delete),
            (Method::Options, &self.options),
            (Method::Head, &self.head),
            (Method::Patch, &self.patch),
            (Method::Trace, &self.trace),
        ]
        .into_iter()
        .filter_map(|(method, op)| op.as_ref().map(|op| (method, op)))
    }

    pub fn operations_mut(&mut self) -> impl Iterator<Item = (Method, &mut Operation)> {
        [
            (Method::Get, &mut self.get),
            (Method::Put, &mut self.put),
            (Method::Post, &mut self.post),
            (Method::Delete, &mut self.delete),
            (Method::Options, &mut self.options),
            (Method::Head, &mut self.head),
            (Method::Patch, &mut self.patch),
            (Method::Trace, &mut self.trace),
        ]
        .into_iter()
        .filter_map(|(method, op)| op.as_mut().map(|op| (method, op)))
    }

    /// Methods present, in declaration order.
    pub fn methods(&self) -> Vec<Method> {
        self.operations().map(|(method, _)| method).collect()
    }

    pub fn has_operations(&self) -> bool {
        self.operations().next().is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    #[serde(rename = "operationId")]
    pub operation_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,

    #[serde(
        rename = "requestBody",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub request_body: Option<RequestBody>,

    #[serde(default)]
    pub responses: BTreeMap<String, Response>,

    #[serde(rename = "x-counters-total", default)]
    pub counters_total: Counter,

    #[serde(rename = "x-counters-per-source", default)]
    pub counters_per_source: CounterMap,

    /// Unix seconds of the latest observation; drives inter-arrival gaps
    #[serde(rename = "x-last-seen-ts", default)]
    pub last_seen_ts: f64,

    /// Ids of operations folded into this one
    #[serde(
        rename = "x-historical-ids",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub historical_ids: Vec<String>,

    #[serde(
        rename = "x-sample-entry",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub sample_entry: Option<String>,
}

impl Operation {
    pub fn new(operation_id: impl Into<String>) -> Self {
        Self {
            operation_id: operation_id.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    Query,
    Header,
    Path,
    Cookie,
}

impl ParameterLocation {
    /// Serialization style OpenAPI assumes when none is given.
    pub fn default_style(self) -> &'static str {
        match self {
            Self::Query | Self::Cookie => "form",
            Self::Header | Self::Path => "simple",
        }
    }
}

/// `exampleName -> Example`
pub type Examples = BTreeMap<String, Example>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,

    #[serde(rename = "in")]
    pub location: ParameterLocation,

    #[serde(default)]
    pub required: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Schema>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub examples: Examples,
}

impl Parameter {
    pub fn new(name: impl Into<String>, location: ParameterLocation, required: bool) -> Self {
        Self {
            name: name.into(),
            location,
            required,
            style: Some(location.default_style().to_string()),
            schema: Some(Schema::of(SchemaType::String)),
            examples: Examples::new(),
        }
    }

    /// Path parameters are always required.
    pub fn path(name: impl Into<String>) -> Self {
        Self::new(name, ParameterLocation::Path, true)
    }

    /// Header names compare case-insensitively, everything else exactly.
    pub fn matches(&self, location: ParameterLocation, name: &str) -> bool {
        self.location == location
            && match location {
                ParameterLocation::Header => self.name.eq_ignore_ascii_case(name),
                _ => self.name == name,
            }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Example {
    pub value: Value,

    #[serde(
        rename = "x-sample-entry",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub sample_entry: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Header {
    #[serde(default)]
    pub required: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Schema>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub examples: Examples,
}

impl Header {
    pub fn new(required: bool) -> Self {
        Self {
            required,
            style: Some(ParameterLocation::Header.default_style().to_string()),
            schema: Some(Schema::of(SchemaType::String)),
            examples: Examples::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub description: String,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, Header>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub content: BTreeMap<String, MediaType>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub required: bool,

    #[serde(default)]
    pub content: BTreeMap<String, MediaType>,
}

impl RequestBody {
    pub fn generic() -> Self {
        Self {
            description: Some("Generic request body".to_string()),
            required: true,
            content: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaType {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Schema>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,

    #[serde(
        rename = "x-sample-entry",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub sample_entry: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaType {
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
    Null,
}

impl SchemaType {
    pub fn of_value(value: &Value) -> Self {
        match value {
            Value::Null => SchemaType::Null,
            Value::Bool(_) => SchemaType::Boolean,
            Value::Number(n) if n.is_i64() || n.is_u64() => SchemaType::Integer,
            Value::Number(_) => SchemaType::Number,
            Value::String(_) => SchemaType::String,
            Value::Array(_) => SchemaType::Array,
            Value::Object(_) => SchemaType::Object,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<SchemaType>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, Schema>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<Value>,
}

impl Schema {
    pub fn of(schema_type: SchemaType) -> Self {
        Self {
            schema_type: Some(schema_type),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn parameter_style_follows_location() {
        let query = Parameter::new("page", ParameterLocation::Query, false);
        assert_eq!(query.style.as_deref(), Some("form"));
        let header = Parameter::new("X-Mode", ParameterLocation::Header, true);
        assert_eq!(header.style.as_deref(), Some("simple"));
        assert_eq!(Parameter::path("p1").style.as_deref(), Some("simple"));
    }

    #[test]
    fn method_parse_is_case_insensitive() {
        assert_eq!(Method::parse("GET"), Some(Method::Get));
        assert_eq!(Method::parse("patch"), Some(Method::Patch));
        assert_eq!(Method::parse("CONNECT"), None);
        assert_eq!(Method::parse(""), None);
    }

    #[test]
    fn operation_uses_extension_field_names() {
        let mut op = Operation::new("abc");
        op.last_seen_ts = 5.0;
        op.historical_ids.push("old".to_string());
        let value = serde_json::to_value(&op).unwrap();

        assert_eq!(value["operationId"], "abc");
        assert_eq!(value["x-last-seen-ts"], 5.0);
        assert_eq!(value["x-historical-ids"], json!(["old"]));
        assert_eq!(value["x-counters-total"]["entries"], 0);
        assert!(value.get("requestBody").is_none());
    }

    #[test]
    fn path_item_lists_operations_in_method_order() {
        let mut item = PathItem::default();
        *item.slot_mut(Method::Post) = Some(Operation::new("b"));
        *item.slot_mut(Method::Get) = Some(Operation::new("a"));

        assert_eq!(item.methods(), vec![Method::Get, Method::Post]);
        assert!(item.has_operations());
        assert!(!PathItem::default().has_operations());
    }

    #[test]
    fn parameter_location_serializes_as_in() {
        let param = Parameter::path("p1");
        let value = serde_json::to_value(&param).unwrap();
        assert_eq!(value["in"], "path");
        assert_eq!(value["required"], true);
        assert_eq!(value["schema"]["type"], "string");
    }

    #[test]
    fn header_parameters_match_case_insensitively() {
        let param = Parameter::new("x-request-id", ParameterLocation::Header, true);
        assert!(param.matches(ParameterLocation::Header, "X-Request-Id"));
        assert!(!param.matches(ParameterLocation::Query, "x-request-id"));
    }
}
