//! Request/response body inference: media types, form fields and
//! top-level JSON object shapes.

use crate::examples::{bounded_text, push_schema_example, Bounds};
use crate::openapi::{MediaType, Schema, SchemaType};
use crate::{Result, SpecError};
use log::{debug, warn};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

pub const ANY_MEDIA_TYPE: &str = "*/*";
const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";
const MULTIPART_FORM: &str = "multipart/form-data";

/// Parsed `Content-Type`: lowercase essence plus lowercase-keyed parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentType {
    pub essence: String,
    pub params: BTreeMap<String, String>,
}

impl ContentType {
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        let (essence, rest) = raw.split_once(';').unwrap_or((raw, ""));
        let essence = essence.trim().to_ascii_lowercase();

        let valid = essence
            .split_once('/')
            .is_some_and(|(kind, sub)| is_token(kind) && is_token(sub));
        if !valid {
            return Err(SpecError::InvalidMediaType(raw.to_string()));
        }

        Ok(Self {
            essence,
            params: parse_params(rest),
        })
    }

    /// Like [`ContentType::parse`], but absent or malformed values yield an
    /// empty essence.
    pub fn lenient(raw: &str) -> Self {
        if raw.trim().is_empty() {
            return Self::default();
        }
        Self::parse(raw).unwrap_or_else(|err| {
            debug!("{err}");
            Self::default()
        })
    }

    /// Key under `content`: the essence, or `*/*` when unknown.
    pub fn content_key(&self) -> &str {
        if self.essence.is_empty() {
            ANY_MEDIA_TYPE
        } else {
            &self.essence
        }
    }
}

fn is_token(s: &str) -> bool {
    !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || "!#$&-^_.+*".contains(c))
}

/// `; key=value; key="quoted value"` pairs. Malformed pairs are skipped.
fn parse_params(rest: &str) -> BTreeMap<String, String> {
    let mut params = BTreeMap::new();
    for pair in rest.split(';') {
        let Some((key, value)) = pair.split_once('=') else {
            continue;
        };
        let key = key.trim().to_ascii_lowercase();
        if key.is_empty() {
            continue;
        }
        let value = value.trim();
        let value = value
            .strip_prefix('"')
            .and_then(|v| v.strip_suffix('"'))
            .unwrap_or(value);
        params.insert(key, value.to_string());
    }
    params
}

/// One named form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormField {
    pub name: String,
    pub value: String,
}

impl FormField {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

pub fn parse_urlencoded(body: &[u8]) -> Vec<FormField> {
    url::form_urlencoded::parse(body)
        .map(|(name, value)| FormField::new(name, value))
        .collect()
}

/// Splits a `multipart/form-data` body into its named parts. Parts without
/// a `name` in their `Content-Disposition` are skipped.
pub fn parse_multipart(body: &str, boundary: &str) -> Result<Vec<FormField>> {
    if boundary.is_empty() {
        return Err(SpecError::Multipart("missing boundary".to_string()));
    }

    let delimiter = format!("--{boundary}");
    let mut sections = body.split(delimiter.as_str());
    // Preamble before the first delimiter.
    sections.next();

    let mut fields = Vec::new();
    let mut closed = false;

    for section in sections {
        if section.starts_with("--") {
            closed = true;
            break;
        }
        let section = strip_line_break_prefix(section);
        let (head, content) = split_part(section).ok_or_else(|| {
            SpecError::Multipart("part without header separator".to_string())
        })?;

        let name = head
            .lines()
            .filter_map(|line| line.split_once(':'))
            .find(|(key, _)| key.trim().eq_ignore_ascii_case("content-disposition"))
            .and_then(|(_, value)| parse_params(value).remove("name"));

        match name {
            Some(name) => fields.push(FormField::new(name, strip_line_break_suffix(content))),
            None => debug!("Skipping multipart part without a name"),
        }
    }

    if !closed {
        return Err(SpecError::Multipart("unterminated body".to_string()));
    }
    Ok(fields)
}

fn split_part(section: &str) -> Option<(&str, &str)> {
    if let Some(at) = section.find("\r\n\r\n") {
        return Some((&section[..at], &section[at + 4..]));
    }
    section
        .find("\n\n")
        .map(|at| (&section[..at], &section[at + 2..]))
}

fn strip_line_break_prefix(s: &str) -> &str {
    s.strip_prefix("\r\n")
        .or_else(|| s.strip_prefix('\n'))
        .unwrap_or(s)
}

fn strip_line_break_suffix(s: &str) -> &str {
    s.strip_suffix("\r\n")
        .or_else(|| s.strip_suffix('\n'))
        .unwrap_or(s)
}

/// Body of one observed sample.
#[derive(Debug, Clone, Copy)]
pub struct Payload<'a> {
    pub content_type: &'a ContentType,
    pub body: &'a [u8],
    /// Pre-parsed form fields from the capture, used when `body` is empty
    pub fields: &'a [FormField],
}

impl Payload<'_> {
    pub fn is_empty(&self) -> bool {
        self.body.is_empty() && self.fields.is_empty()
    }
}

/// Records one sample body on `media`: the first sample becomes the
/// example, forms and JSON objects refine the schema.
pub fn observe_payload(media: &mut MediaType, payload: Payload<'_>, bounds: Bounds<'_>) {
    if payload.is_empty() {
        return;
    }
    let Ok(text) = std::str::from_utf8(payload.body) else {
        debug!("Skipping example for binary body");
        return;
    };

    match payload.content_type.essence.as_str() {
        FORM_URLENCODED => {
            let fields = if text.is_empty() {
                payload.fields.to_vec()
            } else {
                set_example_once(media, || Value::String(text.to_string()), bounds);
                parse_urlencoded(payload.body)
            };
            observe_form(&mut media.schema, &fields, bounds);
        }
        MULTIPART_FORM => {
            let fields = if text.is_empty() {
                payload.fields.to_vec()
            } else {
                let boundary = payload
                    .content_type
                    .params
                    .get("boundary")
                    .map(String::as_str)
                    .unwrap_or_default();
                match parse_multipart(text, boundary) {
                    Ok(fields) => fields,
                    Err(err) => {
                        warn!("Dropping multipart sample: {err}");
                        return;
                    }
                }
            };
            if !text.is_empty() {
                set_example_once(media, || Value::String(text.to_string()), bounds);
            }
            observe_form(&mut media.schema, &fields, bounds);
        }
        _ if text.is_empty() => {}
        _ => match serde_json::from_str::<Value>(text) {
            Ok(value) => {
                set_example_once(
                    media,
                    || {
                        Value::String(
                            serde_json::to_string_pretty(&value)
                                .unwrap_or_else(|_| text.to_string()),
                        )
                    },
                    bounds,
                );
                observe_json(&mut media.schema, &value);
            }
            Err(_) => set_example_once(media, || Value::String(text.to_string()), bounds),
        },
    }
}

/// Body examples are kept whole; `max_len` only bounds parameter and
/// field examples.
fn set_example_once(media: &mut MediaType, example: impl FnOnce() -> Value, bounds: Bounds<'_>) {
    if media.example.is_some() {
        return;
    }
    media.example = Some(example());
    media.sample_entry = bounds
        .sample_id
        .filter(|id| !id.is_empty())
        .map(str::to_string);
}

/// Form fields become string properties; `required` keeps the fields seen
/// in every sample.
pub fn observe_form(schema: &mut Option<Schema>, fields: &[FormField], bounds: Bounds<'_>) {
    let names: BTreeSet<&str> = fields.iter().map(|f| f.name.as_str()).collect();

    match schema {
        Some(existing) if existing.schema_type == Some(SchemaType::Object) => {
            existing.required.retain(|name| names.contains(name.as_str()));
        }
        _ => {
            *schema = Some(Schema {
                required: names.iter().map(|name| name.to_string()).collect(),
                ..Schema::of(SchemaType::Object)
            });
        }
    }
    let Some(schema) = schema.as_mut() else {
        return;
    };

    for field in fields {
        let property = schema
            .properties
            .entry(field.name.clone())
            .or_insert_with(|| Schema::of(SchemaType::String));
        push_schema_example(
            &mut property.examples,
            Value::String(bounded_text(&field.value, bounds.max_len)),
            bounds.max_examples,
        );
    }
}

/// Top-level JSON shape. Objects get typed properties with `required` as the
/// intersection of keys seen so far; conflicting types widen to string.
pub fn observe_json(schema: &mut Option<Schema>, value: &Value) {
    let observed = SchemaType::of_value(value);

    let Some(existing) = schema else {
        let mut fresh = Schema::of(observed);
        if let Value::Object(map) = value {
            fresh.properties = map
                .iter()
                .map(|(key, v)| (key.clone(), Schema::of(SchemaType::of_value(v))))
                .collect();
            fresh.required = map.keys().cloned().collect();
        }
        *schema = Some(fresh);
        return;
    };

    match (existing.schema_type, value) {
        (Some(SchemaType::Object), Value::Object(map)) => {
            existing.required.retain(|key| map.contains_key(key));
            for (key, v) in map {
                let observed = SchemaType::of_value(v);
                existing
                    .properties
                    .entry(key.clone())
                    .and_modify(|property| {
                        property.schema_type = Some(widen(property.schema_type, observed));
                    })
                    .or_insert_with(|| Schema::of(observed));
            }
        }
        (current, _) => {
            let widened = widen(current, observed);
            if Some(widened) != current {
                *existing = Schema::of(widened);
            }
        }
    }
}

/// Common type of two observations. Null yields to anything, integers
/// widen to number, everything else conflicting becomes string.
pub fn widen(current: Option<SchemaType>, observed: SchemaType) -> SchemaType {
    use SchemaType::{Integer, Null, Number, String};

    match (current, observed) {
        (None, t) | (Some(Null), t) => t,
        (Some(t), Null) => t,
        (Some(a), b) if a == b => a,
        (Some(Integer), Number) | (Some(Number), Integer) => Number,
        _ => String,
    }
}
