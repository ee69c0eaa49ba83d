//! Bounded, de-duplicated example collections.

use crate::openapi::{Example, Examples, Header, Parameter, ParameterLocation};
use oasgen_classify::header_ignored;
use serde_json::Value;
use std::collections::BTreeSet;

const EXAMPLE_KEY_PREFIX: &str = "example #";

/// Adds `value` unless it is already present or the collection is full.
/// Returns whether it was added.
///
/// Ordinals are zero-padded to the width of `max` so keys sort in
/// insertion order.
pub fn add_example(
    examples: &mut Examples,
    value: Value,
    sample_id: Option<&str>,
    max: usize,
) -> bool {
    if examples.len() >= max || examples.values().any(|existing| existing.value == value) {
        return false;
    }

    let width = max.to_string().len();
    let mut ordinal = examples.len() + 1;
    let key = loop {
        let key = format!("{EXAMPLE_KEY_PREFIX}{ordinal:0width$}");
        if !examples.contains_key(&key) {
            break key;
        }
        ordinal += 1;
    };

    examples.insert(
        key,
        Example {
            value,
            sample_entry: sample_id.filter(|id| !id.is_empty()).map(str::to_string),
        },
    );
    true
}

/// Folds `other` into `target` under the same bounds.
pub fn merge_examples(target: &mut Examples, other: Examples, max: usize) {
    for example in other.into_values() {
        add_example(target, example.value, example.sample_entry.as_deref(), max);
    }
}

/// Schema-level `examples` array with the same bound.
pub fn push_schema_example(examples: &mut Vec<Value>, value: Value, max: usize) {
    if examples.len() < max && !examples.contains(&value) {
        examples.push(value);
    }
}

/// Truncates on a char boundary.
pub fn bounded_text(text: &str, max_len: usize) -> String {
    match text.char_indices().nth(max_len) {
        Some((cut, _)) => text[..cut].to_string(),
        None => text.to_string(),
    }
}

/// Limits applied while recording observed values.
#[derive(Debug, Clone, Copy)]
pub struct Bounds<'a> {
    pub sample_id: Option<&'a str>,
    pub max_examples: usize,
    pub max_len: usize,
}

/// Records the query or header pairs of one sample on an operation.
///
/// Parameters first seen on the operation's first sample start required;
/// later arrivals start optional. Any parameter of this location missing
/// from the sample loses `required`.
pub fn observe_parameters(
    params: &mut Vec<Parameter>,
    location: ParameterLocation,
    pairs: &[(String, String)],
    first_sample: bool,
    bounds: Bounds<'_>,
) {
    let mut seen = BTreeSet::new();

    for (name, value) in pairs {
        if location == ParameterLocation::Header && header_ignored(name) {
            continue;
        }
        let general = match location {
            ParameterLocation::Header => name.to_ascii_lowercase(),
            _ => name.clone(),
        };

        let index = match params.iter().position(|p| p.matches(location, &general)) {
            Some(index) => index,
            None => {
                params.push(Parameter::new(general.clone(), location, first_sample));
                params.len() - 1
            }
        };
        add_example(
            &mut params[index].examples,
            Value::String(bounded_text(value, bounds.max_len)),
            bounds.sample_id,
            bounds.max_examples,
        );
        seen.insert(general);
    }

    for param in params.iter_mut().filter(|p| p.location == location) {
        let present = match location {
            ParameterLocation::Header => seen.contains(&param.name.to_ascii_lowercase()),
            _ => seen.contains(&param.name),
        };
        if !present {
            param.required = false;
        }
    }
}

/// Response-header counterpart of [`observe_parameters`], keyed by lowercase
/// header name.
pub fn observe_headers(
    headers: &mut std::collections::BTreeMap<String, Header>,
    pairs: &[(String, String)],
    first_sample: bool,
    bounds: Bounds<'_>,
) {
    let mut seen = BTreeSet::new();

    for (name, value) in pairs {
        if header_ignored(name) {
            continue;
        }
        let general = name.to_ascii_lowercase();
        let header = headers
            .entry(general.clone())
            .or_insert_with(|| Header::new(first_sample));
        add_example(
            &mut header.examples,
            Value::String(bounded_text(value, bounds.max_len)),
            bounds.sample_id,
            bounds.max_examples,
        );
        seen.insert(general);
    }

    for (name, header) in headers.iter_mut() {
        if !seen.contains(name) {
            header.required = false;
        }
    }
}
