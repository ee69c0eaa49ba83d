//! Folding one spec fragment into another. Used when path compaction
//! collapses siblings and when two operations turn out to be the same.

use crate::examples::{merge_examples, push_schema_example};
use crate::openapi::{
    Header, MediaType, Method, Operation, Parameter, ParameterLocation, PathItem, RequestBody,
    Response, Schema, SchemaType,
};
use crate::payload::widen;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

pub fn merge_path_items(target: &mut PathItem, mut other: PathItem, max_examples: usize) {
    for method in Method::ALL {
        let Some(op) = other.slot_mut(method).take() else {
            continue;
        };
        let slot = target.slot_mut(method);
        match slot {
            Some(existing) => merge_operations(existing, op, max_examples),
            None => *slot = Some(op),
        }
    }
    merge_parameter_lists(&mut target.parameters, other.parameters, max_examples);
}

/// `target` keeps its id; the other id and its history land in
/// `x-historical-ids`.
pub fn merge_operations(target: &mut Operation, other: Operation, max_examples: usize) {
    let Operation {
        operation_id,
        description,
        tags,
        parameters,
        request_body,
        responses,
        counters_total,
        counters_per_source,
        last_seen_ts,
        historical_ids,
        sample_entry,
    } = other;

    if target.description.is_none() {
        target.description = description;
    }
    for tag in tags {
        if !target.tags.contains(&tag) {
            target.tags.push(tag);
        }
    }

    merge_parameter_lists(&mut target.parameters, parameters, max_examples);
    merge_request_bodies(&mut target.request_body, request_body, max_examples);
    merge_responses(&mut target.responses, responses, max_examples);

    target.counters_total.merge(&counters_total);
    target.counters_per_source.merge(&counters_per_source);
    target.last_seen_ts = target.last_seen_ts.max(last_seen_ts);

    for id in historical_ids.into_iter().chain(std::iter::once(operation_id)) {
        if id != target.operation_id && !target.historical_ids.contains(&id) {
            target.historical_ids.push(id);
        }
    }

    if target.sample_entry.is_none() {
        target.sample_entry = sample_entry;
    }
}

/// Parameters missing on either side stop being required; path
/// parameters always are.
pub fn merge_parameter_lists(
    target: &mut Vec<Parameter>,
    other: Vec<Parameter>,
    max_examples: usize,
) {
    for param in target.iter_mut() {
        if param.location != ParameterLocation::Path
            && !other.iter().any(|o| o.matches(param.location, &param.name))
        {
            param.required = false;
        }
    }

    for mut param in other {
        match target
            .iter_mut()
            .find(|existing| existing.matches(param.location, &param.name))
        {
            Some(existing) => merge_parameter(existing, param, max_examples),
            None => {
                if param.location != ParameterLocation::Path {
                    param.required = false;
                }
                target.push(param);
            }
        }
    }
}

pub fn merge_parameter(target: &mut Parameter, other: Parameter, max_examples: usize) {
    target.required = target.location == ParameterLocation::Path
        || (target.required && other.required);
    if target.style.is_none() {
        target.style = other.style;
    }
    merge_optional_schema(&mut target.schema, other.schema, max_examples);
    merge_examples(&mut target.examples, other.examples, max_examples);
}

pub fn merge_headers(
    target: &mut BTreeMap<String, Header>,
    other: BTreeMap<String, Header>,
    max_examples: usize,
) {
    for (name, header) in target.iter_mut() {
        if !other.contains_key(name) {
            header.required = false;
        }
    }

    for (name, mut header) in other {
        match target.entry(name) {
            Entry::Occupied(mut slot) => {
                let existing = slot.get_mut();
                existing.required &= header.required;
                if existing.style.is_none() {
                    existing.style = header.style;
                }
                merge_optional_schema(&mut existing.schema, header.schema, max_examples);
                merge_examples(&mut existing.examples, header.examples, max_examples);
            }
            Entry::Vacant(slot) => {
                header.required = false;
                slot.insert(header);
            }
        }
    }
}

pub fn merge_responses(
    target: &mut BTreeMap<String, Response>,
    other: BTreeMap<String, Response>,
    max_examples: usize,
) {
    for (status, response) in other {
        match target.entry(status) {
            Entry::Occupied(mut slot) => {
                let existing = slot.get_mut();
                if existing.description.is_empty() {
                    existing.description = response.description;
                }
                merge_headers(&mut existing.headers, response.headers, max_examples);
                merge_content(&mut existing.content, response.content, max_examples);
            }
            Entry::Vacant(slot) => {
                slot.insert(response);
            }
        }
    }
}

pub fn merge_request_bodies(
    target: &mut Option<RequestBody>,
    other: Option<RequestBody>,
    max_examples: usize,
) {
    let Some(other) = other else {
        return;
    };
    match target {
        Some(existing) => {
            existing.required &= other.required;
            if existing.description.is_none() {
                existing.description = other.description;
            }
            merge_content(&mut existing.content, other.content, max_examples);
        }
        None => *target = Some(other),
    }
}

pub fn merge_content(
    target: &mut BTreeMap<String, MediaType>,
    other: BTreeMap<String, MediaType>,
    max_examples: usize,
) {
    for (key, media) in other {
        match target.entry(key) {
            Entry::Occupied(mut slot) => merge_media(slot.get_mut(), media, max_examples),
            Entry::Vacant(slot) => {
                slot.insert(media);
            }
        }
    }
}

/// First example wins, schemas combine.
pub fn merge_media(target: &mut MediaType, other: MediaType, max_examples: usize) {
    if target.example.is_none() {
        target.example = other.example;
        target.sample_entry = other.sample_entry;
    }
    merge_optional_schema(&mut target.schema, other.schema, max_examples);
}

pub fn merge_optional_schema(
    target: &mut Option<Schema>,
    other: Option<Schema>,
    max_examples: usize,
) {
    let Some(other) = other else {
        return;
    };
    match target {
        Some(existing) => merge_schema(existing, other, max_examples),
        None => *target = Some(other),
    }
}

/// Objects merge property-wise with `required` intersected; other
/// conflicts widen the type.
pub fn merge_schema(target: &mut Schema, other: Schema, max_examples: usize) {
    match (target.schema_type, other.schema_type) {
        (_, None) => {}
        (Some(SchemaType::Object), Some(SchemaType::Object)) => {
            target.required.retain(|key| other.required.contains(key));
            for (key, property) in other.properties {
                match target.properties.entry(key) {
                    Entry::Occupied(mut slot) => {
                        merge_schema(slot.get_mut(), property, max_examples);
                    }
                    Entry::Vacant(slot) => {
                        slot.insert(property);
                    }
                }
            }
        }
        (None, Some(_)) => {
            let examples = std::mem::take(&mut target.examples);
            *target = Schema { examples, ..other };
        }
        (current, Some(observed)) => {
            let widened = widen(current, observed);
            if Some(widened) != current {
                let examples = std::mem::take(&mut target.examples);
                *target = Schema {
                    examples,
                    ..Schema::of(widened)
                };
            }
        }
    }

    for example in other.examples {
        push_schema_example(&mut target.examples, example, max_examples);
    }
}
