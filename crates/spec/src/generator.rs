use crate::config::GeneratorConfig;
use crate::counters::{is_generated_description, Counter, CounterMap};
use crate::examples::{observe_headers, observe_parameters, Bounds};
use crate::merge::merge_path_items;
use crate::openapi::{Method, OpenApi, Operation, ParameterLocation, RequestBody};
use crate::payload::{observe_payload, ContentType, FormField, Payload};
use crate::tags::suggest_tags;
use crate::tree::PathTree;
use crate::{Result, SpecError};
use log::{debug, info, warn};
use oasgen_classify::{ctype_ignored, extension_ignored};
use oasgen_har::{Header, QueryPair, TaggedEntry};
use parking_lot::Mutex;
use url::Url;
use uuid::Uuid;

/// Redirects and gateway errors say nothing about the service itself.
const DROPPED_STATUSES: &[i64] = &[301, 308, 502, 503, 504];

/// Builds and refines the OpenAPI document of one service from its traffic.
///
/// All state sits behind one lock: [`SpecGenerator::feed_entry`] and
/// [`SpecGenerator::get_spec`] serialize against each other, other
/// generators are unaffected.
pub struct SpecGenerator {
    server_url: String,
    config: GeneratorConfig,
    state: Mutex<GeneratorState>,
}

struct GeneratorState {
    skeleton: OpenApi,
    tree: PathTree,
    admitted: u64,
    loaded: bool,
}

impl SpecGenerator {
    pub fn new(server_url: impl Into<String>) -> Self {
        Self::with_config(server_url, GeneratorConfig::default())
    }

    pub fn with_config(server_url: impl Into<String>, config: GeneratorConfig) -> Self {
        let server_url = server_url.into();
        Self {
            state: Mutex::new(GeneratorState {
                skeleton: OpenApi::skeleton(&server_url),
                tree: PathTree::new(config),
                admitted: 0,
                loaded: false,
            }),
            server_url,
            config,
        }
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    pub fn config(&self) -> GeneratorConfig {
        self.config
    }

    /// Replaces the current document with `spec`, re-inserting every path.
    /// `x-last-seen-ts` is reset so inter-arrival gaps restart from the
    /// next observed entry.
    pub fn load_from_spec(&self, spec: OpenApi) {
        let OpenApi {
            openapi,
            info,
            servers,
            paths,
            ..
        } = spec;

        let mut tree = PathTree::new(self.config);
        let path_count = paths.len();
        for (path, mut item) in paths {
            for (_, op) in item.operations_mut() {
                op.last_seen_ts = 0.0;
            }
            let declared = std::mem::take(&mut item.parameters);
            let slot = tree.insert(&path, &declared, None);
            item.parameters = declared
                .into_iter()
                .filter(|p| p.location != ParameterLocation::Path)
                .collect();

            if slot.has_operations() {
                merge_path_items(slot, item, self.config.max_examples);
            } else {
                *slot = item;
            }
        }

        let mut state = self.state.lock();
        state.skeleton.openapi = openapi;
        state.skeleton.info = info;
        if !servers.is_empty() {
            state.skeleton.servers = servers;
        }
        state.tree = tree;
        state.loaded = true;
        info!("Loaded {path_count} paths for {}", self.server_url);
    }

    /// Folds one exchange into the document.
    ///
    /// Returns the id of the operation it was attributed to, or `None` when
    /// the entry was filtered out or could not be processed.
    pub fn feed_entry(&self, tagged: &TaggedEntry) -> Option<String> {
        let mut state = self.state.lock();
        match state.feed(tagged, &self.config) {
            Ok(operation_id) => operation_id,
            Err(err) => {
                warn!("Dropping entry {:?}: {err}", tagged.sample_id);
                None
            }
        }
    }

    /// Detached snapshot of the current document: compacts the path tree,
    /// refreshes generated descriptions, aggregates counters and suggests
    /// tags.
    pub fn get_spec(&self) -> Result<OpenApi> {
        let spec = {
            let mut state = self.state.lock();
            let folded = state.tree.compact();
            if folded > 0 {
                debug!("Folded {folded} path nodes for {}", self.server_url);
            }

            let mut total = Counter::default();
            let mut per_source = CounterMap::default();
            let mut operations = 0usize;
            state.tree.visit_items_mut(|item| {
                for (_, op) in item.operations_mut() {
                    total.merge(&op.counters_total);
                    per_source.merge(&op.counters_per_source);
                    operations += 1;
                    if is_generated_description(op.description.as_deref()) {
                        op.description = Some(op.counters_total.describe());
                    }
                }
            });

            let mut spec = state.skeleton.clone();
            spec.paths = state.tree.list_paths().into_iter().collect();
            suggest_tags(&mut spec.paths);

            if operations > 0 {
                spec.counters_total = Some(total);
                spec.counters_per_source = per_source;
                if is_generated_description(spec.info.description.as_deref()) {
                    spec.info.description =
                        Some(format!("{} across {operations} operations", total.describe()));
                }
            }
            spec
        };

        let raw = serde_json::to_vec(&spec)?;
        Ok(serde_json::from_slice(&raw)?)
    }

    /// Entries attributed to an operation since construction.
    pub fn admitted_entries(&self) -> u64 {
        self.state.lock().admitted
    }

    /// Whether there is anything worth listing: admitted traffic or a
    /// loaded document.
    pub fn has_content(&self) -> bool {
        let state = self.state.lock();
        state.admitted > 0 || state.loaded
    }
}

impl GeneratorState {
    fn feed(&mut self, tagged: &TaggedEntry, config: &GeneratorConfig) -> Result<Option<String>> {
        let entry = &tagged.entry;
        let url = tagged.request_url()?;
        let path = url.path();

        if extension_ignored(path) {
            debug!("Ignoring {path}: static asset");
            return Ok(None);
        }
        let raw_method = entry.request.method.trim();
        if raw_method.eq_ignore_ascii_case("options") {
            debug!("Ignoring OPTIONS {path}");
            return Ok(None);
        }
        let response_type = ContentType::lenient(entry.response.content_type());
        if ctype_ignored(&response_type.essence) {
            debug!("Ignoring {path}: content type {}", response_type.essence);
            return Ok(None);
        }
        let status = entry.response.status;
        if status < 100 || DROPPED_STATUSES.contains(&status) {
            debug!("Ignoring {path}: status {status}");
            return Ok(None);
        }

        let method = Method::parse(raw_method)
            .ok_or_else(|| SpecError::UnsupportedMethod(raw_method.to_string()))?;
        let ts = entry.started_at()?;
        let success = (100..400).contains(&status);
        let sample_id = Some(tagged.sample_id.as_str()).filter(|id| !id.is_empty());
        let bounds = Bounds {
            sample_id,
            max_examples: config.max_examples,
            max_len: config.max_example_len,
        };

        let item = if success {
            self.tree.insert(path, &[], sample_id)
        } else {
            match self.tree.find_mut(path) {
                Some(item) => item,
                None => {
                    debug!("Failed call to unknown path {path} ({status})");
                    return Ok(None);
                }
            }
        };

        let slot = item.slot_mut(method);
        if slot.is_none() && !success {
            debug!("Failed call to unknown operation {method} {path} ({status})");
            return Ok(None);
        }
        let created = slot.is_none();
        let op = slot.get_or_insert_with(|| Operation::new(Uuid::new_v4().to_string()));
        if created {
            debug!("New operation {} for {method} {path}", op.operation_id);
        }
        let first_sample = op.counters_total.entries == 0;

        let query = query_pairs(&url, &entry.request.query_string);
        observe_parameters(
            &mut op.parameters,
            ParameterLocation::Query,
            &query,
            first_sample,
            bounds,
        );
        observe_parameters(
            &mut op.parameters,
            ParameterLocation::Header,
            &header_pairs(&entry.request.headers),
            first_sample,
            bounds,
        );

        if success && entry.request.has_body() {
            let request_type = ContentType::lenient(entry.request.content_type());
            let fields: Vec<FormField> = entry
                .request
                .post_data
                .iter()
                .flat_map(|data| &data.params)
                .map(|param| {
                    FormField::new(param.name.clone(), param.value.clone().unwrap_or_default())
                })
                .collect();
            let body = op.request_body.get_or_insert_with(RequestBody::generic);
            let media = body
                .content
                .entry(request_type.content_key().to_string())
                .or_default();
            observe_payload(
                media,
                Payload {
                    content_type: &request_type,
                    body: entry.request.body_text().as_bytes(),
                    fields: &fields,
                },
                bounds,
            );
        }

        let status_key = status.to_string();
        let new_response = !op.responses.contains_key(&status_key);
        let response = op.responses.entry(status_key).or_default();
        response.description = if success {
            format!("Successful call with status {status}")
        } else {
            format!("Failed call with status {status}")
        };
        observe_headers(
            &mut response.headers,
            &header_pairs(&entry.response.headers),
            new_response,
            bounds,
        );
        let body = entry.response.content.decoded();
        if !(response_type.essence.is_empty() && body.is_empty()) {
            let media = response
                .content
                .entry(response_type.content_key().to_string())
                .or_default();
            observe_payload(
                media,
                Payload {
                    content_type: &response_type,
                    body: &body,
                    fields: &[],
                },
                bounds,
            );
        }

        let rt = entry.elapsed_secs();
        let duration = if op.last_seen_ts != 0.0 && ts >= op.last_seen_ts {
            ts - op.last_seen_ts
        } else {
            0.0
        };
        let source = tagged.source.identity();
        op.counters_total.add_entry(ts, rt, success, duration);
        op.counters_per_source
            .add_entry(&source, ts, rt, success, duration);
        op.last_seen_ts = op.last_seen_ts.max(ts);
        if let Some(sample_id) = sample_id {
            op.sample_entry = Some(sample_id.to_string());
        }

        let operation_id = op.operation_id.clone();
        self.admitted += 1;
        Ok(Some(operation_id))
    }
}

/// Pairs from the URL; the capture's `queryString` when the URL has none.
fn query_pairs(url: &Url, captured: &[QueryPair]) -> Vec<(String, String)> {
    let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
    if !pairs.is_empty() {
        return pairs;
    }
    captured
        .iter()
        .map(|pair| (pair.name.clone(), pair.value.clone()))
        .collect()
}

fn header_pairs(headers: &[Header]) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|header| (header.name.clone(), header.value.clone()))
        .collect()
}
