//! # OAS Generator spec synthesis
//!
//! Incrementally derives an OpenAPI 3.1 document for one service from the
//! request/response exchanges it serves.
//!
//! ```text
//! TaggedEntry ──> admission ──> PathTree ──> Operation
//!                 (ignores)     (gibberish    ├─ parameters (query/header/path)
//!                                segments)    ├─ requestBody / responses
//!                                             └─ x-counters-* extensions
//!
//! get_spec(): compact tree ──> list paths ──> tags ──> detached OpenApi
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use oasgen_har::{Entry, TaggedEntry};
//! use oasgen_spec::SpecGenerator;
//!
//! # fn main() -> oasgen_spec::Result<()> {
//! let generator = SpecGenerator::new("http://svc");
//! generator.feed_entry(&TaggedEntry::new(Entry::default()));
//! let spec = generator.get_spec()?;
//! println!("{}", serde_json::to_string_pretty(&spec)?);
//! # Ok(())
//! # }
//! ```

mod config;
mod counters;
mod error;
mod examples;
mod generator;
mod merge;
mod openapi;
mod payload;
mod tags;
mod tree;

pub use config::{
    parse_bounded, GeneratorConfig, DEFAULT_COMPACTION_MIN_SIBLINGS, DEFAULT_MAX_EXAMPLES,
    DEFAULT_MAX_EXAMPLE_LEN,
};
pub use counters::{is_generated_description, Counter, CounterMap};
pub use error::{Result, SpecError};
pub use generator::SpecGenerator;
pub use merge::{
    merge_content, merge_headers, merge_operations, merge_path_items, merge_request_bodies,
    merge_responses, merge_schema,
};
pub use openapi::{
    Example, Examples, Header, Info, MediaType, Method, OpenApi, Operation, Parameter,
    ParameterLocation, PathItem, RequestBody, Response, Schema, SchemaType, Server,
    OPENAPI_VERSION,
};
pub use payload::{parse_multipart, parse_urlencoded, ContentType, FormField};
pub use tags::suggest_tags;
pub use tree::PathTree;
