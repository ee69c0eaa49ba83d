//! # OAS Generator pipeline
//!
//! Decouples traffic capture from spec synthesis:
//!
//! ```text
//! capture ──push()──> [bounded channel] ──> worker ──> ServiceRegistry
//!  (any thread,        (drops when full)    (single)     ├─ "users"  → SpecGenerator
//!   never blocks)                                        └─ "orders" → SpecGenerator
//! ```
//!
//! HTTP glue and CLIs read through [`ServiceRegistry`]: every accessor
//! returns a detached snapshot.

mod config;
mod error;
mod registry;
mod runner;

pub use config::{PipelineConfig, DEFAULT_CHANNEL_CAPACITY};
pub use error::{PipelineError, Result};
pub use registry::ServiceRegistry;
pub use runner::SpecPipeline;
