//! # OAS Generator HAR records
//!
//! The capture edge of the generator: HAR-shaped request/response exchanges
//! tagged with the peers that produced them.
//!
//! ```text
//! capture file (.har / .ldjson)      live capture
//!          │                              │
//!          └──> Entry ──> TaggedEntry <───┘
//!                          ├─ source / destination Peer
//!                          ├─ sample id
//!                          └─ request / response / timings
//! ```
//!
//! Records are decoded once at this boundary; nothing downstream handles
//! untyped JSON maps.

mod entry;
mod error;
mod reader;

pub use entry::{
    host_with_port, parse_timestamp, Content, Entry, Header, Peer, PostData, PostParam,
    QueryPair, Request, Response, TaggedEntry,
};
pub use error::{HarError, Result};
pub use reader::{read_capture, read_har, read_ldjson, Capture, CaptureFormat};
