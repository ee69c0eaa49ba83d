use crate::{HarError, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{DateTime, NaiveDateTime, Utc};
use log::warn;
use serde::{Deserialize, Serialize};
use url::Url;

/// Naive timestamp layouts accepted when `startedDateTime` carries no offset.
const NAIVE_LAYOUTS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Network identity of one side of an exchange.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Peer {
    /// Resolved service name, empty when unknown
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub ip: String,

    #[serde(default)]
    pub port: String,
}

impl Peer {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn address(ip: impl Into<String>, port: impl Into<String>) -> Self {
        Self {
            name: String::new(),
            ip: ip.into(),
            port: port.into(),
        }
    }

    /// Service name, or `ip:port` when the name was not resolved.
    pub fn identity(&self) -> String {
        if !self.name.is_empty() {
            return self.name.clone();
        }
        if self.ip.is_empty() && self.port.is_empty() {
            return String::new();
        }
        format!("{}:{}", self.ip, self.port)
    }
}

/// One captured exchange together with where it came from and where it went.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaggedEntry {
    #[serde(default)]
    pub source: Peer,

    #[serde(default)]
    pub destination: Peer,

    /// Opaque reference back to the stored exchange
    #[serde(default)]
    pub sample_id: String,

    pub entry: Entry,
}

impl TaggedEntry {
    pub fn new(entry: Entry) -> Self {
        Self {
            entry,
            ..Self::default()
        }
    }

    pub fn with_source(mut self, source: Peer) -> Self {
        self.source = source;
        self
    }

    pub fn with_destination(mut self, destination: Peer) -> Self {
        self.destination = destination;
        self
    }

    pub fn with_sample_id(mut self, sample_id: impl Into<String>) -> Self {
        self.sample_id = sample_id.into();
        self
    }

    /// Key of the service this exchange describes.
    ///
    /// Falls back to the `host[:port]` of the request URL when the capture
    /// did not tag a destination.
    pub fn destination_key(&self) -> String {
        let identity = self.destination.identity();
        if !identity.is_empty() {
            return identity;
        }
        match Url::parse(&self.entry.request.url) {
            Ok(url) => host_with_port(&url),
            Err(_) => String::new(),
        }
    }

    /// Request URL, resolved against the destination when it is relative.
    pub fn request_url(&self) -> Result<Url> {
        let raw = &self.entry.request.url;
        match Url::parse(raw) {
            Ok(url) => Ok(url),
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                let base = format!("http://{}/", self.destination_key());
                Url::parse(&base)
                    .and_then(|base| base.join(raw))
                    .map_err(|err| HarError::InvalidUrl {
                        url: raw.clone(),
                        reason: err.to_string(),
                    })
            }
            Err(err) => Err(HarError::InvalidUrl {
                url: raw.clone(),
                reason: err.to_string(),
            }),
        }
    }
}

pub fn host_with_port(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    /// ISO-8601 start of the exchange
    #[serde(default)]
    pub started_date_time: String,

    /// Total elapsed time in milliseconds, -1 when not measured
    #[serde(default)]
    pub time: f64,

    pub request: Request,

    pub response: Response,
}

impl Entry {
    /// Start of the exchange in UTC seconds since the epoch.
    pub fn started_at(&self) -> Result<f64> {
        parse_timestamp(&self.started_date_time)
    }

    /// Elapsed time in seconds; unmeasured timings count as zero.
    pub fn elapsed_secs(&self) -> f64 {
        if self.time.is_finite() && self.time > 0.0 {
            self.time / 1000.0
        } else {
            0.0
        }
    }
}

/// Parse an ISO-8601 timestamp into UTC seconds. Offsetless values are UTC.
pub fn parse_timestamp(raw: &str) -> Result<f64> {
    let trimmed = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(unix_seconds(parsed.with_timezone(&Utc)));
    }
    for layout in NAIVE_LAYOUTS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(trimmed, layout) {
            return Ok(unix_seconds(parsed.and_utc()));
        }
    }
    Err(HarError::InvalidTimestamp(raw.to_string()))
}

fn unix_seconds(at: DateTime<Utc>) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let whole = at.timestamp() as f64;
    whole + f64::from(at.timestamp_subsec_nanos()) / 1e9
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub name: String,
    #[serde(default)]
    pub value: String,
}

impl Header {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryPair {
    pub name: String,
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostParam {
    pub name: String,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub content_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostData {
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub params: Vec<PostParam>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    #[serde(default)]
    pub method: String,

    #[serde(default)]
    pub url: String,

    #[serde(default)]
    pub http_version: String,

    #[serde(default)]
    pub headers: Vec<Header>,

    #[serde(default)]
    pub query_string: Vec<QueryPair>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_data: Option<PostData>,
}

impl Request {
    /// Declared body type: a `Content-Type` header wins over `postData.mimeType`.
    pub fn content_type(&self) -> &str {
        let declared = self
            .post_data
            .as_ref()
            .map(|data| data.mime_type.as_str())
            .unwrap_or_default();
        find_header(&self.headers, "content-type").unwrap_or(declared)
    }

    pub fn body_text(&self) -> &str {
        self.post_data
            .as_ref()
            .map(|data| data.text.as_str())
            .unwrap_or_default()
    }

    pub fn has_body(&self) -> bool {
        self.post_data
            .as_ref()
            .is_some_and(|data| !data.text.is_empty() || !data.params.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Content {
    #[serde(default)]
    pub size: i64,

    #[serde(default)]
    pub mime_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl Content {
    /// Body bytes, transparently decoding `encoding: "base64"`.
    pub fn decoded(&self) -> Vec<u8> {
        let text = self.text.as_deref().unwrap_or_default();
        if self.encoding.as_deref() == Some("base64") {
            match STANDARD.decode(text.trim()) {
                Ok(bytes) => return bytes,
                Err(err) => warn!("Failed to decode response body as base64: {err}"),
            }
        }
        text.as_bytes().to_vec()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    #[serde(default)]
    pub status: i64,

    #[serde(default)]
    pub status_text: String,

    #[serde(default)]
    pub http_version: String,

    #[serde(default)]
    pub headers: Vec<Header>,

    #[serde(default)]
    pub content: Content,
}

impl Response {
    /// Declared body type: a `Content-Type` header wins over `content.mimeType`.
    pub fn content_type(&self) -> &str {
        find_header(&self.headers, "content-type").unwrap_or(&self.content.mime_type)
    }
}

fn find_header<'a>(headers: &'a [Header], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .rev()
        .find(|header| header.name.eq_ignore_ascii_case(name))
        .map(|header| header.value.as_str())
}
