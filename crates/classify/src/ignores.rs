//! Traffic and header filters applied before inference.

const IGNORED_EXTENSIONS: &[&str] = &[
    "gif", "svg", "css", "png", "ico", "js", "woff2", "woff", "jpg", "jpeg", "swf", "ttf", "map",
    "webp", "otf", "mp3",
];

const IGNORED_CTYPE_PREFIXES: &[&str] = &["image/", "font/", "video/", "audio/", "text/javascript"];

const IGNORED_CTYPES: &[&str] = &[
    "application/javascript",
    "application/x-javascript",
    "text/css",
    "application/font-woff2",
    "application/font-woff",
    "application/x-font-woff",
];

const IGNORED_HEADERS: &[&str] = &[
    "a-im",
    "accept",
    "authorization",
    "cache-control",
    "connection",
    "content-encoding",
    "content-length",
    "content-type",
    "cookie",
    "date",
    "dnt",
    "expect",
    "forwarded",
    "from",
    "front-end-https",
    "host",
    "http2-settings",
    "max-forwards",
    "origin",
    "pragma",
    "proxy-authorization",
    "proxy-connection",
    "range",
    "referer",
    "save-data",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
    "upgrade-insecure-requests",
    "x-download-options",
    "server",
    "user-agent",
    "via",
    "warning",
    "strict-transport-security",
    "x-permitted-cross-domain-policies",
    "x-att-deviceid",
    "x-correlation-id",
    "correlation-id",
    "x-client-data",
    "x-dns-prefetch-control",
    "x-http-method-override",
    "x-real-ip",
    "x-request-id",
    "x-request-start",
    "x-requested-with",
    "x-uidh",
    "x-same-domain",
    "x-content-type-options",
    "x-frame-options",
    "x-xss-protection",
    "x-wap-profile",
    "x-scheme",
    "status",
    "x-cache",
    "x-application-context",
    "retry-after",
    "newrelic",
    "x-cloud-trace-context",
    "sentry-trace",
    "x-cache-hits",
    "x-served-by",
    "x-span-name",
    "expires",
    "set-cookie",
    "p3p",
    "content-security-policy",
    "content-security-policy-report-only",
    "last-modified",
    "content-language",
    "x-varnish",
    "true-client-ip",
    "akamai-origin-hop",
    "keep-alive",
    "etag",
    "alt-svc",
    "x-csrf-token",
    "x-ua-compatible",
    "vary",
    "x-powered-by",
    "age",
    "allow",
    "www-authenticate",
    "expect-ct",
    "timing-allow-origin",
    "referrer-policy",
    "x-aspnet-version",
    "x-aspnetmvc-version",
    "x-timer",
    "x-abuse-info",
    "x-mod-pagespeed",
    "duration_ms",
];

const IGNORED_HEADER_PREFIXES: &[&str] = &[
    ":",
    "accept-",
    "access-control-",
    "if-",
    "sec-",
    "grpc-",
    "x-forwarded-",
    "x-original-",
    "cf-",
    "x-envoy-",
    "x-hasura-",
    "x-b3-",
    "x-datadog-",
    "x-amz-",
    "x-amzn-",
    "x-newrelic-",
    "x-prometheus-",
    "x-akamai-",
    "x-ratelimit-",
    "x-goog-",
];

/// True when the URL path ends in a static-asset extension.
pub fn extension_ignored(path: &str) -> bool {
    let Some((_, ext)) = path.rsplit_once('.') else {
        return false;
    };
    IGNORED_EXTENSIONS.contains(&ext)
}

/// True for media types that never describe an API payload. Expects a bare
/// MIME type (no parameters); comparison is case-insensitive.
pub fn ctype_ignored(ctype: &str) -> bool {
    let ctype = ctype.trim().to_ascii_lowercase();
    IGNORED_CTYPE_PREFIXES
        .iter()
        .any(|prefix| ctype.starts_with(prefix))
        || IGNORED_CTYPES.contains(&ctype.as_str())
}

/// True for transport, caching, tracing and vendor boilerplate headers.
pub fn header_ignored(name: &str) -> bool {
    let name = name.to_ascii_lowercase();
    IGNORED_HEADERS.contains(&name.as_str())
        || IGNORED_HEADER_PREFIXES
            .iter()
            .any(|prefix| name.starts_with(prefix))
}
