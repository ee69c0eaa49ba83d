use crate::trigrams::is_trigram_bad;
use once_cell::sync::Lazy;
use regex::Regex;

/// Base64 payloads shorter than this are too likely to be plain words.
const BASE64_MIN_LEN: usize = 17;
/// URL-safe tokens (base64url, opaque cursors) at or above this length.
const TOKEN_MIN_LEN: usize = 33;
/// A chunk at or above this noise level reads as machine-generated.
const NOISY_CHUNK_LEVEL: f64 = 0.25;

struct Patterns {
    base64: Regex,
    uuid: Regex,
    email: Regex,
    hex_run: Regex,
    long_number: Regex,
    token: Regex,
}

static PATTERNS: Lazy<Patterns> = Lazy::new(|| Patterns {
    base64: compile(r"^(?:[A-Za-z0-9+/]{4})*(?:[A-Za-z0-9+/]{2}==|[A-Za-z0-9+/]{3}=)?$"),
    uuid: compile(
        r"(?i)[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}",
    ),
    email: compile(
        r"^[A-Za-z0-9_]+(?:[-+.'][A-Za-z0-9_]+)*@[A-Za-z0-9_]+(?:[-.][A-Za-z0-9_]+)*\.[A-Za-z0-9_]+(?:[-.][A-Za-z0-9_]+)*$",
    ),
    hex_run: compile(r"(?:0x)?[0-9a-fA-F]{6,}"),
    long_number: compile(r"^[0-9]{3,}$"),
    token: compile(r"^[A-Za-z0-9_-]+$"),
});

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("static gibberish pattern must compile")
}

/// True when a path segment is most likely an identifier rather than a
/// human-chosen name: UUIDs, e-mails, base64 blobs, long hex or digit runs,
/// opaque tokens, or alphanumeric noise. Version strings are never gibberish.
pub fn is_gibberish(segment: &str) -> bool {
    if is_version_string(segment) {
        return false;
    }

    let patterns = &*PATTERNS;

    if segment.len() >= BASE64_MIN_LEN && has_digit(segment) && patterns.base64.is_match(segment)
    {
        return true;
    }

    if patterns.uuid.is_match(segment)
        || patterns.email.is_match(segment)
        || patterns.long_number.is_match(segment)
    {
        return true;
    }

    if patterns
        .hex_run
        .find_iter(segment)
        .any(|run| has_digit(run.as_str()))
    {
        return true;
    }

    if segment.len() >= TOKEN_MIN_LEN
        && patterns.token.is_match(segment)
        && has_digit(segment)
        && segment.chars().any(|c| c.is_ascii_uppercase())
        && segment.chars().any(|c| c.is_ascii_lowercase())
    {
        return true;
    }

    is_noisy(segment)
}

/// `v?` followed by dotted integers. Bare numbers need a dot (`1.0`) unless
/// prefixed (`v2`).
pub fn is_version_string(segment: &str) -> bool {
    let (body, has_v) = match segment.strip_prefix('v') {
        Some(rest) => (rest, true),
        None => (segment, false),
    };

    if body.is_empty() {
        return false;
    }
    if !body.chars().all(|c| c == '.' || c.is_ascii_digit()) {
        return false;
    }

    has_v || body.contains('.')
}

/// Share of adjacent character pairs that switch character class in a way
/// people rarely type (lower→upper, digit→letter, ...), weighted per pair.
#[allow(clippy::cast_precision_loss)]
pub fn noise_level(chunk: &str) -> f64 {
    let mut score = 0.0;
    let mut count = 0usize;
    let mut prev: Option<CharClass> = None;

    for c in chunk.chars() {
        count += 1;
        let class = CharClass::of(c);
        if let Some(prev) = prev {
            score += transition_noise(prev, class);
        }
        prev = Some(class);
    }

    if count == 0 {
        return 0.0;
    }
    score / count as f64
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CharClass {
    Upper,
    Lower,
    Digit,
    Other,
}

impl CharClass {
    fn of(c: char) -> Self {
        if c.is_uppercase() {
            Self::Upper
        } else if c.is_lowercase() {
            Self::Lower
        } else if c.is_ascii_digit() {
            Self::Digit
        } else {
            Self::Other
        }
    }
}

fn transition_noise(prev: CharClass, next: CharClass) -> f64 {
    use CharClass::{Digit, Lower, Upper};

    match (prev, next) {
        (Upper, Upper) | (Lower, Lower) | (Digit, Digit) => 0.0,
        (Upper, Lower) => 0.20,
        (Upper, Digit) | (Lower, Digit) => 0.25,
        (Lower, Upper) | (Digit, Upper) => 0.75,
        _ => 1.0,
    }
}

/// At least a third of the alphanumeric characters sit in noisy chunks:
/// erratic character classes or letter trigrams words never contain.
fn is_noisy(segment: &str) -> bool {
    let mut noisy_len = 0usize;
    let mut alnum_len = 0usize;

    for chunk in segment
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|chunk| !chunk.is_empty())
    {
        alnum_len += chunk.len();
        if noise_level(chunk) >= NOISY_CHUNK_LEVEL || is_trigram_bad(chunk) {
            noisy_len += chunk.len();
        }
    }

    alnum_len > 0 && noisy_len * 3 >= alnum_len
}

fn has_digit(s: &str) -> bool {
    s.bytes().any(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    const NEGATIVE: &[&str] = &[
        "",
        "b",
        "GetUniversalVariableUser",
        "callback",
        "runs",
        "tcfv2",
        "StartUpCheckout",
        "GetCart",
        "project-id",
        "data.json",
        "post.json",
        "test.png",
        "testdata-10kB.js",
        "g.js",
        "g.pixel",
        "opt-out",
        "profile-method-info",
        "GetAds",
        "fcgi-bin",
        ".html",
        "agents.author.1.json",
        "publisha.1.json",
        "footer.include.html",
        "index.html",
        "Matt-cartoon-255x206px-small.png",
        "TheTelegraph_portal_white-320-small.png",
        "advert-management.adBlockerMessage.html",
        "Michael_Vaughan1.png",
        "big-danger-coronavirus-panic-greater-crisis",
        "some-uuid-maybe",
        "github-audit-exports",
        "dialog.overlay.infinity.json",
        "sync_a9",
        "1.0",
        "1.0.0",
        "v2.1.3",
        "image.sbix",
        "stable-4.0-version.json",
        "2.1.73",
        "zoom_in.cur",
        "pixel_details.html",
        "rtb-h",
        "fullHashes:find",
        "embeddable",
        "embeddable_blip",
        "abTestV2",
        "AddUserGroupLink",
        "web_widget",
        "VersionCheck.php",
        "{}",
        "v1",
        "users",
        "42",
        "list",
        "orders",
    ];

    const POSITIVE: &[&str] = &[
        "e21f7112-3d3b-4632-9da3-a4af2e0e9166",
        "952bea17-3776-11ea-9341-42010a84012a",
        "456795af-b48f-4a8d-9b37-3e932622c2f0",
        "0a0d0174-b338-4520-a1c3-24f7e3d5ec50.html",
        "550e8400-e29b-41d4-a716-446655440000",
        "6120c057c7a97b03f6986f1b",
        "610bc3fd5a77a7fa25033fb0",
        "610bd0315a77a7fa25034368",
        "610bd0315a77a7fa25034368zh",
        "710a462e",
        "0xdeadbeef",
        "1554507871",
        "19180481",
        "1024807212418223",
        "1553183382779",
        "qwerqwerasdfqwer@protonmai.com",
        "john.dow.1981@protonmail.com",
        "ci12NC01YzkyNTEzYzllMDRhLTAtYy5tb25pdG9yaW5nLmpzb24=",
        "11ca096cbc224a67360493d44a9903",
        "c738338322370b47a79251f7510dd",
        "QgAAAC6zw0qH2DJtnXe8Z7rUJP0FgAFKkOhcHdFWzL1ZYggtwBgiB3LSoele9o3ZqFh7iCBhHbVLAnMuJ0HF8hEw7UKecE6wd-MBXgeRMdubGydhAMZSmuUjRpqplML40bmrb8VjJKNZswD1Cg",
        "QgAAAC6zw0qH2DJtnXe8Z7rUJP0rG4sjLa_KVLlww5WEDJ__30J15en-K_6Y68jb_rU93e2TFY6fb0MYiQ1UrLNMQufqODHZUl39Lo6cXAOVOThjAMZSmuVH7n85JOYSCgzpvowMAVueGG0Xxg",
        "203ef0f713abcebd8d62c35c0e3f12f87d71e5e4",
        "MDEyOk9yZ2FuaXphdGlvbjU3MzI0Nzk1",
        "730970532670-compute@developer.gserviceaccount.com",
        "arn-aws-ecs-eu-west-2-396248696294-cluster-london-01-ECSCluster-27iuIYva8nO4",
        "AAAA028295945",
        "sp_ANQXRpqH_urn$3Auri$3Abase64$3A6698b0a3-97ad-52ce-8fc3-17d99e37a726",
        "n63nd45qsj",
        "n9z9QGNiz",
        "proxy.3d2100fd7107262ecb55ce6847f01fa5.html",
        "r-ext-5579e00a95c90",
        "r-ext-5579e8b12f11e",
        "r-v4-5c92513c9e04a",
        "r-v4-5c92513c9e04a-0-c.monitoring.json",
        "segments-1563566437171.639994",
        "t_52d94268-8810-4a7e-ba87-ffd657a6752f",
        "timeouts-1563566437171.639994",
        "a3226860758.html",
        "NC4WTmcy",
    ];

    #[test]
    fn negative_fixtures_are_not_gibberish() {
        let wrong: Vec<_> = NEGATIVE.iter().filter(|s| is_gibberish(s)).collect();
        assert!(wrong.is_empty(), "mistakenly gibberish: {wrong:?}");
    }

    #[test]
    fn positive_fixtures_are_gibberish() {
        let wrong: Vec<_> = POSITIVE.iter().filter(|s| !is_gibberish(s)).collect();
        assert!(wrong.is_empty(), "mistakenly not gibberish: {wrong:?}");
    }

    #[test]
    fn version_strings() {
        for version in ["1.0", "v2.1.3", "2.1.73", "v1", "1.0.0"] {
            assert!(is_version_string(version), "{version}");
        }
        for other in ["", "v", "1", "42", "version", "v1beta", "1.0-rc1"] {
            assert!(!is_version_string(other), "{other}");
        }
    }

    #[test]
    fn noise_level_of_plain_words_is_low() {
        assert_eq!(noise_level(""), 0.0);
        assert_eq!(noise_level("callback"), 0.0);
        assert!(noise_level("n63nd45qsj") >= NOISY_CHUNK_LEVEL);
        assert!(noise_level("GetCart") < NOISY_CHUNK_LEVEL);
    }
}
