//! Data-mesh path grammar.
//!
//! Notebook paths encode the mesh hierarchy as directory segments:
//!
//! ```text
//! .../domains/<domain>/projects/<project>/<activity>/<flowtype>/<flow>/...
//! .../orgs/<org>/domains/<domain>/projects/<project>/...
//! ```
//!
//! where `<activity>` is typically `flows` or `explore` and `<flowtype>` a
//! subdirectory such as `prep` or `ml`. Matching is case-insensitive and
//! uses contains-semantics: arbitrary prefix and suffix text around the mesh
//! segments is fine.
//!
//! Parsing never fails. A path outside the mesh structure (an ad-hoc
//! notebook under `/Users/...`, say) yields an all-empty [`ParsedPath`], and
//! every name derived from the path becomes the empty string downstream.

use std::sync::LazyLock;

use regex::Regex;

static BASE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)/domains/([^/]+)/projects/([^/]+)/.+").expect("valid regex")
});
static BASE_ORG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)/orgs?/([^/]+)/domains/([^/]+)/projects/([^/]+)/.+").expect("valid regex")
});
static FLOW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)/domains/[^/]+/projects/[^/]+/([^/]+)/([^/]+)/([^/]+)").expect("valid regex")
});
static FLOW_SHORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)/domains/[^/]+/projects/[^/]+/([^/]+)/([^/]+)").expect("valid regex")
});
static ORG_SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)/orgs?/").expect("valid regex"));

/// Structured form of a mesh path. All fields default to empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedPath {
    /// Organization segment, only present with the org-aware grammar.
    pub org: Option<String>,
    /// Domain segment.
    pub domain: String,
    /// Project segment.
    pub project: String,
    /// Activity segment, e.g. `flows` or `explore`.
    pub activity: Option<String>,
    /// Flow-type segment, e.g. `prep` or `ml`; empty when the path has only
    /// two levels below the project.
    pub flowtype: String,
    /// Flow name (usually the notebook's folder).
    pub flow: String,
}

impl ParsedPath {
    /// Whether the base grammar failed to match.
    pub fn is_empty(&self) -> bool {
        self.domain.is_empty() && self.project.is_empty()
    }

    /// Field accessor by placeholder name, empty for absent optionals.
    pub fn field(&self, name: &str) -> &str {
        match name {
            "org" => self.org.as_deref().unwrap_or_default(),
            "domain" => &self.domain,
            "project" => &self.project,
            "activity" => self.activity.as_deref().unwrap_or_default(),
            "flowtype" => &self.flowtype,
            "flow" => &self.flow,
            _ => "",
        }
    }
}

/// Parse a path with explicit org-awareness.
///
/// With `want_org` the org-prefixed grammar must match; without it the org
/// segment is ignored entirely. A failed base match yields the empty record.
pub fn parse(path: &str, want_org: bool) -> ParsedPath {
    let mut parsed = ParsedPath::default();
    if want_org {
        let Some(caps) = BASE_ORG.captures(path) else {
            return parsed;
        };
        parsed.org = Some(caps[1].to_string());
        parsed.domain = caps[2].to_string();
        parsed.project = caps[3].to_string();
    } else {
        let Some(caps) = BASE.captures(path) else {
            return parsed;
        };
        parsed.domain = caps[1].to_string();
        parsed.project = caps[2].to_string();
    }
    parse_flow(path, parsed)
}

/// Parse a path, detecting org-awareness from an `/org/` or `/orgs/` segment.
pub fn parse_auto(path: &str) -> ParsedPath {
    parse(path, ORG_SEGMENT.is_match(path))
}

/// Recover activity, flowtype and flow from the segments below the project.
/// With only two levels present, assume no flowtype.
fn parse_flow(path: &str, mut parsed: ParsedPath) -> ParsedPath {
    if let Some(caps) = FLOW.captures(path) {
        parsed.activity = Some(caps[1].to_string());
        parsed.flowtype = caps[2].to_string();
        parsed.flow = caps[3].to_string();
        return parsed;
    }
    if let Some(caps) = FLOW_SHORT.captures(path) {
        parsed.activity = Some(caps[1].to_string());
        parsed.flow = caps[2].to_string();
    }
    parsed
}
