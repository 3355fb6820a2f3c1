//! Unsafe browser API usage.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{preview, Check, Finding};
use crate::tokens::DesignSystem;

const RULE: &str = "security.unsafe_api";

const FORBIDDEN_SOURCES: &[(&str, &str)] = &[
    (r"\beval\s*\(", "Use of eval() is not allowed"),
    (
        r"\bnew\s+Function\s*\(",
        "Dynamic code via new Function() is not allowed",
    ),
    (
        r"\bdocument\s*\.\s*cookie\b",
        "Access to document.cookie is not allowed",
    ),
    (
        r"\b(localStorage|sessionStorage)\b",
        "Access to localStorage/sessionStorage is not allowed",
    ),
    (
        r"\.\s*(innerHTML|outerHTML)\s*=[^=]",
        "Direct innerHTML/outerHTML assignment is not allowed",
    ),
    (
        r"\bbypassSecurityTrust\w*\s*\(",
        "Bypassing Angular's DomSanitizer is not allowed",
    ),
    (
        r"\bnew\s+XMLHttpRequest\b",
        "Raw XMLHttpRequest is not allowed",
    ),
];

static FORBIDDEN: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    FORBIDDEN_SOURCES
        .iter()
        .filter_map(|(source, message)| Regex::new(source).ok().map(|re| (re, *message)))
        .collect()
});

static FETCH_CALL: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r#"\bfetch\s*\(\s*(?:['"`]([^'"`]*)['"`])?"#).ok());

/// Angular `HttpClient` verbs, optionally with a type argument.
static HTTP_CLIENT_CALL: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(
        r#"\bthis\s*\.\s*http\s*\.\s*(?:get|post|put|patch|delete|head|options|jsonp)\s*(?:<[^()]*>)?\s*\(\s*(?:['"`]([^'"`]*)['"`])?"#,
    )
    .ok()
});

/// `HttpClient.request(method, url)`: the URL is the second argument.
static HTTP_CLIENT_REQUEST: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(
        r#"\bthis\s*\.\s*http\s*\.\s*request\s*(?:<[^()]*>)?\s*\(\s*(?:['"`][A-Za-z]+['"`]\s*,\s*(?:['"`]([^'"`]*)['"`])?)?"#,
    )
    .ok()
});

/// Where a literal request URL points.
#[derive(Debug, PartialEq, Eq)]
enum Target {
    /// Same origin as the page.
    Relative,
    /// `scheme://host[:port]`, lowercased.
    Origin(String),
    /// `//host`: takes the page's scheme.
    SchemeRelative(String),
    /// Nothing the allow-list can vouch for (`data:`, interpolated hosts).
    Unverifiable,
}

fn host_of(rest: &str) -> Option<String> {
    let host = rest.split(['/', '\\', '?', '#']).next()?;
    (!host.is_empty()).then(|| host.to_lowercase())
}

/// `scheme://host[:port]` of an absolute URL, lowercased.
fn origin_of(url: &str) -> Option<String> {
    let (scheme, rest) = url.split_once("://")?;
    let host = host_of(rest)?;
    Some(format!("{}://{host}", scheme.to_lowercase()))
}

fn classify(url: &str) -> Target {
    let url = url.trim();
    let slashes = url.chars().take_while(|c| matches!(c, '/' | '\\')).count();
    if slashes >= 2 || url.starts_with('\\') {
        return host_of(&url[slashes..]).map_or(Target::Unverifiable, Target::SchemeRelative);
    }
    if url.is_empty() || slashes == 1 || url.starts_with("./") || url.starts_with("../") {
        return Target::Relative;
    }
    if url.contains("://") {
        return origin_of(url).map_or(Target::Unverifiable, Target::Origin);
    }
    let first_segment = url.split(['/', '?', '#']).next().unwrap_or_default();
    let plain = url.starts_with(|c: char| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
    if plain && !first_segment.contains(':') {
        Target::Relative
    } else {
        Target::Unverifiable
    }
}

/// Flags dangerous DOM and network calls.
///
/// Requests through `fetch` or Angular's `HttpClient` may target a path on the
/// page's own origin. An absolute or protocol-relative URL must belong to one
/// of the allowed origins, and a target that is not a string literal is
/// rejected since its origin cannot be checked.
#[derive(Debug, Clone, Default)]
pub struct UnsafeApiCheck {
    allowed_origins: Vec<String>,
}

impl UnsafeApiCheck {
    /// Permit requests to `allowed_origins` (`https://host[:port]`).
    #[must_use]
    pub fn new(allowed_origins: Vec<String>) -> Self {
        let allowed_origins = allowed_origins
            .into_iter()
            .map(|o| o.trim_end_matches('/').to_lowercase())
            .collect();
        Self { allowed_origins }
    }

    fn allows(&self, target: &Target) -> bool {
        match target {
            Target::Relative => true,
            Target::Origin(origin) => self.allowed_origins.contains(origin),
            Target::SchemeRelative(host) => ["https", "http"]
                .iter()
                .any(|scheme| self.allowed_origins.contains(&format!("{scheme}://{host}"))),
            Target::Unverifiable => false,
        }
    }

    fn check_requests(&self, re: Option<&Regex>, api: &str, code: &str) -> Vec<Finding> {
        let Some(re) = re else {
            return Vec::new();
        };

        re.captures_iter(code)
            .filter_map(|caps| {
                let call = caps.get(0).map_or(api, |m| m.as_str());
                let Some(url) = caps.get(1).map(|m| m.as_str()) else {
                    return Some(
                        Finding::hard_fail(
                            RULE,
                            format!("{api} with a computed URL is not allowed; use a literal URL"),
                        )
                        .with_offending(call),
                    );
                };
                let target = classify(url);
                if self.allows(&target) {
                    return None;
                }
                let message = match target {
                    Target::Origin(origin) => {
                        format!("{api} to non-allowed origin '{}'", preview(&origin, 80))
                    }
                    Target::SchemeRelative(host) => {
                        format!("{api} to non-allowed origin '//{}'", preview(&host, 80))
                    }
                    Target::Relative | Target::Unverifiable => format!(
                        "{api} to '{}' cannot be checked against the allowed origins",
                        preview(url, 80)
                    ),
                };
                Some(Finding::hard_fail(RULE, message).with_offending(url))
            })
            .collect()
    }
}

impl Check for UnsafeApiCheck {
    fn id(&self) -> &'static str {
        RULE
    }

    fn description(&self) -> &'static str {
        "No dynamic code, cookie or storage access, raw HTML injection or off-origin requests"
    }

    fn run(&self, code: &str, _tokens: &DesignSystem) -> Vec<Finding> {
        let mut findings: Vec<Finding> = FORBIDDEN
            .iter()
            .filter_map(|(re, message)| {
                re.find(code)
                    .map(|m| Finding::hard_fail(RULE, *message).with_offending(m.as_str().trim()))
            })
            .collect();
        findings.extend(self.check_requests(FETCH_CALL.as_ref(), "fetch()", code));
        findings.extend(self.check_requests(HTTP_CLIENT_CALL.as_ref(), "HttpClient", code));
        findings.extend(self.check_requests(
            HTTP_CLIENT_REQUEST.as_ref(),
            "HttpClient.request()",
            code,
        ));
        findings
    }
}
