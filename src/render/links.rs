// src/render/links.rs
use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

/// Host of the legacy blog whose absolute links become site-relative.
pub const DEFAULT_LEGACY_HOST: &str = "blog.fashionphile.com";

pub const SIGN_IN_PATH: &str = "/pages/sign-in";
pub const SIGN_UP_PATH: &str = "/pages/sign-up";

static SIGN_IN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)sign[-_]?in|log[-_]?in").expect("Failed to compile SIGN_IN_RE"));

static SIGN_UP_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)sign[-_]?up|register|create[-_]?account").expect("Failed to compile SIGN_UP_RE")
});

/// How hrefs are rewritten on the way out.
#[derive(Debug, Clone)]
pub struct LinkPolicy {
    pub legacy_hosts: Vec<String>,
}

impl Default for LinkPolicy {
    fn default() -> Self {
        Self { legacy_hosts: vec![DEFAULT_LEGACY_HOST.to_string()] }
    }
}

impl LinkPolicy {
    fn is_legacy_host(&self, host: &str) -> bool {
        self.legacy_hosts.iter().any(|legacy| legacy.eq_ignore_ascii_case(host))
    }

    /// Legacy blog links become relative paths; sign-in/sign-up links point
    /// at the canonical account pages.
    pub fn rewrite_href(&self, href: &str) -> String {
        let href = href.trim();
        let mut rewritten = href.to_string();

        if is_external(href) {
            if let Ok(parsed) = Url::parse(href) {
                if parsed.host_str().map_or(false, |host| self.is_legacy_host(host)) {
                    rewritten = relative_part(&parsed);
                    tracing::trace!("Rewrote legacy blog link {} -> {}", href, rewritten);
                }
            }
        }

        if SIGN_IN_RE.is_match(&rewritten) {
            return SIGN_IN_PATH.to_string();
        }
        if SIGN_UP_RE.is_match(&rewritten) {
            return SIGN_UP_PATH.to_string();
        }
        rewritten
    }
}

fn relative_part(url: &Url) -> String {
    let mut relative = url.path().to_string();
    if let Some(query) = url.query() {
        relative.push('?');
        relative.push_str(query);
    }
    if let Some(fragment) = url.fragment() {
        relative.push('#');
        relative.push_str(fragment);
    }
    relative
}

/// Absolute http(s) links open in a new tab.
pub fn is_external(href: &str) -> bool {
    let lower = href.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// ` target="_blank" rel="noopener noreferrer"` for external links, else empty.
pub fn new_tab_attrs(href: &str) -> &'static str {
    if is_external(href) {
        r#" target="_blank" rel="noopener noreferrer""#
    } else {
        ""
    }
}
