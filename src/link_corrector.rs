//! Repair or reject hyperlink and media targets found in article markup
//!
//! Links in scraped news HTML are frequently relative, doubled
//! (`http://web.archive.org/...` style or plain concatenation), carry
//! encoding debris, or are not links at all but prose that ended up in an
//! `href`. [`correct_link`] returns an absolute, single URL or `None` when the
//! value cannot be interpreted as one.

use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;
use url::Url;

static URL_ENDSWITH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^.*\.(hu|com|org|ro|eu)$").expect("BUG: hardcoded domain suffix regex is invalid")
});

/// Literal fix-ups applied in order before any structural check.
const REPLACE_IN_URL: [(&str, &str); 25] = [
    ("%2F", "/"),
    ("%&", "%25&"),
    ("[", "%5B"),
    ("]", "%5D"),
    ("%?", "%25?"),
    ("%20", "%20"),
    ("%3D", "="),
    ("%3A//", "://"),
    ("://://", "://"),
    ("http://ttp://", "http://"),
    ("http://ttps://", "https://"),
    ("\"ttp:", "http:"),
    ("\\", ""),
    ("Http", "http"),
    ("http//www.", "http://www."),
    ("\"", ""),
    ("http://tp://", "http://"),
    ("http://ps://", "http://"),
    ("https://ftp://", "https://"),
    ("https://ttp://", "https://"),
    (": ", "%3A "),
    ("https://ttps://", "https://"),
    (".hu:", ".hu"),
    ("http%2", ""),
    (".com:", ".com"),
];

/// Portal context of a link.
#[derive(Debug, Clone, Copy)]
pub struct LinkContext<'a> {
    /// Prepended to site-relative links (`/rovat/cikk`)
    pub url_prefix: &'a str,
    /// Links matching this pattern at their start are rejected
    pub reject: Option<&'a Regex>,
    /// Attribute key the link was read from (`href`, `data-youtube`, ...)
    pub source_key: &'a str,
}

/// What happened to a link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkOutcome {
    Unchanged(String),
    Corrected { target: String, original: String },
    Rejected { original: String },
}

impl LinkOutcome {
    #[must_use]
    pub fn target(&self) -> Option<&str> {
        match self {
            LinkOutcome::Unchanged(target) | LinkOutcome::Corrected { target, .. } => Some(target),
            LinkOutcome::Rejected { .. } => None,
        }
    }

    #[must_use]
    pub fn original(&self) -> Option<&str> {
        match self {
            LinkOutcome::Unchanged(_) => None,
            LinkOutcome::Corrected { original, .. } | LinkOutcome::Rejected { original } => {
                Some(original)
            }
        }
    }
}

#[must_use]
pub fn classify_link(link: &str, ctx: &LinkContext<'_>) -> LinkOutcome {
    match correct_link(link, ctx) {
        None => LinkOutcome::Rejected {
            original: link.to_string(),
        },
        Some(corrected) if corrected == link => LinkOutcome::Unchanged(corrected),
        Some(corrected) => LinkOutcome::Corrected {
            target: corrected,
            original: link.to_string(),
        },
    }
}

fn tail(s: &str, from: usize) -> &str {
    s.get(from..).unwrap_or(s)
}

fn is_alpha(s: &str) -> bool {
    !s.is_empty() && s.chars().all(char::is_alphabetic)
}

/// First of the longest candidates.
fn longest<'a>(candidates: impl DoubleEndedIterator<Item = &'a str>) -> Option<&'a str> {
    candidates.rev().max_by_key(|c| c.chars().count())
}

fn expand_relative(link: &str, ctx: &LinkContext<'_>) -> String {
    let mut link = link.to_string();
    for (from, to) in REPLACE_IN_URL {
        if link.contains(from) {
            link = link.replace(from, to);
        }
    }
    let link = link.trim();
    if link.starts_with('/') {
        let resolved = if link.starts_with("//") {
            Url::parse(&format!("https:{link}"))
        } else {
            Url::parse(ctx.url_prefix).and_then(|base| base.join(link))
        };
        match resolved {
            Ok(resolved) => resolved.to_string(),
            Err(_) => link.to_string(),
        }
    } else if !link.contains(['/', '.']) && ctx.source_key.contains("youtube") {
        format!("https://www.youtube.com/watch?v={link}")
    } else if !link.contains(['/', '.']) && ctx.source_key.contains("vimeo") {
        format!("https://vimeo.com/{link}")
    } else {
        link.to_string()
    }
}

/// Pick one link out of doubled or concatenated values.
fn split_doubled(link: String, ctx: &LinkContext<'_>) -> Option<String> {
    let http_count = link.matches("http").count();
    let spaced = link.contains(' ') && !link.ends_with(".pdf");
    if !((http_count > 1 || spaced) && !link.contains("web.archive")) {
        return Some(link);
    }

    let with_http: Vec<&str> = link.split_whitespace().filter(|t| t.contains("http")).collect();
    match with_http.len() {
        0 => None,
        1 => {
            let schemes = link.matches("http:").count() + link.matches("https:").count();
            let embedded = link.matches("=http").count() + link.matches("-http").count();
            if http_count > 1 && schemes.saturating_sub(embedded) > 1 {
                let candidates: Vec<String> = link
                    .split("http")
                    .filter(|part| !part.is_empty())
                    .map(|part| format!("http{part}"))
                    .filter(|candidate| correct_link(candidate, ctx).is_some())
                    .collect();
                longest(candidates.iter().map(String::as_str)).map(str::to_string)
            } else {
                Some(link)
            }
        }
        _ => longest(with_http.into_iter()).map(str::to_string),
    }
}

/// Return the repaired absolute link, or `None` when it is not a usable URL.
#[must_use]
pub fn correct_link(link: &str, ctx: &LinkContext<'_>) -> Option<String> {
    let link = link.trim();
    if link.starts_with('<') || link.contains("file://") {
        return None;
    }
    if ctx
        .reject
        .is_some_and(|re| re.find(link).is_some_and(|m| m.start() == 0))
    {
        return None;
    }

    let mut link = expand_relative(link, ctx);

    if link.matches("http").count() > 1 {
        // Short junk in front of the real link: "http://http://..."
        let offset = link
            .find("http")
            .and_then(|first| tail(&link, first + 1).find("http"));
        if let Some(offset) = offset.filter(|o| *o < 11) {
            link = tail(&link, offset + 1).to_string();
        }
        if link.ends_with(')') {
            link.pop();
        }
    }

    if link.matches('#').count() > 1 {
        while link.ends_with('#') {
            link.pop();
        }
        if let Some(hash) = link.find('#') {
            link = format!("{}{}", &link[..=hash], link[hash + 1..].replace('#', "%23"));
        }
    }
    if let Some(cut) = link.find("|||") {
        link.truncate(cut);
    }
    if link.ends_with('%') {
        link.pop();
    }
    if link.contains("edit#gid=") {
        if let Some(cut) = link.find("#gid=") {
            link.truncate(cut);
        }
    }
    if let Some(cut) = link.find("&amp;width=") {
        link.truncate(cut);
    }

    match (link.find("http"), link.find("www")) {
        (None, Some(www)) if www > 0 => link = link[www..].to_string(),
        (Some(http), _) if http > 0 => link = link[http..].to_string(),
        (None, None) if !link.contains('/') => {
            if URL_ENDSWITH.is_match(&link) && !link.contains("mailto") {
                link = format!("https://{link}");
            } else {
                return None;
            }
        }
        _ => {}
    }

    let mut link = split_doubled(link, ctx)?;

    let slashes = link.matches('/').count();
    if link.ends_with('.') {
        return None;
    }

    if link.contains(' ') && !link.ends_with(".pdf") && slashes < 3 {
        let repaired = link.replace(" - ", "-").replace("/ ", "/").replace("- ", "-");
        if repaired == link || repaired.contains(' ') {
            return None;
        }
        link = repaired;
    }

    if link.ends_with("./") || is_alpha(&link) {
        return None;
    }
    let url = web_url(&link)?;
    if slashes < 3 && !url.host_str().is_some_and(|host| host.contains('.')) {
        return None;
    }
    Some(link.replace('\n', ""))
}

/// Parse an `http(s)` link; a bare `www.` link is read as `https`.
fn web_url(link: &str) -> Option<Url> {
    let absolute = if link.starts_with("www") {
        Cow::Owned(format!("https://{link}"))
    } else {
        Cow::Borrowed(link)
    };
    let url = Url::parse(&absolute).ok()?;
    matches!(url.scheme(), "http" | "https").then_some(url)
}
