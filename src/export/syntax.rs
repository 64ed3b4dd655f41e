//! Identifier utilities and text clean-up
//!
//! Pure functions over strings: identifier shape checks, property-line
//! detection, outliner markup stripping, slugs and Markdown whitespace
//! normalisation.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

const UUID: &str = r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}";

/// `[[UUID]]`
pub(crate) static PAGE_REF: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"\[\[({})\]\]", UUID)).unwrap());

/// `((UUID))`
pub(crate) static BLOCK_REF: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"\(\(({})\)\)", UUID)).unwrap());

/// Bare UUID; the preceding-character guard is applied by the caller
pub(crate) static BARE_UUID: Lazy<Regex> = Lazy::new(|| Regex::new(&format!("({})", UUID)).unwrap());

static EXACT_UUID: Lazy<Regex> = Lazy::new(|| Regex::new(&format!("^{}$", UUID)).unwrap());

/// `![alt](../assets/file.ext)` or `[alt](../assets/file.ext)`
pub(crate) static RELATIVE_ASSET_LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(!?)\[([^\]]*)\]\(\.\./assets/([^)\s]+)\)").unwrap());

/// `key:: value` on a line of its own
static PROPERTY_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[ \t]*:?[\w\-./]+::(?:[ \t].*)?$").unwrap());

static PROPERTY_LINES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[ \t]*:?[\w\-./]+::(?:[ \t].*)?(?:\r?\n|$)").unwrap());

static PLANNING_LINES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[ \t]*(?:SCHEDULED|DEADLINE):[ \t]*<[^>\n]*>[ \t]*(?:\r?\n|$)").unwrap()
});

static TASK_KEYWORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?m)^([ \t]*)(?:TODO|DOING|DONE|LATER|NOW|WAITING|WAIT|CANCELED|CANCELLED|IN-PROGRESS)(?:[ \t]+|$)",
    )
    .unwrap()
});

static PRIORITY: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[#[A-Ca-c]\][ \t]*").unwrap());

static EMBED_MACRO: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{\{embed[ \t]+(.+?)\}\}").unwrap());

static QUERY_MACRO: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{(?:query|renderer)[ \t][^}]*\}\}").unwrap());

const TAG_BODY: &str = r"#(?:\[\[[^\]\n]+\]\]|[^\s#\[\]\(\),;!?]+)";

/// Tag opening a line, with the spaces after it
static LEADING_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"(?m)^{}[ \t]*", TAG_BODY)).unwrap());

static TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"(?m)(^|[ \t]){}", TAG_BODY)).unwrap());

static LINK_BRACKETS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[\[([^\[\]\n]+)\]\]").unwrap());

static INNER_SPACES: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\S)[ \t]{2,}(\S)").unwrap());

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

static NON_SLUG: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9-]").unwrap());

/// Returns true if `s` is exactly an identifier
pub fn is_uuid(s: &str) -> bool {
    EXACT_UUID.is_match(s)
}

/// First 8 characters of an identifier
pub fn short_id(id: &str) -> &str {
    id.char_indices().nth(8).map_or(id, |(i, _)| &id[..i])
}

/// True when the character before `offset` blocks bare-identifier resolution.
///
/// Paths, slugs and compound tokens (`/`, `-`, `_`) are left alone; anything
/// else, letters and digits included, does not block.
pub(crate) fn preceded_by_separator(text: &str, offset: usize) -> bool {
    matches!(text[..offset].chars().next_back(), Some('/' | '-' | '_'))
}

/// Returns true if every non-blank line is a `key:: value` declaration
pub fn is_property_only(content: &str) -> bool {
    let mut lines = content.lines().filter(|l| !l.trim().is_empty()).peekable();
    lines.peek().is_some() && lines.all(|l| PROPERTY_LINE.is_match(l))
}

/// Removes outliner markup from block text.
///
/// Unwraps `{{embed ..}}`, drops query/renderer macros, inline property lines,
/// planning lines, task keywords and priorities, optionally drops tags, and
/// unwraps `[[Page]]` links whose target is not an identifier.
pub fn strip_logseq_syntax(text: &str, include_tags: bool) -> String {
    let text = EMBED_MACRO.replace_all(text, "$1");
    let text = QUERY_MACRO.replace_all(&text, "");
    let text = PROPERTY_LINES.replace_all(&text, "");
    let text = PLANNING_LINES.replace_all(&text, "");
    let text = TASK_KEYWORD.replace_all(&text, "$1");
    let text = PRIORITY.replace_all(&text, "");

    let text = if include_tags {
        text
    } else {
        let stripped = LEADING_TAG.replace_all(&text, "");
        let stripped = TAG.replace_all(&stripped, "$1");
        std::borrow::Cow::Owned(INNER_SPACES.replace_all(&stripped, "$1 $2").into_owned())
    };

    let text = LINK_BRACKETS.replace_all(&text, |caps: &Captures| {
        let inner = &caps[1];
        if is_uuid(inner) {
            caps[0].to_string()
        } else {
            inner.to_string()
        }
    });

    text.lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// URL-friendly slug: lowercase, whitespace runs become `-`, anything
/// outside `[a-z0-9-]` is dropped
pub fn slugify(name: &str) -> String {
    let lower = name.trim().to_lowercase();
    let hyphenated = WHITESPACE_RUN.replace_all(&lower, "-");
    NON_SLUG.replace_all(&hyphenated, "").into_owned()
}

/// Normalises whitespace in generated Markdown.
///
/// Trailing spaces are trimmed, blank-line runs collapse to one and leading
/// and trailing blank lines are dropped. Fenced code is left untouched.
pub fn normalize_markdown(text: &str) -> String {
    let mut lines: Vec<&str> = Vec::new();
    let mut in_fence = false;
    let mut prev_blank = true;

    for line in text.lines() {
        let is_fence = line.trim_start().starts_with("```");

        if in_fence && !is_fence {
            lines.push(line);
            prev_blank = false;
            continue;
        }
        if is_fence {
            in_fence = !in_fence;
        }

        let line = line.trim_end();
        if line.is_empty() {
            if prev_blank {
                continue;
            }
            prev_blank = true;
        } else {
            prev_blank = false;
        }
        lines.push(line);
    }

    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }

    lines.join("\n")
}
