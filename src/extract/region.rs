//! Balanced-depth region extraction
//!
//! Upstream markup is not reliable enough to justify a full parse for the
//! regions we need, so regions are located by their opening tag's class
//! tokens and closed by counting nested tags of the same element type. This
//! module is the only place that knows how; callers go through
//! `extract_balanced_region` and the text helpers below.

use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;

static OPEN_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<([A-Za-z][A-Za-z0-9-]*)(\s[^>]*)?>").unwrap());

static CLASS_ATTR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)(?:^|\s)class\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#).unwrap()
});

static DROPPED_BLOCKS: Lazy<Vec<Regex>> = Lazy::new(|| {
    ["script", "style", "form", "button"]
        .iter()
        .map(|tag| Regex::new(&format!(r"(?is)<{tag}\b[^>]*>.*?</{tag}\s*>")).unwrap())
        .collect()
});

static DROPPED_TAGS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)</?(?:script|style|form|input|button)\b[^>]*>").unwrap());

static LINE_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<br\s*/?>").unwrap());

static ANY_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());

static BLANK_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n(?:[ \t]*\n){2,}").unwrap());

/// Matches an opening tag by the class tokens it carries
#[derive(Debug, Clone)]
pub struct OpenTagPattern {
    class_tokens: Vec<String>,
}

impl OpenTagPattern {
    /// Matches tags whose `class` attribute contains every token
    pub fn with_classes<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            class_tokens: tokens.into_iter().map(|t| t.as_ref().to_string()).collect(),
        }
    }

    fn matches(&self, attributes: &str) -> bool {
        let Some(caps) = CLASS_ATTR.captures(attributes) else {
            return false;
        };
        let classes = caps
            .get(1)
            .or_else(|| caps.get(2))
            .or_else(|| caps.get(3))
            .map(|m| m.as_str())
            .unwrap_or("");

        self.class_tokens
            .iter()
            .all(|token| classes.split_whitespace().any(|c| c == token))
    }
}

/// Location of a matched opening tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenTag {
    pub name: String,
    pub start: usize,
    pub end: usize,
}

/// Byte offsets of a balanced region within the scanned HTML
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    pub tag: String,
    /// Start of the opening tag
    pub outer_start: usize,
    /// First byte after the opening tag
    pub inner_start: usize,
    /// Start of the matching closing tag
    pub inner_end: usize,
    /// First byte after the matching closing tag
    pub outer_end: usize,
}

impl Region {
    /// The markup between the opening and closing tags
    pub fn inner<'h>(&self, html: &'h str) -> &'h str {
        &html[self.inner_start..self.inner_end]
    }
}

/// Finds the first opening tag matching `pattern`
pub fn find_open_tag(html: &str, pattern: &OpenTagPattern) -> Option<OpenTag> {
    OPEN_TAG.captures_iter(html).find_map(|caps| {
        let whole = caps.get(0)?;
        let attributes = caps.get(2).map(|m| m.as_str()).unwrap_or("");
        if !pattern.matches(attributes) {
            return None;
        }
        Some(OpenTag {
            name: caps[1].to_ascii_lowercase(),
            start: whole.start(),
            end: whole.end(),
        })
    })
}

/// Scans from `from` for the close that balances an already open `tag`
///
/// Returns `(close_start, close_end)`, or `None` if input runs out first.
fn find_balancing_close(html: &str, tag: &str, from: usize) -> Option<(usize, usize)> {
    let same_type = Regex::new(&format!(r"(?i)<(/?){}\b[^>]*>", regex::escape(tag))).ok()?;
    let mut depth: usize = 1;

    for caps in same_type.captures_iter(&html[from..]) {
        let whole = caps.get(0)?;
        let closing = caps.get(1).map_or(false, |m| !m.as_str().is_empty());

        if closing {
            depth -= 1;
            if depth == 0 {
                return Some((from + whole.start(), from + whole.end()));
            }
        } else if !whole.as_str().ends_with("/>") {
            depth += 1;
        }
    }

    None
}

/// Extracts the first region whose opening tag matches `pattern`
///
/// Returns `None` when no tag matches or when the region never closes; a
/// partial region is never returned.
pub fn extract_balanced_region(html: &str, pattern: &OpenTagPattern) -> Option<Region> {
    let open = find_open_tag(html, pattern)?;
    let (inner_end, outer_end) = find_balancing_close(html, &open.name, open.end)?;

    Some(Region {
        tag: open.name,
        outer_start: open.start,
        inner_start: open.end,
        inner_end,
        outer_end,
    })
}

/// Removes the first block matching `pattern` from `fragment`
///
/// If the block cannot be balanced only its opening tag is removed, so the
/// label's own markup never leaks into the output.
pub fn strip_labelled_block<'f>(fragment: &'f str, pattern: &OpenTagPattern) -> Cow<'f, str> {
    let (start, end) = match extract_balanced_region(fragment, pattern) {
        Some(region) => (region.outer_start, region.outer_end),
        None => match find_open_tag(fragment, pattern) {
            Some(open) => (open.start, open.end),
            None => return Cow::Borrowed(fragment),
        },
    };

    let mut stripped = String::with_capacity(fragment.len() - (end - start));
    stripped.push_str(&fragment[..start]);
    stripped.push_str(&fragment[end..]);
    Cow::Owned(stripped)
}

/// Decodes the handful of entities that show up in seller text
pub fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#039;", "'")
        .replace("&amp;", "&")
}

/// Converts a markup fragment to plain text
///
/// Interactive and script content is dropped, `<br>` becomes a newline, all
/// other tags are removed, and runs of blank lines collapse to one.
pub fn html_to_text(fragment: &str) -> String {
    let mut text = fragment.replace("\r\n", "\n");
    for block in DROPPED_BLOCKS.iter() {
        text = block.replace_all(&text, "").into_owned();
    }
    let text = DROPPED_TAGS.replace_all(&text, "");
    let text = LINE_BREAK.replace_all(&text, "\n");
    let text = ANY_TAG.replace_all(&text, "");
    let text = decode_entities(&text);
    BLANK_RUN.replace_all(&text, "\n\n").into_owned()
}

/// Flattens a fragment to one trimmed text line per tag-separated piece
pub fn flatten_lines(fragment: &str) -> String {
    let text = ANY_TAG.replace_all(fragment, "\n");
    decode_entities(&text)
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Cuts `text` to at most `max_bytes`, ending on a line boundary
///
/// Falls back to the last character boundary when the first line alone is
/// longer than the cap.
pub fn truncate_at_line(text: &str, max_bytes: usize) -> &str {
    if text.len() <= max_bytes {
        return text;
    }

    let mut end = max_bytes;
    while !text.is_char_boundary(end) {
        end -= 1;
    }

    if text.as_bytes()[end] == b'\n' {
        return &text[..end];
    }

    let head = &text[..end];
    match head.rfind('\n') {
        Some(newline) => &head[..newline],
        None => head,
    }
}
