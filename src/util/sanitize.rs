use regex::Regex;
use std::borrow::Cow;
use std::sync::OnceLock;

/// Elements that break text flow; replaced by a space.
fn block_tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?is)<!--.*?-->|</?(?:p|br|div|li|ul|ol|h[1-6]|hr|table|tr|td|th|blockquote|pre|section|article|header|footer|figure|figcaption)\b[^>]*>",
        )
        .expect("static regex")
    })
}

/// Inline elements; removed without a gap so "<b>one</b>." stays "one.".
fn inline_tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)</?(?:a|abbr|b|big|cite|code|del|em|font|i|img|ins|kbd|mark|q|s|small|span|strike|strong|sub|sup|time|u|var|wbr)\b[^>]*>",
        )
        .expect("static regex")
    })
}

fn ansi_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\x1B\[[0-9;?]*[ -/]*[@-~]").expect("static regex"))
}

/// Only known HTML elements count as tags, so text like "Vec<T>" or
/// "a < b and c > d" survives.
fn strip_tags(s: &str) -> Cow<'_, str> {
    match block_tag_re().replace_all(s, " ") {
        Cow::Borrowed(b) => inline_tag_re().replace_all(b, ""),
        Cow::Owned(o) => Cow::Owned(inline_tag_re().replace_all(&o, "").into_owned()),
    }
}

fn collapse(s: &str) -> String {
    let no_ansi = ansi_re().replace_all(s, "");
    let mut cleaned = String::with_capacity(no_ansi.len());
    for ch in no_ansi.chars() {
        if ch.is_whitespace() {
            cleaned.push(' ');
        } else if !ch.is_control() {
            cleaned.push(ch);
        }
    }
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Turn untrusted feed markup into one line of plain text: tags removed,
/// entities decoded, control characters dropped, whitespace collapsed.
/// Entities are decoded after stripping, so escaped brackets stay text.
pub fn plain_text(s: &str) -> String {
    let no_tags = strip_tags(s);
    collapse(&html_escape::decode_html_entities(&no_tags))
}

/// As [`plain_text`], plus a second strip after decoding for entry bodies
/// that carry entity-escaped markup such as "&lt;p&gt;".
pub fn plain_body(s: &str) -> String {
    let no_tags = strip_tags(s);
    let decoded = html_escape::decode_html_entities(&no_tags);
    collapse(&strip_tags(&decoded))
}

/// First `n` sentences of already plain text. A sentence ends at `.`, `!`
/// or `?` followed by a space.
pub fn excerpt(text: &str, n: usize) -> Option<String> {
    let text = text.trim();
    if text.is_empty() || n == 0 {
        return None;
    }
    let mut ends = 0;
    let mut prev_terminal = false;
    for (i, ch) in text.char_indices() {
        if prev_terminal && ch == ' ' {
            ends += 1;
            if ends == n {
                return Some(text[..i].trim_end().to_string());
            }
        }
        prev_terminal = matches!(ch, '.' | '!' | '?');
    }
    Some(text.to_string())
}

/// Cap text at `max` characters, marking the cut with an ellipsis.
pub fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max.saturating_sub(1)).collect();
    out.truncate(out.trim_end().len());
    out.push('…');
    out
}
