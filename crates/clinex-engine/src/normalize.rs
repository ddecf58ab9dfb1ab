//! Text normalization helpers used by every pipeline stage

/// Collapse all whitespace runs (including NBSP) to single spaces and
/// trim. Used for snippet text and evidence strings.
pub(crate) fn clean_text(text: &str) -> String {
    text.replace('\u{a0}', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Collapse whitespace within lines while keeping line structure, so
/// the heading detector still sees standalone lines. Line offsets refer
/// to the returned text.
pub(crate) fn normalize_lines(text: &str) -> String {
    text.replace('\u{a0}', " ")
        .lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Normalize curly quote glyphs to their ASCII forms
pub(crate) fn normalize_quotes(text: &str) -> String {
    text.replace(['\u{201c}', '\u{201d}'], "\"").replace('\u{2019}', "'")
}

/// Truncate to at most `limit` characters, appending an ellipsis when
/// anything was cut. Char-based, never splits a code point.
pub(crate) fn truncate(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let kept: String = text.chars().take(limit.saturating_sub(3)).collect();
    format!("{}...", kept)
}

/// Deduplicate case-insensitively while preserving first-seen order;
/// empty entries are dropped.
pub(crate) fn unique_preserve_order<I, S>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = std::collections::HashSet::new();
    let mut result = Vec::new();
    for value in values {
        let value = value.as_ref();
        if value.is_empty() {
            continue;
        }
        let key = value.trim().to_lowercase();
        if seen.insert(key) {
            result.push(value.to_string());
        }
    }
    result
}

/// Overlapping sliding windows of `window` chars advancing by `step`
/// chars. Returns (byte offset, slice) pairs; text no longer than one
/// window yields itself as the single window.
pub(crate) fn sliding_windows(text: &str, window: usize, step: usize) -> Vec<(usize, &str)> {
    // Byte offset of every char boundary, plus the end.
    let mut boundaries: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
    boundaries.push(text.len());
    let char_len = boundaries.len() - 1;

    if window == 0 || char_len <= window {
        return vec![(0, text)];
    }

    let mut windows = Vec::new();
    let mut idx = 0;
    while idx < char_len {
        let start = boundaries[idx];
        let end = boundaries[(idx + window).min(char_len)];
        windows.push((start, &text[start..end]));
        if idx + window >= char_len {
            break;
        }
        idx += step;
    }
    windows
}
