//! Line-level structure of a block-style YAML document.
//!
//! The scanner recognizes just enough of the block syntax to locate
//! mapping keys, sequence entries and the lines each of them spans.
//! Anything it does not understand is reported as a layout error and
//! the caller falls back to re-rendering a larger region.

use crate::error::DocumentError;

/// A `key: value` line and the lines of its value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySpan {
    pub key: String,
    /// Line holding the key
    pub line: usize,
    /// Column where the key starts
    pub indent: usize,
    /// Byte offset of the `:` within the key line
    pub colon: usize,
    /// Last content line belonging to the value (inclusive)
    pub end: usize,
}

impl KeySpan {
    /// Whether the value continues below the key line
    pub fn has_children(&self) -> bool {
        self.end > self.line
    }
}

/// One `- ...` entry of a block sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemSpan {
    /// Line holding the dash
    pub line: usize,
    /// Column of the dash
    pub dash: usize,
    /// Column of the content following the dash on the same line
    pub content: Option<usize>,
    /// Last content line of the entry (inclusive)
    pub end: usize,
}

/// Pieces of the text that follows a key's colon
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Inline<'a> {
    /// Whitespace between the colon and the value
    pub lead: &'a str,
    /// The value token, without trailing whitespace
    pub value: &'a str,
    /// Trailing whitespace and comment, if any
    pub comment: &'a str,
}

impl Inline<'_> {
    /// Text to keep after a replacement value: the comment with its spacing
    pub fn trailing(&self) -> String {
        if !self.value.is_empty() || self.comment.is_empty() {
            return self.comment.to_string();
        }
        if self.lead.is_empty() {
            format!(" {}", self.comment)
        } else {
            format!("{}{}", self.lead, self.comment)
        }
    }
}

pub fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start_matches(' ').len()
}

/// Blank lines, comments, document markers and directives
pub fn is_trivia(line: &str) -> bool {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') || line.starts_with('%') {
        return true;
    }
    for marker in ["---", "..."] {
        if let Some(rest) = line.strip_prefix(marker) {
            let rest = rest.trim();
            if rest.is_empty() || rest.starts_with('#') {
                return true;
            }
        }
    }
    false
}

/// Whether `text` (starting at its indentation) opens a sequence entry
pub fn is_seq_entry(text: &str) -> bool {
    text == "-" || text.starts_with("- ") || text.starts_with("-\t")
}

/// Split `text` into its mapping key and the offset of the separating colon
pub fn split_key(text: &str) -> Option<(String, usize)> {
    let bytes = text.as_bytes();
    match *bytes.first()? {
        quote @ (b'"' | b'\'') => {
            let mut i = 1;
            while i < bytes.len() {
                let b = bytes[i];
                if quote == b'"' && b == b'\\' {
                    i += 2;
                    continue;
                }
                if b == quote {
                    if quote == b'\'' && bytes.get(i + 1) == Some(&b'\'') {
                        i += 2;
                        continue;
                    }
                    break;
                }
                i += 1;
            }
            if i >= bytes.len() {
                return None;
            }
            let mut colon = i + 1;
            while bytes.get(colon) == Some(&b' ') {
                colon += 1;
            }
            if bytes.get(colon) != Some(&b':') || !separates(text, colon) {
                return None;
            }
            let key = serde_yaml::from_str::<String>(&text[..=i]).ok()?;
            Some((key, colon))
        }
        b'#' | b'[' | b'{' | b'?' | b'|' | b'>' => None,
        _ => {
            let mut search = 0;
            while let Some(pos) = text[search..].find(':') {
                let colon = search + pos;
                if separates(text, colon) {
                    let key = text[..colon].trim_end();
                    if key.is_empty() || key.contains(" #") {
                        return None;
                    }
                    return Some((key.to_string(), colon));
                }
                search = colon + 1;
            }
            None
        }
    }
}

/// Column that the lines of a block scalar opened on `line` sit beyond
///
/// `col` is where the line's content starts. Returns `None` unless a key or
/// sequence entry on the line introduces a `|` or `>` scalar.
fn block_scalar_parent(line: &str, col: usize) -> Option<usize> {
    let mut col = col;
    loop {
        let text = line.get(col..)?;
        if is_seq_entry(text) {
            let after = &text[1..];
            let gap = after.len() - after.trim_start_matches([' ', '\t']).len();
            if gap == after.len() {
                return None;
            }
            let next = col + 1 + gap;
            if is_block_indicator(&line[next..]) {
                return Some(col);
            }
            col = next;
            continue;
        }
        let (_, colon) = split_key(text)?;
        return is_block_indicator(split_inline(&text[colon + 1..]).value).then_some(col);
    }
}

fn is_block_indicator(value: &str) -> bool {
    value.starts_with('|') || value.starts_with('>')
}

/// Whether `line` still belongs to a block scalar whose parent sits at `parent`
fn inside_block_scalar(line: &str, parent: usize) -> bool {
    line.trim().is_empty() || indent_of(line) > parent
}

fn separates(text: &str, colon: usize) -> bool {
    matches!(text.as_bytes().get(colon + 1), None | Some(b' ') | Some(b'\t'))
}

/// Split the text after a colon into value and trailing comment
pub fn split_inline(rest: &str) -> Inline<'_> {
    let lead_len = rest.len() - rest.trim_start_matches([' ', '\t']).len();
    let body = &rest[lead_len..];
    let bytes = body.as_bytes();
    let mut quote: Option<u8> = None;
    let mut cut = body.len();
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(b'"') => {
                if b == b'\\' {
                    i += 2;
                    continue;
                }
                if b == b'"' {
                    quote = None;
                }
            }
            Some(_) => {
                if b == b'\'' {
                    if bytes.get(i + 1) == Some(&b'\'') {
                        i += 2;
                        continue;
                    }
                    quote = None;
                }
            }
            None => {
                let at_token_start = i == 0 || matches!(bytes[i - 1], b' ' | b'\t');
                if b == b'#' && at_token_start {
                    cut = i;
                    break;
                }
                let opens = at_token_start || matches!(bytes[i - 1], b'[' | b'{' | b',');
                if (b == b'"' || b == b'\'') && opens {
                    quote = Some(b);
                }
            }
        }
        i += 1;
    }
    let value = body[..cut].trim_end();
    Inline {
        lead: &rest[..lead_len],
        value,
        comment: &body[value.len()..],
    }
}

/// Collect the keys of the block mapping whose keys sit at column `col`
///
/// Scanning covers lines `first..=last`. When `inline_first` is set the
/// first key shares its line with a sequence dash, so its column is taken
/// from `col` rather than from the line's indentation.
pub fn mapping_keys(
    lines: &[String],
    col: usize,
    first: usize,
    last: usize,
    inline_first: bool,
) -> Result<Vec<KeySpan>, DocumentError> {
    let mut keys: Vec<KeySpan> = Vec::new();
    if lines.is_empty() {
        return Ok(keys);
    }
    let mut block: Option<usize> = None;
    for (idx, line) in lines.iter().enumerate().take(last + 1).skip(first) {
        if let Some(parent) = block {
            if inside_block_scalar(line, parent) {
                if !line.trim().is_empty() {
                    if let Some(key) = keys.last_mut() {
                        key.end = idx;
                    }
                }
                continue;
            }
            block = None;
        }
        let indent = if idx == first && inline_first {
            col
        } else {
            if is_trivia(line) {
                continue;
            }
            indent_of(line)
        };
        if indent < col {
            return Err(DocumentError::layout(format!(
                "line {} is outdented inside a mapping",
                idx + 1
            )));
        }
        let text = &line[col..];
        if indent > col || is_seq_entry(text) {
            match keys.last_mut() {
                Some(key) => key.end = idx,
                None => {
                    return Err(DocumentError::layout(format!(
                        "line {} does not belong to any key",
                        idx + 1
                    )));
                }
            }
            block = block_scalar_parent(line, indent);
            continue;
        }
        let (key, colon) = split_key(text).ok_or_else(|| {
            DocumentError::layout(format!("line {} is not a block mapping key", idx + 1))
        })?;
        keys.push(KeySpan {
            key,
            line: idx,
            indent: col,
            colon: col + colon,
            end: idx,
        });
        block = block_scalar_parent(line, col);
    }
    Ok(keys)
}

/// Collect the entries of the block sequence spanning lines `first..=last`
pub fn sequence_items(
    lines: &[String],
    first: usize,
    last: usize,
) -> Result<Vec<ItemSpan>, DocumentError> {
    let mut items: Vec<ItemSpan> = Vec::new();
    let mut dash: Option<usize> = None;
    let mut block: Option<usize> = None;
    for (idx, line) in lines.iter().enumerate().take(last + 1).skip(first) {
        if let Some(parent) = block {
            if inside_block_scalar(line, parent) {
                if !line.trim().is_empty() {
                    if let Some(item) = items.last_mut() {
                        item.end = idx;
                    }
                }
                continue;
            }
            block = None;
        }
        if is_trivia(line) {
            continue;
        }
        let indent = indent_of(line);
        let column = *dash.get_or_insert(indent);
        if indent < column {
            return Err(DocumentError::layout(format!(
                "line {} is outdented inside a sequence",
                idx + 1
            )));
        }
        if indent > column {
            match items.last_mut() {
                Some(item) => item.end = idx,
                None => return Err(DocumentError::layout("sequence has no entries")),
            }
            block = block_scalar_parent(line, indent);
            continue;
        }
        let text = &line[column..];
        if !is_seq_entry(text) {
            return Err(DocumentError::layout(format!(
                "line {} is not a sequence entry",
                idx + 1
            )));
        }
        let after = &text[1..];
        let gap = after.len() - after.trim_start_matches([' ', '\t']).len();
        let rest = after.trim();
        let content = if rest.is_empty() || rest.starts_with('#') {
            None
        } else {
            Some(column + 1 + gap)
        };
        items.push(ItemSpan {
            line: idx,
            dash: column,
            content,
            end: idx,
        });
        block = block_scalar_parent(line, column);
    }
    Ok(items)
}

/// Keys of a sequence entry holding a block mapping
///
/// Returns `Ok(None)` when the entry holds something else, such as a flow
/// mapping or a scalar.
pub fn item_keys(lines: &[String], item: &ItemSpan) -> Result<Option<Vec<KeySpan>>, DocumentError> {
    match item.content {
        Some(col) => {
            if split_key(&lines[item.line][col..]).is_none() {
                return Ok(None);
            }
            mapping_keys(lines, col, item.line, item.end, true).map(Some)
        }
        None => {
            let first = (item.line + 1..=item.end).find(|&idx| !is_trivia(&lines[idx]));
            match first {
                Some(first) => {
                    let col = indent_of(&lines[first]);
                    if split_key(&lines[first][col..]).is_none() {
                        return Ok(None);
                    }
                    mapping_keys(lines, col, first, item.end, false).map(Some)
                }
                None => Ok(None),
            }
        }
    }
}

/// Offset of sequence dashes relative to their owning key, as used by the
/// document; two spaces when the document has no block sequence yet.
pub fn detect_seq_offset(lines: &[String]) -> usize {
    for (idx, line) in lines.iter().enumerate() {
        if is_trivia(line) {
            continue;
        }
        let indent = indent_of(line);
        let text = &line[indent..];
        let Some((_, colon)) = split_key(text) else {
            continue;
        };
        if !split_inline(&text[colon + 1..]).value.is_empty() {
            continue;
        }
        let next = lines[idx + 1..].iter().find(|l| !is_trivia(l));
        if let Some(next) = next {
            let next_indent = indent_of(next);
            if next_indent >= indent && is_seq_entry(&next[next_indent..]) {
                return next_indent - indent;
            }
        }
    }
    2
}
