//! Block-style YAML rendering for values inserted into an existing document.
//!
//! Only the lines that change are rendered here; everything else in the
//! document keeps its original text.

use serde_yaml::{Mapping, Value};

/// Quoting style of a scalar as it appears in the source text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteStyle {
    Plain,
    Single,
    Double,
}

impl QuoteStyle {
    /// Detect the style of an inline scalar token
    pub fn of(token: &str) -> Self {
        if token.starts_with('"') {
            QuoteStyle::Double
        } else if token.starts_with('\'') {
            QuoteStyle::Single
        } else {
            QuoteStyle::Plain
        }
    }
}

/// Renders values with a fixed mapping step and a sequence dash offset
#[derive(Debug, Clone, Copy)]
pub struct Emitter {
    /// Extra indentation of nested mapping keys
    pub step: usize,
    /// Indentation of `-` relative to the key owning the sequence
    pub seq_offset: usize,
}

impl Default for Emitter {
    fn default() -> Self {
        Self {
            step: 2,
            seq_offset: 2,
        }
    }
}

impl Emitter {
    /// Render the entries of `map` with keys at column `col`
    pub fn mapping_lines(&self, map: &Mapping, col: usize, out: &mut Vec<String>) {
        let pad = " ".repeat(col);
        for (key, value) in map {
            let key = render_key(key);
            match value {
                Value::Mapping(inner) if !inner.is_empty() => {
                    out.push(format!("{pad}{key}:"));
                    self.mapping_lines(inner, col + self.step, out);
                }
                Value::Sequence(items) if !items.is_empty() => {
                    out.push(format!("{pad}{key}:"));
                    self.sequence_lines(items, col + self.seq_offset, out);
                }
                other => out.push(format!("{pad}{key}: {}", inline_value(other, QuoteStyle::Plain))),
            }
        }
    }

    /// Render `items` as a block sequence with dashes at column `dash`
    pub fn sequence_lines(&self, items: &[Value], dash: usize, out: &mut Vec<String>) {
        let pad = " ".repeat(dash);
        for item in items {
            let nested = match item {
                Value::Mapping(inner) if !inner.is_empty() => {
                    let mut lines = Vec::new();
                    self.mapping_lines(inner, dash + 2, &mut lines);
                    Some(lines)
                }
                Value::Sequence(inner) if !inner.is_empty() => {
                    let mut lines = Vec::new();
                    self.sequence_lines(inner, dash + 2, &mut lines);
                    Some(lines)
                }
                _ => None,
            };
            match nested {
                Some(mut lines) => {
                    // The first nested line moves onto the dash line.
                    lines[0] = format!("{pad}- {}", &lines[0][dash + 2..]);
                    out.extend(lines);
                }
                None => out.push(format!("{pad}- {}", inline_value(item, QuoteStyle::Plain))),
            }
        }
    }
}

/// Render a sequence of scalars in flow style: `[a, b]`
pub fn flow_sequence(items: &[Value]) -> Option<String> {
    let mut parts = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Value::String(s) => {
                if plain_is_safe(s) && !s.contains([',', '[', ']', '{', '}']) {
                    parts.push(s.clone());
                } else {
                    parts.push(double_quoted(s));
                }
            }
            Value::Mapping(_) | Value::Sequence(_) | Value::Tagged(_) => return None,
            other => parts.push(inline_value(other, QuoteStyle::Plain)),
        }
    }
    Some(format!("[{}]", parts.join(", ")))
}

/// Render a value that fits on a single line after `key: `
pub fn inline_value(value: &Value, style: QuoteStyle) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => scalar(s, style),
        Value::Sequence(items) if items.is_empty() => "[]".to_string(),
        Value::Mapping(map) if map.is_empty() => "{}".to_string(),
        Value::Sequence(items) => flow_sequence(items).unwrap_or_else(|| "[]".to_string()),
        Value::Mapping(_) => "{}".to_string(),
        Value::Tagged(tagged) => format!("{} {}", tagged.tag, inline_value(&tagged.value, style)),
    }
}

/// Render a string scalar, honouring `style` whenever it can represent `s`
pub fn scalar(s: &str, style: QuoteStyle) -> String {
    match style {
        QuoteStyle::Plain if plain_is_safe(s) => s.to_string(),
        QuoteStyle::Single if !s.chars().any(char::is_control) => {
            format!("'{}'", s.replace('\'', "''"))
        }
        _ => double_quoted(s),
    }
}

fn double_quoted(s: &str) -> String {
    // JSON string escapes are a subset of YAML double-quoted escapes.
    serde_json::to_string(s).unwrap_or_else(|_| format!("\"{}\"", s.escape_default()))
}

fn render_key(key: &Value) -> String {
    match key {
        Value::String(s) => scalar(s, QuoteStyle::Plain),
        other => inline_value(other, QuoteStyle::Plain),
    }
}

/// Whether `s` reads back as the same string when written without quotes
pub fn plain_is_safe(s: &str) -> bool {
    if s.is_empty() || s.trim() != s || s.chars().any(char::is_control) {
        return false;
    }
    if s.starts_with('#') || s.contains(" #") || s.contains(": ") || s.ends_with(':') {
        return false;
    }
    // YAML 1.1 readers still treat these as booleans.
    if matches!(
        s.to_ascii_lowercase().as_str(),
        "y" | "n" | "yes" | "no" | "on" | "off"
    ) {
        return false;
    }
    matches!(
        serde_yaml::from_str::<Value>(s),
        Ok(Value::String(ref parsed)) if parsed == s
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, Value)]) -> Mapping {
        let mut m = Mapping::new();
        for (k, v) in pairs {
            m.insert(Value::String((*k).to_string()), v.clone());
        }
        m
    }

    #[test]
    fn test_plain_is_safe() {
        assert!(plain_is_safe("test-org"));
        assert!(plain_is_safe("https://github.com/a/b"));
        assert!(plain_is_safe("Testing CRUD operations"));
        assert!(!plain_is_safe(""));
        assert!(!plain_is_safe("1.0"));
        assert!(!plain_is_safe("true"));
        assert!(!plain_is_safe("null"));
        assert!(!plain_is_safe("a: b"));
        assert!(!plain_is_safe("- item"));
        assert!(!plain_is_safe("value # comment"));
        assert!(!plain_is_safe(" padded"));
        assert!(!plain_is_safe("line\nbreak"));
    }

    #[test]
    fn test_scalar_styles() {
        assert_eq!(scalar("abc", QuoteStyle::Plain), "abc");
        assert_eq!(scalar("abc", QuoteStyle::Double), "\"abc\"");
        assert_eq!(scalar("it's", QuoteStyle::Single), "'it''s'");
        assert_eq!(scalar("yes", QuoteStyle::Plain), "\"yes\"");
        assert_eq!(scalar("a\nb", QuoteStyle::Single), "\"a\\nb\"");
    }

    #[test]
    fn test_mapping_lines_nested() {
        let entry = map(&[
            ("id", Value::from("demo")),
            ("repo", Value::Mapping(map(&[("owner", Value::from("o")), ("name", Value::from("n"))]))),
            (
                "directories",
                Value::Mapping(map(&[(
                    "docs",
                    Value::Sequence(vec![Value::Mapping(map(&[
                        ("path", Value::from("README.md")),
                        ("target", Value::from("overview.md")),
                    ]))]),
                )])),
            ),
            ("tags", Value::Sequence(vec![])),
        ]);
        let mut out = Vec::new();
        Emitter::default().sequence_lines(&[Value::Mapping(entry)], 2, &mut out);
        assert_eq!(
            out,
            vec![
                "  - id: demo",
                "    repo:",
                "      owner: o",
                "      name: n",
                "    directories:",
                "      docs:",
                "        - path: README.md",
                "          target: overview.md",
                "    tags: []",
            ]
        );
    }

    #[test]
    fn test_indentless_sequences() {
        let emitter = Emitter {
            step: 2,
            seq_offset: 0,
        };
        let mut out = Vec::new();
        let body = map(&[("tags", Value::Sequence(vec![Value::from("a"), Value::from("b")]))]);
        emitter.mapping_lines(&body, 0, &mut out);
        assert_eq!(out, vec!["tags:", "- a", "- b"]);
    }

    #[test]
    fn test_flow_sequence_quotes_indicators() {
        let items = vec![Value::from("plain"), Value::from("a, b"), Value::from("1.0")];
        assert_eq!(
            flow_sequence(&items).unwrap(),
            "[plain, \"a, b\", \"1.0\"]"
        );
    }

    #[test]
    fn test_emitted_lines_parse_back() {
        let entry = map(&[
            ("title", Value::from("Title: with colon")),
            ("description", Value::from("it's \"quoted\"")),
            ("features", Value::Sequence(vec![Value::from("#hash"), Value::from("ok")])),
        ]);
        let mut out = Vec::new();
        Emitter::default().mapping_lines(&entry, 0, &mut out);
        let parsed: Value = serde_yaml::from_str(&out.join("\n")).unwrap();
        assert_eq!(parsed, Value::Mapping(entry));
    }
}
