//! Registry document representations
//!
//! [`RegistryDocument`] is the plain parsed mapping used by readers and
//! validators. [`StyledDocument`] additionally keeps the source text so
//! that mutations rewrite only the lines they touch; comments, key order
//! and quoting everywhere else survive byte-for-byte.
//!
//! Every edit is applied to a copy of the text, re-parsed and compared with
//! the intended data before it is committed, so a document is never left in
//! a state that reads back differently from what the edit meant.

mod emit;
mod layout;

use std::path::Path;

use serde_yaml::{Mapping, Value};
use tracing::debug;

use crate::error::DocumentError;
use crate::model::RegistryView;

use emit::{Emitter, QuoteStyle};
use layout::{ItemSpan, KeySpan};

/// Human-readable name of a YAML value's type
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "list",
        Value::Mapping(_) => "dictionary",
        Value::Tagged(_) => "tagged value",
    }
}

/// Render a scalar value the way it reads in messages
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Tagged(tagged) => scalar_text(&tagged.value),
        _ => None,
    }
}

fn is_null_token(token: &str) -> bool {
    matches!(token, "" | "~" | "null" | "Null" | "NULL")
}

/// Inline values that stand for a `templates` key without entries
fn is_empty_token(token: &str) -> bool {
    token == "[]" || is_null_token(token)
}

/// Parse document text into its root mapping
///
/// An empty document (or one holding only comments) yields an empty
/// mapping; any root other than a mapping is rejected.
pub fn parse_root(text: &str, path: &Path) -> Result<Mapping, DocumentError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    if text.lines().all(layout::is_trivia) {
        return Ok(Mapping::new());
    }
    let value: Value = serde_yaml::from_str(text).map_err(|source| DocumentError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    match value {
        Value::Mapping(map) => Ok(map),
        Value::Null => Ok(Mapping::new()),
        other => Err(DocumentError::NotADictionary {
            found: type_name(&other),
        }),
    }
}

/// Convert a YAML value into the equivalent JSON value
///
/// Non-string keys are rendered to strings and tags are dropped, since JSON
/// has no counterpart for either.
pub fn to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                serde_json::Value::from(i)
            } else if let Some(u) = n.as_u64() {
                serde_json::Value::from(u)
            } else {
                n.as_f64()
                    .and_then(serde_json::Number::from_f64)
                    .map(serde_json::Value::Number)
                    .unwrap_or(serde_json::Value::Null)
            }
        }
        Value::String(s) => serde_json::Value::String(s.clone()),
        Value::Sequence(items) => serde_json::Value::Array(items.iter().map(to_json).collect()),
        Value::Mapping(map) => {
            let object = map
                .iter()
                .map(|(k, v)| {
                    let key = scalar_text(k).unwrap_or_else(|| {
                        serde_yaml::to_string(k)
                            .map(|s| s.trim_end().to_string())
                            .unwrap_or_default()
                    });
                    (key, to_json(v))
                })
                .collect();
            serde_json::Value::Object(object)
        }
        Value::Tagged(tagged) => to_json(&tagged.value),
    }
}

fn sequence_of<'a>(root: &'a Mapping, key: &str) -> &'a [Value] {
    match root.get(key) {
        Some(Value::Sequence(items)) => items,
        _ => &[],
    }
}

/// A parsed registry document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegistryDocument {
    root: Mapping,
}

impl RegistryDocument {
    /// Wrap an already parsed root mapping
    pub fn new(root: Mapping) -> Self {
        Self { root }
    }

    /// Parse document text; `path` is only used in error messages
    pub fn parse(text: &str, path: &Path) -> Result<Self, DocumentError> {
        parse_root(text, path).map(Self::new)
    }

    pub fn root(&self) -> &Mapping {
        &self.root
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.root.get(key)
    }

    /// Declared categories; absent or `null` reads as empty
    pub fn categories(&self) -> &[Value] {
        sequence_of(&self.root, "categories")
    }

    /// Registry entries; absent or `null` reads as empty
    pub fn templates(&self) -> &[Value] {
        sequence_of(&self.root, "templates")
    }

    /// Position of the entry whose `id` equals `id`
    pub fn entry_index(&self, id: &str) -> Option<usize> {
        self.templates().iter().position(|entry| {
            entry
                .get("id")
                .and_then(Value::as_str)
                .is_some_and(|entry_id| entry_id == id)
        })
    }

    /// IDs of the declared categories, skipping categories without one
    pub fn category_ids(&self) -> Vec<String> {
        self.categories()
            .iter()
            .filter_map(|category| category.get("id").and_then(scalar_text))
            .filter(|id| !id.is_empty())
            .collect()
    }

    /// The document as plain JSON
    pub fn to_json(&self) -> serde_json::Value {
        to_json(&Value::Mapping(self.root.clone()))
    }

    /// Typed read-only view for collaborators
    pub fn view(&self) -> Result<RegistryView, serde_yaml::Error> {
        serde_yaml::from_value(Value::Mapping(self.root.clone()))
    }
}

/// A registry document that remembers its source text
#[derive(Debug, Clone)]
pub struct StyledDocument {
    lines: Vec<String>,
    newline: &'static str,
    trailing_newline: bool,
    bom: bool,
    data: RegistryDocument,
    /// How `templates` was written when the document was loaded empty
    empty_templates: String,
}

impl StyledDocument {
    /// Parse `text`, keeping it for later in-place edits
    pub fn parse(text: &str, path: &Path) -> Result<Self, DocumentError> {
        let data = RegistryDocument::parse(text, path)?;
        let (body, bom) = match text.strip_prefix('\u{feff}') {
            Some(body) => (body, true),
            None => (text, false),
        };
        let newline = if body.contains("\r\n") { "\r\n" } else { "\n" };
        let trailing_newline = body.ends_with('\n');
        let mut lines: Vec<String> = body
            .split('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
            .collect();
        if trailing_newline {
            lines.pop();
        }
        if body.is_empty() {
            lines.clear();
        }
        let mut styled = Self {
            lines,
            newline,
            trailing_newline,
            bom,
            data,
            empty_templates: "[]".to_string(),
        };
        if let Some(token) = styled.empty_templates_token() {
            styled.empty_templates = token;
        }
        Ok(styled)
    }

    /// Inline token of a `templates` key that holds no entries
    fn empty_templates_token(&self) -> Option<String> {
        if !self.data.templates().is_empty() {
            return None;
        }
        let key = self.top_level_key("templates").ok()??;
        let value = self.inline_of(&key).value;
        (!key.has_children() && is_empty_token(value)).then(|| value.to_string())
    }

    /// The parsed data as of the last committed edit
    pub fn data(&self) -> &RegistryDocument {
        &self.data
    }

    /// The document text, including every edit made so far
    pub fn render(&self) -> String {
        let mut out = String::new();
        if self.bom {
            out.push('\u{feff}');
        }
        out.push_str(&self.lines.join(self.newline));
        if self.trailing_newline && !self.lines.is_empty() {
            out.push_str(self.newline);
        }
        out
    }

    /// Append `entry` to the `templates` sequence, creating it if needed
    pub fn append_entry(&mut self, entry: Mapping) -> Result<(), DocumentError> {
        let mut expected = self.data.root.clone();
        let mut templates = self.data.templates().to_vec();
        templates.push(Value::Mapping(entry.clone()));
        expected.insert(Value::from("templates"), Value::Sequence(templates));

        let edited = self
            .append_lines(entry)
            .or_else(|err| self.rerender_all(&expected, err))?;
        self.commit(edited, expected)
    }

    /// Set `key` of the entry at `index` to `value`
    pub fn set_entry_field(
        &mut self,
        index: usize,
        key: &str,
        value: Value,
    ) -> Result<(), DocumentError> {
        let mut expected = self.data.root.clone();
        let mut templates = self.data.templates().to_vec();
        let entry = templates
            .get_mut(index)
            .and_then(Value::as_mapping_mut)
            .ok_or_else(|| DocumentError::layout(format!("no entry mapping at index {index}")))?;
        entry.insert(Value::from(key), value.clone());
        let new_entry = entry.clone();
        expected.insert(Value::from("templates"), Value::Sequence(templates));

        let edited = self
            .set_field_lines(index, key, &value, new_entry)
            .or_else(|err| self.rerender_all(&expected, err))?;
        self.commit(edited, expected)
    }

    /// Delete the entry at `index`
    pub fn remove_entry(&mut self, index: usize) -> Result<(), DocumentError> {
        let mut expected = self.data.root.clone();
        let mut templates = self.data.templates().to_vec();
        if index >= templates.len() {
            return Err(DocumentError::layout(format!("no entry at index {index}")));
        }
        templates.remove(index);
        let emptied = if templates.is_empty() && is_null_token(&self.empty_templates) {
            Value::Null
        } else {
            Value::Sequence(templates)
        };
        expected.insert(Value::from("templates"), emptied);

        let edited = self
            .remove_lines(index)
            .or_else(|err| self.rerender_all(&expected, err))?;
        self.commit(edited, expected)
    }

    fn commit(&mut self, lines: Vec<String>, expected: Mapping) -> Result<(), DocumentError> {
        let candidate = Self {
            lines,
            newline: self.newline,
            trailing_newline: true,
            bom: self.bom,
            data: RegistryDocument::default(),
            empty_templates: String::new(),
        };
        let reparsed = parse_root(&candidate.render(), Path::new("<edited>"))?;
        if reparsed != expected {
            debug!("edited document re-parsed to different content");
            return Err(DocumentError::EditMismatch);
        }
        self.lines = candidate.lines;
        self.trailing_newline = true;
        self.data = RegistryDocument::new(expected);
        Ok(())
    }

    fn emitter(&self) -> Emitter {
        Emitter {
            seq_offset: layout::detect_seq_offset(&self.lines),
            ..Emitter::default()
        }
    }

    fn top_level_key(&self, name: &str) -> Result<Option<KeySpan>, DocumentError> {
        if self.lines.is_empty() {
            return Ok(None);
        }
        let keys = layout::mapping_keys(&self.lines, 0, 0, self.lines.len() - 1, false)?;
        Ok(keys.into_iter().find(|key| key.key == name))
    }

    /// Entries of the block `templates` sequence, checked against the data
    fn template_items(&self, key: &KeySpan) -> Result<Vec<ItemSpan>, DocumentError> {
        let items = if key.has_children() {
            layout::sequence_items(&self.lines, key.line + 1, key.end)?
        } else {
            Vec::new()
        };
        if items.len() != self.data.templates().len() {
            return Err(DocumentError::layout(
                "templates are not laid out as a block sequence",
            ));
        }
        Ok(items)
    }

    fn inline_of(&self, key: &KeySpan) -> layout::Inline<'_> {
        layout::split_inline(&self.lines[key.line][key.colon + 1..])
    }

    fn append_lines(&self, entry: Mapping) -> Result<Vec<String>, DocumentError> {
        let emitter = self.emitter();
        let mut lines = self.lines.clone();
        let entry = [Value::Mapping(entry)];

        let Some(key) = self.top_level_key("templates")? else {
            let mut block = vec!["templates:".to_string()];
            emitter.sequence_lines(&entry, emitter.seq_offset, &mut block);
            lines.extend(block);
            return Ok(lines);
        };

        let inline = self.inline_of(&key);
        if !inline.value.is_empty() {
            if !is_empty_token(inline.value) {
                return Err(DocumentError::layout("templates use flow style"));
            }
            let head = &self.lines[key.line][..=key.colon];
            lines[key.line] = format!("{head}{}", inline.trailing());
            let mut block = Vec::new();
            emitter.sequence_lines(&entry, key.indent + emitter.seq_offset, &mut block);
            lines.splice(key.line + 1..key.line + 1, block);
            return Ok(lines);
        }

        let items = self.template_items(&key)?;
        let dash = items
            .first()
            .map(|item| item.dash)
            .unwrap_or(key.indent + emitter.seq_offset);
        let mut block = Vec::new();
        emitter.sequence_lines(&entry, dash, &mut block);
        lines.splice(key.end + 1..key.end + 1, block);
        Ok(lines)
    }

    fn set_field_lines(
        &self,
        index: usize,
        name: &str,
        value: &Value,
        new_entry: Mapping,
    ) -> Result<Vec<String>, DocumentError> {
        let emitter = self.emitter();
        let templates = self
            .top_level_key("templates")?
            .ok_or_else(|| DocumentError::layout("document has no templates key"))?;
        let items = self.template_items(&templates)?;
        let item = &items[index];
        let mut lines = self.lines.clone();

        let Some(keys) = layout::item_keys(&self.lines, item)? else {
            // Not a block mapping: rewrite the whole entry in block style.
            let mut block = Vec::new();
            emitter.sequence_lines(&[Value::Mapping(new_entry)], item.dash, &mut block);
            lines.splice(item.line..=item.end, block);
            return Ok(lines);
        };
        let col = keys.first().map(|key| key.indent).unwrap_or(item.dash + 2);

        let Some(key) = keys.iter().find(|key| key.key == name) else {
            let mut single = Mapping::new();
            single.insert(Value::from(name), value.clone());
            let mut block = Vec::new();
            emitter.mapping_lines(&single, col, &mut block);
            lines.splice(item.end + 1..item.end + 1, block);
            return Ok(lines);
        };

        let inline = self.inline_of(key);
        let head = &self.lines[key.line][..=key.colon];
        let lead = if inline.value.is_empty() { " " } else { inline.lead };
        let tail = inline.trailing();
        let single_line = !key.has_children();

        let replacement = match value {
            Value::Sequence(items) if !items.is_empty() => {
                let flow = if single_line && inline.value.starts_with('[') {
                    emit::flow_sequence(items)
                } else {
                    None
                };
                match flow {
                    Some(flow) => vec![format!("{head}{lead}{flow}{tail}")],
                    None => {
                        let dash = self
                            .child_dash(key)
                            .unwrap_or(key.indent + emitter.seq_offset);
                        let mut block = vec![format!("{head}{tail}")];
                        emitter.sequence_lines(items, dash, &mut block);
                        block
                    }
                }
            }
            Value::Mapping(map) if !map.is_empty() => {
                let mut block = vec![format!("{head}{tail}")];
                emitter.mapping_lines(map, key.indent + emitter.step, &mut block);
                block
            }
            scalar => {
                let keeps_token = single_line
                    && !inline.value.is_empty()
                    && !inline.value.starts_with(['|', '>', '[', '{', '&', '*', '!']);
                let style = if keeps_token {
                    QuoteStyle::of(inline.value)
                } else {
                    QuoteStyle::Plain
                };
                vec![format!(
                    "{head}{lead}{}{tail}",
                    emit::inline_value(scalar, style)
                )]
            }
        };
        lines.splice(key.line..=key.end, replacement);
        Ok(lines)
    }

    /// Dash column of a block sequence already nested under `key`
    fn child_dash(&self, key: &KeySpan) -> Option<usize> {
        let line = self.lines[key.line + 1..=key.end]
            .iter()
            .find(|line| !layout::is_trivia(line))?;
        let indent = layout::indent_of(line);
        layout::is_seq_entry(&line[indent..]).then_some(indent)
    }

    fn remove_lines(&self, index: usize) -> Result<Vec<String>, DocumentError> {
        let templates = self
            .top_level_key("templates")?
            .ok_or_else(|| DocumentError::layout("document has no templates key"))?;
        let items = self.template_items(&templates)?;
        let item = &items[index];
        let mut lines = self.lines.clone();
        lines.drain(item.line..=item.end);
        if items.len() == 1 && !self.empty_templates.is_empty() {
            let inline = self.inline_of(&templates);
            let head = &self.lines[templates.line][..=templates.colon];
            lines[templates.line] =
                format!("{head} {}{}", self.empty_templates, inline.trailing());
        }
        Ok(lines)
    }

    /// Last resort when the layout is not editable in place
    ///
    /// Only used for documents without comments, where re-rendering loses
    /// nothing but quoting style.
    fn rerender_all(
        &self,
        expected: &Mapping,
        err: DocumentError,
    ) -> Result<Vec<String>, DocumentError> {
        let has_comments = self
            .lines
            .iter()
            .any(|line| line.trim_start().starts_with('#') || line.contains(" #"));
        if has_comments {
            return Err(err);
        }
        debug!(reason = %err, "re-rendering document without comments");
        let mut lines = Vec::new();
        self.emitter().mapping_lines(expected, 0, &mut lines);
        Ok(lines)
    }
}
