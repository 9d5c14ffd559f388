//! Output formatting for dissection results.
//!
//! Text output mirrors a packet-details pane: a summary line followed by
//! the indented field tree. JSON output writes one object per packet.

use std::io::Write;

use clap::ValueEnum;
use serde_json::{json, Map, Value};

use wiretree_core::tree::{FieldTree, FieldValue, ItemId};
use wiretree_core::Dissection;

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Indented field tree (default)
    Text,
    /// JSON Lines (one JSON object per packet)
    Json,
}

/// Formats dissections for output.
pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    /// Create a new formatter with the specified format.
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Format one dissection and write it to the given writer.
    pub fn write<W: Write>(
        &self,
        name: &str,
        dissection: &Dissection,
        writer: &mut W,
    ) -> std::io::Result<()> {
        match self.format {
            OutputFormat::Text => self.write_text(name, dissection, writer),
            OutputFormat::Json => self.write_json(name, dissection, writer),
        }
    }

    fn write_text<W: Write>(
        &self,
        name: &str,
        dissection: &Dissection,
        writer: &mut W,
    ) -> std::io::Result<()> {
        writeln!(
            writer,
            "{name}: {} {} ({} of {} bytes)",
            dissection.columns.protocol,
            dissection.columns.info,
            dissection.consumed,
            dissection.tree.buffer_len()
        )?;
        dissection.tree.render_text(writer)?;
        writeln!(writer)
    }

    fn write_json<W: Write>(
        &self,
        name: &str,
        dissection: &Dissection,
        writer: &mut W,
    ) -> std::io::Result<()> {
        let mut obj = Map::new();
        obj.insert("input".to_string(), Value::String(name.to_string()));
        obj.insert(
            "protocol".to_string(),
            Value::String(dissection.columns.protocol.to_string()),
        );
        obj.insert(
            "info".to_string(),
            Value::String(dissection.columns.info.clone()),
        );
        obj.insert("consumed".to_string(), json!(dissection.consumed));
        obj.insert("notes".to_string(), notes_json(&dissection.tree, ItemId::ROOT));
        obj.insert("tree".to_string(), children_json(&dissection.tree, ItemId::ROOT));

        writeln!(writer, "{}", Value::Object(obj))
    }
}

/// Children of `id` as a JSON array, recursively.
pub fn children_json(tree: &FieldTree, id: ItemId) -> Value {
    Value::Array(
        tree.children(id)
            .map(|(child, item)| {
                let mut obj = Map::new();
                match item.header() {
                    Some(hf) => {
                        obj.insert("name".to_string(), Value::String(hf.name.to_string()));
                        obj.insert("abbrev".to_string(), Value::String(hf.abbrev.to_string()));
                        obj.insert("kind".to_string(), Value::String(hf.kind.to_string()));
                    }
                    None => {
                        obj.insert("name".to_string(), Value::String(item.display.clone()));
                        obj.insert("abbrev".to_string(), Value::Null);
                        obj.insert("kind".to_string(), Value::String("text".to_string()));
                    }
                }
                obj.insert("offset".to_string(), json!(item.range.offset));
                obj.insert("length".to_string(), json!(item.range.length));
                obj.insert("display".to_string(), Value::String(item.display.clone()));
                obj.insert("value".to_string(), value_json(&item.value));
                obj.insert("generated".to_string(), Value::Bool(item.generated));
                obj.insert("notes".to_string(), notes_json(tree, child));
                obj.insert("children".to_string(), children_json(tree, child));
                Value::Object(obj)
            })
            .collect(),
    )
}

fn notes_json(tree: &FieldTree, id: ItemId) -> Value {
    Value::Array(
        tree.notes_for(id)
            .map(|note| {
                json!({
                    "severity": note.severity.as_str(),
                    "group": note.group.as_str(),
                    "abbrev": note.abbrev,
                    "message": note.message.as_str(),
                })
            })
            .collect(),
    )
}

/// Typed JSON rendering of a decoded value.
fn value_json(value: &FieldValue) -> Value {
    match value {
        FieldValue::Bool(b) => Value::Bool(*b),
        FieldValue::UInt64(n) => json!(n),
        FieldValue::String(s) => Value::String(s.to_string()),
        FieldValue::Bytes(_) => Value::String(value.display()),
        FieldValue::AbsoluteTime(Some(t)) => json!(t.timestamp()),
        FieldValue::AbsoluteTime(None) | FieldValue::None => Value::Null,
    }
}
