//! Output formatting (JSON/text) for decoded DPLL records.
//!
//! [`render`] turns a decoded record into a flat list of presentation
//! events following a per-object field script. The text and JSON writers
//! consume those events, so field order and value formatting are decided in
//! one place.

pub mod formatting;
mod json;
pub mod monitor;
pub mod render;
mod text;

pub use json::to_json;
pub use monitor::{MonitorConfig, MonitorEvent, NotificationEvent, print_event};
pub use render::{DEVICE_SCRIPT, Event, PIN_SCRIPT, RecordList, Rendered, Script, render};
pub use text::write_text;

use std::io::Write;

/// Output format options.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputOptions {
    /// Pretty print (for JSON).
    pub pretty: bool,
}

/// Output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Plain text output.
    #[default]
    Text,
    /// JSON output.
    Json,
}

/// Write a JSON document followed by a newline.
pub fn write_json<W: Write>(
    w: &mut W,
    value: &serde_json::Value,
    opts: &OutputOptions,
) -> std::io::Result<()> {
    if opts.pretty {
        serde_json::to_writer_pretty(&mut *w, value)?;
    } else {
        serde_json::to_writer(&mut *w, value)?;
    }
    writeln!(w)
}

/// Trait for types that can be printed.
pub trait Printable {
    /// Print as plain text.
    fn print_text<W: Write>(&self, w: &mut W, opts: &OutputOptions) -> std::io::Result<()>;

    /// Convert to JSON value.
    fn to_json(&self) -> serde_json::Value;

    /// Print in the specified format.
    fn print<W: Write>(
        &self,
        w: &mut W,
        format: OutputFormat,
        opts: &OutputOptions,
    ) -> std::io::Result<()> {
        match format {
            OutputFormat::Text => self.print_text(w, opts),
            OutputFormat::Json => write_json(w, &self.to_json(), opts),
        }
    }
}

/// Trait for collections of printable items.
///
/// In JSON the items are wrapped as `{"<key>": [...]}`, one document for the
/// whole collection.
pub trait PrintableList {
    /// The item type.
    type Item: Printable;

    /// Key naming the array in JSON output.
    fn key(&self) -> &str;

    /// Get the items.
    fn items(&self) -> &[Self::Item];

    /// Print all items as text.
    fn print_text<W: Write>(&self, w: &mut W, opts: &OutputOptions) -> std::io::Result<()> {
        for item in self.items() {
            item.print_text(w, opts)?;
        }
        Ok(())
    }

    /// Convert to a keyed JSON array.
    fn to_json(&self) -> serde_json::Value {
        let items = self.items().iter().map(Printable::to_json).collect();
        let mut map = serde_json::Map::new();
        map.insert(self.key().to_string(), serde_json::Value::Array(items));
        serde_json::Value::Object(map)
    }

    /// Print in the specified format.
    fn print<W: Write>(
        &self,
        w: &mut W,
        format: OutputFormat,
        opts: &OutputOptions,
    ) -> std::io::Result<()> {
        match format {
            OutputFormat::Text => self.print_text(w, opts),
            OutputFormat::Json => write_json(w, &self.to_json(), opts),
        }
    }
}
