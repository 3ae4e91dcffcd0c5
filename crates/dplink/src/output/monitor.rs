//! Monitor helper utilities for notification output.
//!
//! Every notification becomes one line group in text mode, prefixed with its
//! action, and one JSON document in JSON mode. Documents are compact, one per
//! line, unless pretty printing is requested:
//!
//! ```text
//! [change] pin id 3:
//!   frequency: 10000000 Hz
//! ```
//!
//! ```text
//! {"action":"change","pin":{"id":3,"frequency":10000000}}
//! ```

use std::io::{self, Write};

use serde::Serialize;

use super::render::Rendered;
use super::{OutputFormat, OutputOptions, Printable, write_json};
use crate::netlink::genl::dpll::{Action, Object};

/// Configuration for monitor output.
#[derive(Debug, Clone, Default)]
pub struct MonitorConfig {
    /// Output format (text or JSON).
    pub format: OutputFormat,
    /// Output options.
    pub opts: OutputOptions,
}

impl MonitorConfig {
    /// Create a new monitor config with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the output format.
    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    /// Set the output options.
    pub fn with_opts(mut self, opts: OutputOptions) -> Self {
        self.opts = opts;
        self
    }
}

/// Helper trait for event types that can be printed in monitor mode.
pub trait MonitorEvent {
    /// Print the event in text format.
    fn print_text<W: Write>(&self, w: &mut W, opts: &OutputOptions) -> io::Result<()>;

    /// Convert the event to a JSON value.
    fn to_json(&self) -> serde_json::Value;
}

/// Print a monitor event using the configured format.
pub fn print_event<W, E>(w: &mut W, event: &E, config: &MonitorConfig) -> io::Result<()>
where
    W: Write,
    E: MonitorEvent,
{
    match config.format {
        OutputFormat::Text => {
            event.print_text(w, &config.opts)?;
        }
        OutputFormat::Json => write_json(w, &event.to_json(), &config.opts)?,
    }

    w.flush()?;
    Ok(())
}

/// A rendered DPLL notification.
pub struct NotificationEvent<'a> {
    pub action: Action,
    pub object: Object,
    pub record: Rendered<'a>,
}

#[derive(Serialize)]
struct Envelope {
    action: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    device: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pin: Option<serde_json::Value>,
}

impl MonitorEvent for NotificationEvent<'_> {
    fn print_text<W: Write>(&self, w: &mut W, opts: &OutputOptions) -> io::Result<()> {
        write!(w, "[{}] ", self.action.name())?;
        self.record.print_text(w, opts)
    }

    fn to_json(&self) -> serde_json::Value {
        let record = Some(self.record.to_json());
        let (device, pin) = match self.object {
            Object::Device => (record, None),
            Object::Pin => (None, record),
        };
        let envelope = Envelope {
            action: self.action.name(),
            device,
            pin,
        };
        serde_json::to_value(envelope).unwrap_or(serde_json::Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netlink::builder::AttrBuilder;
    use crate::netlink::genl::dpll::{DpllPinAttr as P, decode};
    use crate::output::render::render;

    fn event_output(format: OutputFormat) -> String {
        event_output_with(MonitorConfig::new().with_format(format))
    }

    fn event_output_with(config: MonitorConfig) -> String {
        let mut b = AttrBuilder::new();
        b.append_attr_u32(P::Id as u16, 3);
        b.append_attr_u64(P::Frequency as u16, 10_000_000);
        let buf = b.finish();

        let record = decode(Object::Pin.table(), &buf).unwrap();
        let event = NotificationEvent {
            action: Action::Change,
            object: Object::Pin,
            record: render(&record, Object::Pin.script()).unwrap(),
        };
        let mut out = Vec::new();
        print_event(&mut out, &event, &config).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_text_prefix() {
        assert_eq!(
            event_output(OutputFormat::Text),
            "[change] pin id 3:\n  frequency: 10000000 Hz\n"
        );
    }

    #[test]
    fn test_json_line() {
        assert_eq!(
            event_output(OutputFormat::Json),
            "{\"action\":\"change\",\"pin\":{\"id\":3,\"frequency\":10000000}}\n"
        );
    }

    #[test]
    fn test_json_pretty() {
        let config = MonitorConfig::new()
            .with_format(OutputFormat::Json)
            .with_opts(OutputOptions { pretty: true });
        let out = event_output_with(config);
        assert!(out.starts_with("{\n  \"action\": \"change\",\n"), "{out}");
        assert!(out.contains("\n    \"frequency\": 10000000\n"), "{out}");
        assert!(out.ends_with("}\n"));
    }
}
