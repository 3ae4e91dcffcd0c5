//! Text output formatting.

use std::io::Write;

use super::formatting::{format_flags, format_millidegrees, format_range, vocab_name};
use super::render::{Event, Format};
use crate::netlink::genl::dpll::Value;

/// Format one value for text output.
fn text_value(format: Format, value: Value<'_>) -> String {
    match (format, value) {
        (_, Value::Text(s)) => s.to_string(),
        (Format::Hex, Value::Unsigned(v)) => format!("0x{:x}", v),
        (Format::Hz, Value::Unsigned(v)) => format!("{} Hz", v),
        (Format::Ppm, Value::Signed(v)) => format!("{} ppm", v),
        (Format::Millidegrees, Value::Signed(v)) => format_millidegrees(v),
        (Format::Vocab(vocab), Value::Unsigned(v)) => vocab_name(vocab, v).to_string(),
        (Format::Flags(vocab), Value::Unsigned(v)) => {
            format_flags(vocab, u32::try_from(v).unwrap_or(u32::MAX))
        }
        (_, Value::Unsigned(v)) => v.to_string(),
        (_, Value::Signed(v)) => v.to_string(),
        (_, Value::Nested(_)) => "nested".to_string(),
    }
}

/// Write rendered events as indented text.
///
/// ```text
/// pin id 3:
///   module-name: ice
///   frequency: 10000000 Hz
///   parent-device:
///     id 0 direction input prio 2 state connected
/// ```
pub fn write_text<W: Write>(w: &mut W, events: &[Event<'_>]) -> std::io::Result<()> {
    // Position inside a nested entry: None outside, Some(first) inside
    let mut entry: Option<bool> = None;

    for event in events {
        match event {
            Event::Begin { object, id } => match id {
                Some(id) => writeln!(w, "{} id {}:", object, id)?,
                None => writeln!(w, "{}:", object)?,
            },
            Event::Field { field, value } => {
                let text = text_value(field.format, *value);
                match entry {
                    Some(first) => {
                        if !first {
                            write!(w, " ")?;
                        }
                        write!(w, "{} {}", field.label, text)?;
                        entry = Some(false);
                    }
                    None => writeln!(w, "  {}: {}", field.label, text)?,
                }
            }
            Event::ListStart { field } => writeln!(w, "  {}:", field.label)?,
            Event::Item { field, value } => {
                writeln!(w, "    {}", text_value(field.format, *value))?
            }
            Event::Range { min, max } => writeln!(w, "    {}", format_range(*min, *max))?,
            Event::EntryStart { .. } => {
                write!(w, "    ")?;
                entry = Some(true);
            }
            Event::EntryEnd => {
                writeln!(w)?;
                entry = None;
            }
            Event::ListEnd { .. } | Event::End => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netlink::builder::AttrBuilder;
    use crate::netlink::genl::dpll::{DpllAttr as D, DpllPinAttr as P, Object, decode};
    use crate::output::render::{DEVICE_SCRIPT, PIN_SCRIPT, render};

    fn text(object: Object, buf: &[u8]) -> String {
        let record = decode(object.table(), buf).unwrap();
        let script = match object {
            Object::Device => &DEVICE_SCRIPT,
            Object::Pin => &PIN_SCRIPT,
        };
        let rendered = render(&record, script).unwrap();
        let mut out = Vec::new();
        write_text(&mut out, &rendered.events).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_device_text() {
        let mut b = AttrBuilder::new();
        b.append_attr_u32(D::Id as u16, 0);
        b.append_attr_str(D::ModuleName as u16, "ice").unwrap();
        b.append_attr_u64(D::ClockId as u16, 0x4a1f2b);
        b.append_attr_u32(D::LockStatus as u16, 9);
        b.append_attr_s32(D::Temp as u16, 23456);
        b.append_attr_u32(D::ModeSupported as u16, 1);
        b.append_attr_u32(D::ModeSupported as u16, 2);

        assert_eq!(
            text(Object::Device, &b.finish()),
            "device id 0:\n\
             \x20 module-name: ice\n\
             \x20 clock-id: 0x4a1f2b\n\
             \x20 lock-status: unknown\n\
             \x20 temperature: 23.456 C\n\
             \x20 mode-supported:\n\
             \x20   manual\n\
             \x20   automatic\n"
        );
    }

    #[test]
    fn test_pin_text_groups() {
        let mut b = AttrBuilder::new();
        b.append_attr_u32(P::Id as u16, 3);
        b.append_attr_u32(P::Capabilities as u16, 0x5);
        b.append_attr_s64(P::FractionalFrequencyOffset as u16, -2);
        let nest = b.nest_start(P::ParentDevice as u16);
        b.append_attr_u32(P::ParentId as u16, 0);
        b.append_attr_u32(P::Direction as u16, 1);
        b.append_attr_u32(P::Prio as u16, 2);
        b.append_attr_u32(P::State as u16, 1);
        b.append_attr_s64(P::PhaseOffset as u16, -15);
        b.nest_end(nest).unwrap();
        let nest = b.nest_start(P::ReferenceSync as u16);
        b.append_attr_u32(P::Id as u16, 5);
        b.append_attr_u32(P::State as u16, 2);
        b.nest_end(nest).unwrap();

        assert_eq!(
            text(Object::Pin, &b.finish()),
            "pin id 3:\n\
             \x20 capabilities: 0x5 state-can-change direction-can-change\n\
             \x20 fractional-frequency-offset: -2 ppm\n\
             \x20 parent-device:\n\
             \x20   id 0 direction input prio 2 state connected phase-offset -15\n\
             \x20 reference-sync:\n\
             \x20   pin 5 state disconnected\n"
        );
    }

    #[test]
    fn test_empty_entries_skipped() {
        let mut b = AttrBuilder::new();
        b.append_attr_u32(P::Id as u16, 1);
        let nest = b.nest_start(P::ParentDevice as u16);
        b.nest_end(nest).unwrap();
        let nest = b.nest_start(P::ParentPin as u16);
        b.append_attr_u32(200, 9);
        b.nest_end(nest).unwrap();
        let nest = b.nest_start(P::ParentPin as u16);
        b.append_attr_u32(P::ParentId as u16, 6);
        b.nest_end(nest).unwrap();

        assert_eq!(
            text(Object::Pin, &b.finish()),
            "pin id 1:\n  parent-pin:\n    id 6\n"
        );
    }

    #[test]
    fn test_missing_id_header() {
        let mut b = AttrBuilder::new();
        b.append_attr_u32(P::Type as u16, 5);
        assert_eq!(text(Object::Pin, &b.finish()), "pin:\n  type: gnss\n");
    }
}
