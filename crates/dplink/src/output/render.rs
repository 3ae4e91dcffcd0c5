//! Record renderer: decoded record + field script -> presentation events.
//!
//! A [`Script`] lists which attributes of an object are shown, in which
//! order, under which label and JSON key, and how the value is formatted.
//! [`render`] walks the script against a [`Record`] and produces a flat
//! [`Event`] list that both output writers consume. Rendering never touches
//! the record and performs no I/O.

use std::io::Write;

use super::{OutputOptions, Printable, PrintableList};
use crate::netlink::genl::dpll::types::{self, Vocab};
use crate::netlink::genl::dpll::{DecodeError, DpllAttr as D, DpllPinAttr as P, Object, Record, Value};

/// How a value is presented.
#[derive(Debug, Clone, Copy)]
pub enum Format {
    /// Number or string as is.
    Plain,
    /// `0x..` in text, a number in JSON.
    Hex,
    /// `N Hz` in text, a number in JSON.
    Hz,
    /// `N ppm` in text, a number in JSON.
    Ppm,
    /// `23.456 C` in text, a float in JSON.
    Millidegrees,
    /// Enum token.
    Vocab(&'static Vocab),
    /// Bitmask: `0xN name...` in text, an array of names in JSON.
    Flags(&'static Vocab),
    /// Nested `{frequency-min, frequency-max}` range.
    Range,
    /// Nested entry shown inline as `label value` pairs.
    Group(&'static [Field]),
}

/// One scripted field.
#[derive(Debug)]
pub struct Field {
    pub attr: u16,
    /// JSON key.
    pub key: &'static str,
    /// Text label.
    pub label: &'static str,
    pub format: Format,
}

const fn field(attr: u16, key: &'static str, format: Format) -> Field {
    Field {
        attr,
        key,
        label: key,
        format,
    }
}

const fn labeled(attr: u16, key: &'static str, label: &'static str, format: Format) -> Field {
    Field {
        attr,
        key,
        label,
        format,
    }
}

/// Field script for one object kind.
#[derive(Debug)]
pub struct Script {
    pub object: Object,
    /// Attribute shown in the record header.
    pub id_attr: u16,
    pub fields: &'static [Field],
}

pub static DEVICE_SCRIPT: Script = Script {
    object: Object::Device,
    id_attr: D::Id as u16,
    fields: &[
        field(D::ModuleName as u16, "module-name", Format::Plain),
        field(D::Mode as u16, "mode", Format::Vocab(&types::MODE)),
        field(D::ClockId as u16, "clock-id", Format::Hex),
        field(D::Type as u16, "type", Format::Vocab(&types::DEVICE_TYPE)),
        field(D::LockStatus as u16, "lock-status", Format::Vocab(&types::LOCK_STATUS)),
        field(
            D::LockStatusError as u16,
            "lock-status-error",
            Format::Vocab(&types::LOCK_STATUS_ERROR),
        ),
        field(D::Temp as u16, "temperature", Format::Millidegrees),
        field(D::ModeSupported as u16, "mode-supported", Format::Vocab(&types::MODE)),
        field(
            D::ClockQualityLevel as u16,
            "clock-quality-level",
            Format::Vocab(&types::CLOCK_QUALITY_LEVEL),
        ),
        field(
            D::PhaseOffsetMonitor as u16,
            "phase-offset-monitor",
            Format::Vocab(&types::FEATURE_STATE),
        ),
        field(D::PhaseOffsetAvgFactor as u16, "phase-offset-avg-factor", Format::Plain),
    ],
};

static PARENT_DEVICE_FIELDS: [Field; 5] = [
    labeled(P::ParentId as u16, "parent-id", "id", Format::Plain),
    field(P::Direction as u16, "direction", Format::Vocab(&types::PIN_DIRECTION)),
    field(P::Prio as u16, "prio", Format::Plain),
    field(P::State as u16, "state", Format::Vocab(&types::PIN_STATE)),
    field(P::PhaseOffset as u16, "phase-offset", Format::Plain),
];

static PARENT_PIN_FIELDS: [Field; 2] = [
    labeled(P::ParentId as u16, "parent-id", "id", Format::Plain),
    field(P::State as u16, "state", Format::Vocab(&types::PIN_STATE)),
];

static REFERENCE_SYNC_FIELDS: [Field; 2] = [
    labeled(P::Id as u16, "id", "pin", Format::Plain),
    field(P::State as u16, "state", Format::Vocab(&types::PIN_STATE)),
];

pub static PIN_SCRIPT: Script = Script {
    object: Object::Pin,
    id_attr: P::Id as u16,
    fields: &[
        field(P::ModuleName as u16, "module-name", Format::Plain),
        field(P::ClockId as u16, "clock-id", Format::Hex),
        field(P::BoardLabel as u16, "board-label", Format::Plain),
        field(P::PanelLabel as u16, "panel-label", Format::Plain),
        field(P::PackageLabel as u16, "package-label", Format::Plain),
        field(P::Type as u16, "type", Format::Vocab(&types::PIN_TYPE)),
        field(P::Frequency as u16, "frequency", Format::Hz),
        field(P::FrequencySupported as u16, "frequency-supported", Format::Range),
        field(
            P::Capabilities as u16,
            "capabilities",
            Format::Flags(&types::PIN_CAPABILITIES),
        ),
        field(P::PhaseAdjustMin as u16, "phase-adjust-min", Format::Plain),
        field(P::PhaseAdjustMax as u16, "phase-adjust-max", Format::Plain),
        field(P::PhaseAdjustGran as u16, "phase-adjust-gran", Format::Plain),
        field(P::PhaseAdjust as u16, "phase-adjust", Format::Plain),
        field(
            P::FractionalFrequencyOffset as u16,
            "fractional-frequency-offset",
            Format::Ppm,
        ),
        field(P::EsyncFrequency as u16, "esync-frequency", Format::Hz),
        field(
            P::EsyncFrequencySupported as u16,
            "esync-frequency-supported",
            Format::Range,
        ),
        field(P::EsyncPulse as u16, "esync-pulse", Format::Plain),
        field(
            P::ParentDevice as u16,
            "parent-device",
            Format::Group(&PARENT_DEVICE_FIELDS),
        ),
        field(P::ParentPin as u16, "parent-pin", Format::Group(&PARENT_PIN_FIELDS)),
        field(
            P::ReferenceSync as u16,
            "reference-sync",
            Format::Group(&REFERENCE_SYNC_FIELDS),
        ),
    ],
};

impl Object {
    /// Field script used to render this object.
    pub fn script(self) -> &'static Script {
        match self {
            Self::Device => &DEVICE_SCRIPT,
            Self::Pin => &PIN_SCRIPT,
        }
    }
}

/// One presentation step.
#[derive(Debug, Clone, PartialEq)]
pub enum Event<'a> {
    /// Start of a record; `id` is absent if the reply carried none.
    Begin { object: Object, id: Option<u32> },
    /// A single value, at record level or inside an entry.
    Field { field: &'static Field, value: Value<'a> },
    /// Start of a repeated attribute.
    ListStart { field: &'static Field },
    /// One scalar element of a repeated attribute.
    Item { field: &'static Field, value: Value<'a> },
    /// One range element of a repeated attribute.
    Range { min: Option<u64>, max: Option<u64> },
    /// Start of one nested entry of a repeated attribute.
    EntryStart { field: &'static Field },
    EntryEnd,
    ListEnd { field: &'static Field },
    End,
}

impl PartialEq for Field {
    fn eq(&self, other: &Self) -> bool {
        self.attr == other.attr && self.key == other.key
    }
}

/// Rendered form of one record.
#[derive(Debug, Clone, PartialEq)]
pub struct Rendered<'a> {
    pub events: Vec<Event<'a>>,
}

impl Printable for Rendered<'_> {
    fn print_text<W: Write>(&self, w: &mut W, _opts: &OutputOptions) -> std::io::Result<()> {
        super::write_text(w, &self.events)
    }

    fn to_json(&self) -> serde_json::Value {
        super::to_json(&self.events)
    }
}

/// Rendered records of a dump, printed as one document.
#[derive(Debug, Clone)]
pub struct RecordList<'a> {
    pub object: Object,
    pub items: Vec<Rendered<'a>>,
}

impl<'a> PrintableList for RecordList<'a> {
    type Item = Rendered<'a>;

    fn key(&self) -> &str {
        self.object.name()
    }

    fn items(&self) -> &[Rendered<'a>] {
        &self.items
    }
}

fn is_list(record: &Record<'_>, field: &Field) -> bool {
    matches!(field.format, Format::Range | Format::Group(_))
        || record
            .table()
            .get(field.attr)
            .is_some_and(|desc| desc.is_repeated())
}

/// Render a record following `script`.
///
/// # Errors
///
/// Fails only if a nested attribute cannot be decoded.
pub fn render<'a>(record: &Record<'a>, script: &'static Script) -> Result<Rendered<'a>, DecodeError> {
    let mut events = vec![Event::Begin {
        object: script.object,
        id: record.u32(script.id_attr),
    }];

    for field in script.fields {
        if !is_list(record, field) {
            if let Some(value) = record.get(field.attr) {
                events.push(Event::Field { field, value });
            }
            continue;
        }

        let values = record.values(field.attr);
        if values.is_empty() {
            continue;
        }
        let mut items = Vec::with_capacity(values.len());
        match field.format {
            Format::Range => {
                for range in record.nested(field.attr)? {
                    items.push(Event::Range {
                        min: range.u64(P::FrequencyMin as u16),
                        max: range.u64(P::FrequencyMax as u16),
                    });
                }
            }
            Format::Group(members) => {
                for entry in record.nested(field.attr)? {
                    let start = items.len();
                    items.push(Event::EntryStart { field });
                    for member in members {
                        if let Some(value) = entry.get(member.attr) {
                            items.push(Event::Field {
                                field: member,
                                value,
                            });
                        }
                    }
                    // Nothing known inside this entry
                    if items.len() == start + 1 {
                        items.truncate(start);
                        continue;
                    }
                    items.push(Event::EntryEnd);
                }
            }
            _ => {
                for &value in values {
                    items.push(Event::Item { field, value });
                }
            }
        }
        if items.is_empty() {
            continue;
        }
        events.push(Event::ListStart { field });
        events.append(&mut items);
        events.push(Event::ListEnd { field });
    }

    events.push(Event::End);
    Ok(Rendered { events })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netlink::builder::AttrBuilder;
    use crate::netlink::genl::dpll::decode;

    fn keys(rendered: &Rendered<'_>) -> Vec<&'static str> {
        rendered
            .events
            .iter()
            .filter_map(|e| match e {
                Event::Field { field, .. } | Event::ListStart { field } => Some(field.key),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_script_order_not_wire_order() {
        let mut b = AttrBuilder::new();
        b.append_attr_u32(D::LockStatus as u16, 2);
        b.append_attr_str(D::ModuleName as u16, "ice").unwrap();
        b.append_attr_u32(D::Id as u16, 0);
        b.append_attr_u32(D::Mode as u16, 1);
        let buf = b.finish();

        let record = decode(Object::Device.table(), &buf).unwrap();
        let rendered = render(&record, &DEVICE_SCRIPT).unwrap();
        assert_eq!(
            rendered.events[0],
            Event::Begin {
                object: Object::Device,
                id: Some(0)
            }
        );
        assert_eq!(keys(&rendered), vec!["module-name", "mode", "lock-status"]);
        assert_eq!(rendered.events.last(), Some(&Event::End));
    }

    #[test]
    fn test_single_element_list_not_collapsed() {
        let mut b = AttrBuilder::new();
        b.append_attr_u32(D::ModeSupported as u16, 2);
        let buf = b.finish();

        let record = decode(Object::Device.table(), &buf).unwrap();
        let rendered = render(&record, &DEVICE_SCRIPT).unwrap();
        assert!(matches!(rendered.events[1], Event::ListStart { .. }));
        assert!(matches!(rendered.events[2], Event::Item { value: Value::Unsigned(2), .. }));
        assert!(matches!(rendered.events[3], Event::ListEnd { .. }));
    }

    #[test]
    fn test_group_entries() {
        let mut b = AttrBuilder::new();
        b.append_attr_u32(P::Id as u16, 4);
        let nest = b.nest_start(P::ParentDevice as u16);
        b.append_attr_u32(P::State as u16, 1);
        b.append_attr_u32(P::ParentId as u16, 0);
        b.nest_end(nest).unwrap();
        let buf = b.finish();

        let record = decode(Object::Pin.table(), &buf).unwrap();
        let rendered = render(&record, &PIN_SCRIPT).unwrap();
        let labels: Vec<&str> = rendered
            .events
            .iter()
            .filter_map(|e| match e {
                Event::Field { field, .. } => Some(field.label),
                _ => None,
            })
            .collect();
        // members follow the script, not the wire
        assert_eq!(labels, vec!["id", "state"]);
    }
}
