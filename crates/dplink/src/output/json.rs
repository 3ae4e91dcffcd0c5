//! JSON output formatting.

use serde_json::{Map, Number, Value as Json};

use super::formatting::{millidegrees_to_f64, vocab_name};
use super::render::{Event, Format};
use crate::netlink::genl::dpll::Value;

/// Convert one value for JSON output.
fn json_value(format: Format, value: Value<'_>) -> Json {
    match (format, value) {
        (_, Value::Text(s)) => Json::String(s.to_string()),
        (Format::Millidegrees, Value::Signed(v)) => Number::from_f64(millidegrees_to_f64(v))
            .map_or(Json::Null, Json::Number),
        (Format::Vocab(vocab), Value::Unsigned(v)) => Json::String(vocab_name(vocab, v).to_string()),
        (Format::Flags(vocab), Value::Unsigned(v)) => Json::Array(
            vocab
                .flags(u32::try_from(v).unwrap_or(u32::MAX))
                .into_iter()
                .map(|name| Json::String(name.to_string()))
                .collect(),
        ),
        (_, Value::Unsigned(v)) => Json::from(v),
        (_, Value::Signed(v)) => Json::from(v),
        (_, Value::Nested(_)) => Json::Null,
    }
}

/// Build one JSON object from rendered events.
///
/// Keys appear in script order; repeated attributes are always arrays.
pub fn to_json(events: &[Event<'_>]) -> Json {
    let mut root = Map::new();
    let mut list: Option<Vec<Json>> = None;
    let mut entry: Option<Map<String, Json>> = None;

    for event in events {
        match event {
            Event::Begin { id, .. } => {
                if let Some(id) = id {
                    root.insert("id".to_string(), Json::from(*id));
                }
            }
            Event::Field { field, value } => {
                let target = entry.as_mut().unwrap_or(&mut root);
                target.insert(field.key.to_string(), json_value(field.format, *value));
            }
            Event::ListStart { .. } => list = Some(Vec::new()),
            Event::Item { field, value } => {
                if let Some(items) = list.as_mut() {
                    items.push(json_value(field.format, *value));
                }
            }
            Event::Range { min, max } => {
                let mut range = Map::new();
                if let Some(min) = min {
                    range.insert("frequency-min".to_string(), Json::from(*min));
                }
                if let Some(max) = max {
                    range.insert("frequency-max".to_string(), Json::from(*max));
                }
                if let Some(items) = list.as_mut() {
                    items.push(Json::Object(range));
                }
            }
            Event::EntryStart { .. } => entry = Some(Map::new()),
            Event::EntryEnd => {
                if let (Some(done), Some(items)) = (entry.take(), list.as_mut()) {
                    items.push(Json::Object(done));
                }
            }
            Event::ListEnd { field } => {
                let items = list.take().unwrap_or_default();
                root.insert(field.key.to_string(), Json::Array(items));
            }
            Event::End => {}
        }
    }
    Json::Object(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netlink::builder::AttrBuilder;
    use crate::netlink::genl::dpll::{DpllAttr as D, DpllPinAttr as P, Object, decode};
    use crate::output::render::render;

    fn json(object: Object, buf: &[u8]) -> String {
        let record = decode(object.table(), buf).unwrap();
        let rendered = render(&record, object.script()).unwrap();
        to_json(&rendered.events).to_string()
    }

    #[test]
    fn test_device_json() {
        let mut b = AttrBuilder::new();
        b.append_attr_u32(D::Id as u16, 1);
        b.append_attr_u64(D::ClockId as u16, 0x10);
        b.append_attr_s32(D::Temp as u16, 23456);
        b.append_attr_u32(D::ModeSupported as u16, 2);
        b.append_attr_u32(D::PhaseOffsetMonitor as u16, 0);

        assert_eq!(
            json(Object::Device, &b.finish()),
            r#"{"id":1,"clock-id":16,"temperature":23.456,"mode-supported":["automatic"],"phase-offset-monitor":"disable"}"#
        );
    }

    #[test]
    fn test_pin_json_nested() {
        let mut b = AttrBuilder::new();
        b.append_attr_u32(P::Id as u16, 2);
        let nest = b.nest_start(P::FrequencySupported as u16);
        b.append_attr_u64(P::FrequencyMin as u16, 1);
        b.append_attr_u64(P::FrequencyMax as u16, 1);
        b.nest_end(nest).unwrap();
        b.append_attr_u32(P::Capabilities as u16, 0x3);
        let nest = b.nest_start(P::ParentPin as u16);
        b.append_attr_u32(P::ParentId as u16, 13);
        b.append_attr_u32(P::State as u16, 3);
        b.nest_end(nest).unwrap();

        assert_eq!(
            json(Object::Pin, &b.finish()),
            concat!(
                r#"{"id":2,"frequency-supported":[{"frequency-min":1,"frequency-max":1}],"#,
                r#""capabilities":["priority-can-change","direction-can-change"],"#,
                r#""parent-pin":[{"parent-id":13,"state":"selectable"}]}"#
            )
        );
    }
}
