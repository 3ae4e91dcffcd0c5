//! Table-driven TLV decoder.
//!
//! [`decode`] walks one object's attribute buffer and buckets every known
//! attribute by type. Single-valued attributes keep the last occurrence;
//! repeated ones keep every occurrence in wire order. Nested payloads are
//! kept as raw slices and decoded only when asked for, with
//! [`Record::nested`].
//!
//! Unknown attribute types are skipped so that newer kernels do not break
//! this decoder. A payload too short for its declared type is treated as
//! absent.

use std::collections::BTreeMap;

use super::table::{AttrDesc, AttrKind, AttrTable};
use crate::netlink::attr::{AttrIter, get};

/// Decoding failure for one reply.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// Storage for a repeated attribute could not be reserved.
    #[error("cannot allocate storage for {count} {attr} attributes")]
    Resource { attr: &'static str, count: usize },
}

/// One decoded attribute value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Value<'a> {
    Unsigned(u64),
    Signed(i64),
    Text(&'a str),
    /// Undecoded nested attribute payload.
    Nested(&'a [u8]),
}

impl<'a> Value<'a> {
    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            Self::Unsigned(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Self::Signed(v) => Some(v),
            Self::Unsigned(v) => i64::try_from(v).ok(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&'a str> {
        match *self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Decode a nested payload against `table`.
    pub fn decode(&self, table: &'static AttrTable) -> Result<Option<Record<'a>>, DecodeError> {
        match *self {
            Self::Nested(buf) => decode(table, buf).map(Some),
            _ => Ok(None),
        }
    }
}

/// Storage for one attribute type.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Slot<'a> {
    One(Value<'a>),
    Many(Vec<Value<'a>>),
}

/// Decoded attributes of one object.
///
/// Absent attributes have no slot; a zero value is still present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record<'a> {
    table: &'static AttrTable,
    slots: BTreeMap<u16, Slot<'a>>,
}

impl<'a> Record<'a> {
    /// Table the record was decoded against.
    pub fn table(&self) -> &'static AttrTable {
        self.table
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn contains(&self, id: u16) -> bool {
        self.slots.contains_key(&id)
    }

    /// Value of a single-valued attribute.
    pub fn get(&self, id: u16) -> Option<Value<'a>> {
        match self.slots.get(&id)? {
            Slot::One(v) => Some(*v),
            Slot::Many(_) => None,
        }
    }

    /// Every value of an attribute, in wire order.
    pub fn values(&self, id: u16) -> &[Value<'a>] {
        match self.slots.get(&id) {
            Some(Slot::One(v)) => std::slice::from_ref(v),
            Some(Slot::Many(vs)) => vs,
            None => &[],
        }
    }

    pub fn u32(&self, id: u16) -> Option<u32> {
        self.u64(id).and_then(|v| u32::try_from(v).ok())
    }

    pub fn u64(&self, id: u16) -> Option<u64> {
        self.get(id)?.as_u64()
    }

    pub fn i64(&self, id: u16) -> Option<i64> {
        self.get(id)?.as_i64()
    }

    pub fn str(&self, id: u16) -> Option<&'a str> {
        self.get(id)?.as_str()
    }

    /// Decode every occurrence of a nested attribute against its sub-table.
    pub fn nested(&self, id: u16) -> Result<Vec<Record<'a>>, DecodeError> {
        let Some(AttrKind::Nested(sub)) = self.table.get(id).map(|d| d.kind) else {
            return Ok(Vec::new());
        };
        let mut out = Vec::new();
        for value in self.values(id) {
            if let Some(record) = value.decode(sub)? {
                out.push(record);
            }
        }
        Ok(out)
    }
}

/// Convert one payload according to its descriptor.
fn parse_value<'a>(desc: &AttrDesc, payload: &'a [u8]) -> Option<Value<'a>> {
    let parsed = match desc.kind {
        AttrKind::U8 => get::u8(payload).map(|v| Value::Unsigned(v.into())),
        AttrKind::U32 => get::u32_ne(payload).map(|v| Value::Unsigned(v.into())),
        AttrKind::U64 => get::u64_ne(payload).map(Value::Unsigned),
        AttrKind::S32 => get::i32_ne(payload).map(|v| Value::Signed(v.into())),
        AttrKind::S64 => get::i64_ne(payload).map(Value::Signed),
        AttrKind::Sint => get::sint(payload).map(Value::Signed),
        AttrKind::Text => get::string(payload).map(Value::Text),
        AttrKind::Nested(_) => Ok(Value::Nested(payload)),
    };
    match parsed {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::debug!(attr = desc.name, "skipping malformed attribute: {}", e);
            None
        }
    }
}

/// Decode an attribute buffer against `table`.
///
/// Repeated attributes are counted first so each sequence is reserved once.
///
/// # Errors
///
/// [`DecodeError::Resource`] when that reservation fails.
pub fn decode<'a>(table: &'static AttrTable, buf: &'a [u8]) -> Result<Record<'a>, DecodeError> {
    let mut counts: BTreeMap<u16, usize> = BTreeMap::new();
    for (kind, _) in AttrIter::new(buf) {
        match table.get(kind) {
            Some(desc) if desc.is_repeated() => *counts.entry(kind).or_default() += 1,
            Some(_) => {}
            None => tracing::debug!(table = table.name, kind, "skipping unknown attribute"),
        }
    }

    let mut slots = BTreeMap::new();
    for (&kind, &count) in &counts {
        let mut seq = Vec::new();
        if seq.try_reserve_exact(count).is_err() {
            let attr = table.get(kind).map_or("unknown", |d| d.name);
            return Err(DecodeError::Resource { attr, count });
        }
        slots.insert(kind, Slot::Many(seq));
    }

    for (kind, payload) in AttrIter::new(buf) {
        let Some(desc) = table.get(kind) else {
            continue;
        };
        let Some(value) = parse_value(desc, payload) else {
            continue;
        };
        if desc.is_repeated() {
            if let Some(Slot::Many(seq)) = slots.get_mut(&kind) {
                seq.push(value);
            }
        } else {
            slots.insert(kind, Slot::One(value));
        }
    }

    // Every occurrence of a repeated type may have been malformed
    slots.retain(|_, slot| !matches!(slot, Slot::Many(seq) if seq.is_empty()));

    Ok(Record { table, slots })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netlink::builder::AttrBuilder;
    use crate::netlink::genl::dpll::table::{DEVICE, PIN};
    use crate::netlink::genl::dpll::{DpllAttr as D, DpllPinAttr as P};

    #[test]
    fn test_zero_is_present() {
        let mut b = AttrBuilder::new();
        b.append_attr_u32(D::Id as u16, 0);
        let buf = b.finish();

        let rec = decode(&DEVICE, &buf).unwrap();
        assert_eq!(rec.u32(D::Id as u16), Some(0));
        assert!(!rec.contains(D::Mode as u16));
        assert_eq!(rec.u32(D::Mode as u16), None);
    }

    #[test]
    fn test_repeated_in_wire_order() {
        let mut b = AttrBuilder::new();
        b.append_attr_u32(D::ModeSupported as u16, 2);
        b.append_attr_u32(D::Id as u16, 5);
        b.append_attr_u32(D::ModeSupported as u16, 1);
        let buf = b.finish();

        let rec = decode(&DEVICE, &buf).unwrap();
        assert_eq!(
            rec.values(D::ModeSupported as u16),
            &[Value::Unsigned(2), Value::Unsigned(1)]
        );
        assert_eq!(rec.values(D::Id as u16), &[Value::Unsigned(5)]);
        assert!(rec.values(D::Temp as u16).is_empty());
    }

    #[test]
    fn test_single_last_wins() {
        let mut b = AttrBuilder::new();
        b.append_attr_u32(D::LockStatus as u16, 1);
        b.append_attr_u32(D::LockStatus as u16, 4);
        let buf = b.finish();

        let rec = decode(&DEVICE, &buf).unwrap();
        assert_eq!(rec.u32(D::LockStatus as u16), Some(4));
    }

    #[test]
    fn test_malformed_payload_is_absent() {
        let mut b = AttrBuilder::new();
        b.append_attr(D::ClockId as u16, &[1, 2, 3]).unwrap();
        b.append_attr_u32(D::Id as u16, 9);
        let buf = b.finish();

        let rec = decode(&DEVICE, &buf).unwrap();
        assert!(!rec.contains(D::ClockId as u16));
        assert_eq!(rec.u32(D::Id as u16), Some(9));
    }

    #[test]
    fn test_signed_and_text() {
        let mut b = AttrBuilder::new();
        b.append_attr_s32(D::Temp as u16, -500);
        b.append_attr_str(D::ModuleName as u16, "zl3073x").unwrap();
        let buf = b.finish();

        let rec = decode(&DEVICE, &buf).unwrap();
        assert_eq!(rec.i64(D::Temp as u16), Some(-500));
        assert_eq!(rec.str(D::ModuleName as u16), Some("zl3073x"));
    }

    #[test]
    fn test_nested_decoded_lazily() {
        let mut b = AttrBuilder::new();
        for (parent, prio) in [(0u32, 3u32), (1, 7)] {
            let nest = b.nest_start(P::ParentDevice as u16);
            b.append_attr_u32(P::ParentId as u16, parent);
            b.append_attr_u32(P::Prio as u16, prio);
            b.nest_end(nest).unwrap();
        }
        let buf = b.finish();

        let rec = decode(&PIN, &buf).unwrap();
        assert!(matches!(rec.values(P::ParentDevice as u16)[0], Value::Nested(_)));

        let parents = rec.nested(P::ParentDevice as u16).unwrap();
        assert_eq!(parents.len(), 2);
        assert_eq!(parents[1].u32(P::ParentId as u16), Some(1));
        assert_eq!(parents[1].u32(P::Prio as u16), Some(7));
        assert!(rec.nested(P::ParentPin as u16).unwrap().is_empty());
    }

    #[test]
    fn test_empty_buffer() {
        let rec = decode(&PIN, &[]).unwrap();
        assert!(rec.is_empty());
    }
}
