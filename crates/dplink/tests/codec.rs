//! Codec properties exercised end to end on in-memory buffers:
//! compile -> decode -> render, without a netlink socket.

use dplink::netlink::AttrBuilder;
use dplink::netlink::genl::dpll::table::PIN_REFERENCE_SYNC;
use dplink::netlink::genl::dpll::{
    CompileError, DEVICE, DpllAttr as D, DpllPinAttr as P, Object, PIN, Value, Verb, compile,
    decode,
};
use dplink::output::{Printable, render, write_text};

#[test]
fn scalar_fields_round_trip() {
    let req = compile(
        Object::Pin,
        Verb::Set,
        &[
            "id",
            "12",
            "frequency",
            "0x989680",
            "prio",
            "3",
            "phase-adjust",
            "-250",
            "esync-frequency",
            "1",
        ],
    )
    .unwrap();
    let rec = decode(&PIN, &req.attrs).unwrap();

    assert_eq!(rec.u32(P::Id as u16), Some(12));
    assert_eq!(rec.u64(P::Frequency as u16), Some(10_000_000));
    assert_eq!(rec.u32(P::Prio as u16), Some(3));
    assert_eq!(rec.i64(P::PhaseAdjust as u16), Some(-250));
    assert_eq!(rec.u64(P::EsyncFrequency as u16), Some(1));
}

#[test]
fn enum_fields_round_trip_to_tokens() {
    let req = compile(
        Object::Pin,
        Verb::Set,
        &["id", "1", "direction", "output", "state", "selectable"],
    )
    .unwrap();
    let rec = decode(&PIN, &req.attrs).unwrap();

    use dplink::netlink::genl::dpll::types::{PIN_DIRECTION, PIN_STATE};
    assert_eq!(PIN_DIRECTION.name(rec.u32(P::Direction as u16).unwrap()), "output");
    assert_eq!(PIN_STATE.name(rec.u32(P::State as u16).unwrap()), "selectable");
}

#[test]
fn pin_id_get_fields_round_trip() {
    let req = compile(
        Object::Pin,
        Verb::IdGet,
        &[
            "module-name",
            "ice",
            "clock-id",
            "0x507c6fffff1fb1b8",
            "board-label",
            "C827_0-RCLKA",
            "panel-label",
            "GNSS-1PPS",
            "package-label",
            "pkg 3",
            "type",
            "synce-eth-port",
        ],
    )
    .unwrap();
    let rec = decode(&PIN, &req.attrs).unwrap();

    use dplink::netlink::genl::dpll::types::PIN_TYPE;
    assert_eq!(rec.str(P::ModuleName as u16), Some("ice"));
    assert_eq!(rec.u64(P::ClockId as u16), Some(0x507c_6fff_ff1f_b1b8));
    assert_eq!(rec.str(P::BoardLabel as u16), Some("C827_0-RCLKA"));
    assert_eq!(rec.str(P::PanelLabel as u16), Some("GNSS-1PPS"));
    assert_eq!(rec.str(P::PackageLabel as u16), Some("pkg 3"));
    assert_eq!(
        PIN_TYPE.name(rec.u32(P::Type as u16).unwrap()),
        "synce-eth-port"
    );
}

#[test]
fn device_id_get_fields_round_trip() {
    let req = compile(
        Object::Device,
        Verb::IdGet,
        &["module-name", "zl3073x", "clock-id", "0xffffffffffffffff", "type", "eec"],
    )
    .unwrap();
    let rec = decode(&DEVICE, &req.attrs).unwrap();

    use dplink::netlink::genl::dpll::types::DEVICE_TYPE;
    assert_eq!(rec.str(D::ModuleName as u16), Some("zl3073x"));
    assert_eq!(rec.u64(D::ClockId as u16), Some(u64::MAX));
    assert_eq!(DEVICE_TYPE.name(rec.u32(D::Type as u16).unwrap()), "eec");
}

#[test]
fn reference_sync_keeps_order() {
    let req = compile(
        Object::Pin,
        Verb::Set,
        &[
            "id",
            "1",
            "reference-sync",
            "3",
            "state",
            "connected",
            "reference-sync",
            "5",
            "state",
            "disconnected",
        ],
    )
    .unwrap();
    let rec = decode(&PIN, &req.attrs).unwrap();
    let syncs = rec.nested(P::ReferenceSync as u16).unwrap();

    assert_eq!(syncs.len(), 2);
    assert_eq!(syncs[0].table(), &PIN_REFERENCE_SYNC);
    assert_eq!(syncs[0].u32(P::Id as u16), Some(3));
    assert_eq!(syncs[0].u32(P::State as u16), Some(1));
    assert_eq!(syncs[1].u32(P::Id as u16), Some(5));
    assert_eq!(syncs[1].u32(P::State as u16), Some(2));
}

#[test]
fn nested_group_closes_before_foreign_keyword() {
    let req = compile(
        Object::Pin,
        Verb::Set,
        &[
            "id",
            "1",
            "parent-device",
            "7",
            "direction",
            "input",
            "prio",
            "2",
            "state",
            "connected",
            "esync-frequency",
            "1000",
        ],
    )
    .unwrap();
    let rec = decode(&PIN, &req.attrs).unwrap();

    assert_eq!(rec.u64(P::EsyncFrequency as u16), Some(1000));
    let parents = rec.nested(P::ParentDevice as u16).unwrap();
    assert_eq!(parents.len(), 1);
    let parent = &parents[0];
    assert_eq!(parent.u32(P::ParentId as u16), Some(7));
    assert_eq!(parent.u32(P::Direction as u16), Some(1));
    assert_eq!(parent.u32(P::Prio as u16), Some(2));
    assert_eq!(parent.u32(P::State as u16), Some(1));
    assert!(!parent.contains(P::EsyncFrequency as u16));
}

#[test]
fn unknown_attributes_are_ignored() {
    let mut with = AttrBuilder::new();
    with.append_attr_u32(D::Id as u16, 4);
    with.append_attr_u32(200, 0xdead);
    with.append_attr_u32(D::Pad as u16, 0);
    with.append_attr_u32(D::Mode as u16, 2);
    let with = with.finish();

    let mut without = AttrBuilder::new();
    without.append_attr_u32(D::Id as u16, 4);
    without.append_attr_u32(D::Mode as u16, 2);
    let without = without.finish();

    assert_eq!(decode(&DEVICE, &with).unwrap(), decode(&DEVICE, &without).unwrap());
}

#[test]
fn duplicate_single_attribute_uses_last() {
    let mut b = AttrBuilder::new();
    b.append_attr_u32(D::Mode as u16, 1);
    b.append_attr_u32(D::Mode as u16, 2);
    let buf = b.finish();

    let rec = decode(&DEVICE, &buf).unwrap();
    assert_eq!(rec.get(D::Mode as u16), Some(Value::Unsigned(2)));
}

fn pin_text(buf: &[u8]) -> String {
    let rec = decode(&PIN, buf).unwrap();
    let rendered = render(&rec, Object::Pin.script()).unwrap();
    let mut out = Vec::new();
    write_text(&mut out, &rendered.events).unwrap();
    String::from_utf8(out).unwrap()
}

#[test]
fn frequency_range_collapses_when_equal() {
    let mut b = AttrBuilder::new();
    for (min, max) in [(10_000_000u64, 10_000_000u64), (1_000_000, 2_000_000)] {
        let nest = b.nest_start(P::FrequencySupported as u16);
        b.append_attr_u64(P::FrequencyMin as u16, min);
        b.append_attr_u64(P::FrequencyMax as u16, max);
        b.nest_end(nest).unwrap();
    }

    let text = pin_text(&b.finish());
    assert!(text.contains("\n    10000000 Hz\n"), "{text}");
    assert!(text.contains("\n    1000000-2000000 Hz\n"), "{text}");
}

#[test]
fn set_without_id_fails() {
    for (object, tokens) in [
        (Object::Pin, vec!["frequency", "10000000", "prio", "1"]),
        (Object::Device, vec!["phase-offset-monitor", "1"]),
    ] {
        let err = compile(object, Verb::Set, &tokens).unwrap_err();
        assert_eq!(err, CompileError::MissingRequired { object: object.name() });
        assert!(err.to_string().contains("id is required"));
    }
}

#[test]
fn temperature_text_and_json() {
    let mut b = AttrBuilder::new();
    b.append_attr_u32(D::Id as u16, 0);
    b.append_attr_s32(D::Temp as u16, 23456);
    let buf = b.finish();

    let rec = decode(&DEVICE, &buf).unwrap();
    let rendered = render(&rec, Object::Device.script()).unwrap();

    let mut out = Vec::new();
    rendered
        .print_text(&mut out, &Default::default())
        .unwrap();
    assert!(String::from_utf8(out).unwrap().contains("  temperature: 23.456 C\n"));

    let json = rendered.to_json();
    assert_eq!(json["temperature"].as_f64(), Some(23.456));
}
