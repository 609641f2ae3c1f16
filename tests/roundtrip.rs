//! End-to-end properties of the record/pack model and both codecs

use std::sync::{Arc, Mutex};

use senml_stream::{
    SenMLPack, SenMLRecord, SenMLUnit, SenMLValue, SliceSource, StreamFormat,
};

/// A pack exercising every value kind plus a nested child-device pack
fn full_tree() -> SenMLPack {
    let mut gateway = SenMLPack::new("gw1;")
        .with_base_unit(SenMLUnit::Celsius)
        .with_base_time(1262304000.0);
    gateway.add(SenMLRecord::with_value("temp", 20.5).with_time(0.25));
    gateway.add(SenMLRecord::with_bool_value("door", true));
    gateway.add(SenMLRecord::with_string_value("status", "charging"));
    gateway.add(SenMLRecord::with_data_value("cfg", b"test".to_vec()));
    gateway.add(SenMLRecord::with_sum("energy", 120.5).with_unit(SenMLUnit::Joule));

    let mut child = SenMLPack::new("node7;").with_base_time(1262304100.0);
    child.add(SenMLRecord::with_value("rssi", -70.0).with_unit(SenMLUnit::Decibel));
    gateway.add(child);
    gateway
}

/// The same tree with no values, units, or times filled in: what a device
/// registers before parsing an actuation document into it
fn empty_tree() -> SenMLPack {
    let mut gateway = SenMLPack::new("gw1;");
    gateway.add(SenMLRecord::new("temp"));
    gateway.add(SenMLRecord::new("door"));
    gateway.add(SenMLRecord::new("status"));
    gateway.add(SenMLRecord::new("cfg"));
    gateway.add(SenMLRecord::new("energy"));
    let mut child = SenMLPack::new("node7;");
    child.add(SenMLRecord::new("rssi"));
    gateway.add(child);
    gateway
}

#[test]
fn json_roundtrip_reproduces_every_record() {
    let source = full_tree();
    let json = source.to_json().unwrap();

    let mut target = empty_tree();
    target.from_json_str(&json).unwrap();

    assert_eq!(target, source);
}

#[test]
fn cbor_roundtrip_reproduces_every_record() {
    let source = full_tree();
    let bytes = source.to_cbor().unwrap();

    let mut target = empty_tree();
    target.from_cbor_slice(&bytes).unwrap();

    assert_eq!(target, source);
}

#[test]
fn json_roundtrip_over_hex_framing() {
    let source = full_tree();
    let mut hex: Vec<u8> = Vec::new();
    source.write_json(&mut hex, StreamFormat::Hex).unwrap();
    assert!(hex.iter().all(u8::is_ascii_hexdigit));

    let mut target = empty_tree();
    let mut reader = SliceSource::new(&hex);
    target.from_json(&mut reader, StreamFormat::Hex).unwrap();

    assert_eq!(target, source);
}

#[test]
fn single_record_renders_concrete_bytes() {
    let mut pack = SenMLPack::new("dev1");
    pack.add(SenMLRecord::with_value("temp", 20.5));
    assert_eq!(pack.to_json().unwrap(), r#"[{"bn":"dev1","n":"temp","v":20.5}]"#);
}

#[test]
fn single_leaf_child_inlines_into_one_object() {
    let mut pack = SenMLPack::new("dev1");
    pack.add(SenMLRecord::with_value("temp", 20.5));

    let json = pack.to_json().unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed.as_array().unwrap().len(), 1);
}

#[test]
fn pack_first_child_renders_separate_objects() {
    let mut inner = SenMLPack::new("gw");
    inner.add(SenMLRecord::with_value("door", 1.0));
    let mut pack = SenMLPack::new("dev1");
    pack.add(inner);

    let json = pack.to_json().unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert!(parsed.as_array().unwrap().len() >= 2);
}

#[test]
fn cbor_header_counts_match_decoded_structure() {
    let tree = full_tree();
    let bytes = tree.to_cbor().unwrap();

    // an independent decoder accepts the document, so every array and map
    // header declared exactly the number of items that followed
    let value: ciborium::Value = ciborium::de::from_reader(bytes.as_slice()).unwrap();
    let elements = value.as_array().unwrap();
    assert_eq!(elements.len(), tree.array_length());
    let first = elements[0].as_map().unwrap();
    assert_eq!(first.len(), tree.field_length());
}

#[test]
fn base_time_change_preserves_absolute_times() {
    let mut pack = SenMLPack::new("dev1");
    pack.set_base_time(100.0);
    pack.add(SenMLRecord::with_value("temp", 1.0).with_time(7.5));

    pack.set_base_time(104.0);

    let child = pack.children()[0].as_record().unwrap();
    assert_eq!(child.time, Some(3.5));
    // absolute: 100.0 + 7.5 == 104.0 + 3.5
    assert_eq!(100.0 + 7.5, 104.0 + child.time.unwrap());
}

#[test]
fn clear_on_empty_pack_is_a_safe_noop() {
    let mut pack = SenMLPack::new("dev1");
    for _ in 0..3 {
        pack.clear();
        assert!(pack.is_empty());
    }
}

#[test]
fn binary_actuator_fires_on_json_base64() {
    let received: Arc<Mutex<Option<Vec<u8>>>> = Arc::new(Mutex::new(None));
    let sink = received.clone();

    let mut pack = SenMLPack::new("dev1");
    pack.add(SenMLRecord::binary_actuator(
        "blob",
        Box::new(move |bytes| *sink.lock().unwrap() = Some(bytes.to_vec())),
    ));

    pack.from_json_str(r#"[{"bn":"dev1","n":"blob","vd":"dGVzdA=="}]"#)
        .unwrap();

    let received = received.lock().unwrap().clone().unwrap();
    assert_eq!(received.len(), 4);
    assert_eq!(received, b"test");
}

#[test]
fn binary_actuator_fires_on_cbor_native_bytes() {
    let mut source = SenMLPack::new("dev1");
    source.add(SenMLRecord::with_data_value("blob", vec![0xde, 0xad, 0xbe]));
    let bytes = source.to_cbor().unwrap();

    let received: Arc<Mutex<Option<Vec<u8>>>> = Arc::new(Mutex::new(None));
    let sink = received.clone();
    let mut pack = SenMLPack::new("dev1");
    pack.add(SenMLRecord::binary_actuator(
        "blob",
        Box::new(move |data| *sink.lock().unwrap() = Some(data.to_vec())),
    ));

    pack.from_cbor_slice(&bytes).unwrap();
    assert_eq!(received.lock().unwrap().clone().unwrap(), vec![0xde, 0xad, 0xbe]);
}

#[test]
fn base_fields_arriving_without_base_name_apply_to_current_pack() {
    let mut pack = SenMLPack::new("dev1");
    pack.add(SenMLRecord::new("temp"));

    pack.from_json_str(r#"[{"bn":"dev1","n":"temp","v":1},{"bu":"Cel","n":"temp","v":2}]"#)
        .unwrap();

    assert_eq!(pack.base_unit, Some(SenMLUnit::Celsius));
    assert_eq!(
        pack.children()[0].as_record().unwrap().value,
        SenMLValue::Float {
            value: 2.0,
            precision: None
        }
    );
}

#[test]
fn unmatched_records_leave_tree_intact() {
    let mut pack = SenMLPack::new("dev1");
    pack.add(SenMLRecord::new("temp"));

    pack.from_json_str(r#"[{"bn":"other","n":"pressure","v":5}]"#)
        .unwrap();

    assert!(!pack.children()[0].as_record().unwrap().has_value());
}

#[test]
fn json_output_matches_independent_parser() {
    let json = full_tree().to_json().unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();

    let first = &parsed.as_array().unwrap()[0];
    assert_eq!(first["bn"], "gw1;");
    assert_eq!(first["bu"], "Cel");
    assert_eq!(first["n"], "temp");
    assert_eq!(first["v"], 20.5);
    // absent fields are omitted, never null
    assert!(first.get("bs").is_none());
}
