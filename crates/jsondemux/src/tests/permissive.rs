use rstest::rstest;

use crate::{
    DemuxError, DemuxOptions, JsonDemux, Schema, UnknownFieldPolicy, Value, ValueKind,
};

fn permissive() -> JsonDemux {
    JsonDemux::with_options(
        Schema::builder().single("a", ValueKind::Integer).build(),
        DemuxOptions {
            unknown_fields: UnknownFieldPolicy::Skip,
            ..Default::default()
        },
    )
}

#[rstest]
#[case::scalar(r#"{"zz": true, "a": 7}"#)]
#[case::number(r#"{"zz": -12.5e3, "a": 7}"#)]
#[case::string(r#"{"zz": "ignored", "a": 7}"#)]
#[case::string_with_escapes(r#"{"zz": "a\"}", "a": 7}"#)]
#[case::empty_object(r#"{"zz": {}, "a": 7}"#)]
#[case::deep_object(r#"{"zz": {"deep": [1, "}"], "more": {"x": null}}, "a": 7}"#)]
#[case::array(r#"{"zz": [1, [2, 3], {"k": "]"}], "a": 7}"#)]
#[case::unknown_after_known(r#"{"a": 7, "zz": [1, 2]}"#)]
#[case::several_unknowns(r#"{"x": 1, "a": 7, "y": "s"}"#)]
fn unknown_values_are_swallowed(#[case] input: &str) {
    let mut demux = permissive();
    demux.feed(input).unwrap();
    assert!(demux.is_complete());
    assert_eq!(demux.single("a").try_value(), Some(Ok(Value::Integer(7))));
}

#[test]
fn skipped_values_reach_no_sink() {
    let mut demux = permissive();
    demux.feed(r#"{"zz": 123, "a": 7}"#).unwrap();
    // Only the declared field carries a value; nothing else is observable.
    assert_eq!(demux.schema().len(), 1);
    assert_eq!(demux.single("a").try_value(), Some(Ok(Value::Integer(7))));
}

#[test]
fn strict_mode_rejects_the_same_input() {
    let schema = Schema::builder().single("a", ValueKind::Integer).build();
    let mut demux = JsonDemux::new(schema);
    let err = demux.feed(r#"{"zz": true, "a": 7}"#).unwrap_err();
    assert_eq!(err, DemuxError::UnknownField { name: "zz".into() });
}

#[test]
fn skipping_still_rejects_a_missing_value() {
    let mut demux = permissive();
    let err = demux.feed(r#"{"zz": }"#).unwrap_err();
    assert!(matches!(err, DemuxError::MalformedInput { .. }));
}

#[test]
fn chunked_skipping() {
    let mut demux = permissive();
    for ch in r#"{"zz": {"deep": "}"}, "a": 7}"#.chars() {
        demux.feed_char(ch).unwrap();
    }
    assert!(demux.is_complete());
    assert_eq!(demux.single("a").try_value(), Some(Ok(Value::Integer(7))));
}
