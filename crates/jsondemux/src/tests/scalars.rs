use crate::{DemuxError, JsonDemux, Schema, Value, ValueKind};

fn scalar_schema() -> Schema {
    Schema::builder()
        .single("a", ValueKind::String)
        .single("b", ValueKind::Integer)
        .single("c", ValueKind::Float)
        .single("d", ValueKind::Boolean)
        .single("e", ValueKind::Null)
        .build()
}

#[tokio::test]
async fn all_scalar_kinds_resolve() {
    let mut demux = JsonDemux::new(scalar_schema());
    demux
        .feed(r#"{"a": "hi", "b": 42, "c": 3.5, "d": true, "e": null}"#)
        .unwrap();
    assert!(demux.is_complete());

    assert_eq!(
        demux.single("a").value().await.unwrap(),
        Value::String("hi".into())
    );
    assert_eq!(demux.single("b").value().await.unwrap(), Value::Integer(42));
    assert_eq!(demux.single("c").value().await.unwrap(), Value::Float(3.5));
    assert_eq!(
        demux.single("d").value().await.unwrap(),
        Value::Boolean(true)
    );
    assert_eq!(demux.single("e").value().await.unwrap(), Value::Null);
}

#[test]
fn field_order_does_not_matter() {
    let mut demux = JsonDemux::new(scalar_schema());
    demux
        .feed(r#"{"e": null, "d": false, "c": -2.5e2, "b": -1, "a": ""}"#)
        .unwrap();

    assert_eq!(demux.single("a").try_value(), Some(Ok(Value::String(String::new()))));
    assert_eq!(demux.single("b").try_value(), Some(Ok(Value::Integer(-1))));
    assert_eq!(demux.single("c").try_value(), Some(Ok(Value::Float(-250.0))));
    assert_eq!(demux.single("d").try_value(), Some(Ok(Value::Boolean(false))));
    assert_eq!(demux.single("e").try_value(), Some(Ok(Value::Null)));
}

#[test]
fn whitespace_between_tokens_is_skipped() {
    let schema = Schema::builder().single("b", ValueKind::Integer).build();
    let mut demux = JsonDemux::new(schema);
    demux.feed("  \t\n{ \"b\" \r\n:\t 42 \n}  \n").unwrap();
    assert!(demux.is_complete());
    assert_eq!(demux.single("b").try_value(), Some(Ok(Value::Integer(42))));
}

#[test]
fn number_terminated_by_whitespace_before_close() {
    let schema = Schema::builder().single("b", ValueKind::Integer).build();
    let mut demux = JsonDemux::new(schema);
    demux.feed(r#"{"b": 42 }"#).unwrap();
    assert_eq!(demux.single("b").try_value(), Some(Ok(Value::Integer(42))));
}

#[test]
fn integer_extremes() {
    let schema = Schema::builder()
        .single("min", ValueKind::Integer)
        .single("max", ValueKind::Integer)
        .build();
    let mut demux = JsonDemux::new(schema);
    demux
        .feed(r#"{"min": -9223372036854775808, "max": 9223372036854775807}"#)
        .unwrap();
    assert_eq!(
        demux.single("min").try_value(),
        Some(Ok(Value::Integer(i64::MIN)))
    );
    assert_eq!(
        demux.single("max").try_value(),
        Some(Ok(Value::Integer(i64::MAX)))
    );
}

#[test]
fn integer_accepted_by_float_field() {
    let schema = Schema::builder().single("c", ValueKind::Float).build();
    let mut demux = JsonDemux::new(schema);
    demux.feed(r#"{"c": 42}"#).unwrap();
    assert_eq!(demux.single("c").try_value(), Some(Ok(Value::Float(42.0))));
}

#[test]
fn enumerated_member_resolves() {
    let schema = Schema::builder()
        .single("k", ValueKind::enumerated(["value1", "value2"]))
        .build();
    let mut demux = JsonDemux::new(schema);
    demux.feed(r#"{"k": "value1"}"#).unwrap();
    assert_eq!(
        demux.single("k").try_value(),
        Some(Ok(Value::String("value1".into())))
    );
}

#[test]
fn empty_object_with_empty_schema_completes() {
    let mut demux = JsonDemux::new(Schema::builder().build());
    demux.feed("{}").unwrap();
    assert!(demux.is_complete());
}

#[test]
fn duplicate_key_is_a_double_resolve() {
    let schema = Schema::builder().single("b", ValueKind::Integer).build();
    let mut demux = JsonDemux::new(schema);
    let err = demux.feed(r#"{"b": 1, "b": 2}"#).unwrap_err();
    assert_eq!(err, DemuxError::AlreadyTerminal);
}

#[test]
fn chunked_feeding_matches_single_feed() {
    let mut whole = JsonDemux::new(scalar_schema());
    whole
        .feed(r#"{"a": "hi", "b": 42, "c": 3.5, "d": true, "e": null}"#)
        .unwrap();

    let mut chunked = JsonDemux::new(scalar_schema());
    chunked.feed(r#"{"a": "h"#).unwrap();
    chunked.feed(r#"i", "b": 4"#).unwrap();
    chunked.feed(r#"2, "c": 3."#).unwrap();
    chunked.feed(r#"5, "d": true, "e": nul"#).unwrap();
    chunked.feed(r#"l}"#).unwrap();

    for name in ["a", "b", "c", "d", "e"] {
        assert_eq!(
            whole.single(name).try_value(),
            chunked.single(name).try_value(),
            "field {name}"
        );
    }
}
