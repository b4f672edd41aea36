use super::*;
use serde_json::json;

#[test]
fn event_type_maps_reserved_lifecycle_names() {
    assert_eq!(EventType::from("connected"), EventType::Connected);
    assert_eq!(EventType::from("disconnected"), EventType::Disconnected);
    assert_eq!(EventType::from("error"), EventType::Error);
    assert_eq!(EventType::from("matched".to_owned()), EventType::Named("matched".into()));
}

#[test]
fn event_type_display_uses_wire_name() {
    assert_eq!(EventType::Connected.to_string(), "connected");
    assert_eq!(EventType::Named("score".into()).to_string(), "score");
    assert!(EventType::Error.is_lifecycle());
    assert!(!EventType::Named("x".into()).is_lifecycle());
}

#[test]
fn event_decodes_data_field_as_payload() {
    let event: Event =
        serde_json::from_value(json!({"type": "matched", "timestamp": 12.5, "data": {"pair": [1, 2]}})).unwrap();
    assert_eq!(event.event_type, "matched");
    assert!((event.timestamp - 12.5).abs() < f64::EPSILON);
    assert_eq!(event.payload, json!({"pair": [1, 2]}));
    assert_eq!(event.kind(), EventType::Named("matched".into()));
}

#[test]
fn event_accepts_payload_alias_and_missing_fields() {
    let event: Event = serde_json::from_value(json!({"type": "tick", "payload": 3})).unwrap();
    assert_eq!(event.payload, json!(3));
    assert!(event.timestamp.abs() < f64::EPSILON);

    let bare: Event = serde_json::from_value(json!({"type": "tick"})).unwrap();
    assert_eq!(bare.payload, Value::Null);
}

#[test]
fn event_serializes_payload_as_data() {
    let event = Event::new("x", 1.0, json!({"k": "v"}));
    let value = serde_json::to_value(&event).unwrap();
    assert_eq!(value, json!({"type": "x", "timestamp": 1.0, "data": {"k": "v"}}));
}
