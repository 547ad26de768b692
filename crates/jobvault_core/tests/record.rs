use jobvault_core::{JobRecord, JsonIndent, RecordError};
use pretty_assertions::assert_eq;
use serde_json::json;

fn sample() -> JobRecord {
    JobRecord::from_value(json!({
        "id": "J1",
        "type": "upscale",
        "enqueue_time": "2024-01-02 03:04:05",
        "image_paths": ["https://x/y.png"],
    }))
    .unwrap()
}

#[test]
fn compact_json_has_no_whitespace() {
    let bytes = sample().to_json(JsonIndent(0)).unwrap();
    assert_eq!(
        String::from_utf8(bytes).unwrap(),
        r#"{"id":"J1","type":"upscale","enqueue_time":"2024-01-02 03:04:05","image_paths":["https://x/y.png"]}"#
    );
}

#[test]
fn pretty_json_uses_requested_indent_and_keeps_key_order() {
    let bytes = sample().to_json(JsonIndent(4)).unwrap();
    let expected = "{\n    \"id\": \"J1\",\n    \"type\": \"upscale\",\n    \"enqueue_time\": \"2024-01-02 03:04:05\",\n    \"image_paths\": [\n        \"https://x/y.png\"\n    ]\n}";
    assert_eq!(String::from_utf8(bytes).unwrap(), expected);
}

#[test]
fn default_indent_is_two() {
    assert_eq!(JsonIndent::default(), JsonIndent(2));
    let text = String::from_utf8(sample().to_json(JsonIndent::default()).unwrap()).unwrap();
    assert!(text.starts_with("{\n  \"id\": \"J1\""));
}

#[test]
fn non_objects_are_rejected() {
    assert_eq!(
        JobRecord::from_value(json!(["J1"])).unwrap_err(),
        RecordError::NotAnObject
    );
}

#[test]
fn accessors_ignore_non_string_fields() {
    let record = JobRecord::from_value(json!({"id": 7, "type": "grid", "prompt": null})).unwrap();
    assert_eq!(record.id(), None);
    assert_eq!(record.job_type(), Some("grid"));
    assert_eq!(record.prompt(), None);
    assert_eq!(record.enqueue_time().unwrap_err(), RecordError::MissingField("enqueue_time"));
}
