use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use super::*;
use crate::serial::RemoteRef;

struct Live;
impl RemoteObject for Live {}

fn round_trip(value: &Serial) -> Serial {
	let data = encode(value, &mut refuse_remotes).unwrap();
	decode(&data, &mut refuse_replacements).unwrap()
}

fn pair(first: i32, second: i32) -> Serial {
	Serial::record(Record::new("Pair").with("first", Serial::Int(first)).with("second", Serial::Int(second)))
}

#[test]
fn test_shared_record_decodes_to_one_arc() {
	let shared = pair(1, 2);
	let args = Serial::Array(vec![shared.clone(), shared]);

	let Serial::Array(items) = round_trip(&args) else {
		panic!("expected array");
	};
	assert!(items[0].same(&items[1]));
}

#[test]
fn test_equal_records_stay_distinct() {
	let args = Serial::Array(vec![pair(1, 2), pair(1, 2)]);

	let Serial::Array(items) = round_trip(&args) else {
		panic!("expected array");
	};
	assert_eq!(items[0], items[1]);
	assert!(!items[0].same(&items[1]));
}

#[test]
fn test_nested_sharing_inside_records() {
	let inner = pair(3, 4);
	let outer = Serial::record(Record::new("Wrapper").with("a", inner.clone()).with("b", inner));

	let Serial::Record(record) = round_trip(&outer) else {
		panic!("expected record");
	};
	assert!(record.field("a").unwrap().same(record.field("b").unwrap()));
}

#[test]
fn test_scalars_survive() {
	let value = Serial::Array(vec![
		Serial::Null,
		Serial::Bool(true),
		Serial::Byte(-1),
		Serial::Short(300),
		Serial::Char('x'),
		Serial::Long(1 << 40),
		Serial::Float(1.5),
		Serial::Double(2.25),
		Serial::String("hi".into()),
		Serial::Json(serde_json::json!({"k": [1, 2]})),
		Serial::Enum {
			class: "TestEnum".into(),
			constant: "FOO".into(),
		},
	]);
	assert_eq!(round_trip(&value), value);
}

#[test]
fn test_throwable_chain_survives() {
	let t = Throwable::new("IllegalStateException", "outer").with_cause(Throwable::bare("IoError"));
	let Serial::Throwable(decoded) = round_trip(&Serial::throwable(t.clone())) else {
		panic!("expected throwable");
	};
	assert_eq!(*decoded, t);
}

#[test]
fn test_remote_objects_go_through_hooks() {
	let live: Arc<dyn RemoteObject> = Arc::new(Live);
	let value = Serial::Array(vec![Serial::remote(live.clone()), Serial::remote(live)]);

	let mut seen = 0;
	let data = encode(&value, &mut |_obj: &Arc<dyn RemoteObject>| {
		seen += 1;
		Ok(Replacement::Remote(RemoteRef {
			instance_id: "id-1".into(),
			class_name: "Counter".into(),
			interfaces: vec!["ICounter".into()],
		}))
	})
	.unwrap();
	assert_eq!(seen, 2);

	let mut tokens = Vec::new();
	let decoded = decode(&data, &mut |token| {
		tokens.push(token);
		Ok(Serial::Null)
	})
	.unwrap();
	assert_eq!(decoded, Serial::Array(vec![Serial::Null, Serial::Null]));
	assert!(matches!(&tokens[0], Replacement::Remote(r) if r.instance_id == "id-1"));
}

#[test]
fn test_components_are_refused() {
	let value = Serial::record(Record::new("Wrapper").with("view", Serial::Component("RmiIntegrationView".into())));
	let err = encode(&value, &mut refuse_remotes).unwrap_err();
	assert!(matches!(err, MarshalError::Component(name) if name == "RmiIntegrationView"));
}

#[test]
fn test_unserializable_is_refused() {
	let err = encode(&Serial::Unserializable("Socket".into()), &mut refuse_remotes).unwrap_err();
	assert!(matches!(err, MarshalError::NotSerializable(_)));
}

#[test]
fn test_empty_stream_is_rejected() {
	let err = decode("", &mut refuse_replacements).unwrap_err();
	assert!(matches!(err, UnmarshalError::Empty));
}

#[test]
fn test_bad_base64_is_rejected() {
	let err = decode("not base64!", &mut refuse_replacements).unwrap_err();
	assert!(matches!(err, UnmarshalError::Base64(_)));
}

#[test]
fn test_bad_header_is_rejected() {
	let data = STANDARD.encode([0xAC, 0xED, 0x00, 0x05]);
	let err = decode(&data, &mut refuse_replacements).unwrap_err();
	assert!(matches!(err, UnmarshalError::BadHeader));
}

#[test]
fn test_truncated_body_is_rejected() {
	let data = STANDARD.encode([MAGIC[0], MAGIC[1], VERSION]);
	let err = decode(&data, &mut refuse_replacements).unwrap_err();
	assert!(matches!(err, UnmarshalError::Decode(_)));
}
