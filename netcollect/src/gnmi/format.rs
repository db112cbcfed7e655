//! Render a `GetResponse` as indented JSON.
//!
//! One object per notification, with `updates` keyed by the update path
//! and values decoded from their typed encoding.

use std::collections::BTreeMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{SecondsFormat, TimeZone, Utc};
use serde::Serialize;
use serde_json::{Number, Value};

use super::path::path_to_string;
use super::proto::{GetResponse, Notification, TypedValue, typed_value};

#[derive(Debug, Serialize)]
struct NotificationMsg {
    #[serde(skip_serializing_if = "Option::is_none")]
    timestamp: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    time: Option<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    prefix: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    target: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    updates: Vec<UpdateMsg>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    deletes: Vec<String>,
}

#[derive(Debug, Serialize)]
struct UpdateMsg {
    #[serde(rename = "Path")]
    path: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    values: BTreeMap<String, Value>,
}

/// Format the response as a JSON array indented with one space.
pub fn format_get_response(response: &GetResponse) -> Result<String, serde_json::Error> {
    let messages: Vec<NotificationMsg> = response.notification.iter().map(notification_msg).collect();

    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b" ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    messages.serialize(&mut serializer)?;
    Ok(String::from_utf8_lossy(&out).into_owned())
}

fn notification_msg(n: &Notification) -> NotificationMsg {
    let (timestamp, time) = if n.timestamp != 0 {
        let time = Utc
            .timestamp_nanos(n.timestamp)
            .to_rfc3339_opts(SecondsFormat::Nanos, true);
        (Some(n.timestamp), Some(time))
    } else {
        (None, None)
    };

    let updates = n
        .update
        .iter()
        .map(|upd| {
            let path = upd.path.clone().unwrap_or_default();
            let key = path
                .elem
                .iter()
                .map(|e| e.name.as_str())
                .collect::<Vec<_>>()
                .join("/");
            let mut values = BTreeMap::new();
            values.insert(key, upd.val.as_ref().map_or(Value::Null, typed_value_to_json));
            UpdateMsg {
                path: path_to_string(&path),
                values,
            }
        })
        .collect();

    NotificationMsg {
        timestamp,
        time,
        prefix: n.prefix.as_ref().map(path_to_string).unwrap_or_default(),
        target: n.prefix.as_ref().map(|p| p.target.clone()).unwrap_or_default(),
        updates,
        deletes: n.delete.iter().map(path_to_string).collect(),
    }
}

fn float(f: f64) -> Value {
    Number::from_f64(f).map_or(Value::Null, Value::Number)
}

/// Decode a typed value into JSON.
///
/// JSON-encoded values are parsed; if they are not valid JSON the raw text
/// is returned as a string. Byte values are base64 encoded.
pub fn typed_value_to_json(tv: &TypedValue) -> Value {
    use typed_value::Value as V;

    match &tv.value {
        None => Value::Null,
        Some(V::StringVal(s)) | Some(V::AsciiVal(s)) => Value::String(s.clone()),
        Some(V::IntVal(i)) => Value::from(*i),
        Some(V::UintVal(u)) => Value::from(*u),
        Some(V::BoolVal(b)) => Value::Bool(*b),
        Some(V::FloatVal(f)) => float(f64::from(*f)),
        Some(V::DoubleVal(d)) => float(*d),
        Some(V::DecimalVal(d)) => {
            let scale = 10f64.powi(i32::try_from(d.precision).unwrap_or(i32::MAX));
            float(d.digits as f64 / scale)
        }
        Some(V::BytesVal(b)) | Some(V::ProtoBytes(b)) => Value::String(BASE64.encode(b)),
        Some(V::JsonVal(raw)) | Some(V::JsonIetfVal(raw)) => serde_json::from_slice(raw)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(raw).into_owned())),
        Some(V::LeaflistVal(array)) => Value::Array(array.element.iter().map(typed_value_to_json).collect()),
        Some(V::AnyVal(any)) => serde_json::json!({
            "type_url": any.type_url,
            "value": BASE64.encode(&any.value),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gnmi::path::parse_path;
    use crate::gnmi::proto::{Decimal64, ScalarArray, Update};

    fn tv(value: typed_value::Value) -> TypedValue {
        TypedValue { value: Some(value) }
    }

    #[test]
    fn test_format_notification() {
        let response = GetResponse {
            notification: vec![Notification {
                timestamp: 1_700_000_000_123_456_789,
                prefix: None,
                update: vec![Update {
                    path: Some(parse_path("/system/config/hostname").unwrap()),
                    val: Some(tv(typed_value::Value::JsonIetfVal(b"\"sw1\"".to_vec()))),
                    duplicates: 0,
                }],
                delete: vec![],
                atomic: false,
            }],
        };

        let out = format_get_response(&response).unwrap();
        let expected = r#"[
 {
  "timestamp": 1700000000123456789,
  "time": "2023-11-14T22:13:20.123456789Z",
  "updates": [
   {
    "Path": "system/config/hostname",
    "values": {
     "system/config/hostname": "sw1"
    }
   }
  ]
 }
]"#;
        assert_eq!(out, expected);
    }

    #[test]
    fn test_values_key_drops_list_keys() {
        let response = GetResponse {
            notification: vec![Notification {
                timestamp: 0,
                prefix: Some(parse_path("openconfig:/interfaces").unwrap()),
                update: vec![Update {
                    path: Some(parse_path("interface[name=Ethernet1]/state/mtu").unwrap()),
                    val: Some(tv(typed_value::Value::UintVal(1500))),
                    duplicates: 0,
                }],
                delete: vec![parse_path("/interface[name=Ethernet2]").unwrap()],
                atomic: false,
            }],
        };

        let out: Value = serde_json::from_str(&format_get_response(&response).unwrap()).unwrap();
        let msg = &out[0];
        assert!(msg.get("timestamp").is_none());
        assert_eq!(msg["prefix"], "openconfig:interfaces");
        assert_eq!(msg["updates"][0]["Path"], "interface[name=Ethernet1]/state/mtu");
        assert_eq!(msg["updates"][0]["values"]["interface/state/mtu"], 1500);
        assert_eq!(msg["deletes"][0], "interface[name=Ethernet2]");
    }

    #[test]
    fn test_typed_values() {
        use typed_value::Value as V;

        let decimal = tv(V::DecimalVal(Decimal64 {
            digits: 1234,
            precision: 2,
        }));
        assert_eq!(typed_value_to_json(&decimal), serde_json::json!(12.34));

        let list = tv(V::LeaflistVal(ScalarArray {
            element: vec![tv(V::StringVal("a".into())), tv(V::BoolVal(true))],
        }));
        assert_eq!(typed_value_to_json(&list), serde_json::json!(["a", true]));

        assert_eq!(typed_value_to_json(&tv(V::BytesVal(b"hi".to_vec()))), "aGk=");
        assert_eq!(typed_value_to_json(&tv(V::JsonVal(b"not json".to_vec()))), "not json");
    }

    #[test]
    fn test_empty_response() {
        assert_eq!(format_get_response(&GetResponse::default()).unwrap(), "[]");
    }
}
