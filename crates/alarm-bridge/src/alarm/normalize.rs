//! Normalize inbound events into alarm records.
//!
//! Shapes are tried in a fixed order; the first matcher that recognizes the
//! event produces the records and the rest are skipped.

use serde_json::Value;
use tracing::{debug, warn};

use super::AlarmRecord;
use crate::{Error, Result};

const STATE_CHANGE_DETAIL_TYPE: &str = "CloudWatch Alarm State Change";

type Matcher = fn(&Value) -> Option<Vec<AlarmRecord>>;

const MATCHERS: &[(&str, Matcher)] = &[
    ("sns_fan_out", sns_fan_out),
    ("state_change", state_change),
    ("direct_alarm", direct_alarm),
    ("payload_list", payload_list),
];

/// Extract the alarm records carried by `event`, in delivery order.
pub fn extract(event: Value) -> Result<Vec<AlarmRecord>> {
    let event = decode_string(event);

    for (shape, matcher) in MATCHERS {
        if let Some(records) = matcher(&event) {
            debug!(shape, count = records.len(), "alarm_event_shape_matched");
            return Ok(records);
        }
    }

    Err(Error::UnsupportedEventShape(describe(&event)))
}

fn sns_fan_out(event: &Value) -> Option<Vec<AlarmRecord>> {
    let records = event.get("Records")?.as_array()?;

    let alarms = records
        .iter()
        .filter_map(|record| {
            let message = record
                .get("Sns")
                .and_then(|sns| sns.get("Message"))
                .filter(|message| !is_blank(message));
            let Some(message) = message else {
                warn!(record = %record, "sns_record_missing_message");
                return None;
            };
            Some(match decode_string(message.clone()) {
                Value::Object(fields) => AlarmRecord::new(fields),
                _ => AlarmRecord::raw(message.clone()),
            })
        })
        .collect();

    Some(alarms)
}

fn state_change(event: &Value) -> Option<Vec<AlarmRecord>> {
    if event.get("detail-type")?.as_str()? != STATE_CHANGE_DETAIL_TYPE {
        return None;
    }
    let detail = event.get("detail")?.as_object()?;
    Some(vec![AlarmRecord::new(detail.clone())])
}

fn direct_alarm(event: &Value) -> Option<Vec<AlarmRecord>> {
    let fields = event.as_object()?;
    if fields.contains_key(super::ALARM_NAME) && fields.contains_key(super::NEW_STATE_VALUE) {
        return Some(vec![AlarmRecord::new(fields.clone())]);
    }
    None
}

fn payload_list(event: &Value) -> Option<Vec<AlarmRecord>> {
    let items = event.as_array()?;
    let alarms = items
        .iter()
        .filter_map(|item| match decode_string(item.clone()) {
            Value::Object(fields) => Some(AlarmRecord::new(fields)),
            _ => None,
        })
        .collect();
    Some(alarms)
}

/// Decode a JSON-encoded string once; anything else is returned unchanged.
fn decode_string(value: Value) -> Value {
    match value {
        Value::String(text) => serde_json::from_str(&text).unwrap_or(Value::String(text)),
        other => other,
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.is_empty(),
        _ => false,
    }
}

fn describe(event: &Value) -> String {
    match event {
        Value::Object(fields) => {
            let keys: Vec<&str> = fields.keys().map(String::as_str).collect();
            format!("object with keys [{}]", keys.join(", "))
        }
        Value::Array(_) => "array".to_string(),
        Value::String(_) => "non-JSON string".to_string(),
        Value::Number(_) => "number".to_string(),
        Value::Bool(_) => "boolean".to_string(),
        Value::Null => "null".to_string(),
    }
}
