pub mod normalize;

pub use normalize::extract;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const ALARM_NAME: &str = "AlarmName";
pub const ALARM_DESCRIPTION: &str = "AlarmDescription";
pub const ACCOUNT_ID: &str = "AWSAccountId";
pub const REGION: &str = "Region";
pub const STATE_CHANGE_TIME: &str = "StateChangeTime";
pub const OLD_STATE_VALUE: &str = "OldStateValue";
pub const NEW_STATE_VALUE: &str = "NewStateValue";
pub const NEW_STATE_REASON: &str = "NewStateReason";
pub const TRIGGER: &str = "Trigger";
pub const RAW_MESSAGE: &str = "raw_message";

/// One alarm state change as delivered, field names untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlarmRecord(Map<String, Value>);

impl AlarmRecord {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Record for a message that could not be decoded into an object.
    pub fn raw(message: Value) -> Self {
        let mut fields = Map::new();
        fields.insert(RAW_MESSAGE.to_string(), message);
        Self(fields)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Field rendered as text; absent and null fields are `None`.
    pub fn text(&self, key: &str) -> Option<String> {
        match self.0.get(key)? {
            Value::Null => None,
            Value::String(text) => Some(text.clone()),
            other => Some(other.to_string()),
        }
    }

    pub fn alarm_name(&self) -> Option<&Value> {
        self.0.get(ALARM_NAME)
    }

    /// True for the degenerate `{"raw_message": ...}` record, which carries
    /// nothing a ticket could be built from.
    pub fn is_unstructured(&self) -> bool {
        self.0.len() == 1 && self.0.contains_key(RAW_MESSAGE)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}
