//! One line of the JSONL event log.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single tracing event, flattened for JSONL storage
///
/// Lines are self-contained so several participants' files can be merged and
/// sorted by `ts` without any other context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonLogEntry {
    /// RFC 3339 timestamp with milliseconds, UTC
    pub ts: String,

    /// trace, debug, info, warn or error
    pub level: String,

    /// Participant label the writing process logs as
    pub participant: String,

    /// Module path of the event (e.g. "profilesync_core::sync::distribution")
    pub target: String,

    pub msg: String,

    /// Participant the event is about, lifted from a `user_id` field
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    /// Remote address involved, lifted from a `peer` field
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peer: Option<String>,

    /// Remaining structured fields recorded on the event
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Value>,

    /// Enclosing spans, outermost first, joined with " > "
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span: Option<String>,
}

impl JsonLogEntry {
    /// Create an entry stamped with the current time
    pub fn new(
        level: impl Into<String>,
        participant: impl Into<String>,
        target: impl Into<String>,
        msg: impl Into<String>,
    ) -> Self {
        Self {
            ts: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            level: level.into(),
            participant: participant.into(),
            target: target.into(),
            msg: msg.into(),
            user_id: None,
            peer: None,
            fields: None,
            span: None,
        }
    }

    /// Attach event fields, lifting `user_id` and `peer` to the top level
    ///
    /// Lets a merged session log be filtered by participant without digging
    /// into `fields`.
    pub fn with_fields(mut self, mut fields: Map<String, Value>) -> Self {
        self.user_id = take_string(&mut fields, "user_id");
        self.peer = take_string(&mut fields, "peer");
        if !fields.is_empty() {
            self.fields = Some(Value::Object(fields));
        }
        self
    }

    pub fn with_span(mut self, span: impl Into<String>) -> Self {
        self.span = Some(span.into());
        self
    }

    /// Serialize to one JSON line, without the trailing newline
    pub fn to_json_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json_line(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }
}

fn take_string(fields: &mut Map<String, Value>, key: &str) -> Option<String> {
    match fields.remove(key)? {
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}
