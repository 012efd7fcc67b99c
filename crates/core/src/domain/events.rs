use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::progress::ProgressUpdate;
use crate::error::FrameError;

/// Payload of a `finished` frame
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinishedPayload {
    #[serde(default, deserialize_with = "lenient")]
    pub repo: Option<String>,
}

/// Payload of an `error` frame
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorPayload {
    #[serde(default, deserialize_with = "lenient")]
    pub repo: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub message: Option<String>,
}

/// A classified push event. Anything the dashboard does not understand is
/// kept as `Other` so it still shows up in the activity feed.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Progress(ProgressUpdate),
    Finished(FinishedPayload),
    Error(ErrorPayload),
    Other { kind: Option<String>, payload: Value },
}

impl Event {
    /// Wire name of the event kind
    pub fn kind(&self) -> &str {
        match self {
            Event::Progress(_) => "progress",
            Event::Finished(_) => "finished",
            Event::Error(_) => "error",
            Event::Other { kind, .. } => kind.as_deref().unwrap_or("other"),
        }
    }

    /// Repository the event refers to, when it names one
    pub fn repo(&self) -> Option<&str> {
        match self {
            Event::Progress(p) => p.repo.as_deref(),
            Event::Finished(f) => f.repo.as_deref(),
            Event::Error(e) => e.repo.as_deref(),
            Event::Other { payload, .. } => payload.get("repo").and_then(Value::as_str),
        }
    }

    /// One-line description for the activity feed
    pub fn summary(&self) -> String {
        match self {
            Event::Progress(p) => {
                let mut parts = Vec::new();
                if let Some(status) = &p.status {
                    parts.push(status.clone());
                }
                if let Some(percent) = p.display_percent() {
                    parts.push(format!("{}%", percent));
                }
                let files = p.files();
                if !files.is_empty() {
                    parts.push(format!("files {}", files));
                }
                parts.join(" ")
            }
            Event::Finished(_) => "finished".to_string(),
            Event::Error(e) => e.message.clone().unwrap_or_default(),
            Event::Other { payload, .. } => {
                if payload.is_null() {
                    String::new()
                } else {
                    payload.to_string()
                }
            }
        }
    }
}

#[derive(Deserialize)]
struct RawFrame {
    #[serde(default, rename = "type")]
    kind: Option<Value>,
    #[serde(default)]
    payload: Value,
}

/// Decode one inbound text frame into a classified event
pub fn classify(text: &str) -> Result<Event, FrameError> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| FrameError::Json(e.to_string()))?;
    if !value.is_object() {
        return Err(FrameError::NotAnObject);
    }
    let raw: RawFrame =
        serde_json::from_value(value).map_err(|e| FrameError::Json(e.to_string()))?;

    let kind = raw.kind.and_then(|k| k.as_str().map(str::to_string));
    let payload = raw.payload;

    let event = match kind.as_deref() {
        Some("progress") => Event::Progress(decode(payload)),
        Some("finished") => Event::Finished(decode(payload)),
        Some("error") => Event::Error(match payload {
            // Some senders push the bare message instead of an object
            Value::String(message) => ErrorPayload {
                repo: None,
                message: Some(message),
            },
            other => decode(other),
        }),
        _ => Event::Other { kind, payload },
    };
    Ok(event)
}

/// The frame's `type` decides the event; a payload that is missing or not an
/// object decodes as an empty one.
fn decode<T>(payload: Value) -> T
where
    T: DeserializeOwned + Default,
{
    if !payload.is_object() {
        return T::default();
    }
    serde_json::from_value(payload).unwrap_or_default()
}

/// Field deserializer that reads a value of the wrong type as absent
pub(crate) fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}
