use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::BridgeError;
use crate::playback::PlaybackState;

/// A notification from the embedded player, decoded
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BridgeMessage {
    /// Total length of the content in seconds, sent once at readiness
    Duration(f64),
    /// The player finished initializing
    PlayerReady,
    /// Elapsed seconds, pushed on a fixed cadence
    CurrentTime(f64),
    /// The player moved to a new state
    StateChange(PlaybackState),
}

/// On-the-wire shape: `{"type": "...", "data": ...}`
#[derive(Debug, Serialize, Deserialize)]
struct RawMessage {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: Value,
}

impl BridgeMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            BridgeMessage::Duration(_) => "duration",
            BridgeMessage::PlayerReady => "playerReady",
            BridgeMessage::CurrentTime(_) => "currentTime",
            BridgeMessage::StateChange(_) => "stateChange",
        }
    }

    /// Decode one payload as posted by the page
    pub fn decode(payload: &str) -> Result<Self, BridgeError> {
        let raw: RawMessage = serde_json::from_str(payload)?;

        match raw.kind.as_str() {
            "duration" => seconds(&raw).map(BridgeMessage::Duration),
            "currentTime" => seconds(&raw).map(BridgeMessage::CurrentTime),
            "playerReady" => Ok(BridgeMessage::PlayerReady),
            "stateChange" => {
                let code = raw.data.as_i64().ok_or_else(|| {
                    BridgeError::Decode(format!("stateChange expects an integer, got {}", raw.data))
                })?;
                PlaybackState::try_from(code).map(BridgeMessage::StateChange)
            }
            other => Err(BridgeError::UnknownKind(other.to_string())),
        }
    }

    /// Encode in the page's wire format
    pub fn encode(&self) -> String {
        let data = match self {
            BridgeMessage::Duration(secs) | BridgeMessage::CurrentTime(secs) => Value::from(*secs),
            BridgeMessage::PlayerReady => Value::Bool(true),
            BridgeMessage::StateChange(state) => Value::from(state.code()),
        };
        let raw = RawMessage {
            kind: self.kind().to_string(),
            data,
        };
        serde_json::to_string(&raw).unwrap_or_default()
    }
}

fn seconds(raw: &RawMessage) -> Result<f64, BridgeError> {
    raw.data
        .as_f64()
        .filter(|secs| secs.is_finite())
        .ok_or_else(|| BridgeError::Decode(format!("{} expects a number, got {}", raw.kind, raw.data)))
}
