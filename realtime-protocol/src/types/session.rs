//! Session configuration

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{IntOrInf, Modality, Nullable, SessionAudio, Tool, ToolChoice};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionKind {
    /// Speech-to-speech conversation
    Realtime,
    /// Transcription only
    Transcription,
}

/// Stored prompt reference
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prompt {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variables: Option<BTreeMap<String, String>>,
}

/// A session as sent in `session.update` or reported by
/// `session.created` / `session.updated`
///
/// Outbound updates only carry the fields being changed, so every field is
/// optional. `tracing`, `prompt` and `include` accept an explicit `null` to
/// clear a previous setting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<SessionKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_modalities: Option<Vec<Modality>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio: Option<SessionAudio>,
    #[serde(default, skip_serializing_if = "Nullable::is_absent")]
    pub include: Nullable<Vec<String>>,
    /// `"auto"` or a tracing configuration object
    #[serde(default, skip_serializing_if = "Nullable::is_absent")]
    pub tracing: Nullable<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<Tool>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<ToolChoice>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<IntOrInf>,
    #[serde(default, skip_serializing_if = "Nullable::is_absent")]
    pub prompt: Nullable<Prompt>,
    /// Unix timestamp, server-reported only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
}

impl Session {
    /// Empty speech-to-speech session update
    pub fn realtime() -> Self {
        Self {
            kind: Some(SessionKind::Realtime),
            ..Self::default()
        }
    }

    /// Empty transcription session update
    pub fn transcription() -> Self {
        Self {
            kind: Some(SessionKind::Transcription),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AudioFormat, AudioInput, ToolChoiceMode, TurnDetection, Voice};
    use serde_json::json;

    #[test]
    fn test_minimal_update_has_only_type() {
        assert_eq!(
            serde_json::to_value(Session::realtime()).unwrap(),
            json!({"type": "realtime"})
        );
    }

    #[test]
    fn test_empty_tools_differs_from_absent() {
        let session = Session {
            tools: Some(vec![]),
            ..Session::realtime()
        };
        assert_eq!(
            serde_json::to_value(&session).unwrap(),
            json!({"type": "realtime", "tools": []})
        );
    }

    #[test]
    fn test_decode_server_session() {
        let session: Session = serde_json::from_value(json!({
            "type": "realtime",
            "object": "realtime.session",
            "id": "sess_C9G5QPteg4UIbotdKLoYQ",
            "model": "gpt-realtime-2025-08-28",
            "output_modalities": ["audio"],
            "tools": [],
            "tool_choice": "auto",
            "max_output_tokens": "inf",
            "tracing": null,
            "prompt": null,
            "expires_at": 1756324625,
            "audio": {
                "input": {
                    "format": {"type": "audio/pcm", "rate": 24000},
                    "transcription": null,
                    "noise_reduction": null,
                    "turn_detection": {
                        "type": "server_vad",
                        "threshold": 0.5,
                        "prefix_padding_ms": 300,
                        "silence_duration_ms": 200,
                        "idle_timeout_ms": null,
                        "create_response": true,
                        "interrupt_response": true
                    }
                },
                "output": {
                    "format": {"type": "audio/pcm", "rate": 24000},
                    "voice": "marin",
                    "speed": 1
                }
            },
            "include": null
        }))
        .unwrap();

        assert_eq!(session.kind, Some(SessionKind::Realtime));
        assert_eq!(session.tool_choice, Some(ToolChoice::Mode(ToolChoiceMode::Auto)));
        assert_eq!(session.max_output_tokens, Some(IntOrInf::Inf));
        assert_eq!(session.tools, Some(vec![]));
        assert!(session.tracing.is_null());
        assert!(session.include.is_null());

        let audio = session.audio.unwrap();
        let input: AudioInput = audio.input.unwrap();
        assert_eq!(input.format, Some(AudioFormat::PCM_24K));
        assert!(input.transcription.is_null());
        assert!(matches!(
            input.turn_detection,
            Nullable::Value(TurnDetection::ServerVad(_))
        ));

        let output = audio.output.unwrap();
        assert_eq!(output.voice, Some(Voice::Marin));
        assert_eq!(output.speed, Some(1.0));
    }
}
