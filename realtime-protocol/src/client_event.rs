//! Events sent from the client to the server

use serde::{Deserialize, Serialize};

use crate::registry::event_registry;
use crate::types::*;

// ==================== Session ====================

/// Change session configuration; only the fields set are updated
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionUpdateEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    pub session: Session,
}

// ==================== Input Audio Buffer ====================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputAudioBufferAppendEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    /// Base64-encoded audio in the session's input format
    pub audio: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputAudioBufferCommitEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputAudioBufferClearEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
}

// ==================== Conversation ====================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationItemCreateEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    /// Insert after this item; `"root"` inserts at the start
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_item_id: Option<String>,
    pub item: ConversationItem,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationItemRetrieveEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    pub item_id: String,
}

/// Cut an assistant audio message short at `audio_end_ms`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationItemTruncateEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    pub item_id: String,
    pub content_index: u32,
    pub audio_end_ms: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationItemDeleteEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    pub item_id: String,
}

// ==================== Response ====================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseCreateEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    #[serde(default)]
    pub response: ResponseCreateParams,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseCancelEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    /// Defaults to the in-progress response when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputAudioBufferClearEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
}

event_registry! {
    /// Every event a client may send
    pub enum ClientEvent / ClientEventType {
        SessionUpdate(SessionUpdateEvent) = "session.update",
        InputAudioBufferAppend(InputAudioBufferAppendEvent) = "input_audio_buffer.append",
        InputAudioBufferCommit(InputAudioBufferCommitEvent) = "input_audio_buffer.commit",
        InputAudioBufferClear(InputAudioBufferClearEvent) = "input_audio_buffer.clear",
        ConversationItemCreate(ConversationItemCreateEvent) = "conversation.item.create",
        ConversationItemRetrieve(ConversationItemRetrieveEvent) = "conversation.item.retrieve",
        ConversationItemTruncate(ConversationItemTruncateEvent) = "conversation.item.truncate",
        ConversationItemDelete(ConversationItemDeleteEvent) = "conversation.item.delete",
        ResponseCreate(ResponseCreateEvent) = "response.create",
        ResponseCancel(ResponseCancelEvent) = "response.cancel",
        /// WebRTC/SIP only; the server rejects it on websocket sessions
        OutputAudioBufferClear(OutputAudioBufferClearEvent) = "output_audio_buffer.clear",
    }
}

impl ClientEvent {
    pub fn session_update(session: Session) -> Self {
        Self::SessionUpdate(SessionUpdateEvent {
            event_id: None,
            session,
        })
    }

    pub fn audio_append(audio: impl Into<String>) -> Self {
        Self::InputAudioBufferAppend(InputAudioBufferAppendEvent {
            event_id: None,
            audio: audio.into(),
        })
    }

    pub fn audio_commit() -> Self {
        Self::InputAudioBufferCommit(InputAudioBufferCommitEvent::default())
    }

    pub fn item_create(item: ConversationItem) -> Self {
        Self::ConversationItemCreate(ConversationItemCreateEvent {
            event_id: None,
            previous_item_id: None,
            item,
        })
    }

    pub fn response_create(response: ResponseCreateParams) -> Self {
        Self::ResponseCreate(ResponseCreateEvent {
            event_id: None,
            response,
        })
    }

    pub fn response_cancel() -> Self {
        Self::ResponseCancel(ResponseCancelEvent::default())
    }
}
