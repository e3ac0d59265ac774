//! Events sent from the server to the client

use serde::{Deserialize, Serialize};

use crate::registry::event_registry;
use crate::types::*;

// ==================== Errors ====================

/// The server rejected a client event or hit an internal failure.
/// The session stays open.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    pub error: ApiError,
}

// ==================== Session ====================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionCreatedEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    pub session: Session,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionUpdatedEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    pub session: Session,
}

// ==================== Conversation Items ====================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationItemAddedEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    /// `null` when the item is first in the conversation
    #[serde(default, skip_serializing_if = "Nullable::is_absent")]
    pub previous_item_id: Nullable<String>,
    pub item: ConversationItem,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationItemDoneEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    #[serde(default, skip_serializing_if = "Nullable::is_absent")]
    pub previous_item_id: Nullable<String>,
    pub item: ConversationItem,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationItemRetrievedEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    pub item: ConversationItem,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputAudioTranscriptionCompletedEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    pub item_id: String,
    #[serde(default)]
    pub content_index: u32,
    pub transcript: String,
    #[serde(default, skip_serializing_if = "Nullable::is_absent")]
    pub logprobs: Nullable<Vec<LogProb>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<TranscriptionUsage>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputAudioTranscriptionDeltaEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    pub item_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_index: Option<u32>,
    pub delta: String,
    #[serde(default, skip_serializing_if = "Nullable::is_absent")]
    pub logprobs: Nullable<Vec<LogProb>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputAudioTranscriptionFailedEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    pub item_id: String,
    #[serde(default)]
    pub content_index: u32,
    pub error: ApiError,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationItemTruncatedEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    pub item_id: String,
    pub content_index: u32,
    pub audio_end_ms: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationItemDeletedEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    pub item_id: String,
}

// ==================== Input Audio Buffer ====================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputAudioBufferCommittedEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    #[serde(default, skip_serializing_if = "Nullable::is_absent")]
    pub previous_item_id: Nullable<String>,
    pub item_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputAudioBufferClearedEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputAudioBufferSpeechStartedEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    pub audio_start_ms: u32,
    pub item_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputAudioBufferSpeechStoppedEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    pub audio_end_ms: u32,
    pub item_id: String,
}

/// Server VAD idle timeout fired without detecting speech
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputAudioBufferTimeoutTriggeredEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    pub audio_start_ms: u32,
    pub audio_end_ms: u32,
    pub item_id: String,
}

// ==================== Output Audio Buffer ====================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputAudioBufferStartedEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    pub response_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputAudioBufferStoppedEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    pub response_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputAudioBufferClearedEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    pub response_id: String,
}

// ==================== Responses ====================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseCreatedEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    pub response: Response,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseDoneEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    pub response: Response,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseOutputItemAddedEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    pub response_id: String,
    pub output_index: u32,
    pub item: ConversationItem,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseOutputItemDoneEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    pub response_id: String,
    pub output_index: u32,
    pub item: ConversationItem,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseContentPartAddedEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    pub response_id: String,
    pub item_id: String,
    pub output_index: u32,
    pub content_index: u32,
    pub part: ContentPart,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseContentPartDoneEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    pub response_id: String,
    pub item_id: String,
    pub output_index: u32,
    pub content_index: u32,
    pub part: ContentPart,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseOutputTextDeltaEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    #[serde(default)]
    pub response_id: String,
    #[serde(default)]
    pub item_id: String,
    #[serde(default)]
    pub output_index: u32,
    #[serde(default)]
    pub content_index: u32,
    pub delta: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseOutputTextDoneEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    pub response_id: String,
    pub item_id: String,
    pub output_index: u32,
    pub content_index: u32,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseOutputAudioTranscriptDeltaEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    pub response_id: String,
    pub item_id: String,
    pub output_index: u32,
    pub content_index: u32,
    pub delta: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseOutputAudioTranscriptDoneEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    pub response_id: String,
    pub item_id: String,
    pub output_index: u32,
    pub content_index: u32,
    pub transcript: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseOutputAudioDeltaEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    pub response_id: String,
    pub item_id: String,
    pub output_index: u32,
    pub content_index: u32,
    /// Base64-encoded audio chunk
    pub delta: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseOutputAudioDoneEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    pub response_id: String,
    pub item_id: String,
    pub output_index: u32,
    pub content_index: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseFunctionCallArgumentsDeltaEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    pub response_id: String,
    pub item_id: String,
    pub output_index: u32,
    pub call_id: String,
    pub delta: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseFunctionCallArgumentsDoneEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    pub response_id: String,
    pub item_id: String,
    pub output_index: u32,
    pub call_id: String,
    pub arguments: String,
}

// ==================== Rate Limits ====================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RateLimitsUpdatedEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    pub rate_limits: Vec<RateLimit>,
}

event_registry! {
    /// Every event the server may send
    ///
    /// A discriminator outside this table is a decode error, never a
    /// fallback variant.
    pub enum ServerEvent / ServerEventType {
        Error(ErrorEvent) = "error",
        SessionCreated(SessionCreatedEvent) = "session.created",
        SessionUpdated(SessionUpdatedEvent) = "session.updated",
        ConversationItemAdded(ConversationItemAddedEvent) = "conversation.item.added",
        ConversationItemDone(ConversationItemDoneEvent) = "conversation.item.done",
        ConversationItemRetrieved(ConversationItemRetrievedEvent) = "conversation.item.retrieved",
        InputAudioTranscriptionCompleted(InputAudioTranscriptionCompletedEvent)
            = "conversation.item.input_audio_transcription.completed",
        InputAudioTranscriptionDelta(InputAudioTranscriptionDeltaEvent)
            = "conversation.item.input_audio_transcription.delta",
        InputAudioTranscriptionFailed(InputAudioTranscriptionFailedEvent)
            = "conversation.item.input_audio_transcription.failed",
        ConversationItemTruncated(ConversationItemTruncatedEvent) = "conversation.item.truncated",
        ConversationItemDeleted(ConversationItemDeletedEvent) = "conversation.item.deleted",
        InputAudioBufferCommitted(InputAudioBufferCommittedEvent) = "input_audio_buffer.committed",
        InputAudioBufferCleared(InputAudioBufferClearedEvent) = "input_audio_buffer.cleared",
        InputAudioBufferSpeechStarted(InputAudioBufferSpeechStartedEvent)
            = "input_audio_buffer.speech_started",
        InputAudioBufferSpeechStopped(InputAudioBufferSpeechStoppedEvent)
            = "input_audio_buffer.speech_stopped",
        InputAudioBufferTimeoutTriggered(InputAudioBufferTimeoutTriggeredEvent)
            = "input_audio_buffer.timeout_triggered",
        OutputAudioBufferStarted(OutputAudioBufferStartedEvent) = "output_audio_buffer.started",
        OutputAudioBufferStopped(OutputAudioBufferStoppedEvent) = "output_audio_buffer.stopped",
        OutputAudioBufferCleared(OutputAudioBufferClearedEvent) = "output_audio_buffer.cleared",
        ResponseCreated(ResponseCreatedEvent) = "response.created",
        ResponseDone(ResponseDoneEvent) = "response.done",
        ResponseOutputItemAdded(ResponseOutputItemAddedEvent) = "response.output_item.added",
        ResponseOutputItemDone(ResponseOutputItemDoneEvent) = "response.output_item.done",
        ResponseContentPartAdded(ResponseContentPartAddedEvent) = "response.content_part.added",
        ResponseContentPartDone(ResponseContentPartDoneEvent) = "response.content_part.done",
        ResponseOutputTextDelta(ResponseOutputTextDeltaEvent) = "response.output_text.delta",
        ResponseOutputTextDone(ResponseOutputTextDoneEvent) = "response.output_text.done",
        ResponseOutputAudioTranscriptDelta(ResponseOutputAudioTranscriptDeltaEvent)
            = "response.output_audio_transcript.delta",
        ResponseOutputAudioTranscriptDone(ResponseOutputAudioTranscriptDoneEvent)
            = "response.output_audio_transcript.done",
        ResponseOutputAudioDelta(ResponseOutputAudioDeltaEvent) = "response.output_audio.delta",
        ResponseOutputAudioDone(ResponseOutputAudioDoneEvent) = "response.output_audio.done",
        ResponseFunctionCallArgumentsDelta(ResponseFunctionCallArgumentsDeltaEvent)
            = "response.function_call_arguments.delta",
        ResponseFunctionCallArgumentsDone(ResponseFunctionCallArgumentsDoneEvent)
            = "response.function_call_arguments.done",
        RateLimitsUpdated(RateLimitsUpdatedEvent) = "rate_limits.updated",
    }
}

impl ServerEvent {
    /// True for the `error` event
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}
