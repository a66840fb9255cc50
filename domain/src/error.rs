use crate::session::SessionId;
use thiserror::Error;

/// Failures surfaced to the user while driving a conversation.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("attachment is {size} bytes, over the {limit} byte limit")]
    FileTooLarge { size: u64, limit: u64 },

    #[error("unsupported attachment type: {file_name}")]
    UnsupportedAttachment { file_name: String },

    #[error("could not read attachment {path}: {reason}")]
    AttachmentUnreadable { path: String, reason: String },

    #[error("upload failed: {reason}")]
    UploadFailed { reason: String },

    #[error("inference request failed: {reason}")]
    InferenceFailed { status: Option<u16>, reason: String },

    #[error("no session with id {id}")]
    SessionNotFound { id: SessionId },

    #[error("a message is already being processed")]
    SubmissionInFlight,

    #[error("GEMINI_API_KEY is not set")]
    MissingApiKey,
}
