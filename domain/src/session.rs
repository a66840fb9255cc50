use crate::error::ChatError;
use crate::message::Message;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// Titles keep the first 30 characters of the opening submission.
pub const TITLE_MAX_CHARS: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub title: String,
    pub messages: Vec<Message>,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: SessionId::new(),
            title: title.into(),
            messages: Vec::new(),
            created_at: Utc::now(),
        }
    }
}

/// Derives a chat title from the first submission, falling back to the
/// attached file name when the text is empty.
pub fn derive_title(text: &str, file_name: Option<&str>) -> String {
    let trimmed = text.trim();
    let source = if trimmed.is_empty() {
        file_name.unwrap_or("New chat")
    } else {
        trimmed
    };
    source.chars().take(TITLE_MAX_CHARS).collect()
}

/// In-memory collection of chat sessions, in creation order.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: Vec<Session>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a session seeded with its first message and returns the new id.
    pub fn create_session(&mut self, title: impl Into<String>, first_message: Message) -> SessionId {
        let mut session = Session::new(title);
        session.messages.push(first_message);
        let id = session.id;
        self.sessions.push(session);
        id
    }

    /// Appends messages to the end of an existing session's transcript.
    pub fn append(
        &mut self,
        id: SessionId,
        messages: impl IntoIterator<Item = Message>,
    ) -> Result<(), ChatError> {
        let session = self.find_mut(id).ok_or(ChatError::SessionNotFound { id })?;
        session.messages.extend(messages);
        Ok(())
    }

    /// Full transcript of one session, oldest message first.
    pub fn select(&self, id: SessionId) -> Result<&[Message], ChatError> {
        self.get(id)
            .map(|session| session.messages.as_slice())
            .ok_or(ChatError::SessionNotFound { id })
    }

    pub fn get(&self, id: SessionId) -> Option<&Session> {
        self.sessions.iter().find(|session| session.id == id)
    }

    pub fn contains(&self, id: SessionId) -> bool {
        self.get(id).is_some()
    }

    /// Removes a session and every message in it.
    pub fn delete(&mut self, id: SessionId) -> Result<(), ChatError> {
        let position = self
            .sessions
            .iter()
            .position(|session| session.id == id)
            .ok_or(ChatError::SessionNotFound { id })?;
        self.sessions.remove(position);
        Ok(())
    }

    pub fn list_all(&self) -> &[Session] {
        &self.sessions
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn find_mut(&mut self, id: SessionId) -> Option<&mut Session> {
        self.sessions.iter_mut().find(|session| session.id == id)
    }
}
