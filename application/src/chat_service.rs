use domain::attachment::{LocalAttachment, ObjectStore, StoredAttachment};
use domain::error::ChatError;
use domain::message::Message;
use domain::prompt::{compose, InferenceProvider};
use domain::session::{derive_title, Session, SessionId, SessionStore};
use infrastructure::attachment::{prompt_payload, upload};
use shared::types::Result;
use std::fmt;

/// Where the controller currently is in the submit cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    AwaitingUpload,
    AwaitingInference,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Phase::Idle => "idle",
            Phase::AwaitingUpload => "awaiting-upload",
            Phase::AwaitingInference => "awaiting-inference",
        };
        f.write_str(label)
    }
}

// Ties an in-flight request to the conversation state it was issued under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RequestToken {
    session_id: SessionId,
    generation: u64,
}

/// Result of one submit call.
#[derive(Debug)]
pub enum SubmitOutcome {
    /// The model answered; the transcript gained a user and an assistant message.
    Replied { session_id: SessionId, reply: String },
    /// Empty submission with no attachment; nothing happened.
    Skipped,
    /// The reply arrived after the conversation moved on and was dropped.
    Discarded,
}

/// Drives a conversation: stages user messages, uploads attachments, requests
/// model replies and lands them in the right session.
pub struct ChatService<P, S> {
    store: SessionStore,
    provider: P,
    storage: S,
    active: Option<SessionId>,
    phase: Phase,
    generation: u64,
}

impl<P: InferenceProvider, S: ObjectStore> ChatService<P, S> {
    pub fn new(provider: P, storage: S) -> Self {
        Self {
            store: SessionStore::new(),
            provider,
            storage,
            active: None,
            phase: Phase::Idle,
            generation: 0,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn active_session(&self) -> Option<SessionId> {
        self.active
    }

    pub fn sessions(&self) -> &[Session] {
        self.store.list_all()
    }

    /// Transcript of the active session, empty when none is open.
    pub fn transcript(&self) -> &[Message] {
        self.active
            .and_then(|id| self.store.get(id))
            .map(|session| session.messages.as_slice())
            .unwrap_or(&[])
    }

    /// Leaves the current conversation; the next submit starts a fresh session.
    pub fn new_chat(&mut self) {
        self.active = None;
        self.generation += 1;
        tracing::debug!(generation = self.generation, "cleared active session");
    }

    /// Makes `id` the active session and returns its transcript.
    pub fn open_session(&mut self, id: SessionId) -> Result<&[Message]> {
        if !self.store.contains(id) {
            return Err(ChatError::SessionNotFound { id }.into());
        }
        self.active = Some(id);
        self.generation += 1;
        tracing::debug!(session = %id, "opened session");
        Ok(self.store.select(id)?)
    }

    /// Deletes a session. Deleting the active one leaves no session open.
    pub fn delete_session(&mut self, id: SessionId) -> Result<()> {
        self.store.delete(id)?;
        self.generation += 1;
        if self.active == Some(id) {
            self.active = None;
        }
        tracing::debug!(session = %id, "deleted session");
        Ok(())
    }

    /// Sends one user turn through the pipeline: upload the attachment if any,
    /// stage the user message, request a reply, append it. A failed request
    /// leaves the staged user message in the transcript.
    pub async fn submit(
        &mut self,
        text: &str,
        attachment: Option<&LocalAttachment>,
    ) -> Result<SubmitOutcome> {
        if text.trim().is_empty() && attachment.is_none() {
            return Ok(SubmitOutcome::Skipped);
        }
        if self.phase != Phase::Idle {
            return Err(ChatError::SubmissionInFlight.into());
        }

        // Local decode comes first so a bad file never reaches the network.
        let payload = attachment.map(prompt_payload).transpose()?;

        let stored = match attachment {
            Some(local) => {
                self.set_phase(Phase::AwaitingUpload);
                match upload(&self.storage, local).await {
                    Ok(stored) => Some(stored),
                    Err(err) => {
                        self.set_phase(Phase::Idle);
                        return Err(err);
                    }
                }
            }
            None => None,
        };

        // History snapshot excludes the message being staged now.
        let history: Vec<Message> = self
            .active
            .and_then(|id| self.store.get(id))
            .map(|session| session.messages.clone())
            .unwrap_or_default();

        let token = self.stage_user_message(text, attachment, stored)?;

        self.set_phase(Phase::AwaitingInference);
        let prompt = compose(&history, text, payload.as_ref());
        let result = self.provider.infer(&prompt).await;
        self.set_phase(Phase::Idle);

        // The staged user message stays in place even when the request fails.
        let reply = result?;
        self.commit_reply(token, reply)
    }

    fn stage_user_message(
        &mut self,
        text: &str,
        attachment: Option<&LocalAttachment>,
        stored: Option<StoredAttachment>,
    ) -> Result<RequestToken> {
        let mut message = Message::user(text);
        if let Some(stored) = stored {
            message = message.with_attachment(stored.url, stored.mime_type);
        }
        let session_id = match self.active.filter(|id| self.store.contains(*id)) {
            Some(id) => {
                self.store.append(id, [message])?;
                id
            }
            None => {
                let title = derive_title(text, attachment.map(|a| a.file_name.as_str()));
                let id = self.store.create_session(title, message);
                self.active = Some(id);
                id
            }
        };
        Ok(RequestToken {
            session_id,
            generation: self.generation,
        })
    }

    // A reply lands only if the conversation is unchanged since its request left.
    fn commit_reply(&mut self, token: RequestToken, reply: String) -> Result<SubmitOutcome> {
        let stale = token.generation != self.generation
            || self.active != Some(token.session_id)
            || !self.store.contains(token.session_id);
        if stale {
            tracing::debug!(session = %token.session_id, "discarding stale reply");
            return Ok(SubmitOutcome::Discarded);
        }
        self.store
            .append(token.session_id, [Message::assistant(reply.clone())])?;
        Ok(SubmitOutcome::Replied {
            session_id: token.session_id,
            reply,
        })
    }

    fn set_phase(&mut self, phase: Phase) {
        if self.phase != phase {
            tracing::debug!(from = %self.phase, to = %phase, "phase transition");
        }
        self.phase = phase;
    }
}
