use crate::message::Message;
use shared::types::Result;

// Number of recent messages replayed as context with each request.
pub const HISTORY_WINDOW: usize = 20;

pub const CONTEXT_HEADER: &str = "Previous conversation:";
pub const FILE_CONTENT_LABEL: &str = "File content:";

/// Fixed sampling parameters sent with every request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationSettings {
    pub temperature: f64,
    pub top_k: u32,
    pub top_p: f64,
    pub max_output_tokens: u32,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_k: 40,
            top_p: 0.95,
            max_output_tokens: 1024,
        }
    }
}

/// Attachment content prepared for prompt assembly.
#[derive(Debug, Clone, PartialEq)]
pub enum PromptAttachment {
    /// Raw image bytes; the inference client encodes them for the wire.
    Image { mime_type: String, bytes: Vec<u8> },
    /// Text extracted from a `.txt` or `.pdf` file.
    Text { content: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum PromptPart {
    Text(String),
    Image { mime_type: String, bytes: Vec<u8> },
}

/// Assembled request payload for a single model call.
#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    pub parts: Vec<PromptPart>,
    pub settings: GenerationSettings,
}

/// Builds the request payload from recent history, the new message text and an
/// optional attachment. History older than the window is dropped.
pub fn compose(history: &[Message], text: &str, attachment: Option<&PromptAttachment>) -> Prompt {
    let window = recent_window(history);
    let mut serialized = String::new();
    if !window.is_empty() {
        serialized.push_str(CONTEXT_HEADER);
        serialized.push('\n');
        for message in window {
            serialized.push_str(message.role.as_str());
            serialized.push_str(": ");
            serialized.push_str(&message.content);
            serialized.push('\n');
        }
        serialized.push('\n');
    }
    serialized.push_str(text);

    let mut parts = Vec::new();
    if !serialized.trim().is_empty() {
        parts.push(PromptPart::Text(serialized));
    }
    match attachment {
        Some(PromptAttachment::Image { mime_type, bytes }) => parts.push(PromptPart::Image {
            mime_type: mime_type.clone(),
            bytes: bytes.clone(),
        }),
        Some(PromptAttachment::Text { content }) => {
            parts.push(PromptPart::Text(format!("{FILE_CONTENT_LABEL}\n{content}")));
        }
        None => {}
    }

    Prompt {
        parts,
        settings: GenerationSettings::default(),
    }
}

fn recent_window(history: &[Message]) -> &[Message] {
    if history.len() > HISTORY_WINDOW {
        &history[history.len() - HISTORY_WINDOW..]
    } else {
        history
    }
}

pub trait InferenceProvider {
    fn infer(&self, prompt: &Prompt) -> impl std::future::Future<Output = Result<String>> + Send;
}
