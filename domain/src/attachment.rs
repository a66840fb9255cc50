use crate::error::ChatError;

// Uploads above this size are rejected before any network call.
pub const MAX_ATTACHMENT_BYTES: u64 = 5 * 1024 * 1024;

/// A file read from disk, held in memory until submitted.
#[derive(Debug, Clone)]
pub struct LocalAttachment {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl LocalAttachment {
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }

    /// File extension in lowercase, if the name has one.
    pub fn extension(&self) -> Option<String> {
        let (_, ext) = self.file_name.rsplit_once('.')?;
        (!ext.is_empty()).then(|| ext.to_ascii_lowercase())
    }
}

/// Location of an uploaded attachment in object storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredAttachment {
    pub url: String,
    pub mime_type: String,
}

/// Rejects attachments over the size ceiling.
pub fn validate_size(attachment: &LocalAttachment) -> Result<(), ChatError> {
    if attachment.size() > MAX_ATTACHMENT_BYTES {
        return Err(ChatError::FileTooLarge {
            size: attachment.size(),
            limit: MAX_ATTACHMENT_BYTES,
        });
    }
    Ok(())
}

pub trait ObjectStore {
    /// Stores `bytes` under `name` and returns the object's public URL.
    fn put_object(
        &self,
        name: &str,
        bytes: Vec<u8>,
        mime_type: &str,
    ) -> impl std::future::Future<Output = shared::types::Result<String>> + Send;

    /// Public URL the object is served from after upload.
    fn public_url(&self, name: &str) -> String;
}
