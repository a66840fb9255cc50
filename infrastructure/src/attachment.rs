use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use domain::attachment::{
    validate_size, LocalAttachment, ObjectStore, StoredAttachment, MAX_ATTACHMENT_BYTES,
};
use domain::error::ChatError;
use domain::prompt::PromptAttachment;
use shared::types::Result;
use std::path::Path;
use uuid::Uuid;

/// Reads a file into memory, checking its type and size before anything
/// leaves the machine.
pub async fn load(path: impl AsRef<Path>) -> Result<LocalAttachment> {
    let path = path.as_ref();
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    if !shared::utils::is_supported_attachment(path) {
        return Err(ChatError::UnsupportedAttachment { file_name }.into());
    }
    // Size comes from metadata; an oversized file is never read into memory.
    let size = tokio::fs::metadata(path)
        .await
        .map_err(|err| ChatError::AttachmentUnreadable {
            path: path.display().to_string(),
            reason: err.to_string(),
        })?
        .len();
    if size > MAX_ATTACHMENT_BYTES {
        return Err(ChatError::FileTooLarge {
            size,
            limit: MAX_ATTACHMENT_BYTES,
        }
        .into());
    }
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|err| ChatError::AttachmentUnreadable {
            path: path.display().to_string(),
            reason: err.to_string(),
        })?;
    let mime_type = mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string();
    let attachment = LocalAttachment {
        file_name,
        mime_type,
        bytes,
    };
    // The file can grow between the stat and the read.
    validate_size(&attachment)?;
    Ok(attachment)
}

/// Data URI for inline display of an image attachment. Non-images have no
/// preview.
pub fn preview(attachment: &LocalAttachment) -> Option<String> {
    attachment.is_image().then(|| {
        format!(
            "data:{};base64,{}",
            attachment.mime_type,
            BASE64_STANDARD.encode(&attachment.bytes)
        )
    })
}

/// Converts a loaded file into the form the prompt composer consumes: images
/// stay binary, `.txt` and `.pdf` turn into extracted text.
pub fn prompt_payload(attachment: &LocalAttachment) -> Result<PromptAttachment> {
    if attachment.is_image() {
        return Ok(PromptAttachment::Image {
            mime_type: attachment.mime_type.clone(),
            bytes: attachment.bytes.clone(),
        });
    }
    let content = match attachment.mime_type.as_str() {
        "application/pdf" => {
            pdf_extract::extract_text_from_mem(&attachment.bytes).map_err(|err| {
                ChatError::AttachmentUnreadable {
                    path: attachment.file_name.clone(),
                    reason: err.to_string(),
                }
            })?
        }
        _ => String::from_utf8(attachment.bytes.clone()).map_err(|err| {
            ChatError::AttachmentUnreadable {
                path: attachment.file_name.clone(),
                reason: err.to_string(),
            }
        })?,
    };
    Ok(PromptAttachment::Text { content })
}

/// Storage object name: a fresh UUID with the original extension kept.
pub fn unique_object_name(attachment: &LocalAttachment) -> String {
    match attachment.extension() {
        Some(ext) => format!("{}.{}", Uuid::new_v4(), ext),
        None => Uuid::new_v4().to_string(),
    }
}

/// Uploads an attachment and returns where it now lives. The size ceiling is
/// enforced here as well, so nothing oversized ever reaches the network.
pub async fn upload<S: ObjectStore>(
    store: &S,
    attachment: &LocalAttachment,
) -> Result<StoredAttachment> {
    validate_size(attachment)?;
    let name = unique_object_name(attachment);
    tracing::debug!(object = %name, size = attachment.size(), "uploading attachment");
    let url = store
        .put_object(&name, attachment.bytes.clone(), &attachment.mime_type)
        .await?;
    Ok(StoredAttachment {
        url,
        mime_type: attachment.mime_type.clone(),
    })
}
