use domain::error::ChatError;
use dotenvy::dotenv;
use shared::types::Result;
use std::env;

pub const DEFAULT_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_BUCKET: &str = "attachments";

/// Runtime settings read from the environment. The Gemini key is required and
/// is never written to disk or logs; everything else has a default.
pub struct Config {
    pub api_key: String,
    pub api_url: String,
    pub model: String,
    pub storage_url: String,
    pub storage_bucket: String,
    pub storage_key: String,
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenv().ok();
        let api_key = env::var("GEMINI_API_KEY").unwrap_or_default();
        if api_key.trim().is_empty() {
            return Err(ChatError::MissingApiKey.into());
        }
        Ok(Self {
            api_key,
            api_url: env::var("GEMINI_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            model: env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            storage_url: env::var("STORAGE_URL").unwrap_or_default(),
            storage_bucket: env::var("STORAGE_BUCKET")
                .unwrap_or_else(|_| DEFAULT_BUCKET.to_string()),
            storage_key: env::var("STORAGE_KEY").unwrap_or_default(),
        })
    }
}
