pub mod attachment;
pub mod config;
pub mod gemini;
pub mod storage;
