pub mod attachment;
pub mod error;
pub mod message;
pub mod prompt;
pub mod session;
