//! Assistant panels: chatbot and load optimizer

pub mod chat;
pub mod optimizer;

pub use chat::{Assistant, ChatMessage, Speaker, CANNED_REPLY, GREETING};
pub use optimizer::{LoadOptimizer, OPTIMIZED_MESSAGE};
