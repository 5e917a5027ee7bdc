//! Data model for captured conversations.

pub mod conversation;
pub mod filter;
pub mod platform;
pub mod settings;

pub use conversation::{new_id, Actor, Attachment, Conversation, Utterance};
pub use filter::ConversationFilter;
pub use platform::Platform;
pub use settings::CaptureSettings;
