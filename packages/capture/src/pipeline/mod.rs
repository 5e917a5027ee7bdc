//! The capture pipeline: detect, extract, deduplicate, persist.
//!
//! Data flows one way: a page snapshot is matched to a platform
//! ([`detect`]), its markup is mined for utterances using that
//! platform's selector tables ([`profiles`], [`extract`]), near-copies
//! are dropped ([`dedupe`]), and the result is merged into the store by
//! URL ([`merge`]). [`session`] drives the whole loop on a schedule.

pub mod dedupe;
pub mod detect;
mod dom;
pub mod extract;
pub mod merge;
pub mod profiles;
pub mod session;

pub use dedupe::{dedupe_by_fingerprint, dedupe_pass, is_duplicate, jaccard_similarity};
pub use detect::detect_platform;
pub use extract::{extract_messages, extract_model};
pub use merge::{persist_conversation, spawn_persister};
pub use profiles::{profile, PlatformProfile};
pub use session::{
    capture_pass, CaptureSession, SessionCommand, SessionConfig, SessionHandle, SessionState,
};
