//! Word-origin lookups backed by a shared text-generation session.
//!
//! [`LookupService`] is the entry point: it admits requests through a
//! per-source [`RateLimiter`], keeps one in-flight request per [`Surface`],
//! borrows the single session owned by [`SessionManager`], and degrades to
//! simplified English prompts through [`run_with_fallback`] when the model
//! rejects a word.

mod cancel;
pub mod config;
mod error;
pub mod http_model;
mod lifecycle;
mod lookup;
mod prompts;
mod rate_limit;
mod retry;
mod session;
mod tabs;
mod word;

#[cfg(feature = "web")]
pub mod web;

#[cfg(test)]
mod testing;

pub use cancel::CancellationToken;
pub use config::{LookupConfig, RateLimitConfig};
pub use error::{LookupError, ModelError};
pub use http_model::{HttpModel, HttpModelConfig};
pub use lifecycle::{RequestRegistry, Surface};
pub use lookup::{
    LoadingStates, LoadingUpdate, LookupService, POPUP_SOURCE, PopupResponse, SidePanelData,
    SidePanelResponse,
};
pub use prompts::Field;
pub use rate_limit::RateLimiter;
pub use retry::run_with_fallback;
pub use session::{LanguageModel, PromptSession, SessionConfig, SessionManager};
pub use tabs::TabWords;
pub use word::{MAX_WORD_CHARS, WordError, validate_word};
