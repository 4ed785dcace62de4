use crate::error::ModelError;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Parameters used when a generation session is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// System role preamble sent ahead of every prompt.
    pub system_prompt: String,
}

impl SessionConfig {
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
        }
    }
}

/// A live handle to a text-generation capability.
pub trait PromptSession: Send + Sync + 'static {
    fn prompt(&self, input: &str) -> impl Future<Output = Result<String, ModelError>> + Send;

    /// Releases backend resources. Prompts issued afterwards should fail
    /// with [`ModelError::InvalidSession`].
    fn destroy(&self) -> impl Future<Output = Result<(), ModelError>> + Send;
}

/// Factory for [`PromptSession`]s.
pub trait LanguageModel: Send + Sync + 'static {
    type Session: PromptSession;

    fn create_session(
        &self,
        config: &SessionConfig,
    ) -> impl Future<Output = Result<Self::Session, ModelError>> + Send;
}

/// Owns the single process-wide generation session.
///
/// The session is built lazily on the first [`acquire`](Self::acquire) and
/// shared by every caller until [`reset`](Self::reset) disposes of it.
/// Callers borrow it for one prompt at a time through the returned `Arc`.
pub struct SessionManager<M: LanguageModel> {
    model: M,
    slot: Mutex<Option<Arc<M::Session>>>,
}

impl<M: LanguageModel> SessionManager<M> {
    pub fn new(model: M) -> Self {
        Self {
            model,
            slot: Mutex::new(None),
        }
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub async fn acquire(&self, config: &SessionConfig) -> Result<Arc<M::Session>, ModelError> {
        let mut slot = self.slot.lock().await;
        if let Some(session) = slot.as_ref() {
            return Ok(Arc::clone(session));
        }
        let session = Arc::new(self.model.create_session(config).await?);
        *slot = Some(Arc::clone(&session));
        info!("created generation session");
        Ok(session)
    }

    /// Disposes of the cached session, if any. Disposal failures are logged
    /// and swallowed; the next `acquire` always rebuilds.
    pub async fn reset(&self) {
        let taken = self.slot.lock().await.take();
        let Some(session) = taken else {
            debug!("session reset requested with no live session");
            return;
        };
        match session.destroy().await {
            Ok(()) => info!("generation session destroyed"),
            Err(err) => warn!(error = %err, "failed to destroy generation session"),
        }
    }

    pub async fn is_live(&self) -> bool {
        self.slot.lock().await.is_some()
    }
}
