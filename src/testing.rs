//! Scripted language model shared by the unit tests.

use crate::error::ModelError;
use crate::session::{LanguageModel, PromptSession, SessionConfig};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

type Responder = Box<dyn Fn(&str) -> Result<String, ModelError> + Send + Sync>;

#[derive(Clone)]
pub(crate) struct ScriptedModel {
    state: Arc<ScriptState>,
}

struct ScriptState {
    responder: Responder,
    delay: Mutex<Duration>,
    create_delay: Mutex<Duration>,
    creates: AtomicUsize,
    destroys: AtomicUsize,
    create_failures: AtomicUsize,
    destroy_fails: AtomicBool,
    prompts: Mutex<Vec<String>>,
    system_prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    pub(crate) fn new<F>(responder: F) -> Self
    where
        F: Fn(&str) -> Result<String, ModelError> + Send + Sync + 'static,
    {
        Self {
            state: Arc::new(ScriptState {
                responder: Box::new(responder),
                delay: Mutex::new(Duration::ZERO),
                create_delay: Mutex::new(Duration::ZERO),
                creates: AtomicUsize::new(0),
                destroys: AtomicUsize::new(0),
                create_failures: AtomicUsize::new(0),
                destroy_fails: AtomicBool::new(false),
                prompts: Mutex::new(Vec::new()),
                system_prompts: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Answers every prompt with `reply: <prompt>`.
    pub(crate) fn echo() -> Self {
        Self::new(|prompt| Ok(format!("reply: {prompt}")))
    }

    pub(crate) fn with_delay(self, delay: Duration) -> Self {
        *self.state.delay.lock() = delay;
        self
    }

    pub(crate) fn with_create_delay(self, delay: Duration) -> Self {
        *self.state.create_delay.lock() = delay;
        self
    }

    pub(crate) fn failing_destroy(self) -> Self {
        self.state.destroy_fails.store(true, Ordering::SeqCst);
        self
    }

    pub(crate) fn failing_creates(self, count: usize) -> Self {
        self.state.create_failures.store(count, Ordering::SeqCst);
        self
    }

    pub(crate) fn creates(&self) -> usize {
        self.state.creates.load(Ordering::SeqCst)
    }

    pub(crate) fn destroys(&self) -> usize {
        self.state.destroys.load(Ordering::SeqCst)
    }

    pub(crate) fn prompts(&self) -> Vec<String> {
        self.state.prompts.lock().clone()
    }

    pub(crate) fn system_prompts(&self) -> Vec<String> {
        self.state.system_prompts.lock().clone()
    }
}

impl LanguageModel for ScriptedModel {
    type Session = ScriptedSession;

    async fn create_session(&self, config: &SessionConfig) -> Result<ScriptedSession, ModelError> {
        let delay = *self.state.create_delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let pending_failures = self.state.create_failures.load(Ordering::SeqCst);
        if pending_failures > 0 {
            self.state
                .create_failures
                .store(pending_failures - 1, Ordering::SeqCst);
            return Err(ModelError::Network("model unavailable".into()));
        }
        self.state.creates.fetch_add(1, Ordering::SeqCst);
        self.state
            .system_prompts
            .lock()
            .push(config.system_prompt.clone());
        Ok(ScriptedSession {
            state: Arc::clone(&self.state),
            destroyed: AtomicBool::new(false),
        })
    }
}

pub(crate) struct ScriptedSession {
    state: Arc<ScriptState>,
    destroyed: AtomicBool,
}

impl PromptSession for ScriptedSession {
    async fn prompt(&self, input: &str) -> Result<String, ModelError> {
        if self.destroyed.load(Ordering::SeqCst) {
            return Err(ModelError::InvalidSession("session destroyed".into()));
        }
        let delay = *self.state.delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.state.prompts.lock().push(input.to_string());
        (self.state.responder)(input)
    }

    async fn destroy(&self) -> Result<(), ModelError> {
        self.destroyed.store(true, Ordering::SeqCst);
        self.state.destroys.fetch_add(1, Ordering::SeqCst);
        if self.state.destroy_fails.load(Ordering::SeqCst) {
            return Err(ModelError::Network("destroy failed".into()));
        }
        Ok(())
    }
}
