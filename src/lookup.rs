use crate::cancel::CancellationToken;
use crate::config::LookupConfig;
use crate::error::LookupError;
use crate::lifecycle::{RequestRegistry, Surface};
use crate::prompts::Field;
use crate::rate_limit::RateLimiter;
use crate::retry::run_with_fallback;
use crate::session::{LanguageModel, PromptSession, SessionConfig, SessionManager};
use crate::tabs::TabWords;
use crate::word::{WordError, validate_word};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

pub const POPUP_SOURCE: &str = "popup";
const RATE_LIMITED_MESSAGE: &str = "Please wait a moment before trying again.";
const RATE_LIMITED_ERROR: &str = "Rate limit exceeded";
const INVALID_WORD_MESSAGE: &str = "Please select a single word or short phrase.";
const POPUP_CANCELLED_MESSAGE: &str = "Loading new request...";
const PANEL_CANCELLED_MESSAGE: &str = "New word selected...";
const UPDATE_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PopupResponse {
    pub success: bool,
    pub etymology: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PopupResponse {
    fn ok(etymology: String) -> Self {
        Self {
            success: true,
            etymology,
            error: None,
        }
    }

    fn failed(etymology: &str, error: impl Into<String>) -> Self {
        Self {
            success: false,
            etymology: etymology.to_string(),
            error: Some(error.into()),
        }
    }

    fn cancelled() -> Self {
        Self {
            success: false,
            etymology: POPUP_CANCELLED_MESSAGE.to_string(),
            error: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SidePanelData {
    pub etymology: String,
    pub usage: String,
    pub synonyms: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SidePanelResponse {
    pub success: bool,
    #[serde(default)]
    pub cancelled: bool,
    pub selected_text: String,
    /// Serialized inline: `etymology`, `usage` and `synonyms` sit at the top level.
    #[serde(flatten)]
    pub data: Option<SidePanelData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SidePanelResponse {
    fn ready(word: &str, data: SidePanelData) -> Self {
        Self {
            success: true,
            cancelled: false,
            selected_text: word.to_string(),
            data: Some(data),
            message: None,
            error: None,
        }
    }

    fn cancelled(word: &str) -> Self {
        Self {
            success: false,
            cancelled: true,
            selected_text: word.to_string(),
            data: None,
            message: Some(PANEL_CANCELLED_MESSAGE.to_string()),
            error: None,
        }
    }

    fn rejected(word: &str, message: &str, error: impl Into<String>) -> Self {
        Self {
            success: false,
            cancelled: false,
            selected_text: word.to_string(),
            data: None,
            message: Some(message.to_string()),
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoadingStates {
    pub etymology: bool,
    pub usage: bool,
    pub synonyms: bool,
}

impl LoadingStates {
    pub const ALL: Self = Self {
        etymology: true,
        usage: true,
        synonyms: true,
    };
    pub const NONE: Self = Self {
        etymology: false,
        usage: false,
        synonyms: false,
    };
}

/// Progress notification emitted around a side-panel fetch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoadingUpdate {
    pub word: String,
    pub states: LoadingStates,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<SidePanelData>,
}

/// Word-lookup front door shared by the popup and the side panel.
///
/// Owns the rate limiter, the request registry and the session manager, and
/// runs every lookup through admission, supersession and the fallback
/// policy before handing back a plain-text payload.
pub struct LookupService<M: LanguageModel> {
    config: LookupConfig,
    session_config: SessionConfig,
    limiter: Arc<RateLimiter>,
    sessions: SessionManager<M>,
    requests: RequestRegistry,
    tabs: TabWords,
    updates: broadcast::Sender<LoadingUpdate>,
}

impl<M: LanguageModel> LookupService<M> {
    pub fn new(model: M, config: LookupConfig) -> Self {
        let (updates, _) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);
        Self {
            session_config: SessionConfig::new(config.system_prompt.clone()),
            limiter: Arc::new(RateLimiter::new(config.rate_limit)),
            sessions: SessionManager::new(model),
            requests: RequestRegistry::new(),
            tabs: TabWords::new(config.tab_capacity),
            updates,
            config,
        }
    }

    pub fn config(&self) -> &LookupConfig {
        &self.config
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    pub fn sessions(&self) -> &SessionManager<M> {
        &self.sessions
    }

    pub fn requests(&self) -> &RequestRegistry {
        &self.requests
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LoadingUpdate> {
        self.updates.subscribe()
    }

    /// Brief etymology for the popup shown next to a double-clicked word.
    ///
    /// Any pending side-panel fetch is cancelled first. A lookup that
    /// supersedes an in-flight popup request skips admission, since the
    /// superseded request was already charged to the source.
    pub async fn lookup_popup(&self, source: &str, word: &str) -> PopupResponse {
        if let Err(err) = validate_word(word) {
            return PopupResponse::failed(INVALID_WORD_MESSAGE, err.to_string());
        }
        self.requests.cancel(Surface::SidePanel);

        let superseding = self.requests.is_busy(Surface::Popup);
        if !superseding && !self.limiter.admit(source) {
            info!(source, word, "popup lookup rate limited");
            return PopupResponse::failed(RATE_LIMITED_MESSAGE, RATE_LIMITED_ERROR);
        }

        let token = self.requests.begin(Surface::Popup, word);
        let result = self.fetch_field(Field::BriefEtymology, word, &token).await;
        self.requests.settle(Surface::Popup, &token);

        match result {
            Ok(text) => PopupResponse::ok(text),
            Err(LookupError::Cancelled) => {
                debug!(word, "popup lookup superseded");
                PopupResponse::cancelled()
            }
            Err(LookupError::Model(err)) => {
                warn!(word, error = %err, "popup lookup failed");
                self.sessions.reset().await;
                let field = Field::BriefEtymology;
                PopupResponse::failed(field.failure_message(), err.to_string())
            }
        }
    }

    /// Full etymology, usage examples and synonyms for the side panel.
    ///
    /// Fields are fetched one after another in [`Field::PANEL`] order with a
    /// pacing delay between them. A field that fails is replaced by its
    /// failure message; a superseded lookup stops at the next checkpoint and
    /// publishes nothing further.
    pub async fn lookup_side_panel(
        &self,
        source: &str,
        word: &str,
        tag: Option<&str>,
    ) -> SidePanelResponse {
        if let Err(err) = validate_word(word) {
            return SidePanelResponse::rejected(word, INVALID_WORD_MESSAGE, err.to_string());
        }
        if !self.limiter.admit(source) {
            info!(source, word, "side panel lookup rate limited");
            return SidePanelResponse::rejected(word, RATE_LIMITED_MESSAGE, RATE_LIMITED_ERROR);
        }

        let token = self.requests.begin(Surface::SidePanel, word);
        let outcome = self.fetch_panel(word, tag, &token).await;
        self.requests.settle(Surface::SidePanel, &token);

        match outcome {
            Ok(data) => SidePanelResponse::ready(word, data),
            Err(_) => {
                // No newer lookup owns the panel, so close out its loading state.
                if !self.requests.is_busy(Surface::SidePanel) {
                    self.publish(word, LoadingStates::NONE, tag, None);
                }
                debug!(word, "side panel lookup cancelled");
                SidePanelResponse::cancelled(word)
            }
        }
    }

    async fn fetch_panel(
        &self,
        word: &str,
        tag: Option<&str>,
        token: &CancellationToken,
    ) -> Result<SidePanelData, LookupError> {
        self.publish(word, LoadingStates::ALL, tag, None);

        let mut texts = Vec::with_capacity(Field::PANEL.len());
        for (index, field) in Field::PANEL.into_iter().enumerate() {
            if index > 0 && !self.config.field_delay.is_zero() {
                tokio::time::sleep(self.config.field_delay).await;
            }
            token.checkpoint()?;
            let text = match self.fetch_field(field, word, token).await {
                Ok(text) => text,
                Err(LookupError::Cancelled) => return Err(LookupError::Cancelled),
                Err(LookupError::Model(err)) => {
                    warn!(word, %field, error = %err, "side panel field failed");
                    self.sessions.reset().await;
                    field.failure_message().to_string()
                }
            };
            texts.push(text);
        }
        token.checkpoint()?;

        let mut texts = texts.into_iter();
        let data = SidePanelData {
            etymology: texts.next().unwrap_or_default(),
            usage: texts.next().unwrap_or_default(),
            synonyms: texts.next().unwrap_or_default(),
        };
        self.publish(word, LoadingStates::NONE, tag, Some(data.clone()));
        Ok(data)
    }

    /// Cancels the pending side-panel fetch. Returns the word it was for.
    pub fn cancel_side_panel(&self) -> Option<String> {
        self.requests.cancel(Surface::SidePanel)
    }

    pub fn cancel_popup(&self) -> Option<String> {
        self.requests.cancel(Surface::Popup)
    }

    /// Remembers `word` as the side-panel subject for `tab`.
    pub fn open_side_panel(&self, tab: u64, word: &str) -> Result<(), WordError> {
        validate_word(word)?;
        self.tabs.remember(tab, word);
        debug!(tab, word, "side panel word stored");
        Ok(())
    }

    pub fn stored_word(&self, tab: u64) -> Option<String> {
        self.tabs.get(tab)
    }

    pub fn forget_tab(&self, tab: u64) -> Option<String> {
        self.tabs.forget(tab)
    }

    /// Cancels everything in flight and disposes of the shared session.
    pub async fn shutdown(&self) {
        self.requests.cancel(Surface::Popup);
        self.requests.cancel(Surface::SidePanel);
        self.sessions.reset().await;
        info!("lookup service shut down");
    }

    async fn fetch_field(
        &self,
        field: Field,
        word: &str,
        token: &CancellationToken,
    ) -> Result<String, LookupError> {
        let primary = field.primary_prompt(word);
        let fallback = field.fallback_prompt(word);
        let text = run_with_fallback(
            || self.prompt_once(&primary, token),
            || self.prompt_once(&fallback, token),
            self.config.max_retries,
        )
        .await?;
        if text.trim().is_empty() {
            Ok(field.empty_reply().to_string())
        } else {
            Ok(text)
        }
    }

    /// One prompt against the shared session, checking for cancellation
    /// around each suspension point. An unusable session is rebuilt and the
    /// prompt retried once.
    async fn prompt_once(
        &self,
        prompt: &str,
        token: &CancellationToken,
    ) -> Result<String, LookupError> {
        token.checkpoint()?;
        let acquired = self.sessions.acquire(&self.session_config).await;
        token.checkpoint()?;
        let session = acquired?;
        let attempt = session.prompt(prompt).await;
        drop(session);
        // A superseded request reports cancellation even when its call failed.
        token.checkpoint()?;
        match attempt {
            Err(err) if err.is_invalid_session() => {
                warn!(error = %err, "session unusable, rebuilding");
                self.sessions.reset().await;
                token.checkpoint()?;
                let acquired = self.sessions.acquire(&self.session_config).await;
                token.checkpoint()?;
                let attempt = acquired?.prompt(prompt).await;
                token.checkpoint()?;
                Ok(attempt?)
            }
            other => Ok(other?),
        }
    }

    fn publish(
        &self,
        word: &str,
        states: LoadingStates,
        tag: Option<&str>,
        data: Option<SidePanelData>,
    ) {
        let update = LoadingUpdate {
            word: word.to_string(),
            states,
            source: tag.map(str::to_string),
            data,
        };
        // No subscribers is fine; updates are advisory.
        let _ = self.updates.send(update);
    }
}
