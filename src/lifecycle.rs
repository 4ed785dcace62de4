use crate::cancel::CancellationToken;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::info;

/// Caller context that owns at most one in-flight request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Surface {
    Popup,
    SidePanel,
}

impl fmt::Display for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Surface::Popup => write!(f, "popup"),
            Surface::SidePanel => write!(f, "sidepanel"),
        }
    }
}

struct InFlight {
    token: CancellationToken,
    subject: String,
}

/// Registry of the active request per [`Surface`].
///
/// Starting a request cancels whatever occupied the surface's slot, and a
/// settling request only clears the slot when it still owns it.
#[derive(Default)]
pub struct RequestRegistry {
    slots: Mutex<HashMap<Surface, InFlight>>,
}

impl RequestRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self, surface: Surface, subject: &str) -> CancellationToken {
        let token = CancellationToken::new();
        let previous = self.slots.lock().insert(
            surface,
            InFlight {
                token: token.clone(),
                subject: subject.to_string(),
            },
        );
        if let Some(previous) = previous {
            previous.token.cancel();
            info!(%surface, superseded = %previous.subject, subject, "superseding in-flight request");
        }
        token
    }

    /// Cancels and clears the surface's slot. Returns the cancelled subject.
    pub fn cancel(&self, surface: Surface) -> Option<String> {
        let previous = self.slots.lock().remove(&surface)?;
        previous.token.cancel();
        info!(%surface, subject = %previous.subject, "cancelled in-flight request");
        Some(previous.subject)
    }

    /// Clears the slot if `token` still owns it. Returns whether it did.
    pub fn settle(&self, surface: Surface, token: &CancellationToken) -> bool {
        let mut slots = self.slots.lock();
        let owns = slots
            .get(&surface)
            .is_some_and(|current| current.token.same_as(token));
        if owns {
            slots.remove(&surface);
        }
        owns
    }

    pub fn in_flight(&self, surface: Surface) -> Option<String> {
        self.slots
            .lock()
            .get(&surface)
            .map(|current| current.subject.clone())
    }

    pub fn is_busy(&self, surface: Surface) -> bool {
        self.slots.lock().contains_key(&surface)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn begin_supersedes_previous_request() {
        let registry = RequestRegistry::new();
        let first = registry.begin(Surface::Popup, "ephemeral");
        let second = registry.begin(Surface::Popup, "quixotic");
        assert!(first.is_cancelled());
        assert!(!second.is_cancelled());
        assert_eq!(registry.in_flight(Surface::Popup).as_deref(), Some("quixotic"));
    }

    #[test]
    fn stale_settle_does_not_clobber_newer_request() {
        let registry = RequestRegistry::new();
        let first = registry.begin(Surface::SidePanel, "ephemeral");
        let second = registry.begin(Surface::SidePanel, "quixotic");
        assert!(!registry.settle(Surface::SidePanel, &first));
        assert!(registry.is_busy(Surface::SidePanel));
        assert!(registry.settle(Surface::SidePanel, &second));
        assert!(!registry.is_busy(Surface::SidePanel));
    }

    #[test]
    fn surfaces_are_independent() {
        let registry = RequestRegistry::new();
        let popup = registry.begin(Surface::Popup, "word");
        let panel = registry.begin(Surface::SidePanel, "word");
        assert!(!popup.is_cancelled());
        assert_eq!(registry.cancel(Surface::SidePanel).as_deref(), Some("word"));
        assert!(panel.is_cancelled());
        assert!(!popup.is_cancelled());
        assert!(registry.is_busy(Surface::Popup));
    }

    #[test]
    fn cancel_on_idle_surface_returns_none() {
        let registry = RequestRegistry::new();
        assert_eq!(registry.cancel(Surface::SidePanel), None);
    }
}
