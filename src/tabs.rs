use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;

/// Last word opened in the side panel, per browser tab.
///
/// A side panel that finishes loading after the word was sent asks for it
/// again through [`get`](Self::get). Least-recently-used tabs are evicted
/// once `capacity` is reached.
pub struct TabWords {
    words: Mutex<LruCache<u64, String>>,
}

impl TabWords {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            words: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn remember(&self, tab: u64, word: &str) {
        self.words.lock().put(tab, word.to_string());
    }

    pub fn get(&self, tab: u64) -> Option<String> {
        self.words.lock().get(&tab).cloned()
    }

    pub fn forget(&self, tab: u64) -> Option<String> {
        self.words.lock().pop(&tab)
    }

    pub fn len(&self) -> usize {
        self.words.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
