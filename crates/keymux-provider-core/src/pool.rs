use std::sync::Arc;

use arc_swap::ArcSwapOption;
use rand::seq::SliceRandom;

use crate::context::RequestKeyContext;

/// Shared pool of upstream API keys for one provider.
///
/// The pool itself is immutable apart from the `last_failed` hint, which is a
/// last-writer-wins slot updated after each completed request. Request-scoped
/// selection state lives in [`RequestKeyContext`], never here.
pub struct KeyPool {
    keys: Arc<Vec<String>>,
    last_failed: ArcSwapOption<String>,
}

impl KeyPool {
    pub fn new(keys: Vec<String>) -> Self {
        Self {
            keys: Arc::new(keys),
            last_failed: ArcSwapOption::empty(),
        }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Opens a fresh request context over a smart-shuffled copy of the keys.
    ///
    /// Smart shuffle: a uniform Fisher–Yates permutation, then the
    /// `last_failed` hint (when still present in the pool) is demoted to the
    /// tail so a freshly failing key is retried last.
    pub fn new_context(&self) -> RequestKeyContext {
        let mut order: Vec<String> = self.keys.as_ref().clone();
        order.shuffle(&mut rand::rng());
        if let Some(hint) = self.last_failed.load_full()
            && let Some(pos) = order.iter().position(|key| key == hint.as_ref())
        {
            let demoted = order.remove(pos);
            order.push(demoted);
        }
        RequestKeyContext::new(order)
    }

    /// Records the key that most recently hit a rotation code, or clears the
    /// hint. Last writer wins across concurrent requests.
    pub fn update_last_failed_key(&self, key: Option<&str>) {
        self.last_failed
            .store(key.map(|key| Arc::new(key.to_string())));
    }

    pub fn last_failed_key(&self) -> Option<String> {
        self.last_failed.load_full().map(|key| key.as_ref().clone())
    }
}

impl std::fmt::Debug for KeyPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPool")
            .field("key_count", &self.keys.len())
            .field("last_failed", &self.last_failed.load().is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn pool(keys: &[&str]) -> KeyPool {
        KeyPool::new(keys.iter().map(|k| k.to_string()).collect())
    }

    #[test]
    fn context_order_is_a_permutation() {
        let pool = pool(&["k1", "k2", "k3", "k4"]);
        for _ in 0..32 {
            let ctx = pool.new_context();
            let order: HashSet<&str> = ctx.attempt_order().iter().map(String::as_str).collect();
            assert_eq!(order, HashSet::from(["k1", "k2", "k3", "k4"]));
            assert_eq!(ctx.attempt_order().len(), 4);
        }
    }

    #[test]
    fn last_failed_key_lands_at_the_tail() {
        let pool = pool(&["k1", "k2", "k3"]);
        pool.update_last_failed_key(Some("k2"));
        for _ in 0..32 {
            let ctx = pool.new_context();
            assert_eq!(ctx.attempt_order().last().map(String::as_str), Some("k2"));
        }
    }

    #[test]
    fn stale_hint_not_in_pool_is_ignored() {
        let pool = pool(&["k1", "k2"]);
        pool.update_last_failed_key(Some("gone"));
        let ctx = pool.new_context();
        assert_eq!(ctx.attempt_order().len(), 2);
        assert!(!ctx.attempt_order().iter().any(|k| k == "gone"));
    }

    #[test]
    fn single_key_pool_shuffles_to_itself() {
        let pool = pool(&["only"]);
        pool.update_last_failed_key(Some("only"));
        let ctx = pool.new_context();
        assert_eq!(ctx.attempt_order().to_vec(), vec!["only".to_string()]);
    }

    #[test]
    fn hint_clears_with_none() {
        let pool = pool(&["k1"]);
        pool.update_last_failed_key(Some("k1"));
        pool.update_last_failed_key(None);
        assert_eq!(pool.last_failed_key(), None);
    }
}
