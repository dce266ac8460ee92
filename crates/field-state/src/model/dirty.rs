use crate::DirtyMap;

/// Keys changed by recent writes. Only `true` entries are kept, so the count
/// is the map's size.
///
/// `pending` is set while the marked keys include changes subscribers have
/// not been notified of (silent writes, writes deferred to a batch). Pending
/// keys survive the reset at the start of the next write or batch, so the
/// next notification covers them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct DirtyState {
    map: DirtyMap,
    pending: bool,
}

impl DirtyState {
    /// Mark `key`; returns whether it was newly marked.
    pub fn mark(&mut self, key: impl Into<String>) -> bool {
        self.map.insert(key.into(), true).is_none()
    }

    /// Apply a controller override: `true` marks, `false` unmarks.
    pub fn merge(&mut self, overrides: DirtyMap) {
        for (key, dirty) in overrides {
            if dirty {
                self.map.insert(key, true);
            } else {
                self.map.remove(&key);
            }
        }
    }

    pub fn is_marked(&self, key: &str) -> bool {
        self.map.get(key).copied().unwrap_or(false)
    }

    pub fn count(&self) -> usize {
        self.map.len()
    }

    pub fn map(&self) -> &DirtyMap {
        &self.map
    }

    pub fn is_pending(&self) -> bool {
        self.pending && !self.map.is_empty()
    }

    /// Record that the marked keys have not reached subscribers yet.
    pub fn hold(&mut self) {
        if !self.map.is_empty() {
            self.pending = true;
        }
    }

    /// Subscribers are about to see the current state.
    pub fn deliver(&mut self) {
        self.pending = false;
    }

    /// Drop keys subscribers already know about; pending keys are kept.
    pub fn reset(&mut self) {
        if !self.is_pending() {
            self.clear();
        }
    }

    pub fn clear(&mut self) {
        self.map.clear();
        self.pending = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mark_counts_distinct_keys() {
        let mut dirty = DirtyState::default();
        assert!(dirty.mark("a"));
        assert!(!dirty.mark("a"));
        assert!(dirty.mark("b"));
        assert_eq!(dirty.count(), 2);
        assert!(dirty.is_marked("a"));
        assert!(!dirty.is_marked("c"));
    }

    #[test]
    fn merge_marks_and_unmarks() {
        let mut dirty = DirtyState::default();
        dirty.mark("a");
        dirty.merge(DirtyMap::from([("a".to_string(), false), ("z".to_string(), true)]));
        assert!(!dirty.is_marked("a"));
        assert!(dirty.is_marked("z"));
        assert_eq!(dirty.count(), 1);
        assert!(dirty.map().values().all(|v| *v));
        dirty.clear();
        assert_eq!(dirty.count(), 0);
    }

    #[test]
    fn reset_keeps_undelivered_keys() {
        let mut dirty = DirtyState::default();
        dirty.mark("a");
        dirty.hold();
        dirty.reset();
        assert!(dirty.is_marked("a"));
        assert!(dirty.is_pending());

        dirty.deliver();
        assert!(!dirty.is_pending());
        dirty.reset();
        assert_eq!(dirty.count(), 0);
    }

    #[test]
    fn hold_on_empty_map_is_not_pending() {
        let mut dirty = DirtyState::default();
        dirty.hold();
        assert!(!dirty.is_pending());
        dirty.mark("a");
        dirty.merge(DirtyMap::from([("a".to_string(), false)]));
        dirty.hold();
        assert!(!dirty.is_pending());
    }
}
