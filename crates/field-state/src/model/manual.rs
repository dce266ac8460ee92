//! Manual field diffing.
//!
//! The mutator works on a detached snapshot; afterwards every stored key is
//! compared against the snapshot with deep equality and differing values are
//! copied back. Keys the mutator adds that the state never had are ignored.

use std::rc::Rc;

use field_state_util::deep_equal;

use super::StateModel;
use crate::draft::Draft;
use crate::factory::{StateController, StateFactory};

impl<F: StateFactory> StateModel<F> {
    pub(super) fn commit_manual<E>(
        &self,
        mutator: impl FnOnce(&mut Draft) -> Result<(), E>,
        batching: bool,
    ) -> Result<(), E> {
        let current = self.source_state();
        let mut draft = Draft::detached(self.get_state());
        mutator(&mut draft)?;
        self.with_controller(|controller| controller.compute_state(&mut draft, &current));
        let mut next = draft.into_state();

        let changed: Vec<String> = current
            .iter()
            .filter(|(key, value)| !next.get(key.as_str()).is_some_and(|n| deep_equal(value, n)))
            .map(|(key, _)| key.clone())
            .collect();
        drop(current);

        let mut dirty = self.dirty.borrow_mut();
        if !batching {
            dirty.reset();
        }
        if changed.is_empty() {
            return Ok(());
        }
        // Writes made from inside the hook already landed in the slot; only
        // the keys this write changed are copied over them.
        let mut slot = self.state.borrow_mut();
        let stored = Rc::make_mut(&mut slot);
        for key in changed {
            match next.remove(&key) {
                Some(value) => {
                    stored.insert(key.clone(), value);
                }
                None => {
                    stored.shift_remove(&key);
                }
            }
            dirty.mark(key);
        }
        Ok(())
    }
}
