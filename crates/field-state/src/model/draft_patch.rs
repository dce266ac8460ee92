//! Draft-and-patch diffing.
//!
//! The mutator and `compute_state` share one copy-on-write draft over the
//! stored state. The committed draft's patch log decides which top-level
//! keys are dirty: a top-level `replace` only counts when the value really
//! changed, every other patch always marks its key. If a hook wrote to the
//! model while the draft was open, the draft's keys are applied over that
//! write instead of replacing it.

use std::rc::Rc;

use field_state_util::deep_equal;
use tracing::trace;

use super::{rebase, StateModel};
use crate::draft::{Commit, Draft};
use crate::factory::{StateController, StateFactory};
use crate::patch::{Patch, PatchOp};

impl<F: StateFactory> StateModel<F> {
    pub(super) fn commit_draft<E>(
        &self,
        mutator: impl FnOnce(&mut Draft) -> Result<(), E>,
        batching: bool,
    ) -> Result<(), E> {
        let base = self.source_state();
        let mut draft = Draft::new(base.clone());
        mutator(&mut draft)?;
        self.with_controller(|controller| controller.compute_state(&mut draft, &base));
        let Commit { state, patches } = draft.finish();

        let mut dirty = self.dirty.borrow_mut();
        if !batching {
            dirty.reset();
        }
        for patch in &patches {
            let Some(key) = patch.key() else {
                continue;
            };
            if dirty.is_marked(key) {
                continue;
            }
            let changed = match patch.op {
                PatchOp::Replace if patch.is_top_level() => {
                    match (base.get(key), state.get(key)) {
                        (Some(old), Some(new)) => !deep_equal(old, new),
                        (None, None) => false,
                        _ => true,
                    }
                }
                _ => true,
            };
            if changed {
                dirty.mark(key);
            }
        }
        drop(dirty);

        let stored = self.source_state();
        let state = if Rc::ptr_eq(&stored, &base) {
            state
        } else {
            trace!(model = self.name(), "draft rebased over re-entrant write");
            Rc::new(rebase(&stored, &state, patches.iter().filter_map(Patch::key)))
        };
        *self.state.borrow_mut() = state;
        Ok(())
    }
}
