//! The contract field types implement to parameterize a [`StateModel`].
//!
//! [`StateModel`]: crate::StateModel

use serde_json::Value;

use crate::draft::Draft;
use crate::props::Props;
use crate::{DirtyMap, State};

/// Static description of a field type: its defaults and how to build its
/// controller.
pub trait StateFactory {
    type Controller: StateController;

    /// Stored on the model and written into state as `displayName`.
    const DISPLAY_NAME: Option<&'static str> = None;

    fn default_state() -> State;

    fn default_props() -> Props {
        Props::new()
    }

    /// Build the controller once, at model construction.
    ///
    /// `state` is the default state and `props` the merged props. Fields the
    /// controller derives from them (a canonical name from a raw path, say)
    /// are returned in [`Init::derived`] and merged into state before the
    /// model is handed out.
    fn create(state: &State, props: &Props) -> Init<Self::Controller>;
}

/// Controller plus the fields it derived during construction.
#[derive(Debug, Clone)]
pub struct Init<C> {
    pub controller: C,
    pub derived: State,
}

impl<C> Init<C> {
    pub fn new(controller: C) -> Self {
        Self {
            controller,
            derived: State::new(),
        }
    }

    pub fn derive(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.derived.insert(key.into(), value.into());
        self
    }
}

/// Lifecycle hooks. Every hook is optional; the defaults mean "absent".
pub trait StateController {
    /// Write computed fields into the draft, given the state before the write.
    /// Runs after the caller's mutator, inside the same write.
    fn compute_state(&mut self, _draft: &mut Draft, _prev: &State) {}

    /// Inspect the keys marked dirty by a write. Entries of a returned map
    /// are merged over the dirty map: `true` forces a key dirty, `false`
    /// clears it.
    fn dirty_check(&mut self, _dirty: &DirtyMap) -> Option<DirtyMap> {
        None
    }

    /// Shape the snapshot handed to readers in manual mode. `None` means the
    /// plain copy of state is published.
    fn publish_state(&self, _state: &State) -> Option<State> {
        None
    }
}

impl StateController for () {}
