//! The state model engine.
//!
//! A [`StateModel`] owns one field's state and props, runs writes through
//! the factory's hooks, tracks which top-level keys changed, and notifies
//! subscribers. Writes are detected either by manual field diffing or by a
//! copy-on-write [`Draft`] and its patch log; see [`Strategy`].
//!
//! The model is single-threaded and uses interior mutability. No internal
//! borrow is held while a mutator, hook or subscriber runs, so all of them
//! may call back into the model. While a hook runs, the controller is lent
//! out: a re-entrant write made from inside a hook runs without hooks, and a
//! re-entrant read gets the plain copy of state.

use std::cell::{Cell, RefCell};
use std::convert::Infallible;
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

use field_state_util::{assign, deep_equal, shallow_merge};
use serde_json::Value;
use tracing::{debug, trace};

use crate::capability::{Capabilities, Strategy};
use crate::draft::Draft;
use crate::factory::{Init, StateController, StateFactory};
use crate::props::{ModelOptions, Props};
use crate::subscribers::{Subscriber, Subscribers};
use crate::{DirtyMap, State};

mod dirty;
mod draft_patch;
mod manual;

use dirty::DirtyState;

/// State key the factory's display name is written under.
pub const DISPLAY_NAME_KEY: &str = "displayName";

pub struct StateModel<F: StateFactory> {
    display_name: Option<&'static str>,
    props: Props,
    strategy: Strategy,
    state: RefCell<Rc<State>>,
    dirty: RefCell<DirtyState>,
    batch_depth: Cell<usize>,
    subscribers: RefCell<Subscribers>,
    controller: RefCell<Option<F::Controller>>,
    _factory: PhantomData<F>,
}

impl<F: StateFactory> StateModel<F> {
    /// Build a model using the capabilities reported by
    /// [`Capabilities::probe`].
    pub fn new(props: Props) -> Self {
        Self::with_capabilities(props, Capabilities::probe())
    }

    pub fn with_capabilities(props: Props, capabilities: Capabilities) -> Self {
        let mut state = F::default_state();
        let props = shallow_merge(&F::default_props(), &props);
        let strategy = Strategy::select(capabilities, &ModelOptions::from_props(&props));
        let Init {
            controller,
            derived,
        } = F::create(&state, &props);
        assign(&mut state, &derived);
        if let Some(name) = F::DISPLAY_NAME {
            state.insert(DISPLAY_NAME_KEY.to_string(), Value::from(name));
        }
        debug!(
            model = F::DISPLAY_NAME.unwrap_or("anonymous"),
            ?strategy,
            keys = state.len(),
            "state model created"
        );
        Self {
            display_name: F::DISPLAY_NAME,
            props,
            strategy,
            state: RefCell::new(Rc::new(state)),
            dirty: RefCell::new(DirtyState::default()),
            batch_depth: Cell::new(0),
            subscribers: RefCell::new(Subscribers::new()),
            controller: RefCell::new(Some(controller)),
            _factory: PhantomData,
        }
    }

    pub fn display_name(&self) -> Option<&'static str> {
        self.display_name
    }

    pub fn props(&self) -> &Props {
        &self.props
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Snapshot of the state, detached from the model.
    ///
    /// In manual mode the controller's `publish_state` hook shapes the
    /// snapshot when it provides one. In draft mode the snapshot is a copy of
    /// the committed state.
    pub fn get_state(&self) -> State {
        let state = self.source_state();
        match self.strategy {
            Strategy::Manual => self
                .with_controller(|controller| controller.publish_state(&state))
                .flatten()
                .unwrap_or_else(|| State::clone(&state)),
            Strategy::Draft => Draft::new(state).into_state(),
        }
    }

    /// Pass a snapshot to `callback` and return its result.
    pub fn get_state_with<R>(&self, callback: impl FnOnce(State) -> R) -> R {
        callback(self.get_state())
    }

    /// Apply `mutator` and notify subscribers if any key changed.
    ///
    /// The dirty map keeps the keys this write changed until the next write
    /// outside a batch starts, so subscribers and callers can inspect them
    /// with [`has_changed`](Self::has_changed). Keys left by earlier silent
    /// writes are kept and delivered with this write's notification.
    pub fn set_state(&self, mutator: impl FnOnce(&mut Draft)) {
        let result = self.try_set_state(
            |draft| {
                mutator(draft);
                Ok::<(), Infallible>(())
            },
            false,
        );
        match result {
            Ok(()) => {}
            Err(never) => match never {},
        }
    }

    /// Apply `mutator` and track dirty keys without notifying anyone. The
    /// change is delivered by the next notifying write or [`flush`](Self::flush).
    pub fn set_state_silent(&self, mutator: impl FnOnce(&mut Draft)) {
        let result = self.try_set_state(
            |draft| {
                mutator(draft);
                Ok::<(), Infallible>(())
            },
            true,
        );
        match result {
            Ok(()) => {}
            Err(never) => match never {},
        }
    }

    /// Fallible write. When `mutator` returns `Err` nothing is committed:
    /// state, dirty keys and subscribers are left exactly as they were.
    pub fn try_set_state<E>(
        &self,
        mutator: impl FnOnce(&mut Draft) -> Result<(), E>,
        silent: bool,
    ) -> Result<(), E> {
        let batching = self.is_batching();
        match self.strategy {
            Strategy::Manual => self.commit_manual(mutator, batching)?,
            Strategy::Draft => self.commit_draft(mutator, batching)?,
        }
        self.run_dirty_check();

        let count = self.dirty.borrow().count();
        debug!(
            model = self.name(),
            strategy = ?self.strategy,
            dirty = count,
            silent,
            batching,
            "state committed"
        );
        if count == 0 {
            return Ok(());
        }
        if silent || batching {
            if batching && !silent {
                trace!(model = self.name(), "notification deferred to batch");
            }
            self.dirty.borrow_mut().hold();
            return Ok(());
        }
        self.dirty.borrow_mut().deliver();
        self.notify(&self.get_state());
        Ok(())
    }

    /// Run `callback` with the live state. Bypasses hooks.
    pub fn get_source_state<R>(&self, callback: impl FnOnce(&State) -> R) -> R {
        callback(&self.source_state())
    }

    /// Shared handle to the live state. Draft-mode writes replace the state
    /// rather than mutating it, so a held handle keeps seeing the old value.
    pub fn source_state(&self) -> Rc<State> {
        Rc::clone(&self.state.borrow())
    }

    /// Mutate state directly: no hooks, no dirty tracking, no notification.
    ///
    /// `callback` edits a copy that replaces the stored state afterwards, in
    /// both strategies. If `callback` writes to the model itself, the keys it
    /// edited directly are applied over the state those writes produced.
    pub fn set_source_state(&self, callback: impl FnOnce(&mut State)) {
        let base = self.source_state();
        let mut next = State::clone(&base);
        callback(&mut next);
        let stored = self.source_state();
        if !Rc::ptr_eq(&stored, &base) {
            let edited = edited_keys(&base, &next);
            trace!(model = self.name(), keys = edited.len(), "source edit rebased");
            next = rebase(&stored, &next, edited.iter().map(String::as_str));
        }
        *self.state.borrow_mut() = Rc::new(next);
        trace!(model = self.name(), "source state replaced");
    }

    /// Register `subscriber` unless the same handle is already registered.
    pub fn subscribe(&self, subscriber: &Subscriber) -> bool {
        self.subscribers.borrow_mut().add(subscriber)
    }

    /// Wrap `callback` in a new handle and register it.
    pub fn subscribe_fn(&self, callback: impl Fn(&State) + 'static) -> Subscriber {
        let subscriber = Subscriber::new(callback);
        self.subscribe(&subscriber);
        subscriber
    }

    pub fn unsubscribe(&self, subscriber: &Subscriber) -> usize {
        self.subscribers.borrow_mut().remove(subscriber)
    }

    pub fn unsubscribe_all(&self) {
        self.subscribers.borrow_mut().clear();
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.borrow().len()
    }

    /// Call every subscriber, in registration order, with `payload`.
    /// A panicking subscriber aborts the loop and propagates.
    pub fn notify(&self, payload: &State) {
        let subscribers = self.subscribers.borrow().snapshot();
        trace!(model = self.name(), subscribers = subscribers.len(), "notify");
        for subscriber in subscribers {
            subscriber.call(payload);
        }
    }

    /// Run `callback` with per-write notification suppressed, then notify
    /// once if any change has not reached subscribers yet.
    ///
    /// Writes inside the batch accumulate dirty keys on top of the keys
    /// still waiting from silent writes; keys that were already delivered
    /// are dropped when the outermost batch begins. The dirty map is cleared
    /// after the flush, except for changes subscribers made while being
    /// notified, which wait for the next flush or notifying write. Nested
    /// batches flush only when the outermost one ends.
    pub fn batch(&self, callback: impl FnOnce()) {
        let depth = self.batch_depth.get();
        if depth == 0 {
            self.dirty.borrow_mut().reset();
        }
        self.batch_depth.set(depth + 1);
        let _exit = BatchExit(&self.batch_depth);
        callback();
        if depth == 0 {
            let pending = self.dirty.borrow().is_pending();
            if pending {
                let mut dirty = self.dirty.borrow_mut();
                debug!(model = self.name(), dirty = dirty.count(), "batch flushed");
                dirty.deliver();
                drop(dirty);
                self.notify(&self.get_state());
            }
            self.dirty.borrow_mut().reset();
        }
    }

    /// A batch with nothing in it: deliver changes left by silent writes.
    pub fn flush(&self) {
        self.batch(|| {});
    }

    pub fn is_batching(&self) -> bool {
        self.batch_depth.get() > 0
    }

    /// With a key, whether that key is dirty; without, whether any is.
    pub fn has_changed(&self, key: Option<&str>) -> bool {
        let dirty = self.dirty.borrow();
        match key {
            Some(key) => dirty.is_marked(key),
            None => dirty.count() > 0,
        }
    }

    /// Copy of the dirty map.
    pub fn get_changed(&self) -> DirtyMap {
        self.dirty.borrow().map().clone()
    }

    pub fn dirty_count(&self) -> usize {
        self.dirty.borrow().count()
    }

    fn run_dirty_check(&self) {
        let current = self.get_changed();
        let overrides = self
            .with_controller(|controller| controller.dirty_check(&current))
            .flatten();
        if let Some(overrides) = overrides {
            trace!(model = self.name(), keys = overrides.len(), "dirty check override");
            self.dirty.borrow_mut().merge(overrides);
        }
    }

    /// Lend the controller to `hook`. Returns `None` without calling `hook`
    /// when the controller is already lent out to an outer hook.
    fn with_controller<R>(&self, hook: impl FnOnce(&mut F::Controller) -> R) -> Option<R> {
        let taken = self.controller.borrow_mut().take();
        let Some(controller) = taken else {
            trace!(model = self.name(), "hooks skipped on re-entrant call");
            return None;
        };
        let mut lease = ControllerLease {
            slot: &self.controller,
            controller: Some(controller),
        };
        lease.controller.as_mut().map(hook)
    }

    fn name(&self) -> &'static str {
        self.display_name.unwrap_or("anonymous")
    }
}

/// Top-level keys whose values differ between `base` and `next`, including
/// keys only one of them has.
fn edited_keys(base: &State, next: &State) -> Vec<String> {
    let mut keys: Vec<String> = base
        .iter()
        .filter(|(key, value)| !next.get(key.as_str()).is_some_and(|n| deep_equal(value, n)))
        .map(|(key, _)| key.clone())
        .collect();
    keys.extend(next.keys().filter(|key| !base.contains_key(key.as_str())).cloned());
    keys
}

/// Copy of `stored` with `keys` taken from `next`; keys `next` lacks are removed.
fn rebase<'a>(stored: &State, next: &State, keys: impl IntoIterator<Item = &'a str>) -> State {
    let mut out = stored.clone();
    for key in keys {
        match next.get(key) {
            Some(value) => {
                out.insert(key.to_string(), value.clone());
            }
            None => {
                out.shift_remove(key);
            }
        }
    }
    out
}

impl<F: StateFactory> fmt::Debug for StateModel<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateModel")
            .field("display_name", &self.display_name)
            .field("strategy", &self.strategy)
            .field("state", &self.state.borrow())
            .field("dirty", &self.dirty.borrow().map())
            .field("batching", &self.is_batching())
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

/// Puts a lent controller back on drop, including on unwind.
struct ControllerLease<'a, C> {
    slot: &'a RefCell<Option<C>>,
    controller: Option<C>,
}

impl<C> Drop for ControllerLease<'_, C> {
    fn drop(&mut self) {
        if let Some(controller) = self.controller.take() {
            *self.slot.borrow_mut() = Some(controller);
        }
    }
}

/// Leaves one batch level on drop, including on unwind.
struct BatchExit<'a>(&'a Cell<usize>);

impl Drop for BatchExit<'_> {
    fn drop(&mut self) {
        self.0.set(self.0.get().saturating_sub(1));
    }
}
