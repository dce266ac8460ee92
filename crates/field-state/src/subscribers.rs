//! Ordered observer list.

use std::fmt;
use std::rc::Rc;

use crate::State;

/// A registered observer.
///
/// Subscribers are compared by handle identity: clones of one `Subscriber`
/// are the same observer, while two handles built from identical closures
/// are distinct.
#[derive(Clone)]
pub struct Subscriber(Rc<dyn Fn(&State)>);

impl Subscriber {
    pub fn new(callback: impl Fn(&State) + 'static) -> Self {
        Self(Rc::new(callback))
    }

    pub fn call(&self, payload: &State) {
        (self.0)(payload)
    }
}

impl PartialEq for Subscriber {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Subscriber {}

impl fmt::Debug for Subscriber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Subscriber")
            .field(&Rc::as_ptr(&self.0).cast::<()>())
            .finish()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Subscribers {
    list: Vec<Subscriber>,
}

impl Subscribers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `subscriber` unless it is already registered.
    pub fn add(&mut self, subscriber: &Subscriber) -> bool {
        if self.list.contains(subscriber) {
            return false;
        }
        self.list.push(subscriber.clone());
        true
    }

    /// Remove every entry equal to `subscriber`; returns how many were removed.
    pub fn remove(&mut self, subscriber: &Subscriber) -> usize {
        let before = self.list.len();
        self.list.retain(|s| s != subscriber);
        before - self.list.len()
    }

    pub fn clear(&mut self) {
        self.list.clear();
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// Handles in registration order, detached from the list so callers can
    /// invoke them while the list itself changes.
    pub fn snapshot(&self) -> Vec<Subscriber> {
        self.list.clone()
    }
}
