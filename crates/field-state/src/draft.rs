//! Copy-on-write working copy of model state.
//!
//! A [`Draft`] shares the stored state until the first write, then clones it
//! once. Every key that is assigned, removed or lent out mutably is tracked,
//! and on commit the draft compares those keys against the base to produce
//! the [`Patch`] log the draft strategy derives dirty keys from.

use std::rc::Rc;

use field_path::{is_valid_index, FieldPath};
use serde_json::Value;

use crate::error::DraftError;
use crate::patch::{diff_into, Patch, PatchOp};
use crate::State;

#[derive(Debug, Clone)]
pub struct Draft {
    base: Rc<State>,
    working: Option<State>,
    touched: Vec<String>,
    assigned: Vec<String>,
}

/// Result of committing a draft.
#[derive(Debug)]
pub(crate) struct Commit {
    pub state: Rc<State>,
    pub patches: Vec<Patch>,
}

impl Draft {
    pub(crate) fn new(base: Rc<State>) -> Self {
        Self {
            base,
            working: None,
            touched: Vec::new(),
            assigned: Vec::new(),
        }
    }

    pub(crate) fn detached(state: State) -> Self {
        Self::new(Rc::new(state))
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.current().get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.current().contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.current().keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.current().len()
    }

    pub fn is_empty(&self) -> bool {
        self.current().is_empty()
    }

    /// Assign a top-level key, returning the previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let key = key.into();
        self.touch(&key);
        if !self.assigned.contains(&key) {
            self.assigned.push(key.clone());
        }
        self.working_mut().insert(key, value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        if !self.contains_key(key) {
            return None;
        }
        self.touch(key);
        self.assigned.retain(|k| k != key);
        self.working_mut().shift_remove(key)
    }

    /// Mutable access to a top-level value. Nested edits made through the
    /// returned reference are picked up when the draft is committed.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        if !self.contains_key(key) {
            return None;
        }
        self.touch(key);
        self.working_mut().get_mut(key)
    }

    /// Run `f` on the value under `key`; returns whether the key existed.
    pub fn update(&mut self, key: &str, f: impl FnOnce(&mut Value)) -> bool {
        match self.get_mut(key) {
            Some(value) => {
                f(value);
                true
            }
            None => false,
        }
    }

    pub fn get_in(&self, path: &FieldPath) -> Option<&Value> {
        let (head, rest) = path.segments().split_first()?;
        field_path::get(self.get(head)?, rest)
    }

    /// Write `value` at a nested path. The parent of the last segment must
    /// exist; arrays accept an existing index, `len` or `-` to append.
    pub fn set_in(
        &mut self,
        path: &FieldPath,
        value: impl Into<Value>,
    ) -> Result<Option<Value>, DraftError> {
        let (head, rest) = path.segments().split_first().ok_or(DraftError::EmptyPath)?;
        let Some((leaf, middle)) = rest.split_last() else {
            return Ok(self.set(head.clone(), value));
        };
        let value = value.into();
        let parent = self
            .get_mut(head)
            .and_then(|top| field_path::get_mut(top, middle))
            .ok_or_else(|| DraftError::PathNotFound(path.entire()))?;
        match parent {
            Value::Object(map) => Ok(map.insert(leaf.clone(), value)),
            Value::Array(arr) => {
                if leaf == "-" {
                    arr.push(value);
                    return Ok(None);
                }
                let idx = parse_index(leaf).ok_or_else(|| DraftError::InvalidIndex(path.entire()))?;
                if idx < arr.len() {
                    Ok(Some(std::mem::replace(&mut arr[idx], value)))
                } else if idx == arr.len() {
                    arr.push(value);
                    Ok(None)
                } else {
                    Err(DraftError::InvalidIndex(path.entire()))
                }
            }
            _ => Err(DraftError::NotAContainer(path.entire())),
        }
    }

    /// Remove the value at a nested path. Missing leaves are not an error.
    pub fn remove_in(&mut self, path: &FieldPath) -> Result<Option<Value>, DraftError> {
        let (head, rest) = path.segments().split_first().ok_or(DraftError::EmptyPath)?;
        let Some((leaf, middle)) = rest.split_last() else {
            return Ok(self.remove(head));
        };
        let parent = self
            .get_mut(head)
            .and_then(|top| field_path::get_mut(top, middle))
            .ok_or_else(|| DraftError::PathNotFound(path.entire()))?;
        match parent {
            Value::Object(map) => Ok(map.shift_remove(leaf)),
            Value::Array(arr) => {
                let idx = parse_index(leaf).ok_or_else(|| DraftError::InvalidIndex(path.entire()))?;
                Ok((idx < arr.len()).then(|| arr.remove(idx)))
            }
            _ => Err(DraftError::NotAContainer(path.entire())),
        }
    }

    /// Copy of the draft as it currently stands.
    pub fn to_state(&self) -> State {
        self.current().clone()
    }

    /// Patches that committing the draft right now would record.
    pub fn pending_patches(&self) -> Vec<Patch> {
        let Some(working) = &self.working else {
            return Vec::new();
        };
        let mut out = Vec::new();
        for key in &self.touched {
            match (self.base.get(key), working.get(key)) {
                (None, None) => {}
                (None, Some(value)) => out.push(Patch {
                    op: PatchOp::Add,
                    path: vec![key.clone()],
                    value: Some(value.clone()),
                }),
                (Some(_), None) => out.push(Patch {
                    op: PatchOp::Remove,
                    path: vec![key.clone()],
                    value: None,
                }),
                (Some(_), Some(value)) if self.assigned.contains(key) => out.push(Patch {
                    op: PatchOp::Replace,
                    path: vec![key.clone()],
                    value: Some(value.clone()),
                }),
                (Some(old), Some(new)) => diff_into(&mut out, &mut vec![key.clone()], old, new),
            }
        }
        out
    }

    pub(crate) fn finish(self) -> Commit {
        let patches = self.pending_patches();
        let state = match self.working {
            Some(working) if !patches.is_empty() => Rc::new(working),
            _ => self.base,
        };
        Commit { state, patches }
    }

    pub(crate) fn into_state(self) -> State {
        match self.working {
            Some(working) => working,
            None => Rc::try_unwrap(self.base).unwrap_or_else(|shared| (*shared).clone()),
        }
    }

    fn current(&self) -> &State {
        self.working.as_ref().unwrap_or(&self.base)
    }

    fn working_mut(&mut self) -> &mut State {
        let base = &self.base;
        self.working.get_or_insert_with(|| State::clone(base))
    }

    fn touch(&mut self, key: &str) {
        if !self.touched.iter().any(|k| k == key) {
            self.touched.push(key.to_string());
        }
    }
}

fn parse_index(segment: &str) -> Option<usize> {
    if !is_valid_index(segment) {
        return None;
    }
    segment.parse().ok()
}
