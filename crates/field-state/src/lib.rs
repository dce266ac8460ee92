//! field-state - reactive state models for form fields.
//!
//! A [`StateModel`] holds one field's state as a JSON object, applies writes
//! through a [`Draft`], records which top-level keys changed, and notifies
//! [`Subscriber`]s once per write or once per [`batch`](StateModel::batch).
//! Field types plug in through [`StateFactory`] and the optional
//! [`StateController`] hooks.
//!
//! # Example
//!
//! ```
//! use field_state::{Capabilities, Init, Props, State, StateFactory, StateModel};
//! use serde_json::json;
//!
//! struct Counter;
//!
//! impl StateFactory for Counter {
//!     type Controller = ();
//!
//!     fn default_state() -> State {
//!         json!({"a": 1, "b": 2}).as_object().cloned().unwrap_or_default()
//!     }
//!
//!     fn create(_state: &State, _props: &Props) -> Init<()> {
//!         Init::new(())
//!     }
//! }
//!
//! let model = StateModel::<Counter>::with_capabilities(Props::new(), Capabilities::default());
//! model.set_state(|s| {
//!     s.set("a", 5);
//! });
//! assert_eq!(model.get_state()["a"], json!(5));
//! assert!(model.has_changed(Some("a")));
//! assert!(!model.has_changed(Some("b")));
//! ```

use std::collections::BTreeMap;

pub mod capability;
pub mod draft;
pub mod error;
pub mod factory;
pub mod model;
pub mod patch;
pub mod props;
pub mod subscribers;

pub use capability::{Capabilities, Strategy, DRAFTS_ENV};
pub use draft::Draft;
pub use error::{DraftError, PropsError};
pub use factory::{Init, StateController, StateFactory};
pub use model::{StateModel, DISPLAY_NAME_KEY};
pub use patch::{Patch, PatchOp};
pub use props::{props_from_json, ModelOptions, Props, USE_DIRTY_KEY};
pub use subscribers::{Subscriber, Subscribers};

pub use field_path::FieldPath;

/// A model's state: field name to value.
pub type State = serde_json::Map<String, serde_json::Value>;

/// Top-level keys marked changed by the latest write.
pub type DirtyMap = BTreeMap<String, bool>;
