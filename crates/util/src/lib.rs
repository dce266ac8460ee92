//! field-state-util - JSON helpers shared by the field-state engine.
//!
//! State and props are plain `serde_json` objects; these helpers give them
//! the comparison and merge semantics form fields expect.

pub mod json_equal;
pub mod merge;

pub use json_equal::{deep_equal, deep_equal_map};
pub use merge::{assign, shallow_merge};
