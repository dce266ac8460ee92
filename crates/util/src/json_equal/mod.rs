//! Structural equality for state values.
//!
//! Dirty tracking compares top-level state values with these functions
//! rather than `PartialEq`, which treats `1` and `1.0` as different.

mod deep_equal;

pub use deep_equal::{deep_equal, deep_equal_map};
