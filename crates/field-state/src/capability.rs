//! Draft support and write strategy selection.

use crate::props::ModelOptions;

/// Environment variable consulted by [`Capabilities::probe`].
pub const DRAFTS_ENV: &str = "FIELD_STATE_DRAFTS";

/// What the host allows the engine to use.
///
/// Passed to each model at construction; nothing here is global.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    drafts: bool,
}

impl Capabilities {
    pub fn new(drafts: bool) -> Self {
        Self { drafts }
    }

    pub fn without_drafts() -> Self {
        Self::new(false)
    }

    /// Read [`DRAFTS_ENV`]. `0`, `false`, `off` and `no` disable drafts;
    /// anything else, including an unset variable, enables them.
    pub fn probe() -> Self {
        let drafts = match std::env::var(DRAFTS_ENV) {
            Ok(raw) => !matches!(
                raw.trim().to_ascii_lowercase().as_str(),
                "0" | "false" | "off" | "no"
            ),
            Err(_) => true,
        };
        Self { drafts }
    }

    pub fn drafts(&self) -> bool {
        self.drafts
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self { drafts: true }
    }
}

/// How a model detects changes on write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Copy the state, mutate the copy, then compare every stored key.
    Manual,
    /// Copy-on-write draft over the stored state; changes come from patches.
    Draft,
}

impl Strategy {
    /// `useDirty` forces [`Strategy::Manual`] even when drafts are available.
    pub fn select(capabilities: Capabilities, options: &ModelOptions) -> Self {
        if capabilities.drafts() && !options.use_dirty {
            Strategy::Draft
        } else {
            Strategy::Manual
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drafts_enabled_by_default() {
        assert!(Capabilities::default().drafts());
        assert!(!Capabilities::without_drafts().drafts());
    }

    #[test]
    fn select_prefers_drafts_unless_overridden() {
        let plain = ModelOptions::default();
        let forced = ModelOptions { use_dirty: true };
        assert_eq!(Strategy::select(Capabilities::default(), &plain), Strategy::Draft);
        assert_eq!(Strategy::select(Capabilities::default(), &forced), Strategy::Manual);
        assert_eq!(
            Strategy::select(Capabilities::without_drafts(), &plain),
            Strategy::Manual
        );
    }
}
