//! Model props: merged configuration handed to factories.

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use tracing::warn;

use crate::error::PropsError;

/// Merged model configuration (factory defaults overlaid by caller props).
pub type Props = Map<String, Value>;

/// Prop that forces [`Strategy::Manual`](crate::Strategy::Manual).
pub const USE_DIRTY_KEY: &str = "useDirty";

/// The props the engine itself interprets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModelOptions {
    /// Force manual field diffing even when drafts are available.
    #[serde(deserialize_with = "truthy")]
    pub use_dirty: bool,
}

/// Loose flag reading: `null`, `0`, and empty, `"0"`, `"false"`, `"off"` or
/// `"no"` strings are false; other strings, non-zero numbers, arrays and
/// objects are true.
fn truthy<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(match &value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(raw) => !matches!(
            raw.trim().to_ascii_lowercase().as_str(),
            "" | "0" | "false" | "off" | "no"
        ),
        Value::Array(_) | Value::Object(_) => true,
    })
}

impl ModelOptions {
    /// Extract engine options from merged props.
    ///
    /// Only the engine's own keys are read, and flags accept loose truthy
    /// values. Factories own the shape of the rest of their props.
    pub fn from_props(props: &Props) -> Self {
        let mut engine = Map::new();
        if let Some(value) = props.get(USE_DIRTY_KEY) {
            engine.insert(USE_DIRTY_KEY.to_string(), value.clone());
        }
        match serde_json::from_value::<ModelOptions>(Value::Object(engine)) {
            Ok(options) => options,
            Err(err) => {
                warn!(key = USE_DIRTY_KEY, error = %err, "ignoring malformed engine option");
                ModelOptions::default()
            }
        }
    }
}

/// Parse props from JSON text. The document must be an object.
pub fn props_from_json(text: &str) -> Result<Props, PropsError> {
    match serde_json::from_str::<Value>(text)? {
        Value::Object(map) => Ok(map),
        _ => Err(PropsError::NotAnObject),
    }
}
