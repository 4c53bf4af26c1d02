//! Declarative behavior descriptors.
//!
//! ```json
//! { "name": "blink", "el": "eyes", "path": [0, 2], "duration": 400,
//!   "repeat": {"count": 3, "delay": [500, 1500]}, "stop": "soft",
//!   "endBehavior": {"switchTo": "idle"} }
//! ```
//!
//! An entry with a `states` map describes a state switcher; each state is
//! itself an animation descriptor. Required fields are checked when the
//! descriptor is turned into an animation, so partially filled descriptors
//! still deserialize.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::outcome::EndBehavior;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorDescriptor {
    /// Animation id inside the behavior's registry namespace.
    pub name: Option<String>,
    /// Name of the element that displays the frames.
    pub el: Option<String>,
    /// Child path of the group whose children render the frames.
    pub path: Option<Vec<usize>>,
    /// Cycle duration in milliseconds.
    pub duration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repeat: Option<JsonValue>,
    /// `"soft"` makes stops wait for the end of the current cycle.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<String>,
    #[serde(rename = "endBehavior")]
    pub end_behavior: EndBehavior,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub states: Option<IndexMap<String, BehaviorDescriptor>>,
}

impl BehaviorDescriptor {
    pub fn is_switcher(&self) -> bool {
        self.states.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn states_keep_declaration_order() {
        let desc: BehaviorDescriptor = serde_json::from_str(
            r#"{"states": {
                "walk": {"name": "walk", "el": "s", "path": [0], "duration": 100},
                "idle": {"name": "idle", "el": "s", "path": [1], "duration": 100,
                         "endBehavior": true}
            }}"#,
        )
        .unwrap();
        assert!(desc.is_switcher());
        let states = desc.states.unwrap();
        assert_eq!(states.keys().collect::<Vec<_>>(), ["walk", "idle"]);
        assert_eq!(states["idle"].end_behavior, EndBehavior::Hide);
        assert_eq!(states["walk"].end_behavior, EndBehavior::None);
    }
}
