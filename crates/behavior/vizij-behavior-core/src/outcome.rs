//! Results of animatable units and end-of-animation policies.

use futures::future::LocalBoxFuture;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::BehaviorError;

/// Future returned by controller starts and stops.
pub type OutcomeFuture = LocalBoxFuture<'static, Outcome>;

/// Future returned by every animatable unit.
pub type UnitFuture = LocalBoxFuture<'static, Result<Outcome, BehaviorError>>;

/// What a unit's future resolves to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Plain completion flag: `true` when the run finished or a stop was
    /// honored, `false` when the run was cancelled or superseded.
    Done(bool),
    /// A finished animation asking its switcher to move on to `state`.
    SwitchTo { state: String, result: bool },
}

impl Outcome {
    /// The completion flag, with any chained request stripped.
    pub fn result(&self) -> bool {
        match self {
            Outcome::Done(result) | Outcome::SwitchTo { result, .. } => *result,
        }
    }

    pub fn chained_state(&self) -> Option<&str> {
        match self {
            Outcome::SwitchTo { state, .. } => Some(state),
            Outcome::Done(_) => None,
        }
    }
}

impl From<bool> for Outcome {
    fn from(result: bool) -> Self {
        Outcome::Done(result)
    }
}

/// Applied by a controller whenever a start or stop settles.
///
/// JSON: absent or `false` → `None`, `true` → `Hide`,
/// `{"hide"?: bool, "switchTo"?: name}` → `Custom`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum EndBehavior {
    #[default]
    None,
    Hide,
    Custom {
        hide: bool,
        switch_to: Option<String>,
    },
}

impl EndBehavior {
    pub fn hides(&self) -> bool {
        match self {
            EndBehavior::None => false,
            EndBehavior::Hide => true,
            EndBehavior::Custom { hide, .. } => *hide,
        }
    }

    pub fn switch_to(&self) -> Option<&str> {
        match self {
            EndBehavior::Custom { switch_to, .. } => switch_to.as_deref(),
            _ => None,
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum EndBehaviorRepr {
    Flag(bool),
    Custom {
        #[serde(default)]
        hide: bool,
        #[serde(default, rename = "switchTo", skip_serializing_if = "Option::is_none")]
        switch_to: Option<String>,
    },
}

impl<'de> Deserialize<'de> for EndBehavior {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Option::<EndBehaviorRepr>::deserialize(deserializer)? {
            None | Some(EndBehaviorRepr::Flag(false)) => EndBehavior::None,
            Some(EndBehaviorRepr::Flag(true)) => EndBehavior::Hide,
            Some(EndBehaviorRepr::Custom { hide, switch_to }) => {
                EndBehavior::Custom { hide, switch_to }
            }
        })
    }
}

impl Serialize for EndBehavior {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let repr = match self {
            EndBehavior::None => EndBehaviorRepr::Flag(false),
            EndBehavior::Hide => EndBehaviorRepr::Flag(true),
            EndBehavior::Custom { hide, switch_to } => EndBehaviorRepr::Custom {
                hide: *hide,
                switch_to: switch_to.clone(),
            },
        };
        repr.serialize(serializer)
    }
}
