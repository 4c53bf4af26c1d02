//! vizij-behavior-core: sprite animation jobs, state switching and behaviors.
//!
//! Engine-agnostic. Hosts provide an executor, a timer and a frame stepper
//! factory through [`Host`] (or use the bundled [`FrameClock`]), implement
//! [`VisualElement`] for their nodes, and load [`BehaviorGroup`]s from
//! declarative descriptors.

pub mod animation;
pub mod behavior;
pub mod clock;
pub mod config;
pub mod controller;
pub mod descriptor;
pub mod element;
pub mod error;
pub mod frame;
pub mod host;
pub mod ids;
mod job;
pub mod outcome;
pub mod registry;
pub mod repetition;
pub mod switcher;

pub use animation::{Animatable, Animation};
pub use behavior::{BehaviorGroup, GroupFuture};
pub use clock::FrameClock;
pub use config::Config;
pub use controller::AnimatableController;
pub use descriptor::BehaviorDescriptor;
pub use element::VisualElement;
pub use error::BehaviorError;
pub use frame::{Frame, ImageRef, Sprite, SpriteRect};
pub use host::{
    FrameStepper, Host, StepTarget, StepperFactory, StepperSpec, Timer, INDEX_PROPERTY,
};
pub use ids::ControllerId;
pub use outcome::{EndBehavior, Outcome, OutcomeFuture, UnitFuture};
pub use registry::{AnimationFrames, AnimationRegistry, Resolution};
pub use repetition::{Count, Delay, RepetitionPolicy};
pub use switcher::StateSwitcher;
