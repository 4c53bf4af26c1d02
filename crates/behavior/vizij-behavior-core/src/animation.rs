//! Named animations and the capability every behavior member implements.

use std::rc::Rc;
use std::time::Duration;

use futures::future::{self, FutureExt};

use crate::controller::AnimatableController;
use crate::descriptor::BehaviorDescriptor;
use crate::element::VisualElement;
use crate::error::BehaviorError;
use crate::host::Host;
use crate::outcome::{Outcome, UnitFuture};
use crate::registry::AnimationRegistry;

/// Start/stop capability shared by bare animations and state switchers.
pub trait Animatable {
    fn start(&self) -> UnitFuture;

    fn stop(&self) -> UnitFuture;

    /// Like [`Animatable::stop`]; switchers use it on the state they leave.
    fn interrupt(&self) -> UnitFuture;

    fn switch_to(&self, state: &str) -> UnitFuture;

    fn is_working(&self) -> bool;

    fn tear_down(&self);

    fn is_torn_down(&self) -> bool;
}

/// An [`AnimatableController`] bound to one registry animation.
#[derive(Clone, Debug)]
pub struct Animation {
    controller: AnimatableController,
    registry_name: String,
    name: String,
    soft_stop: bool,
}

impl Animation {
    pub fn new(
        controller: AnimatableController,
        registry_name: impl Into<String>,
        name: impl Into<String>,
        soft_stop: bool,
    ) -> Self {
        Self {
            controller,
            registry_name: registry_name.into(),
            name: name.into(),
            soft_stop,
        }
    }

    /// Build an animation from a state descriptor: the frames rendered by the
    /// group at `path` are registered as `registry_name/name`, and playback
    /// happens on the element named `el`.
    pub fn from_state_descriptor(
        host: &Host,
        registry: &Rc<AnimationRegistry>,
        registry_name: &str,
        container: &dyn VisualElement,
        desc: &BehaviorDescriptor,
    ) -> Result<Self, BehaviorError> {
        let name = desc
            .name
            .as_deref()
            .filter(|name| !name.is_empty())
            .ok_or_else(|| BehaviorError::descriptor("No descriptor name"))?;
        let el = desc
            .el
            .as_deref()
            .filter(|el| !el.is_empty())
            .ok_or_else(|| BehaviorError::descriptor(format!("No descriptor el for {name}")))?;
        let path = desc
            .path
            .as_deref()
            .ok_or_else(|| BehaviorError::descriptor(format!("No descriptor path for {name}")))?;
        let duration = desc
            .duration
            .filter(|ms| ms.is_finite() && *ms > 0.0)
            .ok_or_else(|| {
                BehaviorError::descriptor(format!("No descriptor duration for {name}"))
            })?;
        let duration = Duration::try_from_secs_f64(duration / 1000.0).map_err(|_| {
            BehaviorError::descriptor(format!("Invalid descriptor duration for {name}"))
        })?;

        let element = container.find(el).ok_or_else(|| {
            BehaviorError::descriptor(format!("Element {el} not found in {}", container.id()))
        })?;
        let group = container.child_at_path(path).ok_or_else(|| {
            BehaviorError::descriptor(format!("No child at path {path:?} in {}", container.id()))
        })?;
        registry.store_from_group(registry_name, name, group.as_ref());

        let controller = AnimatableController::new(host.clone(), Some(element), registry.clone());
        controller.set_repetition(desc.repeat.as_ref())?;
        controller.set_duration(Some(duration));
        controller.set_end_behavior(desc.end_behavior.clone());
        let soft_stop = desc.stop.as_deref() == Some("soft");
        Ok(Self::new(controller, registry_name, name, soft_stop))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn registry_name(&self) -> &str {
        &self.registry_name
    }

    pub fn soft_stop(&self) -> bool {
        self.soft_stop
    }

    pub fn controller(&self) -> &AnimatableController {
        &self.controller
    }
}

impl Animatable for Animation {
    /// Already running animations report success without restarting.
    fn start(&self) -> UnitFuture {
        if self.controller.is_working() {
            return future::ready(Ok(Outcome::Done(true))).boxed_local();
        }
        match self.controller.start(&self.registry_name, &self.name) {
            Ok(run) => run.map(Ok).boxed_local(),
            Err(err) => future::ready(Err(err)).boxed_local(),
        }
    }

    fn stop(&self) -> UnitFuture {
        self.controller.stop(self.soft_stop).map(Ok).boxed_local()
    }

    fn interrupt(&self) -> UnitFuture {
        self.controller.interrupt(self.soft_stop).map(Ok).boxed_local()
    }

    fn switch_to(&self, _state: &str) -> UnitFuture {
        self.start()
    }

    fn is_working(&self) -> bool {
        self.controller.is_working()
    }

    fn tear_down(&self) {
        self.controller.tear_down();
    }

    fn is_torn_down(&self) -> bool {
        self.controller.is_torn_down()
    }
}
