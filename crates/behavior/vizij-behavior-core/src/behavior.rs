//! Behavior groups: independent animations and state switchers started and
//! stopped together.

use std::fmt;
use std::rc::Rc;

use futures::future::{try_join_all, FutureExt, LocalBoxFuture};
use serde_json::Value as JsonValue;

use crate::animation::{Animatable, Animation};
use crate::descriptor::BehaviorDescriptor;
use crate::element::VisualElement;
use crate::error::BehaviorError;
use crate::host::Host;
use crate::outcome::{Outcome, UnitFuture};
use crate::registry::AnimationRegistry;
use crate::switcher::StateSwitcher;

/// Joined results of a group-wide start or stop, in member order.
pub type GroupFuture = LocalBoxFuture<'static, Result<Vec<Outcome>, BehaviorError>>;

pub struct BehaviorGroup {
    host: Host,
    registry: Rc<AnimationRegistry>,
    /// Registry namespace every loaded animation registers its frames under.
    registry_name: String,
    members: Vec<Box<dyn Animatable>>,
}

impl BehaviorGroup {
    pub fn new(host: Host, registry: Rc<AnimationRegistry>, registry_name: impl Into<String>) -> Self {
        Self {
            host,
            registry,
            registry_name: registry_name.into(),
            members: Vec::new(),
        }
    }

    pub fn registry(&self) -> &Rc<AnimationRegistry> {
        &self.registry
    }

    pub fn push(&mut self, member: impl Animatable + 'static) {
        self.members.push(Box::new(member));
    }

    /// Load members from typed descriptors. Entries with `states` become
    /// state switchers, the others bare animations.
    pub fn load(
        &mut self,
        container: &dyn VisualElement,
        descriptors: &[BehaviorDescriptor],
    ) -> Result<(), BehaviorError> {
        if self.registry_name.is_empty() {
            log::warn!("Behavior cannot load descriptors, it has no registry name");
            return Ok(());
        }
        for desc in descriptors {
            self.load_descriptor(container, desc)?;
        }
        Ok(())
    }

    /// Load members from a JSON array of descriptors. A missing (`null`)
    /// entry is an error; input that is not an array loads nothing.
    pub fn load_json(
        &mut self,
        container: &dyn VisualElement,
        descriptors: &JsonValue,
    ) -> Result<(), BehaviorError> {
        let Some(entries) = descriptors.as_array() else {
            log::warn!("Behavior cannot load descriptors, they are not an array");
            return Ok(());
        };
        let typed = entries
            .iter()
            .map(|entry| {
                if entry.is_null() {
                    return Err(BehaviorError::descriptor("No descriptor to load"));
                }
                Ok(serde_json::from_value::<BehaviorDescriptor>(entry.clone())?)
            })
            .collect::<Result<Vec<_>, BehaviorError>>()?;
        self.load(container, &typed)
    }

    fn load_descriptor(
        &mut self,
        container: &dyn VisualElement,
        desc: &BehaviorDescriptor,
    ) -> Result<(), BehaviorError> {
        let Some(states) = &desc.states else {
            let animation = self.animation(container, desc)?;
            self.push(animation);
            return Ok(());
        };
        let switcher = StateSwitcher::new(self.host.clone());
        for (state_name, state_desc) in states {
            switcher.add_state(state_name.clone(), self.animation(container, state_desc)?);
        }
        log::debug!(
            "behavior {}: switcher with states {:?}",
            self.registry_name,
            switcher.state_names()
        );
        self.push(switcher);
        Ok(())
    }

    fn animation(
        &self,
        container: &dyn VisualElement,
        desc: &BehaviorDescriptor,
    ) -> Result<Animation, BehaviorError> {
        Animation::from_state_descriptor(
            &self.host,
            &self.registry,
            &self.registry_name,
            container,
            desc,
        )
    }

    /// Switch every member to `state` (bare animations just start). The
    /// returned future waits for all of them and fails with the first error.
    pub fn start(&mut self, state: &str) -> GroupFuture {
        self.prune();
        let pending: Vec<UnitFuture> = self.members.iter().map(|m| m.switch_to(state)).collect();
        try_join_all(pending).boxed_local()
    }

    pub fn stop(&mut self) -> GroupFuture {
        self.prune();
        let pending: Vec<UnitFuture> = self.members.iter().map(|m| m.stop()).collect();
        try_join_all(pending).boxed_local()
    }

    pub fn tear_down(&mut self) {
        for member in &self.members {
            member.tear_down();
        }
        self.members.clear();
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    fn prune(&mut self) {
        self.members.retain(|member| !member.is_torn_down());
    }
}

impl fmt::Debug for BehaviorGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BehaviorGroup")
            .field("registry_name", &self.registry_name)
            .field("members", &self.members.len())
            .finish_non_exhaustive()
    }
}
