//! Animation registry: image id (namespace) -> animation id -> frames.
//!
//! Hosts that already keep sprite data elsewhere can fill the registry with
//! [`AnimationRegistry::insert`]; behavior loading fills it from rendered
//! groups through [`AnimationRegistry::store_from_group`].

use std::cell::RefCell;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::element::VisualElement;
use crate::error::BehaviorError;
use crate::frame::Frame;

/// Frames of one animation. Entries may be missing (`null` in JSON); such a
/// list never reaches a frame stepper.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AnimationFrames {
    pub frames: Vec<Option<Frame>>,
}

/// Result of looking an animation up.
#[derive(Clone, Debug, PartialEq)]
pub enum Resolution {
    UnknownImage,
    UnknownAnimation,
    Frames(Vec<Option<Frame>>),
}

type Namespace = HashMap<String, AnimationFrames>;

#[derive(Debug, Default)]
pub struct AnimationRegistry {
    images: RefCell<HashMap<String, Namespace>>,
}

impl AnimationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from `{ "<image_id>": { "<animation_id>": { "frames": [...] } } }`.
    ///
    /// Every namespace must be a mapping of animations; anything else cannot
    /// resolve animations and is rejected.
    pub fn from_json(doc: &JsonValue) -> Result<Self, BehaviorError> {
        let Some(namespaces) = doc.as_object() else {
            return Err(BehaviorError::InvalidRegistry {
                name: "<root>".into(),
            });
        };
        let registry = Self::new();
        for (image_id, animations) in namespaces {
            let Some(animations) = animations.as_object() else {
                return Err(BehaviorError::InvalidRegistry {
                    name: image_id.clone(),
                });
            };
            for (animation_id, entry) in animations {
                let frames: AnimationFrames =
                    serde_json::from_value(entry.clone()).map_err(|_| {
                        BehaviorError::InvalidRegistry {
                            name: format!("{image_id}/{animation_id}"),
                        }
                    })?;
                registry.insert(image_id, animation_id, frames.frames);
            }
        }
        Ok(registry)
    }

    /// Insert or replace the frames of `image_id/animation_id`.
    pub fn insert(&self, image_id: &str, animation_id: &str, frames: Vec<Option<Frame>>) {
        self.images
            .borrow_mut()
            .entry(image_id.to_string())
            .or_default()
            .insert(animation_id.to_string(), AnimationFrames { frames });
    }

    /// Register the frames rendered by `group`'s children under `namespace/name`.
    pub fn store_from_group(&self, namespace: &str, name: &str, group: &dyn VisualElement) {
        let frames: Vec<Option<Frame>> = group.children().iter().map(|c| c.frame()).collect();
        log::debug!(
            "registry: storing {} frames from '{}' as {namespace}/{name}",
            frames.len(),
            group.id()
        );
        self.insert(namespace, name, frames);
    }

    pub fn resolve(&self, image_id: &str, animation_id: &str) -> Resolution {
        let images = self.images.borrow();
        let Some(namespace) = images.get(image_id) else {
            return Resolution::UnknownImage;
        };
        match namespace.get(animation_id) {
            Some(entry) => Resolution::Frames(entry.frames.clone()),
            None => Resolution::UnknownAnimation,
        }
    }

    pub fn contains_image(&self, image_id: &str) -> bool {
        self.images.borrow().contains_key(image_id)
    }

    pub fn animation_names(&self, image_id: &str) -> Vec<String> {
        let mut names: Vec<String> = self
            .images
            .borrow()
            .get(image_id)
            .map(|ns| ns.keys().cloned().collect())
            .unwrap_or_default();
        names.sort();
        names
    }
}
