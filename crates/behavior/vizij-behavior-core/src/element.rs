//! Visual element contract.
//!
//! Adapters (web/Bevy) implement this for whatever node type they render.
//! The core only hides, shows and feeds images to elements; at descriptor
//! load time it also looks elements up by name and by child path, and reads
//! the frames held by a group element.

use std::rc::Rc;

use crate::frame::{Frame, ImageRef};

pub trait VisualElement {
    /// Stable identifier, used in logs.
    fn id(&self) -> &str;

    fn hide(&self);

    fn show(&self);

    /// Whether the element can display images at all. Controllers bound to
    /// elements that cannot will log and hide instead of loading frames.
    fn accepts_images(&self) -> bool {
        true
    }

    /// Load remote content: display `image`.
    fn on_remote_loaded(&self, image: &ImageRef);

    /// Descendant element addressed by name.
    fn find(&self, _name: &str) -> Option<Rc<dyn VisualElement>> {
        None
    }

    /// Descendant element addressed by child indices, one per level.
    fn child_at_path(&self, path: &[usize]) -> Option<Rc<dyn VisualElement>> {
        let (first, rest) = path.split_first()?;
        let child = self.children().get(*first).cloned()?;
        if rest.is_empty() {
            Some(child)
        } else {
            child.child_at_path(rest)
        }
    }

    fn children(&self) -> Vec<Rc<dyn VisualElement>> {
        Vec::new()
    }

    /// The frame this element renders, if it is an image-like leaf.
    fn frame(&self) -> Option<Frame> {
        None
    }
}
