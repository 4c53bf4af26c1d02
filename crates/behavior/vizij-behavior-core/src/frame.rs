//! Frames handed to visual elements.
//!
//! A frame is either a raw image reference or a sprite-wrapped frame (an
//! image plus the rectangle of the frame inside it). JSON accepts both
//! `"img/walk_0.png"` and `{"sprite": {"image": "img/walk.png", "rect": {...}}}`.

use serde::{Deserialize, Serialize};

/// Opaque image reference understood by the host (URL, asset key, ...).
pub type ImageRef = String;

/// Pixel rectangle of a frame inside a sprite sheet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpriteRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sprite {
    pub image: ImageRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rect: Option<SpriteRect>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Frame {
    Image(ImageRef),
    Sprite { sprite: Sprite },
}

impl Frame {
    pub fn image(image: impl Into<ImageRef>) -> Self {
        Frame::Image(image.into())
    }

    pub fn sprite(image: impl Into<ImageRef>, rect: Option<SpriteRect>) -> Self {
        Frame::Sprite {
            sprite: Sprite {
                image: image.into(),
                rect,
            },
        }
    }

    /// What the element's load hook receives: the raw image, or the sprite's
    /// underlying image.
    pub fn content(&self) -> &ImageRef {
        match self {
            Frame::Image(image) => image,
            Frame::Sprite { sprite } => &sprite.image,
        }
    }
}
