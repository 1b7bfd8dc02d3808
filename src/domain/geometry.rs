use super::options::{AspectRatio, Quality};
use serde::Serialize;
use std::fmt;

/// Pixel size every frame of a segment is scaled and padded to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// `scale` then `pad` filter chain: fit inside the frame without
    /// cropping, then letterbox/pillarbox to the exact size.
    pub fn filter_chain(&self) -> String {
        format!(
            "scale={w}:{h}:force_original_aspect_ratio=decrease,pad={w}:{h}:(ow-iw)/2:(oh-ih)/2",
            w = self.width,
            h = self.height
        )
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Portrait base resolution of a quality tier. Width is the short side.
fn base_resolution(quality: Quality) -> Dimensions {
    match quality {
        Quality::P1080 => Dimensions::new(1080, 1920),
        Quality::P720 => Dimensions::new(720, 1280),
        Quality::P480 => Dimensions::new(480, 854),
    }
}

/// Base table first, then reshape by aspect ratio.
pub fn resolve(quality: Quality, aspect_ratio: AspectRatio) -> Dimensions {
    let base = base_resolution(quality);
    match aspect_ratio {
        AspectRatio::Portrait => base,
        AspectRatio::Landscape => Dimensions::new(base.height, base.width),
        AspectRatio::Square => Dimensions::new(base.width, base.width),
    }
}

pub fn resolve_tags(quality: &str, aspect_ratio: &str) -> Dimensions {
    resolve(Quality::from_tag(quality), AspectRatio::from_tag(aspect_ratio))
}
