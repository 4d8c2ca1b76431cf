//! Render Stage Definitions
//!
//! `RenderStage` defines where in a camera's frame an image effect runs.
//! Image effects of the same stage execute in insertion order.

/// Render stage enumeration.
///
/// | Stage | Purpose | Typical Content |
/// |-------|---------|------------------|
/// | `Opaque` | Opaque object rendering | Forward / Deferred rendering |
/// | `Skybox` | Skybox rendering | Environment maps, procedural sky |
/// | `BeforeTransparent` | Opaque-stage image effects | Screen-space ray marching, SSSSS |
/// | `Transparent` | Translucent object rendering | Alpha-blended objects |
/// | `PostProcess` | Final post-processing | ToneMapping, Bloom, FXAA |
///
/// Only `BeforeTransparent` and `PostProcess` host image effects; the other
/// stages exist so hosts can order their own work around them.
#[derive(Debug, Hash, PartialEq, Eq, Clone, Copy, PartialOrd, Ord, Default)]
#[repr(u8)]
pub enum RenderStage {
    Opaque = 0,
    Skybox = 1,
    /// Runs on the post-opaque colour buffer, before transparency and any
    /// final post-processing.
    BeforeTransparent = 2,
    Transparent = 3,
    #[default]
    PostProcess = 4,
}

impl RenderStage {
    /// Returns the numeric index of the stage (used for sorting).
    #[inline]
    #[must_use]
    pub const fn order(self) -> u8 {
        self as u8
    }

    /// Whether image effects in this stage see opaque geometry only.
    #[inline]
    #[must_use]
    pub const fn is_opaque_stage(self) -> bool {
        matches!(self, Self::BeforeTransparent)
    }

    /// Stage name (for debugging).
    #[inline]
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Opaque => "Opaque",
            Self::Skybox => "Skybox",
            Self::BeforeTransparent => "BeforeTransparent",
            Self::Transparent => "Transparent",
            Self::PostProcess => "PostProcess",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_ordering() {
        assert!(RenderStage::Opaque < RenderStage::Skybox);
        assert!(RenderStage::Skybox < RenderStage::BeforeTransparent);
        assert!(RenderStage::BeforeTransparent < RenderStage::Transparent);
        assert!(RenderStage::Transparent < RenderStage::PostProcess);
    }

    #[test]
    fn only_before_transparent_is_opaque_stage() {
        assert!(RenderStage::BeforeTransparent.is_opaque_stage());
        assert!(!RenderStage::PostProcess.is_opaque_stage());
    }
}
