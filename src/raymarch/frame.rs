//! Per-frame state of the ray marching effect.
//!
//! ```text
//! Idle ──pre_cull──► DepthAcquired ──back faces──► BackFaceRendered
//!                          │                              │
//!                          └──────────render_image────────┴──► Composited
//!                                                                  │
//!            Idle ◄── (next pre_cull) ── Released ◄──post_render───┘
//! ```
//!
//! `on_disable` may cut in anywhere after `DepthAcquired`; it jumps straight to
//! `Released` so the frame's target is never leaked.

use crate::host::TargetHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FramePhase {
    #[default]
    Idle,
    /// A transient target was requested (the request may have failed).
    DepthAcquired,
    BackFaceRendered,
    Composited,
    Released,
}

impl FramePhase {
    /// Whether a frame is in flight (between pre-cull and release).
    #[inline]
    #[must_use]
    pub const fn in_frame(self) -> bool {
        matches!(
            self,
            Self::DepthAcquired | Self::BackFaceRendered | Self::Composited
        )
    }
}

/// How the image-effect hook produced its destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositeOutcome {
    /// The ray marching material ran (pass 0).
    RayMarched,
    /// No material available; source copied unchanged.
    PassThrough,
}

/// Number of material slots written by one bind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BindSummary {
    pub matrices: u8,
    pub scalars: u8,
    pub textures: u8,
}

/// What a single frame did. Kept for diagnostics and tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameReport {
    pub frame_index: u64,
    /// Target acquired this frame, if the pool provided one.
    pub depth_target: Option<TargetHandle>,
    pub back_face_rendered: bool,
    pub bound: Option<BindSummary>,
    pub composite: Option<CompositeOutcome>,
    /// Whether this frame's target was returned to the pool.
    pub released: bool,
}

impl FrameReport {
    #[must_use]
    pub fn new(frame_index: u64) -> Self {
        Self {
            frame_index,
            ..Self::default()
        }
    }
}
