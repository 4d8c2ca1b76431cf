//! Camera Effect Trait
//!
//! The hook surface a host engine drives for every effect attached to a
//! camera. One frame of a camera calls, in order:
//!
//! ```text
//! on_pre_cull ──► (host culls + draws opaque) ──► on_render_image ──► on_post_render
//! ```
//!
//! `on_enable` / `on_disable` bracket the effect's active lifetime and may
//! arrive between any two frame hooks.

use crate::errors::Result;
use crate::host::{RenderHost, RenderImage};
use crate::pipeline::stage::RenderStage;

/// An effect attached to a camera.
///
/// Hooks receive the host as a trait object so stacks can hold heterogeneous
/// effects.
pub trait CameraEffect {
    /// Returns the effect name, used for logging.
    fn name(&self) -> &str;

    /// Stage at which `on_render_image` runs.
    fn stage(&self) -> RenderStage {
        RenderStage::PostProcess
    }

    fn on_enable(&mut self, _host: &mut dyn RenderHost) {}

    fn on_disable(&mut self, _host: &mut dyn RenderHost) {}

    /// Before the camera culls the scene.
    fn on_pre_cull(&mut self, _host: &mut dyn RenderHost) {}

    /// Reads `source`, writes `destination`. Every implementation must write
    /// the destination, at minimum by copying the source.
    fn on_render_image(
        &mut self,
        host: &mut dyn RenderHost,
        source: RenderImage,
        destination: RenderImage,
    ) -> Result<()>;

    /// After the camera finished rendering, including image effects.
    fn on_post_render(&mut self, _host: &mut dyn RenderHost) {}
}
