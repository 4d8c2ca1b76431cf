//! Host Engine Interface
//!
//! The orchestration never talks to a GPU directly. Everything it needs from
//! the surrounding engine goes through four small traits:
//!
//! | Trait | Responsibility |
//! |-------|----------------|
//! | [`TargetPool`] | Transient render targets (get / release) |
//! | [`ShaderLibrary`] | Shader lookup by name, backend support query |
//! | [`CameraBackend`] | Camera storage, hidden camera spawn/destroy, explicit render |
//! | [`Blitter`] | Full-screen draws and intermediate images |
//!
//! [`RenderHost`] is implemented for every type implementing all four, so
//! effects take a single `&mut dyn RenderHost`.

use std::borrow::Cow;

use crate::camera::{CameraId, CameraState, HideFlags};
use crate::errors::Result;
use crate::material::Material;

slotmap::new_key_type! {
    /// Handle to a transient render target borrowed from a [`TargetPool`].
    ///
    /// Valid from `get_temporary` until `release_temporary`; a released
    /// handle never aliases a later allocation.
    pub struct TargetHandle;
}

slotmap::new_key_type! {
    /// Handle to a host image (frame colour buffers, intermediate images).
    pub struct ImageId;
}

/// Opaque reference to a compiled shader program on the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderHandle(u32);

impl ShaderHandle {
    #[inline]
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// Descriptor for requesting a transient render target.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TargetDesc {
    pub width: u32,
    pub height: u32,
    pub format: wgpu::TextureFormat,
    /// Optional depth buffer attached to the colour target.
    pub depth_format: Option<wgpu::TextureFormat>,
    pub usage: wgpu::TextureUsages,
    pub label: Cow<'static, str>,
}

impl TargetDesc {
    /// Single-channel half-float target with a 16-bit depth buffer, usable as
    /// a render attachment and sampled afterwards.
    #[must_use]
    pub fn back_face_depth(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            format: wgpu::TextureFormat::R16Float,
            depth_format: Some(wgpu::TextureFormat::Depth16Unorm),
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            label: Cow::Borrowed("Back-face Depth"),
        }
    }
}

/// An image handed to an image-effect hook, with its size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderImage {
    pub id: ImageId,
    pub width: u32,
    pub height: u32,
}

/// Pool of transient render targets.
pub trait TargetPool {
    /// Borrows a target matching `desc` for the current frame.
    fn get_temporary(&mut self, desc: &TargetDesc) -> Result<TargetHandle>;

    /// Returns a target to the pool. Unknown or already released handles are
    /// ignored.
    fn release_temporary(&mut self, handle: TargetHandle);
}

/// Shader lookup.
pub trait ShaderLibrary {
    fn find_shader(&mut self, name: &str) -> Option<ShaderHandle>;

    /// Whether the shader compiled and can run on the current backend.
    fn is_supported(&self, shader: ShaderHandle) -> bool;
}

/// Camera storage and explicit camera rendering.
pub trait CameraBackend {
    fn camera(&self, id: CameraId) -> Option<&CameraState>;

    fn camera_mut(&mut self, id: CameraId) -> Option<&mut CameraState>;

    /// Creates a new camera owned by the caller. The host never renders it on
    /// its own unless it is enabled.
    fn spawn_camera(&mut self, name: &str, hide_flags: HideFlags) -> Result<CameraId>;

    /// Destroys a camera and its owning object now, not at end of frame.
    fn destroy_camera_immediate(&mut self, id: CameraId);

    /// Renders `id` once into its current target, regardless of its
    /// `enabled` flag.
    fn render_camera(&mut self, id: CameraId) -> Result<()>;
}

/// Full-screen draws.
pub trait Blitter {
    /// Draws `source` into `destination`.
    ///
    /// With `Some((material, pass))` the material's pass runs over a
    /// full-screen triangle with `source` bound as the main texture. With
    /// `None` the source is copied verbatim.
    fn blit(
        &mut self,
        source: ImageId,
        destination: ImageId,
        material: Option<(&Material, u32)>,
    ) -> Result<()>;

    /// Allocates an intermediate colour image of the given size.
    fn acquire_image(&mut self, width: u32, height: u32) -> Result<RenderImage>;

    fn release_image(&mut self, image: ImageId);
}

/// Everything an effect needs from the host.
pub trait RenderHost: TargetPool + ShaderLibrary + CameraBackend + Blitter {}

impl<T: TargetPool + ShaderLibrary + CameraBackend + Blitter> RenderHost for T {}
