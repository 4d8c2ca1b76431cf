//! Camera State
//!
//! The host-side description of a camera as seen by the orchestration: its
//! transform, projection, clipping and the render settings an auxiliary camera
//! has to mirror. The host owns the cameras; effects address them through
//! [`CameraId`] handles and the [`CameraBackend`](crate::host::CameraBackend)
//! trait.

use std::borrow::Cow;

use bitflags::bitflags;
use glam::{Affine3A, Mat4, Vec4};

use crate::host::{ShaderHandle, TargetHandle};

slotmap::new_key_type! {
    /// Handle to a camera owned by the host.
    pub struct CameraId;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProjectionType {
    Perspective,
    Orthographic,
}

/// Rendering path used by a camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderingPath {
    /// Forward, unbatched path. Enough for depth-only passes.
    Forward,
    #[default]
    Deferred,
}

/// What a camera clears before drawing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClearFlags {
    #[default]
    Skybox,
    /// Fill colour and depth with [`CameraState::background_color`].
    SolidColor,
    DepthOnly,
    Nothing,
}

bitflags! {
    /// Extra depth outputs a camera exposes to downstream consumers.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct DepthTextureMode: u8 {
        const DEPTH          = 1 << 0;
        const DEPTH_NORMALS  = 1 << 1;
        const MOTION_VECTORS = 1 << 2;
    }
}

bitflags! {
    /// Visibility/persistence flags for host-created objects.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct HideFlags: u8 {
        const HIDE_IN_HIERARCHY    = 1 << 0;
        const HIDE_IN_INSPECTOR    = 1 << 1;
        const DONT_SAVE_IN_EDITOR  = 1 << 2;
        const NOT_EDITABLE         = 1 << 3;
        const DONT_SAVE_IN_BUILD   = 1 << 4;
        const DONT_UNLOAD_UNUSED   = 1 << 5;

        const DONT_SAVE = Self::DONT_SAVE_IN_EDITOR.bits()
            | Self::DONT_SAVE_IN_BUILD.bits()
            | Self::DONT_UNLOAD_UNUSED.bits();
        const HIDE_AND_DONT_SAVE = Self::HIDE_IN_HIERARCHY.bits()
            | Self::NOT_EDITABLE.bits()
            | Self::DONT_SAVE.bits();
    }
}

/// Per-camera replacement shader: every object drawn by the camera uses
/// `shader` instead of its own material. `tag` optionally restricts the
/// replacement to sub-shaders carrying a matching tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplacementShader {
    pub shader: ShaderHandle,
    pub tag: Option<Cow<'static, str>>,
}

/// A camera's full render state.
#[derive(Debug, Clone)]
pub struct CameraState {
    pub name: Cow<'static, str>,

    // === Projection ===
    pub projection_type: ProjectionType,
    /// Vertical field of view in radians.
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    pub ortho_size: f32,

    // === Output ===
    /// Size of the camera's output in pixels.
    pub pixel_width: u32,
    pub pixel_height: u32,
    pub target: Option<TargetHandle>,

    // === Render settings ===
    pub enabled: bool,
    pub rendering_path: RenderingPath,
    pub clear_flags: ClearFlags,
    pub background_color: Vec4,
    pub culling_mask: u32,
    pub depth: f32,
    pub depth_texture_mode: DepthTextureMode,
    pub replacement_shader: Option<ReplacementShader>,

    pub(crate) world_matrix: Affine3A,
    pub(crate) view_matrix: Mat4,
    pub(crate) projection_matrix: Mat4,
}

impl CameraState {
    /// Creates a perspective camera. `fov` is the vertical field of view in
    /// degrees.
    #[must_use]
    pub fn new_perspective(
        fov: f32,
        pixel_width: u32,
        pixel_height: u32,
        near: f32,
        far: f32,
    ) -> Self {
        let mut cam = Self {
            name: Cow::Borrowed("Camera"),
            projection_type: ProjectionType::Perspective,
            fov: fov.to_radians(),
            near,
            far,
            ortho_size: 5.0,

            pixel_width,
            pixel_height,
            target: None,

            enabled: true,
            rendering_path: RenderingPath::default(),
            clear_flags: ClearFlags::default(),
            background_color: Vec4::new(0.19, 0.30, 0.47, 0.0),
            culling_mask: u32::MAX,
            depth: 0.0,
            depth_texture_mode: DepthTextureMode::empty(),
            replacement_shader: None,

            world_matrix: Affine3A::IDENTITY,
            view_matrix: Mat4::IDENTITY,
            projection_matrix: Mat4::IDENTITY,
        };

        cam.update_projection_matrix();
        cam
    }

    /// Creates an orthographic camera with the given half-height.
    #[must_use]
    pub fn new_orthographic(
        ortho_size: f32,
        pixel_width: u32,
        pixel_height: u32,
        near: f32,
        far: f32,
    ) -> Self {
        let mut cam = Self::new_perspective(60.0, pixel_width, pixel_height, near, far);
        cam.projection_type = ProjectionType::Orthographic;
        cam.ortho_size = ortho_size;
        cam.update_projection_matrix();
        cam
    }

    #[inline]
    #[must_use]
    pub fn aspect(&self) -> f32 {
        if self.pixel_height == 0 {
            1.0
        } else {
            self.pixel_width as f32 / self.pixel_height as f32
        }
    }

    pub fn update_projection_matrix(&mut self) {
        self.projection_matrix = match self.projection_type {
            // glam's perspective_rh maps depth to the wgpu/Vulkan 0..1 range
            ProjectionType::Perspective => {
                Mat4::perspective_rh(self.fov, self.aspect(), self.near, self.far)
            }
            ProjectionType::Orthographic => {
                let h = self.ortho_size;
                let w = h * self.aspect();
                Mat4::orthographic_rh(-w, w, -h, h, self.near, self.far)
            }
        };
    }

    /// Places the camera in the world. The view matrix is the inverse of the
    /// world transform.
    pub fn set_world_transform(&mut self, world_transform: Affine3A) {
        self.world_matrix = world_transform;
        self.view_matrix = Mat4::from(world_transform).inverse();
    }

    /// Resizes the output and refreshes the projection (aspect changes).
    pub fn set_pixel_size(&mut self, width: u32, height: u32) {
        self.pixel_width = width;
        self.pixel_height = height;
        self.update_projection_matrix();
    }

    /// Overrides the projection matrix directly (oblique clipping, jitter...).
    pub fn set_projection_matrix(&mut self, projection: Mat4) {
        self.projection_matrix = projection;
    }

    #[inline]
    #[must_use]
    pub fn world_matrix(&self) -> Affine3A {
        self.world_matrix
    }

    /// World to camera matrix.
    #[inline]
    #[must_use]
    pub fn view_matrix(&self) -> Mat4 {
        self.view_matrix
    }

    #[inline]
    #[must_use]
    pub fn projection_matrix(&self) -> Mat4 {
        self.projection_matrix
    }

    /// Copies every camera parameter from `other`. The camera keeps its own
    /// name.
    pub fn copy_from(&mut self, other: &CameraState) {
        let name = std::mem::take(&mut self.name);
        *self = other.clone();
        self.name = name;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn copy_from_keeps_name() {
        let mut primary = CameraState::new_perspective(75.0, 640, 480, 0.3, 500.0);
        primary.name = Cow::Borrowed("Main");
        primary.culling_mask = 0b1010;
        primary.set_world_transform(Affine3A::from_translation(Vec3::new(1.0, 2.0, 3.0)));

        let mut aux = CameraState::new_perspective(60.0, 1, 1, 0.1, 10.0);
        aux.name = Cow::Borrowed("Aux");
        aux.copy_from(&primary);

        assert_eq!(aux.name, "Aux");
        assert_eq!(aux.culling_mask, 0b1010);
        assert_eq!(aux.pixel_width, 640);
        assert_eq!(aux.view_matrix(), primary.view_matrix());
        assert_eq!(aux.projection_matrix(), primary.projection_matrix());
    }

    #[test]
    fn hide_and_dont_save_contains_dont_save() {
        assert!(HideFlags::HIDE_AND_DONT_SAVE.contains(HideFlags::DONT_SAVE));
        assert!(HideFlags::HIDE_AND_DONT_SAVE.contains(HideFlags::HIDE_IN_HIERARCHY));
        assert!(!HideFlags::HIDE_AND_DONT_SAVE.contains(HideFlags::HIDE_IN_INSPECTOR));
    }

    #[test]
    fn resize_refreshes_aspect() {
        let mut cam = CameraState::new_perspective(90.0, 512, 512, 0.1, 100.0);
        let square = cam.projection_matrix();
        cam.set_pixel_size(1024, 512);
        assert_ne!(cam.projection_matrix().x_axis.x, square.x_axis.x);
        assert_eq!(cam.projection_matrix().y_axis.y, square.y_axis.y);
    }
}
