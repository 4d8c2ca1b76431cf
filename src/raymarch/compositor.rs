//! Compositor
//!
//! Derives the matrices the ray marching shader needs, writes them and the
//! settings onto the material, and issues the full-screen draw.
//!
//! # Screen-space projection
//!
//! ```text
//!            ┌ w/2   0   0  w/2 ┐
//!  S =       │  0   h/2  0  h/2 │  ×  P
//!            │  0    0   1   0  │
//!            └  0    0   0   1  ┘
//! ```
//!
//! `S` maps a view-space point to homogeneous pixel coordinates of the output
//! image: after the divide by `w`, NDC `[-1, 1]` lands on `[0, width]` and
//! `[0, height]`.

use glam::{Mat4, Vec4};

use crate::camera::CameraState;
use crate::errors::Result;
use crate::host::{Blitter, RenderImage, TargetHandle};
use crate::material::{Material, names};
use crate::raymarch::frame::{BindSummary, CompositeOutcome};
use crate::settings::RayMarchSettings;

/// Shader pass used for the full-screen draw.
pub const RAY_MARCH_PASS: u32 = 0;

/// NDC to viewport transform for a `width` × `height` target.
#[must_use]
pub fn viewport_matrix(width: f32, height: f32) -> Mat4 {
    let (hw, hh) = (width * 0.5, height * 0.5);
    Mat4::from_cols(
        Vec4::new(hw, 0.0, 0.0, 0.0),
        Vec4::new(0.0, hh, 0.0, 0.0),
        Vec4::new(0.0, 0.0, 1.0, 0.0),
        Vec4::new(hw, hh, 0.0, 1.0),
    )
}

/// Projection from view space straight to pixel coordinates.
#[must_use]
pub fn screen_space_projection(projection: Mat4, width: u32, height: u32) -> Mat4 {
    viewport_matrix(width as f32, height as f32) * projection
}

/// The four camera matrices bound each frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraMatrices {
    pub view: Mat4,
    pub inverse_view: Mat4,
    pub projection: Mat4,
    pub screen_space_projection: Mat4,
}

impl CameraMatrices {
    /// Matrices of `camera` for an output of `width` × `height` pixels.
    #[must_use]
    pub fn from_camera(camera: &CameraState, width: u32, height: u32) -> Self {
        let view = camera.view_matrix();
        let projection = camera.projection_matrix();
        Self {
            view,
            inverse_view: view.inverse(),
            projection,
            screen_space_projection: screen_space_projection(projection, width, height),
        }
    }
}

/// Writes every ray marching parameter onto `material`.
///
/// The back-face texture slot is only written when `back_face_depth` is
/// `Some`; otherwise whatever was bound before stays bound.
pub fn bind_parameters(
    material: &mut Material,
    settings: &RayMarchSettings,
    matrices: &CameraMatrices,
    back_face_depth: Option<TargetHandle>,
) -> BindSummary {
    let mut summary = BindSummary::default();

    if let Some(texture) = back_face_depth {
        material.set_texture(names::CAMERA_BACK_FACE_DEPTH_TEXTURE, texture);
        summary.textures += 1;
    }

    material.set_float(
        names::MAXIMUM_ITERATION_COUNT,
        settings.maximum_iteration_count() as f32,
    );
    material.set_float(names::MAXIMUM_MARCH_DISTANCE, settings.maximum_march_distance());
    summary.scalars += 2;

    material.set_matrix(names::VIEW_MATRIX, matrices.view);
    material.set_matrix(names::INVERSE_VIEW_MATRIX, matrices.inverse_view);
    material.set_matrix(names::PROJECTION_MATRIX, matrices.projection);
    material.set_matrix(
        names::SCREEN_SPACE_PROJECTION_MATRIX,
        matrices.screen_space_projection,
    );
    summary.matrices += 4;

    summary
}

/// Full-screen draw of `source` into `destination`.
///
/// Without a material the source is copied unchanged.
pub fn composite<B: Blitter + ?Sized>(
    blitter: &mut B,
    source: RenderImage,
    destination: RenderImage,
    material: Option<&Material>,
) -> Result<CompositeOutcome> {
    match material {
        Some(material) => {
            blitter.blit(source.id, destination.id, Some((material, RAY_MARCH_PASS)))?;
            Ok(CompositeOutcome::RayMarched)
        }
        None => {
            blitter.blit(source.id, destination.id, None)?;
            Ok(CompositeOutcome::PassThrough)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::ShaderHandle;

    #[test]
    fn viewport_rows() {
        let m = viewport_matrix(640.0, 480.0);
        assert_eq!(m.row(0), Vec4::new(320.0, 0.0, 0.0, 320.0));
        assert_eq!(m.row(1), Vec4::new(0.0, 240.0, 0.0, 240.0));
        assert_eq!(m.row(2), Vec4::new(0.0, 0.0, 1.0, 0.0));
        assert_eq!(m.row(3), Vec4::new(0.0, 0.0, 0.0, 1.0));
    }

    #[test]
    fn ndc_corners_land_on_pixel_edges() {
        let m = screen_space_projection(Mat4::IDENTITY, 800, 600);
        let lo = m * Vec4::new(-1.0, -1.0, 0.5, 1.0);
        let hi = m * Vec4::new(1.0, 1.0, 0.5, 1.0);
        assert_eq!((lo.x, lo.y), (0.0, 0.0));
        assert_eq!((hi.x, hi.y), (800.0, 600.0));
        assert_eq!(lo.z, 0.5);
    }

    #[test]
    fn bind_without_texture_leaves_previous_binding() {
        let mut material = Material::new(ShaderHandle::new(3));
        let settings = RayMarchSettings::default();
        let camera = CameraState::new_perspective(60.0, 320, 240, 0.1, 100.0);
        let matrices = CameraMatrices::from_camera(&camera, 320, 240);

        let summary = bind_parameters(&mut material, &settings, &matrices, None);
        assert_eq!(summary.textures, 0);
        assert_eq!(summary.scalars, 2);
        assert_eq!(summary.matrices, 4);
        assert!(material.texture(names::CAMERA_BACK_FACE_DEPTH_TEXTURE).is_none());
        assert_eq!(material.float(names::MAXIMUM_ITERATION_COUNT), Some(20.0));
    }
}
