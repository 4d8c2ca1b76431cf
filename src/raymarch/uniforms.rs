//! GPU layout of the ray marching parameters.
//!
//! Hosts backed by `wgpu` upload the material slots as one uniform block.
//! Matrices come first so every field stays 16-byte aligned.

use bytemuck::{Pod, Zeroable};
use glam::Mat4;

use crate::material::{Material, names};

/// WGSL declaration matching [`RayMarchUniforms`].
pub const RAY_MARCH_UNIFORMS_WGSL: &str = "\
struct RayMarchUniforms {
    view_matrix: mat4x4<f32>,
    inverse_view_matrix: mat4x4<f32>,
    projection_matrix: mat4x4<f32>,
    screen_space_projection_matrix: mat4x4<f32>,
    maximum_iteration_count: f32,
    maximum_march_distance: f32,
};
";

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct RayMarchUniforms {
    pub view_matrix: Mat4,                     // 64
    pub inverse_view_matrix: Mat4,             // 64
    pub projection_matrix: Mat4,               // 64
    pub screen_space_projection_matrix: Mat4,  // 64
    pub maximum_iteration_count: f32,          // 4
    pub maximum_march_distance: f32,           // 4
    pub(crate) __padding: [f32; 2],            // 8 (8+8=16)
}

impl Default for RayMarchUniforms {
    fn default() -> Self {
        Self {
            view_matrix: Mat4::IDENTITY,
            inverse_view_matrix: Mat4::IDENTITY,
            projection_matrix: Mat4::IDENTITY,
            screen_space_projection_matrix: Mat4::IDENTITY,
            maximum_iteration_count: 20.0,
            maximum_march_distance: 10.0,
            __padding: [0.0; 2],
        }
    }
}

impl RayMarchUniforms {
    /// Packs the material's bound slots. `None` until every matrix and
    /// scalar has been written at least once.
    #[must_use]
    pub fn from_material(material: &Material) -> Option<Self> {
        Some(Self {
            view_matrix: material.matrix(names::VIEW_MATRIX)?,
            inverse_view_matrix: material.matrix(names::INVERSE_VIEW_MATRIX)?,
            projection_matrix: material.matrix(names::PROJECTION_MATRIX)?,
            screen_space_projection_matrix: material
                .matrix(names::SCREEN_SPACE_PROJECTION_MATRIX)?,
            maximum_iteration_count: material.float(names::MAXIMUM_ITERATION_COUNT)?,
            maximum_march_distance: material.float(names::MAXIMUM_MARCH_DISTANCE)?,
            __padding: [0.0; 2],
        })
    }

    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::CameraState;
    use crate::host::ShaderHandle;
    use crate::raymarch::compositor::{CameraMatrices, bind_parameters};
    use crate::settings::RayMarchSettings;

    #[test]
    fn layout_is_uniform_aligned() {
        assert_eq!(std::mem::size_of::<RayMarchUniforms>(), 272);
        assert_eq!(std::mem::size_of::<RayMarchUniforms>() % 16, 0);
    }

    #[test]
    fn incomplete_material_packs_nothing() {
        let mut material = Material::new(ShaderHandle::new(0));
        material.set_float(names::MAXIMUM_ITERATION_COUNT, 8.0);
        assert!(RayMarchUniforms::from_material(&material).is_none());
    }

    #[test]
    fn packs_bound_parameters() {
        let mut material = Material::new(ShaderHandle::new(0));
        let camera = CameraState::new_perspective(90.0, 512, 512, 0.1, 100.0);
        let matrices = CameraMatrices::from_camera(&camera, 512, 512);
        bind_parameters(&mut material, &RayMarchSettings::default(), &matrices, None);

        let uniforms = RayMarchUniforms::from_material(&material).unwrap();
        assert_eq!(uniforms.projection_matrix, camera.projection_matrix());
        assert_eq!(
            uniforms.screen_space_projection_matrix,
            matrices.screen_space_projection
        );
        assert_eq!(uniforms.maximum_iteration_count, 20.0);

        let bytes = uniforms.as_bytes();
        assert_eq!(bytes.len(), 272);
        assert_eq!(&bytes[256..260], &20.0_f32.to_le_bytes());
    }
}
