//! Material Parameter Block
//!
//! A [`Material`] pairs a shader with named parameters (floats, matrices,
//! textures). The host reads them when it executes a
//! [`Blitter::blit`](crate::host::Blitter::blit).
//!
//! Each slot carries a write revision taken from a material-wide counter.
//! Bindings overwrite, they never accumulate; a slot that is not written in a
//! frame keeps its previous value and revision.

use std::borrow::Cow;

use glam::Mat4;
use rustc_hash::FxHashMap;

use crate::host::{ShaderHandle, TargetHandle};
use crate::utils::version_tracker::ChangeTracker;

/// Parameter names consumed by the ray marching shader.
pub mod names {
    pub const CAMERA_BACK_FACE_DEPTH_TEXTURE: &str = "_CameraBackFaceDepthTexture";
    pub const MAXIMUM_ITERATION_COUNT: &str = "_MaximumIterationCount";
    pub const MAXIMUM_MARCH_DISTANCE: &str = "_MaximumMarchDistance";
    pub const VIEW_MATRIX: &str = "_ViewMatrix";
    pub const INVERSE_VIEW_MATRIX: &str = "_InverseViewMatrix";
    pub const PROJECTION_MATRIX: &str = "_ProjectionMatrix";
    pub const SCREEN_SPACE_PROJECTION_MATRIX: &str = "_ScreenSpaceProjectionMatrix";
}

/// Value bound to a material slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MaterialParam {
    Float(f32),
    Matrix(Mat4),
    Texture(TargetHandle),
}

impl MaterialParam {
    #[must_use]
    pub fn kind(&self) -> ParamKind {
        match self {
            Self::Float(_) => ParamKind::Float,
            Self::Matrix(_) => ParamKind::Matrix,
            Self::Texture(_) => ParamKind::Texture,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKind {
    Float,
    Matrix,
    Texture,
}

#[derive(Debug, Clone)]
struct Slot {
    value: MaterialParam,
    revision: u64,
}

/// A shader plus its bound parameters.
#[derive(Debug, Clone)]
pub struct Material {
    shader: ShaderHandle,
    params: FxHashMap<Cow<'static, str>, Slot>,
    tracker: ChangeTracker,
}

impl Material {
    #[must_use]
    pub fn new(shader: ShaderHandle) -> Self {
        Self {
            shader,
            params: FxHashMap::default(),
            tracker: ChangeTracker::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn shader(&self) -> ShaderHandle {
        self.shader
    }

    pub fn set_float(&mut self, name: impl Into<Cow<'static, str>>, value: f32) {
        self.set(name.into(), MaterialParam::Float(value));
    }

    pub fn set_matrix(&mut self, name: impl Into<Cow<'static, str>>, value: Mat4) {
        self.set(name.into(), MaterialParam::Matrix(value));
    }

    pub fn set_texture(&mut self, name: impl Into<Cow<'static, str>>, value: TargetHandle) {
        self.set(name.into(), MaterialParam::Texture(value));
    }

    fn set(&mut self, name: Cow<'static, str>, value: MaterialParam) {
        self.tracker.changed();
        let revision = self.tracker.version();
        self.params.insert(name, Slot { value, revision });
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<MaterialParam> {
        self.params.get(name).map(|s| s.value)
    }

    #[must_use]
    pub fn float(&self, name: &str) -> Option<f32> {
        match self.get(name)? {
            MaterialParam::Float(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn matrix(&self, name: &str) -> Option<Mat4> {
        match self.get(name)? {
            MaterialParam::Matrix(m) => Some(m),
            _ => None,
        }
    }

    #[must_use]
    pub fn texture(&self, name: &str) -> Option<TargetHandle> {
        match self.get(name)? {
            MaterialParam::Texture(t) => Some(t),
            _ => None,
        }
    }

    /// Revision at which `name` was last written.
    #[must_use]
    pub fn revision_of(&self, name: &str) -> Option<u64> {
        self.params.get(name).map(|s| s.revision)
    }

    /// Material-wide revision: the number of writes so far.
    #[inline]
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.tracker.version()
    }

    /// Slots written after `revision`, with their values.
    pub fn written_since(&self, revision: u64) -> impl Iterator<Item = (&str, MaterialParam)> {
        self.params
            .iter()
            .filter(move |(_, s)| s.revision > revision)
            .map(|(n, s)| (n.as_ref(), s.value))
    }

    #[inline]
    #[must_use]
    pub fn param_count(&self) -> usize {
        self.params.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overwrite_bumps_revision_only_for_written_slot() {
        let mut m = Material::new(ShaderHandle::new(7));
        m.set_float(names::MAXIMUM_ITERATION_COUNT, 20.0);
        m.set_matrix(names::VIEW_MATRIX, Mat4::IDENTITY);
        let before = m.revision();
        let view_rev = m.revision_of(names::VIEW_MATRIX);

        m.set_float(names::MAXIMUM_ITERATION_COUNT, 40.0);

        assert_eq!(m.float(names::MAXIMUM_ITERATION_COUNT), Some(40.0));
        assert_eq!(m.revision_of(names::VIEW_MATRIX), view_rev);
        assert_eq!(m.param_count(), 2);

        let written: Vec<_> = m.written_since(before).map(|(n, _)| n).collect();
        assert_eq!(written, vec![names::MAXIMUM_ITERATION_COUNT]);
    }

    #[test]
    fn typed_getters_reject_other_kinds() {
        let mut m = Material::new(ShaderHandle::new(1));
        m.set_float("_X", 1.0);
        assert_eq!(m.matrix("_X"), None);
        assert_eq!(m.get("_X").map(|p| p.kind()), Some(ParamKind::Float));
        assert_eq!(m.float("_Missing"), None);
    }
}
