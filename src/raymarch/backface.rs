//! Back-face Depth Camera
//!
//! A hidden camera that mirrors the primary camera each frame and renders
//! every object with the back-face depth replacement shader into a transient
//! single-channel target. Background pixels keep the clear value `1.0`
//! ("infinitely far").
//!
//! The camera stays disabled so the host's automatic loop never renders it;
//! it is only drawn through an explicit [`CameraBackend::render_camera`] call.

use glam::Vec4;

use crate::camera::{
    CameraId, CameraState, ClearFlags, HideFlags, RenderingPath, ReplacementShader,
};
use crate::errors::{RayMarchError, Result};
use crate::host::{CameraBackend, ShaderHandle, TargetHandle};

pub const BACK_FACE_CAMERA_NAME: &str = "Back-face Depth Camera";

/// Clear colour of the back-face target: maximum depth.
pub const BACK_FACE_CLEAR_COLOR: Vec4 = Vec4::ONE;

/// Owner of the auxiliary camera.
#[derive(Debug, Default)]
pub struct BackFaceCamera {
    camera: Option<CameraId>,
}

impl BackFaceCamera {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The camera id, if it currently exists.
    #[inline]
    #[must_use]
    pub fn id(&self) -> Option<CameraId> {
        self.camera
    }

    /// Returns the auxiliary camera, spawning it if needed.
    ///
    /// A cached id the host no longer knows about is treated as absent.
    pub fn ensure<H: CameraBackend + ?Sized>(&mut self, host: &mut H) -> Result<CameraId> {
        if let Some(id) = self.camera {
            if host.camera(id).is_some() {
                return Ok(id);
            }
            self.camera = None;
        }

        let id = host.spawn_camera(BACK_FACE_CAMERA_NAME, HideFlags::HIDE_AND_DONT_SAVE)?;
        log::debug!("Spawned back-face depth camera {id:?}");
        self.camera = Some(id);
        Ok(id)
    }

    /// Mirrors `primary` onto the auxiliary camera and applies the back-face
    /// overrides.
    pub fn configure<H: CameraBackend + ?Sized>(
        &mut self,
        host: &mut H,
        primary: &CameraState,
        target: TargetHandle,
        replacement: ShaderHandle,
    ) -> Result<CameraId> {
        let id = self.ensure(host)?;
        let camera = host
            .camera_mut(id)
            .ok_or(RayMarchError::CameraNotFound(id))?;

        camera.copy_from(primary);
        camera.rendering_path = RenderingPath::Forward;
        camera.enabled = false;
        camera.replacement_shader = Some(ReplacementShader {
            shader: replacement,
            tag: None,
        });
        camera.background_color = BACK_FACE_CLEAR_COLOR;
        camera.clear_flags = ClearFlags::SolidColor;
        camera.target = Some(target);

        Ok(id)
    }

    /// Renders the auxiliary camera once into its bound target.
    pub fn render_back_faces<H: CameraBackend + ?Sized>(&self, host: &mut H) -> Result<()> {
        let id = self
            .camera
            .ok_or_else(|| RayMarchError::RenderFailed("back-face camera not created".into()))?;
        host.render_camera(id)
    }

    /// Detaches the camera from its target once the target went back to the
    /// pool.
    pub fn unbind_target<H: CameraBackend + ?Sized>(&self, host: &mut H) {
        if let Some(id) = self.camera
            && let Some(camera) = host.camera_mut(id)
        {
            camera.target = None;
        }
    }

    /// Destroys the camera now and forgets it.
    pub fn destroy<H: CameraBackend + ?Sized>(&mut self, host: &mut H) {
        if let Some(id) = self.camera.take() {
            host.destroy_camera_immediate(id);
            log::debug!("Destroyed back-face depth camera {id:?}");
        }
    }
}
