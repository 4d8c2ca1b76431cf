//! Screen-space Ray Marching Effect
//!
//! Per-frame orchestration of the ray marching pass for one camera.
//!
//! # Frame
//!
//! ```text
//!  pre_cull          ── acquire R16Float target (primary pixel size)
//!                    ── mirror primary onto back-face camera, render it
//!  render_image      ── bind settings + matrices (+ back-face texture)
//!                    ── full-screen draw, pass 0 (or copy if no material)
//!  post_render       ── release target
//! ```
//!
//! Every hook is a plain method and can be driven directly; the
//! [`CameraEffect`] impl forwards to them for use in a
//! [`CameraEffectStack`](crate::pipeline::CameraEffectStack).
//!
//! # Failure policy
//!
//! Per-frame failures never escape the hooks. A missing or unsupported shader
//! turns the effect into a copy; a failed target allocation or back-face
//! render only drops the back-face contribution for that frame and is retried
//! on the next one.

use crate::camera::{CameraId, CameraState, DepthTextureMode};
use crate::errors::{RayMarchError, Result};
use crate::host::{
    CameraBackend, RenderHost, RenderImage, ShaderHandle, ShaderLibrary, TargetDesc, TargetHandle,
    TargetPool,
};
use crate::material::Material;
use crate::pipeline::{CameraEffect, RenderStage};
use crate::raymarch::backface::BackFaceCamera;
use crate::raymarch::compositor::{CameraMatrices, bind_parameters, composite};
use crate::raymarch::frame::{FramePhase, FrameReport};
use crate::settings::RayMarchSettings;

/// Name of the ray marching shader in the host shader library.
pub const RAY_MARCHING_SHADER: &str = "Hidden/Screen-space Ray Marching";

/// Name of the replacement shader used by the back-face camera.
pub const BACK_FACE_DEPTH_SHADER: &str = "Hidden/Back-face Depth Camera";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lookup {
    Unresolved,
    Found(ShaderHandle),
    Missing,
}

/// Shader looked up by name once; a miss is remembered too.
#[derive(Debug)]
struct ShaderSlot {
    name: &'static str,
    state: Lookup,
}

impl ShaderSlot {
    const fn new(name: &'static str) -> Self {
        Self {
            name,
            state: Lookup::Unresolved,
        }
    }

    fn resolve<H: ShaderLibrary + ?Sized>(&mut self, host: &mut H) -> Option<ShaderHandle> {
        match self.state {
            Lookup::Found(shader) => Some(shader),
            Lookup::Missing => None,
            Lookup::Unresolved => {
                let found = host.find_shader(self.name);
                self.state = match found {
                    Some(shader) => Lookup::Found(shader),
                    None => {
                        log::warn!("Shader '{}' not found", self.name);
                        Lookup::Missing
                    }
                };
                found
            }
        }
    }

    fn clear(&mut self) {
        self.state = Lookup::Unresolved;
    }
}

#[derive(Debug)]
enum MaterialSlot {
    Unresolved,
    Ready(Material),
    Unavailable,
}

/// The ray marching effect attached to one camera.
#[derive(Debug)]
pub struct ScreenSpaceRayMarching {
    settings: RayMarchSettings,
    camera: CameraId,
    enabled: bool,

    // === Lazily resolved, cleared in `destroy` ===
    shader: ShaderSlot,
    back_face_shader: ShaderSlot,
    material: MaterialSlot,
    back_face: BackFaceCamera,

    // === Frame state ===
    depth_target: Option<TargetHandle>,
    phase: FramePhase,
    frame: FrameReport,
    last_frame: Option<FrameReport>,
    frame_count: u64,
}

impl ScreenSpaceRayMarching {
    /// Attaches the effect to `camera`.
    ///
    /// The effect starts disabled; call [`enable`](Self::enable) (or push it
    /// onto a stack) before the first frame.
    pub fn attach<H: CameraBackend + ?Sized>(
        host: &H,
        camera: CameraId,
        settings: RayMarchSettings,
    ) -> Result<Self> {
        if host.camera(camera).is_none() {
            return Err(RayMarchError::MissingPrimaryCamera(camera));
        }

        Ok(Self {
            settings: settings.sanitized(),
            camera,
            enabled: false,
            shader: ShaderSlot::new(RAY_MARCHING_SHADER),
            back_face_shader: ShaderSlot::new(BACK_FACE_DEPTH_SHADER),
            material: MaterialSlot::Unresolved,
            back_face: BackFaceCamera::new(),
            depth_target: None,
            phase: FramePhase::Idle,
            frame: FrameReport::default(),
            last_frame: None,
            frame_count: 0,
        })
    }

    // ── Accessors ───────────────────────────────────────────────────────────

    #[inline]
    #[must_use]
    pub fn settings(&self) -> &RayMarchSettings {
        &self.settings
    }

    /// Mutable settings. Must not be changed between `render_image` calls of
    /// the same frame.
    #[inline]
    pub fn settings_mut(&mut self) -> &mut RayMarchSettings {
        &mut self.settings
    }

    #[inline]
    #[must_use]
    pub fn camera(&self) -> CameraId {
        self.camera
    }

    #[inline]
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    #[inline]
    #[must_use]
    pub fn phase(&self) -> FramePhase {
        self.phase
    }

    /// The transient target currently held, if any.
    #[inline]
    #[must_use]
    pub fn depth_target(&self) -> Option<TargetHandle> {
        self.depth_target
    }

    #[inline]
    #[must_use]
    pub fn back_face_camera(&self) -> Option<CameraId> {
        self.back_face.id()
    }

    /// Report of the frame in flight (or the last one, once released).
    #[inline]
    #[must_use]
    pub fn current_frame(&self) -> &FrameReport {
        &self.frame
    }

    /// Report of the last frame that reached release.
    #[inline]
    #[must_use]
    pub fn last_frame(&self) -> Option<&FrameReport> {
        self.last_frame.as_ref()
    }

    /// The material, if it has been built.
    #[must_use]
    pub fn material(&self) -> Option<&Material> {
        match &self.material {
            MaterialSlot::Ready(material) => Some(material),
            _ => None,
        }
    }

    /// The ray marching shader, looked up on first call.
    pub fn shader<H: ShaderLibrary + ?Sized>(&mut self, host: &mut H) -> Option<ShaderHandle> {
        self.shader.resolve(host)
    }

    /// The material, built on first call. `None` when the shader is missing
    /// or unsupported by the backend.
    pub fn ensure_material<H: ShaderLibrary + ?Sized>(
        &mut self,
        host: &mut H,
    ) -> Option<&mut Material> {
        if matches!(self.material, MaterialSlot::Unresolved) {
            self.material = match self.shader.resolve(host) {
                Some(shader) if host.is_supported(shader) => {
                    MaterialSlot::Ready(Material::new(shader))
                }
                Some(_) => {
                    log::warn!("Shader '{RAY_MARCHING_SHADER}' is not supported on this backend");
                    MaterialSlot::Unavailable
                }
                None => MaterialSlot::Unavailable,
            };
        }

        match &mut self.material {
            MaterialSlot::Ready(material) => Some(material),
            _ => None,
        }
    }

    // ── Lifecycle ───────────────────────────────────────────────────────────

    /// Enables the effect and asks the primary camera for a depth texture.
    pub fn enable<H: CameraBackend + ?Sized>(&mut self, host: &mut H) {
        self.enabled = true;
        if let Some(camera) = host.camera_mut(self.camera) {
            camera.depth_texture_mode |= DepthTextureMode::DEPTH;
        }
    }

    /// Disables the effect: destroys the back-face camera and, if a frame is
    /// in flight, releases its target.
    pub fn disable<H: RenderHost + ?Sized>(&mut self, host: &mut H) {
        self.enabled = false;
        self.back_face.destroy(host);
        self.post_render(host);
    }

    /// Tears the effect down, dropping every cached resource.
    pub fn destroy<H: RenderHost + ?Sized>(&mut self, host: &mut H) {
        self.disable(host);
        self.shader.clear();
        self.back_face_shader.clear();
        self.material = MaterialSlot::Unresolved;
    }

    // ── Frame ───────────────────────────────────────────────────────────────

    /// Pre-cull: acquires the back-face target and renders back faces into
    /// it.
    pub fn pre_cull<H: RenderHost + ?Sized>(&mut self, host: &mut H) {
        if !self.enabled {
            return;
        }

        if self.depth_target.is_some() {
            log::warn!(
                "Back-face target of frame {} was never released; releasing it now",
                self.frame.frame_index
            );
            self.post_render(host);
        }

        self.frame_count += 1;
        self.frame = FrameReport::new(self.frame_count);

        let Some(primary) = host.camera(self.camera).cloned() else {
            log::debug!("Primary camera {:?} is gone; skipping frame", self.camera);
            self.phase = FramePhase::Idle;
            return;
        };

        self.phase = FramePhase::DepthAcquired;
        let Some(target) =
            self.acquire_depth_target(host, primary.pixel_width, primary.pixel_height)
        else {
            return;
        };

        match self.render_back_faces(host, &primary, target) {
            Ok(()) => {
                self.phase = FramePhase::BackFaceRendered;
                self.frame.back_face_rendered = true;
            }
            Err(e) => {
                log::debug!("Back-face depth skipped this frame: {e}");
                self.release_depth_target(host);
            }
        }
    }

    /// Opaque-stage image effect: binds parameters and draws `source` into
    /// `destination`.
    ///
    /// Copies the source unchanged when the effect is disabled, the material
    /// is unavailable or the primary camera is gone.
    pub fn render_image<H: RenderHost + ?Sized>(
        &mut self,
        host: &mut H,
        source: RenderImage,
        destination: RenderImage,
    ) -> Result<()> {
        let matrices = match host.camera(self.camera) {
            Some(camera) if self.enabled => Some(CameraMatrices::from_camera(
                camera,
                source.width,
                source.height,
            )),
            _ => None,
        };

        let settings = self.settings;
        let back_face = self.depth_target;
        let mut bound = None;
        if let Some(matrices) = matrices
            && let Some(material) = self.ensure_material(host)
        {
            bound = Some(bind_parameters(material, &settings, &matrices, back_face));
        }

        let material = match &self.material {
            MaterialSlot::Ready(material) if bound.is_some() => Some(material),
            _ => None,
        };
        let outcome = composite(host, source, destination, material)?;

        if self.phase.in_frame() {
            self.phase = FramePhase::Composited;
        }
        self.frame.bound = bound;
        self.frame.composite = Some(outcome);
        Ok(())
    }

    /// Post-render: returns the frame's target to the pool and detaches it
    /// from the back-face camera.
    ///
    /// Safe to call any number of times; runs whether or not the effect is
    /// enabled.
    pub fn post_render<H: TargetPool + CameraBackend + ?Sized>(&mut self, host: &mut H) {
        self.release_depth_target(host);
        if self.phase.in_frame() {
            self.phase = FramePhase::Released;
            self.last_frame = Some(self.frame.clone());
        }
    }

    // ── Internals ───────────────────────────────────────────────────────────

    fn acquire_depth_target<H: TargetPool + ?Sized>(
        &mut self,
        host: &mut H,
        width: u32,
        height: u32,
    ) -> Option<TargetHandle> {
        match host.get_temporary(&TargetDesc::back_face_depth(width, height)) {
            Ok(target) => {
                self.depth_target = Some(target);
                self.frame.depth_target = Some(target);
                Some(target)
            }
            Err(e) => {
                log::debug!("No back-face depth this frame: {e}");
                None
            }
        }
    }

    fn release_depth_target<H: TargetPool + CameraBackend + ?Sized>(&mut self, host: &mut H) {
        if let Some(target) = self.depth_target.take() {
            self.back_face.unbind_target(host);
            host.release_temporary(target);
            self.frame.released = true;
        }
    }

    fn render_back_faces<H: RenderHost + ?Sized>(
        &mut self,
        host: &mut H,
        primary: &CameraState,
        target: TargetHandle,
    ) -> Result<()> {
        let replacement = self.back_face_shader.resolve(host).ok_or_else(|| {
            RayMarchError::RenderFailed(format!(
                "replacement shader '{BACK_FACE_DEPTH_SHADER}' unavailable"
            ))
        })?;
        self.back_face.configure(host, primary, target, replacement)?;
        self.back_face.render_back_faces(host)
    }
}

impl Drop for ScreenSpaceRayMarching {
    fn drop(&mut self) {
        if let Some(id) = self.back_face.id() {
            log::warn!("Ray marching effect dropped without destroy; camera {id:?} leaked");
        }
    }
}

impl CameraEffect for ScreenSpaceRayMarching {
    fn name(&self) -> &str {
        "Screen-space Ray Marching"
    }

    fn stage(&self) -> RenderStage {
        RenderStage::BeforeTransparent
    }

    fn on_enable(&mut self, host: &mut dyn RenderHost) {
        self.enable(host);
    }

    fn on_disable(&mut self, host: &mut dyn RenderHost) {
        self.disable(host);
    }

    fn on_pre_cull(&mut self, host: &mut dyn RenderHost) {
        self.pre_cull(host);
    }

    fn on_render_image(
        &mut self,
        host: &mut dyn RenderHost,
        source: RenderImage,
        destination: RenderImage,
    ) -> Result<()> {
        self.render_image(host, source, destination)
    }

    fn on_post_render(&mut self, host: &mut dyn RenderHost) {
        self.post_render(host);
    }
}
