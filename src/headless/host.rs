//! Headless Host
//!
//! A complete [`RenderHost`](crate::host::RenderHost) that keeps everything in
//! host memory and records every call it receives. It does not rasterize
//! geometry: a camera render only applies the camera's clear to its target.
//! A blit with a material runs the program registered for the material's
//! shader, or copies the source when none is registered.
//!
//! ```rust,ignore
//! let mut host = HeadlessHost::with_standard_shaders();
//! let camera = host.add_camera(CameraState::new_perspective(90.0, 512, 512, 0.1, 100.0));
//! let source = host.create_image(512, 512)?;
//! ```

use std::borrow::Cow;

use glam::{Mat4, Vec4};
use rustc_hash::FxHashMap;
use slotmap::SlotMap;

use crate::camera::{CameraId, CameraState, ClearFlags, HideFlags, RenderingPath};
use crate::errors::{RayMarchError, Result};
use crate::headless::image::{CpuAllocator, CpuImage, CpuTarget};
use crate::host::{
    Blitter, CameraBackend, ImageId, RenderImage, ShaderHandle, ShaderLibrary, TargetDesc,
    TargetHandle, TargetPool,
};
use crate::material::Material;
use crate::pool::TransientTargetPool;
use crate::raymarch::{BACK_FACE_DEPTH_SHADER, RAY_MARCHING_SHADER};

/// Fragment program run by [`Blitter::blit`] for a given shader.
pub type ShaderProgram = Box<dyn Fn(&Material, &CpuImage, &mut CpuImage)>;

/// State captured when a camera is rendered.
#[derive(Debug, Clone)]
pub struct CameraRender {
    pub camera: CameraId,
    pub target: Option<TargetHandle>,
    pub enabled: bool,
    pub rendering_path: RenderingPath,
    pub clear_flags: ClearFlags,
    pub background_color: Vec4,
    pub replacement_shader: Option<ShaderHandle>,
    pub culling_mask: u32,
    pub view_matrix: Mat4,
    pub projection_matrix: Mat4,
}

/// A recorded full-screen draw.
#[derive(Debug, Clone)]
pub struct BlitRecord {
    pub source: ImageId,
    pub destination: ImageId,
    /// Material snapshot and pass, `None` for a plain copy.
    pub material: Option<(Material, u32)>,
}

/// Every call the host received, in order.
#[derive(Debug, Clone)]
pub enum HostEvent {
    TargetAcquired {
        handle: TargetHandle,
        width: u32,
        height: u32,
    },
    TargetAllocationFailed {
        width: u32,
        height: u32,
    },
    TargetReleased {
        handle: TargetHandle,
        was_active: bool,
    },
    CameraSpawned {
        camera: CameraId,
        name: String,
        hide_flags: HideFlags,
    },
    CameraDestroyed(CameraId),
    CameraRendered(CameraRender),
    Blit(BlitRecord),
    ImageAcquired(ImageId),
    ImageReleased(ImageId),
}

struct HeadlessCamera {
    state: CameraState,
    hide_flags: HideFlags,
}

struct ShaderEntry {
    name: String,
    supported: bool,
}

/// In-memory render host.
pub struct HeadlessHost {
    pool: TransientTargetPool<CpuAllocator>,
    cameras: SlotMap<CameraId, HeadlessCamera>,
    images: SlotMap<ImageId, CpuImage>,
    shaders: Vec<ShaderEntry>,
    programs: FxHashMap<ShaderHandle, ShaderProgram>,
    events: Vec<HostEvent>,
    image_format: wgpu::TextureFormat,
    fail_camera_spawns: bool,
}

impl Default for HeadlessHost {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessHost {
    /// Creates a host with no shaders and `Rgba8Unorm` images.
    #[must_use]
    pub fn new() -> Self {
        Self {
            pool: TransientTargetPool::new(CpuAllocator::default()),
            cameras: SlotMap::with_key(),
            images: SlotMap::with_key(),
            shaders: Vec::new(),
            programs: FxHashMap::default(),
            events: Vec::new(),
            image_format: wgpu::TextureFormat::Rgba8Unorm,
            fail_camera_spawns: false,
        }
    }

    /// Creates a host with the ray marching and back-face depth shaders
    /// registered and supported.
    #[must_use]
    pub fn with_standard_shaders() -> Self {
        let mut host = Self::new();
        host.register_shader(RAY_MARCHING_SHADER, true);
        host.register_shader(BACK_FACE_DEPTH_SHADER, true);
        host
    }

    // ── Setup ──────────────────────────────────────────────────────────────

    pub fn register_shader(&mut self, name: &str, supported: bool) -> ShaderHandle {
        let handle = ShaderHandle::new(self.shaders.len() as u32);
        self.shaders.push(ShaderEntry {
            name: name.to_owned(),
            supported,
        });
        handle
    }

    /// Runs `program` for blits whose material uses `shader`.
    pub fn set_program(&mut self, shader: ShaderHandle, program: ShaderProgram) {
        self.programs.insert(shader, program);
    }

    pub fn add_camera(&mut self, state: CameraState) -> CameraId {
        self.cameras.insert(HeadlessCamera {
            state,
            hide_flags: HideFlags::empty(),
        })
    }

    /// Creates a colour image in the host image format.
    pub fn create_image(&mut self, width: u32, height: u32) -> Result<RenderImage> {
        let image = CpuImage::new(width, height, self.image_format)?;
        let id = self.images.insert(image);
        Ok(RenderImage { id, width, height })
    }

    /// Largest target dimension the pool accepts; larger requests fail.
    pub fn set_max_target_dimension(&mut self, max_dimension: u32) {
        self.pool.allocator_mut().max_dimension = max_dimension;
    }

    /// Makes every subsequent `spawn_camera` fail.
    pub fn set_fail_camera_spawns(&mut self, fail: bool) {
        self.fail_camera_spawns = fail;
    }

    // ── Inspection ─────────────────────────────────────────────────────────

    #[must_use]
    pub fn image(&self, id: ImageId) -> Option<&CpuImage> {
        self.images.get(id)
    }

    pub fn image_mut(&mut self, id: ImageId) -> Option<&mut CpuImage> {
        self.images.get_mut(id)
    }

    #[must_use]
    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    #[must_use]
    pub fn target(&self, handle: TargetHandle) -> Option<&CpuTarget> {
        self.pool.get(handle)
    }

    #[must_use]
    pub fn pool(&self) -> &TransientTargetPool<CpuAllocator> {
        &self.pool
    }

    pub fn pool_mut(&mut self) -> &mut TransientTargetPool<CpuAllocator> {
        &mut self.pool
    }

    #[must_use]
    pub fn camera_count(&self) -> usize {
        self.cameras.len()
    }

    #[must_use]
    pub fn hide_flags(&self, id: CameraId) -> Option<HideFlags> {
        self.cameras.get(id).map(|c| c.hide_flags)
    }

    #[must_use]
    pub fn events(&self) -> &[HostEvent] {
        &self.events
    }

    pub fn take_events(&mut self) -> Vec<HostEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn count_events(&self, pred: impl Fn(&HostEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }

    /// Recorded blits, in order.
    pub fn blits(&self) -> impl Iterator<Item = &BlitRecord> {
        self.events.iter().filter_map(|e| match e {
            HostEvent::Blit(record) => Some(record),
            _ => None,
        })
    }

    /// Recorded camera renders, in order.
    pub fn camera_renders(&self) -> impl Iterator<Item = &CameraRender> {
        self.events.iter().filter_map(|e| match e {
            HostEvent::CameraRendered(render) => Some(render),
            _ => None,
        })
    }
}

impl TargetPool for HeadlessHost {
    fn get_temporary(&mut self, desc: &TargetDesc) -> Result<TargetHandle> {
        match self.pool.acquire(desc) {
            Ok(handle) => {
                self.events.push(HostEvent::TargetAcquired {
                    handle,
                    width: desc.width,
                    height: desc.height,
                });
                Ok(handle)
            }
            Err(e) => {
                self.events.push(HostEvent::TargetAllocationFailed {
                    width: desc.width,
                    height: desc.height,
                });
                Err(e)
            }
        }
    }

    fn release_temporary(&mut self, handle: TargetHandle) {
        let was_active = self.pool.release(handle);
        self.events.push(HostEvent::TargetReleased { handle, was_active });
    }
}

impl ShaderLibrary for HeadlessHost {
    fn find_shader(&mut self, name: &str) -> Option<ShaderHandle> {
        self.shaders
            .iter()
            .position(|s| s.name == name)
            .map(|i| ShaderHandle::new(i as u32))
    }

    fn is_supported(&self, shader: ShaderHandle) -> bool {
        self.shaders
            .get(shader.raw() as usize)
            .is_some_and(|s| s.supported)
    }
}

impl CameraBackend for HeadlessHost {
    fn camera(&self, id: CameraId) -> Option<&CameraState> {
        self.cameras.get(id).map(|c| &c.state)
    }

    fn camera_mut(&mut self, id: CameraId) -> Option<&mut CameraState> {
        self.cameras.get_mut(id).map(|c| &mut c.state)
    }

    fn spawn_camera(&mut self, name: &str, hide_flags: HideFlags) -> Result<CameraId> {
        if self.fail_camera_spawns {
            return Err(RayMarchError::CameraCreationFailed {
                name: name.to_owned(),
                reason: "camera spawning disabled".into(),
            });
        }

        let mut state = CameraState::new_perspective(60.0, 1, 1, 0.3, 1000.0);
        state.name = Cow::Owned(name.to_owned());
        let camera = self.cameras.insert(HeadlessCamera { state, hide_flags });
        self.events.push(HostEvent::CameraSpawned {
            camera,
            name: name.to_owned(),
            hide_flags,
        });
        Ok(camera)
    }

    fn destroy_camera_immediate(&mut self, id: CameraId) {
        if self.cameras.remove(id).is_some() {
            self.events.push(HostEvent::CameraDestroyed(id));
        }
    }

    fn render_camera(&mut self, id: CameraId) -> Result<()> {
        let state = &self
            .cameras
            .get(id)
            .ok_or(RayMarchError::CameraNotFound(id))?
            .state;

        if let Some(handle) = state.target {
            let target = self.pool.get_mut(handle).ok_or_else(|| {
                RayMarchError::RenderFailed(format!("target {handle:?} is not active"))
            })?;
            match state.clear_flags {
                ClearFlags::SolidColor => {
                    target.color.clear(state.background_color);
                    target.clear_depth(1.0);
                }
                ClearFlags::DepthOnly | ClearFlags::Skybox => target.clear_depth(1.0),
                ClearFlags::Nothing => {}
            }
        }

        let render = CameraRender {
            camera: id,
            target: state.target,
            enabled: state.enabled,
            rendering_path: state.rendering_path,
            clear_flags: state.clear_flags,
            background_color: state.background_color,
            replacement_shader: state.replacement_shader.as_ref().map(|r| r.shader),
            culling_mask: state.culling_mask,
            view_matrix: state.view_matrix(),
            projection_matrix: state.projection_matrix(),
        };
        self.events.push(HostEvent::CameraRendered(render));
        Ok(())
    }
}

impl Blitter for HeadlessHost {
    fn blit(
        &mut self,
        source: ImageId,
        destination: ImageId,
        material: Option<(&Material, u32)>,
    ) -> Result<()> {
        let src = self
            .images
            .get(source)
            .ok_or(RayMarchError::ImageNotFound(source))?
            .clone();
        let dst = self
            .images
            .get_mut(destination)
            .ok_or(RayMarchError::ImageNotFound(destination))?;

        if (src.width(), src.height()) != (dst.width(), dst.height()) {
            return Err(RayMarchError::BlitSizeMismatch {
                src_size: (src.width(), src.height()),
                dst_size: (dst.width(), dst.height()),
            });
        }

        match material.and_then(|(m, _)| self.programs.get(&m.shader()).map(|p| (m, p))) {
            Some((m, program)) => program(m, &src, dst),
            None => dst.copy_from(&src),
        }

        self.events.push(HostEvent::Blit(BlitRecord {
            source,
            destination,
            material: material.map(|(m, pass)| (m.clone(), pass)),
        }));
        Ok(())
    }

    fn acquire_image(&mut self, width: u32, height: u32) -> Result<RenderImage> {
        let image = self.create_image(width, height)?;
        self.events.push(HostEvent::ImageAcquired(image.id));
        Ok(image)
    }

    fn release_image(&mut self, image: ImageId) {
        if self.images.remove(image).is_some() {
            self.events.push(HostEvent::ImageReleased(image));
        }
    }
}
