//! Camera Effect Stack
//!
//! `CameraEffectStack` plays a camera's callback sequence for a list of
//! effects, for hosts that do not schedule effect hooks themselves.
//!
//! # Frame
//!
//! ```text
//! pre_cull ─► scene pass (host) ─► image effects ─► post_render
//!                                   │
//!                                   ├─ BeforeTransparent effects
//!                                   └─ PostProcess effects
//! ```
//!
//! Image effects are chained through intermediate images borrowed from the
//! host; the last effect writes the real destination. With no enabled image
//! effect the source is copied to the destination.

use smallvec::SmallVec;

use crate::camera::CameraId;
use crate::errors::Result;
use crate::host::{RenderHost, RenderImage};
use crate::pipeline::effect::CameraEffect;

struct Entry {
    effect: Box<dyn CameraEffect>,
    enabled: bool,
}

/// Ordered list of effects attached to one camera.
pub struct CameraEffectStack {
    camera: CameraId,
    entries: SmallVec<[Entry; 4]>,
}

impl CameraEffectStack {
    #[must_use]
    pub fn new(camera: CameraId) -> Self {
        Self {
            camera,
            entries: SmallVec::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn camera(&self) -> CameraId {
        self.camera
    }

    /// Attaches and enables an effect. Returns its index.
    pub fn push(&mut self, host: &mut dyn RenderHost, mut effect: Box<dyn CameraEffect>) -> usize {
        effect.on_enable(host);
        self.entries.push(Entry {
            effect,
            enabled: true,
        });
        self.entries.len() - 1
    }

    /// Enables or disables the effect at `index`. Out-of-range indices and
    /// no-op transitions are ignored.
    pub fn set_enabled(&mut self, host: &mut dyn RenderHost, index: usize, enabled: bool) {
        let Some(entry) = self.entries.get_mut(index) else {
            return;
        };
        if entry.enabled == enabled {
            return;
        }
        entry.enabled = enabled;
        if enabled {
            entry.effect.on_enable(host);
        } else {
            entry.effect.on_disable(host);
        }
    }

    #[must_use]
    pub fn is_enabled(&self, index: usize) -> bool {
        self.entries.get(index).is_some_and(|e| e.enabled)
    }

    /// Detaches the effect at `index`, disabling it first.
    pub fn remove(
        &mut self,
        host: &mut dyn RenderHost,
        index: usize,
    ) -> Option<Box<dyn CameraEffect>> {
        if index >= self.entries.len() {
            return None;
        }
        let mut entry = self.entries.remove(index);
        if entry.enabled {
            entry.effect.on_disable(host);
        }
        Some(entry.effect)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn effect_names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.effect.name())
    }

    // ── Frame hooks ─────────────────────────────────────────────────────────

    pub fn pre_cull(&mut self, host: &mut dyn RenderHost) {
        for entry in self.entries.iter_mut().filter(|e| e.enabled) {
            entry.effect.on_pre_cull(host);
        }
    }

    /// Runs every enabled image effect, ordered by stage then insertion.
    pub fn render_image(
        &mut self,
        host: &mut dyn RenderHost,
        source: RenderImage,
        destination: RenderImage,
    ) -> Result<()> {
        let mut order: SmallVec<[usize; 4]> = (0..self.entries.len())
            .filter(|&i| self.entries[i].enabled)
            .collect();
        order.sort_by_key(|&i| self.entries[i].effect.stage());

        let Some((&last, rest)) = order.split_last() else {
            return host.blit(source.id, destination.id, None);
        };

        let mut current = source;
        for &index in rest {
            let intermediate = match host.acquire_image(source.width, source.height) {
                Ok(image) => image,
                Err(e) => {
                    release_if_intermediate(host, current, source);
                    return Err(e);
                }
            };
            let entry = &mut self.entries[index];
            log::trace!("{} ({})", entry.effect.name(), entry.effect.stage().name());
            let result = entry.effect.on_render_image(host, current, intermediate);
            release_if_intermediate(host, current, source);
            if let Err(e) = result {
                host.release_image(intermediate.id);
                return Err(e);
            }
            current = intermediate;
        }

        let result = self.entries[last]
            .effect
            .on_render_image(host, current, destination);
        release_if_intermediate(host, current, source);
        result
    }

    pub fn post_render(&mut self, host: &mut dyn RenderHost) {
        for entry in self.entries.iter_mut().filter(|e| e.enabled) {
            entry.effect.on_post_render(host);
        }
    }

    /// One full camera frame. `scene_pass` draws the scene into `source`
    /// between culling and the image effects.
    pub fn render_frame<F>(
        &mut self,
        host: &mut dyn RenderHost,
        source: RenderImage,
        destination: RenderImage,
        scene_pass: F,
    ) -> Result<()>
    where
        F: FnOnce(&mut dyn RenderHost) -> Result<()>,
    {
        self.pre_cull(host);
        let result = match scene_pass(&mut *host) {
            Ok(()) => self.render_image(host, source, destination),
            Err(e) => Err(e),
        };
        // post-render runs even when drawing failed so per-frame resources
        // go back to their pools
        self.post_render(host);
        result
    }

    /// Disables every effect. Call before dropping the stack.
    pub fn shutdown(&mut self, host: &mut dyn RenderHost) {
        for entry in self.entries.iter_mut().filter(|e| e.enabled) {
            entry.enabled = false;
            entry.effect.on_disable(host);
        }
    }
}

fn release_if_intermediate(host: &mut dyn RenderHost, image: RenderImage, source: RenderImage) {
    if image.id != source.id {
        host.release_image(image.id);
    }
}
