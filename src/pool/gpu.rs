//! wgpu-backed target allocation.

use crate::errors::{RayMarchError, Result};
use crate::host::TargetDesc;
use crate::pool::transient::{TargetAllocator, TransientTargetPool};

/// A colour texture with an optional depth attachment and their views.
pub struct GpuTarget {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub depth: Option<(wgpu::Texture, wgpu::TextureView)>,
}

/// Checks `desc` against the device's 2D texture limit and the colour/depth
/// format split.
pub fn validate_target_desc(desc: &TargetDesc, max_dimension: u32) -> Result<()> {
    let fail = |reason: String| RayMarchError::TargetAllocationFailed {
        width: desc.width,
        height: desc.height,
        format: desc.format,
        reason,
    };

    if desc.width == 0 || desc.height == 0 {
        return Err(fail("zero-sized target".into()));
    }
    if desc.width > max_dimension || desc.height > max_dimension {
        return Err(fail(format!("exceeds max texture dimension {max_dimension}")));
    }
    if desc.format.is_depth_stencil_format() {
        return Err(fail("colour format expected".into()));
    }
    if let Some(depth) = desc.depth_format
        && !depth.is_depth_stencil_format()
    {
        return Err(fail(format!("{depth:?} is not a depth format")));
    }
    Ok(())
}

/// Creates pooled targets on a `wgpu::Device`.
pub struct GpuTargetAllocator {
    device: wgpu::Device,
}

impl GpuTargetAllocator {
    #[must_use]
    pub fn new(device: wgpu::Device) -> Self {
        Self { device }
    }

    fn create_texture(
        &self,
        desc: &TargetDesc,
        format: wgpu::TextureFormat,
        usage: wgpu::TextureUsages,
    ) -> (wgpu::Texture, wgpu::TextureView) {
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(desc.label.as_ref()),
            size: wgpu::Extent3d {
                width: desc.width,
                height: desc.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        (texture, view)
    }
}

impl TargetAllocator for GpuTargetAllocator {
    type Target = GpuTarget;

    fn allocate(&mut self, desc: &TargetDesc) -> Result<GpuTarget> {
        validate_target_desc(desc, self.device.limits().max_texture_dimension_2d)?;

        let (texture, view) = self.create_texture(desc, desc.format, desc.usage);
        let depth = desc.depth_format.map(|format| {
            self.create_texture(desc, format, wgpu::TextureUsages::RENDER_ATTACHMENT)
        });

        Ok(GpuTarget {
            texture,
            view,
            depth,
        })
    }
}

/// Transient pool of GPU render targets.
pub type GpuTargetPool = TransientTargetPool<GpuTargetAllocator>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn back_face_desc_is_valid() {
        assert!(validate_target_desc(&TargetDesc::back_face_depth(512, 512), 8192).is_ok());
        assert!(validate_target_desc(&TargetDesc::back_face_depth(8192, 1), 8192).is_ok());
    }

    #[test]
    fn rejects_zero_size() {
        let err = validate_target_desc(&TargetDesc::back_face_depth(0, 64), 8192);
        assert!(matches!(
            err,
            Err(RayMarchError::TargetAllocationFailed { width: 0, .. })
        ));
    }

    #[test]
    fn rejects_oversize() {
        let err = validate_target_desc(&TargetDesc::back_face_depth(64, 4097), 4096);
        assert!(matches!(
            err,
            Err(RayMarchError::TargetAllocationFailed { height: 4097, .. })
        ));
    }

    #[test]
    fn rejects_swapped_formats() {
        let mut desc = TargetDesc::back_face_depth(64, 64);
        desc.depth_format = Some(wgpu::TextureFormat::R16Float);
        assert!(validate_target_desc(&desc, 8192).is_err());

        let mut desc = TargetDesc::back_face_depth(64, 64);
        desc.format = wgpu::TextureFormat::Depth32Float;
        assert!(validate_target_desc(&desc, 8192).is_err());

        let mut desc = TargetDesc::back_face_depth(64, 64);
        desc.depth_format = None;
        assert!(validate_target_desc(&desc, 8192).is_ok());
    }
}
