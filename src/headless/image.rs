//! CPU images and targets for the headless host.

use glam::Vec4;
use half::f16;
use smallvec::SmallVec;

use crate::errors::{RayMarchError, Result};
use crate::host::TargetDesc;
use crate::pool::{TargetAllocator, validate_target_desc};

type Texel = SmallVec<[u8; 16]>;

fn texel_size(format: wgpu::TextureFormat) -> Option<usize> {
    use wgpu::TextureFormat as F;
    match format {
        F::R16Float => Some(2),
        F::R32Float | F::Rgba8Unorm | F::Rgba8UnormSrgb | F::Bgra8Unorm => Some(4),
        F::Rgba16Float => Some(8),
        F::Rgba32Float => Some(16),
        _ => None,
    }
}

fn unorm8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

fn encode(format: wgpu::TextureFormat, c: Vec4) -> Texel {
    use wgpu::TextureFormat as F;
    let mut out = Texel::new();
    match format {
        F::R16Float => out.extend_from_slice(&f16::from_f32(c.x).to_le_bytes()),
        F::R32Float => out.extend_from_slice(&c.x.to_le_bytes()),
        F::Rgba8Unorm | F::Rgba8UnormSrgb => {
            out.extend([unorm8(c.x), unorm8(c.y), unorm8(c.z), unorm8(c.w)]);
        }
        F::Bgra8Unorm => out.extend([unorm8(c.z), unorm8(c.y), unorm8(c.x), unorm8(c.w)]),
        F::Rgba16Float => {
            for v in c.to_array() {
                out.extend_from_slice(&f16::from_f32(v).to_le_bytes());
            }
        }
        F::Rgba32Float => {
            for v in c.to_array() {
                out.extend_from_slice(&v.to_le_bytes());
            }
        }
        _ => {}
    }
    out
}

fn decode(format: wgpu::TextureFormat, b: &[u8]) -> Vec4 {
    use wgpu::TextureFormat as F;
    let h = |i: usize| f16::from_le_bytes([b[i], b[i + 1]]).to_f32();
    let f = |i: usize| f32::from_le_bytes([b[i], b[i + 1], b[i + 2], b[i + 3]]);
    let n = |i: usize| f32::from(b[i]) / 255.0;
    match format {
        F::R16Float => Vec4::new(h(0), 0.0, 0.0, 1.0),
        F::R32Float => Vec4::new(f(0), 0.0, 0.0, 1.0),
        F::Rgba8Unorm | F::Rgba8UnormSrgb => Vec4::new(n(0), n(1), n(2), n(3)),
        F::Bgra8Unorm => Vec4::new(n(2), n(1), n(0), n(3)),
        F::Rgba16Float => Vec4::new(h(0), h(2), h(4), h(6)),
        F::Rgba32Float => Vec4::new(f(0), f(4), f(8), f(12)),
        _ => Vec4::ZERO,
    }
}

/// A tightly packed 2D image in host memory.
#[derive(Debug, Clone, PartialEq)]
pub struct CpuImage {
    width: u32,
    height: u32,
    format: wgpu::TextureFormat,
    data: Vec<u8>,
}

impl CpuImage {
    /// Creates a zero-filled image. Fails for formats the headless host
    /// cannot store.
    pub fn new(width: u32, height: u32, format: wgpu::TextureFormat) -> Result<Self> {
        let texel = texel_size(format).ok_or_else(|| RayMarchError::TargetAllocationFailed {
            width,
            height,
            format,
            reason: "format not supported by the headless host".into(),
        })?;
        Ok(Self {
            width,
            height,
            format,
            data: vec![0; width as usize * height as usize * texel],
        })
    }

    #[inline]
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    #[must_use]
    pub fn format(&self) -> wgpu::TextureFormat {
        self.format
    }

    #[inline]
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    fn texel_range(&self, x: u32, y: u32) -> std::ops::Range<usize> {
        let size = self.data.len() / (self.width as usize * self.height as usize).max(1);
        let start = (y as usize * self.width as usize + x as usize) * size;
        start..start + size
    }

    /// Fills every texel with `color`.
    pub fn clear(&mut self, color: Vec4) {
        let texel = encode(self.format, color);
        for chunk in self.data.chunks_exact_mut(texel.len()) {
            chunk.copy_from_slice(&texel);
        }
    }

    #[must_use]
    pub fn read(&self, x: u32, y: u32) -> Vec4 {
        decode(self.format, &self.data[self.texel_range(x, y)])
    }

    pub fn write(&mut self, x: u32, y: u32, color: Vec4) {
        let range = self.texel_range(x, y);
        self.data[range].copy_from_slice(&encode(self.format, color));
    }

    /// Copies the overlapping region of `other` into `self`. Same-format,
    /// same-size copies are byte exact; otherwise texels are converted.
    pub fn copy_from(&mut self, other: &CpuImage) {
        if self.format == other.format
            && (self.width, self.height) == (other.width, other.height)
        {
            self.data.clone_from(&other.data);
            return;
        }
        for y in 0..self.height.min(other.height) {
            for x in 0..self.width.min(other.width) {
                self.write(x, y, other.read(x, y));
            }
        }
    }
}

/// A pooled render target: colour plus optional depth.
#[derive(Debug, Clone)]
pub struct CpuTarget {
    pub color: CpuImage,
    pub depth: Option<Vec<f32>>,
}

impl CpuTarget {
    pub fn clear_depth(&mut self, value: f32) {
        if let Some(depth) = &mut self.depth {
            depth.fill(value);
        }
    }
}

/// Allocates [`CpuTarget`]s, refusing anything above `max_dimension`.
#[derive(Debug, Clone)]
pub struct CpuAllocator {
    pub max_dimension: u32,
}

impl Default for CpuAllocator {
    fn default() -> Self {
        Self { max_dimension: 8192 }
    }
}

impl TargetAllocator for CpuAllocator {
    type Target = CpuTarget;

    fn allocate(&mut self, desc: &TargetDesc) -> Result<CpuTarget> {
        validate_target_desc(desc, self.max_dimension)?;

        let color = CpuImage::new(desc.width, desc.height, desc.format)?;
        let depth = desc
            .depth_format
            .map(|_| vec![1.0; desc.width as usize * desc.height as usize]);
        Ok(CpuTarget { color, depth })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn r16_float_clear_reads_back() {
        let mut img = CpuImage::new(4, 2, wgpu::TextureFormat::R16Float).unwrap();
        img.clear(Vec4::ONE);
        assert_eq!(img.data().len(), 4 * 2 * 2);
        assert_eq!(img.read(3, 1).x, 1.0);
    }

    #[test]
    fn rgba8_write_read() {
        let mut img = CpuImage::new(2, 2, wgpu::TextureFormat::Rgba8Unorm).unwrap();
        img.write(1, 0, Vec4::new(1.0, 0.0, 0.0, 1.0));
        assert_eq!(img.read(1, 0), Vec4::new(1.0, 0.0, 0.0, 1.0));
        assert_eq!(img.read(0, 0), Vec4::ZERO);
    }

    #[test]
    fn copy_from_larger_image_keeps_own_size() {
        let mut big = CpuImage::new(4, 4, wgpu::TextureFormat::Rgba8Unorm).unwrap();
        big.clear(Vec4::new(0.0, 0.0, 1.0, 1.0));
        big.write(1, 1, Vec4::new(1.0, 0.0, 0.0, 1.0));

        let mut small = CpuImage::new(2, 2, wgpu::TextureFormat::Rgba8Unorm).unwrap();
        small.copy_from(&big);

        assert_eq!((small.width(), small.height()), (2, 2));
        assert_eq!(small.data().len(), 2 * 2 * 4);
        assert_eq!(small.read(1, 1), Vec4::new(1.0, 0.0, 0.0, 1.0));
        assert_eq!(small.read(0, 1), Vec4::new(0.0, 0.0, 1.0, 1.0));
    }

    #[test]
    fn same_size_copy_is_byte_exact() {
        let mut src = CpuImage::new(3, 2, wgpu::TextureFormat::R16Float).unwrap();
        src.write(2, 1, Vec4::splat(0.3));
        let mut dst = CpuImage::new(3, 2, wgpu::TextureFormat::R16Float).unwrap();
        dst.copy_from(&src);
        assert_eq!(dst, src);
    }

    #[test]
    fn unsupported_format_is_an_error() {
        assert!(CpuImage::new(2, 2, wgpu::TextureFormat::Depth24Plus).is_err());
    }

    #[test]
    fn allocator_respects_max_dimension() {
        let mut alloc = CpuAllocator { max_dimension: 256 };
        assert!(alloc.allocate(&TargetDesc::back_face_depth(512, 512)).is_err());
        let target = alloc.allocate(&TargetDesc::back_face_depth(256, 128)).unwrap();
        assert_eq!(target.color.width(), 256);
        assert!(target.depth.is_some());
    }
}
