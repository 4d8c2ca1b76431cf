//! In-memory host for tests, tools and CI.
//!
//! - [`HeadlessHost`]: implements every host trait, records an event log
//! - [`CpuImage`] / [`CpuTarget`]: host-memory pixel storage

pub mod host;
pub mod image;

pub use host::{BlitRecord, CameraRender, HeadlessHost, HostEvent, ShaderProgram};
pub use image::{CpuAllocator, CpuImage, CpuTarget};
