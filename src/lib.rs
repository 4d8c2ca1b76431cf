#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

pub mod camera;
pub mod errors;
pub mod headless;
pub mod host;
pub mod material;
pub mod pipeline;
pub mod pool;
pub mod raymarch;
pub mod settings;
pub mod utils;

pub use camera::{CameraId, CameraState, ClearFlags, DepthTextureMode, HideFlags, RenderingPath};
pub use errors::{RayMarchError, Result};
pub use headless::HeadlessHost;
pub use host::{
    Blitter, CameraBackend, ImageId, RenderHost, RenderImage, ShaderHandle, ShaderLibrary,
    TargetDesc, TargetHandle, TargetPool,
};
pub use material::{Material, MaterialParam};
pub use pipeline::{CameraEffect, CameraEffectStack, RenderStage};
pub use pool::{GpuTargetPool, TransientTargetPool};
pub use raymarch::{FramePhase, FrameReport, ScreenSpaceRayMarching};
pub use settings::RayMarchSettings;
