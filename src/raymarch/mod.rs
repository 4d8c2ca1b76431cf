//! Screen-space ray marching with back-face depth
//!
//! - [`ScreenSpaceRayMarching`]: the per-camera effect and its frame hooks
//! - [`BackFaceCamera`]: the hidden camera rendering back-face depth
//! - [`compositor`]: screen-space projection, parameter binding, blit
//! - [`frame`]: frame phases and per-frame reports
//! - [`uniforms`]: GPU uniform layout of the bound parameters

pub mod backface;
pub mod compositor;
pub mod effect;
pub mod frame;
pub mod uniforms;

pub use backface::{BACK_FACE_CAMERA_NAME, BACK_FACE_CLEAR_COLOR, BackFaceCamera};
pub use compositor::{
    CameraMatrices, RAY_MARCH_PASS, bind_parameters, composite, screen_space_projection,
    viewport_matrix,
};
pub use effect::{BACK_FACE_DEPTH_SHADER, RAY_MARCHING_SHADER, ScreenSpaceRayMarching};
pub use frame::{BindSummary, CompositeOutcome, FramePhase, FrameReport};
pub use uniforms::{RAY_MARCH_UNIFORMS_WGSL, RayMarchUniforms};
