//! Error Types
//!
//! This module defines the error types used throughout the crate.
//!
//! # Overview
//!
//! The main error type [`RayMarchError`] covers the failure modes of the
//! per-frame orchestration:
//! - Attach-time configuration errors (missing primary camera)
//! - Transient render-target allocation failures
//! - Host camera and blit failures
//! - Settings parsing errors
//!
//! Most per-frame failures are absorbed by the effect itself (it degrades to
//! "no back-face depth" or to a pass-through blit); they only surface as
//! values of this type at the host trait boundary.
//!
//! # Usage
//!
//! ```rust,ignore
//! use myth_raymarch::errors::{RayMarchError, Result};
//!
//! fn attach() -> Result<()> {
//!     Ok(())
//! }
//! ```

use thiserror::Error;

use crate::camera::CameraId;
use crate::host::ImageId;

/// The main error type for the ray marching orchestration.
#[derive(Error, Debug)]
pub enum RayMarchError {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// The camera the effect was attached to does not exist on the host.
    #[error("Primary camera {0:?} not found; the effect must be attached to a camera")]
    MissingPrimaryCamera(CameraId),

    /// Settings could not be parsed.
    #[error("Settings parse error: {0}")]
    SettingsParse(#[from] serde_json::Error),

    // ========================================================================
    // Resource Errors
    // ========================================================================
    /// The transient pool could not provide a render target.
    #[error("Failed to allocate transient target {width}x{height} ({format:?}): {reason}")]
    TargetAllocationFailed {
        /// Requested width in pixels
        width: u32,
        /// Requested height in pixels
        height: u32,
        /// Requested colour format
        format: wgpu::TextureFormat,
        /// Backend-specific explanation
        reason: String,
    },

    /// An image handle passed to the host is unknown or was already released.
    #[error("Image {0:?} not found")]
    ImageNotFound(ImageId),

    /// Source and destination images of a blit have mismatched layouts.
    #[error("Blit size mismatch: source {src_size:?}, destination {dst_size:?}")]
    BlitSizeMismatch {
        /// Source size (width, height)
        src_size: (u32, u32),
        /// Destination size (width, height)
        dst_size: (u32, u32),
    },

    // ========================================================================
    // Camera Errors
    // ========================================================================
    /// The host refused to spawn a camera.
    #[error("Failed to create camera '{name}': {reason}")]
    CameraCreationFailed {
        /// Requested camera name
        name: String,
        /// Backend-specific explanation
        reason: String,
    },

    /// A camera handle is unknown or was already destroyed.
    #[error("Camera {0:?} not found")]
    CameraNotFound(CameraId),

    /// A camera render could not be issued.
    #[error("Camera render failed: {0}")]
    RenderFailed(String),
}

/// Alias for `Result<T, RayMarchError>`.
pub type Result<T> = std::result::Result<T, RayMarchError>;
