//! Camera effect scheduling
//!
//! - [`RenderStage`]: where an image effect runs in the camera's frame
//! - [`CameraEffect`]: the hook surface hosts drive
//! - [`CameraEffectStack`]: a ready-made driver for those hooks

pub mod effect;
pub mod stack;
pub mod stage;

pub use effect::CameraEffect;
pub use stack::CameraEffectStack;
pub use stage::RenderStage;
