//! Transient render-target pooling.
//!
//! - [`TransientTargetPool`]: generic pool with generational handles
//! - [`GpuTargetAllocator`]: `wgpu` storage for the pool
//!
//! Hosts that already own a pool only need to implement
//! [`TargetPool`](crate::host::TargetPool); these types are for hosts that
//! don't.

pub mod gpu;
pub mod transient;

pub use gpu::{GpuTarget, GpuTargetAllocator, GpuTargetPool, validate_target_desc};
pub use transient::{TargetAllocator, TransientTargetPool};
