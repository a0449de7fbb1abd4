//! Backend abstraction layer
//!
//! Provides the traits the frame graph drives and the types shared by every backend.

pub mod traits;
pub mod types;

#[cfg(feature = "dummy")]
pub mod dummy;

#[cfg(feature = "vulkan-backend")]
pub mod vulkan;

pub use traits::*;
pub use types::*;
