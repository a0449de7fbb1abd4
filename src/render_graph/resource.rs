//! Texture declarations and their compiled annotations

use crate::backend::types::*;
use crate::backend::TextureHandle;

/// A texture written by a pass, with the value it is cleared to when it is
/// written for the first time in a frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PassOutput {
    pub texture: TextureHandle,
    pub clear_value: ClearValue,
}

/// Layout transition a pass applies to one texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderTarget {
    pub texture: TextureHandle,
    /// Layout the texture is in when the pass starts
    pub src_layout: ImageLayout,
    /// Layout the pass leaves the texture in
    pub dst_layout: ImageLayout,
}

/// Load/store behaviour of one output attachment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttachmentDescriptor {
    pub load_op: LoadOp,
    pub store_op: StoreOp,
    pub clear_value: ClearValue,
}

impl AttachmentDescriptor {
    /// First write of the frame: contents are cleared.
    pub fn cleared(clear_value: ClearValue) -> Self {
        Self {
            load_op: LoadOp::Clear,
            store_op: StoreOp::Store,
            clear_value,
        }
    }

    /// Later write: previous contents are kept.
    pub fn loaded(clear_value: ClearValue) -> Self {
        Self {
            load_op: LoadOp::Load,
            store_op: StoreOp::Store,
            clear_value,
        }
    }
}
