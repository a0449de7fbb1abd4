//! Frame Graph System
//!
//! A declarative system for defining render passes as a directed acyclic graph (DAG).
//! Passes declare the textures they write and read; the graph derives their order,
//! the barriers between them and the render passes and framebuffers they render into.

pub mod barrier;
pub mod builder;
pub mod compiler;
mod executor;
pub mod graph;
pub mod pass;
pub mod resource;
pub mod sync;

pub use barrier::*;
pub use builder::resolve_size;
pub use compiler::{CompiledGraph, CompiledPass, Diagnostic, DiagnosticLevel};
pub use graph::*;
pub use pass::*;
pub use resource::*;
pub use sync::TextureAccess;
