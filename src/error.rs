//! Frame graph error types.

use thiserror::Error;

use crate::backend::{BackendError, TextureHandle};

/// Broad classification of a [`FrameGraphError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The declared graph is invalid or was used out of order. Fixing it needs a
    /// change to the graph, not a retry.
    Structural,
    /// The device failed to create a render pass, framebuffer or pipeline.
    ResourceBuild,
}

/// Errors reported by compile, build and execute.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameGraphError {
    #[error("more than one pass is named `{0}`")]
    DuplicatePassName(String),
    #[error("pass `{pass}` reads {texture:?} but no pass writes it")]
    UnresolvedRead { pass: String, texture: TextureHandle },
    #[error("cyclic dependency through pass `{0}`")]
    CyclicDependency(String),
    #[error("pass `{pass}` writes {texture:?} which is not registered")]
    UnknownTexture { pass: String, texture: TextureHandle },
    #[error("pass `{pass}` writes {texture:?} which has neither color nor depth attachment usage")]
    InvalidAttachmentUsage { pass: String, texture: TextureHandle },
    #[error("pass `{0}` has no attachments to build a render pass from")]
    MissingAttachments(String),
    #[error("frame graph has changes that were not compiled")]
    NotCompiled,
    #[error("pass `{0}` was compiled but not built")]
    NotBuilt(String),
    #[error("failed to build pass `{pass}`: {source}")]
    ResourceBuild {
        pass: String,
        #[source]
        source: BackendError,
    },
}

impl FrameGraphError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ResourceBuild { .. } => ErrorKind::ResourceBuild,
            _ => ErrorKind::Structural,
        }
    }

    pub fn is_structural(&self) -> bool {
        self.kind() == ErrorKind::Structural
    }
}

pub type FrameGraphResult<T> = Result<T, FrameGraphError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FrameGraphError::DuplicatePassName("Opaque".to_string());
        assert_eq!(err.to_string(), "more than one pass is named `Opaque`");

        let err = FrameGraphError::UnresolvedRead {
            pass: "Post".to_string(),
            texture: TextureHandle::from_raw(4),
        };
        assert_eq!(err.to_string(), "pass `Post` reads TextureHandle(4) but no pass writes it");
    }

    #[test]
    fn test_error_kind() {
        assert!(FrameGraphError::CyclicDependency("A".into()).is_structural());
        assert!(FrameGraphError::NotCompiled.is_structural());

        let err = FrameGraphError::ResourceBuild {
            pass: "Shadow".into(),
            source: BackendError::OutOfMemory,
        };
        assert_eq!(err.kind(), ErrorKind::ResourceBuild);
        assert_eq!(err.to_string(), "failed to build pass `Shadow`: Out of memory");
    }
}
