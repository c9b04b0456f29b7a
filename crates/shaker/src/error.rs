use swc_core::common::Span;
use thiserror::Error;

/// Errors that abort a single module's transform.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ShakeError {
    #[error("Export {name:?} is requested to be kept but the module does not export it")]
    RootNotFound { name: String },
    #[error("Identifier {name:?} has already been declared: first at {first:?}, again at {second:?}")]
    DuplicateBinding {
        name: String,
        first: Span,
        second: Span,
    },
    #[error("Unsupported construct: {construct} at {span:?}")]
    UnsupportedConstruct { construct: String, span: Span },
}

impl ShakeError {
    pub(crate) fn unsupported(construct: impl Into<String>, span: Span) -> Self {
        ShakeError::UnsupportedConstruct {
            construct: construct.into(),
            span,
        }
    }
}
