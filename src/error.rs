//! Typed errors for loaders, selectors and stats sinks.

use crate::SelectorKind;
use thiserror::Error;

/// Error raised by a stats sink; opaque to this crate and propagated as-is.
pub type SinkError = Box<dyn std::error::Error + Send + Sync>;

/// Errors surfaced by [`ItemLoader`](crate::ItemLoader) and the selector layer.
#[derive(Debug, Error)]
pub enum Error {
    /// The loader was built without a document scope, so there is nothing to query.
    #[error("{loader} has no selector bound: construct it with a document scope before querying")]
    MissingSelector { loader: &'static str },

    /// A rule expression could not be compiled for its selector kind.
    #[error("invalid {kind} expression {expression:?}: {reason}")]
    InvalidSelector { kind: SelectorKind, expression: String, reason: String },

    /// A scope query selected text or attributes instead of elements.
    #[error("scope expression {expression:?} must select elements, not text or attributes")]
    InvalidScope { expression: String },

    /// The stats sink rejected an increment.
    #[error("stats sink failed to record {label:?}")]
    Sink {
        label: String,
        #[source]
        source: SinkError,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    pub(crate) fn invalid_selector(kind: SelectorKind, expression: &str, reason: impl Into<String>) -> Self {
        Error::InvalidSelector { kind, expression: expression.to_string(), reason: reason.into() }
    }
}
