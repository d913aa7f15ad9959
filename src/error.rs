use anyhow::Error as AnyhowError;
use thiserror::Error;

/// Result alias for errors emitted by BSL Clippy internals.
pub type ClippyResult<T> = Result<T, BslClippyError>;

/// Structured error type for BSL Clippy subsystems.
#[derive(Debug, Error)]
pub enum BslClippyError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid AST snapshot: {0}")]
    Ast(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl BslClippyError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Convert to anyhow::Error for interop with anyhow-based code.
    pub fn into_anyhow(self) -> AnyhowError {
        AnyhowError::new(self)
    }
}

impl From<AnyhowError> for BslClippyError {
    fn from(err: AnyhowError) -> Self {
        BslClippyError::other(err.to_string())
    }
}

/// Recoverable conditions met while analyzing a single candidate node.
///
/// None of these abort a lint run: the candidate is skipped (no issue, no
/// edit) and analysis continues with the next one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    /// The node has no backing text (synthesized node or stale span).
    #[error("node has no concrete syntax")]
    NoConcreteSyntax,

    /// Call text without an argument list where one is required.
    #[error("malformed call text: {0}")]
    MalformedCallText(String),

    /// No enclosing routine/module could be determined for the node.
    #[error("cannot determine containing scope: {0}")]
    AmbiguousContainingScope(String),

    /// The driver requested cancellation.
    #[error("analysis cancelled")]
    Cancelled,
}

impl AnalysisError {
    pub fn malformed(text: impl Into<String>) -> Self {
        Self::MalformedCallText(text.into())
    }

    pub fn ambiguous_scope(what: impl Into<String>) -> Self {
        Self::AmbiguousContainingScope(what.into())
    }
}

/// Convenience macro mirroring `anyhow::bail!` but returning BslClippyError.
#[macro_export]
macro_rules! clippy_bail {
    ($($arg:tt)*) => {
        return Err($crate::error::BslClippyError::other(format!($($arg)*)));
    };
}

/// Convenience macro mirroring `anyhow::ensure!`.
#[macro_export]
macro_rules! clippy_ensure {
    ($cond:expr, $($arg:tt)*) => {
        if !($cond) {
            $crate::clippy_bail!($($arg)*);
        }
    };
}
