//! Simplifier Errors

use thiserror::Error;

/// A failure that stops a whole compilation unit from being simplified.
///
/// Everything else the engine runs into (unclassifiable call shapes, unsafe
/// removals, conflicting rewrites) is handled locally by leaving the original
/// code in place, so it never shows up here.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SimplifyError {
    /// The input is not syntactically valid.
    #[error("Parse error: {message} (at byte {offset})")]
    Parse { message: String, offset: u32 },

    /// An override rule carries a glob that cannot be compiled.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl SimplifyError {
    pub fn parse(message: impl Into<String>, offset: u32) -> Self {
        Self::Parse {
            message: message.into(),
            offset,
        }
    }
}

/// Why a planned site edit was rolled back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RewriteConflict {
    /// The rewritten call no longer parses as an expression.
    InvalidSyntax(String),
    /// The rewritten call no longer classifies as a decoration site.
    LostShape,
    /// Retained decorations differ from the plan (count, order or source text).
    DecorationsChanged,
    /// A parameter decorator's index moved.
    ParameterIndexChanged { expected: u32, found: u32 },
}

impl std::fmt::Display for RewriteConflict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidSyntax(message) => write!(f, "rewritten call is not valid syntax: {message}"),
            Self::LostShape => write!(f, "rewritten call is no longer a decoration site"),
            Self::DecorationsChanged => write!(f, "retained decorations differ from the plan"),
            Self::ParameterIndexChanged { expected, found } => {
                write!(f, "parameter index changed from {expected} to {found}")
            }
        }
    }
}
