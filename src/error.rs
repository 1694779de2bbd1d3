use thiserror::Error;

use crate::ast::Position;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Fatal conditions. Any of these aborts the current tokenize, parse or expand call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("sigil {0:?} must not be whitespace")]
    InvalidSigil(char),

    #[error("[tokenizer] invalid token at {position}")]
    InvalidToken { position: Position },

    #[error("[parser] double indent in a line at {position}")]
    DoubleIndent { position: Position },

    #[error("[parser] indent after text at {position}")]
    IndentAfterText { position: Position },

    #[error("[parser] indent after macro at {position}")]
    IndentAfterMacro { position: Position },

    #[error(
        "[syntax] text at {position} starts with zero indent, it cannot be a macro argument"
    )]
    TextAtZeroIndent { position: Position },

    #[error("[syntax] no macro matches the indent of {indent} at {position}")]
    NoMacroMatchesIndent { indent: usize, position: Position },

    #[error("[parser] macros nested deeper than {depth} levels at {position}")]
    NestingTooDeep { depth: usize, position: Position },

    /// A frame was requested while none was open. Only reachable through a parser bug.
    #[error("[internal] parent macro frame not found at {position}")]
    FrameStackUnderflow { position: Position },

    #[error("[executor] macro `{name}` not found at {position}")]
    MacroNotFound { name: String, position: Position },

    #[error(
        "[executor] first argument of repeat should be a non-negative integer, got {value:?}"
    )]
    InvalidRepeatCount { value: String },

    #[error("[executor] repeat expects a count argument")]
    RepeatCountMissing,

    #[error("[executor] maximum expansion depth of {depth} exceeded")]
    ExpansionDepthExceeded { depth: usize },

    /// Failure raised by a registered transformer or evaluator
    #[error("[macro] {0}")]
    Custom(String),
}

impl Error {
    pub fn custom(message: impl Into<String>) -> Self {
        Error::Custom(message.into())
    }

    /// Source position the error points at, when it has one
    pub fn position(&self) -> Option<Position> {
        match self {
            Error::InvalidToken { position }
            | Error::DoubleIndent { position }
            | Error::IndentAfterText { position }
            | Error::IndentAfterMacro { position }
            | Error::TextAtZeroIndent { position }
            | Error::NoMacroMatchesIndent { position, .. }
            | Error::NestingTooDeep { position, .. }
            | Error::FrameStackUnderflow { position }
            | Error::MacroNotFound { position, .. } => Some(*position),
            _ => None,
        }
    }
}
