//! Front end for an indentation-sensitive macro language.
//!
//! Text is split into tokens, the tokens are folded into macro trees by an
//! indentation-tracking parser, and the trees are expanded against a registry
//! of macros.

pub mod ast;
pub mod builtins;
pub mod compiler;
pub mod config;
pub mod diagnostic;
pub mod error;
pub mod parser;
pub mod processor;
pub mod tokenizer;

pub use ast::{Argument, MacroNode, Position, Token, TokenKind};
pub use builtins::{Lazy, Log, Repeat, register_builtins};
pub use compiler::{Compilation, Compiler};
pub use config::CompilerConfig;
pub use diagnostic::{Diagnostic, DiagnosticKind, Severity};
pub use error::{Error, Result};
pub use parser::{LineState, Parser, parse};
pub use processor::{Expander, FnMacro, Macro, MacroName, MacroRegistry, expand};
pub use tokenizer::tokenize;
