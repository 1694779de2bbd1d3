use crate::error::{Error, Result};

pub const DEFAULT_SIGIL: char = '$';

/// Nested macro invocations allowed before expansion gives up
pub const DEFAULT_MAX_EXPANSION_DEPTH: usize = 128;

/// Open macros the parser keeps on its frame stack, root included
pub const DEFAULT_MAX_NESTING_DEPTH: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompilerConfig {
    /// Character that, doubled, introduces a macro token
    pub sigil: char,
    pub max_expansion_depth: usize,
    pub max_nesting_depth: usize,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            sigil: DEFAULT_SIGIL,
            max_expansion_depth: DEFAULT_MAX_EXPANSION_DEPTH,
            max_nesting_depth: DEFAULT_MAX_NESTING_DEPTH,
        }
    }
}

impl CompilerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sigil(mut self, sigil: char) -> Self {
        self.sigil = sigil;
        self
    }

    pub fn with_max_expansion_depth(mut self, depth: usize) -> Self {
        self.max_expansion_depth = depth;
        self
    }

    pub fn with_max_nesting_depth(mut self, depth: usize) -> Self {
        self.max_nesting_depth = depth;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.sigil.is_whitespace() {
            return Err(Error::InvalidSigil(self.sigil));
        }
        Ok(())
    }

    /// Full token name of a macro, e.g. `log` -> `$$log`
    pub fn macro_name(&self, name: &str) -> String {
        format!("{0}{0}{name}", self.sigil)
    }
}
