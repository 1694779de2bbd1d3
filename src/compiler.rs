use crate::ast::{Argument, MacroNode, Token};
use crate::config::CompilerConfig;
use crate::diagnostic::Diagnostic;
use crate::error::Result;
use crate::parser::Parser;
use crate::processor::{Expander, MacroRegistry};
use crate::tokenizer::tokenize;

/// Roots of a parsed source and the warnings and notes raised on the way
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Compilation {
    pub roots: Vec<MacroNode>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Front end bound to one configuration: text in, macro trees or output values out
#[derive(Debug, Clone, Default)]
pub struct Compiler {
    config: CompilerConfig,
}

impl Compiler {
    pub fn new(config: CompilerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    pub fn tokenize(&self, text: &str) -> Result<Vec<Token>> {
        tokenize(text, self.config.sigil)
    }

    pub fn compile(&self, text: &str) -> Result<Compilation> {
        let tokens = self.tokenize(text)?;
        let mut parser = Parser::with_max_depth(self.config.max_nesting_depth);
        let roots = parser.parse(tokens)?;
        tracing::debug!(
            roots = roots.len(),
            diagnostics = parser.diagnostics().len(),
            "compiled source"
        );
        Ok(Compilation {
            roots,
            diagnostics: parser.diagnostics().to_vec(),
        })
    }

    /// Expander honouring the configured depth limit
    pub fn expander<'r, E>(&self, registry: &'r MacroRegistry<E>) -> Expander<'r, E> {
        Expander::with_max_depth(registry, self.config.max_expansion_depth)
    }

    /// Compile `text` and expand the result against `registry`
    pub fn run<E>(
        &self,
        text: &str,
        registry: &MacroRegistry<E>,
        env: &mut E,
    ) -> Result<Vec<Argument>> {
        let compilation = self.compile(text)?;
        self.expander(registry).expand_nodes(&compilation.roots, env)
    }
}
