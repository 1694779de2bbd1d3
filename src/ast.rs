use std::fmt;

/// Line/column of a token in the source text (1-based, columns count characters)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Lexical token kinds
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// Macro invocation, name includes both sigils: `$$log`
    Macro(String),
    /// Line break (`\n` or `\r\n`)
    Line,
    /// Leading whitespace of a line, measured in characters
    Indent(usize),
    /// Literal text up to the next macro token or the end of the line
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub position: Position,
}

impl Token {
    pub fn new(kind: TokenKind, position: Position) -> Self {
        Self { kind, position }
    }
}

/// A macro invocation and its ordered arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroNode {
    pub name: String,
    pub arguments: Vec<Argument>,
    pub position: Position,
}

impl MacroNode {
    pub fn new(name: impl Into<String>, position: Position) -> Self {
        Self {
            name: name.into(),
            arguments: Vec::new(),
            position,
        }
    }

    /// Builds a node with the given arguments, used when assembling trees by hand
    pub fn with_arguments(name: impl Into<String>, arguments: Vec<Argument>) -> Self {
        Self {
            name: name.into(),
            arguments,
            position: Position::default(),
        }
    }

    /// Levels of macros from this node down to its deepest descendant, this
    /// node included. Quoted lists do not add a level.
    pub fn nesting_depth(&self) -> usize {
        1 + nesting_depth(&self.arguments)
    }
}

/// Deepest chain of nested macros in `items`, walked with an explicit stack
pub fn nesting_depth(items: &[Argument]) -> usize {
    let mut deepest = 0;
    let mut pending: Vec<(&Argument, usize)> = items.iter().map(|item| (item, 1)).collect();
    while let Some((item, level)) = pending.pop() {
        match item {
            Argument::Text(_) => {}
            Argument::Macro(node) => {
                deepest = deepest.max(level);
                pending.extend(node.arguments.iter().map(|child| (child, level + 1)));
            }
            Argument::Quoted(quoted) => {
                pending.extend(quoted.iter().map(|child| (child, level)));
            }
        }
    }
    deepest
}

// Deep trees would otherwise be freed recursively, one stack frame per level.
impl Drop for MacroNode {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.arguments);
        while let Some(argument) = pending.pop() {
            match argument {
                Argument::Macro(mut node) => pending.append(&mut node.arguments),
                Argument::Quoted(mut quoted) => pending.append(&mut quoted),
                Argument::Text(_) => {}
            }
        }
    }
}

/// Macro argument, and the value type produced by expansion
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Argument {
    Text(String),
    Macro(MacroNode),
    /// Emitted as-is by the expander; its contents are never expanded in place.
    /// Transformers use this to hand unevaluated arguments to their evaluator.
    Quoted(Vec<Argument>),
}

impl Argument {
    pub fn text(text: impl Into<String>) -> Self {
        Argument::Text(text.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Argument::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_macro(&self) -> Option<&MacroNode> {
        match self {
            Argument::Macro(node) => Some(node),
            _ => None,
        }
    }
}

impl From<&str> for Argument {
    fn from(text: &str) -> Self {
        Argument::Text(text.to_owned())
    }
}

impl From<String> for Argument {
    fn from(text: String) -> Self {
        Argument::Text(text)
    }
}

impl From<MacroNode> for Argument {
    fn from(node: MacroNode) -> Self {
        Argument::Macro(node)
    }
}

impl fmt::Display for MacroNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        for arg in &self.arguments {
            match arg {
                // inline text already carries its separating whitespace
                Argument::Text(text) => f.write_str(text)?,
                other => write!(f, " {other}")?,
            }
        }
        Ok(())
    }
}

impl fmt::Display for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Argument::Text(text) => f.write_str(text),
            Argument::Macro(node) => fmt::Display::fmt(node, f),
            Argument::Quoted(items) => {
                for item in items {
                    fmt::Display::fmt(item, f)?;
                }
                Ok(())
            }
        }
    }
}
