//! Indentation parser.
//!
//! Tokens drive a small automaton over [`LineState`]. Open macros live on a
//! stack of [`Frame`]s; each frame owns the node it builds and hands it to its
//! parent's argument list (or to the roots) when it is closed, after which the
//! node is never touched again.

use crate::ast::{Argument, MacroNode, Position, Token, TokenKind};
use crate::config::DEFAULT_MAX_NESTING_DEPTH;
use crate::diagnostic::{Diagnostic, DiagnosticKind};
use crate::error::{Error, Result};

/// Parameter indent of a frame whose block arguments have not started yet
const UNSET_INDENT: usize = usize::MAX;

/// What the automaton knows about the current line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineState {
    /// Start of a line following text (or the start of input)
    Initial,
    /// Start of a line following a macro; it may open a block for that macro
    BlockInitial,
    /// After an indent in `Initial`
    Indent,
    /// After an indent in `BlockInitial`
    BlockIndent,
    Text,
    Macro,
}

/// Outcome of feeding one token to the automaton
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Consume(LineState),
    /// Switch state and feed the same token again
    Reprocess(LineState),
}

#[derive(Debug)]
struct Frame {
    node: MacroNode,
    /// Column the invocation itself belongs to
    indent: usize,
    /// Column block arguments must start at, `UNSET_INDENT` until discovered
    parameter_indent: usize,
}

impl Frame {
    fn new(node: MacroNode, indent: usize) -> Self {
        Self {
            node,
            indent,
            parameter_indent: UNSET_INDENT,
        }
    }
}

/// Builds macro trees from a token stream
#[derive(Debug)]
pub struct Parser {
    state: LineState,
    frames: Vec<Frame>,
    roots: Vec<MacroNode>,
    diagnostics: Vec<Diagnostic>,
    max_depth: usize,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    pub fn new() -> Self {
        Self::with_max_depth(DEFAULT_MAX_NESTING_DEPTH)
    }

    /// Parser that fails with [`Error::NestingTooDeep`] once more than
    /// `max_depth` macros are open at the same time
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            state: LineState::Initial,
            frames: Vec::new(),
            roots: Vec::new(),
            diagnostics: Vec::new(),
            max_depth,
        }
    }

    /// Warnings and notes from the last call to [`Parser::parse`]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Parse `tokens` into the ordered list of root macro invocations
    pub fn parse(&mut self, tokens: impl IntoIterator<Item = Token>) -> Result<Vec<MacroNode>> {
        self.state = LineState::Initial;
        self.frames.clear();
        self.roots.clear();
        self.diagnostics.clear();

        let result = self.run(tokens);
        let roots = std::mem::take(&mut self.roots);
        self.frames.clear();
        result.map(|()| roots)
    }

    fn run(&mut self, tokens: impl IntoIterator<Item = Token>) -> Result<()> {
        for token in tokens {
            let mut reprocessed = false;
            loop {
                match self.transition(&token)? {
                    Step::Consume(next) => {
                        self.state = next;
                        break;
                    }
                    Step::Reprocess(next) => {
                        debug_assert!(!reprocessed, "token re-dispatched twice");
                        reprocessed = true;
                        self.state = next;
                    }
                }
            }
        }
        self.close_all();
        Ok(())
    }

    fn transition(&mut self, token: &Token) -> Result<Step> {
        use LineState::*;
        use Step::*;

        let at = token.position;
        let step = match (&token.kind, self.state) {
            // a macro after text on the same line is literal text
            (TokenKind::Macro(name), Text) => {
                self.append_to_last_text(name, at)?;
                Consume(Text)
            }
            // chained macros share the indent of the macro they follow
            (TokenKind::Macro(name), Macro) => {
                let indent = self.top(at)?.indent;
                self.open_child(name, indent, at)?;
                Consume(Macro)
            }
            (TokenKind::Macro(_), Initial) => Reprocess(BlockInitial),
            (TokenKind::Macro(name), BlockInitial) => {
                self.open_root(name, at);
                Consume(Macro)
            }
            (TokenKind::Macro(_), Indent) => Reprocess(BlockIndent),
            // a macro starting a block line sits at its parent's parameter column
            (TokenKind::Macro(name), BlockIndent) => {
                let indent = self.top(at)?.parameter_indent;
                self.open_child(name, indent, at)?;
                Consume(Macro)
            }

            (TokenKind::Text(text), Text) => {
                self.append_to_last_text(text, at)?;
                Consume(Text)
            }
            (TokenKind::Text(text), Macro) => {
                if text.trim().is_empty() {
                    self.report(DiagnosticKind::WhitespaceArgument, at);
                } else {
                    self.push_argument(Argument::Text(text.clone()), at)?;
                }
                Consume(Macro)
            }
            (TokenKind::Text(_), Initial | BlockInitial) => {
                return Err(Error::TextAtZeroIndent { position: at });
            }
            (TokenKind::Text(_), Indent) => Reprocess(BlockIndent),
            (TokenKind::Text(text), BlockIndent) => {
                self.push_argument(Argument::Text(text.clone()), at)?;
                Consume(Text)
            }

            (TokenKind::Indent(_), Text) => return Err(Error::IndentAfterText { position: at }),
            (TokenKind::Indent(_), Macro) => return Err(Error::IndentAfterMacro { position: at }),
            (TokenKind::Indent(_), Indent | BlockIndent) => {
                return Err(Error::DoubleIndent { position: at });
            }
            (TokenKind::Indent(length), Initial) => {
                self.resolve_indent(*length, at)?;
                Consume(Indent)
            }
            (TokenKind::Indent(length), BlockInitial) => {
                let top = self.top_mut(at)?;
                if *length > top.indent {
                    // first block line: arguments of the macro above start here
                    top.parameter_indent = *length;
                    Consume(BlockIndent)
                } else {
                    self.resolve_indent(*length, at)?;
                    Consume(Indent)
                }
            }

            (TokenKind::Line, Text) => Consume(Initial),
            (TokenKind::Line, Macro) => Consume(BlockInitial),
            (TokenKind::Line, Indent) => {
                self.report(DiagnosticKind::IndentOnlyLine, at);
                Consume(Initial)
            }
            (TokenKind::Line, BlockIndent) => {
                self.report(DiagnosticKind::BlockOpeningCancelled, at);
                self.top_mut(at)?.parameter_indent = UNSET_INDENT;
                Consume(BlockInitial)
            }
            (TokenKind::Line, state @ (Initial | BlockInitial)) => {
                self.report(DiagnosticKind::EmptyLine, at);
                Consume(state)
            }
        };
        Ok(step)
    }

    /// Close frames until the innermost open macro whose parameter indent is
    /// exactly `length`. The root frame is never closed here.
    fn resolve_indent(&mut self, length: usize, at: Position) -> Result<()> {
        let no_match = Error::NoMacroMatchesIndent {
            indent: length,
            position: at,
        };
        loop {
            let Some(top) = self.frames.last() else {
                return Err(no_match);
            };
            if top.parameter_indent <= length {
                break;
            }
            if self.frames.len() == 1 {
                return Err(no_match);
            }
            self.close_frame(at)?;
        }

        if self.top(at)?.parameter_indent < length {
            return Err(no_match);
        }
        Ok(())
    }

    fn open_root(&mut self, name: &str, at: Position) {
        self.close_all();
        self.frames.push(Frame::new(MacroNode::new(name, at), 0));
    }

    fn open_child(&mut self, name: &str, indent: usize, at: Position) -> Result<()> {
        if self.frames.len() >= self.max_depth {
            return Err(Error::NestingTooDeep {
                depth: self.max_depth,
                position: at,
            });
        }
        self.frames.push(Frame::new(MacroNode::new(name, at), indent));
        Ok(())
    }

    fn close_frame(&mut self, at: Position) -> Result<()> {
        let frame = self
            .frames
            .pop()
            .ok_or(Error::FrameStackUnderflow { position: at })?;
        match self.frames.last_mut() {
            Some(parent) => parent.node.arguments.push(Argument::Macro(frame.node)),
            None => self.roots.push(frame.node),
        }
        Ok(())
    }

    fn close_all(&mut self) {
        while let Some(frame) = self.frames.pop() {
            match self.frames.last_mut() {
                Some(parent) => parent.node.arguments.push(Argument::Macro(frame.node)),
                None => self.roots.push(frame.node),
            }
        }
    }

    fn top(&self, at: Position) -> Result<&Frame> {
        self.frames
            .last()
            .ok_or(Error::FrameStackUnderflow { position: at })
    }

    fn top_mut(&mut self, at: Position) -> Result<&mut Frame> {
        self.frames
            .last_mut()
            .ok_or(Error::FrameStackUnderflow { position: at })
    }

    fn push_argument(&mut self, argument: Argument, at: Position) -> Result<()> {
        self.top_mut(at)?.node.arguments.push(argument);
        Ok(())
    }

    fn append_to_last_text(&mut self, text: &str, at: Position) -> Result<()> {
        match self.top_mut(at)?.node.arguments.last_mut() {
            Some(Argument::Text(last)) => {
                last.push_str(text);
                Ok(())
            }
            // Text state always follows a text argument on the top frame
            _ => Err(Error::FrameStackUnderflow { position: at }),
        }
    }

    fn report(&mut self, kind: DiagnosticKind, at: Position) {
        let diagnostic = Diagnostic::new(kind, at);
        diagnostic.emit();
        self.diagnostics.push(diagnostic);
    }
}

/// Parse a token stream into root macro trees, discarding diagnostics
pub fn parse(tokens: impl IntoIterator<Item = Token>) -> Result<Vec<MacroNode>> {
    Parser::new().parse(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::tokenize;

    fn parse_str(text: &str) -> Result<Vec<MacroNode>> {
        parse(tokenize(text, '$')?)
    }

    fn texts(node: &MacroNode) -> Vec<&str> {
        node.arguments.iter().filter_map(Argument::as_text).collect()
    }

    #[test]
    fn test_parse_single_line() {
        let roots = parse_str("$$name arg").unwrap();
        assert_eq!(roots.len(), 1);
        assert_eq!(roots[0].name, "$$name");
        assert_eq!(roots[0].arguments, vec![Argument::text(" arg")]);
    }

    #[test]
    fn test_parse_chained() {
        let roots = parse_str("$$a $$b text").unwrap();
        assert_eq!(roots.len(), 1);
        assert_eq!(roots[0].arguments.len(), 1);
        match &roots[0].arguments[0] {
            Argument::Macro(b) => {
                assert_eq!(b.name, "$$b");
                assert_eq!(b.arguments, vec![Argument::text(" text")]);
            }
            other => panic!("expected macro argument, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_block_arguments() {
        let roots = parse_str("$$list\n  one\n  two\n  three").unwrap();
        assert_eq!(roots.len(), 1);
        assert_eq!(texts(&roots[0]), vec!["one", "two", "three"]);
    }

    #[test]
    fn test_parse_multiple_roots() {
        let roots = parse_str("$$a x\n$$b\n  y\n$$c").unwrap();
        let names: Vec<_> = roots.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["$$a", "$$b", "$$c"]);
        assert_eq!(texts(&roots[1]), vec!["y"]);
        assert!(roots[2].arguments.is_empty());
    }

    #[test]
    fn test_parse_nested_blocks() {
        let input = "$$outer\n  $$inner\n    deep\n  shallow\n$$next";
        let roots = parse_str(input).unwrap();
        assert_eq!(roots.len(), 2);

        let outer = &roots[0];
        assert_eq!(outer.arguments.len(), 2);
        let inner = outer.arguments[0].as_macro().unwrap();
        assert_eq!(inner.name, "$$inner");
        assert_eq!(texts(inner), vec!["deep"]);
        assert_eq!(outer.arguments[1], Argument::text("shallow"));
    }

    #[test]
    fn test_block_after_chained_macro_belongs_to_last() {
        let roots = parse_str("$$a $$b\n  x").unwrap();
        let b = roots[0].arguments[0].as_macro().unwrap();
        assert_eq!(b.name, "$$b");
        assert_eq!(texts(b), vec!["x"]);
    }

    #[test]
    fn test_macro_after_text_is_literal() {
        let roots = parse_str("$$a\n  cost $$b more").unwrap();
        assert_eq!(roots[0].arguments, vec![Argument::text("cost $$b more")]);
    }

    #[test]
    fn test_whitespace_argument_is_dropped_with_warning() {
        let mut parser = Parser::new();
        let roots = parser.parse(tokenize("$$a   ", '$').unwrap()).unwrap();
        assert!(roots[0].arguments.is_empty());
        assert_eq!(
            parser.diagnostics()[0].kind,
            DiagnosticKind::WhitespaceArgument
        );
    }

    #[test]
    fn test_empty_line_is_a_note() {
        let mut parser = Parser::new();
        let roots = parser.parse(tokenize("$$a\n\n  x", '$').unwrap()).unwrap();
        assert_eq!(texts(&roots[0]), vec!["x"]);
        assert_eq!(parser.diagnostics().len(), 1);
        assert_eq!(parser.diagnostics()[0].kind, DiagnosticKind::EmptyLine);
    }

    #[test]
    fn test_indent_only_block_line_cancels_block() {
        let mut parser = Parser::new();
        // the cancelled indent of 4 must not capture the indent of 2
        let roots = parser
            .parse(tokenize("$$a\n    \n  x", '$').unwrap())
            .unwrap();
        assert_eq!(texts(&roots[0]), vec!["x"]);
        assert_eq!(
            parser.diagnostics()[0].kind,
            DiagnosticKind::BlockOpeningCancelled
        );
    }

    #[test]
    fn test_indent_only_line_is_warning() {
        let mut parser = Parser::new();
        let roots = parser
            .parse(tokenize("$$a\n  x\n  \n  y", '$').unwrap())
            .unwrap();
        assert_eq!(texts(&roots[0]), vec!["x", "y"]);
        assert_eq!(
            parser.diagnostics()[0].kind,
            DiagnosticKind::IndentOnlyLine
        );
    }

    #[test]
    fn test_text_at_zero_indent() {
        let err = parse_str("hello").unwrap_err();
        assert!(matches!(err, Error::TextAtZeroIndent { .. }));

        let err = parse_str("$$a\nhello").unwrap_err();
        assert_eq!(
            err,
            Error::TextAtZeroIndent {
                position: Position::new(2, 1)
            }
        );
    }

    #[test]
    fn test_dedent_to_unknown_column() {
        let err = parse_str("$$a\n    x\n  y").unwrap_err();
        assert!(matches!(err, Error::NoMacroMatchesIndent { indent: 2, .. }));
    }

    #[test]
    fn test_indent_between_frames() {
        let err = parse_str("$$a\n  $$b\n      x\n    y").unwrap_err();
        assert!(matches!(err, Error::NoMacroMatchesIndent { indent: 4, .. }));
    }

    #[test]
    fn test_leading_indent_without_macro() {
        let err = parse_str("  $$a").unwrap_err();
        assert!(matches!(err, Error::NoMacroMatchesIndent { .. }));
    }

    #[test]
    fn test_illegal_indent_positions() {
        let at = Position::default();
        let indent = || Token::new(TokenKind::Indent(2), at);
        let root = || Token::new(TokenKind::Macro("$$a".into()), at);
        let line = || Token::new(TokenKind::Line, at);

        let err = parse(vec![root(), indent()]).unwrap_err();
        assert!(matches!(err, Error::IndentAfterMacro { .. }));

        let err = parse(vec![root(), line(), indent(), indent()]).unwrap_err();
        assert!(matches!(err, Error::DoubleIndent { .. }));

        let text = Token::new(TokenKind::Text("x".into()), at);
        let err = parse(vec![root(), line(), indent(), text, indent()]).unwrap_err();
        assert!(matches!(err, Error::IndentAfterText { .. }));
    }

    #[test]
    fn test_nesting_limit() {
        let mut parser = Parser::with_max_depth(3);
        let roots = parser.parse(tokenize("$$a $$b $$c x", '$').unwrap()).unwrap();
        assert_eq!(roots[0].nesting_depth(), 3);

        let err = parser
            .parse(tokenize("$$a\n  $$b $$c\n    $$d", '$').unwrap())
            .unwrap_err();
        assert_eq!(
            err,
            Error::NestingTooDeep {
                depth: 3,
                position: Position::new(3, 5)
            }
        );
    }

    #[test]
    fn test_very_deep_chain_is_rejected() {
        let source = "$$a ".repeat(50_000) + "x";
        let err = parse_str(&source).unwrap_err();
        assert!(matches!(
            err,
            Error::NestingTooDeep { depth: DEFAULT_MAX_NESTING_DEPTH, .. }
        ));
    }

    #[test]
    fn test_parser_is_reusable() {
        let mut parser = Parser::new();
        assert!(parser.parse(tokenize("oops", '$').unwrap()).is_err());
        let roots = parser.parse(tokenize("$$a b", '$').unwrap()).unwrap();
        assert_eq!(roots.len(), 1);
        assert!(parser.diagnostics().is_empty());
    }
}
