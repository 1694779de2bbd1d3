use pest::Parser;
use pest::error::LineColLocation;
use pest::iterators::Pair;
use pest_derive::Parser;

use crate::ast::{Position, Token, TokenKind};
use crate::error::{Error, Result};

#[derive(Parser)]
#[grammar = "macroline.pest"]
struct MacroLineGrammar;

/// Split `text` into macro, line, indent and text tokens.
///
/// A macro token is two `sigil` characters followed by non-whitespace. The
/// function keeps no state between calls.
pub fn tokenize(text: &str, sigil: char) -> Result<Vec<Token>> {
    if sigil.is_whitespace() {
        return Err(Error::InvalidSigil(sigil));
    }

    // the grammar reads the sigil from the first character of its input
    let source = format!("{sigil}{text}");
    let mut pairs = MacroLineGrammar::parse(Rule::document, &source).map_err(|err| {
        let (line, column) = match err.line_col {
            LineColLocation::Pos(pos) => pos,
            LineColLocation::Span(start, _) => start,
        };
        Error::InvalidToken {
            position: source_position(line, column),
        }
    })?;

    let Some(document) = pairs.next() else {
        return Ok(Vec::new());
    };

    Ok(document.into_inner().filter_map(to_token).collect())
}

fn to_token(pair: Pair<Rule>) -> Option<Token> {
    let (line, column) = pair.line_col();
    let kind = match pair.as_rule() {
        Rule::macro_call => TokenKind::Macro(pair.as_str().to_owned()),
        Rule::line_break => TokenKind::Line,
        Rule::indent => TokenKind::Indent(pair.as_str().chars().count()),
        Rule::text => TokenKind::Text(pair.as_str().to_owned()),
        _ => return None,
    };
    Some(Token::new(kind, source_position(line, column)))
}

/// Undo the shift the prepended sigil causes on the first line
fn source_position(line: usize, column: usize) -> Position {
    if line == 1 {
        Position::new(line, column.saturating_sub(1).max(1))
    } else {
        Position::new(line, column)
    }
}
