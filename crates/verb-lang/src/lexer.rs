//! The shared scanner behind both evaluation passes.
//!
//! [`walk`] tokenizes one node span and recurses into parenthesized spans in
//! pre-order. The sizing pass and the evaluating pass are both [`NodeVisitor`]s
//! driven by this one routine, so they always see the same nodes in the same order.
use std::ops::Range;

use crate::error::{InnerError, syntax::SyntaxError};

const ESCAPE: char = '\\';
const OPEN_PAREN: char = '(';
const CLOSE_PAREN: char = ')';

/// What a node turned out to contain once its span was scanned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shape {
    /// Nothing but whitespace.
    Empty,
    /// Exactly one token and no slots; the token is the node's signification.
    Single(String),
    /// The given number of slots were written.
    Slots(usize),
}

impl Shape {
    pub fn slot_count(&self) -> usize {
        match self {
            Shape::Slots(n) => *n,
            Shape::Empty | Shape::Single(_) => 0,
        }
    }
}

/// Receives the events of a [`walk`] over a node tree.
pub(crate) trait NodeVisitor {
    type Output;

    /// Called before the node's span is scanned; returns its pre-order index.
    fn begin(&mut self) -> usize;

    /// A whitespace-delimited token was committed as slot `slot` of `node`.
    fn text(&mut self, node: usize, slot: usize, text: String);

    /// A nested node finished and its output becomes slot `slot` of `node`.
    fn nested(&mut self, node: usize, slot: usize, output: Self::Output);

    /// All slots of `node` have been written.
    fn end(&mut self, node: usize, shape: Shape) -> Result<Self::Output, InnerError>;
}

pub(crate) fn walk<V: NodeVisitor>(
    code: &str,
    span: Range<usize>,
    visitor: &mut V,
) -> Result<V::Output, InnerError> {
    let node = visitor.begin();
    let span = trim(code, span);

    let mut slot = 0;
    let mut token = String::new();
    let mut pending = false;
    let mut quote: Option<(char, usize)> = None;
    let mut escape: Option<usize> = None;
    let mut i = span.start;

    while i < span.end {
        let Some(c) = code[i..].chars().next() else {
            break;
        };
        let width = c.len_utf8();

        if escape.take().is_some() {
            token.push(c);
            pending = true;
            i += width;
            continue;
        }

        match (quote, c) {
            (_, ESCAPE) => escape = Some(i),
            (Some((q, _)), c) if c == q => quote = None,
            (Some(_), c) => token.push(c),
            (None, '"' | '\'') => {
                quote = Some((c, i));
                pending = true;
            }
            (None, OPEN_PAREN) => {
                let close = matching_paren(code, i, span.end)?;
                if pending {
                    visitor.text(node, slot, std::mem::take(&mut token));
                    slot += 1;
                    pending = false;
                }

                let output = walk(code, i + 1..close, visitor)?;
                visitor.nested(node, slot, output);
                slot += 1;
                i = close + 1;
                continue;
            }
            (None, CLOSE_PAREN) => {
                return Err(SyntaxError::UnexpectedCloseParen { offset: i }.into());
            }
            (None, c) if c.is_whitespace() => {
                if pending {
                    visitor.text(node, slot, std::mem::take(&mut token));
                    slot += 1;
                    pending = false;
                }
            }
            (None, c) => {
                token.push(c);
                pending = true;
            }
        }

        i += width;
    }

    if let Some(offset) = escape {
        return Err(SyntaxError::DanglingEscape { offset }.into());
    }

    if let Some((quote, offset)) = quote {
        return Err(SyntaxError::UnterminatedQuote { quote, offset }.into());
    }

    let shape = match (pending, slot) {
        (false, 0) => Shape::Empty,
        (true, 0) => Shape::Single(token),
        (true, n) => {
            visitor.text(node, n, token);
            Shape::Slots(n + 1)
        }
        (false, n) => Shape::Slots(n),
    };

    visitor.end(node, shape)
}

/// Strips surrounding whitespace, keeping a trailing whitespace character that is escaped.
fn trim(code: &str, span: Range<usize>) -> Range<usize> {
    let text = &code[span.clone()];
    let start = span.start + (text.len() - text.trim_start().len());
    let mut end = (span.end - (text.len() - text.trim_end().len())).max(start);

    let escapes = code[start..end]
        .chars()
        .rev()
        .take_while(|&c| c == ESCAPE)
        .count();
    if escapes % 2 == 1 {
        end += code[end..span.end]
            .chars()
            .next()
            .map(char::len_utf8)
            .unwrap_or(0);
    }

    start..end
}

/// Finds the `)` closing the `(` at `open`, skipping quoted and escaped characters.
fn matching_paren(code: &str, open: usize, end: usize) -> Result<usize, SyntaxError> {
    let mut depth = 0usize;
    let mut quote: Option<(char, usize)> = None;
    let mut escaped = false;

    for (offset, c) in code[open..end].char_indices() {
        if escaped {
            escaped = false;
            continue;
        }

        match (quote, c) {
            (_, ESCAPE) => escaped = true,
            (Some((q, _)), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some((c, open + offset)),
            (None, OPEN_PAREN) => depth += 1,
            (None, CLOSE_PAREN) => {
                depth -= 1;
                if depth == 0 {
                    return Ok(open + offset);
                }
            }
            _ => {}
        }
    }

    match quote {
        Some((quote, offset)) => Err(SyntaxError::UnterminatedQuote { quote, offset }),
        None => Err(SyntaxError::UnterminatedParen { offset: open }),
    }
}
