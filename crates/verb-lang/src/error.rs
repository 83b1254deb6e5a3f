pub mod runtime;
pub mod syntax;

use miette::{Diagnostic, SourceSpan};

use runtime::RuntimeError;
use syntax::SyntaxError;

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum InnerError {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

/// Represents a high-level error with diagnostic information for the user.
#[derive(PartialEq, Eq, Debug, Clone, thiserror::Error)]
#[error("{cause}")]
pub struct Error {
    /// The underlying cause of the error.
    pub cause: InnerError,
    /// The source code that was being evaluated.
    pub source_code: String,
    /// The location in the source code for diagnostics.
    pub location: SourceSpan,
}

impl Error {
    pub fn from_error(source_code: impl Into<String>, cause: InnerError) -> Self {
        let source_code = source_code.into();
        let location = match &cause {
            InnerError::Syntax(err) => {
                let offset = err.offset().min(source_code.len());
                let width = source_code
                    .get(offset..)
                    .and_then(|rest| rest.chars().next())
                    .map(char::len_utf8)
                    .unwrap_or(0);
                SourceSpan::new(offset.into(), width)
            }
            InnerError::Runtime(_) => SourceSpan::new(0.into(), source_code.trim_end().len()),
        };

        Self {
            cause,
            source_code,
            location,
        }
    }

    pub fn is_syntax_error(&self) -> bool {
        matches!(self.cause, InnerError::Syntax(_))
    }

    /// Returns `true` when appending more input could make the source valid.
    pub fn is_incomplete(&self) -> bool {
        matches!(&self.cause, InnerError::Syntax(err) if err.is_incomplete())
    }

    /// Renders the error as plain text.
    ///
    /// Syntax errors get a window of at most `radius` characters on each side of the
    /// offending offset and a caret line pointing at it.
    pub fn render(&self, radius: usize) -> String {
        match &self.cause {
            InnerError::Syntax(err) => {
                let (window, column) = context_window(&self.source_code, err.offset(), radius);
                format!("{err}\n{window}\n{}^", " ".repeat(column))
            }
            InnerError::Runtime(err) => err.to_string(),
        }
    }
}

const ELLIPSIS: &str = "...";

fn context_window(source: &str, offset: usize, radius: usize) -> (String, usize) {
    let (before, after) = match source.get(..offset).zip(source.get(offset..)) {
        Some(parts) => parts,
        None => (source, ""),
    };

    let skipped = before.chars().count().saturating_sub(radius);
    let head = before.chars().skip(skipped).collect::<String>();
    let truncated_tail = after.chars().count() > radius + 1;
    let tail = after.chars().take(radius + 1).collect::<String>();

    let mut window = String::new();
    if skipped > 0 {
        window.push_str(ELLIPSIS);
    }
    window.push_str(&head);
    window.push_str(&tail);
    if truncated_tail {
        window.push_str(ELLIPSIS);
    }

    let column = head.chars().count() + if skipped > 0 { ELLIPSIS.len() } else { 0 };
    let window = window
        .chars()
        .map(|c| if c.is_whitespace() { ' ' } else { c })
        .collect();

    (window, column)
}

impl Diagnostic for Error {
    fn code<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        let c = match &self.cause {
            InnerError::Syntax(SyntaxError::UnterminatedQuote { .. }) => {
                "SyntaxError::UnterminatedQuote"
            }
            InnerError::Syntax(SyntaxError::UnterminatedParen { .. }) => {
                "SyntaxError::UnterminatedParen"
            }
            InnerError::Syntax(SyntaxError::UnexpectedCloseParen { .. }) => {
                "SyntaxError::UnexpectedCloseParen"
            }
            InnerError::Syntax(SyntaxError::DanglingEscape { .. }) => "SyntaxError::DanglingEscape",
            InnerError::Runtime(RuntimeError::UnknownCommand(_)) => "RuntimeError::UnknownCommand",
            InnerError::Runtime(RuntimeError::UnknownRoute { .. }) => "RuntimeError::UnknownRoute",
            InnerError::Runtime(RuntimeError::Handler(_)) => "RuntimeError::Handler",
        };

        Some(Box::new(c))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        let msg = match &self.cause {
            InnerError::Syntax(SyntaxError::UnterminatedQuote { quote, .. }) => {
                Some(format!("Close the string with a matching `{quote}`."))
            }
            InnerError::Syntax(SyntaxError::UnterminatedParen { .. }) => {
                Some("Add the missing `)` to close the nested command.".to_string())
            }
            InnerError::Syntax(SyntaxError::UnexpectedCloseParen { .. }) => {
                Some("Remove the `)` or escape it with `\\)`.".to_string())
            }
            InnerError::Syntax(SyntaxError::DanglingEscape { .. }) => {
                Some("A trailing `\\` must be followed by the character to escape.".to_string())
            }
            InnerError::Runtime(RuntimeError::UnknownCommand(name)) => {
                Some(format!("'{name}' is not a registered command."))
            }
            InnerError::Runtime(RuntimeError::UnknownRoute { parent, .. }) => {
                Some(format!("Check the sub-commands available under '{parent}'."))
            }
            InnerError::Runtime(RuntimeError::Handler(_)) => None,
        };

        msg.map(|m| Box::new(m) as Box<dyn std::fmt::Display>)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = miette::LabeledSpan> + '_>> {
        Some(Box::new(std::iter::once(
            miette::LabeledSpan::new_with_span(Some(format!("{}", self.cause)), self.location),
        )))
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        Some(&self.source_code)
    }
}
