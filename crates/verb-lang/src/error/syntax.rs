use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyntaxError {
    #[error("Unterminated quote `{quote}` at offset {offset}")]
    UnterminatedQuote { quote: char, offset: usize },
    #[error("Unterminated parenthesis at offset {offset}")]
    UnterminatedParen { offset: usize },
    #[error("Unexpected closing parenthesis at offset {offset}")]
    UnexpectedCloseParen { offset: usize },
    #[error("Dangling escape at offset {offset}")]
    DanglingEscape { offset: usize },
}

impl SyntaxError {
    /// Byte offset of the offending character in the evaluated source.
    pub fn offset(&self) -> usize {
        match self {
            SyntaxError::UnterminatedQuote { offset, .. } => *offset,
            SyntaxError::UnterminatedParen { offset } => *offset,
            SyntaxError::UnexpectedCloseParen { offset } => *offset,
            SyntaxError::DanglingEscape { offset } => *offset,
        }
    }

    /// Returns `true` when more input could complete the source.
    pub fn is_incomplete(&self) -> bool {
        matches!(
            self,
            SyntaxError::UnterminatedQuote { .. }
                | SyntaxError::UnterminatedParen { .. }
                | SyntaxError::DanglingEscape { .. }
        )
    }
}
