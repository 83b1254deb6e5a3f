use thiserror::Error;

type CommandName = String;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    #[error("Unknown command: {0}")]
    UnknownCommand(CommandName),
    #[error("Unknown command \"{route}\" in \"{parent}\"")]
    UnknownRoute { route: String, parent: String },
    #[error("{0}")]
    Handler(String),
}

impl RuntimeError {
    pub fn handler(message: impl Into<String>) -> Self {
        RuntimeError::Handler(message.into())
    }
}
