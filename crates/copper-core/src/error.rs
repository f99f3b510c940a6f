use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Invalid caller input. The message is shown to the end user verbatim.
    #[error("{0}")]
    UserInput(String),
    #[error("Copper API returned HTTP {status}: {message}")]
    Api { status: u16, message: String },
    #[error("dependency unavailable: {0}")]
    DependencyUnavailable(String),
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl CoreError {
    pub fn user_input(message: impl Into<String>) -> Self {
        Self::UserInput(message.into())
    }

    pub fn is_user_input(&self) -> bool {
        matches!(self, Self::UserInput(_))
    }
}
