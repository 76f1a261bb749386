use thiserror::Error;

/// Request-level error taxonomy. Every failure is scoped to a single
/// request; nothing here is fatal to the process.
#[derive(Error, Debug)]
pub enum ChatError {
    /// Missing or malformed input (token or message absent). 400 class.
    #[error("Input error: {0}")]
    Input(String),

    /// Identity token invalid or unverifiable. 401 class.
    #[error("Auth error: {0}")]
    Auth(String),

    /// Delete target not present. 404 class.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Any failure from a store, the completion model, or the identity
    /// service. Logged at the controller boundary and surfaced with the
    /// raw message; never retried. 500 class.
    #[error("Collaborator failure: {0}")]
    Collaborator(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ChatError {
    /// HTTP-equivalent status class for transports that need one.
    pub fn status_code(&self) -> u16 {
        match self {
            ChatError::Input(_) => 400,
            ChatError::Auth(_) => 401,
            ChatError::NotFound(_) => 404,
            ChatError::Collaborator(_) | ChatError::Io(_) => 500,
        }
    }
}

pub type Result<T> = std::result::Result<T, ChatError>;
