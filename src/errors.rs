use std::path::PathBuf;
use thiserror::Error;

/// Error types for engine control and game play
#[derive(Debug, Error)]
pub enum ChsError {
    /// The engine binary could not be started or did not complete the UCI handshake
    #[error("Failed to start Stockfish engine '{}': {source}\n\n{remediation}", path.display())]
    EngineLaunch {
        path: PathBuf,
        remediation: String,
        #[source]
        source: Box<ChsError>,
    },
    /// The engine process exited while a request was in flight, or was already shut down
    #[error("engine process has terminated")]
    EngineTerminated,
    /// The engine answered with something we could not make sense of
    #[error("unexpected engine output: {0}")]
    Protocol(String),
    /// The engine found no move in a position that is not over
    #[error("engine returned no move for position {fen}")]
    NoBestMove { fen: String },
    /// Text that is not a legal move in the current position
    #[error("invalid move: {0}")]
    InvalidMove(String),
    /// A starting position the rules library rejected
    #[error("invalid FEN: {0}")]
    InvalidFen(String),
    /// File I/O or pipe failure
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ChsError {
    /// True when the error means the engine process is gone.
    pub fn is_terminated(&self) -> bool {
        matches!(self, ChsError::EngineTerminated)
    }
}

// Convenience type alias
pub type Result<T> = std::result::Result<T, ChsError>;

/// Map an I/O error on an engine pipe to the error the caller should see.
///
/// A closed pipe means the child is gone; anything else is a plain I/O failure.
pub(crate) fn pipe_error(error: std::io::Error) -> ChsError {
    match error.kind() {
        std::io::ErrorKind::BrokenPipe
        | std::io::ErrorKind::UnexpectedEof
        | std::io::ErrorKind::ConnectionReset => ChsError::EngineTerminated,
        _ => ChsError::Io(error),
    }
}
