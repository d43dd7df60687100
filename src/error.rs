//! Crate-level error types.
//!
//! Errors fall into four layers:
//! - usage errors (the call site is wrong),
//! - protocol errors (malformed data on the wire),
//! - invalid responses (the device answered, but not with an ACK),
//! - transport errors (the connection itself failed).

use std::io;

use crate::protocol::CommandKind;

/// Crate-level error type.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The operation was called incorrectly and was not attempted.
    #[error("usage error: {0}")]
    Usage(&'static str),

    /// Malformed or unexpected data on the wire.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The device answered a command with a non-ACK response code.
    ///
    /// The session records this by entering [`LinkState::Faulted`]; it is up
    /// to the caller to decide whether to reconnect.
    ///
    /// [`LinkState::Faulted`]: crate::session::LinkState::Faulted
    #[error("device rejected {command} with response code 0x{code:02x}")]
    InvalidResponse { command: CommandKind, code: u8 },

    /// The underlying connection failed (refused, reset, closed).
    #[error("transport error: {0}")]
    Transport(#[from] io::Error),
}

impl Error {
    /// Returns true if this is a usage error.
    pub fn is_usage(&self) -> bool {
        matches!(self, Error::Usage(_))
    }

    /// Returns true if the device answered with a non-ACK response code.
    pub fn is_invalid_response(&self) -> bool {
        matches!(self, Error::InvalidResponse { .. })
    }

    /// Returns true if the underlying connection failed.
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport(_))
    }
}

/// Errors for malformed protocol data.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// A frame was shorter than its fixed wire size.
    #[error("frame too short: got {got} bytes, need {need}")]
    ShortFrame { got: usize, need: usize },

    /// The status block carried a playback state outside the protocol's range.
    #[error("unknown playback state: {0}")]
    UnknownPlaybackState(u8),

    /// The status block carried a light engine state outside the protocol's range.
    #[error("unknown light engine state: {0}")]
    UnknownLightEngineState(u8),
}

/// Crate-level result type.
pub type Result<T> = std::result::Result<T, Error>;
