// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Transport session errors.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;

use crate::crypto::EncryptionError;
use crate::error::{ErrorKind, RemoteError};

#[derive(Error, Debug)]
pub enum TransportError {
    /// Peer closed the stream at a frame boundary.
    #[error("connection closed by peer")]
    Closed,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("frame of {size} bytes exceeds the {max} byte limit")]
    FrameTooLarge { size: usize, max: usize },

    /// Frame is not valid JSON.
    #[error("malformed frame: {0}")]
    Malformed(String),

    /// Valid JSON naming a variant or shape this peer does not know.
    #[error("unknown message: {0}")]
    UnknownMessage(String),

    /// A `Command` frame whose command this peer cannot route.
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    #[error(transparent)]
    Encryption(#[from] EncryptionError),

    #[error("timed out waiting for {0}")]
    Timeout(&'static str),
}

impl TransportError {
    pub fn error_code(&self) -> &'static str {
        match self {
            TransportError::Closed => "closed",
            TransportError::Io(_) => "io",
            TransportError::FrameTooLarge { .. } => "frame_too_large",
            TransportError::Malformed(_) => "malformed",
            TransportError::UnknownMessage(_) => "unknown_message",
            TransportError::UnknownCommand(_) => "unknown_command",
            TransportError::Encryption(e) => e.error_code(),
            TransportError::Timeout(_) => "timeout",
        }
    }

    /// Errors after which the connection can keep reading frames.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            TransportError::UnknownMessage(_) | TransportError::UnknownCommand(_)
        )
    }

    /// Wire form reported to the peer before the connection closes.
    pub fn to_remote(&self) -> RemoteError {
        let kind = match self {
            TransportError::Encryption(_) => ErrorKind::Encryption,
            _ => ErrorKind::Io,
        };
        RemoteError::new(kind, self.to_string())
    }
}

impl From<serde_json::Error> for TransportError {
    fn from(err: serde_json::Error) -> Self {
        use serde_json::error::Category;

        match err.classify() {
            Category::Data => TransportError::UnknownMessage(err.to_string()),
            Category::Io => TransportError::Io(err.into()),
            Category::Syntax | Category::Eof => TransportError::Malformed(err.to_string()),
        }
    }
}

/// Decode one frame body, telling unroutable commands apart from other
/// unknown messages so the reader can answer them.
pub(crate) fn decode_message<T: DeserializeOwned>(body: &[u8]) -> TransportResult<T> {
    #[derive(Deserialize)]
    struct Tag {
        #[serde(rename = "type")]
        kind: String,
    }

    serde_json::from_slice(body).map_err(|err| match TransportError::from(err) {
        TransportError::UnknownMessage(detail) => {
            match serde_json::from_slice::<Tag>(body) {
                Ok(tag) if tag.kind == "Command" => TransportError::UnknownCommand(detail),
                _ => TransportError::UnknownMessage(detail),
            }
        }
        other => other,
    })
}

pub type TransportResult<T> = Result<T, TransportError>;
