// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Encryption errors.

use thiserror::Error;

/// Failure of the handshake or of envelope encryption.
///
/// Never carries key material or plaintext.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncryptionError {
    #[error("key generation failed: {0}")]
    KeyGeneration(String),

    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("expected a public key message, got {0}")]
    UnexpectedMessage(&'static str),

    #[error("handshake has not completed")]
    HandshakeIncomplete,

    #[error("handshake failed, only error reports may be sent")]
    HandshakeFailed,

    #[error("encryption is already established")]
    AlreadyEstablished,

    #[error("received a plaintext {0} after encryption was established")]
    UnexpectedPlaintext(&'static str),

    #[error("received an envelope but no decryption key is available")]
    MissingKey,

    #[error("invalid symmetric key length: {0} bytes")]
    InvalidKeyLength(usize),

    #[error("malformed envelope: {0}")]
    MalformedEnvelope(&'static str),

    #[error("encryption failed: {0}")]
    EncryptionFailed(String),

    /// Key unwrap or authentication tag mismatch.
    #[error("decryption failed")]
    DecryptionFailed,
}

impl EncryptionError {
    pub fn error_code(&self) -> &'static str {
        match self {
            EncryptionError::KeyGeneration(_) => "key_generation",
            EncryptionError::InvalidPublicKey(_) => "invalid_public_key",
            EncryptionError::UnexpectedMessage(_) => "unexpected_message",
            EncryptionError::HandshakeIncomplete => "handshake_incomplete",
            EncryptionError::HandshakeFailed => "handshake_failed",
            EncryptionError::AlreadyEstablished => "already_established",
            EncryptionError::UnexpectedPlaintext(_) => "unexpected_plaintext",
            EncryptionError::MissingKey => "missing_key",
            EncryptionError::InvalidKeyLength(_) => "invalid_key_length",
            EncryptionError::MalformedEnvelope(_) => "malformed_envelope",
            EncryptionError::EncryptionFailed(_) => "encryption_failed",
            EncryptionError::DecryptionFailed => "decryption_failed",
        }
    }
}

pub type EncryptionResult<T> = Result<T, EncryptionError>;
