// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! The read/write choke point of one connection.

use rsa::{RsaPrivateKey, RsaPublicKey};
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, warn};

use super::error::{decode_message, TransportError, TransportResult};
use super::frame::{read_frame, write_frame};
use crate::config::DEFAULT_MAX_FRAME_BYTES;
use crate::crypto::{EncryptionError, Envelope, KeyPair, PublicKeyMessage};
use crate::protocol::{Response, WireMessage};

/// Encryption progress of a connection.
enum EncryptionState {
    /// No key exchange requested yet.
    Plaintext,
    /// Own key announced, waiting for the peer's.
    Pending(KeyPair),
    Established {
        local: RsaPrivateKey,
        remote: RsaPublicKey,
    },
    /// Handshake aborted. Only error reports may still be written.
    Failed,
}

impl EncryptionState {
    fn label(&self) -> &'static str {
        match self {
            EncryptionState::Plaintext => "plaintext",
            EncryptionState::Pending(_) => "pending",
            EncryptionState::Established { .. } => "established",
            EncryptionState::Failed => "failed",
        }
    }
}

/// A framed, optionally encrypted message stream.
///
/// ## Send rules
///
/// - `PublicKey` messages always go out as-is.
/// - Before any key exchange, messages go out as-is.
/// - While the handshake is pending, sending fails fast.
/// - Once established, every message is sealed in a fresh [`Envelope`].
/// - After a failed handshake, only `Response::Error` may be written.
///
/// ## Receive rules
///
/// Envelopes are opened with the local private key. An envelope arriving
/// without a key is an error. Once encryption is established, plaintext
/// commands and responses are refused.
pub struct Connection<S> {
    stream: S,
    encryption: EncryptionState,
    max_frame_bytes: usize,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            encryption: EncryptionState::Plaintext,
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
        }
    }

    pub fn with_max_frame_bytes(mut self, max_frame_bytes: usize) -> Self {
        self.max_frame_bytes = max_frame_bytes;
        self
    }

    pub fn is_encrypted(&self) -> bool {
        matches!(self.encryption, EncryptionState::Established { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.encryption, EncryptionState::Failed)
    }

    pub fn into_inner(self) -> S {
        self.stream
    }

    /// Run the handshake as the connecting peer.
    ///
    /// Announces a fresh public key and waits for the peer's. Any other
    /// reply aborts the handshake.
    pub async fn initiate_handshake(&mut self) -> TransportResult<()> {
        if !matches!(self.encryption, EncryptionState::Plaintext) {
            return Err(EncryptionError::AlreadyEstablished.into());
        }

        let result = self.run_initiator().await;
        if result.is_err() {
            self.encryption = EncryptionState::Failed;
        }
        result
    }

    async fn run_initiator(&mut self) -> TransportResult<()> {
        let pair = generate_key_pair().await?;
        let announce = WireMessage::PublicKey(pair.announce()?);
        self.encryption = EncryptionState::Pending(pair);
        self.write_message(&announce).await?;
        debug!("handshake started");

        let reply = self.read_message().await?;
        let remote = match reply {
            WireMessage::PublicKey(msg) => msg.to_key()?,
            other => return Err(EncryptionError::UnexpectedMessage(other.label()).into()),
        };

        match std::mem::replace(&mut self.encryption, EncryptionState::Failed) {
            EncryptionState::Pending(pair) => {
                self.encryption = EncryptionState::Established {
                    local: pair.into_private_key(),
                    remote,
                };
                debug!("handshake complete");
                Ok(())
            }
            _ => Err(EncryptionError::HandshakeIncomplete.into()),
        }
    }

    /// Answer a peer's handshake.
    ///
    /// Generates the local key pair, replies with its public half and is
    /// immediately established.
    pub async fn accept_handshake(&mut self, remote: &PublicKeyMessage) -> TransportResult<()> {
        if !matches!(self.encryption, EncryptionState::Plaintext) {
            return Err(EncryptionError::AlreadyEstablished.into());
        }

        let result = self.run_responder(remote).await;
        if result.is_err() {
            self.encryption = EncryptionState::Failed;
        }
        result
    }

    async fn run_responder(&mut self, remote: &PublicKeyMessage) -> TransportResult<()> {
        let remote = remote.to_key()?;
        let pair = generate_key_pair().await?;
        let announce = WireMessage::PublicKey(pair.announce()?);
        self.write_message(&announce).await?;

        self.encryption = EncryptionState::Established {
            local: pair.into_private_key(),
            remote,
        };
        debug!("handshake accepted");
        Ok(())
    }

    pub async fn send(&mut self, message: &WireMessage) -> TransportResult<()> {
        if matches!(message, WireMessage::PublicKey(_)) {
            return self.write_message(message).await;
        }

        match &self.encryption {
            EncryptionState::Plaintext => self.write_message(message).await,
            EncryptionState::Pending(_) => Err(EncryptionError::HandshakeIncomplete.into()),
            EncryptionState::Failed => match message {
                WireMessage::Response(Response::Error(_)) => self.write_message(message).await,
                _ => Err(EncryptionError::HandshakeFailed.into()),
            },
            EncryptionState::Established { remote, .. } => {
                let plaintext = serde_json::to_vec(message)
                    .map_err(|e| EncryptionError::EncryptionFailed(e.to_string()))?;
                let envelope = Envelope::seal(&plaintext, remote)?;
                self.write_message(&WireMessage::Envelope(envelope)).await
            }
        }
    }

    /// Read the next message, opening it if it is an envelope.
    pub async fn receive(&mut self) -> TransportResult<WireMessage> {
        let message = match self.read_message().await {
            Err(TransportError::UnknownCommand(_)) if self.is_encrypted() => {
                return Err(EncryptionError::UnexpectedPlaintext("command").into());
            }
            read => read?,
        };

        match (&self.encryption, message) {
            (EncryptionState::Established { local, .. }, WireMessage::Envelope(envelope)) => {
                let plaintext = envelope.open(local)?;
                let inner: WireMessage = decode_message(&plaintext)?;
                match inner {
                    WireMessage::Envelope(_) | WireMessage::PublicKey(_) => Err(
                        EncryptionError::MalformedEnvelope("nested handshake or envelope").into(),
                    ),
                    inner => Ok(inner),
                }
            }
            (_, WireMessage::Envelope(_)) => Err(EncryptionError::MissingKey.into()),
            (
                EncryptionState::Established { .. },
                plain @ (WireMessage::Command(_) | WireMessage::Response(_)),
            ) => {
                warn!(message = plain.label(), "plaintext message on encrypted connection");
                Err(EncryptionError::UnexpectedPlaintext(plain.label()).into())
            }
            (_, message) => Ok(message),
        }
    }

    /// Send a liveness probe. `false` means the connection is lost.
    pub async fn probe(&mut self) -> bool {
        match self.send(&WireMessage::ConnectionTest).await {
            Ok(()) => true,
            Err(e) => {
                debug!(
                    error = %e,
                    state = self.encryption.label(),
                    "connection probe failed"
                );
                false
            }
        }
    }

    async fn write_message(&mut self, message: &WireMessage) -> TransportResult<()> {
        let body = serde_json::to_vec(message)?;
        write_frame(&mut self.stream, &body, self.max_frame_bytes).await
    }

    async fn read_message(&mut self) -> TransportResult<WireMessage> {
        let body = read_frame(&mut self.stream, self.max_frame_bytes).await?;
        decode_message(&body)
    }
}

async fn generate_key_pair() -> TransportResult<KeyPair> {
    let pair = tokio::task::spawn_blocking(KeyPair::generate)
        .await
        .map_err(|e| EncryptionError::KeyGeneration(e.to_string()))??;
    Ok(pair)
}
