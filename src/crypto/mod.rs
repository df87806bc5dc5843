// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Hybrid Encryption
//!
//! - [`exchange`]: RSA-2048 key pairs and the `PublicKeyMessage` used for
//!   the one-time handshake (OAEP, SHA-256, MGF1-SHA-256).
//! - [`envelope`]: per-message envelopes. Every message gets a fresh
//!   AES-256 key, wrapped with the peer's public key.

mod envelope;
mod error;
mod exchange;

pub use envelope::{Envelope, NONCE_SIZE, TAG_SIZE};
pub use error::{EncryptionError, EncryptionResult};
pub use exchange::{KeyPair, PublicKeyMessage, KEY_BITS, SYMMETRIC_KEY_BYTES};
