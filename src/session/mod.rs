// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Transport Session
//!
//! One [`Connection`] per socket. It frames [`WireMessage`]s, runs the
//! one-time key exchange and then seals every outbound message in an
//! envelope and opens every inbound one.
//!
//! ## Handshake
//!
//! 1. The connecting peer generates an RSA-2048 key pair and sends its
//!    `PublicKey` in the clear.
//! 2. The accepting peer generates its own pair on receipt, replies with
//!    its `PublicKey` and is established.
//! 3. The connecting peer is established once the reply arrives.
//!
//! A failed handshake leaves the connection able to write error reports
//! and nothing else.
//!
//! [`WireMessage`]: crate::protocol::WireMessage

mod connection;
mod error;
mod frame;

pub use connection::Connection;
pub use error::{TransportError, TransportResult};
pub use frame::{read_frame, write_frame};
