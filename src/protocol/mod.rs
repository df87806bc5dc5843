// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Wire Protocol
//!
//! Messages exchanged between client and server. Each frame on the socket
//! carries exactly one [`WireMessage`]:
//!
//! | Variant          | Direction        | Encrypted once keys are exchanged |
//! |------------------|------------------|-----------------------------------|
//! | `PublicKey`      | both             | never                             |
//! | `Envelope`       | both             | is the encrypted form             |
//! | `ConnectionTest` | client to server | yes                               |
//! | `Command`        | client to server | yes                               |
//! | `Response`       | server to client | yes                               |
//!
//! Frames are a 4-byte big-endian length followed by the JSON body; see
//! [`crate::session`] for the codec.

mod kind;
mod message;

pub use kind::{CommandKind, Family};
pub use message::{Command, Entity, EntityList, FamilyCommand, Record, Response, WireMessage};
