// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Carelink - Patient Transport Authorization Backend
//!
//! This crate carries typed commands between healthcare providers,
//! transport providers and insurers and the server that records them.
//! Traffic is encrypted per message with RSA-OAEP wrapped AES keys, each
//! session logs in once, and every command is checked against a
//! role-based policy before it reaches the records.
//!
//! ## Modules
//!
//! - `crypto` - Key exchange and per-message envelopes
//! - `session` - Framed, optionally encrypted connection
//! - `protocol` - Wire messages, command unions and kind tags
//! - `auth` - Roles, authorization policy, acting user
//! - `dispatch` - Server-side session state machine
//! - `operations` - Contract for the record backend
//! - `store` - In-memory record backend
//! - `client` - Typed client façade
//! - `server` - TCP accept loop

pub mod auth;
pub mod client;
pub mod config;
pub mod crypto;
pub mod dispatch;
pub mod error;
pub mod models;
pub mod operations;
pub mod protocol;
pub mod server;
pub mod session;
pub mod store;

#[cfg(test)]
mod fixtures;
