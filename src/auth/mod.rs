// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication and Authorization
//!
//! ## Session Gate
//!
//! 1. A connection starts without an acting user.
//! 2. `User::LoginUser` with valid credentials, or the bootstrap
//!    `User::CreateFull` on an empty store, sets the [`ActingUser`].
//! 3. Every later command is checked against the [`AuthorizationPolicy`]
//!    for the acting user's role before it reaches the domain.
//!
//! ## Audit
//!
//! Login failures and policy denials are logged on the `audit` target
//! with the user and role as structured fields.

mod acting;
mod error;
mod policy;
mod roles;

pub use acting::ActingUser;
pub use error::AuthError;
pub use policy::AuthorizationPolicy;
pub use roles::UserRole;

/// Tracing target for security-relevant events.
pub const AUDIT_TARGET: &str = "audit";
