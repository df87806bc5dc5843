// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Error values that travel over the wire.
//!
//! Local errors stay typed per layer (`EncryptionError`, `AuthError`,
//! `OperationError`, ...). Whatever has to reach the peer is first turned
//! into a [`RemoteError`], which keeps a discriminated [`ErrorKind`] next
//! to the human-readable detail.

use serde::{Deserialize, Serialize};

use crate::auth::UserRole;

/// Discriminated error classification understood by both peers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "kind")]
pub enum ErrorKind {
    #[error("encryption failure")]
    Encryption,

    #[error("I/O failure")]
    Io,

    #[error("wrong credentials")]
    WrongCredentials,

    #[error("no user logged in")]
    UserNotProvided,

    #[error("user {user} not found")]
    UserNotFound { user: String },

    #[error("user {user} with role {role} is not allowed to run this command")]
    UserNotAllowed { user: String, role: UserRole },

    #[error("username {username} is already used")]
    UserNameAlreadyUsed { username: String },

    #[error("transport document {document} is archived")]
    IsArchived { document: String },

    #[error("transport document {document} cannot be archived")]
    IsNotArchivable { document: String },

    #[error("illegal process")]
    IllegalProcess,

    #[error("processing failure")]
    Processing,

    #[error("unexpected object type, expected {expected}")]
    WrongObjectType { expected: String },
}

impl ErrorKind {
    /// Stable code used in log fields.
    pub fn error_code(&self) -> &'static str {
        match self {
            ErrorKind::Encryption => "encryption",
            ErrorKind::Io => "io",
            ErrorKind::WrongCredentials => "wrong_credentials",
            ErrorKind::UserNotProvided => "user_not_provided",
            ErrorKind::UserNotFound { .. } => "user_not_found",
            ErrorKind::UserNotAllowed { .. } => "user_not_allowed",
            ErrorKind::UserNameAlreadyUsed { .. } => "user_name_already_used",
            ErrorKind::IsArchived { .. } => "is_archived",
            ErrorKind::IsNotArchivable { .. } => "is_not_archivable",
            ErrorKind::IllegalProcess => "illegal_process",
            ErrorKind::Processing => "processing",
            ErrorKind::WrongObjectType { .. } => "wrong_object_type",
        }
    }

    /// Authentication failures, recoverable by logging in again.
    pub fn is_authentication(&self) -> bool {
        matches!(
            self,
            ErrorKind::WrongCredentials | ErrorKind::UserNotProvided | ErrorKind::UserNotFound { .. }
        )
    }
}

/// Error value sent back to the peer in place of a result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{kind}: {detail}")]
pub struct RemoteError {
    pub kind: ErrorKind,
    pub detail: String,
}

impl RemoteError {
    pub fn new(kind: ErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }

    pub fn error_code(&self) -> &'static str {
        self.kind.error_code()
    }
}

impl From<ErrorKind> for RemoteError {
    fn from(kind: ErrorKind) -> Self {
        let detail = kind.to_string();
        Self { kind, detail }
    }
}
