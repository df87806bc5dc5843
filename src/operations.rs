// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Domain Operations Contract
//!
//! The dispatcher never touches records directly. Everything past the
//! authentication gate and the policy check goes through [`Operations`]:
//!
//! | Call        | When                                        |
//! |-------------|---------------------------------------------|
//! | `login`     | `User::LoginUser`                           |
//! | `bootstrap` | `User::CreateFull` on an unauthenticated session |
//! | `process`   | every authorized command                    |
//!
//! `process` answers with an [`Outcome`]: a single record or the list a
//! `GetList` query matched.

use thiserror::Error;

use crate::error::{ErrorKind, RemoteError};
use crate::models::{user, Id, Reference, TransportDocument, User};
use crate::protocol::{Command, Entity, EntityList, Family, Response};

/// Successful result of a processed command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Entity(Entity),
    List(EntityList),
}

impl Outcome {
    pub fn entity(record: impl Into<Entity>) -> Self {
        Outcome::Entity(record.into())
    }

    pub fn list(records: impl Into<EntityList>) -> Self {
        Outcome::List(records.into())
    }
}

impl From<Outcome> for Response {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Entity(entity) => Response::Entity(entity),
            Outcome::List(list) => Response::List(list),
        }
    }
}

/// Domain or technical failure reported by an [`Operations`] backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OperationError {
    #[error("{family:?} {id} not found")]
    NotFound { family: Family, id: String },

    #[error("{family:?} {id} already exists")]
    AlreadyExists { family: Family, id: String },

    #[error("user {user} not found")]
    UserNotFound { user: String },

    #[error("username {username} is already used")]
    UserNameAlreadyUsed { username: String },

    #[error("wrong credentials")]
    WrongCredentials,

    #[error("transport document {document} is archived")]
    IsArchived { document: Id<TransportDocument> },

    #[error("transport document {document} cannot be archived: {reason}")]
    IsNotArchivable {
        document: Id<TransportDocument>,
        reason: String,
    },

    #[error("illegal process: {0}")]
    IllegalProcess(String),

    #[error("processing failed: {0}")]
    Processing(String),
}

impl OperationError {
    pub fn not_found<T>(family: Family, id: &Id<T>) -> Self {
        OperationError::NotFound {
            family,
            id: id.to_string(),
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            OperationError::NotFound { .. } => "not_found",
            OperationError::AlreadyExists { .. } => "already_exists",
            OperationError::UserNotFound { .. } => "user_not_found",
            OperationError::UserNameAlreadyUsed { .. } => "user_name_already_used",
            OperationError::WrongCredentials => "wrong_credentials",
            OperationError::IsArchived { .. } => "is_archived",
            OperationError::IsNotArchivable { .. } => "is_not_archivable",
            OperationError::IllegalProcess(_) => "illegal_process",
            OperationError::Processing(_) => "processing",
        }
    }

    pub fn to_remote(&self) -> RemoteError {
        let kind = match self {
            OperationError::UserNotFound { user } => ErrorKind::UserNotFound { user: user.clone() },
            OperationError::UserNameAlreadyUsed { username } => ErrorKind::UserNameAlreadyUsed {
                username: username.clone(),
            },
            OperationError::WrongCredentials => ErrorKind::WrongCredentials,
            OperationError::IsArchived { document } => ErrorKind::IsArchived {
                document: document.to_string(),
            },
            OperationError::IsNotArchivable { document, .. } => ErrorKind::IsNotArchivable {
                document: document.to_string(),
            },
            OperationError::IllegalProcess(_) => ErrorKind::IllegalProcess,
            OperationError::NotFound { .. }
            | OperationError::AlreadyExists { .. }
            | OperationError::Processing(_) => ErrorKind::Processing,
        };
        RemoteError::new(kind, self.to_string())
    }
}

/// Backend the dispatcher hands authorized work to.
///
/// Implementations serialize their own writes; one instance is shared by
/// every connection.
pub trait Operations: Send + Sync {
    /// Verify credentials and return the matching user.
    fn login(&self, username: &str, password: &user::Password) -> Result<User, OperationError>;

    /// Provision the first administrator. Refused once any user exists.
    fn bootstrap(&self, request: user::CreateFull) -> Result<User, OperationError>;

    /// Run an authorized command on behalf of `acting`.
    fn process(&self, command: Command, acting: &Reference<User>)
        -> Result<Outcome, OperationError>;
}
