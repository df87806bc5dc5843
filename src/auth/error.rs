// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication and authorization errors.

use crate::error::{ErrorKind, RemoteError};
use crate::models::{Id, User};

use super::roles::UserRole;

/// Failure of the session's authentication gate or of the policy check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// A command arrived before any login
    UserNotProvided,
    /// Unknown username or wrong password
    WrongCredentials,
    /// Policy denies the command for this role
    UserNotAllowed { user: Id<User>, role: UserRole },
    /// Login for another account on an authenticated session
    IllegalProcess(String),
}

impl AuthError {
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::UserNotProvided => "user_not_provided",
            AuthError::WrongCredentials => "wrong_credentials",
            AuthError::UserNotAllowed { .. } => "user_not_allowed",
            AuthError::IllegalProcess(_) => "illegal_process",
        }
    }

    pub fn to_remote(&self) -> RemoteError {
        let kind = match self {
            AuthError::UserNotProvided => ErrorKind::UserNotProvided,
            AuthError::WrongCredentials => ErrorKind::WrongCredentials,
            AuthError::UserNotAllowed { user, role } => ErrorKind::UserNotAllowed {
                user: user.to_string(),
                role: *role,
            },
            AuthError::IllegalProcess(_) => ErrorKind::IllegalProcess,
        };
        RemoteError::new(kind, self.to_string())
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::UserNotProvided => write!(f, "Log in before sending commands"),
            AuthError::WrongCredentials => write!(f, "Username or password is wrong"),
            AuthError::UserNotAllowed { user, role } => {
                write!(f, "User {user} with role {role} is not allowed to run this command")
            }
            AuthError::IllegalProcess(msg) => write!(f, "Illegal process: {msg}"),
        }
    }
}

impl std::error::Error for AuthError {}
