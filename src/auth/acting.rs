// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! The user a session acts on behalf of.

use serde::{Deserialize, Serialize};

use crate::models::{Id, Reference, User};

use super::roles::UserRole;

/// Identity and role captured at login.
///
/// Set at most once per session, by a successful login or by the
/// bootstrap user creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActingUser {
    pub id: Id<User>,
    pub role: UserRole,
}

impl ActingUser {
    pub fn reference(&self) -> Reference<User> {
        self.id.reference()
    }
}

impl From<&User> for ActingUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            role: user.role,
        }
    }
}
