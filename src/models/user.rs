// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User accounts. A user's identifier is its login name.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{address, matches, service_provider, Address, Id, Reference, ServiceProvider};
use crate::auth::UserRole;
use crate::protocol::CommandKind;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Id<User>,
    pub last_name: String,
    pub first_name: String,
    pub address: Reference<Address>,
    pub service_provider: Reference<ServiceProvider>,
    pub role: UserRole,
}

impl User {
    pub fn update_with(
        &self,
        last_name: String,
        first_name: String,
        address: Reference<Address>,
        service_provider: Reference<ServiceProvider>,
    ) -> Self {
        Self {
            last_name,
            first_name,
            address,
            service_provider,
            ..self.clone()
        }
    }

    pub fn with_role(&self, role: UserRole) -> Self {
        Self {
            role,
            ..self.clone()
        }
    }

    pub fn renamed_to(&self, id: Id<User>) -> Self {
        Self {
            id,
            ..self.clone()
        }
    }
}

/// Plain-text password as received on the wire. Redacted in debug output.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Password(String);

impl Password {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(***)")
    }
}

impl From<&str> for Password {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// User creation that also creates the user's address and organization.
///
/// Doubles as the bootstrap message provisioning the first administrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateFull {
    pub username: String,
    pub password: Password,
    pub last_name: String,
    pub first_name: String,
    pub address: address::Create,
    pub service_provider: service_provider::CreateFull,
    pub role: UserRole,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    pub last_name: Option<String>,
    pub first_name: Option<String>,
    pub address: Option<Reference<Address>>,
    pub service_provider: Option<Reference<ServiceProvider>>,
    pub role: Option<UserRole>,
}

impl Filter {
    pub fn accepts(&self, user: &User) -> bool {
        matches(&self.last_name, &user.last_name)
            && matches(&self.first_name, &user.first_name)
            && matches(&self.address, &user.address)
            && matches(&self.service_provider, &user.service_provider)
            && matches(&self.role, &user.role)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    Create {
        username: String,
        password: Password,
        last_name: String,
        first_name: String,
        address: Reference<Address>,
        service_provider: Reference<ServiceProvider>,
        role: UserRole,
    },
    CreateFull(CreateFull),
    Delete {
        id: Id<User>,
    },
    Update {
        id: Id<User>,
        last_name: String,
        first_name: String,
        address: Reference<Address>,
        service_provider: Reference<ServiceProvider>,
    },
    UpdateRole {
        id: Id<User>,
        role: UserRole,
    },
    UpdateCredentials {
        id: Id<User>,
        new_username: String,
        old_password: Password,
        new_password: Password,
    },
    LoginUser {
        username: String,
        password: Password,
    },
    Get {
        id: Id<User>,
    },
    GetList {
        filter: Filter,
    },
}

impl Command {
    pub fn kind(&self) -> CommandKind {
        match self {
            Command::Create { .. } => CommandKind::UserCreate,
            Command::CreateFull(_) => CommandKind::UserCreateFull,
            Command::Delete { .. } => CommandKind::UserDelete,
            Command::Update { .. } => CommandKind::UserUpdate,
            Command::UpdateRole { .. } => CommandKind::UserUpdateRole,
            Command::UpdateCredentials { .. } => CommandKind::UserUpdateCredentials,
            Command::LoginUser { .. } => CommandKind::UserLoginUser,
            Command::Get { .. } => CommandKind::UserGet,
            Command::GetList { .. } => CommandKind::UserGetList,
        }
    }
}
