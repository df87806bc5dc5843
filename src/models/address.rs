// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Postal addresses shared by patients, providers, insurers and users.

use serde::{Deserialize, Serialize};

use super::{matches, matches_opt, Id};
use crate::protocol::CommandKind;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub id: Id<Address>,
    /// Optional label, e.g. a ward or building name.
    pub name: Option<String>,
    pub street_name: String,
    pub house_number: String,
    pub country: String,
    pub post_code: String,
    pub city: String,
}

impl Address {
    pub fn update_with(&self, name: Option<String>) -> Self {
        Self {
            name,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Create {
    pub name: Option<String>,
    pub street_name: String,
    pub house_number: String,
    pub country: String,
    pub post_code: String,
    pub city: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    pub street_name: Option<String>,
    pub post_code: Option<String>,
    pub city: Option<String>,
    pub name: Option<String>,
}

impl Filter {
    pub fn accepts(&self, address: &Address) -> bool {
        matches(&self.street_name, &address.street_name)
            && matches(&self.post_code, &address.post_code)
            && matches(&self.city, &address.city)
            && matches_opt(&self.name, &address.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    Create(Create),
    Delete { id: Id<Address> },
    Update { id: Id<Address>, name: Option<String> },
    Get { id: Id<Address> },
    GetList { filter: Filter },
}

impl Command {
    pub fn kind(&self) -> CommandKind {
        match self {
            Command::Create(_) => CommandKind::AddressCreate,
            Command::Delete { .. } => CommandKind::AddressDelete,
            Command::Update { .. } => CommandKind::AddressUpdate,
            Command::Get { .. } => CommandKind::AddressGet,
            Command::GetList { .. } => CommandKind::AddressGetList,
        }
    }
}
