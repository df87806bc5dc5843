// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Health insurers.

use serde::{Deserialize, Serialize};

use super::{matches, Address, Id, Reference};
use crate::protocol::CommandKind;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insurance {
    pub id: Id<Insurance>,
    pub name: String,
    pub address: Reference<Address>,
}

impl Insurance {
    pub fn renamed(&self, name: String) -> Self {
        Self {
            name,
            ..self.clone()
        }
    }

    pub fn moved_to(&self, address: Reference<Address>) -> Self {
        Self {
            address,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    pub address: Option<Reference<Address>>,
    pub name: Option<String>,
}

impl Filter {
    pub fn accepts(&self, insurance: &Insurance) -> bool {
        matches(&self.address, &insurance.address) && matches(&self.name, &insurance.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    Create {
        /// Institution code (IK), used as identifier.
        insurance_id: String,
        name: String,
        address: Reference<Address>,
    },
    Delete {
        id: Id<Insurance>,
    },
    Move {
        id: Id<Insurance>,
        address: Reference<Address>,
    },
    Update {
        id: Id<Insurance>,
        name: String,
    },
    Get {
        id: Id<Insurance>,
    },
    GetList {
        filter: Filter,
    },
}

impl Command {
    pub fn kind(&self) -> CommandKind {
        match self {
            Command::Create { .. } => CommandKind::InsuranceCreate,
            Command::Delete { .. } => CommandKind::InsuranceDelete,
            Command::Move { .. } => CommandKind::InsuranceMove,
            Command::Update { .. } => CommandKind::InsuranceUpdate,
            Command::Get { .. } => CommandKind::InsuranceGet,
            Command::GetList { .. } => CommandKind::InsuranceGetList,
        }
    }
}
