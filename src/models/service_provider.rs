// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Healthcare and transport service providers.

use serde::{Deserialize, Serialize};

use super::{address, matches, Address, Id, Reference};
use crate::protocol::CommandKind;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceProvider {
    pub id: Id<ServiceProvider>,
    pub name: String,
    /// Free-form category, e.g. "hospital" or "ambulance service".
    pub kind: String,
    pub is_healthcare_provider: bool,
    pub is_transport_provider: bool,
    pub address: Reference<Address>,
    pub contact_info: Option<String>,
}

impl ServiceProvider {
    pub fn update_with(&self, name: String, kind: String, contact_info: Option<String>) -> Self {
        Self {
            name,
            kind,
            contact_info,
            ..self.clone()
        }
    }

    pub fn moved_to(&self, address: Reference<Address>) -> Self {
        Self {
            address,
            ..self.clone()
        }
    }

    pub fn with_services(&self, healthcare: bool, transport: bool) -> Self {
        Self {
            is_healthcare_provider: healthcare,
            is_transport_provider: transport,
            ..self.clone()
        }
    }
}

/// Provider creation that also creates its address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateFull {
    pub service_provider_id: String,
    pub name: String,
    pub kind: String,
    pub is_healthcare_provider: bool,
    pub is_transport_provider: bool,
    pub address: address::Create,
    pub contact_info: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    pub address: Option<Reference<Address>>,
    pub kind: Option<String>,
    pub name: Option<String>,
}

impl Filter {
    pub fn accepts(&self, provider: &ServiceProvider) -> bool {
        matches(&self.address, &provider.address)
            && matches(&self.kind, &provider.kind)
            && matches(&self.name, &provider.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    Create {
        service_provider_id: String,
        name: String,
        kind: String,
        is_healthcare_provider: bool,
        is_transport_provider: bool,
        address: Reference<Address>,
        contact_info: Option<String>,
    },
    CreateFull(CreateFull),
    Delete {
        id: Id<ServiceProvider>,
    },
    Move {
        id: Id<ServiceProvider>,
        address: Reference<Address>,
    },
    Update {
        id: Id<ServiceProvider>,
        name: String,
        kind: String,
        contact_info: Option<String>,
    },
    UpdateService {
        id: Id<ServiceProvider>,
        provides_healthcare: bool,
        provides_transport: bool,
    },
    Get {
        id: Id<ServiceProvider>,
    },
    GetList {
        filter: Filter,
    },
}

impl Command {
    pub fn kind(&self) -> CommandKind {
        match self {
            Command::Create { .. } => CommandKind::ServiceProviderCreate,
            Command::CreateFull(_) => CommandKind::ServiceProviderCreateFull,
            Command::Delete { .. } => CommandKind::ServiceProviderDelete,
            Command::Move { .. } => CommandKind::ServiceProviderMove,
            Command::Update { .. } => CommandKind::ServiceProviderUpdate,
            Command::UpdateService { .. } => CommandKind::ServiceProviderUpdateService,
            Command::Get { .. } => CommandKind::ServiceProviderGet,
            Command::GetList { .. } => CommandKind::ServiceProviderGetList,
        }
    }
}
