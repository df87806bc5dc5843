// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wire messages and the typed command/response unions they carry.

use serde::{Deserialize, Serialize};

use super::{CommandKind, Family};
use crate::crypto::{Envelope, PublicKeyMessage};
use crate::error::RemoteError;
use crate::models::{
    address, insurance, insurance_data, patient, service_provider, transport_details,
    transport_document, user, Address, Insurance, InsuranceData, Patient, ServiceProvider,
    TransportDetails, TransportDocument, User,
};

/// Everything that can travel in one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "body")]
pub enum WireMessage {
    /// Handshake key, always sent in the clear.
    PublicKey(PublicKeyMessage),
    /// Any other message once encryption is established.
    Envelope(Envelope),
    /// Liveness probe without payload.
    ConnectionTest,
    Command(Command),
    Response(Response),
}

impl WireMessage {
    /// Short label for log fields.
    pub fn label(&self) -> &'static str {
        match self {
            WireMessage::PublicKey(_) => "public_key",
            WireMessage::Envelope(_) => "envelope",
            WireMessage::ConnectionTest => "connection_test",
            WireMessage::Command(_) => "command",
            WireMessage::Response(_) => "response",
        }
    }
}

/// A request against one entity family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    Address(address::Command),
    Insurance(insurance::Command),
    InsuranceData(insurance_data::Command),
    Patient(patient::Command),
    ServiceProvider(service_provider::Command),
    TransportDetails(transport_details::Command),
    TransportDocument(transport_document::Command),
    User(user::Command),
}

impl Command {
    pub fn kind(&self) -> CommandKind {
        match self {
            Command::Address(cmd) => cmd.kind(),
            Command::Insurance(cmd) => cmd.kind(),
            Command::InsuranceData(cmd) => cmd.kind(),
            Command::Patient(cmd) => cmd.kind(),
            Command::ServiceProvider(cmd) => cmd.kind(),
            Command::TransportDetails(cmd) => cmd.kind(),
            Command::TransportDocument(cmd) => cmd.kind(),
            Command::User(cmd) => cmd.kind(),
        }
    }
}

/// A single record returned by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Entity {
    Address(Address),
    Insurance(Insurance),
    InsuranceData(InsuranceData),
    Patient(Patient),
    ServiceProvider(ServiceProvider),
    TransportDetails(TransportDetails),
    TransportDocument(TransportDocument),
    User(User),
}

impl Entity {
    pub fn family(&self) -> Family {
        match self {
            Entity::Address(_) => Family::Address,
            Entity::Insurance(_) => Family::Insurance,
            Entity::InsuranceData(_) => Family::InsuranceData,
            Entity::Patient(_) => Family::Patient,
            Entity::ServiceProvider(_) => Family::ServiceProvider,
            Entity::TransportDetails(_) => Family::TransportDetails,
            Entity::TransportDocument(_) => Family::TransportDocument,
            Entity::User(_) => Family::User,
        }
    }
}

/// The records matched by a `GetList` query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityList {
    Address(Vec<Address>),
    Insurance(Vec<Insurance>),
    InsuranceData(Vec<InsuranceData>),
    Patient(Vec<Patient>),
    ServiceProvider(Vec<ServiceProvider>),
    TransportDetails(Vec<TransportDetails>),
    TransportDocument(Vec<TransportDocument>),
    User(Vec<User>),
}

impl EntityList {
    pub fn family(&self) -> Family {
        match self {
            EntityList::Address(_) => Family::Address,
            EntityList::Insurance(_) => Family::Insurance,
            EntityList::InsuranceData(_) => Family::InsuranceData,
            EntityList::Patient(_) => Family::Patient,
            EntityList::ServiceProvider(_) => Family::ServiceProvider,
            EntityList::TransportDetails(_) => Family::TransportDetails,
            EntityList::TransportDocument(_) => Family::TransportDocument,
            EntityList::User(_) => Family::User,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            EntityList::Address(items) => items.len(),
            EntityList::Insurance(items) => items.len(),
            EntityList::InsuranceData(items) => items.len(),
            EntityList::Patient(items) => items.len(),
            EntityList::ServiceProvider(items) => items.len(),
            EntityList::TransportDetails(items) => items.len(),
            EntityList::TransportDocument(items) => items.len(),
            EntityList::User(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Server answer to one command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Response {
    Entity(Entity),
    List(EntityList),
    Error(RemoteError),
}

/// A record type with its own command family.
pub trait Record: Sized {
    const FAMILY: Family;

    /// Returns the entity back when it belongs to another family.
    fn from_entity(entity: Entity) -> Result<Self, Entity>;

    /// Returns the list back when it belongs to another family.
    fn from_list(list: EntityList) -> Result<Vec<Self>, EntityList>;
}

/// A family command, typed by the record it answers with.
pub trait FamilyCommand: Into<Command> {
    type Record: Record;
}

macro_rules! entity_family {
    ($variant:ident, $record:ty, $command:ty) => {
        impl From<$command> for Command {
            fn from(cmd: $command) -> Self {
                Command::$variant(cmd)
            }
        }

        impl From<$record> for Entity {
            fn from(record: $record) -> Self {
                Entity::$variant(record)
            }
        }

        impl From<Vec<$record>> for EntityList {
            fn from(records: Vec<$record>) -> Self {
                EntityList::$variant(records)
            }
        }

        impl Record for $record {
            const FAMILY: Family = Family::$variant;

            fn from_entity(entity: Entity) -> Result<Self, Entity> {
                match entity {
                    Entity::$variant(record) => Ok(record),
                    other => Err(other),
                }
            }

            fn from_list(list: EntityList) -> Result<Vec<Self>, EntityList> {
                match list {
                    EntityList::$variant(records) => Ok(records),
                    other => Err(other),
                }
            }
        }

        impl FamilyCommand for $command {
            type Record = $record;
        }
    };
}

entity_family!(Address, Address, address::Command);
entity_family!(Insurance, Insurance, insurance::Command);
entity_family!(InsuranceData, InsuranceData, insurance_data::Command);
entity_family!(Patient, Patient, patient::Command);
entity_family!(ServiceProvider, ServiceProvider, service_provider::Command);
entity_family!(TransportDetails, TransportDetails, transport_details::Command);
entity_family!(TransportDocument, TransportDocument, transport_document::Command);
entity_family!(User, User, user::Command);
