// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! A single transport carried out under a transport document.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{
    matches, matches_opt, Address, Direction, Id, PatientCondition, Reference, ServiceProvider,
    TransportDocument,
};
use crate::protocol::CommandKind;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportDetails {
    pub id: Id<TransportDetails>,
    pub transport_document: Reference<TransportDocument>,
    pub transport_date: NaiveDate,
    pub start_address: Option<Reference<Address>>,
    pub end_address: Option<Reference<Address>>,
    pub direction: Option<Direction>,
    pub patient_condition: Option<PatientCondition>,
    pub transport_provider: Option<Reference<ServiceProvider>>,
    pub tour_number: Option<String>,
    pub payment_exemption: Option<bool>,
    pub patient_signature: Option<String>,
    pub patient_signature_date: Option<DateTime<Utc>>,
    pub transporter_signature: Option<String>,
    pub transporter_signature_date: Option<DateTime<Utc>>,
}

impl TransportDetails {
    pub fn new(
        id: Id<TransportDetails>,
        transport_document: Reference<TransportDocument>,
        transport_date: NaiveDate,
    ) -> Self {
        Self {
            id,
            transport_document,
            transport_date,
            start_address: None,
            end_address: None,
            direction: None,
            patient_condition: None,
            transport_provider: None,
            tour_number: None,
            payment_exemption: None,
            patient_signature: None,
            patient_signature_date: None,
            transporter_signature: None,
            transporter_signature_date: None,
        }
    }

    pub fn update_with(&self, update: RouteUpdate) -> Self {
        Self {
            start_address: update.start_address,
            end_address: update.end_address,
            direction: update.direction,
            patient_condition: update.patient_condition,
            tour_number: update.tour_number,
            payment_exemption: update.payment_exemption,
            ..self.clone()
        }
    }

    pub fn signed_by_patient(&self, signature: String, date: DateTime<Utc>) -> Self {
        Self {
            patient_signature: Some(signature),
            patient_signature_date: Some(date),
            ..self.clone()
        }
    }

    pub fn signed_by_transporter(&self, signature: String, date: DateTime<Utc>) -> Self {
        Self {
            transporter_signature: Some(signature),
            transporter_signature_date: Some(date),
            ..self.clone()
        }
    }

    pub fn assigned_to(&self, provider: Reference<ServiceProvider>) -> Self {
        Self {
            transport_provider: Some(provider),
            ..self.clone()
        }
    }
}

/// Route and condition fields replaced by [`Command::Update`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteUpdate {
    pub start_address: Option<Reference<Address>>,
    pub end_address: Option<Reference<Address>>,
    pub direction: Option<Direction>,
    pub patient_condition: Option<PatientCondition>,
    pub tour_number: Option<String>,
    pub payment_exemption: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    pub transport_document: Option<Reference<TransportDocument>>,
    pub transport_date: Option<NaiveDate>,
    /// Matches either the start or the end address.
    pub address: Option<Reference<Address>>,
    pub direction: Option<Direction>,
    pub transport_provider: Option<Reference<ServiceProvider>>,
}

impl Filter {
    pub fn accepts(&self, details: &TransportDetails) -> bool {
        let address_matches = match &self.address {
            None => true,
            Some(wanted) => {
                details.start_address.as_ref() == Some(wanted)
                    || details.end_address.as_ref() == Some(wanted)
            }
        };

        address_matches
            && matches(&self.transport_document, &details.transport_document)
            && matches(&self.transport_date, &details.transport_date)
            && matches_opt(&self.direction, &details.direction)
            && matches_opt(&self.transport_provider, &details.transport_provider)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    AssignTransportProvider {
        id: Id<TransportDetails>,
        transport_provider: Reference<ServiceProvider>,
    },
    Create {
        transport_document: Reference<TransportDocument>,
        transport_date: NaiveDate,
    },
    Delete {
        id: Id<TransportDetails>,
    },
    Update {
        id: Id<TransportDetails>,
        route: RouteUpdate,
    },
    UpdatePatientSignature {
        id: Id<TransportDetails>,
        signature: String,
        signature_date: DateTime<Utc>,
    },
    UpdateTransporterSignature {
        id: Id<TransportDetails>,
        signature: String,
        signature_date: DateTime<Utc>,
    },
    Get {
        id: Id<TransportDetails>,
    },
    GetList {
        filter: Filter,
    },
    GetListByIdList {
        ids: Vec<Id<TransportDetails>>,
    },
}

impl Command {
    pub fn kind(&self) -> CommandKind {
        match self {
            Command::AssignTransportProvider { .. } => {
                CommandKind::TransportDetailsAssignTransportProvider
            }
            Command::Create { .. } => CommandKind::TransportDetailsCreate,
            Command::Delete { .. } => CommandKind::TransportDetailsDelete,
            Command::Update { .. } => CommandKind::TransportDetailsUpdate,
            Command::UpdatePatientSignature { .. } => {
                CommandKind::TransportDetailsUpdatePatientSignature
            }
            Command::UpdateTransporterSignature { .. } => {
                CommandKind::TransportDetailsUpdateTransporterSignature
            }
            Command::Get { .. } => CommandKind::TransportDetailsGet,
            Command::GetList { .. } => CommandKind::TransportDetailsGetList,
            Command::GetListByIdList { .. } => CommandKind::TransportDetailsGetListByIdList,
        }
    }
}
