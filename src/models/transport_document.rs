// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Transport documents: the prescription authorizing one or more transports.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{
    matches, matches_opt, Id, InsuranceData, Patient, Reference, ServiceProvider, TransportReason,
    TransportationType, User,
};
use crate::operations::OperationError;
use crate::protocol::CommandKind;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportDocument {
    pub id: Id<TransportDocument>,
    pub patient: Option<Reference<Patient>>,
    pub insurance_data: Option<Reference<InsuranceData>>,
    pub transport_reason: TransportReason,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub weekly_frequency: Option<u32>,
    pub healthcare_service_provider: Reference<ServiceProvider>,
    pub transportation_type: TransportationType,
    pub additional_info: Option<String>,
    /// Prescribing user.
    pub signature: Reference<User>,
    pub is_archived: bool,
}

impl TransportDocument {
    pub fn update_with(&self, fields: DocumentFields) -> Self {
        Self {
            transport_reason: fields.transport_reason,
            start_date: fields.start_date,
            end_date: fields.end_date,
            weekly_frequency: fields.weekly_frequency,
            healthcare_service_provider: fields.healthcare_service_provider,
            transportation_type: fields.transportation_type,
            additional_info: fields.additional_info,
            signature: fields.signature,
            ..self.clone()
        }
    }

    pub fn assign_patient(
        &self,
        patient: Reference<Patient>,
        insurance_data: Reference<InsuranceData>,
    ) -> Self {
        Self {
            patient: Some(patient),
            insurance_data: Some(insurance_data),
            ..self.clone()
        }
    }

    /// Archived copy of this document.
    ///
    /// A document is archivable once a patient and its insurance data are
    /// assigned, and only once.
    pub fn archive(&self) -> Result<Self, OperationError> {
        if self.is_archived {
            return Err(OperationError::IsNotArchivable {
                document: self.id.clone(),
                reason: "already archived".to_string(),
            });
        }
        if self.patient.is_none() || self.insurance_data.is_none() {
            return Err(OperationError::IsNotArchivable {
                document: self.id.clone(),
                reason: "missing patient or insurance data".to_string(),
            });
        }
        Ok(Self {
            is_archived: true,
            ..self.clone()
        })
    }
}

/// Fields shared by [`Command::Create`] and [`Command::Update`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentFields {
    pub transport_reason: TransportReason,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub weekly_frequency: Option<u32>,
    pub healthcare_service_provider: Reference<ServiceProvider>,
    pub transportation_type: TransportationType,
    pub additional_info: Option<String>,
    pub signature: Reference<User>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    pub patient: Option<Reference<Patient>>,
    pub insurance_data: Option<Reference<InsuranceData>>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub healthcare_service_provider: Option<Reference<ServiceProvider>>,
    pub transportation_type: Option<TransportationType>,
    pub signature: Option<Reference<User>>,
}

impl Filter {
    pub fn accepts(&self, document: &TransportDocument) -> bool {
        matches_opt(&self.patient, &document.patient)
            && matches_opt(&self.insurance_data, &document.insurance_data)
            && matches(&self.start_date, &document.start_date)
            && matches_opt(&self.end_date, &document.end_date)
            && matches(
                &self.healthcare_service_provider,
                &document.healthcare_service_provider,
            )
            && matches(&self.transportation_type, &document.transportation_type)
            && matches(&self.signature, &document.signature)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    Create {
        patient: Option<Reference<Patient>>,
        insurance_data: Option<Reference<InsuranceData>>,
        fields: DocumentFields,
    },
    Update {
        id: Id<TransportDocument>,
        fields: DocumentFields,
    },
    AssignPatient {
        id: Id<TransportDocument>,
        patient: Reference<Patient>,
        insurance_data: Reference<InsuranceData>,
    },
    Archive {
        id: Id<TransportDocument>,
    },
    Delete {
        id: Id<TransportDocument>,
    },
    Get {
        id: Id<TransportDocument>,
    },
    GetList {
        filter: Filter,
    },
}

impl Command {
    pub fn kind(&self) -> CommandKind {
        match self {
            Command::Create { .. } => CommandKind::TransportDocumentCreate,
            Command::Update { .. } => CommandKind::TransportDocumentUpdate,
            Command::AssignPatient { .. } => CommandKind::TransportDocumentAssignPatient,
            Command::Archive { .. } => CommandKind::TransportDocumentArchive,
            Command::Delete { .. } => CommandKind::TransportDocumentDelete,
            Command::Get { .. } => CommandKind::TransportDocumentGet,
            Command::GetList { .. } => CommandKind::TransportDocumentGetList,
        }
    }
}
