// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Patients, identified by their insurance number.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{matches, Address, Id, Insurance, InsuranceData, Reference};
use crate::protocol::CommandKind;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patient {
    pub insurance_number: Id<Patient>,
    pub insurance_data: Reference<InsuranceData>,
    pub last_name: String,
    pub first_name: String,
    pub birth_date: NaiveDate,
    pub address: Reference<Address>,
}

impl Patient {
    pub fn renamed(&self, last_name: String, first_name: String) -> Self {
        Self {
            last_name,
            first_name,
            ..self.clone()
        }
    }

    pub fn moved_to(&self, address: Reference<Address>) -> Self {
        Self {
            address,
            ..self.clone()
        }
    }

    pub fn with_insurance_data(&self, insurance_data: Reference<InsuranceData>) -> Self {
        Self {
            insurance_data,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    pub address: Option<Reference<Address>>,
    pub last_name: Option<String>,
    pub first_name: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub insurance_data: Option<Reference<InsuranceData>>,
}

impl Filter {
    pub fn accepts(&self, patient: &Patient) -> bool {
        matches(&self.address, &patient.address)
            && matches(&self.last_name, &patient.last_name)
            && matches(&self.first_name, &patient.first_name)
            && matches(&self.birth_date, &patient.birth_date)
            && matches(&self.insurance_data, &patient.insurance_data)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    Create {
        insurance_number: String,
        insurance_data: Reference<InsuranceData>,
        last_name: String,
        first_name: String,
        birth_date: NaiveDate,
        address: Reference<Address>,
    },
    /// Creates the patient together with its insurance membership.
    CreateWithInsuranceData {
        insurance_number: String,
        insurance: Reference<Insurance>,
        insurance_status: i32,
        last_name: String,
        first_name: String,
        birth_date: NaiveDate,
        address: Reference<Address>,
    },
    Delete {
        insurance_number: Id<Patient>,
    },
    Move {
        insurance_number: Id<Patient>,
        address: Reference<Address>,
    },
    Update {
        insurance_number: Id<Patient>,
        last_name: String,
        first_name: String,
    },
    UpdateInsuranceData {
        insurance_number: Id<Patient>,
        insurance_data: Reference<InsuranceData>,
    },
    Get {
        id: Id<Patient>,
    },
    GetList {
        filter: Filter,
    },
}

impl Command {
    pub fn kind(&self) -> CommandKind {
        match self {
            Command::Create { .. } => CommandKind::PatientCreate,
            Command::CreateWithInsuranceData { .. } => CommandKind::PatientCreateWithInsuranceData,
            Command::Delete { .. } => CommandKind::PatientDelete,
            Command::Move { .. } => CommandKind::PatientMove,
            Command::Update { .. } => CommandKind::PatientUpdate,
            Command::UpdateInsuranceData { .. } => CommandKind::PatientUpdateInsuranceData,
            Command::Get { .. } => CommandKind::PatientGet,
            Command::GetList { .. } => CommandKind::PatientGetList,
        }
    }
}
