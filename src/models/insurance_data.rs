// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Insurance membership of a patient.

use serde::{Deserialize, Serialize};

use super::{matches, Id, Insurance, Patient, Reference};
use crate::protocol::CommandKind;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsuranceData {
    pub id: Id<InsuranceData>,
    pub patient: Reference<Patient>,
    pub insurance: Reference<Insurance>,
    pub insurance_status: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    pub patient: Option<Reference<Patient>>,
    pub insurance: Option<Reference<Insurance>>,
}

impl Filter {
    pub fn accepts(&self, data: &InsuranceData) -> bool {
        matches(&self.patient, &data.patient) && matches(&self.insurance, &data.insurance)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    Create {
        patient: Reference<Patient>,
        insurance: Reference<Insurance>,
        insurance_status: i32,
    },
    Delete {
        id: Id<InsuranceData>,
    },
    Get {
        id: Id<InsuranceData>,
    },
    GetList {
        filter: Filter,
    },
}

impl Command {
    pub fn kind(&self) -> CommandKind {
        match self {
            Command::Create { .. } => CommandKind::InsuranceDataCreate,
            Command::Delete { .. } => CommandKind::InsuranceDataDelete,
            Command::Get { .. } => CommandKind::InsuranceDataGet,
            Command::GetList { .. } => CommandKind::InsuranceDataGetList,
        }
    }
}
