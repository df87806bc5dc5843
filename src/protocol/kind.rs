// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Command kind tags.
//!
//! Every command variant maps to exactly one [`CommandKind`]. Authorization
//! is decided on the tag alone, never on the payload.

use serde::{Deserialize, Serialize};

/// Entity family a command belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Family {
    Address,
    Insurance,
    InsuranceData,
    Patient,
    ServiceProvider,
    TransportDetails,
    TransportDocument,
    User,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommandKind {
    AddressCreate,
    AddressDelete,
    AddressUpdate,
    AddressGet,
    AddressGetList,

    InsuranceCreate,
    InsuranceDelete,
    InsuranceMove,
    InsuranceUpdate,
    InsuranceGet,
    InsuranceGetList,

    InsuranceDataCreate,
    InsuranceDataDelete,
    InsuranceDataGet,
    InsuranceDataGetList,

    PatientCreate,
    PatientCreateWithInsuranceData,
    PatientDelete,
    PatientMove,
    PatientUpdate,
    PatientUpdateInsuranceData,
    PatientGet,
    PatientGetList,

    ServiceProviderCreate,
    ServiceProviderCreateFull,
    ServiceProviderDelete,
    ServiceProviderMove,
    ServiceProviderUpdate,
    ServiceProviderUpdateService,
    ServiceProviderGet,
    ServiceProviderGetList,

    TransportDetailsAssignTransportProvider,
    TransportDetailsCreate,
    TransportDetailsDelete,
    TransportDetailsUpdate,
    TransportDetailsUpdatePatientSignature,
    TransportDetailsUpdateTransporterSignature,
    TransportDetailsGet,
    TransportDetailsGetList,
    TransportDetailsGetListByIdList,

    TransportDocumentCreate,
    TransportDocumentUpdate,
    TransportDocumentAssignPatient,
    TransportDocumentArchive,
    TransportDocumentDelete,
    TransportDocumentGet,
    TransportDocumentGetList,

    UserCreate,
    UserCreateFull,
    UserDelete,
    UserUpdate,
    UserUpdateRole,
    UserUpdateCredentials,
    UserLoginUser,
    UserGet,
    UserGetList,
}

impl CommandKind {
    pub const ALL: [CommandKind; 56] = [
        CommandKind::AddressCreate,
        CommandKind::AddressDelete,
        CommandKind::AddressUpdate,
        CommandKind::AddressGet,
        CommandKind::AddressGetList,
        CommandKind::InsuranceCreate,
        CommandKind::InsuranceDelete,
        CommandKind::InsuranceMove,
        CommandKind::InsuranceUpdate,
        CommandKind::InsuranceGet,
        CommandKind::InsuranceGetList,
        CommandKind::InsuranceDataCreate,
        CommandKind::InsuranceDataDelete,
        CommandKind::InsuranceDataGet,
        CommandKind::InsuranceDataGetList,
        CommandKind::PatientCreate,
        CommandKind::PatientCreateWithInsuranceData,
        CommandKind::PatientDelete,
        CommandKind::PatientMove,
        CommandKind::PatientUpdate,
        CommandKind::PatientUpdateInsuranceData,
        CommandKind::PatientGet,
        CommandKind::PatientGetList,
        CommandKind::ServiceProviderCreate,
        CommandKind::ServiceProviderCreateFull,
        CommandKind::ServiceProviderDelete,
        CommandKind::ServiceProviderMove,
        CommandKind::ServiceProviderUpdate,
        CommandKind::ServiceProviderUpdateService,
        CommandKind::ServiceProviderGet,
        CommandKind::ServiceProviderGetList,
        CommandKind::TransportDetailsAssignTransportProvider,
        CommandKind::TransportDetailsCreate,
        CommandKind::TransportDetailsDelete,
        CommandKind::TransportDetailsUpdate,
        CommandKind::TransportDetailsUpdatePatientSignature,
        CommandKind::TransportDetailsUpdateTransporterSignature,
        CommandKind::TransportDetailsGet,
        CommandKind::TransportDetailsGetList,
        CommandKind::TransportDetailsGetListByIdList,
        CommandKind::TransportDocumentCreate,
        CommandKind::TransportDocumentUpdate,
        CommandKind::TransportDocumentAssignPatient,
        CommandKind::TransportDocumentArchive,
        CommandKind::TransportDocumentDelete,
        CommandKind::TransportDocumentGet,
        CommandKind::TransportDocumentGetList,
        CommandKind::UserCreate,
        CommandKind::UserCreateFull,
        CommandKind::UserDelete,
        CommandKind::UserUpdate,
        CommandKind::UserUpdateRole,
        CommandKind::UserUpdateCredentials,
        CommandKind::UserLoginUser,
        CommandKind::UserGet,
        CommandKind::UserGetList,
    ];

    /// Read-only lookups: `Get`, `GetList` and `GetListByIdList`.
    pub fn is_query(&self) -> bool {
        matches!(
            self,
            CommandKind::AddressGet
                | CommandKind::AddressGetList
                | CommandKind::InsuranceGet
                | CommandKind::InsuranceGetList
                | CommandKind::InsuranceDataGet
                | CommandKind::InsuranceDataGetList
                | CommandKind::PatientGet
                | CommandKind::PatientGetList
                | CommandKind::ServiceProviderGet
                | CommandKind::ServiceProviderGetList
                | CommandKind::TransportDetailsGet
                | CommandKind::TransportDetailsGetList
                | CommandKind::TransportDetailsGetListByIdList
                | CommandKind::TransportDocumentGet
                | CommandKind::TransportDocumentGetList
                | CommandKind::UserGet
                | CommandKind::UserGetList
        )
    }

    /// Queries answered with a list rather than a single record.
    pub fn returns_list(&self) -> bool {
        matches!(
            self,
            CommandKind::AddressGetList
                | CommandKind::InsuranceGetList
                | CommandKind::InsuranceDataGetList
                | CommandKind::PatientGetList
                | CommandKind::ServiceProviderGetList
                | CommandKind::TransportDetailsGetList
                | CommandKind::TransportDetailsGetListByIdList
                | CommandKind::TransportDocumentGetList
                | CommandKind::UserGetList
        )
    }

    pub fn family(&self) -> Family {
        use CommandKind::*;
        match self {
            AddressCreate | AddressDelete | AddressUpdate | AddressGet | AddressGetList => {
                Family::Address
            }
            InsuranceCreate | InsuranceDelete | InsuranceMove | InsuranceUpdate | InsuranceGet
            | InsuranceGetList => Family::Insurance,
            InsuranceDataCreate | InsuranceDataDelete | InsuranceDataGet
            | InsuranceDataGetList => Family::InsuranceData,
            PatientCreate
            | PatientCreateWithInsuranceData
            | PatientDelete
            | PatientMove
            | PatientUpdate
            | PatientUpdateInsuranceData
            | PatientGet
            | PatientGetList => Family::Patient,
            ServiceProviderCreate
            | ServiceProviderCreateFull
            | ServiceProviderDelete
            | ServiceProviderMove
            | ServiceProviderUpdate
            | ServiceProviderUpdateService
            | ServiceProviderGet
            | ServiceProviderGetList => Family::ServiceProvider,
            TransportDetailsAssignTransportProvider
            | TransportDetailsCreate
            | TransportDetailsDelete
            | TransportDetailsUpdate
            | TransportDetailsUpdatePatientSignature
            | TransportDetailsUpdateTransporterSignature
            | TransportDetailsGet
            | TransportDetailsGetList
            | TransportDetailsGetListByIdList => Family::TransportDetails,
            TransportDocumentCreate
            | TransportDocumentUpdate
            | TransportDocumentAssignPatient
            | TransportDocumentArchive
            | TransportDocumentDelete
            | TransportDocumentGet
            | TransportDocumentGetList => Family::TransportDocument,
            UserCreate | UserCreateFull | UserDelete | UserUpdate | UserUpdateRole
            | UserUpdateCredentials | UserLoginUser | UserGet | UserGetList => Family::User,
        }
    }
}
