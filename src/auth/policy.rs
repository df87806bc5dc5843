// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Role-based command policy.
//!
//! Each role has an explicit allow-list. A fixed baseline is appended to
//! every role:
//!
//! - every `Get`, `GetList` and `GetListByIdList`
//! - `Address::Create`
//! - `User::LoginUser`, `User::Update` and `User::UpdateCredentials`
//!
//! Lists are authored per role and may repeat entries of other roles.

use std::collections::{HashMap, HashSet};

use lazy_static::lazy_static;

use crate::protocol::CommandKind;

use super::acting::ActingUser;
use super::error::AuthError;
use super::roles::UserRole;

lazy_static! {
    static ref POLICY: AuthorizationPolicy = AuthorizationPolicy::build();
}

/// Read-only map from role to the command kinds it may run.
#[derive(Debug)]
pub struct AuthorizationPolicy {
    table: HashMap<UserRole, HashSet<CommandKind>>,
}

impl AuthorizationPolicy {
    /// The process-wide table, built on first use.
    pub fn global() -> &'static Self {
        &POLICY
    }

    pub fn is_allowed(&self, role: UserRole, kind: CommandKind) -> bool {
        self.table
            .get(&role)
            .is_some_and(|allowed| allowed.contains(&kind))
    }

    pub fn allowed_commands(&self, role: UserRole) -> impl Iterator<Item = CommandKind> + '_ {
        self.table.get(&role).into_iter().flatten().copied()
    }

    /// `Ok` when `user`'s role may run `kind`.
    pub fn authorize(&self, user: &ActingUser, kind: CommandKind) -> Result<(), AuthError> {
        if self.is_allowed(user.role, kind) {
            Ok(())
        } else {
            Err(AuthError::UserNotAllowed {
                user: user.id.clone(),
                role: user.role,
            })
        }
    }

    fn build() -> Self {
        let table = UserRole::ALL
            .into_iter()
            .map(|role| {
                let mut allowed: HashSet<CommandKind> =
                    explicit_commands(role).iter().copied().collect();
                allowed.extend(baseline());
                (role, allowed)
            })
            .collect();
        Self { table }
    }
}

fn baseline() -> impl Iterator<Item = CommandKind> {
    CommandKind::ALL
        .into_iter()
        .filter(CommandKind::is_query)
        .chain([
            CommandKind::AddressCreate,
            CommandKind::UserLoginUser,
            CommandKind::UserUpdate,
            CommandKind::UserUpdateCredentials,
        ])
}

fn explicit_commands(role: UserRole) -> &'static [CommandKind] {
    use CommandKind::*;

    match role {
        UserRole::HealthcareAdmin => &[
            AddressUpdate,
            ServiceProviderCreateFull,
            ServiceProviderMove,
            ServiceProviderUpdate,
            UserCreate,
            UserDelete,
            UserUpdateRole,
        ],
        UserRole::HealthcareDoctor | UserRole::HealthcareUser => &[
            InsuranceCreate,
            InsuranceUpdate,
            InsuranceMove,
            InsuranceDataCreate,
            TransportDetailsCreate,
            TransportDocumentAssignPatient,
            TransportDocumentCreate,
            TransportDocumentDelete,
            TransportDocumentUpdate,
        ],
        UserRole::TransportAdmin => &[
            AddressUpdate,
            ServiceProviderMove,
            ServiceProviderUpdate,
            UserCreate,
            UserDelete,
            UserUpdateRole,
        ],
        UserRole::TransportDoctor => &[
            InsuranceCreate,
            InsuranceUpdate,
            InsuranceMove,
            InsuranceDataCreate,
            TransportDetailsAssignTransportProvider,
            TransportDetailsCreate,
            TransportDetailsDelete,
            TransportDetailsUpdate,
            TransportDetailsUpdatePatientSignature,
            TransportDetailsUpdateTransporterSignature,
            TransportDocumentAssignPatient,
            TransportDocumentCreate,
            TransportDocumentDelete,
            TransportDocumentUpdate,
        ],
        UserRole::TransportInvoice | UserRole::TransportUser => &[
            TransportDetailsAssignTransportProvider,
            TransportDetailsDelete,
            TransportDetailsUpdate,
            TransportDetailsUpdatePatientSignature,
            TransportDetailsUpdateTransporterSignature,
        ],
        UserRole::InsuranceAdmin => &[
            AddressUpdate,
            InsuranceUpdate,
            InsuranceMove,
            UserCreate,
            UserDelete,
            UserUpdateRole,
        ],
        UserRole::InsuranceUser => &[
            InsuranceDataCreate,
            PatientCreate,
            PatientCreateWithInsuranceData,
            PatientMove,
            PatientUpdate,
            TransportDocumentArchive,
        ],
        UserRole::SuperUser => &[
            AddressUpdate,
            AddressDelete,
            InsuranceCreate,
            InsuranceUpdate,
            InsuranceMove,
            InsuranceDelete,
            InsuranceDataCreate,
            InsuranceDataDelete,
            PatientCreate,
            PatientCreateWithInsuranceData,
            PatientMove,
            PatientUpdate,
            PatientDelete,
            ServiceProviderCreate,
            ServiceProviderCreateFull,
            ServiceProviderMove,
            ServiceProviderDelete,
            ServiceProviderUpdate,
            ServiceProviderUpdateService,
            TransportDetailsAssignTransportProvider,
            TransportDetailsCreate,
            TransportDetailsDelete,
            TransportDetailsUpdate,
            TransportDetailsUpdatePatientSignature,
            TransportDetailsUpdateTransporterSignature,
            TransportDocumentAssignPatient,
            TransportDocumentCreate,
            TransportDocumentDelete,
            TransportDocumentUpdate,
            UserCreate,
            UserCreateFull,
            UserDelete,
            UserUpdateRole,
        ],
    }
}
