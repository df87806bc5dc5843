// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User roles for authorization.

use serde::{Deserialize, Serialize};

/// Role of a user account.
///
/// Roles are flat: there is no hierarchy, each role only has the commands
/// the policy table lists for it.
///
/// ## Organizations
///
/// - `Healthcare*` - hospitals and practices prescribing transports
/// - `Transport*` - ambulance and taxi services carrying them out
/// - `Insurance*` - insurers paying for them
/// - `SuperUser` - platform operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UserRole {
    HealthcareAdmin,
    HealthcareDoctor,
    HealthcareUser,
    TransportAdmin,
    TransportDoctor,
    TransportInvoice,
    TransportUser,
    InsuranceAdmin,
    InsuranceUser,
    SuperUser,
}

impl UserRole {
    pub const ALL: [UserRole; 10] = [
        UserRole::HealthcareAdmin,
        UserRole::HealthcareDoctor,
        UserRole::HealthcareUser,
        UserRole::TransportAdmin,
        UserRole::TransportDoctor,
        UserRole::TransportInvoice,
        UserRole::TransportUser,
        UserRole::InsuranceAdmin,
        UserRole::InsuranceUser,
        UserRole::SuperUser,
    ];
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            UserRole::HealthcareAdmin => "healthcare_admin",
            UserRole::HealthcareDoctor => "healthcare_doctor",
            UserRole::HealthcareUser => "healthcare_user",
            UserRole::TransportAdmin => "transport_admin",
            UserRole::TransportDoctor => "transport_doctor",
            UserRole::TransportInvoice => "transport_invoice",
            UserRole::TransportUser => "transport_user",
            UserRole::InsuranceAdmin => "insurance_admin",
            UserRole::InsuranceUser => "insurance_user",
            UserRole::SuperUser => "super_user",
        };
        f.write_str(name)
    }
}
