// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Request builders shared by the unit tests.

use chrono::{NaiveDate, TimeZone, Utc};

use crate::auth::UserRole;
use crate::models::{
    address, insurance, insurance_data, patient, service_provider, transport_details,
    transport_document, user, Id, Reference, TransportReason, TransportationType,
};
use crate::protocol::{Command, CommandKind};

pub fn address_request(city: &str) -> address::Create {
    address::Create {
        name: None,
        street_name: "Hauptstrasse".into(),
        house_number: "1".into(),
        country: "DE".into(),
        post_code: "10115".into(),
        city: city.into(),
    }
}

pub fn provider_request(id: &str) -> service_provider::CreateFull {
    service_provider::CreateFull {
        service_provider_id: id.into(),
        name: "Charite".into(),
        kind: "hospital".into(),
        is_healthcare_provider: true,
        is_transport_provider: false,
        address: address_request("Berlin"),
        contact_info: None,
    }
}

pub fn user_request(username: &str, password: &str, role: UserRole) -> user::CreateFull {
    user::CreateFull {
        username: username.into(),
        password: password.into(),
        last_name: "Admin".into(),
        first_name: "Ada".into(),
        address: address_request("Berlin"),
        service_provider: provider_request(&format!("sp-{username}")),
        role,
    }
}

pub fn login(username: &str, password: &str) -> Command {
    user::Command::LoginUser {
        username: username.into(),
        password: password.into(),
    }
    .into()
}

pub fn document_fields(signature: Reference<crate::models::User>) -> transport_document::DocumentFields {
    transport_document::DocumentFields {
        transport_reason: TransportReason::HighFrequent,
        start_date: date(2026, 2, 1),
        end_date: None,
        weekly_frequency: Some(2),
        healthcare_service_provider: Reference::to("sp-alice"),
        transportation_type: TransportationType::Taxi,
        additional_info: None,
        signature,
    }
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

/// One well-formed command of every kind, issued as `username`.
pub fn sample_command(kind: CommandKind, username: &str) -> Command {
    use CommandKind as K;

    let me: Id<crate::models::User> = Id::new(username);
    let signed_at = Utc.with_ymd_and_hms(2026, 2, 1, 9, 0, 0).single().expect("valid time");

    match kind {
        K::AddressCreate => address::Command::Create(address_request("Kiel")).into(),
        K::AddressDelete => address::Command::Delete { id: Id::new("a1") }.into(),
        K::AddressUpdate => address::Command::Update {
            id: Id::new("a1"),
            name: Some("Ward 3".into()),
        }
        .into(),
        K::AddressGet => address::Command::Get { id: Id::new("a1") }.into(),
        K::AddressGetList => address::Command::GetList {
            filter: address::Filter::default(),
        }
        .into(),

        K::InsuranceCreate => insurance::Command::Create {
            insurance_id: "ik-1".into(),
            name: "AOK".into(),
            address: Reference::to("a1"),
        }
        .into(),
        K::InsuranceDelete => insurance::Command::Delete { id: Id::new("ik-1") }.into(),
        K::InsuranceMove => insurance::Command::Move {
            id: Id::new("ik-1"),
            address: Reference::to("a2"),
        }
        .into(),
        K::InsuranceUpdate => insurance::Command::Update {
            id: Id::new("ik-1"),
            name: "AOK Nord".into(),
        }
        .into(),
        K::InsuranceGet => insurance::Command::Get { id: Id::new("ik-1") }.into(),
        K::InsuranceGetList => insurance::Command::GetList {
            filter: insurance::Filter::default(),
        }
        .into(),

        K::InsuranceDataCreate => insurance_data::Command::Create {
            patient: Reference::to("P1"),
            insurance: Reference::to("ik-1"),
            insurance_status: 1,
        }
        .into(),
        K::InsuranceDataDelete => insurance_data::Command::Delete { id: Id::new("d1") }.into(),
        K::InsuranceDataGet => insurance_data::Command::Get { id: Id::new("d1") }.into(),
        K::InsuranceDataGetList => insurance_data::Command::GetList {
            filter: insurance_data::Filter::default(),
        }
        .into(),

        K::PatientCreate => patient::Command::Create {
            insurance_number: "P1".into(),
            insurance_data: Reference::to("d1"),
            last_name: "Muster".into(),
            first_name: "Max".into(),
            birth_date: date(1950, 5, 5),
            address: Reference::to("a1"),
        }
        .into(),
        K::PatientCreateWithInsuranceData => patient::Command::CreateWithInsuranceData {
            insurance_number: "P1".into(),
            insurance: Reference::to("ik-1"),
            insurance_status: 1,
            last_name: "Muster".into(),
            first_name: "Max".into(),
            birth_date: date(1950, 5, 5),
            address: Reference::to("a1"),
        }
        .into(),
        K::PatientDelete => patient::Command::Delete {
            insurance_number: Id::new("P1"),
        }
        .into(),
        K::PatientMove => patient::Command::Move {
            insurance_number: Id::new("P1"),
            address: Reference::to("a2"),
        }
        .into(),
        K::PatientUpdate => patient::Command::Update {
            insurance_number: Id::new("P1"),
            last_name: "Muster".into(),
            first_name: "Moritz".into(),
        }
        .into(),
        K::PatientUpdateInsuranceData => patient::Command::UpdateInsuranceData {
            insurance_number: Id::new("P1"),
            insurance_data: Reference::to("d2"),
        }
        .into(),
        K::PatientGet => patient::Command::Get { id: Id::new("P1") }.into(),
        K::PatientGetList => patient::Command::GetList {
            filter: patient::Filter::default(),
        }
        .into(),

        K::ServiceProviderCreate => service_provider::Command::Create {
            service_provider_id: "sp-1".into(),
            name: "Taxi Nord".into(),
            kind: "taxi".into(),
            is_healthcare_provider: false,
            is_transport_provider: true,
            address: Reference::to("a1"),
            contact_info: None,
        }
        .into(),
        K::ServiceProviderCreateFull => {
            service_provider::Command::CreateFull(provider_request("sp-2")).into()
        }
        K::ServiceProviderDelete => service_provider::Command::Delete { id: Id::new("sp-1") }.into(),
        K::ServiceProviderMove => service_provider::Command::Move {
            id: Id::new("sp-1"),
            address: Reference::to("a2"),
        }
        .into(),
        K::ServiceProviderUpdate => service_provider::Command::Update {
            id: Id::new("sp-1"),
            name: "Taxi Sued".into(),
            kind: "taxi".into(),
            contact_info: Some("040 1234".into()),
        }
        .into(),
        K::ServiceProviderUpdateService => service_provider::Command::UpdateService {
            id: Id::new("sp-1"),
            provides_healthcare: false,
            provides_transport: true,
        }
        .into(),
        K::ServiceProviderGet => service_provider::Command::Get { id: Id::new("sp-1") }.into(),
        K::ServiceProviderGetList => service_provider::Command::GetList {
            filter: service_provider::Filter::default(),
        }
        .into(),

        K::TransportDetailsAssignTransportProvider => {
            transport_details::Command::AssignTransportProvider {
                id: Id::new("t1"),
                transport_provider: Reference::to("sp-1"),
            }
            .into()
        }
        K::TransportDetailsCreate => transport_details::Command::Create {
            transport_document: Reference::to("doc-1"),
            transport_date: date(2026, 2, 3),
        }
        .into(),
        K::TransportDetailsDelete => transport_details::Command::Delete { id: Id::new("t1") }.into(),
        K::TransportDetailsUpdate => transport_details::Command::Update {
            id: Id::new("t1"),
            route: transport_details::RouteUpdate::default(),
        }
        .into(),
        K::TransportDetailsUpdatePatientSignature => {
            transport_details::Command::UpdatePatientSignature {
                id: Id::new("t1"),
                signature: "M. Muster".into(),
                signature_date: signed_at,
            }
            .into()
        }
        K::TransportDetailsUpdateTransporterSignature => {
            transport_details::Command::UpdateTransporterSignature {
                id: Id::new("t1"),
                signature: "T. Fahrer".into(),
                signature_date: signed_at,
            }
            .into()
        }
        K::TransportDetailsGet => transport_details::Command::Get { id: Id::new("t1") }.into(),
        K::TransportDetailsGetList => transport_details::Command::GetList {
            filter: transport_details::Filter::default(),
        }
        .into(),
        K::TransportDetailsGetListByIdList => transport_details::Command::GetListByIdList {
            ids: vec![Id::new("t1"), Id::new("t2")],
        }
        .into(),

        K::TransportDocumentCreate => transport_document::Command::Create {
            patient: None,
            insurance_data: None,
            fields: document_fields(me.reference()),
        }
        .into(),
        K::TransportDocumentUpdate => transport_document::Command::Update {
            id: Id::new("doc-1"),
            fields: document_fields(me.reference()),
        }
        .into(),
        K::TransportDocumentAssignPatient => transport_document::Command::AssignPatient {
            id: Id::new("doc-1"),
            patient: Reference::to("P1"),
            insurance_data: Reference::to("d1"),
        }
        .into(),
        K::TransportDocumentArchive => {
            transport_document::Command::Archive { id: Id::new("doc-1") }.into()
        }
        K::TransportDocumentDelete => {
            transport_document::Command::Delete { id: Id::new("doc-1") }.into()
        }
        K::TransportDocumentGet => transport_document::Command::Get { id: Id::new("doc-1") }.into(),
        K::TransportDocumentGetList => transport_document::Command::GetList {
            filter: transport_document::Filter::default(),
        }
        .into(),

        K::UserCreate => user::Command::Create {
            username: "bob".into(),
            password: "pw".into(),
            last_name: "Builder".into(),
            first_name: "Bob".into(),
            address: Reference::to("a1"),
            service_provider: Reference::to("sp-1"),
            role: UserRole::TransportUser,
        }
        .into(),
        K::UserCreateFull => {
            user::Command::CreateFull(user_request("carol", "pw", UserRole::HealthcareUser))
                .into()
        }
        K::UserDelete => user::Command::Delete { id: Id::new("bob") }.into(),
        K::UserUpdate => user::Command::Update {
            id: me.clone(),
            last_name: "Admin".into(),
            first_name: "Ada".into(),
            address: Reference::to("a1"),
            service_provider: Reference::to("sp-1"),
        }
        .into(),
        K::UserUpdateRole => user::Command::UpdateRole {
            id: Id::new("bob"),
            role: UserRole::TransportAdmin,
        }
        .into(),
        K::UserUpdateCredentials => user::Command::UpdateCredentials {
            id: me.clone(),
            new_username: username.into(),
            old_password: "correct".into(),
            new_password: "better".into(),
        }
        .into(),
        K::UserLoginUser => login(username, "correct"),
        K::UserGet => user::Command::Get { id: me }.into(),
        K::UserGetList => user::Command::GetList {
            filter: user::Filter::default(),
        }
        .into(),
    }
}

#[test]
fn every_kind_has_a_matching_sample() {
    for kind in CommandKind::ALL {
        assert_eq!(sample_command(kind, "alice").kind(), kind);
    }
}
