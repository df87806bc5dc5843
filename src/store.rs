// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory [`Operations`] backend.
//!
//! Holds every record family in ordered maps behind one lock. Used by the
//! server binary and by tests; nothing is persisted across restarts.
//!
//! ## Rules
//!
//! - Passwords are stored as PBKDF2-HMAC-SHA256 hashes with a per-user salt.
//! - `bootstrap` only succeeds while no user exists.
//! - A user's identifier is its username, unique across the store.
//! - `User::Update` and `User::UpdateCredentials` target the acting user,
//!   unless the acting role may `User::UpdateRole`.
//! - Nobody changes their own role. Only a super user grants or revokes
//!   the super user role.
//! - Archived transport documents, and the transports under them, are
//!   read-only.

use std::collections::{BTreeMap, HashMap};
use std::num::NonZeroU32;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use ring::pbkdf2;
use ring::rand::{SecureRandom, SystemRandom};
use uuid::Uuid;

use crate::auth::{AuthorizationPolicy, UserRole};
use crate::models::{
    address, insurance, insurance_data, patient, service_provider, transport_details,
    transport_document, user, Address, Id, Insurance, InsuranceData, Patient, Reference,
    ServiceProvider, TransportDetails, TransportDocument, User,
};
use crate::operations::{OperationError, Operations, Outcome};
use crate::protocol::{Command, CommandKind, Family};

const PBKDF2_ITERATIONS: NonZeroU32 = match NonZeroU32::new(100_000) {
    Some(n) => n,
    None => unreachable!(),
};
const SALT_LEN: usize = 16;
const HASH_LEN: usize = 32;

/// Salted password hash.
struct Credential {
    salt: [u8; SALT_LEN],
    hash: [u8; HASH_LEN],
}

impl Credential {
    fn derive(rng: &SystemRandom, password: &user::Password) -> Result<Self, OperationError> {
        let mut salt = [0u8; SALT_LEN];
        rng.fill(&mut salt)
            .map_err(|_| OperationError::Processing("salt generation failed".to_string()))?;

        let mut hash = [0u8; HASH_LEN];
        pbkdf2::derive(
            pbkdf2::PBKDF2_HMAC_SHA256,
            PBKDF2_ITERATIONS,
            &salt,
            password.expose().as_bytes(),
            &mut hash,
        );
        Ok(Self { salt, hash })
    }

    fn verify(&self, password: &user::Password) -> bool {
        pbkdf2::verify(
            pbkdf2::PBKDF2_HMAC_SHA256,
            PBKDF2_ITERATIONS,
            &self.salt,
            password.expose().as_bytes(),
            &self.hash,
        )
        .is_ok()
    }
}

/// Records of one family keyed by identifier.
struct Table<T> {
    family: Family,
    rows: BTreeMap<String, T>,
}

impl<T: Clone> Table<T> {
    fn new(family: Family) -> Self {
        Self {
            family,
            rows: BTreeMap::new(),
        }
    }

    fn get<K>(&self, id: &Id<K>) -> Result<T, OperationError> {
        self.rows
            .get(id.value())
            .cloned()
            .ok_or_else(|| OperationError::not_found(self.family, id))
    }

    fn require<K>(&self, reference: &Reference<K>) -> Result<(), OperationError> {
        self.get(reference.id()).map(|_| ())
    }

    fn insert_new(&mut self, id: &str, row: T) -> Result<T, OperationError> {
        if self.rows.contains_key(id) {
            return Err(OperationError::AlreadyExists {
                family: self.family,
                id: id.to_string(),
            });
        }
        self.rows.insert(id.to_string(), row.clone());
        Ok(row)
    }

    /// Store `row` under an identifier known to exist.
    fn put<K>(&mut self, id: &Id<K>, row: T) -> T {
        self.rows.insert(id.value().to_string(), row.clone());
        row
    }

    fn remove<K>(&mut self, id: &Id<K>) -> Result<T, OperationError> {
        self.rows
            .remove(id.value())
            .ok_or_else(|| OperationError::not_found(self.family, id))
    }

    fn select(&self, accepts: impl Fn(&T) -> bool) -> Vec<T> {
        self.rows.values().filter(|row| accepts(row)).cloned().collect()
    }
}

struct Tables {
    addresses: Table<Address>,
    insurances: Table<Insurance>,
    insurance_data: Table<InsuranceData>,
    patients: Table<Patient>,
    providers: Table<ServiceProvider>,
    transport_details: Table<TransportDetails>,
    transport_documents: Table<TransportDocument>,
    users: Table<User>,
    credentials: HashMap<String, Credential>,
}

impl Default for Tables {
    fn default() -> Self {
        Self {
            addresses: Table::new(Family::Address),
            insurances: Table::new(Family::Insurance),
            insurance_data: Table::new(Family::InsuranceData),
            patients: Table::new(Family::Patient),
            providers: Table::new(Family::ServiceProvider),
            transport_details: Table::new(Family::TransportDetails),
            transport_documents: Table::new(Family::TransportDocument),
            users: Table::new(Family::User),
            credentials: HashMap::new(),
        }
    }
}

fn new_id<T>() -> Id<T> {
    Id::new(Uuid::new_v4().to_string())
}

pub struct InMemoryStore {
    tables: RwLock<Tables>,
    rng: SystemRandom,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
            rng: SystemRandom::new(),
        }
    }

    pub fn user_count(&self) -> Result<usize, OperationError> {
        Ok(self.read()?.users.rows.len())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, OperationError> {
        self.tables
            .read()
            .map_err(|_| OperationError::Processing("store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, OperationError> {
        self.tables
            .write()
            .map_err(|_| OperationError::Processing("store lock poisoned".to_string()))
    }
}

impl Operations for InMemoryStore {
    fn login(&self, username: &str, password: &user::Password) -> Result<User, OperationError> {
        let tables = self.read()?;
        let verified = tables
            .credentials
            .get(username)
            .is_some_and(|credential| credential.verify(password));
        if !verified {
            return Err(OperationError::WrongCredentials);
        }
        tables.users.get(&Id::<User>::new(username))
    }

    fn bootstrap(&self, request: user::CreateFull) -> Result<User, OperationError> {
        let mut tables = self.write()?;
        if !tables.users.rows.is_empty() {
            return Err(OperationError::IllegalProcess(
                "initial administrator already exists".to_string(),
            ));
        }
        tables.create_user_full(&self.rng, request)
    }

    fn process(
        &self,
        command: Command,
        acting: &Reference<User>,
    ) -> Result<Outcome, OperationError> {
        let mut tables = self.write()?;
        match command {
            Command::Address(cmd) => tables.address(cmd),
            Command::Insurance(cmd) => tables.insurance(cmd),
            Command::InsuranceData(cmd) => tables.insurance_data(cmd),
            Command::Patient(cmd) => tables.patient(cmd),
            Command::ServiceProvider(cmd) => tables.service_provider(cmd),
            Command::TransportDetails(cmd) => tables.transport_details(cmd),
            Command::TransportDocument(cmd) => tables.transport_document(cmd),
            Command::User(cmd) => tables.user(&self.rng, cmd, acting),
        }
    }
}

impl Tables {
    fn create_address(&mut self, request: address::Create) -> Result<Address, OperationError> {
        let id = new_id();
        let record = Address {
            id: id.clone(),
            name: request.name,
            street_name: request.street_name,
            house_number: request.house_number,
            country: request.country,
            post_code: request.post_code,
            city: request.city,
        };
        self.addresses.insert_new(id.value(), record)
    }

    fn address(&mut self, cmd: address::Command) -> Result<Outcome, OperationError> {
        use address::Command as C;

        let record = match cmd {
            C::Create(request) => self.create_address(request)?,
            C::Delete { id } => self.addresses.remove(&id)?,
            C::Update { id, name } => {
                let updated = self.addresses.get(&id)?.update_with(name);
                self.addresses.put(&id, updated)
            }
            C::Get { id } => self.addresses.get(&id)?,
            C::GetList { filter } => {
                return Ok(Outcome::list(self.addresses.select(|a| filter.accepts(a))));
            }
        };
        Ok(Outcome::entity(record))
    }

    fn insurance(&mut self, cmd: insurance::Command) -> Result<Outcome, OperationError> {
        use insurance::Command as C;

        let record = match cmd {
            C::Create {
                insurance_id,
                name,
                address,
            } => {
                self.addresses.require(&address)?;
                let record = Insurance {
                    id: Id::new(insurance_id.as_str()),
                    name,
                    address,
                };
                self.insurances.insert_new(&insurance_id, record)?
            }
            C::Delete { id } => self.insurances.remove(&id)?,
            C::Move { id, address } => {
                self.addresses.require(&address)?;
                let moved = self.insurances.get(&id)?.moved_to(address);
                self.insurances.put(&id, moved)
            }
            C::Update { id, name } => {
                let renamed = self.insurances.get(&id)?.renamed(name);
                self.insurances.put(&id, renamed)
            }
            C::Get { id } => self.insurances.get(&id)?,
            C::GetList { filter } => {
                return Ok(Outcome::list(self.insurances.select(|i| filter.accepts(i))));
            }
        };
        Ok(Outcome::entity(record))
    }

    fn insurance_data(&mut self, cmd: insurance_data::Command) -> Result<Outcome, OperationError> {
        use insurance_data::Command as C;

        let record = match cmd {
            C::Create {
                patient,
                insurance,
                insurance_status,
            } => {
                self.insurances.require(&insurance)?;
                let id = new_id();
                let record = InsuranceData {
                    id: id.clone(),
                    patient,
                    insurance,
                    insurance_status,
                };
                self.insurance_data.insert_new(id.value(), record)?
            }
            C::Delete { id } => self.insurance_data.remove(&id)?,
            C::Get { id } => self.insurance_data.get(&id)?,
            C::GetList { filter } => {
                return Ok(Outcome::list(
                    self.insurance_data.select(|d| filter.accepts(d)),
                ));
            }
        };
        Ok(Outcome::entity(record))
    }

    fn patient(&mut self, cmd: patient::Command) -> Result<Outcome, OperationError> {
        use patient::Command as C;

        let record = match cmd {
            C::Create {
                insurance_number,
                insurance_data,
                last_name,
                first_name,
                birth_date,
                address,
            } => {
                self.insurance_data.require(&insurance_data)?;
                self.addresses.require(&address)?;
                let record = Patient {
                    insurance_number: Id::new(insurance_number.as_str()),
                    insurance_data,
                    last_name,
                    first_name,
                    birth_date,
                    address,
                };
                self.patients.insert_new(&insurance_number, record)?
            }
            C::CreateWithInsuranceData {
                insurance_number,
                insurance,
                insurance_status,
                last_name,
                first_name,
                birth_date,
                address,
            } => {
                self.insurances.require(&insurance)?;
                self.addresses.require(&address)?;
                if self.patients.rows.contains_key(&insurance_number) {
                    return Err(OperationError::AlreadyExists {
                        family: Family::Patient,
                        id: insurance_number,
                    });
                }

                let patient_id: Id<Patient> = Id::new(insurance_number.as_str());
                let data_id: Id<InsuranceData> = new_id();
                self.insurance_data.insert_new(
                    data_id.value(),
                    InsuranceData {
                        id: data_id.clone(),
                        patient: patient_id.reference(),
                        insurance,
                        insurance_status,
                    },
                )?;
                let record = Patient {
                    insurance_number: patient_id,
                    insurance_data: data_id.reference(),
                    last_name,
                    first_name,
                    birth_date,
                    address,
                };
                self.patients.insert_new(&insurance_number, record)?
            }
            C::Delete { insurance_number } => self.patients.remove(&insurance_number)?,
            C::Move {
                insurance_number,
                address,
            } => {
                self.addresses.require(&address)?;
                let moved = self.patients.get(&insurance_number)?.moved_to(address);
                self.patients.put(&insurance_number, moved)
            }
            C::Update {
                insurance_number,
                last_name,
                first_name,
            } => {
                let renamed = self
                    .patients
                    .get(&insurance_number)?
                    .renamed(last_name, first_name);
                self.patients.put(&insurance_number, renamed)
            }
            C::UpdateInsuranceData {
                insurance_number,
                insurance_data,
            } => {
                self.insurance_data.require(&insurance_data)?;
                let updated = self
                    .patients
                    .get(&insurance_number)?
                    .with_insurance_data(insurance_data);
                self.patients.put(&insurance_number, updated)
            }
            C::Get { id } => self.patients.get(&id)?,
            C::GetList { filter } => {
                return Ok(Outcome::list(self.patients.select(|p| filter.accepts(p))));
            }
        };
        Ok(Outcome::entity(record))
    }

    fn create_provider_full(
        &mut self,
        request: service_provider::CreateFull,
    ) -> Result<ServiceProvider, OperationError> {
        if self.providers.rows.contains_key(&request.service_provider_id) {
            return Err(OperationError::AlreadyExists {
                family: Family::ServiceProvider,
                id: request.service_provider_id,
            });
        }
        let address = self.create_address(request.address)?;
        let record = ServiceProvider {
            id: Id::new(request.service_provider_id.as_str()),
            name: request.name,
            kind: request.kind,
            is_healthcare_provider: request.is_healthcare_provider,
            is_transport_provider: request.is_transport_provider,
            address: address.id.reference(),
            contact_info: request.contact_info,
        };
        self.providers
            .insert_new(&request.service_provider_id, record)
    }

    fn service_provider(
        &mut self,
        cmd: service_provider::Command,
    ) -> Result<Outcome, OperationError> {
        use service_provider::Command as C;

        let record = match cmd {
            C::Create {
                service_provider_id,
                name,
                kind,
                is_healthcare_provider,
                is_transport_provider,
                address,
                contact_info,
            } => {
                self.addresses.require(&address)?;
                let record = ServiceProvider {
                    id: Id::new(service_provider_id.as_str()),
                    name,
                    kind,
                    is_healthcare_provider,
                    is_transport_provider,
                    address,
                    contact_info,
                };
                self.providers.insert_new(&service_provider_id, record)?
            }
            C::CreateFull(request) => self.create_provider_full(request)?,
            C::Delete { id } => self.providers.remove(&id)?,
            C::Move { id, address } => {
                self.addresses.require(&address)?;
                let moved = self.providers.get(&id)?.moved_to(address);
                self.providers.put(&id, moved)
            }
            C::Update {
                id,
                name,
                kind,
                contact_info,
            } => {
                let updated = self.providers.get(&id)?.update_with(name, kind, contact_info);
                self.providers.put(&id, updated)
            }
            C::UpdateService {
                id,
                provides_healthcare,
                provides_transport,
            } => {
                let updated = self
                    .providers
                    .get(&id)?
                    .with_services(provides_healthcare, provides_transport);
                self.providers.put(&id, updated)
            }
            C::Get { id } => self.providers.get(&id)?,
            C::GetList { filter } => {
                return Ok(Outcome::list(self.providers.select(|p| filter.accepts(p))));
            }
        };
        Ok(Outcome::entity(record))
    }

    /// Fails with `IsArchived` when the document no longer accepts changes.
    fn open_document(
        &self,
        id: &Id<TransportDocument>,
    ) -> Result<TransportDocument, OperationError> {
        let document = self.transport_documents.get(id)?;
        if document.is_archived {
            return Err(OperationError::IsArchived {
                document: id.clone(),
            });
        }
        Ok(document)
    }

    /// Transport details whose document is still open.
    fn open_details(
        &self,
        id: &Id<TransportDetails>,
    ) -> Result<TransportDetails, OperationError> {
        let details = self.transport_details.get(id)?;
        self.open_document(details.transport_document.id())?;
        Ok(details)
    }

    fn transport_details(
        &mut self,
        cmd: transport_details::Command,
    ) -> Result<Outcome, OperationError> {
        use transport_details::Command as C;

        let record = match cmd {
            C::AssignTransportProvider {
                id,
                transport_provider,
            } => {
                let provider = self.providers.get(transport_provider.id())?;
                if !provider.is_transport_provider {
                    return Err(OperationError::IllegalProcess(format!(
                        "service provider {} does not provide transports",
                        provider.id
                    )));
                }
                let assigned = self.open_details(&id)?.assigned_to(transport_provider);
                self.transport_details.put(&id, assigned)
            }
            C::Create {
                transport_document,
                transport_date,
            } => {
                self.open_document(transport_document.id())?;
                let id = new_id();
                let record = TransportDetails::new(id.clone(), transport_document, transport_date);
                self.transport_details.insert_new(id.value(), record)?
            }
            C::Delete { id } => {
                self.open_details(&id)?;
                self.transport_details.remove(&id)?
            }
            C::Update { id, route } => {
                for address in [&route.start_address, &route.end_address].into_iter().flatten() {
                    self.addresses.require(address)?;
                }
                let updated = self.open_details(&id)?.update_with(route);
                self.transport_details.put(&id, updated)
            }
            C::UpdatePatientSignature {
                id,
                signature,
                signature_date,
            } => {
                let signed = self
                    .open_details(&id)?
                    .signed_by_patient(signature, signature_date);
                self.transport_details.put(&id, signed)
            }
            C::UpdateTransporterSignature {
                id,
                signature,
                signature_date,
            } => {
                let signed = self
                    .open_details(&id)?
                    .signed_by_transporter(signature, signature_date);
                self.transport_details.put(&id, signed)
            }
            C::Get { id } => self.transport_details.get(&id)?,
            C::GetList { filter } => {
                return Ok(Outcome::list(
                    self.transport_details.select(|d| filter.accepts(d)),
                ));
            }
            C::GetListByIdList { ids } => {
                let found: Vec<TransportDetails> = ids
                    .iter()
                    .filter_map(|id| self.transport_details.rows.get(id.value()).cloned())
                    .collect();
                return Ok(Outcome::list(found));
            }
        };
        Ok(Outcome::entity(record))
    }

    fn check_document_fields(
        &self,
        fields: &transport_document::DocumentFields,
    ) -> Result<(), OperationError> {
        self.providers.require(&fields.healthcare_service_provider)?;
        self.users.require(&fields.signature)
    }

    fn transport_document(
        &mut self,
        cmd: transport_document::Command,
    ) -> Result<Outcome, OperationError> {
        use transport_document::Command as C;

        let record = match cmd {
            C::Create {
                patient,
                insurance_data,
                fields,
            } => {
                self.check_document_fields(&fields)?;
                if let Some(patient) = &patient {
                    self.patients.require(patient)?;
                }
                if let Some(data) = &insurance_data {
                    self.insurance_data.require(data)?;
                }
                let id = new_id();
                let record = TransportDocument {
                    id: id.clone(),
                    patient,
                    insurance_data,
                    transport_reason: fields.transport_reason,
                    start_date: fields.start_date,
                    end_date: fields.end_date,
                    weekly_frequency: fields.weekly_frequency,
                    healthcare_service_provider: fields.healthcare_service_provider,
                    transportation_type: fields.transportation_type,
                    additional_info: fields.additional_info,
                    signature: fields.signature,
                    is_archived: false,
                };
                self.transport_documents.insert_new(id.value(), record)?
            }
            C::Update { id, fields } => {
                self.check_document_fields(&fields)?;
                let updated = self.open_document(&id)?.update_with(fields);
                self.transport_documents.put(&id, updated)
            }
            C::AssignPatient {
                id,
                patient,
                insurance_data,
            } => {
                self.patients.require(&patient)?;
                self.insurance_data.require(&insurance_data)?;
                let assigned = self
                    .open_document(&id)?
                    .assign_patient(patient, insurance_data);
                self.transport_documents.put(&id, assigned)
            }
            C::Archive { id } => {
                let archived = self.transport_documents.get(&id)?.archive()?;
                self.transport_documents.put(&id, archived)
            }
            C::Delete { id } => {
                self.open_document(&id)?;
                self.transport_details
                    .rows
                    .retain(|_, details| details.transport_document.id() != &id);
                self.transport_documents.remove(&id)?
            }
            C::Get { id } => self.transport_documents.get(&id)?,
            C::GetList { filter } => {
                return Ok(Outcome::list(
                    self.transport_documents.select(|d| filter.accepts(d)),
                ));
            }
        };
        Ok(Outcome::entity(record))
    }

    fn insert_user(
        &mut self,
        rng: &SystemRandom,
        user: User,
        password: &user::Password,
    ) -> Result<User, OperationError> {
        let username = user.id.value().to_string();
        if self.users.rows.contains_key(&username) {
            return Err(OperationError::UserNameAlreadyUsed { username });
        }
        let credential = Credential::derive(rng, password)?;
        self.credentials.insert(username.clone(), credential);
        self.users.insert_new(&username, user)
    }

    fn create_user_full(
        &mut self,
        rng: &SystemRandom,
        request: user::CreateFull,
    ) -> Result<User, OperationError> {
        if self.users.rows.contains_key(&request.username) {
            return Err(OperationError::UserNameAlreadyUsed {
                username: request.username,
            });
        }
        let address = self.create_address(request.address)?;
        let provider = self.create_provider_full(request.service_provider)?;
        let record = User {
            id: Id::new(request.username.as_str()),
            last_name: request.last_name,
            first_name: request.first_name,
            address: address.id.reference(),
            service_provider: provider.id.reference(),
            role: request.role,
        };
        self.insert_user(rng, record, &request.password)
    }

    /// Acting user, allowed to modify `target` only if it is themself or an
    /// account manager.
    fn check_account_access(
        &self,
        acting: &Reference<User>,
        target: &Id<User>,
    ) -> Result<(), OperationError> {
        if acting.id() == target {
            return Ok(());
        }
        let actor = self
            .users
            .get(acting.id())
            .map_err(|_| OperationError::UserNotFound {
                user: acting.to_string(),
            })?;
        if AuthorizationPolicy::global().is_allowed(actor.role, CommandKind::UserUpdateRole) {
            Ok(())
        } else {
            Err(OperationError::IllegalProcess(format!(
                "user {} may only change their own account",
                actor.id
            )))
        }
    }

    fn user_record(&self, id: &Id<User>) -> Result<User, OperationError> {
        self.users.get(id).map_err(|_| OperationError::UserNotFound {
            user: id.to_string(),
        })
    }

    fn user(
        &mut self,
        rng: &SystemRandom,
        cmd: user::Command,
        acting: &Reference<User>,
    ) -> Result<Outcome, OperationError> {
        use user::Command as C;

        let record = match cmd {
            C::Create {
                username,
                password,
                last_name,
                first_name,
                address,
                service_provider,
                role,
            } => {
                self.addresses.require(&address)?;
                self.providers.require(&service_provider)?;
                let record = User {
                    id: Id::new(username),
                    last_name,
                    first_name,
                    address,
                    service_provider,
                    role,
                };
                self.insert_user(rng, record, &password)?
            }
            C::CreateFull(request) => self.create_user_full(rng, request)?,
            C::Delete { id } => {
                if acting.id() == &id {
                    return Err(OperationError::IllegalProcess(
                        "users cannot delete their own account".to_string(),
                    ));
                }
                let removed = self.user_record(&id)?;
                self.users.remove(&id)?;
                self.credentials.remove(id.value());
                removed
            }
            C::Update {
                id,
                last_name,
                first_name,
                address,
                service_provider,
            } => {
                self.check_account_access(acting, &id)?;
                self.addresses.require(&address)?;
                self.providers.require(&service_provider)?;
                let updated = self
                    .user_record(&id)?
                    .update_with(last_name, first_name, address, service_provider);
                self.users.put(&id, updated)
            }
            C::UpdateRole { id, role } => {
                if acting.id() == &id {
                    return Err(OperationError::IllegalProcess(
                        "users cannot change their own role".to_string(),
                    ));
                }
                let actor = self.user_record(acting.id())?;
                let current = self.user_record(&id)?;
                let touches_super_user =
                    role == UserRole::SuperUser || current.role == UserRole::SuperUser;
                if touches_super_user && actor.role != UserRole::SuperUser {
                    return Err(OperationError::IllegalProcess(format!(
                        "only a {} may grant or revoke that role",
                        UserRole::SuperUser
                    )));
                }
                let updated = current.with_role(role);
                self.users.put(&id, updated)
            }
            C::UpdateCredentials {
                id,
                new_username,
                old_password,
                new_password,
            } => {
                self.check_account_access(acting, &id)?;
                let current = self.user_record(&id)?;
                let verified = self
                    .credentials
                    .get(id.value())
                    .is_some_and(|credential| credential.verify(&old_password));
                if !verified {
                    return Err(OperationError::WrongCredentials);
                }
                self.rename_user(rng, current, new_username, &new_password)?
            }
            C::LoginUser { .. } => {
                return Err(OperationError::IllegalProcess(
                    "login is handled by the session".to_string(),
                ));
            }
            C::Get { id } => self.user_record(&id)?,
            C::GetList { filter } => {
                return Ok(Outcome::list(self.users.select(|u| filter.accepts(u))));
            }
        };
        Ok(Outcome::entity(record))
    }

    /// Replace username and password, repointing document signatures.
    fn rename_user(
        &mut self,
        rng: &SystemRandom,
        current: User,
        new_username: String,
        new_password: &user::Password,
    ) -> Result<User, OperationError> {
        let old_id = current.id.clone();
        let new_id: Id<User> = Id::new(new_username.as_str());
        if new_id != old_id && self.users.rows.contains_key(&new_username) {
            return Err(OperationError::UserNameAlreadyUsed {
                username: new_username,
            });
        }

        let credential = Credential::derive(rng, new_password)?;
        self.users.remove(&old_id)?;
        self.credentials.remove(old_id.value());

        let renamed = current.renamed_to(new_id.clone());
        self.credentials.insert(new_username.clone(), credential);
        self.users.rows.insert(new_username, renamed.clone());

        if new_id != old_id {
            for document in self.transport_documents.rows.values_mut() {
                if document.signature.id() == &old_id {
                    document.signature = new_id.reference();
                }
            }
        }
        Ok(renamed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{address_request, date, document_fields, user_request};
    use crate::protocol::{Entity, EntityList};

    fn bootstrapped() -> (InMemoryStore, Reference<User>) {
        let store = InMemoryStore::new();
        let admin = store
            .bootstrap(user_request("alice", "correct", UserRole::SuperUser))
            .unwrap();
        (store, admin.id.reference())
    }

    fn entity(outcome: Outcome) -> Entity {
        match outcome {
            Outcome::Entity(entity) => entity,
            Outcome::List(list) => panic!("expected entity, got list of {}", list.len()),
        }
    }

    fn create_address(store: &InMemoryStore, acting: &Reference<User>, city: &str) -> Address {
        let outcome = store
            .process(
                address::Command::Create(address_request(city)).into(),
                acting,
            )
            .unwrap();
        match entity(outcome) {
            Entity::Address(address) => address,
            other => panic!("unexpected {:?}", other.family()),
        }
    }

    fn create_document(store: &InMemoryStore, acting: &Reference<User>) -> TransportDocument {
        let fields = document_fields(acting.clone());
        let outcome = store
            .process(
                transport_document::Command::Create {
                    patient: None,
                    insurance_data: None,
                    fields,
                }
                .into(),
                acting,
            )
            .unwrap();
        match entity(outcome) {
            Entity::TransportDocument(document) => document,
            other => panic!("unexpected {:?}", other.family()),
        }
    }

    #[test]
    fn login_checks_the_password() {
        let (store, _) = bootstrapped();
        assert_eq!(store.login("alice", &"correct".into()).unwrap().id.value(), "alice");
        assert_eq!(
            store.login("alice", &"wrong".into()),
            Err(OperationError::WrongCredentials)
        );
        assert_eq!(
            store.login("mallory", &"correct".into()),
            Err(OperationError::WrongCredentials)
        );
    }

    #[test]
    fn bootstrap_only_works_on_an_empty_store() {
        let (store, _) = bootstrapped();
        let err = store
            .bootstrap(user_request("eve", "pw", UserRole::SuperUser))
            .unwrap_err();
        assert!(matches!(err, OperationError::IllegalProcess(_)));
        assert_eq!(store.user_count().unwrap(), 1);
    }

    #[test]
    fn usernames_are_unique() {
        let (store, acting) = bootstrapped();
        let err = store
            .process(
                user::Command::CreateFull(user_request("alice", "x", UserRole::HealthcareUser))
                    .into(),
                &acting,
            )
            .unwrap_err();
        assert_eq!(
            err,
            OperationError::UserNameAlreadyUsed {
                username: "alice".into()
            }
        );
    }

    #[test]
    fn get_list_returns_every_matching_record() {
        let (store, acting) = bootstrapped();
        for _ in 0..3 {
            create_address(&store, &acting, "Hamburg");
        }
        create_address(&store, &acting, "Bremen");

        let filter = address::Filter {
            city: Some("Hamburg".into()),
            ..address::Filter::default()
        };
        let outcome = store
            .process(address::Command::GetList { filter }.into(), &acting)
            .unwrap();
        match outcome {
            Outcome::List(EntityList::Address(found)) => {
                assert_eq!(found.len(), 3);
                assert!(found.iter().all(|a| a.city == "Hamburg"));
            }
            other => panic!("expected address list, got {other:?}"),
        }
    }

    #[test]
    fn empty_list_is_still_a_list() {
        let (store, acting) = bootstrapped();
        let outcome = store
            .process(
                patient::Command::GetList {
                    filter: patient::Filter::default(),
                }
                .into(),
                &acting,
            )
            .unwrap();
        assert_eq!(outcome, Outcome::List(EntityList::Patient(Vec::new())));
    }

    #[test]
    fn archived_document_is_read_only() {
        let (store, acting) = bootstrapped();
        let document = create_document(&store, &acting);

        let err = store
            .process(
                transport_document::Command::Archive {
                    id: document.id.clone(),
                }
                .into(),
                &acting,
            )
            .unwrap_err();
        assert!(matches!(err, OperationError::IsNotArchivable { .. }));

        let insurer = create_address(&store, &acting, "Kiel");
        store
            .process(
                insurance::Command::Create {
                    insurance_id: "ik-1".into(),
                    name: "AOK".into(),
                    address: insurer.id.reference(),
                }
                .into(),
                &acting,
            )
            .unwrap();
        store
            .process(
                patient::Command::CreateWithInsuranceData {
                    insurance_number: "P1".into(),
                    insurance: Reference::to("ik-1"),
                    insurance_status: 1,
                    last_name: "Muster".into(),
                    first_name: "Max".into(),
                    birth_date: date(1950, 5, 5),
                    address: insurer.id.reference(),
                }
                .into(),
                &acting,
            )
            .unwrap();
        let patient = store
            .process(patient::Command::Get { id: Id::new("P1") }.into(), &acting)
            .unwrap();
        let Entity::Patient(patient) = entity(patient) else {
            panic!("expected patient");
        };

        store
            .process(
                transport_document::Command::AssignPatient {
                    id: document.id.clone(),
                    patient: patient.insurance_number.reference(),
                    insurance_data: patient.insurance_data.clone(),
                }
                .into(),
                &acting,
            )
            .unwrap();
        store
            .process(
                transport_document::Command::Archive {
                    id: document.id.clone(),
                }
                .into(),
                &acting,
            )
            .unwrap();

        let err = store
            .process(
                transport_details::Command::Create {
                    transport_document: document.id.reference(),
                    transport_date: date(2026, 2, 3),
                }
                .into(),
                &acting,
            )
            .unwrap_err();
        assert_eq!(
            err,
            OperationError::IsArchived {
                document: document.id.clone()
            }
        );
    }

    #[test]
    fn plain_users_only_update_themselves() {
        let (store, admin) = bootstrapped();
        store
            .process(
                user::Command::CreateFull(user_request("bob", "pw", UserRole::TransportUser))
                    .into(),
                &admin,
            )
            .unwrap();
        let bob: Reference<User> = Reference::to("bob");

        let err = store
            .process(
                user::Command::UpdateCredentials {
                    id: Id::new("alice"),
                    new_username: "alice".into(),
                    old_password: "correct".into(),
                    new_password: "hijacked".into(),
                }
                .into(),
                &bob,
            )
            .unwrap_err();
        assert!(matches!(err, OperationError::IllegalProcess(_)));
        assert!(store.login("alice", &"correct".into()).is_ok());
    }

    #[test]
    fn role_changes_never_raise_the_caller() {
        let (store, alice) = bootstrapped();
        for (name, role) in [
            ("ha", UserRole::HealthcareAdmin),
            ("tu", UserRole::TransportUser),
        ] {
            store
                .process(
                    user::Command::CreateFull(user_request(name, "pw", role)).into(),
                    &alice,
                )
                .unwrap();
        }
        let ha: Reference<User> = Reference::to("ha");
        let update_role = |id: &str, role| -> Command {
            user::Command::UpdateRole {
                id: Id::new(id),
                role,
            }
            .into()
        };

        let err = store
            .process(update_role("ha", UserRole::SuperUser), &ha)
            .unwrap_err();
        assert!(matches!(err, OperationError::IllegalProcess(_)), "{err}");
        let err = store
            .process(update_role("tu", UserRole::SuperUser), &ha)
            .unwrap_err();
        assert!(matches!(err, OperationError::IllegalProcess(_)), "{err}");
        let err = store
            .process(update_role("alice", UserRole::TransportUser), &ha)
            .unwrap_err();
        assert!(matches!(err, OperationError::IllegalProcess(_)), "{err}");
        let err = store
            .process(update_role("alice", UserRole::TransportUser), &alice)
            .unwrap_err();
        assert!(matches!(err, OperationError::IllegalProcess(_)), "{err}");
        assert_eq!(store.login("ha", &"pw".into()).unwrap().role, UserRole::HealthcareAdmin);

        let moved = store
            .process(update_role("tu", UserRole::HealthcareUser), &ha)
            .unwrap();
        assert!(matches!(
            entity(moved),
            Entity::User(User { role: UserRole::HealthcareUser, .. })
        ));
        let promoted = store
            .process(update_role("ha", UserRole::SuperUser), &alice)
            .unwrap();
        assert!(matches!(
            entity(promoted),
            Entity::User(User { role: UserRole::SuperUser, .. })
        ));
    }

    #[test]
    fn credential_update_renames_the_account() {
        let (store, alice) = bootstrapped();
        let document = create_document(&store, &alice);

        let outcome = store
            .process(
                user::Command::UpdateCredentials {
                    id: Id::new("alice"),
                    new_username: "alice.m".into(),
                    old_password: "correct".into(),
                    new_password: "better".into(),
                }
                .into(),
                &alice,
            )
            .unwrap();
        let Entity::User(renamed) = entity(outcome) else {
            panic!("expected user");
        };
        assert_eq!(renamed.id.value(), "alice.m");

        assert!(store.login("alice", &"correct".into()).is_err());
        assert!(store.login("alice.m", &"better".into()).is_ok());

        let moved = store
            .process(
                transport_document::Command::Get { id: document.id }.into(),
                &renamed.id.reference(),
            )
            .unwrap();
        let Entity::TransportDocument(moved) = entity(moved) else {
            panic!("expected document");
        };
        assert_eq!(moved.signature, renamed.id.reference());
    }

    #[test]
    fn credential_update_needs_the_old_password() {
        let (store, alice) = bootstrapped();
        let err = store
            .process(
                user::Command::UpdateCredentials {
                    id: Id::new("alice"),
                    new_username: "alice".into(),
                    old_password: "guess".into(),
                    new_password: "new".into(),
                }
                .into(),
                &alice,
            )
            .unwrap_err();
        assert_eq!(err, OperationError::WrongCredentials);
    }

    #[test]
    fn details_by_id_list_skip_unknown_ids() {
        let (store, acting) = bootstrapped();
        let document = create_document(&store, &acting);
        let date = date(2026, 2, 2);

        let mut ids = Vec::new();
        for _ in 0..2 {
            let outcome = store
                .process(
                    transport_details::Command::Create {
                        transport_document: document.id.reference(),
                        transport_date: date,
                    }
                    .into(),
                    &acting,
                )
                .unwrap();
            let Entity::TransportDetails(details) = entity(outcome) else {
                panic!("expected details");
            };
            ids.push(details.id);
        }
        ids.push(Id::new("missing"));

        let outcome = store
            .process(
                transport_details::Command::GetListByIdList { ids }.into(),
                &acting,
            )
            .unwrap();
        let Outcome::List(list) = outcome else {
            panic!("expected list");
        };
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn missing_reference_is_not_found() {
        let (store, acting) = bootstrapped();
        let err = store
            .process(
                insurance::Command::Create {
                    insurance_id: "ik-2".into(),
                    name: "TK".into(),
                    address: Reference::to("nowhere"),
                }
                .into(),
                &acting,
            )
            .unwrap_err();
        assert_eq!(
            err,
            OperationError::NotFound {
                family: Family::Address,
                id: "nowhere".into()
            }
        );
    }
}
