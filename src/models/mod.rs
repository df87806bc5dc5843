// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Domain Records and Commands
//!
//! One submodule per entity family. Each family defines:
//!
//! - the record itself (immutable value, replaced wholesale on update)
//! - a `Command` enum, the closed set of requests a client may send
//! - a `Filter` for `GetList`, where every absent field is unconstrained
//!
//! Records never embed related records. They point at them through a
//! [`Reference`], which names an entity without owning it.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use serde::{Deserialize, Serialize};

pub mod address;
pub mod insurance;
pub mod insurance_data;
pub mod patient;
pub mod service_provider;
pub mod transport_details;
pub mod transport_document;
pub mod user;

pub use address::Address;
pub use insurance::Insurance;
pub use insurance_data::InsuranceData;
pub use patient::Patient;
pub use service_provider::ServiceProvider;
pub use transport_details::TransportDetails;
pub use transport_document::TransportDocument;
pub use user::User;

/// Typed identifier of an entity of kind `T`.
///
/// Serialized as a bare string; the type tag only exists at compile time.
#[derive(Serialize, Deserialize)]
#[serde(transparent, bound = "")]
pub struct Id<T> {
    value: String,
    #[serde(skip)]
    marker: PhantomData<fn() -> T>,
}

impl<T> Id<T> {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            marker: PhantomData,
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Reference pointing at the entity this identifier names.
    pub fn reference(&self) -> Reference<T> {
        Reference::new(self.clone())
    }
}

impl<T> Clone for Id<T> {
    fn clone(&self) -> Self {
        Self::new(self.value.clone())
    }
}

impl<T> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T> Eq for Id<T> {}

impl<T> Hash for Id<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl<T> fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Id({})", self.value)
    }
}

impl<T> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl<T> From<&str> for Id<T> {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl<T> From<String> for Id<T> {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Foreign key to an entity of kind `T`.
///
/// Names the target without owning or embedding it.
#[derive(Serialize, Deserialize)]
#[serde(transparent, bound = "")]
pub struct Reference<T> {
    id: Id<T>,
}

impl<T> Reference<T> {
    pub fn new(id: Id<T>) -> Self {
        Self { id }
    }

    /// Build a reference from a raw identifier string.
    pub fn to(value: impl Into<String>) -> Self {
        Self::new(Id::new(value))
    }

    pub fn id(&self) -> &Id<T> {
        &self.id
    }
}

impl<T> Clone for Reference<T> {
    fn clone(&self) -> Self {
        Self::new(self.id.clone())
    }
}

impl<T> PartialEq for Reference<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for Reference<T> {}

impl<T> Hash for Reference<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<T> fmt::Debug for Reference<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Reference({})", self.id.value())
    }
}

impl<T> fmt::Display for Reference<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id.value())
    }
}

/// Physical condition of the patient during transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PatientCondition {
    CarryingChair,
    WheelChair,
    LyingDown,
}

/// Legal ground for the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransportReason {
    EmergencyTransport,
    FullPartStationary,
    PrePostStationary,
    AmbulantTaxi,
    OtherPermitFree,
    HighFrequent,
    HighFrequentAlike,
    ContinuousImpairment,
    OtherKtw,
}

/// Vehicle category used for the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransportationType {
    Taxi,
    Ktw,
    Rtw,
    NawOrNef,
    Other,
}

/// Leg of the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Outward,
    Return,
}

/// `true` when the filter field is absent or equal to the record value.
pub(crate) fn matches<T: PartialEq>(filter: &Option<T>, value: &T) -> bool {
    filter.as_ref().is_none_or(|wanted| wanted == value)
}

/// Like [`matches`], for record fields that are themselves optional.
pub(crate) fn matches_opt<T: PartialEq>(filter: &Option<T>, value: &Option<T>) -> bool {
    match filter {
        None => true,
        Some(wanted) => value.as_ref() == Some(wanted),
    }
}
