pub mod sqlite;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::errors::StoreError;
use crate::models::{Appointment, AppointmentPatch, Customer, NewAppointment, Session};

pub use sqlite::{SqliteCustomerStore, SqliteSessionStore, SqliteSlotStore};

/// Abstract collection of appointment records with range-query capability.
///
/// The store is not assumed to support multi-document transactions; the
/// booking engine serializes its read-then-write sequences itself.
#[async_trait]
pub trait SlotStore: Send + Sync {
    /// Appointments (any status) on `day` whose `[start_at, end_at)`
    /// interval intersects the given one.
    async fn find_overlapping(
        &self,
        day: NaiveDate,
        start_at: DateTime<Utc>,
        end_at: DateTime<Utc>,
    ) -> Result<Vec<Appointment>, StoreError>;

    /// Persists a new appointment and returns its store-generated id.
    async fn create(&self, appt: NewAppointment) -> Result<String, StoreError>;

    async fn get(&self, id: &str) -> Result<Option<Appointment>, StoreError>;

    /// Applies a partial update; `false` when the id is unknown.
    async fn update(&self, id: &str, patch: AppointmentPatch) -> Result<bool, StoreError>;

    /// Deletes an appointment; `false` when the id is unknown.
    async fn delete(&self, id: &str) -> Result<bool, StoreError>;

    async fn list_by_customer(&self, customer_id: &str) -> Result<Vec<Appointment>, StoreError>;

    /// Removes unconfirmed holds created before `cutoff`, returning how
    /// many were dropped.
    async fn delete_stale_holds(&self, cutoff: DateTime<Utc>) -> Result<usize, StoreError>;
}

/// Keyed persistence for the lightweight per-customer record.
#[async_trait]
pub trait CustomerStore: Send + Sync {
    async fn get(&self, id: &str) -> Result<Option<Customer>, StoreError>;

    /// Inserts or fully replaces the record.
    async fn save(&self, customer: &Customer) -> Result<(), StoreError>;
}

/// Keyed persistence for durable conversational sessions.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, id: &str) -> Result<Option<Session>, StoreError>;

    async fn save(&self, session: &Session) -> Result<(), StoreError>;

    async fn delete(&self, id: &str) -> Result<bool, StoreError>;
}
